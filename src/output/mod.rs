//! Output roles and presentation surfaces
//!
//! This module provides support for:
//! - Display enumeration and screen-change subscription
//! - Role assignment (main, teleprompt, auxiliary) persisted across runs
//! - Reconciliation of persisted roles against the live output set
//! - Double-buffered presentation surfaces with clipped transitions

pub mod assignment;
pub mod display;
pub mod manager;
pub mod reconcile;
pub mod store;
pub mod surface;

pub use assignment::{
    auto_assign, default_role, Assignment, LogicalRole, ParseRoleError, StoredAssignments,
    NO_PRIOR_COUNT,
};
pub use display::{
    diff_outputs, DisplayEvent, DisplayListener, DisplaySource, Output, OutputBounds, OutputId,
    SubscriptionId, VirtualDisplaySource,
};
pub use manager::{OutputManager, ReconcileReport};
pub use reconcile::{
    assignment_status, reconcile_assignments, AssignmentStatus, DisplayChange, DisplayReconciler,
    GuardScope, ReconcileState, Reconciliation, ReentrancyGuard,
};
pub use store::{AssignmentStore, MemoryAssignmentStore, SaveHook, StoreError, XmlAssignmentStore};
pub use surface::{
    RenderHandle, SlotFrame, SurfaceController, SurfaceError, SurfaceEvent, SurfaceFrame,
    SurfaceListener, SurfaceWindow, VisualContent, WindowFactory,
};
