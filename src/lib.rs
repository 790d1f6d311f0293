//! Stage Display Library
//!
//! Display orchestration for live presentations: assigns roles to the
//! connected outputs, keeps those roles stable across hot-plugs and restarts,
//! and drives double-buffered presentation surfaces with clipped transitions
//! and fitted slide text.

pub mod output;
pub mod settings;
pub mod telemetry;
pub mod text;
pub mod transition;

pub use output::{
    Assignment, DisplayChange, DisplayReconciler, DisplaySource, LogicalRole, Output, OutputBounds,
    OutputId, OutputManager, SurfaceController, VisualContent,
};
pub use settings::{PresentationSettings, SettingsError};
pub use text::{fit_font_size, FitRequest, TextMeasure};
pub use transition::{clip_region, ClipType, Region, TransitionKind, TransitionSpec};
