//! Display reconciliation
//!
//! Matches the persisted assignment set against the outputs the platform
//! currently reports. The first run assigns roles by position in the output
//! list; later runs keep user-chosen roles and only follow outputs that moved,
//! changed resolution, appeared or disappeared.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::assignment::{auto_assign, Assignment, LogicalRole, StoredAssignments};
use super::display::{Output, OutputBounds, OutputId};
use super::store::AssignmentStore;

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// How a persisted assignment relates to the live outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStatus {
    Valid,
    /// Output no longer exists
    IndexGone,
    /// Output origin moved
    PositionChanged,
    /// Output size changed at the same origin
    ResolutionChanged,
}

/// Overall classification of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayChange {
    /// Nothing was persisted; roles were auto-assigned
    NoPriorConfig,
    NoChange,
    CountIncreased,
    CountDecreased,
    PositionChanged,
    ResolutionChanged,
    /// Outputs unchanged, but the persisted set held more than one main output
    RolesRepaired,
}

impl DisplayChange {
    pub fn is_change(&self) -> bool {
        !matches!(self, DisplayChange::NoChange)
    }
}

/// Classify one persisted assignment against the live outputs
pub fn assignment_status(assignment: &Assignment, outputs: &[Output]) -> AssignmentStatus {
    match outputs.iter().find(|o| o.id == assignment.output_id) {
        None => AssignmentStatus::IndexGone,
        Some(output) if !output.bounds.same_origin(&assignment.bounds) => {
            AssignmentStatus::PositionChanged
        }
        Some(output) if !output.bounds.same_size(&assignment.bounds) => {
            AssignmentStatus::ResolutionChanged
        }
        Some(_) => AssignmentStatus::Valid,
    }
}

/// Result of [`reconcile_assignments`]
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub change: DisplayChange,
    /// New assignment set: surviving assignments in persisted order, then new outputs
    pub assignments: Vec<Assignment>,
    /// Status of each persisted assignment (empty on first run)
    pub statuses: Vec<(OutputId, AssignmentStatus)>,
    /// Extra main outputs found in the persisted set, now `None`
    pub demoted: Vec<OutputId>,
    /// Number of live outputs
    pub count: usize,
}

/// Reconcile `prior` against `outputs` without side effects.
///
/// Precedence when several things changed at once: a lost output wins over a
/// new one, which wins over a move, which wins over a resolution change.
/// At most one surviving assignment keeps [`LogicalRole::Main`]; later ones
/// are demoted.
pub fn reconcile_assignments(outputs: &[Output], prior: &StoredAssignments) -> Reconciliation {
    if prior.is_first_run() {
        return Reconciliation {
            change: DisplayChange::NoPriorConfig,
            assignments: auto_assign(outputs),
            statuses: Vec::new(),
            demoted: Vec::new(),
            count: outputs.len(),
        };
    }

    let mut assignments = Vec::with_capacity(outputs.len());
    let mut statuses = Vec::with_capacity(prior.assignments.len());
    let mut demoted = Vec::new();
    let mut seen = HashSet::new();
    let mut has_main = false;
    let (mut lost, mut moved, mut resized) = (false, false, false);

    for assignment in &prior.assignments {
        if !seen.insert(assignment.output_id) {
            continue;
        }
        let status = assignment_status(assignment, outputs);
        statuses.push((assignment.output_id, status));

        let mut kept = assignment.clone();
        match status {
            AssignmentStatus::IndexGone => {
                lost = true;
                continue;
            }
            AssignmentStatus::Valid => {}
            AssignmentStatus::PositionChanged | AssignmentStatus::ResolutionChanged => {
                if status == AssignmentStatus::PositionChanged {
                    moved = true;
                } else {
                    resized = true;
                }
                if let Some(output) = outputs.iter().find(|o| o.id == assignment.output_id) {
                    kept.set_bounds(output.bounds);
                }
            }
        }

        if kept.role == LogicalRole::Main {
            if has_main {
                kept.set_role(LogicalRole::None);
                demoted.push(kept.output_id);
            } else {
                has_main = true;
            }
        }
        assignments.push(kept);
    }

    let mut added = false;
    for output in outputs {
        if !seen.insert(output.id) {
            continue;
        }
        let role = if has_main {
            LogicalRole::None
        } else {
            has_main = true;
            LogicalRole::Main
        };
        assignments.push(Assignment::new(output, role));
        added = true;
    }

    let prior_count = usize::try_from(prior.count).unwrap_or(0);
    let change = if lost || outputs.len() < prior_count {
        DisplayChange::CountDecreased
    } else if added || outputs.len() > prior_count {
        DisplayChange::CountIncreased
    } else if moved {
        DisplayChange::PositionChanged
    } else if resized {
        DisplayChange::ResolutionChanged
    } else if !demoted.is_empty() {
        DisplayChange::RolesRepaired
    } else {
        DisplayChange::NoChange
    };

    Reconciliation {
        change,
        assignments,
        statuses,
        demoted,
        count: outputs.len(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REENTRANCY GUARD
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-reentrant critical section flag.
///
/// Clones share the flag, so a screen-change listener can hold one and ignore
/// notifications caused by the reconciler's own writes.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    active: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Enter the section; `None` if it is already held
    pub fn enter(&self) -> Option<GuardScope<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GuardScope { flag: &self.active })
    }
}

/// Held section; leaving scope releases it
pub struct GuardScope<'a> {
    flag: &'a AtomicBool,
}

impl Drop for GuardScope<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECONCILER
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifecycle of a [`DisplayReconciler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileState {
    #[default]
    Uninitialized,
    /// Last reconciliation auto-assigned from scratch
    NoPriorConfig,
    Reconciling,
    Stable,
}

/// Stateful reconciliation engine owning the assignment store
pub struct DisplayReconciler<S: AssignmentStore> {
    store: S,
    fallback: Output,
    state: ReconcileState,
    assignments: Vec<Assignment>,
    count: usize,
    guard: ReentrancyGuard,
}

impl<S: AssignmentStore> DisplayReconciler<S> {
    /// `fallback_bounds` is used for the synthetic output when none are reported
    pub fn new(store: S, fallback_bounds: OutputBounds) -> Self {
        Self {
            store,
            fallback: Output::fallback(fallback_bounds),
            state: ReconcileState::Uninitialized,
            assignments: Vec::new(),
            count: 0,
            guard: ReentrancyGuard::new(),
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Current assignment set
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn assignment(&self, id: OutputId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.output_id == id)
    }

    /// Shared guard flag, for listeners that must ignore self-induced changes
    pub fn guard(&self) -> &ReentrancyGuard {
        &self.guard
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Reconcile against the live outputs and persist the result.
    ///
    /// Returns `None` when called while a reconciliation is already running.
    pub fn reconcile(&mut self, outputs: &[Output]) -> Option<Reconciliation> {
        let guard = self.guard.clone();
        let Some(_scope) = guard.enter() else {
            tracing::debug!("Ignoring re-entrant reconcile");
            return None;
        };

        self.state = ReconcileState::Reconciling;

        let synthesized;
        let outputs = if outputs.is_empty() {
            tracing::warn!(
                fallback = %self.fallback.label(),
                "No outputs reported, using primary display fallback"
            );
            synthesized = [self.fallback.clone()];
            &synthesized[..]
        } else {
            outputs
        };

        let prior = match self.store.load() {
            Ok(prior) => prior,
            Err(e) => {
                tracing::warn!("Failed to load output assignments, treating as first run: {}", e);
                StoredAssignments::default()
            }
        };

        let result = reconcile_assignments(outputs, &prior);
        for (id, status) in &result.statuses {
            if *status != AssignmentStatus::Valid {
                tracing::debug!(output = %id, status = ?status, "Assignment out of date");
            }
        }
        for id in &result.demoted {
            tracing::warn!(output = %id, "Demoting extra main output from stored assignments");
        }

        self.assignments = result.assignments.clone();
        self.count = result.count;
        if result.change.is_change() {
            self.persist();
        }

        self.state = if result.change == DisplayChange::NoPriorConfig {
            ReconcileState::NoPriorConfig
        } else {
            ReconcileState::Stable
        };

        tracing::info!(
            change = ?result.change,
            outputs = result.count,
            active = self.assignments.iter().filter(|a| a.role.is_active()).count(),
            "Reconciled output assignments"
        );
        Some(result)
    }

    /// Give `role` to an output and persist.
    ///
    /// Assigning [`LogicalRole::Main`] demotes the previous main output to
    /// [`LogicalRole::None`]. Returns `false` for an unknown output, an unchanged
    /// role, or while a reconciliation is running.
    pub fn assign_role(&mut self, id: OutputId, role: LogicalRole) -> bool {
        let guard = self.guard.clone();
        let Some(_scope) = guard.enter() else {
            return false;
        };

        let Some(index) = self.assignments.iter().position(|a| a.output_id == id) else {
            tracing::warn!(output = %id, "Cannot assign role to unknown output");
            return false;
        };
        if self.assignments[index].role == role {
            return false;
        }

        if role == LogicalRole::Main {
            for other in self.assignments.iter_mut().filter(|a| a.role == LogicalRole::Main) {
                tracing::info!(output = %other.output_id, "Demoting previous main output");
                other.set_role(LogicalRole::None);
            }
        }
        self.assignments[index].set_role(role);
        self.persist();

        tracing::info!(output = %id, role = %role, "Assigned output role");
        true
    }

    fn persist(&mut self) {
        let stored = StoredAssignments::new(self.count, self.assignments.clone());
        if let Err(e) = self.store.save(&stored) {
            tracing::warn!("Failed to save output assignments: {}", e);
        }
    }
}
