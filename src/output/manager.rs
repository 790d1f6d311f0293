//! Output manager
//!
//! Owns the reconciler and one [`SurfaceController`] per output whose role is
//! not `None`. Screen-change notifications only mark the manager dirty; the
//! host calls [`OutputManager::poll`] from its event loop to reconcile, and
//! [`OutputManager::tick`] once per frame to advance transitions.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::assignment::{Assignment, LogicalRole};
use super::display::{diff_outputs, DisplayEvent, DisplaySource, Output, OutputId, SubscriptionId};
use super::reconcile::{DisplayChange, DisplayReconciler};
use super::store::AssignmentStore;
use super::surface::{
    SurfaceController, SurfaceError, SurfaceListener, VisualContent, WindowFactory,
};
use crate::settings::PresentationSettings;
use crate::transition::TransitionSpec;

/// What a reconciliation did to the surfaces
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// `None` when the reconciliation was skipped
    pub change: Option<DisplayChange>,
    /// Connection changes since the previous enumeration
    pub events: Vec<DisplayEvent>,
    pub created: Vec<OutputId>,
    pub released: Vec<OutputId>,
    pub repositioned: Vec<OutputId>,
    /// Surfaces that could not be created; their siblings are unaffected
    pub failures: Vec<SurfaceError>,
}

/// Reconciliation plus the surfaces it implies
pub struct OutputManager<S: AssignmentStore, F: WindowFactory> {
    reconciler: DisplayReconciler<S>,
    factory: F,
    surfaces: BTreeMap<OutputId, SurfaceController>,
    send_transition: TransitionSpec,
    clear_transition: TransitionSpec,
    listener: Option<SurfaceListener>,
    dirty: Arc<AtomicBool>,
    subscription: Option<SubscriptionId>,
    outputs: Vec<Output>,
}

impl<S: AssignmentStore, F: WindowFactory> OutputManager<S, F> {
    pub fn new(store: S, factory: F, settings: &PresentationSettings) -> Self {
        Self {
            reconciler: DisplayReconciler::new(store, settings.fallback_output),
            factory,
            surfaces: BTreeMap::new(),
            send_transition: settings.send_transition.clone(),
            clear_transition: settings.clear_transition.clone(),
            listener: None,
            dirty: Arc::new(AtomicBool::new(false)),
            subscription: None,
            outputs: Vec::new(),
        }
    }

    /// Subscribe to screen changes and run the initial reconciliation
    pub fn init(&mut self, source: &mut dyn DisplaySource) -> ReconcileReport {
        if self.subscription.is_none() {
            let dirty = self.dirty.clone();
            let guard = self.reconciler.guard().clone();
            self.subscription = Some(source.subscribe(Box::new(move || {
                // Changes caused by our own reconcile writes are not new information
                if !guard.is_active() {
                    dirty.store(true, Ordering::Release);
                }
            })));
        }

        self.dirty.store(false, Ordering::Release);
        let report = self.reconcile_outputs(&source.outputs());
        tracing::info!(surfaces = self.surfaces.len(), "Output manager initialized");
        report
    }

    /// Reconcile if the output set changed or [`invalidate`](Self::invalidate) was called
    pub fn poll(&mut self, source: &dyn DisplaySource) -> Option<ReconcileReport> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.reconcile_outputs(&source.outputs()))
        } else {
            None
        }
    }

    /// Force a reconciliation on the next [`poll`](Self::poll)
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Reconcile against an explicit output list and sync surfaces
    pub fn reconcile_outputs(&mut self, outputs: &[Output]) -> ReconcileReport {
        let events = diff_outputs(&self.outputs, outputs);
        for event in &events {
            match event {
                DisplayEvent::Connected(output) => {
                    tracing::info!("Output connected: {}", output.label())
                }
                DisplayEvent::Disconnected(id) => tracing::info!("Output disconnected: {}", id),
            }
        }
        self.outputs = outputs.to_vec();

        let Some(result) = self.reconciler.reconcile(outputs) else {
            return ReconcileReport::default();
        };

        let mut report = self.sync_surfaces();
        report.change = Some(result.change);
        report.events = events;
        report
    }

    /// Give `role` to an output, creating and releasing surfaces to match
    pub fn assign_role(&mut self, id: OutputId, role: LogicalRole) -> ReconcileReport {
        if !self.reconciler.assign_role(id, role) {
            return ReconcileReport::default();
        }
        self.sync_surfaces()
    }

    fn sync_surfaces(&mut self) -> ReconcileReport {
        let assignments: Vec<Assignment> = self
            .reconciler
            .assignments()
            .iter()
            .filter(|a| a.role.is_active())
            .cloned()
            .collect();
        let mut report = ReconcileReport::default();

        let stale: Vec<OutputId> = self
            .surfaces
            .keys()
            .filter(|id| !assignments.iter().any(|a| a.output_id == **id))
            .copied()
            .collect();
        for id in stale {
            if let Some(mut surface) = self.surfaces.remove(&id) {
                surface.release();
                report.released.push(id);
            }
        }

        for assignment in assignments {
            let id = assignment.output_id;
            if let Some(surface) = self.surfaces.get_mut(&id) {
                if surface.assignment() != &assignment {
                    if surface.assignment().bounds != assignment.bounds {
                        report.repositioned.push(id);
                    }
                    surface.reassign(assignment);
                }
                continue;
            }

            match SurfaceController::create(
                assignment,
                &mut self.factory,
                self.send_transition.clone(),
                self.clear_transition.clone(),
            ) {
                Ok(mut surface) => {
                    surface.set_listener(self.listener.clone());
                    self.surfaces.insert(id, surface);
                    report.created.push(id);
                }
                Err(e) => {
                    tracing::warn!(output = %id, "Failed to create presentation surface: {}", e);
                    report.failures.push(e);
                }
            }
        }

        report
    }

    /// Send content to the surface with `role`; `None` clears it
    pub fn send_to(
        &mut self,
        role: LogicalRole,
        content: Option<Box<dyn VisualContent>>,
        now: Instant,
    ) -> Result<(), SurfaceError> {
        match self.surfaces.values_mut().find(|s| s.role() == role) {
            Some(surface) => surface.send(content, now),
            None => {
                if let Some(mut content) = content {
                    content.dispose();
                }
                Err(SurfaceError::NoSurfaceForRole(role))
            }
        }
    }

    /// Send content to a specific output's surface
    pub fn send_to_output(
        &mut self,
        id: OutputId,
        content: Option<Box<dyn VisualContent>>,
        now: Instant,
    ) -> Result<(), SurfaceError> {
        match self.surfaces.get_mut(&id) {
            Some(surface) => surface.send(content, now),
            None => {
                if let Some(mut content) = content {
                    content.dispose();
                }
                Err(SurfaceError::OutputNotFound(id))
            }
        }
    }

    pub fn clear(&mut self, role: LogicalRole, now: Instant) -> Result<(), SurfaceError> {
        self.send_to(role, None, now)
    }

    /// Send to every surface; `make` builds content per assignment.
    ///
    /// Returns the number of surfaces sent to.
    pub fn send_all<M>(&mut self, mut make: M, now: Instant) -> usize
    where
        M: FnMut(&Assignment) -> Option<Box<dyn VisualContent>>,
    {
        let mut sent = 0;
        for surface in self.surfaces.values_mut() {
            let content = make(surface.assignment());
            match surface.send(content, now) {
                Ok(()) => sent += 1,
                Err(e) => tracing::warn!("Broadcast skipped a surface: {}", e),
            }
        }
        sent
    }

    /// Advance every surface's transition
    pub fn tick(&mut self, now: Instant) {
        for surface in self.surfaces.values_mut() {
            surface.tick(now);
        }
    }

    /// No transition running or waiting anywhere
    pub fn is_idle(&self) -> bool {
        self.surfaces
            .values()
            .all(|s| !s.is_transitioning() && !s.has_pending())
    }

    /// Change the transitions for existing and future surfaces
    pub fn set_transitions(
        &mut self,
        send_transition: TransitionSpec,
        clear_transition: TransitionSpec,
    ) {
        for surface in self.surfaces.values_mut() {
            surface.set_transitions(send_transition.clone(), clear_transition.clone());
        }
        self.send_transition = send_transition;
        self.clear_transition = clear_transition;
    }

    /// Listener for every surface's events
    pub fn set_listener(&mut self, listener: Option<SurfaceListener>) {
        for surface in self.surfaces.values_mut() {
            surface.set_listener(listener.clone());
        }
        self.listener = listener;
    }

    pub fn assignments(&self) -> &[Assignment] {
        self.reconciler.assignments()
    }

    pub fn reconciler(&self) -> &DisplayReconciler<S> {
        &self.reconciler
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &SurfaceController> {
        self.surfaces.values()
    }

    pub fn surface(&self, id: OutputId) -> Option<&SurfaceController> {
        self.surfaces.get(&id)
    }

    pub fn surface_for_role(&self, role: LogicalRole) -> Option<&SurfaceController> {
        self.surfaces.values().find(|s| s.role() == role)
    }

    /// Unsubscribe from screen changes and release every surface
    pub fn shutdown(&mut self, source: &mut dyn DisplaySource) {
        if let Some(id) = self.subscription.take() {
            source.unsubscribe(id);
        }
        let count = self.surfaces.len();
        for (_, mut surface) in std::mem::take(&mut self.surfaces) {
            surface.release();
        }
        tracing::info!(released = count, "Output manager shut down");
    }
}
