//! Presentation surfaces
//!
//! A [`SurfaceController`] drives one output window. It holds two content
//! slots: the front slot is what the audience sees, the back slot receives
//! incoming content while a transition runs. When a transition completes the
//! outgoing content is disposed and the slots swap roles by index.
//!
//! Time is supplied by the caller: [`SurfaceController::tick`] is called once
//! per frame with the current instant, and each tick presents a
//! [`SurfaceFrame`] describing both slots with their clip regions.

use std::rc::Rc;
use std::time::Instant;

use kurbo::Rect;

use super::assignment::{Assignment, LogicalRole};
use super::display::OutputId;
use crate::transition::{
    clip_region, ClipType, Region, TransitionKind, TransitionSpec, TransitionTimeline,
};

/// Opaque handle the renderer uses to draw a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Content shown on a surface, owned by the rendering subsystem
pub trait VisualContent {
    /// Natural bounds of the content in surface-local coordinates
    fn bounds(&self) -> Rect;
    fn play(&mut self);
    fn stop(&mut self);
    /// Free resources; called once, after the content leaves the surface
    fn dispose(&mut self);
    fn render_handle(&self) -> RenderHandle;
}

/// Errors reported by surfaces
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("failed to create window for {output}: {reason}")]
    WindowCreation { output: OutputId, reason: String },
    #[error("{0} is not connected")]
    OutputNotFound(OutputId),
    #[error("{0} has no role and cannot show content")]
    Unassigned(OutputId),
    #[error("no surface has the {0} role")]
    NoSurfaceForRole(LogicalRole),
    #[error("surface for {0} has been released")]
    Released(OutputId),
}

/// How one slot is drawn in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct SlotFrame {
    pub content: Option<RenderHandle>,
    pub content_bounds: Option<Rect>,
    /// Visible region in surface-local coordinates; `None` draws unclipped
    pub clip: Option<Region>,
    pub opacity: f64,
}

impl SlotFrame {
    /// Slot that draws nothing
    pub fn hidden() -> Self {
        Self {
            content: None,
            content_bounds: None,
            clip: Some(Region::Empty),
            opacity: 0.0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
            && self.opacity > 0.0
            && !self.clip.as_ref().is_some_and(Region::is_empty)
    }
}

/// Everything a window needs to draw one frame.
///
/// The front slot is drawn first and the back slot over it.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFrame {
    /// Window bounds in desktop coordinates
    pub bounds: Rect,
    pub front: SlotFrame,
    pub back: SlotFrame,
    /// Transition progress, `None` when idle
    pub progress: Option<f64>,
}

/// Platform window backing a surface
pub trait SurfaceWindow {
    fn set_bounds(&mut self, bounds: Rect);
    fn present(&mut self, frame: &SurfaceFrame);
    fn close(&mut self);
}

/// Creates windows for assignments
pub trait WindowFactory {
    fn create_window(
        &mut self,
        assignment: &Assignment,
    ) -> Result<Box<dyn SurfaceWindow>, SurfaceError>;
}

/// Notifications emitted by a surface
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    TransitionStarted {
        output: OutputId,
        kind: TransitionKind,
        incoming: Option<RenderHandle>,
    },
    TransitionFinished {
        output: OutputId,
        showing: Option<RenderHandle>,
    },
}

/// Callback for [`SurfaceEvent`]s
pub type SurfaceListener = Rc<dyn Fn(&SurfaceEvent)>;

#[derive(Default)]
struct Slot {
    content: Option<Box<dyn VisualContent>>,
}

impl Slot {
    fn handle(&self) -> Option<RenderHandle> {
        self.content.as_ref().map(|c| c.render_handle())
    }

    fn content_bounds(&self) -> Option<Rect> {
        self.content.as_ref().map(|c| c.bounds())
    }

    /// Stop and dispose whatever the slot holds
    fn discard(&mut self) {
        if let Some(mut content) = self.content.take() {
            content.stop();
            content.dispose();
        }
    }
}

/// A request waiting for the running transition to finish; `None` clears
struct PendingRequest {
    content: Option<Box<dyn VisualContent>>,
}

/// Double-buffered presentation surface for one output
pub struct SurfaceController {
    assignment: Assignment,
    window: Option<Box<dyn SurfaceWindow>>,
    slots: [Slot; 2],
    front: usize,
    transition: Option<TransitionTimeline>,
    pending: Option<PendingRequest>,
    send_transition: TransitionSpec,
    clear_transition: TransitionSpec,
    listener: Option<SurfaceListener>,
    released: bool,
}

impl SurfaceController {
    /// Open a window for `assignment` and present an empty frame
    pub fn create(
        assignment: Assignment,
        factory: &mut dyn WindowFactory,
        send_transition: TransitionSpec,
        clear_transition: TransitionSpec,
    ) -> Result<Self, SurfaceError> {
        if !assignment.role.is_active() {
            return Err(SurfaceError::Unassigned(assignment.output_id));
        }

        let mut window = factory.create_window(&assignment)?;
        window.set_bounds(assignment.bounds.to_rect());

        let mut surface = Self {
            assignment,
            window: Some(window),
            slots: [Slot::default(), Slot::default()],
            front: 0,
            transition: None,
            pending: None,
            send_transition,
            clear_transition,
            listener: None,
            released: false,
        };
        surface.present_idle();

        tracing::info!(
            output = %surface.assignment.output_id,
            role = %surface.assignment.role,
            name = %surface.assignment.name,
            "Created presentation surface"
        );
        Ok(surface)
    }

    pub fn output_id(&self) -> OutputId {
        self.assignment.output_id
    }

    pub fn role(&self) -> LogicalRole {
        self.assignment.role
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Content currently in the front slot
    pub fn showing(&self) -> Option<RenderHandle> {
        self.slots[self.front].handle()
    }

    pub fn set_listener(&mut self, listener: Option<SurfaceListener>) {
        self.listener = listener;
    }

    /// Transitions used from the next display on
    pub fn set_transitions(
        &mut self,
        send_transition: TransitionSpec,
        clear_transition: TransitionSpec,
    ) {
        self.send_transition = send_transition;
        self.clear_transition = clear_transition;
    }

    /// Show `content`, or clear the surface when `None`.
    ///
    /// While a transition runs the request is parked; a later request replaces
    /// (and disposes) an earlier parked one.
    pub fn send(
        &mut self,
        content: Option<Box<dyn VisualContent>>,
        now: Instant,
    ) -> Result<(), SurfaceError> {
        if self.released {
            if let Some(mut content) = content {
                content.dispose();
            }
            return Err(SurfaceError::Released(self.assignment.output_id));
        }

        if self.transition.is_some() {
            if let Some(replaced) = self.pending.replace(PendingRequest { content }) {
                tracing::debug!(output = %self.assignment.output_id, "Replacing pending request");
                if let Some(mut discarded) = replaced.content {
                    discarded.dispose();
                }
            }
            return Ok(());
        }

        self.display(content, now);
        Ok(())
    }

    /// Shorthand for sending nothing
    pub fn clear(&mut self, now: Instant) -> Result<(), SurfaceError> {
        self.send(None, now)
    }

    /// Advance the running transition and present a frame
    pub fn tick(&mut self, now: Instant) {
        if !self.released {
            self.advance(now);
        }
    }

    /// Jump the running transition to its end, leaving the incoming content fully shown
    pub fn complete_transition(&mut self, now: Instant) {
        if !self.released && self.transition.is_some() {
            self.finish_transition(now);
        }
    }

    /// Follow new bounds for the same output; a running transition continues
    pub fn reassign(&mut self, assignment: Assignment) {
        if self.released {
            return;
        }
        let moved = assignment.bounds != self.assignment.bounds;
        self.assignment = assignment;

        if moved {
            tracing::info!(
                output = %self.assignment.output_id,
                name = %self.assignment.name,
                "Repositioning presentation surface"
            );
            let bounds = self.assignment.bounds.to_rect();
            if let Some(window) = self.window.as_mut() {
                window.set_bounds(bounds);
            }
            if self.transition.is_none() {
                self.present_idle();
            }
        }
    }

    /// Halt any transition, dispose all content and close the window.
    ///
    /// Safe to call more than once; no events fire afterwards.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.transition.take().is_some() {
            tracing::debug!(output = %self.assignment.output_id, "Halting transition on release");
        }
        if let Some(PendingRequest { content: Some(mut content) }) = self.pending.take() {
            content.dispose();
        }
        for slot in self.slots.iter_mut() {
            slot.discard();
        }
        if let Some(mut window) = self.window.take() {
            window.close();
        }
        self.listener = None;

        tracing::info!(output = %self.assignment.output_id, "Released presentation surface");
    }

    fn back(&self) -> usize {
        1 - self.front
    }

    fn display(&mut self, content: Option<Box<dyn VisualContent>>, now: Instant) {
        let spec = if content.is_some() {
            self.send_transition.clone()
        } else {
            self.clear_transition.clone()
        };

        let back = self.back();
        self.slots[back].discard();
        self.slots[back].content = content;
        if let Some(incoming) = self.slots[back].content.as_mut() {
            incoming.play();
        }

        tracing::debug!(
            output = %self.assignment.output_id,
            kind = %spec.kind,
            duration_ms = spec.duration_ms,
            "Starting transition"
        );
        self.emit(SurfaceEvent::TransitionStarted {
            output: self.assignment.output_id,
            kind: spec.kind.clone(),
            incoming: self.slots[back].handle(),
        });

        self.transition = Some(TransitionTimeline::start(spec, now));
        self.advance(now);
    }

    fn advance(&mut self, now: Instant) {
        let Some(timeline) = self.transition.as_ref() else {
            return;
        };
        if timeline.is_complete(now) {
            self.finish_transition(now);
            return;
        }

        let frame = self.transition_frame(&timeline.spec().kind, timeline.fraction(now));
        self.present(&frame);
    }

    fn finish_transition(&mut self, now: Instant) {
        if self.transition.take().is_none() {
            return;
        }

        let front = self.front;
        self.slots[front].discard();
        self.front = self.back();
        self.present_idle();

        let showing = self.showing();
        tracing::debug!(
            output = %self.assignment.output_id,
            showing = ?showing,
            "Transition finished"
        );
        self.emit(SurfaceEvent::TransitionFinished {
            output: self.assignment.output_id,
            showing,
        });

        if let Some(next) = self.pending.take() {
            self.display(next.content, now);
        }
    }

    fn local_bounds(&self) -> Rect {
        let bounds = &self.assignment.bounds;
        Rect::new(0.0, 0.0, bounds.width as f64, bounds.height as f64)
    }

    fn transition_frame(&self, kind: &TransitionKind, fraction: f64) -> SurfaceFrame {
        let local = self.local_bounds();
        let (out_opacity, in_opacity) = match kind {
            TransitionKind::Fade => (1.0 - fraction, fraction),
            _ => (1.0, 1.0),
        };
        let outgoing = &self.slots[self.front];
        let incoming = &self.slots[self.back()];

        SurfaceFrame {
            bounds: self.assignment.bounds.to_rect(),
            front: SlotFrame {
                content: outgoing.handle(),
                content_bounds: outgoing.content_bounds(),
                clip: clip_region(kind, local, fraction, ClipType::Out),
                opacity: out_opacity,
            },
            back: SlotFrame {
                content: incoming.handle(),
                content_bounds: incoming.content_bounds(),
                clip: clip_region(kind, local, fraction, ClipType::In),
                opacity: in_opacity,
            },
            progress: Some(fraction),
        }
    }

    fn present_idle(&mut self) {
        let front = &self.slots[self.front];
        let frame = SurfaceFrame {
            bounds: self.assignment.bounds.to_rect(),
            front: SlotFrame {
                content: front.handle(),
                content_bounds: front.content_bounds(),
                clip: None,
                opacity: 1.0,
            },
            back: SlotFrame::hidden(),
            progress: None,
        };
        self.present(&frame);
    }

    fn present(&mut self, frame: &SurfaceFrame) {
        if let Some(window) = self.window.as_mut() {
            window.present(frame);
        }
    }

    fn emit(&self, event: SurfaceEvent) {
        if let Some(listener) = self.listener.as_ref() {
            listener(&event);
        }
    }
}

impl Drop for SurfaceController {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::display::{Output, OutputBounds};
    use crate::transition::WipeDirection;
    use kurbo::Point;
    use std::cell::RefCell;
    use std::time::Duration;

    type Log = Rc<RefCell<Vec<String>>>;

    struct FakeContent {
        id: u64,
        log: Log,
    }

    impl VisualContent for FakeContent {
        fn bounds(&self) -> Rect {
            Rect::new(0.0, 0.0, 100.0, 50.0)
        }
        fn play(&mut self) {
            self.log.borrow_mut().push(format!("play {}", self.id));
        }
        fn stop(&mut self) {
            self.log.borrow_mut().push(format!("stop {}", self.id));
        }
        fn dispose(&mut self) {
            self.log.borrow_mut().push(format!("dispose {}", self.id));
        }
        fn render_handle(&self) -> RenderHandle {
            RenderHandle(self.id)
        }
    }

    #[derive(Default)]
    struct WindowLog {
        frames: Vec<SurfaceFrame>,
        bounds: Vec<Rect>,
        closed: usize,
    }

    struct FakeWindow(Rc<RefCell<WindowLog>>);

    impl SurfaceWindow for FakeWindow {
        fn set_bounds(&mut self, bounds: Rect) {
            self.0.borrow_mut().bounds.push(bounds);
        }
        fn present(&mut self, frame: &SurfaceFrame) {
            self.0.borrow_mut().frames.push(frame.clone());
        }
        fn close(&mut self) {
            self.0.borrow_mut().closed += 1;
        }
    }

    struct FakeFactory {
        window: Rc<RefCell<WindowLog>>,
        fail: bool,
    }

    impl WindowFactory for FakeFactory {
        fn create_window(
            &mut self,
            assignment: &Assignment,
        ) -> Result<Box<dyn SurfaceWindow>, SurfaceError> {
            if self.fail {
                return Err(SurfaceError::WindowCreation {
                    output: assignment.output_id,
                    reason: "no GPU".to_string(),
                });
            }
            Ok(Box::new(FakeWindow(self.window.clone())))
        }
    }

    struct Harness {
        surface: SurfaceController,
        window: Rc<RefCell<WindowLog>>,
        content_log: Log,
        events: Rc<RefCell<Vec<SurfaceEvent>>>,
        start: Instant,
    }

    impl Harness {
        fn new(send: TransitionSpec, clear: TransitionSpec) -> Self {
            let window = Rc::new(RefCell::new(WindowLog::default()));
            let mut factory = FakeFactory {
                window: window.clone(),
                fail: false,
            };
            let output = Output::new(OutputId(2), OutputBounds::new(1920, 0, 800, 600));
            let assignment = Assignment::new(&output, LogicalRole::Main);
            let mut surface =
                SurfaceController::create(assignment, &mut factory, send, clear).unwrap();

            let events = Rc::new(RefCell::new(Vec::new()));
            let sink = events.clone();
            surface.set_listener(Some(Rc::new(move |e: &SurfaceEvent| {
                sink.borrow_mut().push(e.clone())
            })));

            Self {
                surface,
                window,
                content_log: Rc::new(RefCell::new(Vec::new())),
                events,
                start: Instant::now(),
            }
        }

        fn fade() -> Self {
            let fade = TransitionSpec::new(TransitionKind::Fade, 100);
            Self::new(fade.clone(), fade)
        }

        fn content(&self, id: u64) -> Option<Box<dyn VisualContent>> {
            Some(Box::new(FakeContent {
                id,
                log: self.content_log.clone(),
            }))
        }

        fn at(&self, ms: u64) -> Instant {
            self.start + Duration::from_millis(ms)
        }

        fn send(&mut self, id: u64, ms: u64) {
            let content = self.content(id);
            let now = self.at(ms);
            self.surface.send(content, now).unwrap();
        }

        fn tick(&mut self, ms: u64) {
            let now = self.at(ms);
            self.surface.tick(now);
        }

        fn finished(&self) -> Vec<Option<RenderHandle>> {
            self.events
                .borrow()
                .iter()
                .filter_map(|e| match e {
                    SurfaceEvent::TransitionFinished { showing, .. } => Some(*showing),
                    _ => None,
                })
                .collect()
        }

        fn last_frame(&self) -> SurfaceFrame {
            self.window.borrow().frames.last().cloned().unwrap()
        }
    }

    #[test]
    fn test_create_presents_empty_frame() {
        let h = Harness::fade();
        let log = h.window.borrow();
        assert_eq!(log.bounds, vec![Rect::new(1920.0, 0.0, 2720.0, 600.0)]);
        assert_eq!(log.frames.len(), 1);
        assert!(!log.frames[0].front.is_visible());
        assert_eq!(h.surface.showing(), None);
    }

    #[test]
    fn test_sends_while_idle_display_in_order() {
        let mut h = Harness::fade();

        h.send(1, 0);
        assert!(h.surface.is_transitioning());
        h.tick(100);
        assert!(!h.surface.is_transitioning());
        assert_eq!(h.surface.showing(), Some(RenderHandle(1)));

        h.send(2, 200);
        h.tick(250);
        assert_eq!(h.surface.showing(), Some(RenderHandle(1)));
        h.tick(300);
        assert_eq!(h.surface.showing(), Some(RenderHandle(2)));

        assert_eq!(h.finished(), vec![Some(RenderHandle(1)), Some(RenderHandle(2))]);
        assert_eq!(
            *h.content_log.borrow(),
            vec!["play 1", "play 2", "stop 1", "dispose 1"]
        );
    }

    #[test]
    fn test_latest_pending_request_wins() {
        let mut h = Harness::fade();

        h.send(1, 0);
        h.send(2, 10);
        h.send(3, 20);
        assert!(h.surface.has_pending());

        h.tick(100);
        assert_eq!(h.surface.showing(), Some(RenderHandle(1)));
        assert!(h.surface.is_transitioning());
        assert!(!h.surface.has_pending());

        h.tick(200);
        assert_eq!(h.surface.showing(), Some(RenderHandle(3)));
        assert_eq!(h.finished(), vec![Some(RenderHandle(1)), Some(RenderHandle(3))]);

        let log = h.content_log.borrow();
        assert!(log.contains(&"dispose 2".to_string()));
        assert!(!log.contains(&"play 2".to_string()));
    }

    #[test]
    fn test_slots_swap_by_index() {
        let mut h = Harness::fade();
        assert_eq!(h.surface.front, 0);
        h.send(1, 0);
        h.tick(100);
        assert_eq!(h.surface.front, 1);
        h.send(2, 100);
        h.tick(200);
        assert_eq!(h.surface.front, 0);
        assert!(h.surface.slots[1].content.is_none());
    }

    #[test]
    fn test_wipe_frame_clips_both_slots() {
        let wipe = TransitionSpec::new(TransitionKind::Wipe(WipeDirection::Right), 100);
        let mut h = Harness::new(wipe, TransitionSpec::cut());
        h.send(1, 0);
        h.tick(100);
        h.send(2, 100);
        h.tick(150);

        let frame = h.last_frame();
        assert!((frame.progress.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(frame.front.content, Some(RenderHandle(1)));
        assert_eq!(frame.back.content, Some(RenderHandle(2)));

        let incoming = frame.back.clip.unwrap();
        let outgoing = frame.front.clip.unwrap();
        // Surface-local: 800x600, half revealed from the left
        assert!(incoming.contains(Point::new(100.0, 300.0)));
        assert!(!outgoing.contains(Point::new(100.0, 300.0)));
        assert!(outgoing.contains(Point::new(700.0, 300.0)));
        assert!(!incoming.contains(Point::new(700.0, 300.0)));
    }

    #[test]
    fn test_fade_drives_opacity() {
        let mut h = Harness::fade();
        h.send(1, 0);
        h.tick(25);
        let frame = h.last_frame();
        assert!(frame.back.clip.is_none());
        assert!((frame.back.opacity - 0.25).abs() < 1e-9);
        assert!((frame.front.opacity - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_clear_uses_clear_transition() {
        let send = TransitionSpec::new(TransitionKind::Fade, 100);
        let mut h = Harness::new(send, TransitionSpec::cut());
        h.send(1, 0);
        h.tick(100);

        let now = h.at(200);
        h.surface.clear(now).unwrap();
        assert!(!h.surface.is_transitioning());
        assert_eq!(h.surface.showing(), None);
        assert_eq!(h.finished(), vec![Some(RenderHandle(1)), None]);
        assert!(!h.last_frame().front.is_visible());
        assert!(h.content_log.borrow().contains(&"dispose 1".to_string()));
    }

    #[test]
    fn test_complete_transition_leaves_content_fully_shown() {
        let mut h = Harness::fade();
        h.send(1, 0);
        h.tick(30);
        let now = h.at(40);
        h.surface.complete_transition(now);

        assert!(!h.surface.is_transitioning());
        let frame = h.last_frame();
        assert_eq!(frame.front.content, Some(RenderHandle(1)));
        assert_eq!(frame.front.clip, None);
        assert_eq!(frame.front.opacity, 1.0);
        assert!(!frame.back.is_visible());
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut h = Harness::fade();
        h.send(1, 0);
        h.tick(100);
        h.send(2, 100);
        h.send(3, 110);

        h.surface.release();
        let events_after_release = h.events.borrow().len();
        let frames_after_release = h.window.borrow().frames.len();
        h.surface.release();

        h.tick(500);
        assert_eq!(h.events.borrow().len(), events_after_release);
        assert_eq!(h.window.borrow().frames.len(), frames_after_release);
        assert_eq!(h.window.borrow().closed, 1);
        assert!(!h.surface.is_transitioning());

        let log = h.content_log.borrow().clone();
        for id in 1..=3 {
            let disposals = log.iter().filter(|l| **l == format!("dispose {id}")).count();
            assert_eq!(disposals, 1, "content {id}");
        }

        let content = h.content(4);
        let now = h.at(600);
        let result = h.surface.send(content, now);
        assert!(matches!(result, Err(SurfaceError::Released(OutputId(2)))));
        assert!(h.content_log.borrow().contains(&"dispose 4".to_string()));
    }

    #[test]
    fn test_reassign_keeps_transition_running() {
        let mut h = Harness::fade();
        h.send(1, 0);
        h.tick(50);

        let mut moved = h.surface.assignment().clone();
        moved.set_bounds(OutputBounds::new(-1280, 0, 1280, 720));
        h.surface.reassign(moved);

        assert!(h.surface.is_transitioning());
        assert_eq!(
            h.window.borrow().bounds.last(),
            Some(&Rect::new(-1280.0, 0.0, 0.0, 720.0))
        );

        h.tick(75);
        assert_eq!(h.last_frame().bounds, Rect::new(-1280.0, 0.0, 0.0, 720.0));
        h.tick(100);
        assert_eq!(h.surface.showing(), Some(RenderHandle(1)));
    }

    #[test]
    fn test_create_reports_failures() {
        let window = Rc::new(RefCell::new(WindowLog::default()));
        let output = Output::new(OutputId(9), OutputBounds::default());

        let mut failing = FakeFactory {
            window: window.clone(),
            fail: true,
        };
        let result = SurfaceController::create(
            Assignment::new(&output, LogicalRole::Teleprompt),
            &mut failing,
            TransitionSpec::default(),
            TransitionSpec::default(),
        );
        assert!(matches!(result, Err(SurfaceError::WindowCreation { .. })));

        let mut working = FakeFactory { window, fail: false };
        let result = SurfaceController::create(
            Assignment::new(&output, LogicalRole::None),
            &mut working,
            TransitionSpec::default(),
            TransitionSpec::default(),
        );
        assert!(matches!(result, Err(SurfaceError::Unassigned(OutputId(9)))));
    }
}
