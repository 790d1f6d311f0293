//! Stage Display - Headless Entry Point
//!
//! Runs the display orchestration against virtual outputs given as
//! `WxH+X+Y` arguments (one 1920x1080 output when none are given), sends two
//! text slides and logs what every surface ends up showing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use kurbo::Rect;
use stage_display::output::{
    Assignment, LogicalRole, MemoryAssignmentStore, OutputManager, RenderHandle, SurfaceError,
    SurfaceEvent, SurfaceFrame, SurfaceWindow, VirtualDisplaySource, VisualContent, WindowFactory,
};
use stage_display::settings::PresentationSettings;
use stage_display::text::{
    fit_font_size, FitRequest, FixedAdvanceMeasurer, FontSpec, TextLayout, TextMeasure,
};

/// Upper bound on how long the demo waits for transitions to settle
const MAX_RUN_TIME: Duration = Duration::from_secs(30);

const SLIDES: [&str; 2] = [
    "Welcome",
    "Amazing grace how sweet the sound\nthat saved a wretch like me",
];

/// Window that only counts what it is asked to draw
struct HeadlessWindow {
    output: String,
    frames: u64,
}

impl SurfaceWindow for HeadlessWindow {
    fn set_bounds(&mut self, bounds: Rect) {
        tracing::debug!(output = %self.output, ?bounds, "Window bounds");
    }

    fn present(&mut self, frame: &SurfaceFrame) {
        self.frames += 1;
        tracing::trace!(output = %self.output, progress = ?frame.progress, "Frame");
    }

    fn close(&mut self) {
        tracing::info!(output = %self.output, frames = self.frames, "Window closed");
    }
}

struct HeadlessWindowFactory;

impl WindowFactory for HeadlessWindowFactory {
    fn create_window(
        &mut self,
        assignment: &Assignment,
    ) -> Result<Box<dyn SurfaceWindow>, SurfaceError> {
        Ok(Box::new(HeadlessWindow {
            output: assignment.name.clone(),
            frames: 0,
        }))
    }
}

/// A block of fitted text
struct TextSlide {
    handle: RenderHandle,
    bounds: Rect,
}

impl VisualContent for TextSlide {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn play(&mut self) {}

    fn stop(&mut self) {}

    fn dispose(&mut self) {
        tracing::debug!(handle = self.handle.0, "Slide disposed");
    }

    fn render_handle(&self) -> RenderHandle {
        self.handle
    }
}

/// Builds slides sized for the surface they go to
struct SlideMaker {
    settings: PresentationSettings,
    measurer: FixedAdvanceMeasurer,
    next_handle: Cell<u64>,
}

impl SlideMaker {
    fn make(&self, text: &str, assignment: &Assignment) -> Box<dyn VisualContent> {
        let width = assignment.bounds.width as f64 * 0.9;
        let height = assignment.bounds.height as f64 * 0.8;
        let font: &FontSpec = &self.settings.font;

        let max_size = Some(self.settings.max_font_size);
        let request = FitRequest::paragraph(text, font, max_size, width, height)
            .with_line_spacing(self.settings.line_spacing);
        let size = fit_font_size(&request, &self.measurer);
        let layout = TextLayout {
            wrap_width: Some(width),
            line_spacing: self.settings.line_spacing,
        };
        let extent = self.measurer.measure(text, font, size, &layout);

        let handle = RenderHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        tracing::info!(
            output = %assignment.name,
            handle = handle.0,
            font_size = size,
            "Prepared slide"
        );

        // Centered in the surface
        let x = (assignment.bounds.width as f64 - extent.width) / 2.0;
        let y = (assignment.bounds.height as f64 - extent.height) / 2.0;
        Box::new(TextSlide {
            handle,
            bounds: Rect::new(x, y, x + extent.width, y + extent.height),
        })
    }
}

fn main() {
    // Initialize logging with tracing
    use stage_display::telemetry::{init_logging, LogConfig};
    let log_config = LogConfig::default();
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!("Stage Display v{}", env!("CARGO_PKG_VERSION"));

    let settings = PresentationSettings::load();
    tracing::info!(
        send = %settings.send_transition.kind,
        clear = %settings.clear_transition.kind,
        fps = settings.target_fps,
        "Loaded settings"
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut source = if args.is_empty() {
        VirtualDisplaySource::from_geometries(["1920x1080+0+0"])
    } else {
        VirtualDisplaySource::from_geometries(args.iter().map(String::as_str))
    };

    let mut manager =
        OutputManager::new(MemoryAssignmentStore::new(), HeadlessWindowFactory, &settings);
    manager.set_listener(Some(Rc::new(|event: &SurfaceEvent| match event {
        SurfaceEvent::TransitionStarted { output, kind, .. } => {
            tracing::info!(%output, %kind, "Transition started")
        }
        SurfaceEvent::TransitionFinished { output, showing } => {
            tracing::info!(%output, showing = ?showing.map(|h| h.0), "Transition finished")
        }
    })));

    let report = manager.init(&mut source);
    for failure in &report.failures {
        tracing::warn!("Surface unavailable: {}", failure);
    }

    let slides = SlideMaker {
        settings: settings.clone(),
        measurer: FixedAdvanceMeasurer::default(),
        next_handle: Cell::new(1),
    };

    let start = Instant::now();
    let sent = manager.send_all(|assignment| Some(slides.make(SLIDES[0], assignment)), start);
    tracing::info!(surfaces = sent, "Sent first slide");

    // Lands mid-transition on MAIN, so it waits as the pending request
    let main = manager.assignments().iter().find(|a| a.role == LogicalRole::Main).cloned();
    if let Some(main) = main {
        let slide = Some(slides.make(SLIDES[1], &main));
        if let Err(e) = manager.send_to(LogicalRole::Main, slide, start) {
            tracing::warn!("Could not send second slide: {}", e);
        }
    }

    let interval = settings.frame_interval();
    let mut frames = 0u64;
    while !manager.is_idle() && start.elapsed() < MAX_RUN_TIME {
        std::thread::sleep(interval);
        manager.tick(Instant::now());
        if let Some(report) = manager.poll(&source) {
            tracing::info!(change = ?report.change, "Outputs changed during run");
        }
        frames += 1;
    }
    tracing::info!(frames, elapsed_ms = start.elapsed().as_millis() as u64, "Transitions settled");

    for surface in manager.surfaces() {
        tracing::info!(
            output = %surface.output_id(),
            role = %surface.role(),
            name = %surface.assignment().name,
            showing = ?surface.showing().map(|h| h.0),
            "Final surface state"
        );
    }

    manager.shutdown(&mut source);
}
