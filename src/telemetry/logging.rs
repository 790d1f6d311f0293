//! Logging configuration and initialization
//!
//! Structured logging with tracing: compact console output for operators,
//! JSON for log aggregation, and an optional non-blocking log file.

use std::error::Error;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Filter variable checked before `RUST_LOG`
pub const LOG_ENV: &str = "STAGE_DISPLAY_LOG";

/// Set to `json` to switch console output to JSON
pub const LOG_FORMAT_ENV: &str = "STAGE_DISPLAY_LOG_FORMAT";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Enable console output (default: true)
    pub console_enabled: bool,
    /// Also write to a log file (default: false)
    pub file_enabled: bool,
    /// Log file location; defaults to `stage-display.log` in the platform cache dir
    pub file_path: Option<PathBuf>,
    /// Use JSON format for console logs (default: false)
    pub json_format: bool,
    /// Filter used when neither environment variable is set (default: "info")
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Where the log file goes when `file_enabled` is set
    pub fn resolved_file_path(&self) -> PathBuf {
        self.file_path.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("StageDisplay"))
                .unwrap_or_default()
                .join("stage-display.log")
        })
    }
}

/// Whether a `STAGE_DISPLAY_LOG_FORMAT` value asks for JSON
fn wants_json(format: Option<&str>, default: bool) -> bool {
    match format {
        Some(value) => value.trim().eq_ignore_ascii_case("json"),
        None => default,
    }
}

/// Initialize the logging system with the given configuration
///
/// Returns a guard that must be kept alive for the duration of the program so
/// the log file is flushed.
///
/// # Environment Variables
///
/// - `STAGE_DISPLAY_LOG`: log filter (e.g. "debug", "info,stage_display::output=debug")
/// - `STAGE_DISPLAY_LOG_FORMAT`: set to "json" for JSON output
///
/// # Example
///
/// ```no_run
/// use stage_display::telemetry::{init_logging, LogConfig};
///
/// let _guard = init_logging(&LogConfig::default()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<WorkerGuard>, Box<dyn Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let use_json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref(), config.json_format);

    let (file_layer, file_guard, log_path) = if config.file_enabled {
        let log_path = config.resolved_file_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&log_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);
        (Some(layer), Some(guard), Some(log_path))
    } else {
        (None, None, None)
    };

    let console = config.console_enabled;
    let json_layer = (console && use_json).then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
    });
    let compact_layer = (console && !use_json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    if let Some(path) = log_path {
        eprintln!("Logging to file: {}", path.display());
    }

    tracing::info!(
        target: "stage_display",
        version = env!("CARGO_PKG_VERSION"),
        json_format = use_json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(file_guard)
}

/// Initialize logging from the environment with the default [`LogConfig`]
pub fn init_logging_default() -> Result<Option<WorkerGuard>, Box<dyn Error + Send + Sync>> {
    init_logging(&LogConfig::default())
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;
