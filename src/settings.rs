//! Settings management for Stage Display
//!
//! Presentation preferences are stored as XML in the platform config directory.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::output::OutputBounds;
use crate::text::FontSpec;
use crate::transition::{
    TransitionKind, TransitionSpec, WipeDirection, DEFAULT_TRANSITION_DURATION_MS,
};

fn default_max_font_size() -> f64 {
    72.0
}

fn default_target_fps() -> u32 {
    60
}

fn default_send_transition() -> TransitionSpec {
    TransitionSpec::new(TransitionKind::Wipe(WipeDirection::Right), DEFAULT_TRANSITION_DURATION_MS)
}

fn default_clear_transition() -> TransitionSpec {
    TransitionSpec::new(TransitionKind::Fade, DEFAULT_TRANSITION_DURATION_MS)
}

/// Presentation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "StageDisplaySettings")]
pub struct PresentationSettings {
    /// Transition used when new content is sent to a surface
    #[serde(rename = "sendTransition", default = "default_send_transition")]
    pub send_transition: TransitionSpec,

    /// Transition used when a surface is cleared
    #[serde(rename = "clearTransition", default = "default_clear_transition")]
    pub clear_transition: TransitionSpec,

    /// Bounds of the synthetic output used when no display is reported
    #[serde(rename = "fallbackOutput", default)]
    pub fallback_output: OutputBounds,

    /// Frame clock rate for transitions (24-240)
    #[serde(rename = "targetFps", default = "default_target_fps")]
    pub target_fps: u32,

    /// Font for slide text
    #[serde(rename = "font", default)]
    pub font: FontSpec,

    /// Upper bound for fitted text
    #[serde(rename = "maxFontSize", default = "default_max_font_size")]
    pub max_font_size: f64,

    /// Extra space between wrapped lines, in pixels
    #[serde(rename = "lineSpacing", default)]
    pub line_spacing: f64,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            send_transition: default_send_transition(),
            clear_transition: default_clear_transition(),
            fallback_output: OutputBounds::default(),
            target_fps: default_target_fps(),
            font: FontSpec::default(),
            max_font_size: default_max_font_size(),
            line_spacing: 0.0,
        }
    }
}

impl PresentationSettings {
    /// Pull out-of-range values back to something usable
    pub fn sanitize(&mut self) {
        self.target_fps = self.target_fps.clamp(24, 240);
        if !self.max_font_size.is_finite() || self.max_font_size < 1.0 {
            self.max_font_size = default_max_font_size();
        }
        if !self.line_spacing.is_finite() || self.line_spacing < 0.0 {
            self.line_spacing = 0.0;
        }
        self.fallback_output.width = self.fallback_output.width.max(1);
        self.fallback_output.height = self.fallback_output.height.max(1);
        self.send_transition.repeat_count = self.send_transition.repeat_count.max(1);
        self.clear_transition.repeat_count = self.clear_transition.repeat_count.max(1);
    }

    /// Time between frame clock ticks
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.target_fps.clamp(24, 240) as f64)
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let mut settings: Self = from_str(&contents)?;
        settings.sanitize();
        Ok(settings)
    }

    /// Save settings to an XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        fs::write(path, formatted)?;
        Ok(())
    }

    /// Get the settings file path (e.g. ~/.config/StageDisplay/settings.xml on Linux)
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("StageDisplay");
            p.push("settings.xml");
            p
        })
    }

    /// Load settings from the config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_file(&path)
    }
}

/// Settings-related errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
    #[error("Could not find config directory")]
    NoConfigDir,
}
