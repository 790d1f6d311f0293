//! Text measurement
//!
//! Fitting never measures text itself; it asks a [`TextMeasure`] implementation
//! supplied by the rendering path. [`FixedAdvanceMeasurer`] is a deterministic
//! implementation with a constant per-character advance, used by the headless
//! binary and in tests.

use serde::{Deserialize, Serialize};

/// Font selection passed through to the measurer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    #[serde(rename = "family")]
    pub family: String,
    #[serde(rename = "bold", default)]
    pub bold: bool,
    #[serde(rename = "italic", default)]
    pub italic: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            bold: false,
            italic: false,
        }
    }
}

impl FontSpec {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            ..Default::default()
        }
    }
}

/// Measured size of a block of text
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

impl TextExtent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Layout constraints for a measurement
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextLayout {
    /// Reflow into lines no wider than this; `None` keeps explicit line breaks only
    pub wrap_width: Option<f64>,
    /// Extra space between lines, in pixels
    pub line_spacing: f64,
}

/// External text measurement: `(text, font, size, layout) -> extent`
pub trait TextMeasure {
    fn measure(&self, text: &str, font: &FontSpec, size: f64, layout: &TextLayout) -> TextExtent;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, &FontSpec, f64, &TextLayout) -> TextExtent,
{
    fn measure(&self, text: &str, font: &FontSpec, size: f64, layout: &TextLayout) -> TextExtent {
        self(text, font, size, layout)
    }
}

/// Measurer with a constant advance per character
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    /// Character advance as a multiple of the font size
    pub advance: f64,
    /// Line height as a multiple of the font size
    pub line_height: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl FixedAdvanceMeasurer {
    fn line_width(&self, chars: usize, size: f64) -> f64 {
        chars as f64 * self.advance * size
    }

    /// Greedy word wrap; returns the character count of each produced line
    fn wrap(&self, text: &str, size: f64, wrap_width: f64) -> Vec<usize> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut current = 0usize;
            for word in paragraph.split_whitespace() {
                let len = word.chars().count();
                if current == 0 {
                    current = len;
                } else if self.line_width(current + 1 + len, size) <= wrap_width {
                    current += 1 + len;
                } else {
                    lines.push(current);
                    current = len;
                }
            }
            lines.push(current);
        }
        lines
    }
}

impl TextMeasure for FixedAdvanceMeasurer {
    fn measure(&self, text: &str, _font: &FontSpec, size: f64, layout: &TextLayout) -> TextExtent {
        let lines: Vec<usize> = match layout.wrap_width {
            Some(wrap_width) => self.wrap(text, size, wrap_width),
            None => text.split('\n').map(|l| l.chars().count()).collect(),
        };
        let longest = lines.iter().copied().max().unwrap_or(0);
        let count = lines.len().max(1) as f64;
        TextExtent {
            width: self.line_width(longest, size),
            height: count * self.line_height * size + (count - 1.0) * layout.line_spacing,
        }
    }
}
