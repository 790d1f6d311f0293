//! Font size fitting
//!
//! Finds the largest font size at which a block of text fits a target box,
//! by binary search against an external [`TextMeasure`]. Two modes:
//!
//! - single line: only the width is constrained
//! - wrapped paragraph: text reflows to the target width and the height is bounded
//!
//! When no maximum size is given the upper end of the bracket is unknown, and
//! the search grows the probe by the measured-to-target ratio instead of
//! doubling until the text first overflows.

use super::measure::{FontSpec, TextLayout, TextMeasure};

/// Stop once the size bracket is this narrow
const BRACKET_TOLERANCE: f64 = 0.1;

/// Hard cap on measurement probes
const MAX_ITERATIONS: u32 = 100;

/// First probe when no maximum size is given
pub const UNBOUNDED_START_SIZE: f64 = 12.0;

/// Smallest size ever returned
pub const MIN_FONT_SIZE: f64 = 1.0;

/// A text block to fit
#[derive(Debug, Clone)]
pub struct FitRequest<'a> {
    pub text: &'a str,
    pub font: &'a FontSpec,
    /// Largest acceptable size; `None` searches without an upper bound
    pub max_size: Option<f64>,
    pub target_width: f64,
    /// Wrapped-paragraph mode when set; single-line mode otherwise
    pub target_height: Option<f64>,
    pub line_spacing: f64,
}

impl<'a> FitRequest<'a> {
    /// Single-line fit against a width
    pub fn single_line(
        text: &'a str,
        font: &'a FontSpec,
        max_size: Option<f64>,
        target_width: f64,
    ) -> Self {
        Self {
            text,
            font,
            max_size,
            target_width,
            target_height: None,
            line_spacing: 0.0,
        }
    }

    /// Wrapped-paragraph fit against a box
    pub fn paragraph(
        text: &'a str,
        font: &'a FontSpec,
        max_size: Option<f64>,
        target_width: f64,
        target_height: f64,
    ) -> Self {
        Self {
            text,
            font,
            max_size,
            target_width,
            target_height: Some(target_height),
            line_spacing: 0.0,
        }
    }

    pub fn with_line_spacing(mut self, line_spacing: f64) -> Self {
        self.line_spacing = line_spacing;
        self
    }

    fn layout(&self) -> TextLayout {
        TextLayout {
            wrap_width: self.target_height.map(|_| self.target_width),
            line_spacing: self.line_spacing,
        }
    }
}

/// Outcome of a single measurement probe
struct Probe {
    fits: bool,
    /// How much the size could scale before hitting the target
    ratio: f64,
    /// The measured extent is zero, so size has no effect
    sizeless: bool,
}

fn probe(request: &FitRequest<'_>, measurer: &impl TextMeasure, size: f64) -> Probe {
    let extent = measurer.measure(request.text, request.font, size, &request.layout());
    let fits_width = extent.width <= request.target_width;
    let fits_height = request.target_height.map_or(true, |h| extent.height <= h);

    let width_ratio = if extent.width > 0.0 {
        request.target_width / extent.width
    } else {
        f64::INFINITY
    };
    let height_ratio = match request.target_height {
        Some(h) if extent.height > 0.0 => h / extent.height,
        _ => f64::INFINITY,
    };

    Probe {
        fits: fits_width && fits_height,
        ratio: width_ratio.min(height_ratio),
        sizeless: extent.width <= 0.0 && extent.height <= 0.0,
    }
}

/// Largest font size at which the request's text fits, never below 1.
///
/// Text that already fits at `max_size` gets `max_size` back unchanged.
/// Otherwise the result is one point below the converged size as a safety
/// margin. Exhausting the iteration cap is not an error: the best size found
/// so far is returned.
pub fn fit_font_size(request: &FitRequest<'_>, measurer: &impl TextMeasure) -> f64 {
    if request.target_width <= 0.0 || request.target_height.is_some_and(|h| h <= 0.0) {
        return MIN_FONT_SIZE;
    }

    let mut max = request
        .max_size
        .filter(|m| m.is_finite())
        .map(|m| m.max(MIN_FONT_SIZE));
    let mut min = MIN_FONT_SIZE;
    let mut current = max.unwrap_or(UNBOUNDED_START_SIZE).max(MIN_FONT_SIZE);

    let first = probe(request, measurer, current);
    if first.sizeless || (first.fits && max == Some(current)) {
        return current;
    }

    let mut result = first;
    let mut iterations = 1;
    loop {
        if result.fits {
            min = current;
        } else {
            max = Some(current);
        }

        let next = match max {
            Some(max) if max - min <= BRACKET_TOLERANCE => break,
            Some(max) => (min + max) / 2.0,
            // Grow proportionally, at least a point per step so linear measurers converge
            None => (current * result.ratio).max(current + 1.0),
        };

        if iterations >= MAX_ITERATIONS {
            tracing::warn!(
                text_len = request.text.len(),
                min,
                max = ?max,
                "Text fit hit the iteration cap; using best size found"
            );
            break;
        }

        current = next;
        result = probe(request, measurer, current);
        iterations += 1;
    }

    (min.min(current).floor() - 1.0).max(MIN_FONT_SIZE)
}
