//! Text layout helpers for compositing text onto slides

pub mod fit;
pub mod measure;

pub use fit::{fit_font_size, FitRequest, MIN_FONT_SIZE, UNBOUNDED_START_SIZE};
pub use measure::{FixedAdvanceMeasurer, FontSpec, TextExtent, TextLayout, TextMeasure};
