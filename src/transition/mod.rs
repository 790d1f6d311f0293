//! Transitions between successive contents on a presentation surface
//!
//! # Architecture
//!
//! - `TransitionKind`: the geometric family and its parameters
//! - `TransitionSpec` / `TransitionTimeline`: timing, easing and progress
//! - `Region`: union/subtract/intersect over rectangles, circles and sectors
//! - `clip_region`: the pure clip computation for one element at one fraction

pub mod geometry;
pub mod kind;
pub mod region;
pub mod spec;

pub use geometry::{clip_region, ClipType};
pub use kind::{
    Orientation, RotationDirection, ShapeOperation, TransitionKind, WipeDirection,
    DEFAULT_BLIND_COUNT, MAX_BLIND_COUNT,
};
pub use region::{ClipShape, Region, Sector};
pub use spec::{EasingCurve, TransitionSpec, TransitionTimeline, DEFAULT_TRANSITION_DURATION_MS};
