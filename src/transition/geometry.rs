//! Clip geometry for geometric transitions
//!
//! [`clip_region`] is a pure function of kind, bounds, fraction and clip type,
//! so a transition can be resumed at any fraction without prior state. For
//! every geometric kind the incoming element sees the *revealed* region and
//! the outgoing element sees the rest of the bounds, so at any fraction the two
//! tile the bounds exactly.
//!
//! Return convention: `None` means no clip (fully visible), `Some(Region::Empty)`
//! means fully hidden.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::Rect;

use super::kind::{
    Orientation, RotationDirection, ShapeOperation, TransitionKind, WipeDirection, MAX_BLIND_COUNT,
};
use super::region::{Region, Sector};

/// Which side of a transition an element is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipType {
    /// Incoming content
    In,
    /// Outgoing content
    Out,
}

/// Compute the clip for one element of a transition at `fraction`.
pub fn clip_region(
    kind: &TransitionKind,
    bounds: Rect,
    fraction: f64,
    clip_type: ClipType,
) -> Option<Region> {
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let bounds = bounds.abs();

    let revealed = match kind {
        TransitionKind::Swap => {
            return match clip_type {
                ClipType::In => None,
                ClipType::Out => Some(Region::Empty),
            };
        }
        TransitionKind::Fade | TransitionKind::Unknown(_) => return None,
        TransitionKind::Wipe(direction) => wipe(bounds, *direction, fraction),
        TransitionKind::Rotate(direction) => rotational(bounds, *direction, fraction),
        TransitionKind::Circle(operation) => shaped_circle(bounds, *operation, fraction),
        TransitionKind::Split {
            orientation,
            operation,
        } => split(bounds, *orientation, *operation, fraction),
        TransitionKind::Blinds { orientation, count } => {
            blinds(bounds, *orientation, *count, fraction)
        }
    };

    Some(match clip_type {
        ClipType::In => revealed,
        ClipType::Out => Region::rect(bounds).subtract(revealed),
    })
}

/// Offset along an extent, rounded up to the whole pixel and kept inside the extent
fn pixel_offset(extent: f64, fraction: f64) -> f64 {
    (extent * fraction).ceil().min(extent).max(0.0)
}

fn half_diagonal(bounds: Rect) -> f64 {
    bounds.width().hypot(bounds.height()) / 2.0
}

fn wipe(bounds: Rect, direction: WipeDirection, fraction: f64) -> Region {
    let rect = match direction {
        WipeDirection::Right => {
            let off = pixel_offset(bounds.width(), fraction);
            Rect::new(bounds.x0, bounds.y0, bounds.x0 + off, bounds.y1)
        }
        WipeDirection::Left => {
            let off = pixel_offset(bounds.width(), fraction);
            Rect::new(bounds.x1 - off, bounds.y0, bounds.x1, bounds.y1)
        }
        WipeDirection::Down => {
            let off = pixel_offset(bounds.height(), fraction);
            Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y0 + off)
        }
        WipeDirection::Up => {
            let off = pixel_offset(bounds.height(), fraction);
            Rect::new(bounds.x0, bounds.y1 - off, bounds.x1, bounds.y1)
        }
    };
    Region::rect(rect)
}

fn rotational(bounds: Rect, direction: RotationDirection, fraction: f64) -> Region {
    let sweep = TAU * fraction;
    let (start, sweep) = match direction {
        RotationDirection::Clockwise => (-FRAC_PI_2, sweep),
        RotationDirection::Counterclockwise => (-FRAC_PI_2, -sweep),
        RotationDirection::WedgeUp => (-FRAC_PI_2 - PI * fraction, sweep),
        RotationDirection::WedgeDown => (FRAC_PI_2 - PI * fraction, sweep),
    };
    let sector = Sector::new(bounds.center(), half_diagonal(bounds), start, sweep);
    Region::rect(bounds).intersect(Region::sector(sector))
}

fn shaped_circle(bounds: Rect, operation: ShapeOperation, fraction: f64) -> Region {
    let max_radius = half_diagonal(bounds);
    match operation {
        ShapeOperation::Expand => {
            Region::rect(bounds).intersect(Region::circle(bounds.center(), max_radius * fraction))
        }
        // The outgoing circle shrinks toward the center; incoming fills around it
        ShapeOperation::Collapse => Region::rect(bounds)
            .subtract(Region::circle(bounds.center(), max_radius * (1.0 - fraction))),
    }
}

fn split(
    bounds: Rect,
    orientation: Orientation,
    operation: ShapeOperation,
    fraction: f64,
) -> Region {
    let center = bounds.center();
    match orientation {
        Orientation::Horizontal => {
            let t = pixel_offset(bounds.height() / 2.0, fraction);
            match operation {
                ShapeOperation::Expand => Region::union([
                    Region::rect(Rect::new(bounds.x0, center.y - t, bounds.x1, center.y)),
                    Region::rect(Rect::new(bounds.x0, center.y, bounds.x1, center.y + t)),
                ]),
                ShapeOperation::Collapse => Region::union([
                    Region::rect(Rect::new(bounds.x0, bounds.y0, bounds.x1, bounds.y0 + t)),
                    Region::rect(Rect::new(bounds.x0, bounds.y1 - t, bounds.x1, bounds.y1)),
                ]),
            }
        }
        Orientation::Vertical => {
            let t = pixel_offset(bounds.width() / 2.0, fraction);
            match operation {
                ShapeOperation::Expand => Region::union([
                    Region::rect(Rect::new(center.x - t, bounds.y0, center.x, bounds.y1)),
                    Region::rect(Rect::new(center.x, bounds.y0, center.x + t, bounds.y1)),
                ]),
                ShapeOperation::Collapse => Region::union([
                    Region::rect(Rect::new(bounds.x0, bounds.y0, bounds.x0 + t, bounds.y1)),
                    Region::rect(Rect::new(bounds.x1 - t, bounds.y0, bounds.x1, bounds.y1)),
                ]),
            }
        }
    }
}

fn blinds(bounds: Rect, orientation: Orientation, count: u32, fraction: f64) -> Region {
    let extent = match orientation {
        Orientation::Horizontal => bounds.height(),
        Orientation::Vertical => bounds.width(),
    };
    // At most one strip per whole pixel
    let count = count.min(MAX_BLIND_COUNT).min(extent.floor() as u32).max(1);
    let strip = extent / count as f64;
    let grown = pixel_offset(strip, fraction);

    let strips = (0..count).map(|i| {
        let start = strip * i as f64;
        match orientation {
            Orientation::Horizontal => {
                let y0 = bounds.y0 + start;
                Region::rect(Rect::new(bounds.x0, y0, bounds.x1, y0 + grown))
            }
            Orientation::Vertical => {
                let x0 = bounds.x0 + start;
                Region::rect(Rect::new(x0, bounds.y0, x0 + grown, bounds.y1))
            }
        }
    });
    Region::union(strips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::kind::DEFAULT_BLIND_COUNT;
    use kurbo::Point;

    const FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

    fn bounds() -> Rect {
        Rect::new(10.0, 20.0, 210.0, 140.0)
    }

    fn geometric_kinds() -> Vec<TransitionKind> {
        let mut kinds = vec![];
        for d in [
            WipeDirection::Up,
            WipeDirection::Down,
            WipeDirection::Left,
            WipeDirection::Right,
        ] {
            kinds.push(TransitionKind::Wipe(d));
        }
        for d in [
            RotationDirection::Clockwise,
            RotationDirection::Counterclockwise,
            RotationDirection::WedgeUp,
            RotationDirection::WedgeDown,
        ] {
            kinds.push(TransitionKind::Rotate(d));
        }
        for op in [ShapeOperation::Expand, ShapeOperation::Collapse] {
            kinds.push(TransitionKind::Circle(op));
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                kinds.push(TransitionKind::Split {
                    orientation,
                    operation: op,
                });
            }
        }
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            kinds.push(TransitionKind::Blinds {
                orientation,
                count: DEFAULT_BLIND_COUNT,
            });
            kinds.push(TransitionKind::Blinds {
                orientation,
                count: 3,
            });
            kinds.push(TransitionKind::Blinds {
                orientation,
                count: u32::MAX,
            });
        }
        kinds
    }

    /// Sample points offset from pixel and angular boundaries
    fn samples(bounds: Rect) -> Vec<Point> {
        let (nx, ny) = (61, 43);
        let mut points = Vec::with_capacity(nx * ny);
        for i in 0..nx {
            for j in 0..ny {
                let x = bounds.x0 + (i as f64 + 0.37) * bounds.width() / nx as f64;
                let y = bounds.y0 + (j as f64 + 0.61) * bounds.height() / ny as f64;
                points.push(Point::new(x, y));
            }
        }
        points
    }

    fn visible(region: &Option<Region>, point: Point) -> bool {
        region.as_ref().map_or(true, |r| r.contains(point))
    }

    #[test]
    fn test_in_and_out_tile_bounds() {
        let b = bounds();
        let points = samples(b);
        let mut kinds = geometric_kinds();
        kinds.push(TransitionKind::Swap);
        for kind in &kinds {
            for fraction in FRACTIONS {
                let incoming = clip_region(kind, b, fraction, ClipType::In);
                let outgoing = clip_region(kind, b, fraction, ClipType::Out);
                for p in &points {
                    let shown_in = visible(&incoming, *p);
                    let shown_out = visible(&outgoing, *p);
                    assert!(
                        shown_in != shown_out,
                        "{kind} at {fraction}: point {p:?} in={shown_in} out={shown_out}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_endpoints_for_geometric_kinds() {
        let b = bounds();
        for kind in geometric_kinds() {
            let start = clip_region(&kind, b, 0.0, ClipType::In).unwrap();
            let end = clip_region(&kind, b, 1.0, ClipType::In).unwrap();
            assert!(start.is_empty(), "{kind} should start hidden");
            assert!(end.covers(b), "{kind} should end fully shown");

            let out_start = clip_region(&kind, b, 0.0, ClipType::Out).unwrap();
            let out_end = clip_region(&kind, b, 1.0, ClipType::Out).unwrap();
            assert!(out_start.covers(b), "{kind} outgoing should start fully shown");
            assert!(out_end.is_empty(), "{kind} outgoing should end hidden");
        }
    }

    #[test]
    fn test_circle_expand_and_collapse_endpoints() {
        let b = bounds();
        let expand = TransitionKind::Circle(ShapeOperation::Expand);
        let collapse = TransitionKind::Circle(ShapeOperation::Collapse);

        assert!(clip_region(&expand, b, 0.0, ClipType::In).unwrap().is_empty());
        assert!(clip_region(&expand, b, 1.0, ClipType::In).unwrap().covers(b));
        assert!(clip_region(&collapse, b, 0.0, ClipType::In).unwrap().is_empty());
        assert!(clip_region(&collapse, b, 1.0, ClipType::In).unwrap().covers(b));

        // Mid-way, expand shows the center while collapse shows the corners
        let mid_expand = clip_region(&expand, b, 0.5, ClipType::In).unwrap();
        assert!(mid_expand.contains(b.center()));
        assert!(!mid_expand.contains(Point::new(b.x0 + 1.0, b.y0 + 1.0)));
        let mid_collapse = clip_region(&collapse, b, 0.5, ClipType::In).unwrap();
        assert!(!mid_collapse.contains(b.center()));
        assert!(mid_collapse.contains(Point::new(b.x0 + 1.0, b.y0 + 1.0)));
    }

    #[test]
    fn test_wipe_rounds_up_to_pixel() {
        let b = Rect::new(0.0, 0.0, 100.0, 10.0);
        let right = TransitionKind::Wipe(WipeDirection::Right);
        let region = clip_region(&right, b, 0.333, ClipType::In).unwrap();
        assert_eq!(region.bounding_box(), Some(Rect::new(0.0, 0.0, 34.0, 10.0)));

        let left = TransitionKind::Wipe(WipeDirection::Left);
        let left = clip_region(&left, b, 0.25, ClipType::In).unwrap();
        assert_eq!(left.bounding_box(), Some(Rect::new(75.0, 0.0, 100.0, 10.0)));
    }

    #[test]
    fn test_clockwise_quarter_reveals_top_right() {
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let clockwise = TransitionKind::Rotate(RotationDirection::Clockwise);
        let cw = clip_region(&clockwise, b, 0.25, ClipType::In).unwrap();
        assert!(cw.contains(Point::new(80.0, 20.0)));
        assert!(!cw.contains(Point::new(20.0, 20.0)));

        let ccw = clip_region(
            &TransitionKind::Rotate(RotationDirection::Counterclockwise),
            b,
            0.25,
            ClipType::In,
        )
        .unwrap();
        assert!(ccw.contains(Point::new(20.0, 20.0)));
        assert!(!ccw.contains(Point::new(80.0, 20.0)));
    }

    #[test]
    fn test_wedge_opens_symmetrically() {
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let wedge_up = TransitionKind::Rotate(RotationDirection::WedgeUp);
        let up = clip_region(&wedge_up, b, 0.25, ClipType::In).unwrap();
        assert!(up.contains(Point::new(40.0, 10.0)));
        assert!(up.contains(Point::new(60.0, 10.0)));
        assert!(!up.contains(Point::new(50.0, 90.0)));

        let wedge_down = TransitionKind::Rotate(RotationDirection::WedgeDown);
        let down = clip_region(&wedge_down, b, 0.25, ClipType::In).unwrap();
        assert!(down.contains(Point::new(40.0, 90.0)));
        assert!(down.contains(Point::new(60.0, 90.0)));
        assert!(!down.contains(Point::new(50.0, 10.0)));
    }

    #[test]
    fn test_blinds_grow_per_strip() {
        let b = Rect::new(0.0, 0.0, 100.0, 100.0);
        let kind = TransitionKind::Blinds {
            orientation: Orientation::Horizontal,
            count: 4,
        };
        let region = clip_region(&kind, b, 0.5, ClipType::In).unwrap();
        for strip in 0..4 {
            let top = strip as f64 * 25.0;
            assert!(region.contains(Point::new(50.0, top + 5.0)));
            assert!(!region.contains(Point::new(50.0, top + 20.0)));
        }
    }

    #[test]
    fn test_blinds_count_is_capped() {
        let b = Rect::new(0.0, 0.0, 200.0, 100.0);
        let kind = TransitionKind::Blinds {
            orientation: Orientation::Vertical,
            count: 4_000_000_000,
        };
        let region = clip_region(&kind, b, 0.25, ClipType::In).unwrap();
        match &region {
            Region::Union(strips) => assert_eq!(strips.len(), MAX_BLIND_COUNT as usize),
            other => panic!("expected strips, got {other:?}"),
        }
        // Strips stay wider than a pixel, so a quarter in is not fully revealed
        assert!(!region.covers(b));
        assert!(!clip_region(&kind, b, 0.25, ClipType::Out).unwrap().is_empty());

        // Never more strips than whole pixels
        let narrow = Rect::new(0.0, 0.0, 10.0, 100.0);
        match clip_region(&kind, narrow, 0.5, ClipType::In).unwrap() {
            Region::Union(strips) => assert_eq!(strips.len(), 10),
            other => panic!("expected strips, got {other:?}"),
        }
    }

    #[test]
    fn test_non_geometric_kinds() {
        let b = bounds();
        assert!(clip_region(&TransitionKind::Fade, b, 0.5, ClipType::In).is_none());
        assert!(clip_region(&TransitionKind::Fade, b, 0.5, ClipType::Out).is_none());
        let unknown = TransitionKind::Unknown("page-curl".to_string());
        assert!(clip_region(&unknown, b, 0.5, ClipType::Out).is_none());
        assert!(clip_region(&TransitionKind::Swap, b, 0.0, ClipType::In).is_none());
        assert_eq!(
            clip_region(&TransitionKind::Swap, b, 1.0, ClipType::Out),
            Some(Region::Empty)
        );
    }

    #[test]
    fn test_fraction_is_clamped() {
        let b = bounds();
        let kind = TransitionKind::Wipe(WipeDirection::Down);
        assert_eq!(
            clip_region(&kind, b, 3.0, ClipType::In),
            clip_region(&kind, b, 1.0, ClipType::In)
        );
        assert_eq!(
            clip_region(&kind, b, f64::NAN, ClipType::In),
            clip_region(&kind, b, 0.0, ClipType::In)
        );
    }
}
