//! Region algebra for transition clips
//!
//! A [`Region`] is a small constructive-geometry tree over primitive shapes
//! (rectangles, circles and circular sectors) combined with union, subtract and
//! intersect. Hosts walk the tree to build whatever clip representation their
//! graphics API wants; [`ClipShape::to_path`] gives a `kurbo` path for each
//! primitive.
//!
//! Angles follow screen coordinates: y grows downward, zero points along +x and
//! positive angles turn clockwise.

use std::f64::consts::TAU;

use kurbo::{BezPath, Circle, CircleSegment, Point, Rect, Shape};

/// Tolerance for coverage tests against shape boundaries
const EPSILON: f64 = 1e-9;

/// A circular sector (pie slice) centered on a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sector {
    pub center: Point,
    pub radius: f64,
    /// Start angle in radians
    pub start_angle: f64,
    /// Sweep in radians; negative sweeps run counterclockwise
    pub sweep_angle: f64,
}

impl Sector {
    pub fn new(center: Point, radius: f64, start_angle: f64, sweep_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            sweep_angle,
        }
    }

    /// Start and sweep rewritten so the sweep is non-negative
    fn normalized(&self) -> (f64, f64) {
        if self.sweep_angle < 0.0 {
            (self.start_angle + self.sweep_angle, -self.sweep_angle)
        } else {
            (self.start_angle, self.sweep_angle)
        }
    }

    fn is_full_turn(&self) -> bool {
        self.sweep_angle.abs() >= TAU - EPSILON
    }

    pub fn contains(&self, point: Point) -> bool {
        let offset = point - self.center;
        if offset.hypot() >= self.radius {
            return false;
        }
        if self.is_full_turn() {
            return true;
        }
        let (start, sweep) = self.normalized();
        let relative = (offset.atan2() - start).rem_euclid(TAU);
        relative < sweep
    }
}

/// A primitive clip shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipShape {
    Rect(Rect),
    Circle(Circle),
    Sector(Sector),
}

impl ClipShape {
    pub fn contains(&self, point: Point) -> bool {
        match self {
            ClipShape::Rect(rect) => rect.contains(point),
            ClipShape::Circle(circle) => (point - circle.center).hypot() < circle.radius,
            ClipShape::Sector(sector) => sector.contains(point),
        }
    }

    /// Whether the shape encloses no area at all
    pub fn is_degenerate(&self) -> bool {
        match self {
            ClipShape::Rect(rect) => rect.width() <= 0.0 || rect.height() <= 0.0,
            ClipShape::Circle(circle) => circle.radius <= 0.0,
            ClipShape::Sector(sector) => sector.radius <= 0.0 || sector.sweep_angle == 0.0,
        }
    }

    /// Whether every point of `rect` lies inside this shape
    pub fn covers(&self, rect: Rect) -> bool {
        match self {
            ClipShape::Rect(own) => {
                own.x0 <= rect.x0 && own.y0 <= rect.y0 && own.x1 >= rect.x1 && own.y1 >= rect.y1
            }
            ClipShape::Circle(circle) => corners_within(circle.center, circle.radius, rect),
            ClipShape::Sector(sector) => {
                sector.is_full_turn() && corners_within(sector.center, sector.radius, rect)
            }
        }
    }

    pub fn bounding_box(&self) -> Rect {
        match self {
            ClipShape::Rect(rect) => *rect,
            ClipShape::Circle(circle) => circle.bounding_box(),
            ClipShape::Sector(sector) => {
                Circle::new(sector.center, sector.radius.max(0.0)).bounding_box()
            }
        }
    }

    /// Outline of the shape as a path
    pub fn to_path(&self, tolerance: f64) -> BezPath {
        match self {
            ClipShape::Rect(rect) => rect.to_path(tolerance),
            ClipShape::Circle(circle) => circle.to_path(tolerance),
            ClipShape::Sector(sector) => CircleSegment::new(
                sector.center,
                sector.radius,
                0.0,
                sector.start_angle,
                sector.sweep_angle,
            )
            .to_path(tolerance),
        }
    }
}

/// Convex shapes contain a rectangle when they contain its four corners
fn corners_within(center: Point, radius: f64, rect: Rect) -> bool {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x0, rect.y1),
        Point::new(rect.x1, rect.y1),
    ]
    .iter()
    .all(|corner| (*corner - center).hypot() <= radius + EPSILON)
}

/// A set of points built from primitive shapes
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Region {
    #[default]
    Empty,
    Shape(ClipShape),
    Union(Vec<Region>),
    Subtract(Box<Region>, Box<Region>),
    Intersect(Box<Region>, Box<Region>),
}

impl Region {
    pub fn rect(rect: Rect) -> Self {
        Region::Shape(ClipShape::Rect(rect))
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Region::Shape(ClipShape::Circle(Circle::new(center, radius)))
    }

    pub fn sector(sector: Sector) -> Self {
        Region::Shape(ClipShape::Sector(sector))
    }

    /// Union of the given regions, with empty members dropped
    pub fn union(regions: impl IntoIterator<Item = Region>) -> Self {
        let mut members: Vec<Region> = regions.into_iter().filter(|r| !r.is_empty()).collect();
        match members.len() {
            0 => Region::Empty,
            1 => members.remove(0),
            _ => Region::Union(members),
        }
    }

    /// Points of `self` that are not in `other`
    pub fn subtract(self, other: Region) -> Self {
        if self.is_empty() {
            return Region::Empty;
        }
        if other.is_empty() {
            return self;
        }
        Region::Subtract(Box::new(self), Box::new(other))
    }

    /// Points in both `self` and `other`
    pub fn intersect(self, other: Region) -> Self {
        if self.is_empty() || other.is_empty() {
            return Region::Empty;
        }
        Region::Intersect(Box::new(self), Box::new(other))
    }

    pub fn contains(&self, point: Point) -> bool {
        match self {
            Region::Empty => false,
            Region::Shape(shape) => shape.contains(point),
            Region::Union(members) => members.iter().any(|m| m.contains(point)),
            Region::Subtract(base, cut) => base.contains(point) && !cut.contains(point),
            Region::Intersect(a, b) => a.contains(point) && b.contains(point),
        }
    }

    /// Conservative emptiness test: `true` means the region has no area.
    ///
    /// May return `false` for exotic empty combinations, never `true` for a
    /// region that encloses area.
    pub fn is_empty(&self) -> bool {
        match self {
            Region::Empty => true,
            Region::Shape(shape) => shape.is_degenerate(),
            Region::Union(members) => members.iter().all(Region::is_empty),
            Region::Subtract(base, cut) => match base.bounding_box() {
                None => true,
                Some(bbox) => cut.covers(bbox),
            },
            Region::Intersect(a, b) => match (a.bounding_box(), b.bounding_box()) {
                (Some(ba), Some(bb)) => {
                    let overlap = ba.intersect(bb);
                    overlap.width() <= 0.0 || overlap.height() <= 0.0
                }
                _ => true,
            },
        }
    }

    /// Conservative coverage test: `true` means every point of `rect` is inside.
    pub fn covers(&self, rect: Rect) -> bool {
        match self {
            Region::Empty => rect.width() <= 0.0 || rect.height() <= 0.0,
            Region::Shape(shape) => shape.covers(rect),
            Region::Union(members) => {
                let members: Vec<&Region> = members.iter().collect();
                union_covers(&members, rect)
            }
            Region::Subtract(base, cut) => {
                base.covers(rect)
                    && cut.bounding_box().map_or(true, |bb| {
                        let overlap = bb.intersect(rect);
                        overlap.width() <= 0.0 || overlap.height() <= 0.0
                    })
            }
            Region::Intersect(a, b) => a.covers(rect) && b.covers(rect),
        }
    }

    /// Smallest rectangle enclosing the region, `None` when empty
    pub fn bounding_box(&self) -> Option<Rect> {
        match self {
            Region::Empty => None,
            Region::Shape(shape) if shape.is_degenerate() => None,
            Region::Shape(shape) => Some(shape.bounding_box()),
            Region::Union(members) => members
                .iter()
                .filter_map(Region::bounding_box)
                .reduce(|acc, bb| acc.union(bb)),
            Region::Subtract(base, _) => base.bounding_box(),
            Region::Intersect(a, b) => {
                let overlap = a.bounding_box()?.intersect(b.bounding_box()?);
                (overlap.width() > 0.0 && overlap.height() > 0.0).then_some(overlap)
            }
        }
    }
}

fn is_sliver(rect: Rect) -> bool {
    rect.width() <= EPSILON || rect.height() <= EPSILON
}

/// Whether the members of a union jointly cover `rect`.
///
/// Rectangular members are carved out of `rect` one at a time and the
/// leftover pieces are checked against the remaining members.
fn union_covers(members: &[&Region], rect: Rect) -> bool {
    if is_sliver(rect) {
        return true;
    }
    if members.iter().any(|m| m.covers(rect)) {
        return true;
    }
    for (i, member) in members.iter().enumerate() {
        let Region::Shape(ClipShape::Rect(hole)) = member else {
            continue;
        };
        let overlap = hole.intersect(rect);
        if is_sliver(overlap) {
            continue;
        }
        let rest: Vec<&Region> = members
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, m)| *m)
            .collect();
        return rect_difference(rect, overlap)
            .into_iter()
            .all(|piece| union_covers(&rest, piece));
    }
    false
}

/// Up to four rectangles covering `rect` minus `hole` (`hole` lies inside `rect`)
fn rect_difference(rect: Rect, hole: Rect) -> Vec<Rect> {
    [
        Rect::new(rect.x0, rect.y0, rect.x1, hole.y0),
        Rect::new(rect.x0, hole.y1, rect.x1, rect.y1),
        Rect::new(rect.x0, hole.y0, hole.x0, hole.y1),
        Rect::new(hole.x1, hole.y0, rect.x1, hole.y1),
    ]
    .into_iter()
    .filter(|piece| !is_sliver(*piece))
    .collect()
}
