//! Points, waypoints, bounds and the orientation math the layouter runs on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Two points closer than this on an axis count as aligned on it.
pub const ALIGNED_THRESHOLD: f32 = 2.0;

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn round(&self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    pub(crate) fn axis(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    pub(crate) fn transpose(&self) -> Self {
        Self::new(self.y, self.x)
    }
}

/// One point of a connection's polyline.
///
/// `original` records where the connection was docked before it got
/// cropped to the shape outline; layout resumes from it when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Point>,
}

impl Waypoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            original: None,
        }
    }

    pub fn with_original(x: f32, y: f32, original: Point) -> Self {
        Self {
            x,
            y,
            original: Some(original),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The docking point: `original` if recorded, the point itself otherwise.
    pub fn docking(&self) -> Point {
        self.original.unwrap_or_else(|| self.point())
    }

    /// Integer-pixel copy for storage.
    pub fn round(&self) -> Self {
        Self {
            x: self.x.round(),
            y: self.y.round(),
            original: self.original.map(|o| o.round()),
        }
    }

    pub(crate) fn transpose(&self) -> Self {
        Self {
            x: self.y,
            y: self.x,
            original: self.original.map(|o| o.transpose()),
        }
    }
}

impl From<Point> for Waypoint {
    fn from(p: Point) -> Self {
        Waypoint::new(p.x, p.y)
    }
}

/// Axis-aligned bounding box of a shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-size box at `p`, for orientation checks against points.
    pub fn at_point(p: Point) -> Self {
        Self::new(p.x, p.y, 0.0, 0.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn mid(&self) -> Point {
        let (x, y) = self.center();
        Point::new(x, y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub(crate) fn transpose(&self) -> Self {
        Self::new(self.y, self.x, self.height, self.width)
    }

    fn extent(&self, axis: Axis) -> (f32, f32) {
        match axis {
            Axis::X => (self.x, self.right()),
            Axis::Y => (self.y, self.bottom()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

/// Whether `p` lies within the extent of `bounds` along `axis`.
pub(crate) fn in_range(axis: Axis, p: Point, bounds: &Bounds) -> bool {
    let (start, end) = bounds.extent(axis);
    let v = p.axis(axis);
    v >= start && v <= end
}

// ─── Orientation ─────────────────────────────────────────────────────────

/// Where a rectangle sits relative to a reference rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Top,
    Right,
    Bottom,
    Left,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Intersect,
}

impl Orientation {
    pub fn vertical(self) -> Option<Orientation> {
        match self {
            Orientation::Top | Orientation::TopLeft | Orientation::TopRight => {
                Some(Orientation::Top)
            }
            Orientation::Bottom | Orientation::BottomLeft | Orientation::BottomRight => {
                Some(Orientation::Bottom)
            }
            _ => None,
        }
    }

    pub fn horizontal(self) -> Option<Orientation> {
        match self {
            Orientation::Left | Orientation::TopLeft | Orientation::BottomLeft => {
                Some(Orientation::Left)
            }
            Orientation::Right | Orientation::TopRight | Orientation::BottomRight => {
                Some(Orientation::Right)
            }
            _ => None,
        }
    }

    /// One of the four sides (not a corner, not intersecting).
    pub fn is_side(self) -> bool {
        matches!(
            self,
            Orientation::Top | Orientation::Right | Orientation::Bottom | Orientation::Left
        )
    }

    pub fn is_horizontal_side(self) -> bool {
        matches!(self, Orientation::Left | Orientation::Right)
    }

    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::Top => Orientation::Bottom,
            Orientation::Bottom => Orientation::Top,
            Orientation::Left => Orientation::Right,
            Orientation::Right => Orientation::Left,
            Orientation::TopLeft => Orientation::BottomRight,
            Orientation::BottomRight => Orientation::TopLeft,
            Orientation::TopRight => Orientation::BottomLeft,
            Orientation::BottomLeft => Orientation::TopRight,
            Orientation::Intersect => Orientation::Intersect,
        }
    }

    /// Whether this orientation mentions `side` (e.g. `TopLeft` mentions `Left`).
    pub fn mentions(self, side: Orientation) -> bool {
        self == side || self.vertical() == Some(side) || self.horizontal() == Some(side)
    }

    fn from_parts(vertical: Option<Orientation>, horizontal: Option<Orientation>) -> Self {
        match (vertical, horizontal) {
            (Some(Orientation::Top), Some(Orientation::Left)) => Orientation::TopLeft,
            (Some(Orientation::Top), Some(Orientation::Right)) => Orientation::TopRight,
            (Some(Orientation::Bottom), Some(Orientation::Left)) => Orientation::BottomLeft,
            (Some(Orientation::Bottom), Some(Orientation::Right)) => Orientation::BottomRight,
            (Some(v), None) => v,
            (None, Some(h)) => h,
            _ => Orientation::Intersect,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::Top => "top",
            Orientation::Right => "right",
            Orientation::Bottom => "bottom",
            Orientation::Left => "left",
            Orientation::TopLeft => "top-left",
            Orientation::TopRight => "top-right",
            Orientation::BottomLeft => "bottom-left",
            Orientation::BottomRight => "bottom-right",
            Orientation::Intersect => "intersect",
        };
        f.write_str(s)
    }
}

/// Padding applied per axis when computing an orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Padding {
    pub x: f32,
    pub y: f32,
}

impl From<f32> for Padding {
    fn from(p: f32) -> Self {
        Self { x: p, y: p }
    }
}

/// Orientation of `rect` relative to `reference`.
///
/// A positive padding requires a gap before a side counts; a negative one
/// lets `rect` reach into `reference` by that much and still count as
/// being on that side.
pub fn get_orientation(rect: &Bounds, reference: &Bounds, padding: impl Into<Padding>) -> Orientation {
    let padding = padding.into();

    let top = rect.bottom() + padding.y <= reference.y;
    let right = rect.x - padding.x >= reference.right();
    let bottom = rect.y - padding.y >= reference.bottom();
    let left = rect.right() + padding.x <= reference.x;

    let vertical = if top {
        Some(Orientation::Top)
    } else if bottom {
        Some(Orientation::Bottom)
    } else {
        None
    };
    let horizontal = if left {
        Some(Orientation::Left)
    } else if right {
        Some(Orientation::Right)
    } else {
        None
    };

    Orientation::from_parts(vertical, horizontal)
}

/// Orientation of a point relative to `reference`.
pub fn get_point_orientation(p: Point, reference: &Bounds, padding: impl Into<Padding>) -> Orientation {
    get_orientation(&Bounds::at_point(p), reference, padding)
}

// ─── Point predicates ────────────────────────────────────────────────────

/// Whether `r` lies on the line through `p` and `q`, within `accuracy`.
pub fn points_on_line(p: Point, q: Point, r: Point, accuracy: f32) -> bool {
    let val = (q.x - p.x) * (r.y - p.y) - (q.y - p.y) * (r.x - p.x);
    let dist = p.distance(q);
    // NaN for p == q, which counts as "not on line"
    (val / dist).abs() <= accuracy
}

/// Axis along which a set of points line up: `Horizontal` when they share a
/// y coordinate, `Vertical` when they share an x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Horizontal,
    Vertical,
}

pub fn points_aligned(points: &[Point]) -> Option<Alignment> {
    let first = points.first()?;
    let on_axis = |axis: Axis| {
        points
            .iter()
            .all(|p| (first.axis(axis) - p.axis(axis)).abs() <= ALIGNED_THRESHOLD)
    };
    if on_axis(Axis::X) {
        Some(Alignment::Vertical)
    } else if on_axis(Axis::Y) {
        Some(Alignment::Horizontal)
    } else {
        None
    }
}

/// Whether `p` falls inside `rect` grown by `tolerance` on every side.
pub fn point_in_rect(p: Point, rect: &Bounds, tolerance: f32) -> bool {
    p.x > rect.x - tolerance
        && p.y > rect.y - tolerance
        && p.x < rect.right() + tolerance
        && p.y < rect.bottom() + tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x: f32, y: f32, w: f32, h: f32) -> Bounds {
        Bounds::new(x, y, w, h)
    }

    #[test]
    fn orientation_sides_and_corners() {
        let reference = b(100.0, 100.0, 100.0, 100.0);
        assert_eq!(
            get_orientation(&b(300.0, 100.0, 50.0, 50.0), &reference, 0.0),
            Orientation::Right
        );
        assert_eq!(
            get_orientation(&b(0.0, 0.0, 50.0, 50.0), &reference, 0.0),
            Orientation::TopLeft
        );
        assert_eq!(
            get_orientation(&b(120.0, 250.0, 50.0, 50.0), &reference, 0.0),
            Orientation::Bottom
        );
        assert_eq!(
            get_orientation(&b(150.0, 150.0, 10.0, 10.0), &reference, 0.0),
            Orientation::Intersect
        );
    }

    #[test]
    fn orientation_padding_requires_gap() {
        let reference = b(0.0, 0.0, 100.0, 100.0);
        let near = b(110.0, 0.0, 100.0, 100.0);
        assert_eq!(get_orientation(&near, &reference, 0.0), Orientation::Right);
        assert_eq!(get_orientation(&near, &reference, 20.0), Orientation::Intersect);
    }

    #[test]
    fn negative_padding_accepts_border_band() {
        let host = b(100.0, 100.0, 100.0, 80.0);
        let on_bottom_border = Point::new(150.0, 175.0);
        assert_eq!(
            get_point_orientation(on_bottom_border, &host, -15.0),
            Orientation::Bottom
        );
        let center = Point::new(150.0, 140.0);
        assert_eq!(
            get_point_orientation(center, &host, -15.0),
            Orientation::Intersect
        );
    }

    #[test]
    fn aligned_points() {
        let row = [Point::new(0.0, 10.0), Point::new(50.0, 11.0)];
        assert_eq!(points_aligned(&row), Some(Alignment::Horizontal));
        let column = [Point::new(5.0, 0.0), Point::new(5.0, 90.0)];
        assert_eq!(points_aligned(&column), Some(Alignment::Vertical));
        let diagonal = [Point::new(0.0, 0.0), Point::new(50.0, 50.0)];
        assert_eq!(points_aligned(&diagonal), None);
    }

    #[test]
    fn collinear_points() {
        let p = Point::new(0.0, 0.0);
        let q = Point::new(100.0, 0.0);
        assert!(points_on_line(p, q, Point::new(50.0, 0.0), 0.0));
        assert!(!points_on_line(p, q, Point::new(50.0, 3.0), 0.0));
        assert!(!points_on_line(p, p, Point::new(50.0, 3.0), 0.0));
    }
}
