//! Pure geometry helpers for the town map.
//!
//! All coordinates are map pixels. Containment tests are strict: a point
//! lying exactly on an edge is outside.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle described by its center and full extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Center x coordinate.
    pub x: f64,
    /// Center y coordinate.
    pub y: f64,
    /// Full width.
    pub width: f64,
    /// Full height.
    pub height: f64,
}

impl BoundingBox {
    /// Creates a box centered on `(x, y)`.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether both extents are finite and strictly positive.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }
}

/// Circle anchored at a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorCircle {
    /// Anchor x coordinate.
    pub x: f64,
    /// Anchor y coordinate.
    pub y: f64,
    /// Radius around the anchor.
    pub radius: f64,
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    (ax - bx).hypot(ay - by)
}

/// Returns `true` if `(x, y)` lies strictly inside `bounds`.
#[must_use]
pub fn point_in_rect(x: f64, y: f64, bounds: &BoundingBox) -> bool {
    x > bounds.left() && x < bounds.right() && y > bounds.top() && y < bounds.bottom()
}

/// Returns `true` if `(x, y)` lies strictly inside `circle`.
#[must_use]
pub fn point_in_circle(x: f64, y: f64, circle: &AnchorCircle) -> bool {
    distance(x, y, circle.x, circle.y) < circle.radius
}

/// Returns `true` if the two boxes share interior area. Boxes that only touch
/// along an edge do not overlap.
#[must_use]
pub fn rects_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    let separated = a.left() >= b.right()
        || b.left() >= a.right()
        || a.top() >= b.bottom()
        || b.top() >= a.bottom();
    !separated
}
