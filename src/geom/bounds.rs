//! Axis-Aligned Bounding Boxes

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;

/// Axis-aligned box in absolute coordinates.
///
/// `top` is the smaller y value, `bottom` the larger one. A box may have zero
/// width or height (points, axis-aligned lines).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Smallest x
    pub left: Fixed,
    /// Smallest y
    pub top: Fixed,
    /// Largest x
    pub right: Fixed,
    /// Largest y
    pub bottom: Fixed,
}

impl BoundingBox {
    /// Create a box from its edges.
    ///
    /// # Panics
    /// Panics if `left > right` or `top > bottom`.
    pub fn new(left: Fixed, top: Fixed, right: Fixed, bottom: Fixed) -> Self {
        assert!(left <= right, "bounding box left edge {} exceeds right edge {}", left, right);
        assert!(top <= bottom, "bounding box top edge {} exceeds bottom edge {}", top, bottom);
        Self { left, top, right, bottom }
    }

    /// Zero-size box at a point.
    #[inline]
    pub const fn at_point(p: FixedVec2) -> Self {
        Self { left: p.x, top: p.y, right: p.x, bottom: p.y }
    }

    /// Smallest box containing every point in `points`, or `None` if empty.
    pub fn around_points(points: &[FixedVec2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::at_point(*first);
        for p in &points[1..] {
            bounds.left = bounds.left.min(p.x);
            bounds.right = bounds.right.max(p.x);
            bounds.top = bounds.top.min(p.y);
            bounds.bottom = bounds.bottom.max(p.y);
        }
        Some(bounds)
    }

    /// Width (right - left).
    #[inline]
    pub fn width(&self) -> Fixed {
        self.right - self.left
    }

    /// Height (bottom - top).
    #[inline]
    pub fn height(&self) -> Fixed {
        self.bottom - self.top
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// The box moved by `delta`.
    pub fn translated(&self, delta: FixedVec2) -> Self {
        Self {
            left: self.left.wrapping_add(delta.x),
            top: self.top.wrapping_add(delta.y),
            right: self.right.wrapping_add(delta.x),
            bottom: self.bottom.wrapping_add(delta.y),
        }
    }

    /// Region covered by the box while it travels by `delta`.
    #[inline]
    pub fn swept(&self, delta: FixedVec2) -> Self {
        self.union(&self.translated(delta))
    }

    /// Closed intersection test: touching edges count.
    #[inline]
    pub fn meets(&self, other: &Self) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    /// Open intersection test: the interiors share a point.
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Closed point containment.
    #[inline]
    pub fn contains_point(&self, p: FixedVec2) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }

    /// Open point containment.
    #[inline]
    pub fn contains_point_strictly(&self, p: FixedVec2) -> bool {
        p.x > self.left && p.x < self.right && p.y > self.top && p.y < self.bottom
    }

    /// The four corners, clockwise on screen from the top-left.
    pub fn corners(&self) -> [FixedVec2; 4] {
        [
            FixedVec2::new(self.left, self.top),
            FixedVec2::new(self.right, self.top),
            FixedVec2::new(self.right, self.bottom),
            FixedVec2::new(self.left, self.bottom),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    fn unit_box(x: i32, y: i32) -> BoundingBox {
        BoundingBox::new(x << 16, y << 16, (x + 1) << 16, (y + 1) << 16)
    }

    #[test]
    fn test_meets_vs_overlaps() {
        let a = unit_box(0, 0);
        let touching = unit_box(1, 0);
        let apart = unit_box(2, 0);
        let inside = BoundingBox::new(to_fixed(0.25), to_fixed(0.25), to_fixed(0.75), to_fixed(0.75));

        assert!(a.meets(&touching));
        assert!(!a.overlaps(&touching), "shared edge is not an interior overlap");
        assert!(!a.meets(&apart));
        assert!(a.overlaps(&inside));
    }

    #[test]
    fn test_swept() {
        let a = unit_box(0, 0);
        let swept = a.swept(FixedVec2::from_ints(3, -2));
        assert_eq!(swept, BoundingBox::new(0, to_fixed(-2.0), to_fixed(4.0), to_fixed(1.0)));
    }

    #[test]
    fn test_around_points() {
        assert!(BoundingBox::around_points(&[]).is_none());
        let b = BoundingBox::around_points(&[
            FixedVec2::from_ints(1, 5),
            FixedVec2::from_ints(-2, 3),
            FixedVec2::from_ints(4, -1),
        ]).unwrap();
        assert_eq!(b, BoundingBox::new(to_fixed(-2.0), to_fixed(-1.0), to_fixed(4.0), to_fixed(5.0)));
    }

    #[test]
    #[should_panic]
    fn test_inverted_box_rejected() {
        let _ = BoundingBox::new(to_fixed(1.0), 0, 0, to_fixed(1.0));
    }
}
