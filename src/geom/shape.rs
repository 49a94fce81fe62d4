//! Shapes and Placement
//!
//! A [`Shape`] is described relative to its hitbox's position. Placing it
//! under an absolute [`Transform`] yields a [`Placed`] shape in world
//! coordinates, which is what the overlap tests and the grid work with.
//!
//! Placement order is flip, then rotate, then translate:
//!
//! ```text
//!   vertex ──flip(x_flip, y_flip)──► rotate(angle) ──► + position
//! ```
//!
//! Rectangles stay axis-aligned: they honour flips by swapping opposite
//! offsets and ignore the angle. Points and circles have no orientation.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, normalize_angle};
use crate::core::vec2::FixedVec2;
use super::bounds::BoundingBox;

// =============================================================================
// TRANSFORM
// =============================================================================

/// Position, mirroring and rotation of a hitbox.
///
/// Stored twice per hitbox: relative to its parent, and the composed
/// absolute value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Offset from the parent (relative) or world position (absolute)
    pub position: FixedVec2,
    /// Mirrored across the vertical axis
    pub x_flip: bool,
    /// Mirrored across the horizontal axis
    pub y_flip: bool,
    /// Counter-clockwise rotation in degrees, in `[0, 360)`
    pub angle: Fixed,
}

impl Transform {
    /// Unflipped, unrotated transform at `position`.
    #[inline]
    pub const fn at(position: FixedVec2) -> Self {
        Self { position, x_flip: false, y_flip: false, angle: 0 }
    }

    /// Compose a child's relative transform onto this (absolute) one.
    ///
    /// Flips combine by XOR. An odd number of parent flips mirrors the
    /// child's rotation, so its angle is subtracted instead of added.
    pub fn compose(&self, relative: &Transform) -> Transform {
        let mirrored = self.x_flip ^ self.y_flip;
        let angle = if mirrored {
            self.angle.wrapping_sub(relative.angle)
        } else {
            self.angle.wrapping_add(relative.angle)
        };
        let offset = relative.position
            .flip(self.x_flip, self.y_flip)
            .rotate(self.angle);

        Transform {
            position: self.position + offset,
            x_flip: self.x_flip ^ relative.x_flip,
            y_flip: self.y_flip ^ relative.y_flip,
            angle: normalize_angle(angle),
        }
    }
}

// =============================================================================
// SHAPE
// =============================================================================

/// Primitive hitbox geometry, relative to the hitbox position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// A single point. Has no interior.
    Point,
    /// Disc of the given radius around the position.
    Circle {
        /// Radius (fixed-point, non-negative)
        radius: Fixed,
    },
    /// Segment from the position to `position + difference`.
    Line {
        /// End point relative to the start
        difference: FixedVec2,
    },
    /// Simple polygon; vertices in order, closing edge implied.
    Polygon {
        /// Vertex offsets
        vertices: Vec<FixedVec2>,
    },
    /// Axis-aligned rectangle given as edge offsets.
    Rectangle {
        /// Left edge offset
        left: Fixed,
        /// Top edge offset
        top: Fixed,
        /// Right edge offset
        right: Fixed,
        /// Bottom edge offset
        bottom: Fixed,
    },
}

impl Shape {
    /// Rectangle from edge offsets.
    ///
    /// # Panics
    /// Panics if the rectangle is inverted.
    pub fn rectangle(left: Fixed, top: Fixed, right: Fixed, bottom: Fixed) -> Self {
        assert!(left <= right && top <= bottom, "inverted rectangle shape");
        Shape::Rectangle { left, top, right, bottom }
    }

    /// Rectangle of the given size centered on the position.
    pub fn centered_box(width: Fixed, height: Fixed) -> Self {
        let (half_w, half_h) = (width / 2, height / 2);
        Self::rectangle(-half_w, -half_h, width - half_w, height - half_h)
    }

    /// Circle of the given radius.
    ///
    /// # Panics
    /// Panics on a negative radius.
    pub fn circle(radius: Fixed) -> Self {
        assert!(radius >= 0, "negative circle radius");
        Shape::Circle { radius }
    }

    /// Resolve the shape under an absolute transform.
    pub fn place(&self, transform: &Transform) -> Placed {
        let origin = transform.position;
        let orient = |v: FixedVec2| {
            v.flip(transform.x_flip, transform.y_flip).rotate(transform.angle)
        };

        match self {
            Shape::Point => Placed::Point(origin),
            Shape::Circle { radius } => Placed::Circle { center: origin, radius: *radius },
            Shape::Line { difference } => Placed::Line {
                start: origin,
                end: origin + orient(*difference),
            },
            Shape::Polygon { vertices } => Placed::Polygon {
                anchor: origin,
                vertices: vertices.iter().map(|v| origin + orient(*v)).collect(),
            },
            Shape::Rectangle { left, top, right, bottom } => {
                let (l, r) = if transform.x_flip { (-*right, -*left) } else { (*left, *right) };
                let (t, b) = if transform.y_flip { (-*bottom, -*top) } else { (*top, *bottom) };
                Placed::Rectangle(BoundingBox::new(
                    origin.x.wrapping_add(l),
                    origin.y.wrapping_add(t),
                    origin.x.wrapping_add(r),
                    origin.y.wrapping_add(b),
                ))
            }
        }
    }
}

// =============================================================================
// PLACED SHAPE
// =============================================================================

/// A shape resolved to world coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placed {
    /// Point
    Point(FixedVec2),
    /// Disc
    Circle {
        /// Center
        center: FixedVec2,
        /// Radius
        radius: Fixed,
    },
    /// Closed segment
    Line {
        /// Start point
        start: FixedVec2,
        /// End point
        end: FixedVec2,
    },
    /// Polygon
    Polygon {
        /// Hitbox position; the bounding box of a vertex-less polygon
        anchor: FixedVec2,
        /// Absolute vertices
        vertices: Vec<FixedVec2>,
    },
    /// Axis-aligned rectangle
    Rectangle(BoundingBox),
}

impl Placed {
    /// Bounding box of the placed shape.
    pub fn bounds(&self) -> BoundingBox {
        match self {
            Placed::Point(p) => BoundingBox::at_point(*p),
            Placed::Circle { center, radius } => BoundingBox {
                left: center.x.saturating_sub(*radius),
                top: center.y.saturating_sub(*radius),
                right: center.x.saturating_add(*radius),
                bottom: center.y.saturating_add(*radius),
            },
            Placed::Line { start, end } => BoundingBox::at_point(*start)
                .union(&BoundingBox::at_point(*end)),
            Placed::Polygon { anchor, vertices } => BoundingBox::around_points(vertices)
                .unwrap_or_else(|| BoundingBox::at_point(*anchor)),
            Placed::Rectangle(rect) => *rect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::{to_fixed, FIXED_ONE, FIXED_HALF};

    #[test]
    fn test_compose_translation_and_rotation() {
        let parent = Transform {
            position: FixedVec2::from_ints(10, 10),
            x_flip: false,
            y_flip: false,
            angle: to_fixed(90.0),
        };
        let child = Transform::at(FixedVec2::from_ints(2, 0));
        let abs = parent.compose(&child);

        // (2, 0) rotated a quarter turn counter-clockwise on screen is (0, -2)
        assert_eq!(abs.position, FixedVec2::from_ints(10, 8));
        assert_eq!(abs.angle, to_fixed(90.0));
    }

    #[test]
    fn test_compose_flip_mirrors_angle() {
        let parent = Transform {
            position: FixedVec2::ZERO,
            x_flip: true,
            y_flip: false,
            angle: to_fixed(30.0),
        };
        let child = Transform { angle: to_fixed(45.0), ..Transform::at(FixedVec2::from_ints(1, 0)) };
        let abs = parent.compose(&child);

        assert!(abs.x_flip);
        assert!(!abs.y_flip);
        assert_eq!(abs.angle, to_fixed(345.0), "30 - 45 wraps to 345");

        let double = Transform { y_flip: true, ..parent };
        let abs = double.compose(&Transform { x_flip: true, ..child });
        assert!(!abs.x_flip, "flips combine by XOR");
        assert!(abs.y_flip);
        assert_eq!(abs.angle, to_fixed(75.0), "two flips cancel the mirroring");
    }

    #[test]
    fn test_place_rectangle_flip() {
        let shape = Shape::rectangle(to_fixed(-1.0), to_fixed(-2.0), to_fixed(3.0), to_fixed(4.0));
        let transform = Transform {
            position: FixedVec2::from_ints(10, 0),
            x_flip: true,
            y_flip: false,
            angle: to_fixed(90.0),
        };
        let placed = shape.place(&transform);
        assert_eq!(
            placed,
            Placed::Rectangle(BoundingBox::new(to_fixed(7.0), to_fixed(-2.0), to_fixed(11.0), to_fixed(4.0))),
            "rectangles swap offsets on flip and ignore rotation"
        );
    }

    #[test]
    fn test_place_polygon() {
        let shape = Shape::Polygon {
            vertices: vec![FixedVec2::ZERO, FixedVec2::from_ints(2, 0), FixedVec2::from_ints(0, 1)],
        };
        let transform = Transform { angle: to_fixed(180.0), ..Transform::at(FixedVec2::from_ints(5, 5)) };
        let placed = shape.place(&transform);
        assert_eq!(placed, Placed::Polygon {
            anchor: FixedVec2::from_ints(5, 5),
            vertices: vec![
                FixedVec2::from_ints(5, 5),
                FixedVec2::from_ints(3, 5),
                FixedVec2::from_ints(5, 4),
            ],
        });
        assert_eq!(
            placed.bounds(),
            BoundingBox::new(to_fixed(3.0), to_fixed(4.0), to_fixed(5.0), to_fixed(5.0))
        );
    }

    #[test]
    fn test_place_line_and_bounds() {
        let shape = Shape::Line { difference: FixedVec2::from_ints(3, -4) };
        let placed = shape.place(&Transform::at(FixedVec2::from_ints(1, 1)));
        assert_eq!(placed, Placed::Line {
            start: FixedVec2::from_ints(1, 1),
            end: FixedVec2::from_ints(4, -3),
        });
        assert_eq!(
            placed.bounds(),
            BoundingBox::new(to_fixed(1.0), to_fixed(-3.0), to_fixed(4.0), to_fixed(1.0))
        );
    }

    #[test]
    fn test_empty_polygon_bounds_at_anchor() {
        let shape = Shape::Polygon { vertices: Vec::new() };
        let placed = shape.place(&Transform::at(FixedVec2::from_ints(2, 3)));
        assert_eq!(placed.bounds(), BoundingBox::at_point(FixedVec2::from_ints(2, 3)));
    }

    #[test]
    fn test_centered_box() {
        let placed = Shape::centered_box(FIXED_ONE, FIXED_ONE).place(&Transform::default());
        assert_eq!(placed.bounds(), BoundingBox::new(-FIXED_HALF, -FIXED_HALF, FIXED_HALF, FIXED_HALF));
    }
}
