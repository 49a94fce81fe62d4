//! Fixed-Point 2D Vector
//!
//! Positions and displacements in the space. `+x` points right and `+y`
//! points down (screen coordinates).

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use serde::{Serialize, Deserialize};

use super::fixed::{Fixed, FIXED_ONE, FIXED_SCALE, fixed_mul, fixed_sin, fixed_cos};

/// 2D vector with fixed-point components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FixedVec2 {
    /// X component (Q16.16 fixed-point)
    pub x: Fixed,
    /// Y component (Q16.16 fixed-point)
    pub y: Fixed,
}

impl FixedVec2 {
    /// Zero vector
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a new vector from fixed-point components.
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer components.
    #[inline]
    pub const fn from_ints(x: i32, y: i32) -> Self {
        Self {
            x: x << FIXED_SCALE,
            y: y << FIXED_SCALE,
        }
    }

    /// True if both components are zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Scale by a fixed-point scalar.
    #[inline]
    pub fn scale(self, scalar: Fixed) -> Self {
        Self {
            x: fixed_mul(self.x, scalar),
            y: fixed_mul(self.y, scalar),
        }
    }

    /// Exact squared distance to another point, in raw units squared.
    ///
    /// Returned as i64 so that comparisons never lose precision.
    #[inline]
    pub fn distance_squared_wide(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Mirror across the y axis and/or the x axis.
    #[inline]
    pub fn flip(self, x_flip: bool, y_flip: bool) -> Self {
        Self {
            x: if x_flip { self.x.wrapping_neg() } else { self.x },
            y: if y_flip { self.y.wrapping_neg() } else { self.y },
        }
    }

    /// Rotate counter-clockwise (as seen on screen) by `angle` degrees.
    ///
    /// Rotations by multiples of 90 degrees are exact.
    pub fn rotate(self, angle: Fixed) -> Self {
        if angle == 0 {
            return self;
        }
        let cos = fixed_cos(angle);
        let sin = fixed_sin(angle);
        Self {
            x: fixed_mul(self.x, cos).wrapping_add(fixed_mul(self.y, sin)),
            y: fixed_mul(self.y, cos).wrapping_sub(fixed_mul(self.x, sin)),
        }
    }

    /// Convert to float tuple for rendering.
    #[inline]
    pub fn to_floats(self) -> (f32, f32) {
        (
            self.x as f32 / FIXED_ONE as f32,
            self.y as f32 / FIXED_ONE as f32,
        )
    }
}

impl Add for FixedVec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x.wrapping_add(rhs.x),
            y: self.y.wrapping_add(rhs.y),
        }
    }
}

impl AddAssign for FixedVec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for FixedVec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x.wrapping_sub(rhs.x),
            y: self.y.wrapping_sub(rhs.y),
        }
    }
}

impl SubAssign for FixedVec2 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for FixedVec2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: self.x.wrapping_neg(),
            y: self.y.wrapping_neg(),
        }
    }
}

impl fmt::Debug for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "Vec2({:.3}, {:.3})", fx, fy)
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fx, fy) = self.to_floats();
        write!(f, "({:.3}, {:.3})", fx, fy)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;

    #[test]
    fn test_vec2_add_sub() {
        let a = FixedVec2::new(to_fixed(3.0), to_fixed(4.0));
        let b = FixedVec2::new(to_fixed(1.0), to_fixed(2.0));
        assert_eq!(a + b, FixedVec2::from_ints(4, 6));
        assert_eq!(a - b, FixedVec2::from_ints(2, 2));
        assert_eq!(-a, FixedVec2::from_ints(-3, -4));

        let mut c = a;
        c += b;
        c -= b;
        assert_eq!(c, a);
    }

    #[test]
    fn test_vec2_scale() {
        let v = FixedVec2::from_ints(2, 3);
        assert_eq!(v.scale(to_fixed(2.0)), FixedVec2::from_ints(4, 6));
        assert_eq!(v.scale(to_fixed(0.5)), FixedVec2::new(FIXED_ONE, to_fixed(1.5)));
    }

    #[test]
    fn test_vec2_distance_squared_wide() {
        let a = FixedVec2::ZERO;
        let b = FixedVec2::from_ints(3, 4);
        assert_eq!(a.distance_squared_wide(b), 25 * (FIXED_ONE as i64) * (FIXED_ONE as i64));
    }

    #[test]
    fn test_vec2_flip() {
        let v = FixedVec2::from_ints(2, -3);
        assert_eq!(v.flip(true, false), FixedVec2::from_ints(-2, -3));
        assert_eq!(v.flip(false, true), FixedVec2::from_ints(2, 3));
        assert_eq!(v.flip(true, true), FixedVec2::from_ints(-2, 3));
    }

    #[test]
    fn test_vec2_rotate_quarter_turns_exact() {
        let v = FixedVec2::from_ints(1, 0);
        // Counter-clockwise on screen with +y down: right -> up
        assert_eq!(v.rotate(to_fixed(90.0)), FixedVec2::from_ints(0, -1));
        assert_eq!(v.rotate(to_fixed(180.0)), FixedVec2::from_ints(-1, 0));
        assert_eq!(v.rotate(to_fixed(270.0)), FixedVec2::from_ints(0, 1));
        assert_eq!(v.rotate(to_fixed(360.0)), v);
    }

    #[test]
    fn test_vec2_rotate_preserves_length() {
        let v = FixedVec2::from_ints(10, 0);
        let r = v.rotate(to_fixed(45.0));
        let len_sq = r.distance_squared_wide(FixedVec2::ZERO);
        let expected = v.distance_squared_wide(FixedVec2::ZERO);
        let err = (len_sq - expected).abs();
        assert!(err < expected / 1000, "rotation should keep length within 0.1%");
    }
}
