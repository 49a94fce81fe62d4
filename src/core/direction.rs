//! Orthogonal Directions
//!
//! The four directions a solid surface can face, a mobile object can press
//! in, or a collision can come from.

use serde::{Serialize, Deserialize};

use super::fixed::FIXED_ONE;
use super::vec2::FixedVec2;

/// One of the four orthogonal directions.
///
/// `Up` is toward negative y, `Down` toward positive y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// Toward negative x
    Left = 0,
    /// Toward positive x
    Right = 1,
    /// Toward negative y
    Up = 2,
    /// Toward positive y
    Down = 3,
}

impl Direction {
    /// All four directions in index order.
    pub const ALL: [Direction; 4] = [Direction::Left, Direction::Right, Direction::Up, Direction::Down];

    /// Index into per-direction arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The direction pointing the other way.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Rotate a quarter turn clockwise on screen.
    pub const fn clockwise(self) -> Direction {
        match self {
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
        }
    }

    /// Rotate a quarter turn counter-clockwise on screen.
    pub const fn counterclockwise(self) -> Direction {
        match self {
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
            Direction::Up => Direction::Left,
        }
    }

    /// True for `Left` and `Right`.
    #[inline]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// +1 if the direction points along a positive axis, -1 otherwise.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Direction::Right | Direction::Down => 1,
            Direction::Left | Direction::Up => -1,
        }
    }

    /// Unit vector pointing this way.
    pub const fn unit_vector(self) -> FixedVec2 {
        match self {
            Direction::Left => FixedVec2::new(-FIXED_ONE, 0),
            Direction::Right => FixedVec2::new(FIXED_ONE, 0),
            Direction::Up => FixedVec2::new(0, -FIXED_ONE),
            Direction::Down => FixedVec2::new(0, FIXED_ONE),
        }
    }

    /// The component of `v` along this direction's axis, positive when
    /// it points this way.
    #[inline]
    pub fn component_of(self, v: FixedVec2) -> i64 {
        let raw = if self.is_horizontal() { v.x } else { v.y };
        raw as i64 * self.sign() as i64
    }
}
