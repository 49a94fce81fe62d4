//! Core deterministic primitives.
//!
//! Everything the geometry and movement code computes is built from these
//! integer-only types, so results are identical on every platform.

pub mod fixed;
pub mod vec2;
pub mod direction;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
pub use direction::Direction;
pub use hash::{StateHash, StateHasher};
