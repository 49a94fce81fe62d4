//! Geometry
//!
//! Shapes, their placement under a transform, bounding boxes, and the exact
//! pairwise overlap tests. Nothing here knows about hitbox trees or the
//! grid; `space` builds on top of it.

pub mod bounds;
pub mod shape;
pub mod polygon;
pub mod overlap;

pub use bounds::BoundingBox;
pub use shape::{Shape, Placed, Transform};
pub use overlap::overlap;
