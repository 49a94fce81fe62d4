//! # Cellspace
//!
//! Deterministic 2D space for frame-stepped games: a cell grid that indexes
//! hitboxes by role, trees of hitboxes with inherited transforms, and a
//! movement resolver that slides, stops and pushes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         CELLSPACE                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec2.rs     - 2D vector with fixed-point                │
//! │  ├── direction.rs- The four axis directions                  │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  geom/           - Shapes and exact overlap tests            │
//! │  ├── shape.rs    - Shapes, transforms, placed geometry       │
//! │  ├── bounds.rs   - Axis-aligned bounding boxes               │
//! │  ├── polygon.rs  - Exact segment and polygon predicates      │
//! │  └── overlap.rs  - Pairwise overlap matrix                   │
//! │                                                              │
//! │  space/          - Objects, grid and movement                │
//! │  ├── tree.rs     - Hitbox hierarchy                          │
//! │  ├── grid.rs     - Per-role cell index                       │
//! │  ├── state.rs    - Space, membership, deferred changes       │
//! │  ├── movement.rs - Slide / stop / push resolution            │
//! │  ├── tick.rs     - Per-frame driver                          │
//! │  ├── query.rs    - Spatial queries and draw order            │
//! │  └── area.rs     - Bulk loading                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! - No floating-point arithmetic in geometry or movement
//! - No HashMap (uses BTreeMap/BTreeSet for sorted iteration)
//! - Objects iterate by creation serial, mobiles by priority then serial
//!
//! Given the same sequence of calls, two spaces produce the same
//! [`Space::compute_hash`] on any platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod geom;
pub mod space;

// Re-export commonly used types
pub use core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use core::vec2::FixedVec2;
pub use core::direction::Direction;
pub use geom::{BoundingBox, Shape, Transform};
pub use space::{
    CollisionResponse, FrameReport, HitboxId, ObjectBehavior, ObjectId, Space, SpaceConfig, SpaceError,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
