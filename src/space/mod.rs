//! Space Module
//!
//! Objects, the hitbox trees they are made of, the cell grid indexing them,
//! and the frame-stepped movement resolver. Deterministic: every iteration
//! is in serial or movement order.
//!
//! ## Module Structure
//!
//! - `config`: Cell size, draw mode, time factor
//! - `error`: Errors from space operations
//! - `hitbox`: Hitbox nodes, roles, solid faces
//! - `tree`: Hitbox hierarchy and transform propagation
//! - `grid`: Per-role cell index and draw keys
//! - `object`: Objects, mobile state, behaviors
//! - `queue`: Deferred membership and priority changes
//! - `state`: The `Space` itself: arenas, membership, iteration
//! - `events`: Contact events and their ordering
//! - `collision`: Contact detection along a displacement
//! - `movement`: Slide / stop / push resolution and followers
//! - `tick`: Per-frame driver
//! - `query`: Spatial queries and draw order
//! - `area`: Bulk loading from layouts

pub mod config;
pub mod error;
pub mod hitbox;
pub mod tree;
pub mod grid;
pub mod object;
pub mod queue;
pub mod state;
pub mod events;
pub mod collision;
pub mod movement;
pub mod tick;
pub mod query;
pub mod area;

// Re-export key types
pub use config::{SpaceConfig, ConfigError, DEFAULT_CELL_SIZE};
pub use error::SpaceError;
pub use hitbox::{Hitbox, HitboxId, HitboxKind, Role, RoleSet};
pub use grid::{CellCoord, CellRange, DrawMode, Grid};
pub use object::{
    AppearanceId, CollisionRecord, CollisionResponse, MobileState, ObjectBehavior, ObjectId, SpaceObject,
};
pub use state::Space;
pub use events::{ContactEvent, ContactKind, Progress};
pub use movement::MAX_PASSES;
pub use tick::FrameReport;
pub use area::{Area, AreaLayout, Blueprint, LayoutError, MobileBlueprint};
