//! Hitboxes
//!
//! A hitbox is an arena entry holding a shape, its relative and absolute
//! transforms, tree links, and the grid bookkeeping for the roles it holds.
//! Links between hitboxes are [`HitboxId`]s into the space's arena; the
//! tree operations that keep them consistent live in `space::tree`.

use std::collections::{BTreeMap, BTreeSet};

use slotmap::new_key_type;

use crate::core::direction::Direction;
use crate::geom::{BoundingBox, Placed, Shape, Transform};
use super::grid::CellRange;
use super::object::ObjectId;

new_key_type! {
    /// Handle to a hitbox in a space's arena.
    pub struct HitboxId;
}

// =============================================================================
// ROLES
// =============================================================================

/// Which per-cell set a hitbox is indexed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Role {
    /// An object's canonical position and draw entry
    Locator = 0,
    /// An object's center point
    Center = 1,
    /// General overlap queries
    Overlap = 2,
    /// Solid surfaces that block movement
    Solid = 3,
    /// A mobile object's body for striking solid surfaces
    Collision = 4,
}

impl Role {
    /// All roles in index order.
    pub const ALL: [Role; 5] = [Role::Locator, Role::Center, Role::Overlap, Role::Solid, Role::Collision];

    #[inline]
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Small set of roles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Membership test.
    #[inline]
    pub fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Add a role; returns false if it was already present.
    #[inline]
    pub fn insert(&mut self, role: Role) -> bool {
        let fresh = !self.contains(role);
        self.0 |= role.bit();
        fresh
    }

    /// Remove a role; returns false if it was absent.
    #[inline]
    pub fn remove(&mut self, role: Role) -> bool {
        let present = self.contains(role);
        self.0 &= !role.bit();
        present
    }

    /// No roles held.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Held roles in index order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

// =============================================================================
// HITBOX
// =============================================================================

/// Primitive shape or named set of component hitboxes.
#[derive(Clone, Debug)]
pub enum HitboxKind {
    /// Single shape
    Primitive(Shape),
    /// Union of components, by name
    Composite(BTreeMap<String, HitboxId>),
}

/// A positioned, oriented shape in the space.
#[derive(Clone, Debug)]
pub struct Hitbox {
    pub(crate) kind: HitboxKind,
    pub(crate) relative: Transform,
    pub(crate) absolute: Transform,
    /// `None` for composites
    pub(crate) placed: Option<Placed>,
    pub(crate) bounds: BoundingBox,
    pub(crate) parent: Option<HitboxId>,
    pub(crate) children: BTreeSet<HitboxId>,
    pub(crate) component_of: Option<HitboxId>,
    pub(crate) object: Option<ObjectId>,
    pub(crate) roles: RoleSet,
    /// Indexed by `Direction::index`
    pub(crate) surfaces: [bool; 4],
    /// Inclusive cell range, present while any role is held
    pub(crate) cells: Option<CellRange>,
    pub(crate) draw_priority: i32,
    pub(crate) serial: u64,
    pub(crate) scanned: bool,
}

impl Hitbox {
    pub(crate) fn new(kind: HitboxKind, relative: Transform) -> Self {
        let placed = match &kind {
            HitboxKind::Primitive(shape) => Some(shape.place(&relative)),
            HitboxKind::Composite(_) => None,
        };
        let bounds = placed
            .as_ref()
            .map(Placed::bounds)
            .unwrap_or_else(|| BoundingBox::at_point(relative.position));

        Self {
            kind,
            relative,
            absolute: relative,
            placed,
            bounds,
            parent: None,
            children: BTreeSet::new(),
            component_of: None,
            object: None,
            roles: RoleSet::EMPTY,
            surfaces: [false; 4],
            cells: None,
            draw_priority: 0,
            serial: 0,
            scanned: false,
        }
    }

    /// Shape, if primitive.
    pub fn shape(&self) -> Option<&Shape> {
        match &self.kind {
            HitboxKind::Primitive(shape) => Some(shape),
            HitboxKind::Composite(_) => None,
        }
    }

    /// True for composites.
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, HitboxKind::Composite(_))
    }

    /// Component by name.
    pub fn component(&self, name: &str) -> Option<HitboxId> {
        match &self.kind {
            HitboxKind::Composite(parts) => parts.get(name).copied(),
            HitboxKind::Primitive(_) => None,
        }
    }

    /// Transform relative to the parent.
    pub fn relative(&self) -> &Transform {
        &self.relative
    }

    /// Composed world transform.
    pub fn absolute(&self) -> &Transform {
        &self.absolute
    }

    /// Shape in world coordinates, if primitive.
    pub fn placed(&self) -> Option<&Placed> {
        self.placed.as_ref()
    }

    /// World bounding box.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Parent hitbox.
    pub fn parent(&self) -> Option<HitboxId> {
        self.parent
    }

    /// Child hitboxes.
    pub fn children(&self) -> &BTreeSet<HitboxId> {
        &self.children
    }

    /// Composite this hitbox belongs to.
    pub fn component_of(&self) -> Option<HitboxId> {
        self.component_of
    }

    /// Owning object.
    pub fn object(&self) -> Option<ObjectId> {
        self.object
    }

    /// Roles currently held in the grid.
    pub fn roles(&self) -> RoleSet {
        self.roles
    }

    /// Whether the face on side `direction` is solid.
    pub fn surface(&self, direction: Direction) -> bool {
        self.surfaces[direction.index()]
    }

    /// True if any face is solid.
    pub fn has_surfaces(&self) -> bool {
        self.surfaces.iter().any(|s| *s)
    }

    /// Inclusive cell range, if indexed.
    pub fn cells(&self) -> Option<CellRange> {
        self.cells
    }

    /// Transient query marker; false outside of a scan.
    pub fn is_scanned(&self) -> bool {
        self.scanned
    }

    /// Hitboxes whose transforms derive from this one.
    pub(crate) fn dependents(&self) -> impl Iterator<Item = HitboxId> + '_ {
        let parts = match &self.kind {
            HitboxKind::Composite(parts) => Some(parts.values().copied()),
            HitboxKind::Primitive(_) => None,
        };
        self.children.iter().copied().chain(parts.into_iter().flatten())
    }
}
