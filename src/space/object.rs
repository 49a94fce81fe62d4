//! Space Objects
//!
//! An object bundles role hitboxes around a required locator, plus the
//! optional mobile state that lets it move, push and follow. Objects are
//! created detached and enter the grid only through `Space::add_object`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Deserialize};
use slotmap::new_key_type;

use crate::core::direction::Direction;
use crate::core::fixed::{Fixed, FIXED_ONE};
use crate::core::vec2::FixedVec2;
use super::hitbox::HitboxId;

new_key_type! {
    /// Handle to an object in a space.
    pub struct ObjectId;
}

/// Opaque reference to an object's visual, owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AppearanceId(pub u32);

// =============================================================================
// COLLISION POLICY
// =============================================================================

/// What a moving object does on contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionResponse {
    /// Pass through
    None,
    /// Block motion into the surface, keep the tangential part
    #[default]
    Slide,
    /// Block and lose all velocity
    Stop,
}

/// Contact recorded during the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollisionRecord {
    /// The object touched
    pub other: ObjectId,
    /// Direction of travel toward it
    pub direction: Direction,
}

/// Per-object policy and lifecycle hooks.
///
/// `collide` is asked once per contact; it must not assume anything about
/// the order objects are resolved in beyond what the frame driver states.
pub trait ObjectBehavior: Send {
    /// Response when this object moves into `other` travelling `direction`,
    /// or is pushed by `other` from `direction`.
    fn collide(&mut self, other: ObjectId, direction: Direction) -> CollisionResponse {
        let _ = (other, direction);
        CollisionResponse::Slide
    }

    /// Called after the object entered the space.
    fn added(&mut self, id: ObjectId) {
        let _ = id;
    }

    /// Called after the object left the space.
    fn removed(&mut self, id: ObjectId) {
        let _ = id;
    }
}

impl ObjectBehavior for CollisionResponse {
    fn collide(&mut self, _other: ObjectId, _direction: Direction) -> CollisionResponse {
        *self
    }
}

// =============================================================================
// OBJECT STATE
// =============================================================================

/// Movement state of a mobile object.
#[derive(Clone, Debug)]
pub struct MobileState {
    /// Per-frame velocity (fixed-point units per frame)
    pub velocity: FixedVec2,
    /// One-frame impulse, cleared after each frame
    pub step: FixedVec2,
    /// Higher moves first and may push lower
    pub priority: i32,
    /// Direction the object leans against a surface
    pub pressing: Option<Direction>,
    pub(crate) collision: Option<HitboxId>,
    pub(crate) leader: Option<ObjectId>,
    pub(crate) followers: BTreeSet<ObjectId>,
    pub(crate) collisions: Vec<CollisionRecord>,
    pub(crate) last_displacement: FixedVec2,
}

impl MobileState {
    pub(crate) fn new(collision: Option<HitboxId>) -> Self {
        Self {
            velocity: FixedVec2::ZERO,
            step: FixedVec2::ZERO,
            priority: 0,
            pressing: None,
            collision,
            leader: None,
            followers: BTreeSet::new(),
            collisions: Vec::new(),
            last_displacement: FixedVec2::ZERO,
        }
    }

    /// Collision hitbox.
    pub fn collision_hitbox(&self) -> Option<HitboxId> {
        self.collision
    }

    /// Leader, if following.
    pub fn leader(&self) -> Option<ObjectId> {
        self.leader
    }

    /// Direct followers.
    pub fn followers(&self) -> &BTreeSet<ObjectId> {
        &self.followers
    }

    /// Contacts recorded this frame.
    pub fn collisions(&self) -> &[CollisionRecord] {
        &self.collisions
    }

    /// Displacement realized in the last frame.
    pub fn last_displacement(&self) -> FixedVec2 {
        self.last_displacement
    }
}

/// An object in (or waiting to enter) a space.
pub struct SpaceObject {
    pub(crate) serial: u64,
    pub(crate) locator: HitboxId,
    pub(crate) center: HitboxId,
    pub(crate) overlap: Option<HitboxId>,
    pub(crate) solid: Option<HitboxId>,
    pub(crate) draw_priority: i32,
    /// Visual handed to the renderer
    pub appearance: Option<AppearanceId>,
    /// Multiplier on this object's displacement (fixed-point)
    pub time_factor: Fixed,
    pub(crate) attached: bool,
    pub(crate) behavior: Option<Box<dyn ObjectBehavior>>,
    pub(crate) mobile: Option<MobileState>,
}

impl SpaceObject {
    pub(crate) fn new(serial: u64, locator: HitboxId, center: HitboxId) -> Self {
        Self {
            serial,
            locator,
            center,
            overlap: None,
            solid: None,
            draw_priority: 0,
            appearance: None,
            time_factor: FIXED_ONE,
            attached: false,
            behavior: None,
            mobile: None,
        }
    }

    /// Creation serial; the identity tiebreak everywhere.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Locator hitbox.
    pub fn locator(&self) -> HitboxId {
        self.locator
    }

    /// Center point hitbox.
    pub fn center(&self) -> HitboxId {
        self.center
    }

    /// Overlap hitbox.
    pub fn overlap(&self) -> Option<HitboxId> {
        self.overlap
    }

    /// Solid hitbox.
    pub fn solid(&self) -> Option<HitboxId> {
        self.solid
    }

    /// Draw priority.
    pub fn draw_priority(&self) -> i32 {
        self.draw_priority
    }

    /// In the space's grid.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Mobile state, if any.
    pub fn mobile(&self) -> Option<&MobileState> {
        self.mobile.as_ref()
    }

    pub(crate) fn mobile_mut(&mut self) -> Option<&mut MobileState> {
        self.mobile.as_mut()
    }

    /// Hitboxes held as roles, locator first.
    pub(crate) fn role_hitboxes(&self) -> impl Iterator<Item = HitboxId> + '_ {
        [Some(self.locator), Some(self.center), self.overlap, self.solid]
            .into_iter()
            .chain(std::iter::once(self.mobile.as_ref().and_then(|m| m.collision)))
            .flatten()
    }

    /// Ask the behavior how to respond; objects without one slide.
    pub(crate) fn respond(&mut self, other: ObjectId, direction: Direction) -> CollisionResponse {
        match self.behavior.as_mut() {
            Some(behavior) => behavior.collide(other, direction),
            None => CollisionResponse::Slide,
        }
    }
}

impl fmt::Debug for SpaceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceObject")
            .field("serial", &self.serial)
            .field("locator", &self.locator)
            .field("attached", &self.attached)
            .field("mobile", &self.mobile.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bouncy;

    impl ObjectBehavior for Bouncy {}

    #[test]
    fn test_default_behavior_slides() {
        let mut b = Bouncy;
        assert_eq!(b.collide(ObjectId::default(), Direction::Left), CollisionResponse::Slide);
    }

    #[test]
    fn test_constant_response_behavior() {
        let mut stop = CollisionResponse::Stop;
        assert_eq!(stop.collide(ObjectId::default(), Direction::Up), CollisionResponse::Stop);
        let mut none = CollisionResponse::None;
        assert_eq!(none.collide(ObjectId::default(), Direction::Down), CollisionResponse::None);
    }
}
