//! Space State
//!
//! The [`Space`] owns the hitbox and object arenas, the grid, the ordered
//! set of mobile objects and the deferred change queue. Everything that
//! mutates it is a method; the movement and query code add more methods in
//! their own modules.
//!
//! Membership changes requested while a `visit_*` iteration is open are
//! queued and replayed when the last iteration closes.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use slotmap::SlotMap;
use tracing::{debug, trace};

use crate::core::direction::Direction;
use crate::core::fixed::{Fixed, normalize_angle};
use crate::core::hash::{StateHash, StateHasher};
use crate::core::vec2::FixedVec2;
use crate::geom::{BoundingBox, Shape, Transform};
use super::config::SpaceConfig;
use super::error::SpaceError;
use super::grid::{DrawMode, Grid};
use super::hitbox::{Hitbox, HitboxId, Role};
use super::object::{
    AppearanceId, CollisionRecord, MobileState, ObjectBehavior, ObjectId, SpaceObject,
};
use super::queue::{Change, ChangeQueue};

/// Position of a mobile object in the per-frame movement order:
/// descending priority, then ascending serial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MoveOrder {
    pub(crate) priority: Reverse<i32>,
    pub(crate) serial: u64,
    pub(crate) id: ObjectId,
}

/// A continuous 2D space of objects indexed by a cell grid.
pub struct Space {
    pub(crate) grid: Grid,
    pub(crate) hitboxes: SlotMap<HitboxId, Hitbox>,
    pub(crate) objects: SlotMap<ObjectId, SpaceObject>,
    /// Attached objects by serial
    pub(crate) members: BTreeMap<u64, ObjectId>,
    /// Attached mobile objects in movement order
    pub(crate) mobile_order: BTreeSet<MoveOrder>,
    pub(crate) changes: ChangeQueue,
    pub(crate) object_depth: u32,
    pub(crate) mobile_depth: u32,
    pub(crate) next_serial: u64,
    pub(crate) time_factor: Fixed,
    pub(crate) frame: u64,
}

impl Default for Space {
    fn default() -> Self {
        Self::new(SpaceConfig::default())
    }
}

impl Space {
    /// Create an empty space.
    ///
    /// # Panics
    /// Panics if the config is invalid.
    pub fn new(config: SpaceConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid space config: {}", e);
        }
        Self {
            grid: Grid::new(config.cell_width, config.cell_height, config.draw_mode),
            hitboxes: SlotMap::with_key(),
            objects: SlotMap::with_key(),
            members: BTreeMap::new(),
            mobile_order: BTreeSet::new(),
            changes: ChangeQueue::new(),
            object_depth: 0,
            mobile_depth: 0,
            next_serial: 1,
            time_factor: config.time_factor,
            frame: 0,
        }
    }

    /// Current settings.
    pub fn config(&self) -> SpaceConfig {
        SpaceConfig {
            cell_width: self.grid.cell_width(),
            cell_height: self.grid.cell_height(),
            draw_mode: self.grid.draw_mode(),
            time_factor: self.time_factor,
        }
    }

    /// The cell grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Global displacement multiplier.
    pub fn time_factor(&self) -> Fixed {
        self.time_factor
    }

    /// Set the global displacement multiplier.
    ///
    /// # Panics
    /// Panics on a negative factor.
    pub fn set_time_factor(&mut self, factor: Fixed) {
        assert!(factor >= 0, "time factor must not be negative");
        self.time_factor = factor;
    }

    /// Change cell size; every indexed hitbox is re-registered.
    ///
    /// # Panics
    /// Panics if either dimension is not positive.
    pub fn set_cell_dimensions(&mut self, width: Fixed, height: Fixed) {
        let mode = self.grid.draw_mode();
        self.grid.rebuild(&mut self.hitboxes, width, height, mode);
    }

    /// Change how locators are ordered within cells.
    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        if mode == self.grid.draw_mode() {
            return;
        }
        let (width, height) = (self.grid.cell_width(), self.grid.cell_height());
        self.grid.rebuild(&mut self.hitboxes, width, height, mode);
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    /// Look up an object.
    pub fn object(&self, id: ObjectId) -> Option<&SpaceObject> {
        self.objects.get(id)
    }

    pub(crate) fn object_ref(&self, id: ObjectId) -> Result<&SpaceObject, SpaceError> {
        self.objects.get(id).ok_or(SpaceError::UnknownObject(id))
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut SpaceObject, SpaceError> {
        self.objects.get_mut(id).ok_or(SpaceError::UnknownObject(id))
    }

    fn mobile_mut(&mut self, id: ObjectId) -> Result<&mut MobileState, SpaceError> {
        self.object_mut(id)?
            .mobile
            .as_mut()
            .ok_or(SpaceError::NotMobile(id))
    }

    /// Attached objects in serial order.
    pub fn objects(&self) -> Vec<ObjectId> {
        self.members.values().copied().collect()
    }

    /// Attached mobile objects in movement order.
    pub fn mobile_objects(&self) -> Vec<ObjectId> {
        self.mobile_order.iter().map(|m| m.id).collect()
    }

    /// True if the object is in the space.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.get(id).map_or(false, |o| o.attached)
    }

    /// Number of objects, attached or not.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Create a detached object around a free root hitbox.
    pub fn create_object(&mut self, locator: HitboxId) -> Result<ObjectId, SpaceError> {
        self.check_free(locator)?;
        let center = self.create_hitbox(Shape::Point, Transform::default());
        let serial = self.next_serial;
        self.next_serial += 1;

        let id = self.objects.insert(SpaceObject::new(serial, locator, center));
        {
            let hitbox = &mut self.hitboxes[locator];
            hitbox.object = Some(id);
            hitbox.serial = serial;
            hitbox.draw_priority = 0;
        }
        self.hitboxes[center].object = Some(id);
        self.hitboxes[center].serial = serial;
        self.link_child(locator, center);
        self.refresh(locator);

        trace!(serial, "object created");
        Ok(id)
    }

    /// Create a detached mobile object.
    pub fn create_mobile_object(
        &mut self,
        locator: HitboxId,
        collision: HitboxId,
    ) -> Result<ObjectId, SpaceError> {
        self.check_free(collision)?;
        if collision == locator {
            return Err(SpaceError::HitboxOwned(collision));
        }
        let id = self.create_object(locator)?;
        self.objects[id].mobile = Some(MobileState::new(None));
        self.set_collision_hitbox(id, Some(collision))?;
        Ok(id)
    }

    /// Free a detached object and every hitbox under its locator.
    pub fn destroy_object(&mut self, id: ObjectId) -> Result<(), SpaceError> {
        let object = self.object_ref(id)?;
        if object.attached {
            return Err(SpaceError::ObjectAttached(id));
        }
        if object.mobile.is_some() {
            self.set_leader(id, None)?;
            let followers: Vec<ObjectId> = self.objects[id]
                .mobile
                .as_ref()
                .map(|m| m.followers.iter().copied().collect())
                .unwrap_or_default();
            for follower in followers {
                self.set_leader(follower, None)?;
            }
        }

        let locator = self.objects[id].locator;
        for h in self.hitbox_subtree(locator) {
            if let Some(hitbox) = self.hitboxes.get_mut(h) {
                hitbox.object = None;
            }
        }
        self.free_subtree(locator);
        self.objects.remove(id);
        Ok(())
    }

    // =========================================================================
    // ROLE HITBOXES
    // =========================================================================

    /// Adopt a free hitbox as one of the object's role hitboxes.
    fn claim(&mut self, id: ObjectId, hitbox: HitboxId, role: Role) -> Result<(), SpaceError> {
        self.check_free(hitbox)?;
        let (locator, serial, attached) = {
            let object = self.object_ref(id)?;
            (object.locator, object.serial, object.attached)
        };
        self.hitboxes[hitbox].object = Some(id);
        self.hitboxes[hitbox].serial = serial;
        self.link_child(locator, hitbox);
        self.refresh(hitbox);
        if attached && (role != Role::Solid || self.hitboxes[hitbox].has_surfaces()) {
            self.grid.add_role(hitbox, &mut self.hitboxes[hitbox], role);
        }
        Ok(())
    }

    /// Give back a role hitbox; it keeps its transform but loses its parent.
    fn release(&mut self, hitbox: HitboxId, role: Role) {
        if let Some(h) = self.hitboxes.get_mut(hitbox) {
            self.grid.remove_role(hitbox, h, role);
            h.object = None;
        }
        self.unlink_child(hitbox);
        self.refresh(hitbox);
    }

    /// Set or clear the overlap hitbox. Returns the released one.
    pub fn set_overlap_hitbox(
        &mut self,
        id: ObjectId,
        hitbox: Option<HitboxId>,
    ) -> Result<Option<HitboxId>, SpaceError> {
        let old = self.object_ref(id)?.overlap;
        if old == hitbox {
            return Ok(None);
        }
        if let Some(h) = hitbox {
            self.claim(id, h, Role::Overlap)?;
        }
        if let Some(h) = old {
            self.release(h, Role::Overlap);
        }
        self.objects[id].overlap = hitbox;
        Ok(old)
    }

    /// Set or clear the solid hitbox. Returns the released one.
    ///
    /// The new hitbox is indexed as solid only once it has a solid surface.
    pub fn set_solid_hitbox(
        &mut self,
        id: ObjectId,
        hitbox: Option<HitboxId>,
    ) -> Result<Option<HitboxId>, SpaceError> {
        let old = self.object_ref(id)?.solid;
        if old == hitbox {
            return Ok(None);
        }
        if let Some(h) = hitbox {
            self.claim(id, h, Role::Solid)?;
        }
        if let Some(h) = old {
            self.release(h, Role::Solid);
        }
        self.objects[id].solid = hitbox;
        Ok(old)
    }

    /// Set or clear a mobile object's collision hitbox. Returns the
    /// released one.
    pub fn set_collision_hitbox(
        &mut self,
        id: ObjectId,
        hitbox: Option<HitboxId>,
    ) -> Result<Option<HitboxId>, SpaceError> {
        let old = self
            .object_ref(id)?
            .mobile
            .as_ref()
            .ok_or(SpaceError::NotMobile(id))?
            .collision;
        if old == hitbox {
            return Ok(None);
        }
        if let Some(h) = hitbox {
            self.claim(id, h, Role::Collision)?;
        }
        if let Some(h) = old {
            self.release(h, Role::Collision);
        }
        self.mobile_mut(id)?.collision = hitbox;
        Ok(old)
    }

    /// Swap the locator. Role hitboxes move to the new locator; other
    /// children stay with the old one, which is returned free.
    pub fn set_locator_hitbox(&mut self, id: ObjectId, locator: HitboxId) -> Result<HitboxId, SpaceError> {
        self.check_free(locator)?;
        let (old, serial, priority, attached) = {
            let object = self.object_ref(id)?;
            (object.locator, object.serial, object.draw_priority, object.attached)
        };
        let dependents: Vec<HitboxId> = self.objects[id]
            .role_hitboxes()
            .filter(|h| *h != old)
            .collect();

        if attached {
            self.grid.remove_role(old, &mut self.hitboxes[old], Role::Locator);
        }
        self.hitboxes[old].object = None;

        {
            let hitbox = &mut self.hitboxes[locator];
            hitbox.object = Some(id);
            hitbox.serial = serial;
            hitbox.draw_priority = priority;
        }
        for h in dependents {
            self.unlink_child(h);
            self.link_child(locator, h);
        }
        self.objects[id].locator = locator;
        self.refresh(locator);
        self.refresh(old);
        if attached {
            self.grid.add_role(locator, &mut self.hitboxes[locator], Role::Locator);
        }
        Ok(old)
    }

    /// Offset of the center point from the locator.
    pub fn set_center_offset(&mut self, id: ObjectId, offset: FixedVec2) -> Result<(), SpaceError> {
        let center = self.object_ref(id)?.center;
        self.set_hitbox_position(center, offset)
    }

    /// Enable or disable one solid face.
    pub fn set_surface(&mut self, id: ObjectId, direction: Direction, solid: bool) -> Result<(), SpaceError> {
        let hitbox = self.object_ref(id)?.solid.ok_or(SpaceError::NoSolidHitbox(id))?;
        let mut surfaces = self.hitboxes[hitbox].surfaces;
        surfaces[direction.index()] = solid;
        self.set_surfaces(id, surfaces)
    }

    /// Set all four faces, indexed by `Direction::index`.
    pub fn set_surfaces(&mut self, id: ObjectId, surfaces: [bool; 4]) -> Result<(), SpaceError> {
        let object = self.object_ref(id)?;
        let hitbox = object.solid.ok_or(SpaceError::NoSolidHitbox(id))?;
        let attached = object.attached;

        let h = &mut self.hitboxes[hitbox];
        h.surfaces = surfaces;
        if attached {
            if h.has_surfaces() {
                self.grid.add_role(hitbox, h, Role::Solid);
            } else {
                self.grid.remove_role(hitbox, h, Role::Solid);
            }
        }
        Ok(())
    }

    // =========================================================================
    // TRANSFORM
    // =========================================================================

    /// Absolute locator position.
    pub fn position(&self, id: ObjectId) -> Option<FixedVec2> {
        let object = self.objects.get(id)?;
        self.hitboxes.get(object.locator).map(|h| h.absolute.position)
    }

    /// Absolute center point.
    pub fn center(&self, id: ObjectId) -> Option<FixedVec2> {
        let object = self.objects.get(id)?;
        self.hitboxes.get(object.center).map(|h| h.absolute.position)
    }

    /// Locator bounding box.
    pub fn bounds(&self, id: ObjectId) -> Option<BoundingBox> {
        let object = self.objects.get(id)?;
        self.hitboxes.get(object.locator).map(|h| h.bounds)
    }

    /// Place the object.
    pub fn set_position(&mut self, id: ObjectId, position: FixedVec2) -> Result<(), SpaceError> {
        let locator = self.object_ref(id)?.locator;
        self.set_hitbox_position(locator, position)
    }

    /// Move the object without collision checks.
    pub(crate) fn shift(&mut self, id: ObjectId, delta: FixedVec2) {
        if delta.is_zero() {
            return;
        }
        if let Some(locator) = self.objects.get(id).map(|o| o.locator) {
            self.hitboxes[locator].relative.position += delta;
            self.refresh(locator);
        }
    }

    /// Set the object's flips.
    pub fn set_flip(&mut self, id: ObjectId, x_flip: bool, y_flip: bool) -> Result<(), SpaceError> {
        let locator = self.object_ref(id)?.locator;
        self.set_hitbox_flip(locator, x_flip, y_flip)
    }

    /// Set the object's angle in degrees.
    pub fn set_angle(&mut self, id: ObjectId, angle: Fixed) -> Result<(), SpaceError> {
        let locator = self.object_ref(id)?.locator;
        self.set_hitbox_angle(locator, normalize_angle(angle))
    }

    // =========================================================================
    // PRESENTATION AND POLICY
    // =========================================================================

    /// Change the draw priority, re-keying the locator in flat mode.
    pub fn set_draw_priority(&mut self, id: ObjectId, priority: i32) -> Result<(), SpaceError> {
        let object = self.object_mut(id)?;
        object.draw_priority = priority;
        let locator = object.locator;
        self.grid.reprioritize(locator, &mut self.hitboxes[locator], priority);
        Ok(())
    }

    /// Set the renderer-side visual.
    pub fn set_appearance(&mut self, id: ObjectId, appearance: Option<AppearanceId>) -> Result<(), SpaceError> {
        self.object_mut(id)?.appearance = appearance;
        Ok(())
    }

    /// Install collision policy and lifecycle hooks.
    pub fn set_behavior(
        &mut self,
        id: ObjectId,
        behavior: Option<Box<dyn ObjectBehavior>>,
    ) -> Result<(), SpaceError> {
        self.object_mut(id)?.behavior = behavior;
        Ok(())
    }

    /// Per-object displacement multiplier.
    pub fn set_object_time_factor(&mut self, id: ObjectId, factor: Fixed) -> Result<(), SpaceError> {
        self.object_mut(id)?.time_factor = factor;
        Ok(())
    }

    // =========================================================================
    // MOBILE STATE
    // =========================================================================

    /// Velocity of a mobile object.
    pub fn velocity(&self, id: ObjectId) -> Option<FixedVec2> {
        self.objects.get(id)?.mobile.as_ref().map(|m| m.velocity)
    }

    /// Set the per-frame velocity.
    pub fn set_velocity(&mut self, id: ObjectId, velocity: FixedVec2) -> Result<(), SpaceError> {
        self.mobile_mut(id)?.velocity = velocity;
        Ok(())
    }

    /// Add a one-frame impulse.
    pub fn add_step(&mut self, id: ObjectId, step: FixedVec2) -> Result<(), SpaceError> {
        self.mobile_mut(id)?.step += step;
        Ok(())
    }

    /// Set or clear the pressing direction.
    pub fn set_pressing(&mut self, id: ObjectId, pressing: Option<Direction>) -> Result<(), SpaceError> {
        self.mobile_mut(id)?.pressing = pressing;
        Ok(())
    }

    /// Contacts recorded for the object this frame.
    pub fn collisions(&self, id: ObjectId) -> &[CollisionRecord] {
        self.objects
            .get(id)
            .and_then(|o| o.mobile.as_ref())
            .map(|m| m.collisions.as_slice())
            .unwrap_or(&[])
    }

    /// Movement priority of a mobile object.
    pub fn movement_priority(&self, id: ObjectId) -> Option<i32> {
        self.objects.get(id)?.mobile.as_ref().map(|m| m.priority)
    }

    /// Change movement priority; deferred while an iteration is open.
    pub fn set_movement_priority(&mut self, id: ObjectId, priority: i32) -> Result<(), SpaceError> {
        self.mobile_mut(id)?;
        if self.is_iterating() {
            trace!(?id, priority, "priority change queued");
            self.changes.push(Change::Priority(id, priority));
        } else {
            self.apply_priority(id, priority);
        }
        Ok(())
    }

    fn apply_priority(&mut self, id: ObjectId, priority: i32) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        let serial = object.serial;
        let attached = object.attached;
        let Some(mobile) = object.mobile.as_mut() else {
            return;
        };
        let old = MoveOrder { priority: Reverse(mobile.priority), serial, id };
        mobile.priority = priority;
        if attached {
            self.mobile_order.remove(&old);
            self.mobile_order.insert(MoveOrder { priority: Reverse(priority), serial, id });
        }
    }

    /// Make `follower` move with `leader`, or stop following.
    pub fn set_leader(&mut self, follower: ObjectId, leader: Option<ObjectId>) -> Result<(), SpaceError> {
        self.mobile_mut(follower)?;
        if let Some(l) = leader {
            self.mobile_mut(l)?;
            if self.leads(follower, l) {
                return Err(SpaceError::WouldCreateCycle);
            }
        }

        let old = self.mobile_mut(follower)?.leader.take();
        if let Some(o) = old {
            if let Ok(m) = self.mobile_mut(o) {
                m.followers.remove(&follower);
            }
        }
        if let Some(l) = leader {
            self.mobile_mut(l)?.followers.insert(follower);
        }
        self.mobile_mut(follower)?.leader = leader;
        Ok(())
    }

    /// True if `ancestor` is `id` or appears on `id`'s leader chain.
    pub(crate) fn leads(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let limit = self.objects.len();
        let mut current = Some(id);
        let mut steps = 0;
        while let Some(o) = current {
            if o == ancestor {
                return true;
            }
            steps += 1;
            assert!(steps <= limit, "leader chain contains a cycle");
            current = self.objects.get(o).and_then(|obj| obj.mobile.as_ref()).and_then(|m| m.leader);
        }
        false
    }

    /// Objects related through leader chains in either direction.
    pub fn are_related(&self, a: ObjectId, b: ObjectId) -> bool {
        self.leads(a, b) || self.leads(b, a)
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    /// True while any `visit_*` iteration is open.
    pub fn is_iterating(&self) -> bool {
        self.object_depth > 0 || self.mobile_depth > 0
    }

    /// Number of queued changes.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Request that the object enter the space.
    pub fn add_object(&mut self, id: ObjectId) -> Result<(), SpaceError> {
        self.object_ref(id)?;
        if self.is_iterating() {
            trace!(?id, "add queued");
            self.changes.push(Change::Add(id));
        } else {
            self.attach(id);
        }
        Ok(())
    }

    /// Request that the object leave the space.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<(), SpaceError> {
        self.object_ref(id)?;
        if self.is_iterating() {
            trace!(?id, "remove queued");
            self.changes.push(Change::Remove(id));
        } else {
            self.detach(id);
        }
        Ok(())
    }

    /// Request that every object leave, including ones with a pending add.
    pub fn clear_objects(&mut self) {
        let mut leaving: Vec<(u64, ObjectId)> = self
            .objects
            .iter()
            .filter(|(id, o)| o.attached || self.changes.pending_membership(*id) == Some(Change::Add(*id)))
            .map(|(id, o)| (o.serial, id))
            .collect();
        leaving.sort();

        for (_, id) in leaving {
            if self.is_iterating() {
                self.changes.push(Change::Remove(id));
            } else {
                self.detach(id);
            }
        }
    }

    fn attach(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        if object.attached {
            return;
        }
        object.attached = true;
        let serial = object.serial;
        self.members.insert(serial, id);

        let object = &self.objects[id];
        let mut roles = vec![(object.locator, Role::Locator), (object.center, Role::Center)];
        roles.extend(object.overlap.map(|h| (h, Role::Overlap)));
        roles.extend(object.solid.map(|h| (h, Role::Solid)));
        if let Some(mobile) = object.mobile.as_ref() {
            roles.extend(mobile.collision.map(|h| (h, Role::Collision)));
            self.mobile_order.insert(MoveOrder { priority: Reverse(mobile.priority), serial, id });
        }
        for (h, role) in roles {
            let hitbox = &mut self.hitboxes[h];
            if role == Role::Solid && !hitbox.has_surfaces() {
                continue;
            }
            self.grid.add_role(h, hitbox, role);
        }

        if let Some(behavior) = self.objects[id].behavior.as_mut() {
            behavior.added(id);
        }
        trace!(serial, "object added");
    }

    fn detach(&mut self, id: ObjectId) {
        let Some(object) = self.objects.get_mut(id) else {
            return;
        };
        if !object.attached {
            return;
        }
        object.attached = false;
        let serial = object.serial;
        self.members.remove(&serial);
        if let Some(mobile) = object.mobile.as_ref() {
            self.mobile_order.remove(&MoveOrder { priority: Reverse(mobile.priority), serial, id });
        }

        let held: Vec<HitboxId> = self.objects[id].role_hitboxes().collect();
        for h in held {
            let hitbox = &mut self.hitboxes[h];
            for role in hitbox.roles.iter() {
                self.grid.remove_role(h, hitbox, role);
            }
        }

        if let Some(behavior) = self.objects[id].behavior.as_mut() {
            behavior.removed(id);
        }
        trace!(serial, "object removed");
    }

    /// Visit every attached object in serial order.
    ///
    /// Membership requests made by `f` are deferred until the outermost
    /// iteration ends.
    pub fn visit_objects<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Space, ObjectId),
    {
        let ids = self.objects();
        self.object_depth += 1;
        for id in ids {
            if self.contains(id) {
                f(self, id);
            }
        }
        self.object_depth -= 1;
        self.flush_if_idle();
    }

    /// Visit every attached mobile object in movement order.
    pub fn visit_mobile_objects<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Space, ObjectId),
    {
        let ids = self.mobile_objects();
        self.mobile_depth += 1;
        for id in ids {
            if self.contains(id) {
                f(self, id);
            }
        }
        self.mobile_depth -= 1;
        self.flush_if_idle();
    }

    fn flush_if_idle(&mut self) {
        if self.is_iterating() || self.changes.is_empty() {
            return;
        }
        let changes = self.changes.drain();
        debug!(count = changes.len(), "flushing queued changes");
        for change in changes {
            match change {
                Change::Add(id) => self.attach(id),
                Change::Remove(id) => self.detach(id),
                Change::Priority(id, priority) => self.apply_priority(id, priority),
            }
        }
    }

    // =========================================================================
    // HASHING
    // =========================================================================

    /// Digest of every attached object's serial, position and movement
    /// state, in serial order.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_space_state();
        hasher.update_u64(self.frame);
        for (&serial, &id) in &self.members {
            let object = &self.objects[id];
            hasher.update_u64(serial);
            hasher.update_vec2(self.hitboxes[object.locator].absolute.position);
            match object.mobile.as_ref() {
                Some(mobile) => {
                    hasher.update_bool(true);
                    hasher.update_vec2(mobile.velocity);
                    hasher.update_i32(mobile.priority);
                }
                None => hasher.update_bool(false),
            }
        }
        hasher.finalize()
    }
}
