//! Hitbox Tree
//!
//! Structural operations on the hitbox arena: creation, parent/child and
//! composite links, relative transform edits, and destruction. Every edit
//! ends in [`Space::refresh`], which recomputes the affected subtree and
//! re-registers whatever holds grid roles.
//!
//! ```text
//!   refresh(h)
//!     1. top-down     absolute = base.absolute ∘ relative, re-place shape
//!     2. bottom-up    composite bounds = union of component bounds
//!     3. upward       composites containing h (component_of chain)
//!     4. grid         update_cells for every visited hitbox with roles
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::core::fixed::{Fixed, normalize_angle};
use crate::core::vec2::FixedVec2;
use crate::geom::{overlap, BoundingBox, Shape, Transform};
use super::error::SpaceError;
use super::hitbox::{Hitbox, HitboxId, HitboxKind};
use super::object::ObjectId;
use super::state::Space;

impl Space {
    // =========================================================================
    // CREATION AND LOOKUP
    // =========================================================================

    /// Create a free-standing primitive hitbox.
    pub fn create_hitbox(&mut self, shape: Shape, relative: Transform) -> HitboxId {
        let relative = Transform { angle: normalize_angle(relative.angle), ..relative };
        self.hitboxes.insert(Hitbox::new(HitboxKind::Primitive(shape), relative))
    }

    /// Create an empty composite hitbox.
    pub fn create_composite(&mut self, relative: Transform) -> HitboxId {
        let relative = Transform { angle: normalize_angle(relative.angle), ..relative };
        self.hitboxes.insert(Hitbox::new(HitboxKind::Composite(BTreeMap::new()), relative))
    }

    /// Look up a hitbox.
    pub fn hitbox(&self, id: HitboxId) -> Option<&Hitbox> {
        self.hitboxes.get(id)
    }

    pub(crate) fn hitbox_ref(&self, id: HitboxId) -> Result<&Hitbox, SpaceError> {
        self.hitboxes.get(id).ok_or(SpaceError::UnknownHitbox(id))
    }

    fn hitbox_mut(&mut self, id: HitboxId) -> Result<&mut Hitbox, SpaceError> {
        self.hitboxes.get_mut(id).ok_or(SpaceError::UnknownHitbox(id))
    }

    /// Object a hitbox belongs to: the nearest owned hitbox among itself,
    /// its parents and its enclosing composites.
    pub fn hitbox_owner(&self, id: HitboxId) -> Option<ObjectId> {
        let mut current = self.hitboxes.get(id)?;
        loop {
            if let Some(object) = current.object {
                return Some(object);
            }
            current = self.hitboxes.get(current.parent.or(current.component_of)?)?;
        }
    }

    /// True if `candidate` is `id` or one of its ancestors (parents or
    /// enclosing composites).
    fn is_ancestor_or_self(&self, candidate: HitboxId, id: HitboxId) -> bool {
        let mut current = Some(id);
        while let Some(h) = current {
            if h == candidate {
                return true;
            }
            current = self.hitboxes.get(h).and_then(|hb| hb.parent.or(hb.component_of));
        }
        false
    }

    /// Checks shared by every operation that adopts a free hitbox.
    pub(crate) fn check_free(&self, id: HitboxId) -> Result<(), SpaceError> {
        let hitbox = self.hitbox_ref(id)?;
        if hitbox.parent.is_some() {
            return Err(SpaceError::HitboxHasParent(id));
        }
        if hitbox.component_of.is_some() {
            return Err(SpaceError::HitboxIsComponent(id));
        }
        if hitbox.object.is_some() {
            return Err(SpaceError::HitboxOwned(id));
        }
        Ok(())
    }

    // =========================================================================
    // LINKS
    // =========================================================================

    /// Add `part` to a composite under `name`.
    pub fn add_component(
        &mut self,
        composite: HitboxId,
        name: impl Into<String>,
        part: HitboxId,
    ) -> Result<(), SpaceError> {
        let name = name.into();
        self.check_free(part)?;
        if !self.hitbox_ref(part)?.roles.is_empty() {
            return Err(SpaceError::ComponentCannotHoldRoles(part));
        }
        if self.is_ancestor_or_self(part, composite) {
            return Err(SpaceError::WouldCreateCycle);
        }
        match &mut self.hitbox_mut(composite)?.kind {
            HitboxKind::Composite(parts) => {
                if parts.contains_key(&name) {
                    return Err(SpaceError::DuplicateComponent(name));
                }
                parts.insert(name, part);
            }
            HitboxKind::Primitive(_) => return Err(SpaceError::NotComposite(composite)),
        }
        self.hitboxes[part].component_of = Some(composite);
        self.refresh(part);
        Ok(())
    }

    /// Take the component called `name` out of a composite.
    pub fn remove_component(&mut self, composite: HitboxId, name: &str) -> Result<HitboxId, SpaceError> {
        let part = match &mut self.hitbox_mut(composite)?.kind {
            HitboxKind::Composite(parts) => parts
                .remove(name)
                .ok_or_else(|| SpaceError::MissingComponent(name.to_string()))?,
            HitboxKind::Primitive(_) => return Err(SpaceError::NotComposite(composite)),
        };
        self.hitboxes[part].component_of = None;
        self.refresh(part);
        self.refresh(composite);
        Ok(part)
    }

    /// Make `child` a child of `parent`.
    pub fn attach_child(&mut self, parent: HitboxId, child: HitboxId) -> Result<(), SpaceError> {
        self.hitbox_ref(parent)?;
        self.check_free(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(SpaceError::WouldCreateCycle);
        }
        self.link_child(parent, child);
        self.refresh(child);
        Ok(())
    }

    /// Cut `child` loose from its parent; its relative transform becomes
    /// absolute.
    pub fn detach_child(&mut self, child: HitboxId) -> Result<(), SpaceError> {
        let hitbox = self.hitbox_ref(child)?;
        if hitbox.object.is_some() {
            return Err(SpaceError::HitboxOwned(child));
        }
        if hitbox.parent.is_none() {
            return Err(SpaceError::HitboxHasNoParent(child));
        }
        self.unlink_child(child);
        self.refresh(child);
        Ok(())
    }

    /// Link without ownership checks. Callers refresh afterwards.
    pub(crate) fn link_child(&mut self, parent: HitboxId, child: HitboxId) {
        self.hitboxes[child].parent = Some(parent);
        self.hitboxes[parent].children.insert(child);
    }

    /// Unlink without ownership checks. Callers refresh afterwards.
    pub(crate) fn unlink_child(&mut self, child: HitboxId) {
        if let Some(parent) = self.hitboxes[child].parent.take() {
            if let Some(p) = self.hitboxes.get_mut(parent) {
                p.children.remove(&child);
            }
        }
    }

    // =========================================================================
    // RELATIVE TRANSFORM EDITS
    // =========================================================================

    /// Set the position relative to the parent.
    pub fn set_hitbox_position(&mut self, id: HitboxId, position: FixedVec2) -> Result<(), SpaceError> {
        self.hitbox_mut(id)?.relative.position = position;
        self.refresh(id);
        Ok(())
    }

    /// Move relative to the current position.
    pub fn translate_hitbox(&mut self, id: HitboxId, delta: FixedVec2) -> Result<(), SpaceError> {
        self.hitbox_mut(id)?.relative.position += delta;
        self.refresh(id);
        Ok(())
    }

    /// Set the relative flips.
    pub fn set_hitbox_flip(&mut self, id: HitboxId, x_flip: bool, y_flip: bool) -> Result<(), SpaceError> {
        let hitbox = self.hitbox_mut(id)?;
        hitbox.relative.x_flip = x_flip;
        hitbox.relative.y_flip = y_flip;
        self.refresh(id);
        Ok(())
    }

    /// Set the relative angle in degrees.
    pub fn set_hitbox_angle(&mut self, id: HitboxId, angle: Fixed) -> Result<(), SpaceError> {
        self.hitbox_mut(id)?.relative.angle = normalize_angle(angle);
        self.refresh(id);
        Ok(())
    }

    /// Replace a primitive hitbox's shape.
    pub fn set_hitbox_shape(&mut self, id: HitboxId, shape: Shape) -> Result<(), SpaceError> {
        let hitbox = self.hitbox_mut(id)?;
        match &mut hitbox.kind {
            HitboxKind::Primitive(current) => *current = shape,
            HitboxKind::Composite(_) => return Err(SpaceError::NotPrimitive(id)),
        }
        self.refresh(id);
        Ok(())
    }

    // =========================================================================
    // DESTRUCTION
    // =========================================================================

    /// Destroy a hitbox and everything below it.
    pub fn destroy_hitbox(&mut self, id: HitboxId) -> Result<(), SpaceError> {
        let hitbox = self.hitbox_ref(id)?;
        if hitbox.object.is_some() {
            return Err(SpaceError::HitboxOwned(id));
        }
        if let Some(composite) = hitbox.component_of {
            if let HitboxKind::Composite(parts) = &mut self.hitboxes[composite].kind {
                parts.retain(|_, part| *part != id);
            }
            self.hitboxes[id].component_of = None;
            self.refresh(composite);
        }
        self.unlink_child(id);
        self.free_subtree(id);
        Ok(())
    }

    /// Remove `root` and its dependents from the arena and the grid.
    pub(crate) fn free_subtree(&mut self, root: HitboxId) {
        let mut stack = vec![root];
        while let Some(h) = stack.pop() {
            let Some(mut hitbox) = self.hitboxes.remove(h) else {
                continue;
            };
            for role in hitbox.roles.iter() {
                self.grid.remove_role(h, &mut hitbox, role);
            }
            stack.extend(hitbox.dependents());
        }
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// Recompute transforms, placed shapes and bounds below `id`, then
    /// re-register every affected hitbox in the grid.
    pub(crate) fn refresh(&mut self, id: HitboxId) {
        if !self.hitboxes.contains_key(id) {
            return;
        }

        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(h) = stack.pop() {
            let base = {
                let hitbox = &self.hitboxes[h];
                hitbox.parent.or(hitbox.component_of)
            };
            let base_absolute = base.and_then(|b| self.hitboxes.get(b)).map(|b| b.absolute);

            let hitbox = &mut self.hitboxes[h];
            hitbox.absolute = match base_absolute {
                Some(parent) => parent.compose(&hitbox.relative),
                None => hitbox.relative,
            };
            if let HitboxKind::Primitive(shape) = &hitbox.kind {
                let placed = shape.place(&hitbox.absolute);
                hitbox.bounds = placed.bounds();
                hitbox.placed = Some(placed);
            }
            stack.extend(hitbox.dependents());
            order.push(h);
        }

        // Components are visited after their composite
        for &h in order.iter().rev() {
            self.refresh_composite_bounds(h);
        }

        let mut current = id;
        while let Some(composite) = self.hitboxes[current].component_of {
            self.refresh_composite_bounds(composite);
            order.push(composite);
            current = composite;
        }

        for h in order {
            let hitbox = &mut self.hitboxes[h];
            if !hitbox.roles.is_empty() {
                self.grid.update_cells(h, hitbox);
            }
        }
    }

    fn refresh_composite_bounds(&mut self, id: HitboxId) {
        let hitbox = &self.hitboxes[id];
        let HitboxKind::Composite(parts) = &hitbox.kind else {
            return;
        };
        let bounds = parts
            .values()
            .filter_map(|p| self.hitboxes.get(*p))
            .map(|p| p.bounds)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| BoundingBox::at_point(hitbox.absolute.position));
        self.hitboxes[id].bounds = bounds;
    }

    // =========================================================================
    // OVERLAP
    // =========================================================================

    /// Do two hitboxes overlap?
    ///
    /// Composites overlap if any component does. Hitboxes of the same
    /// object never overlap.
    pub fn hitboxes_overlap(&self, a: HitboxId, b: HitboxId) -> bool {
        if a == b {
            return false;
        }
        if let (Some(x), Some(y)) = (self.hitbox_owner(a), self.hitbox_owner(b)) {
            if x == y {
                return false;
            }
        }
        self.shapes_overlap(a, b)
    }

    fn shapes_overlap(&self, a: HitboxId, b: HitboxId) -> bool {
        let (Some(ha), Some(hb)) = (self.hitboxes.get(a), self.hitboxes.get(b)) else {
            return false;
        };
        if !ha.bounds.meets(&hb.bounds) {
            return false;
        }
        match (&ha.kind, &hb.kind) {
            (HitboxKind::Composite(parts), _) => parts.values().any(|p| self.shapes_overlap(*p, b)),
            (_, HitboxKind::Composite(parts)) => parts.values().any(|p| self.shapes_overlap(a, *p)),
            _ => match (&ha.placed, &hb.placed) {
                (Some(pa), Some(pb)) => overlap(pa, pb),
                _ => false,
            },
        }
    }

    /// Every hitbox in the subtree rooted at `root`.
    pub fn hitbox_subtree(&self, root: HitboxId) -> BTreeSet<HitboxId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(h) = stack.pop() {
            if let Some(hitbox) = self.hitboxes.get(h) {
                if seen.insert(h) {
                    stack.extend(hitbox.dependents());
                }
            }
        }
        seen
    }
}
