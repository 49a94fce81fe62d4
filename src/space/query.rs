//! Spatial Queries
//!
//! Read-side operations over the grid. A hitbox spanning several cells is
//! reported once: scanning marks it, and the marks are cleared before the
//! query returns. Object results come back in serial order.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::core::fixed::{Fixed, floor_div};
use crate::core::vec2::FixedVec2;
use crate::geom::BoundingBox;
use super::error::SpaceError;
use super::grid::{CellCoord, CellRange, DrawMode};
use super::hitbox::{HitboxId, Role};
use super::object::{ObjectId, SpaceObject};
use super::state::Space;

fn assert_upright(area: &BoundingBox) {
    assert!(
        area.left <= area.right && area.top <= area.bottom,
        "inverted query rectangle {:?}",
        area
    );
}

impl Space {
    /// Hitboxes held under `role` in the cells `area` crosses, each once.
    pub(crate) fn scan(&mut self, area: &BoundingBox, role: Role) -> Vec<HitboxId> {
        let range = self.grid.exclusive_range(area);
        let mut found = Vec::new();
        for (_, cell) in self.grid.existing_cells(range) {
            for h in cell.hitboxes(role) {
                if let Some(hitbox) = self.hitboxes.get_mut(h) {
                    if !hitbox.scanned {
                        hitbox.scanned = true;
                        found.push(h);
                    }
                }
            }
        }
        for &h in &found {
            self.hitboxes[h].scanned = false;
        }
        found
    }

    fn by_serial(&self, ids: impl IntoIterator<Item = ObjectId>) -> Vec<ObjectId> {
        let ordered: BTreeMap<u64, ObjectId> = ids
            .into_iter()
            .filter_map(|id| self.objects.get(id).map(|o| (o.serial, id)))
            .collect();
        ordered.into_values().collect()
    }

    /// Owners of the `role` hitboxes near `area` that pass `keep`.
    fn owners_where<F>(&mut self, area: &BoundingBox, role: Role, mut keep: F) -> Vec<ObjectId>
    where
        F: FnMut(&Space, HitboxId) -> bool,
    {
        let found = self.scan(area, role);
        let space: &Space = self;
        let owners: Vec<ObjectId> = found
            .into_iter()
            .filter(|h| keep(space, *h))
            .filter_map(|h| space.hitboxes[h].object)
            .collect();
        space.by_serial(owners)
    }

    // =========================================================================
    // CENTER QUERIES
    // =========================================================================

    /// Objects whose center lies in `area`, edges included.
    ///
    /// # Panics
    /// Panics if the rectangle is inverted.
    pub fn objects_within_rectangle(&mut self, area: &BoundingBox) -> Vec<ObjectId> {
        assert_upright(area);
        let area = *area;
        self.owners_where(&area, Role::Center, |space, h| {
            area.contains_point(space.hitboxes[h].absolute.position)
        })
    }

    /// Objects whose center is within `radius` of `center`.
    ///
    /// # Panics
    /// Panics on a negative radius.
    pub fn objects_within_circle(&mut self, center: FixedVec2, radius: Fixed) -> Vec<ObjectId> {
        assert!(radius >= 0, "negative query radius {}", radius);
        let area = BoundingBox::new(
            center.x.saturating_sub(radius),
            center.y.saturating_sub(radius),
            center.x.saturating_add(radius),
            center.y.saturating_add(radius),
        );
        let limit = radius as i64 * radius as i64;
        self.owners_where(&area, Role::Center, |space, h| {
            space.hitboxes[h].absolute.position.distance_squared_wide(center) <= limit
        })
    }

    /// Nearest object to `point` (by center) accepted by `predicate`.
    /// Ties go to the lower serial.
    pub fn nearest_object<P>(&mut self, point: FixedVec2, mut predicate: P) -> Option<ObjectId>
    where
        P: FnMut(ObjectId, &SpaceObject) -> bool,
    {
        let bounds = self.grid.bounds()?;
        let (cw, ch) = (self.grid.cell_width(), self.grid.cell_height());
        let origin = CellCoord::new(floor_div(point.x, cw), floor_div(point.y, ch));
        let first = [
            bounds.min_x - origin.x,
            origin.x - bounds.max_x,
            bounds.min_y - origin.y,
            origin.y - bounds.max_y,
        ]
        .into_iter()
        .fold(0, i32::max);
        let last = [
            origin.x - bounds.min_x,
            bounds.max_x - origin.x,
            origin.y - bounds.min_y,
            bounds.max_y - origin.y,
        ]
        .into_iter()
        .fold(0, i32::max);
        let cell_span = cw.min(ch) as i64;

        let mut best: Option<(i64, u64, ObjectId)> = None;
        let mut marked = Vec::new();
        for ring in first..=last {
            // Every cell on this ring is at least (ring - 1) cells away.
            if let Some((nearest, _, _)) = best {
                let reach = (ring as i64 - 1) * cell_span;
                if reach > 0 && reach.saturating_mul(reach) > nearest {
                    break;
                }
            }
            let range = CellRange {
                min_x: origin.x - ring,
                min_y: origin.y - ring,
                max_x: origin.x + ring,
                max_y: origin.y + ring,
            };
            let mut found = Vec::new();
            for (coord, cell) in self.grid.existing_cells(range) {
                if (coord.x - origin.x).abs().max((coord.y - origin.y).abs()) != ring {
                    continue;
                }
                for h in cell.hitboxes(Role::Center) {
                    let hitbox = &mut self.hitboxes[h];
                    if !hitbox.scanned {
                        hitbox.scanned = true;
                        found.push(h);
                    }
                }
            }
            for &h in &found {
                let hitbox = &self.hitboxes[h];
                let Some(id) = hitbox.object else {
                    continue;
                };
                let object = &self.objects[id];
                if !predicate(id, object) {
                    continue;
                }
                let candidate = (hitbox.absolute.position.distance_squared_wide(point), object.serial, id);
                if best.map_or(true, |b| (candidate.0, candidate.1) < (b.0, b.1)) {
                    best = Some(candidate);
                }
            }
            marked.extend(found);
        }
        for h in marked {
            self.hitboxes[h].scanned = false;
        }
        best.map(|(_, _, id)| id)
    }

    // =========================================================================
    // HITBOX QUERIES
    // =========================================================================

    /// Objects whose overlap hitbox overlaps `hitbox`.
    pub fn overlapping_objects(&mut self, hitbox: HitboxId) -> Result<Vec<ObjectId>, SpaceError> {
        let bounds = self.hitbox_ref(hitbox)?.bounds;
        Ok(self.owners_where(&bounds, Role::Overlap, |space, h| space.hitboxes_overlap(hitbox, h)))
    }

    /// Lowest-serial object whose overlap hitbox overlaps `hitbox`.
    pub fn overlapping_object(&mut self, hitbox: HitboxId) -> Result<Option<ObjectId>, SpaceError> {
        Ok(self.overlapping_objects(hitbox)?.into_iter().next())
    }

    /// Objects whose solid hitbox (with at least one solid face) overlaps
    /// `hitbox`.
    pub fn solid_objects_intersecting(&mut self, hitbox: HitboxId) -> Result<Vec<ObjectId>, SpaceError> {
        let bounds = self.hitbox_ref(hitbox)?.bounds;
        Ok(self.owners_where(&bounds, Role::Solid, |space, h| space.hitboxes_overlap(hitbox, h)))
    }

    /// Lowest-serial object whose solid hitbox overlaps `hitbox`.
    pub fn solid_object_intersecting(&mut self, hitbox: HitboxId) -> Result<Option<ObjectId>, SpaceError> {
        Ok(self.solid_objects_intersecting(hitbox)?.into_iter().next())
    }

    /// Objects whose locator bounding box meets `area`, edges included.
    pub fn objects_meeting(&mut self, area: &BoundingBox) -> Vec<ObjectId> {
        assert_upright(area);
        let area = *area;
        self.owners_where(&area, Role::Locator, |space, h| space.hitboxes[h].bounds.meets(&area))
    }

    // =========================================================================
    // DRAW ORDER
    // =========================================================================

    /// Existing cells touching `view`, in coordinate order.
    pub fn cells_in_view(&self, view: &BoundingBox) -> Vec<CellCoord> {
        assert_upright(view);
        let range = self.grid.inclusive_range(view);
        self.grid.existing_cells(range).map(|(coord, _)| *coord).collect()
    }

    /// Objects whose locator is in the cell, in the order they should be
    /// drawn under the current draw mode.
    pub fn draw_order(&self, coord: CellCoord) -> Vec<ObjectId> {
        let Some(cell) = self.grid.cell(coord) else {
            return Vec::new();
        };
        let mut entries: Vec<(Fixed, i32, u64, HitboxId)> = cell
            .draw_keys()
            .map(|key| {
                let hitbox = &self.hitboxes[key.hitbox];
                (hitbox.absolute.position.y, hitbox.draw_priority, key.serial, key.hitbox)
            })
            .collect();
        match self.grid.draw_mode() {
            DrawMode::Flat => {}
            DrawMode::YOver => entries.sort_by_key(|&(y, priority, serial, _)| (y, priority, serial)),
            DrawMode::YUnder => entries.sort_by_key(|&(y, priority, serial, _)| (Reverse(y), priority, serial)),
        }
        entries
            .into_iter()
            .filter_map(|(_, _, _, h)| self.hitboxes[h].object)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::direction::Direction;
    use crate::core::fixed::FIXED_ONE;
    use crate::geom::{Shape, Transform};

    fn at(space: &mut Space, x: i32, y: i32) -> ObjectId {
        let locator = space.create_hitbox(
            Shape::centered_box(2 * FIXED_ONE, 2 * FIXED_ONE),
            Transform::at(FixedVec2::from_ints(x, y)),
        );
        let id = space.create_object(locator).unwrap();
        space.add_object(id).unwrap();
        id
    }

    fn span(l: i32, t: i32, r: i32, b: i32) -> BoundingBox {
        BoundingBox::new(l * FIXED_ONE, t * FIXED_ONE, r * FIXED_ONE, b * FIXED_ONE)
    }

    #[test]
    fn test_objects_within_rectangle_is_idempotent() {
        let mut space = Space::default();
        let inside = at(&mut space, 10, 10);
        let edge = at(&mut space, 100, 100);
        let _outside = at(&mut space, 300, 10);
        // Center on a cell corner, indexed in four cells.
        let wide = at(&mut space, 64, 64);

        let area = span(0, 0, 100, 100);
        let first = space.objects_within_rectangle(&area);
        let second = space.objects_within_rectangle(&area);
        assert_eq!(first, vec![inside, edge, wide]);
        assert_eq!(first, second);
        assert!(space.hitboxes.values().all(|h| !h.is_scanned()));
    }

    #[test]
    #[should_panic]
    fn test_inverted_rectangle_panics() {
        let mut space = Space::default();
        let inverted = BoundingBox { left: FIXED_ONE, top: 0, right: 0, bottom: FIXED_ONE };
        space.objects_within_rectangle(&inverted);
    }

    #[test]
    fn test_objects_within_circle() {
        let mut space = Space::default();
        let near = at(&mut space, 3, 4);
        let _far = at(&mut space, 4, 4);
        assert_eq!(space.objects_within_circle(FixedVec2::ZERO, 5 * FIXED_ONE), vec![near]);
        assert!(space.objects_within_circle(FixedVec2::from_ints(-50, 0), 0).is_empty());
    }

    #[test]
    fn test_nearest_object() {
        let mut space = Space::default();
        let origin = at(&mut space, 10, 0);
        let right = at(&mut space, 200, 0);
        let left = at(&mut space, -100, 50);

        assert_eq!(space.nearest_object(FixedVec2::from_ints(150, 0), |_, _| true), Some(right));
        assert_eq!(space.nearest_object(FixedVec2::from_ints(150, 0), |id, _| id != right), Some(origin));
        assert_eq!(space.nearest_object(FixedVec2::from_ints(-5000, 9000), |_, _| true), Some(left));
        assert_eq!(space.nearest_object(FixedVec2::ZERO, |_, _| false), None);
        assert!(space.hitboxes.values().all(|h| !h.is_scanned()));
    }

    #[test]
    fn test_nearest_object_in_empty_space() {
        let mut space = Space::default();
        assert_eq!(space.nearest_object(FixedVec2::ZERO, |_, _| true), None);
    }

    #[test]
    fn test_overlapping_objects() {
        let mut space = Space::default();
        let a = at(&mut space, 0, 0);
        let b = at(&mut space, 100, 0);
        for id in [a, b] {
            let overlap = space.create_hitbox(Shape::circle(2 * FIXED_ONE), Transform::default());
            space.set_overlap_hitbox(id, Some(overlap)).unwrap();
        }

        let point = space.create_hitbox(Shape::Point, Transform::at(FixedVec2::from_ints(101, 0)));
        assert_eq!(space.overlapping_objects(point).unwrap(), vec![b]);
        assert_eq!(space.overlapping_object(point).unwrap(), Some(b));

        let own = space.object(a).unwrap().overlap().unwrap();
        assert!(space.overlapping_objects(own).unwrap().is_empty(), "an object never overlaps itself");

        let missing = {
            let h = space.create_hitbox(Shape::Point, Transform::default());
            space.destroy_hitbox(h).unwrap();
            h
        };
        assert_eq!(space.overlapping_objects(missing), Err(SpaceError::UnknownHitbox(missing)));
    }

    #[test]
    fn test_attached_child_belongs_to_its_object() {
        let mut space = Space::default();
        let a = at(&mut space, 0, 0);
        let b = at(&mut space, 3, 0);
        for id in [a, b] {
            let overlap = space.create_hitbox(Shape::circle(2 * FIXED_ONE), Transform::default());
            space.set_overlap_hitbox(id, Some(overlap)).unwrap();
        }

        // A plain child of a's locator reaching over to b.
        let locator = space.object(a).unwrap().locator();
        let reach = space.create_hitbox(Shape::circle(2 * FIXED_ONE), Transform::at(FixedVec2::from_ints(1, 0)));
        space.attach_child(locator, reach).unwrap();

        assert_eq!(space.hitbox_owner(reach), Some(a));
        assert_eq!(space.overlapping_objects(reach).unwrap(), vec![b]);
    }

    #[test]
    fn test_solid_objects_need_a_face() {
        let mut space = Space::default();
        let id = at(&mut space, 0, 0);
        let solid = space.create_hitbox(Shape::centered_box(4 * FIXED_ONE, 4 * FIXED_ONE), Transform::default());
        space.set_solid_hitbox(id, Some(solid)).unwrap();
        let ring = space.create_hitbox(Shape::circle(FIXED_ONE), Transform::at(FixedVec2::from_ints(2, 0)));

        assert_eq!(space.solid_object_intersecting(ring).unwrap(), None);
        space.set_surface(id, Direction::Up, true).unwrap();
        assert_eq!(space.solid_object_intersecting(ring).unwrap(), Some(id));
    }

    #[test]
    fn test_objects_meeting_includes_touching() {
        let mut space = Space::default();
        let id = at(&mut space, 0, 0);
        assert_eq!(space.objects_meeting(&span(1, -5, 5, 5)), vec![id], "touches the right edge");
        assert!(space.objects_meeting(&span(2, -5, 5, 5)).is_empty());
    }

    #[test]
    fn test_draw_order_by_mode() {
        let mut space = Space::default();
        let low = at(&mut space, 10, 30);
        let high = at(&mut space, 20, 10);
        let middle = at(&mut space, 30, 20);
        space.set_draw_priority(low, -1).unwrap();
        let cell = CellCoord::new(0, 0);

        assert_eq!(space.draw_order(cell), vec![low, high, middle]);
        space.set_draw_mode(DrawMode::YOver);
        assert_eq!(space.draw_order(cell), vec![high, middle, low]);
        space.set_draw_mode(DrawMode::YUnder);
        assert_eq!(space.draw_order(cell), vec![low, middle, high]);
    }

    #[test]
    fn test_cells_in_view() {
        let mut space = Space::default();
        at(&mut space, 10, 10);
        at(&mut space, 200, 10);
        assert_eq!(space.cells_in_view(&span(0, 0, 100, 100)), vec![CellCoord::new(0, 0)]);
        assert_eq!(space.cells_in_view(&span(0, 0, 192, 0)), vec![CellCoord::new(0, 0), CellCoord::new(3, 0)]);
    }
}
