//! Frame Driver
//!
//! Advances every mobile object by one frame of velocity plus any queued
//! step. Mobiles move in movement order (highest priority first), so a
//! pusher always resolves before the objects it may shove.

use tracing::{debug, warn};

use crate::core::vec2::FixedVec2;
use super::error::SpaceError;
use super::object::ObjectId;
use super::state::Space;

/// Summary of one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame number just completed
    pub frame: u64,
    /// Mobiles that ended the frame somewhere else
    pub moved: usize,
    /// Collision records across all mobiles
    pub collisions: usize,
}

impl Space {
    /// Run one frame.
    pub fn advance_frame(&mut self) -> FrameReport {
        self.frame += 1;
        for id in self.mobile_objects() {
            if let Some(mobile) = self.objects[id].mobile_mut() {
                mobile.collisions.clear();
            }
        }

        let mut moved = 0;
        self.visit_mobile_objects(|space, id| match space.step_mobile(id) {
            Ok(true) => moved += 1,
            Ok(false) => {}
            Err(err) => warn!(?id, %err, "frame step failed"),
        });

        let collisions = self
            .mobile_objects()
            .into_iter()
            .map(|id| self.collisions(id).len())
            .sum();
        let report = FrameReport { frame: self.frame, moved, collisions };
        debug!(frame = report.frame, moved, collisions, "frame complete");
        report
    }

    /// Move one mobile by its frame displacement. Returns whether it moved.
    fn step_mobile(&mut self, id: ObjectId) -> Result<bool, SpaceError> {
        let space_factor = self.time_factor;
        let object = self.object_mut(id)?;
        let object_factor = object.time_factor;
        let Some(mobile) = object.mobile_mut() else {
            return Ok(false);
        };
        let delta = (mobile.velocity + mobile.step).scale(space_factor).scale(object_factor);
        mobile.step = FixedVec2::ZERO;

        let realized = self.move_object(id, delta)?;
        if let Some(mobile) = self.objects[id].mobile_mut() {
            mobile.last_displacement = realized;
        }
        Ok(!realized.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::direction::Direction;
    use crate::core::fixed::{FIXED_HALF, FIXED_ONE};
    use crate::geom::{Shape, Transform};
    use crate::space::object::CollisionResponse;

    fn unit() -> Shape {
        Shape::centered_box(FIXED_ONE, FIXED_ONE)
    }

    fn mobile_at(space: &mut Space, x: i32, y: i32) -> ObjectId {
        let locator = space.create_hitbox(unit(), Transform::at(FixedVec2::from_ints(x, y)));
        let collision = space.create_hitbox(unit(), Transform::default());
        let id = space.create_mobile_object(locator, collision).unwrap();
        space.add_object(id).unwrap();
        id
    }

    fn wall_at(space: &mut Space, x: i32) -> ObjectId {
        let locator = space.create_hitbox(
            Shape::centered_box(2 * FIXED_ONE, 100 * FIXED_ONE),
            Transform::at(FixedVec2::from_ints(x, 0)),
        );
        let id = space.create_object(locator).unwrap();
        let solid = space.create_hitbox(Shape::centered_box(2 * FIXED_ONE, 100 * FIXED_ONE), Transform::default());
        space.set_solid_hitbox(id, Some(solid)).unwrap();
        space.set_surfaces(id, [true; 4]).unwrap();
        space.add_object(id).unwrap();
        id
    }

    fn build_scene() -> (Space, Vec<ObjectId>) {
        let mut space = Space::default();
        let mut movers = Vec::new();
        wall_at(&mut space, 40);
        for i in 0..4 {
            let id = mobile_at(&mut space, 0, i * 3);
            space.set_velocity(id, FixedVec2::from_ints(1 + i, 0)).unwrap();
            space.set_behavior(id, Some(Box::new(CollisionResponse::Stop))).unwrap();
            movers.push(id);
        }
        (space, movers)
    }

    #[test]
    fn test_tick_determinism() {
        let (mut space1, _) = build_scene();
        let (mut space2, _) = build_scene();

        for _ in 0..60 {
            let report1 = space1.advance_frame();
            let report2 = space2.advance_frame();
            assert_eq!(report1, report2);
        }

        assert_eq!(space1.frame(), 60);
        assert_eq!(space1.compute_hash(), space2.compute_hash());
    }

    #[test]
    fn test_frame_report_counts() {
        let (mut space, movers) = build_scene();
        let first = space.advance_frame();
        assert_eq!(first, FrameReport { frame: 1, moved: 4, collisions: 0 });

        for _ in 0..60 {
            space.advance_frame();
        }
        // Every mover has stopped against the wall's left face at x = 39.
        for &id in &movers {
            assert_eq!(space.position(id).map(|p| p.x), Some(38 * FIXED_ONE + FIXED_HALF));
            assert_eq!(space.velocity(id).map(|v| v.x), Some(0));
        }
        assert_eq!(space.advance_frame().moved, 0);
    }

    #[test]
    fn test_step_applies_once() {
        let mut space = Space::default();
        let id = mobile_at(&mut space, 0, 0);
        space.add_step(id, FixedVec2::from_ints(0, 3)).unwrap();

        space.advance_frame();
        assert_eq!(space.position(id), Some(FixedVec2::from_ints(0, 3)));
        assert_eq!(space.object(id).and_then(|o| o.mobile()).map(|m| m.last_displacement()), Some(FixedVec2::from_ints(0, 3)));

        space.advance_frame();
        assert_eq!(space.position(id), Some(FixedVec2::from_ints(0, 3)));
        assert_eq!(space.object(id).and_then(|o| o.mobile()).map(|m| m.last_displacement()), Some(FixedVec2::ZERO));
    }

    #[test]
    fn test_time_factors_multiply() {
        let mut space = Space::default();
        let id = mobile_at(&mut space, 0, 0);
        space.set_velocity(id, FixedVec2::from_ints(4, 0)).unwrap();
        space.set_time_factor(FIXED_HALF);

        space.advance_frame();
        assert_eq!(space.position(id), Some(FixedVec2::from_ints(2, 0)));

        space.set_object_time_factor(id, 2 * FIXED_ONE).unwrap();
        space.advance_frame();
        assert_eq!(space.position(id), Some(FixedVec2::from_ints(6, 0)));

        space.set_time_factor(0);
        assert_eq!(space.advance_frame().moved, 0);
    }

    #[test]
    fn test_step_of_destroyed_object_is_an_error() {
        let mut space = Space::default();
        let id = mobile_at(&mut space, 0, 0);
        space.set_velocity(id, FixedVec2::from_ints(1, 0)).unwrap();
        assert_eq!(space.step_mobile(id), Ok(true));

        space.remove_object(id).unwrap();
        space.destroy_object(id).unwrap();
        assert_eq!(space.step_mobile(id), Err(SpaceError::UnknownObject(id)));
    }

    #[test]
    fn test_collisions_cleared_each_frame() {
        let mut space = Space::default();
        let id = mobile_at(&mut space, 0, 0);
        wall_at(&mut space, 3);
        space.set_pressing(id, Some(Direction::Right)).unwrap();
        space.set_velocity(id, FixedVec2::from_ints(5, 0)).unwrap();

        let report = space.advance_frame();
        assert_eq!(report.collisions, 1);
        assert_eq!(space.position(id), Some(FixedVec2::new(FIXED_ONE + FIXED_HALF, 0)));

        // Still leaning on the wall: one fresh record, not two.
        let report = space.advance_frame();
        assert_eq!(report.collisions, 1);
        assert_eq!(space.collisions(id).len(), 1);
    }
}
