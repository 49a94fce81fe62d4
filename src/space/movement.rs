//! Movement Resolution
//!
//! Moves an object by a requested displacement, stopping, sliding or
//! pushing where its path meets other objects.
//!
//! ```text
//!   move_object(id, delta)
//!     pass 1..=MAX_PASSES
//!       gather contacts over the swept boxes (nearest first)
//!       walk them: ask collide(), zero velocity, find the cut-off
//!       place the mover at delta * cut
//!       push lower-priority objects out of the way
//!       Slide: retry the remainder with the blocked axis removed
//!     move every follower by the realized total
//! ```

use tracing::trace;

use crate::core::direction::Direction;
use crate::core::vec2::FixedVec2;
use super::error::SpaceError;
use super::events::{ContactEvent, ContactKind, Progress};
use super::object::{CollisionRecord, CollisionResponse, MobileState, ObjectId};
use super::state::Space;

/// Resolution passes per move. A pass ends at the first blocking contact;
/// later passes continue with the blocked axes removed.
pub const MAX_PASSES: usize = 3;

/// Zero the velocity component pointing in `direction`.
fn block_velocity(mobile: &mut MobileState, direction: Direction) {
    if direction.component_of(mobile.velocity) > 0 {
        if direction.is_horizontal() {
            mobile.velocity.x = 0;
        } else {
            mobile.velocity.y = 0;
        }
    }
}

/// Apply a collision response to a mobile's velocity and record it.
/// Returns the response for the caller to act on.
fn apply_response(
    mobile: &mut MobileState,
    response: CollisionResponse,
    other: ObjectId,
    direction: Direction,
) -> CollisionResponse {
    match response {
        CollisionResponse::None => return response,
        CollisionResponse::Slide => block_velocity(mobile, direction),
        CollisionResponse::Stop => mobile.velocity = FixedVec2::ZERO,
    }
    mobile.collisions.push(CollisionRecord { other, direction });
    response
}

impl Space {
    /// Move an object by `delta`, resolving contacts along the way.
    ///
    /// Objects that cannot collide (immobile, detached, or without a
    /// collision box and solid surfaces) are moved straight through.
    /// Followers move by whatever the object actually travelled.
    /// Returns the realized displacement.
    pub fn move_object(&mut self, id: ObjectId, delta: FixedVec2) -> Result<FixedVec2, SpaceError> {
        let object = self.object_ref(id)?;
        let attached = object.attached;
        let pressing = object.mobile.as_ref().and_then(|m| m.pressing);

        if delta.is_zero() {
            if let (true, Some(direction)) = (attached, pressing) {
                self.press_in_place(id, direction);
            }
            return Ok(FixedVec2::ZERO);
        }

        let moved = if attached && self.is_resolvable(id) {
            self.resolve(id, delta)?
        } else {
            self.shift(id, delta);
            delta
        };
        self.drag_followers(id, moved)?;
        Ok(moved)
    }

    /// Lean against flush surfaces without moving.
    fn press_in_place(&mut self, id: ObjectId, direction: Direction) {
        for other in self.flush_contacts(id, direction) {
            let object = &mut self.objects[id];
            let response = object.respond(other, direction);
            if let Some(mobile) = object.mobile.as_mut() {
                apply_response(mobile, response, other, direction);
            }
            trace!(?id, ?other, ?direction, ?response, "pressing");
        }
    }

    fn resolve(&mut self, id: ObjectId, delta: FixedVec2) -> Result<FixedVec2, SpaceError> {
        let mut remaining = delta;
        let mut total = FixedVec2::ZERO;
        let (mut blocked_x, mut blocked_y) = (false, false);

        for _ in 0..MAX_PASSES {
            if blocked_x {
                remaining.x = 0;
            }
            if blocked_y {
                remaining.y = 0;
            }
            if remaining.is_zero() {
                break;
            }

            let mut cut: Option<Progress> = None;
            let mut stopped = false;
            let mut pushes: Vec<ContactEvent> = Vec::new();
            for event in self.gather_contacts(id, remaining) {
                if cut.map_or(false, |c| event.progress > c) {
                    break;
                }
                if event.kind == ContactKind::Push {
                    pushes.push(event);
                    continue;
                }
                // A corner only matters while both axes are still free.
                if event.corner && (stopped || blocked_x || blocked_y) {
                    continue;
                }
                let object = &mut self.objects[id];
                let response = object.respond(event.other, event.direction);
                let Some(mobile) = object.mobile.as_mut() else {
                    continue;
                };
                trace!(?id, other = ?event.other, kind = ?event.kind, ?response, "contact");
                match apply_response(mobile, response, event.other, event.direction) {
                    CollisionResponse::None => {}
                    CollisionResponse::Slide if event.kind == ContactKind::SolidHit => {
                        cut.get_or_insert(event.progress);
                        if event.direction.is_horizontal() {
                            blocked_x = true;
                        } else {
                            blocked_y = true;
                        }
                    }
                    CollisionResponse::Slide => {}
                    CollisionResponse::Stop => {
                        stopped = true;
                        cut.get_or_insert(event.progress);
                    }
                }
            }

            let step = cut.map_or(remaining, |c| c.of(remaining));
            let origins: Vec<FixedVec2> = pushes
                .iter()
                .map(|p| self.position(p.other).unwrap_or_default())
                .collect();
            self.shift(id, step);
            total += step;
            for (push, origin) in pushes.iter().zip(origins) {
                let travel = step - push.progress.of(remaining);
                self.push(id, push, travel, origin)?;
            }

            if cut.is_none() || stopped {
                break;
            }
            remaining -= step;
        }
        Ok(total)
    }

    /// Carry a pushed object by the pusher's travel since contact. Whatever
    /// an earlier push this pass already carried it (from `origin`) counts
    /// toward that travel.
    fn push(
        &mut self,
        pusher: ObjectId,
        event: &ContactEvent,
        travel: FixedVec2,
        origin: FixedVec2,
    ) -> Result<(), SpaceError> {
        let other = event.other;
        let carried = self.position(other).map_or(FixedVec2::ZERO, |p| p - origin);
        let shove = travel - carried;
        if event.direction.component_of(shove) <= 0 {
            return Ok(());
        }
        let from = event.direction.opposite();
        let object = self.object_mut(other)?;
        let response = object.respond(pusher, from);
        let Some(mobile) = object.mobile.as_mut() else {
            return Ok(());
        };
        if apply_response(mobile, response, pusher, from) == CollisionResponse::None {
            return Ok(());
        }
        trace!(?pusher, ?other, ?shove, "push");

        let saved = mobile.leader.replace(pusher);
        let result = self.move_object(other, shove);
        if let Some(mobile) = self.objects.get_mut(other).and_then(|o| o.mobile.as_mut()) {
            mobile.leader = saved;
        }
        result.map(|_| ())
    }

    /// Move every direct follower by `moved`, in serial order.
    fn drag_followers(&mut self, id: ObjectId, moved: FixedVec2) -> Result<(), SpaceError> {
        if moved.is_zero() {
            return Ok(());
        }
        let mut followers: Vec<(u64, ObjectId)> = match self.objects[id].mobile.as_ref() {
            Some(mobile) => mobile
                .followers
                .iter()
                .filter_map(|f| self.objects.get(*f).map(|o| (o.serial, *f)))
                .collect(),
            None => return Ok(()),
        };
        followers.sort();
        for (_, follower) in followers {
            self.move_object(follower, moved)?;
        }
        Ok(())
    }
}
