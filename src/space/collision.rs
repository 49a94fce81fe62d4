//! Contact Detection
//!
//! Finds the contacts a mobile object makes while travelling by a
//! displacement. Surface contact works on the bounding boxes of the
//! collision and solid hitboxes, one axis-aligned face at a time.
//!
//! ```text
//!        mover (collision box)         obstacle (solid box)
//!      +-------+ - - - - - - - -+     +---------+
//!      |       |   swept by d   | gap |  face   |
//!      +-------+ - - - - - - - -+     +---------+
//!              front                  ^ surface facing the mover
//!
//!   contact when 0 <= gap < |d_axis|, at progress gap / |d_axis|,
//!   if the boxes overlap strictly across the axis at that moment
//! ```
//!
//! Objects related to the mover through leader chains are never contacts.

use std::collections::BTreeSet;

use tracing::trace;

use crate::core::direction::Direction;
use crate::core::fixed::Fixed;
use crate::core::vec2::FixedVec2;
use crate::geom::BoundingBox;
use super::events::{ContactEvent, ContactKind, Progress};
use super::hitbox::Role;
use super::object::ObjectId;
use super::state::Space;

/// Edge of `b` on side `direction`.
fn edge(b: &BoundingBox, direction: Direction) -> Fixed {
    match direction {
        Direction::Left => b.left,
        Direction::Right => b.right,
        Direction::Up => b.top,
        Direction::Down => b.bottom,
    }
}

/// Extent of `b` across the axis of `direction`, as `(lo, hi)`.
fn across(b: &BoundingBox, direction: Direction) -> (i64, i64) {
    if direction.is_horizontal() {
        (b.top as i64, b.bottom as i64)
    } else {
        (b.left as i64, b.right as i64)
    }
}

/// Signed component of `v` across the axis of `direction`.
fn across_component(v: FixedVec2, direction: Direction) -> i64 {
    if direction.is_horizontal() { v.y as i64 } else { v.x as i64 }
}

/// Distance from `mover`'s front edge to `obstacle`'s facing edge along
/// `direction`. Negative if the face is behind the front.
pub(crate) fn gap(mover: &BoundingBox, obstacle: &BoundingBox, direction: Direction) -> i64 {
    let front = edge(mover, direction) as i64;
    let face = edge(obstacle, direction.opposite()) as i64;
    (face - front) * direction.sign() as i64
}

/// Where `mover`, travelling by `delta`, first touches the face of
/// `obstacle` that looks back along `direction`.
///
/// The flag is set when the boxes meet exactly at a corner: edge to edge
/// across the axis, with the diagonal travel carrying the mover into the
/// obstacle.
pub(crate) fn approach(
    mover: &BoundingBox,
    obstacle: &BoundingBox,
    delta: FixedVec2,
    direction: Direction,
) -> Option<(Progress, bool)> {
    let along = direction.component_of(delta);
    if along <= 0 {
        return None;
    }
    let gap = gap(mover, obstacle, direction);
    if gap < 0 || gap >= along {
        return None;
    }

    // Across-axis overlap at t = gap / along, scaled by along.
    let (m_lo, m_hi) = across(mover, direction);
    let (o_lo, o_hi) = across(obstacle, direction);
    let drift_rate = across_component(delta, direction);
    let drift = drift_rate as i128 * gap as i128;
    let progress = Progress::new(gap, along);
    let along = along as i128;
    let far = (m_lo - o_hi) as i128 * along + drift;
    let near = (m_hi - o_lo) as i128 * along + drift;
    if far < 0 && near > 0 {
        return Some((progress, false));
    }
    let corner = (near == 0 && far < 0 && drift_rate > 0) || (far == 0 && near > 0 && drift_rate < 0);
    corner.then_some((progress, true))
}

/// First moment a mover flush against `obstacle` on side `pressing`
/// overlaps it across that axis while travelling by `delta`, which must
/// have no component along `pressing`'s axis.
pub(crate) fn press(
    mover: &BoundingBox,
    obstacle: &BoundingBox,
    delta: FixedVec2,
    pressing: Direction,
) -> Option<Progress> {
    if gap(mover, obstacle, pressing) != 0 {
        return None;
    }
    let (m_lo, m_hi) = across(mover, pressing);
    let (o_lo, o_hi) = across(obstacle, pressing);
    let d = across_component(delta, pressing);
    let (start, end) = match d {
        0 => return (m_lo < o_hi && m_hi > o_lo).then_some(Progress::START),
        d if d > 0 => (o_lo - m_hi, o_hi - m_lo),
        _ => (m_lo - o_hi, m_hi - o_lo),
    };
    let travel = d.abs();
    let start = start.max(0);
    (start < travel && start < end).then(|| Progress::new(start, travel))
}

/// Directions in which `delta` has a positive component.
fn travel_directions(delta: FixedVec2) -> impl Iterator<Item = Direction> {
    Direction::ALL.into_iter().filter(move |d| d.component_of(delta) > 0)
}

/// What the resolver needs to know about the object being moved.
#[derive(Clone, Copy, Debug)]
struct Mover {
    priority: i32,
    pressing: Option<Direction>,
    body: Option<BoundingBox>,
    solid: Option<(BoundingBox, [bool; 4])>,
}

impl Space {
    fn mover(&self, id: ObjectId) -> Option<Mover> {
        let object = self.objects.get(id)?;
        let mobile = object.mobile.as_ref()?;
        let body = mobile.collision.and_then(|h| self.hitboxes.get(h)).map(|h| h.bounds);
        let solid = object
            .solid
            .and_then(|h| self.hitboxes.get(h))
            .filter(|h| h.has_surfaces())
            .map(|h| (h.bounds, h.surfaces));
        Some(Mover { priority: mobile.priority, pressing: mobile.pressing, body, solid })
    }

    /// True if the object takes part in surface contact when it moves.
    pub(crate) fn is_resolvable(&self, id: ObjectId) -> bool {
        self.mover(id).map_or(false, |m| m.body.is_some() || m.solid.is_some())
    }

    /// Every contact `id` makes while travelling by `delta`, in resolution
    /// order.
    pub(crate) fn gather_contacts(&mut self, id: ObjectId, delta: FixedVec2) -> Vec<ContactEvent> {
        let Some(mover) = self.mover(id) else {
            return Vec::new();
        };
        let mut events = Vec::new();
        let mut pushed: BTreeSet<(ObjectId, Direction)> = BTreeSet::new();

        if let Some((solid, surfaces)) = mover.solid {
            for h in self.scan(&solid.swept(delta), Role::Collision) {
                let hitbox = &self.hitboxes[h];
                let Some(other) = hitbox.object else {
                    continue;
                };
                let lower = self.movement_priority(other).map_or(false, |p| p < mover.priority);
                if !lower || self.are_related(id, other) {
                    continue;
                }
                for direction in travel_directions(delta) {
                    if !surfaces[direction.index()] {
                        continue;
                    }
                    // Corners do not push.
                    if let Some((progress, false)) = approach(&solid, &hitbox.bounds, delta, direction) {
                        pushed.insert((other, direction));
                        events.push(ContactEvent {
                            progress,
                            kind: ContactKind::Push,
                            other,
                            other_serial: self.objects[other].serial,
                            direction,
                            corner: false,
                        });
                    }
                }
            }
        }

        if let Some(body) = mover.body {
            for h in self.scan(&body.swept(delta), Role::Solid) {
                let hitbox = &self.hitboxes[h];
                let Some(other) = hitbox.object else {
                    continue;
                };
                if self.are_related(id, other) {
                    continue;
                }
                let other_serial = self.objects[other].serial;
                for direction in travel_directions(delta) {
                    // Something being pushed this way does not also block.
                    if !hitbox.surface(direction.opposite()) || pushed.contains(&(other, direction)) {
                        continue;
                    }
                    if let Some((progress, corner)) = approach(&body, &hitbox.bounds, delta, direction) {
                        events.push(ContactEvent {
                            progress,
                            kind: ContactKind::SolidHit,
                            other,
                            other_serial,
                            direction,
                            corner,
                        });
                    }
                }
                let Some(p) = mover.pressing else {
                    continue;
                };
                if p.component_of(delta) != 0 || !hitbox.surface(p.opposite()) {
                    continue;
                }
                if let Some(progress) = press(&body, &hitbox.bounds, delta, p) {
                    events.push(ContactEvent {
                        progress,
                        kind: ContactKind::Press,
                        other,
                        other_serial,
                        direction: p,
                        corner: false,
                    });
                }
            }
        }

        events.sort();
        trace!(?id, count = events.len(), "contacts gathered");
        events
    }

    /// Unrelated objects whose solid face is flush against the mover's
    /// collision box on side `pressing`, in serial order.
    pub(crate) fn flush_contacts(&mut self, id: ObjectId, pressing: Direction) -> Vec<ObjectId> {
        let Some(body) = self.mover(id).and_then(|m| m.body) else {
            return Vec::new();
        };
        let mut found: Vec<(u64, ObjectId)> = Vec::new();
        for h in self.scan(&body, Role::Solid) {
            let hitbox = &self.hitboxes[h];
            let Some(other) = hitbox.object else {
                continue;
            };
            if !hitbox.surface(pressing.opposite()) || self.are_related(id, other) {
                continue;
            }
            if press(&body, &hitbox.bounds, FixedVec2::ZERO, pressing).is_some() {
                found.push((self.objects[other].serial, other));
            }
        }
        found.sort();
        found.dedup();
        found.into_iter().map(|(_, other)| other).collect()
    }
}
