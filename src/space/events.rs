//! Contact Events
//!
//! Contacts found along a mover's path during one resolution pass, in the
//! order they are resolved.

use std::cmp::Ordering;

use crate::core::direction::Direction;
use crate::core::vec2::FixedVec2;
use super::object::ObjectId;

/// Kind of contact, in resolution order at equal progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ContactKind {
    /// Collision hitbox strikes a solid surface head-on
    SolidHit = 0,
    /// Collision hitbox slides along a surface it is pressing into
    Press = 1,
    /// The mover's own solid surface meets a lower-priority mobile
    Push = 2,
}

/// Exact fraction of the pass displacement travelled before contact.
///
/// `den` is always positive and `num < den`.
#[derive(Clone, Copy, Debug)]
pub struct Progress {
    /// Distance travelled before contact (raw units)
    pub num: i64,
    /// Displacement along the contact axis (raw units)
    pub den: i64,
}

impl Progress {
    /// Contact at the very start of the pass.
    pub const START: Progress = Progress { num: 0, den: 1 };

    /// Create a progress value.
    ///
    /// # Panics
    /// Panics if `den` is not positive.
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den > 0, "progress denominator must be positive");
        Self { num, den }
    }

    /// `v` scaled by this fraction, truncated toward zero.
    pub fn of(&self, v: FixedVec2) -> FixedVec2 {
        let part = |c: i32| (c as i128 * self.num as i128 / self.den as i128) as i32;
        FixedVec2::new(part(v.x), part(v.y))
    }
}

impl PartialEq for Progress {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Progress {}

impl PartialOrd for Progress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Progress {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as i128 * other.den as i128;
        let rhs = other.num as i128 * self.den as i128;
        lhs.cmp(&rhs)
    }
}

/// One contact found during a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactEvent {
    /// When along the pass the contact happens
    pub progress: Progress,
    /// What kind of contact
    pub kind: ContactKind,
    /// The object touched
    pub other: ObjectId,
    /// Its serial, for ordering
    pub other_serial: u64,
    /// Direction from the mover toward `other`
    pub direction: Direction,
    /// The boxes meet edge to edge at a corner rather than face to face
    pub corner: bool,
}

impl Ord for ContactEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.progress
            .cmp(&other.progress)
            .then(self.kind.cmp(&other.kind))
            .then(self.corner.cmp(&other.corner))
            .then(self.other_serial.cmp(&other.other_serial))
            .then(self.direction.cmp(&other.direction))
    }
}

impl PartialOrd for ContactEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
