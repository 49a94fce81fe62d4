//! Deferred Membership Queue
//!
//! Requests that would change the object or mobile sets while an iteration
//! over them is open are parked here and replayed, first in first out, when
//! the last iteration closes.
//!
//! A newer request about the same object supersedes the older one: the old
//! ticket is marked consumed and skipped at flush. Membership (add/remove)
//! and movement priority are tracked separately, so a queued priority
//! change survives a later add.

use std::collections::BTreeMap;

use super::object::ObjectId;

/// A structural change to apply once iteration ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Enter the space
    Add(ObjectId),
    /// Leave the space
    Remove(ObjectId),
    /// New movement priority
    Priority(ObjectId, i32),
}

impl Change {
    fn object(&self) -> ObjectId {
        match *self {
            Change::Add(id) | Change::Remove(id) | Change::Priority(id, _) => id,
        }
    }
}

#[derive(Clone, Debug)]
struct Ticket {
    change: Change,
    consumed: bool,
}

/// FIFO of pending changes with per-object supersession.
#[derive(Clone, Debug, Default)]
pub struct ChangeQueue {
    tickets: Vec<Ticket>,
    /// Latest membership ticket per object
    membership: BTreeMap<ObjectId, usize>,
    /// Latest priority ticket per object
    priority: BTreeMap<ObjectId, usize>,
}

impl ChangeQueue {
    /// Empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a change, consuming any older ticket it supersedes.
    pub fn push(&mut self, change: Change) {
        let index = self.tickets.len();
        let latest = match change {
            Change::Add(_) | Change::Remove(_) => &mut self.membership,
            Change::Priority(..) => &mut self.priority,
        };
        if let Some(old) = latest.insert(change.object(), index) {
            self.tickets[old].consumed = true;
        }
        self.tickets.push(Ticket { change, consumed: false });
    }

    /// Pending membership request for an object, if any.
    pub fn pending_membership(&self, id: ObjectId) -> Option<Change> {
        self.membership.get(&id).map(|&i| self.tickets[i].change)
    }

    /// Number of live (unconsumed) tickets.
    pub fn len(&self) -> usize {
        self.tickets.iter().filter(|t| !t.consumed).count()
    }

    /// True if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every live change in FIFO order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Change> {
        self.membership.clear();
        self.priority.clear();
        self.tickets
            .drain(..)
            .filter(|t| !t.consumed)
            .map(|t| t.change)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<ObjectId> {
        let mut arena: SlotMap<ObjectId, ()> = SlotMap::with_key();
        (0..n).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_fifo_order() {
        let ids = ids(3);
        let mut queue = ChangeQueue::new();
        queue.push(Change::Add(ids[0]));
        queue.push(Change::Remove(ids[1]));
        queue.push(Change::Add(ids[2]));
        assert_eq!(queue.drain(), vec![Change::Add(ids[0]), Change::Remove(ids[1]), Change::Add(ids[2])]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_newer_request_consumes_older() {
        let ids = ids(2);
        let mut queue = ChangeQueue::new();
        queue.push(Change::Add(ids[0]));
        queue.push(Change::Add(ids[1]));
        queue.push(Change::Remove(ids[0]));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pending_membership(ids[0]), Some(Change::Remove(ids[0])));
        assert_eq!(queue.drain(), vec![Change::Add(ids[1]), Change::Remove(ids[0])]);
    }

    #[test]
    fn test_priority_tracked_separately() {
        let ids = ids(1);
        let mut queue = ChangeQueue::new();
        queue.push(Change::Priority(ids[0], 3));
        queue.push(Change::Add(ids[0]));
        queue.push(Change::Priority(ids[0], 7));
        assert_eq!(queue.drain(), vec![Change::Add(ids[0]), Change::Priority(ids[0], 7)]);
    }
}
