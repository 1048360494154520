//! The priority queue (component D, spec.md §4.D): a fixed array of FIFO
//! lanes, one per priority level, with a `next()` selector that is the sole
//! place the Scheduler picks a molecule.

use std::collections::VecDeque;

use crate::molecule::Molecule;
use crate::parser::NUM_PRIORITIES;

/// Fixed-lane priority queue of [`Molecule`]s. Lane `p` holds molecules
/// enqueued at priority `p`; `next()` scans from `NUM_PRIORITIES - 1` down
/// to `0` and returns the head of the first non-empty lane (spec.md §4.D).
#[derive(Debug, Default)]
pub struct VQueue {
    lanes: [VecDeque<Molecule>; NUM_PRIORITIES],
    next_id: u64,
}

impl VQueue {
    pub fn new() -> Self {
        Self {
            lanes: Default::default(),
            next_id: 1,
        }
    }

    /// Appends `molecule` to its priority lane, assigning it a fresh stable
    /// id used for all later lookup/cancel (spec.md §9: avoid raw interior
    /// references that invalidate on lane mutation).
    pub fn enqueue(&mut self, mut molecule: Molecule) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        molecule.id = id;
        self.lanes[molecule.priority].push_back(molecule);
        id
    }

    /// The highest-priority non-empty lane's head, or `None` if the queue
    /// is empty.
    pub fn next(&self) -> Option<&Molecule> {
        self.lanes.iter().rev().find_map(|lane| lane.front())
    }

    pub fn next_mut(&mut self) -> Option<&mut Molecule> {
        self.lanes
            .iter_mut()
            .rev()
            .find_map(|lane| lane.front_mut())
    }

    /// Looks up a molecule anywhere in the queue by id, regardless of
    /// whether it is currently the selected head.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Molecule> {
        self.lanes
            .iter_mut()
            .flat_map(|lane| lane.iter_mut())
            .find(|m| m.id == id)
    }

    /// Removes the molecule with the given id from its lane, wherever it
    /// sits. Returns it if found.
    pub fn cancel(&mut self, id: u64) -> Option<Molecule> {
        for lane in &mut self.lanes {
            if let Some(pos) = lane.iter().position(|m| m.id == id) {
                return lane.remove(pos);
            }
        }
        None
    }

    /// Discards every molecule in `priority`'s lane; returns how many were
    /// removed.
    pub fn cancel_priority(&mut self, priority: usize) -> usize {
        let lane = &mut self.lanes[priority];
        let removed = lane.len();
        lane.clear();
        removed
    }

    /// Removes the currently-selected head molecule (the one `next()` would
    /// return), if any.
    pub fn discard_current(&mut self) -> Option<Molecule> {
        self.lanes
            .iter_mut()
            .rev()
            .find(|lane| !lane.is_empty())
            .and_then(|lane| lane.pop_front())
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(|lane| lane.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::molecule::Mode;

    fn molecule(priority: usize) -> Molecule {
        Molecule::new(
            vec![Atom::play("a.wav", 0, 1000)],
            priority,
            Mode::default(),
        )
    }

    #[test]
    fn next_selects_the_highest_priority_nonempty_lane() {
        let mut q = VQueue::new();
        q.enqueue(molecule(0));
        q.enqueue(molecule(2));
        q.enqueue(molecule(1));
        assert_eq!(q.next().unwrap().priority, 2);
    }

    #[test]
    fn lanes_are_fifo_within_a_priority() {
        let mut q = VQueue::new();
        let first = q.enqueue(molecule(1));
        let second = q.enqueue(molecule(1));
        assert_eq!(q.next().unwrap().id, first);
        q.discard_current();
        assert_eq!(q.next().unwrap().id, second);
    }

    #[test]
    fn cancel_removes_by_id_from_any_lane() {
        let mut q = VQueue::new();
        let id = q.enqueue(molecule(0));
        q.enqueue(molecule(3));
        assert!(q.cancel(id).is_some());
        assert!(q.get_mut(id).is_none());
        assert_eq!(q.next().unwrap().priority, 3);
    }

    #[test]
    fn cancel_priority_clears_only_that_lane() {
        let mut q = VQueue::new();
        q.enqueue(molecule(2));
        q.enqueue(molecule(2));
        q.enqueue(molecule(1));
        assert_eq!(q.cancel_priority(2), 2);
        assert_eq!(q.next().unwrap().priority, 1);
    }

    #[test]
    fn enqueue_assigns_increasing_ids() {
        let mut q = VQueue::new();
        let a = q.enqueue(molecule(0));
        let b = q.enqueue(molecule(0));
        assert!(b > a);
    }
}
