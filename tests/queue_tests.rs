//! Integration coverage for `VQueue`'s priority/FIFO selection contract
//! (spec.md §8 item 4), using the crate's public API directly.

use vqueue::atom::Atom;
use vqueue::molecule::Mode;
use vqueue::{Molecule, VQueue};

fn molecule(priority: usize) -> Molecule {
    Molecule::new(
        vec![Atom::play("a.wav", 0, 1000)],
        priority,
        Mode::default(),
    )
}

#[test]
fn next_always_prefers_the_highest_nonempty_lane() {
    let mut q = VQueue::new();
    q.enqueue(molecule(1));
    let high = q.enqueue(molecule(4));
    q.enqueue(molecule(2));
    assert_eq!(q.next().unwrap().id, high);
}

#[test]
fn equal_priority_molecules_preserve_enqueue_order() {
    let mut q = VQueue::new();
    let first = q.enqueue(molecule(2));
    let second = q.enqueue(molecule(2));
    let third = q.enqueue(molecule(2));

    assert_eq!(q.next().unwrap().id, first);
    q.cancel(first);
    assert_eq!(q.next().unwrap().id, second);
    q.cancel(second);
    assert_eq!(q.next().unwrap().id, third);
}

#[test]
fn cancel_priority_only_touches_its_own_lane() {
    let mut q = VQueue::new();
    q.enqueue(molecule(0));
    q.enqueue(molecule(3));
    q.enqueue(molecule(3));

    assert_eq!(q.cancel_priority(3), 2);
    assert_eq!(q.next().unwrap().priority, 0);
    assert!(!q.is_empty());
}
