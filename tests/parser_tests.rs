//! Integration coverage for the parser round-trip property (spec.md §8
//! item 3), driven through the crate's public API rather than `parser`'s
//! internal unit tests.

mod common;

use common::TableReader;
use vqueue::atom::Atom;
use vqueue::parser::{parse, ParseError};

#[test]
fn describe_then_parse_round_trips_priority_and_mode() {
    let reader = TableReader::new(vec![("a.wav", 1000), ("b.wav", 2000)]);
    let original = parse("3 mute loop p a.wav 250 p b.wav d 9", &reader).unwrap();
    let text = original.describe();
    let reparsed = parse(&text, &reader).unwrap();

    assert_eq!(reparsed.priority, original.priority);
    assert_eq!(reparsed.mode, original.mode);
    assert_eq!(reparsed.atoms, original.atoms);
}

#[test]
fn rejects_a_priority_outside_the_lane_range() {
    let reader = TableReader::new(vec![]);
    let err = parse("5 discard p a.wav", &reader).unwrap_err();
    assert!(matches!(err, ParseError::InvalidPriority(_)));
}

#[test]
fn conflicting_interrupt_policies_are_rejected_in_either_order() {
    let reader = TableReader::new(vec![("a.wav", 1000)]);
    assert!(matches!(
        parse("0 discard mute p a.wav", &reader),
        Err(ParseError::ConflictingModes { .. })
    ));
    assert!(matches!(
        parse("0 pause restart p a.wav", &reader),
        Err(ParseError::ConflictingModes { .. })
    ));
}

#[test]
fn a_play_atom_followed_by_a_nonnumeric_token_does_not_consume_it_as_an_offset() {
    let reader = TableReader::new(vec![("a.wav", 1000), ("b.wav", 2000)]);
    let m = parse("0 discard p a.wav p b.wav", &reader).unwrap();
    assert_eq!(m.atoms.len(), 2);
    match (&m.atoms[0], &m.atoms[1]) {
        (Atom::Play(a), Atom::Play(b)) => {
            assert_eq!(a.offset_ms, 0);
            assert_eq!(b.offset_ms, 0);
        }
        _ => unreachable!(),
    }
}
