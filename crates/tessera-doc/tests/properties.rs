//! Property-based tests for the document store
//!
//! These tests verify the properties every replica relies on:
//!  - Betweenness: a generated path sorts strictly between its bounds
//!  - Local edits keep the line array well formed (no phantom lines,
//!    one trailing newline per line, chars in total order)
//!  - The flattened text always matches a plain string model

use proptest::prelude::*;
use tessera_doc::{Allocator, Crdt, CrdtConfig, Identifier, Position};

// ============================================================================
// Strategies and helpers
// ============================================================================

/// Paths shaped like allocator output: the last level never holds value 0.
fn path_strategy() -> impl Strategy<Value = Vec<Identifier>> {
    prop::collection::vec((0u64..40, 1u64..4), 1..5).prop_map(|levels| {
        let last = levels.len() - 1;
        levels
            .into_iter()
            .enumerate()
            .map(|(i, (value, site))| {
                let value = if i == last { value.max(1) } else { value };
                Identifier::new(value, site)
            })
            .collect()
    })
}

#[derive(Clone, Debug)]
enum Edit {
    Insert { at: f64, value: char },
    Delete { at: f64, len: f64 },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0.0..=1.0f64, prop::sample::select(vec!['a', 'b', 'c', '\n']))
            .prop_map(|(at, value)| Edit::Insert { at, value }),
        (0.0..=1.0f64, 0.0..=0.5f64).prop_map(|(at, len)| Edit::Delete { at, len }),
    ]
}

/// Canonical position of a flat character offset.
fn position_of_offset(doc: &Crdt, mut offset: usize) -> Position {
    for (line_index, line) in doc.lines().iter().enumerate() {
        if offset < line.len() {
            return Position::new(line_index, offset);
        }
        offset -= line.len();
    }
    Position::line_start(doc.line_count())
}

fn apply(doc: &mut Crdt, model: &mut Vec<char>, edit: &Edit) {
    let len = model.len();
    match *edit {
        Edit::Insert { at, value } => {
            let offset = ((at * len as f64) as usize).min(len);
            let position = position_of_offset(doc, offset);
            doc.handle_local_insert(value, position).unwrap();
            model.insert(offset, value);
        }
        Edit::Delete { at, len: fraction } => {
            if len == 0 {
                return;
            }
            let start = ((at * len as f64) as usize).min(len - 1);
            let count = ((fraction * (len - start) as f64) as usize).clamp(1, len - start);
            let from = position_of_offset(doc, start);
            let to = position_of_offset(doc, start + count);
            let removed = doc.handle_local_delete(from, to).unwrap();
            let expected: Vec<char> = model.drain(start..start + count).collect();
            let removed: Vec<char> = removed.iter().map(|ch| ch.value()).collect();
            assert_eq!(removed, expected);
        }
    }
}

// ============================================================================
// Allocation
// ============================================================================

proptest! {
    #[test]
    fn generated_path_is_between_bounds(
        a in path_strategy(),
        b in path_strategy(),
        site in 1u64..5,
        seed in any::<u64>()
    ) {
        prop_assume!(a != b);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };

        let mut alloc = Allocator::new(&CrdtConfig::builder(site).seed(seed).build());
        let path = alloc.generate_between(&lo, &hi).unwrap();

        prop_assert!(lo < path, "{:?} !< {:?}", lo, path);
        prop_assert!(path < hi, "{:?} !< {:?}", path, hi);
    }

    #[test]
    fn open_bounds_accept_any_path(
        bound in path_strategy(),
        seed in any::<u64>()
    ) {
        let mut alloc = Allocator::new(&CrdtConfig::builder(2).seed(seed).build());

        let before = alloc.generate_between(&[], &bound).unwrap();
        prop_assert!(before < bound);

        let after = alloc.generate_between(&bound, &[]).unwrap();
        prop_assert!(after > bound);
    }
}

// ============================================================================
// Document invariants
// ============================================================================

proptest! {
    #[test]
    fn local_edits_match_string_model(
        edits in prop::collection::vec(edit_strategy(), 1..60),
        seed in any::<u64>()
    ) {
        let mut doc = Crdt::with_config(CrdtConfig::builder(1).seed(seed).build());
        let mut model = Vec::new();

        for edit in &edits {
            apply(&mut doc, &mut model, edit);

            prop_assert!(doc.is_well_formed());
            prop_assert!(doc.lines().iter().all(|line| !line.is_empty()));
            prop_assert_eq!(doc.text(), model.iter().collect::<String>());
        }
    }

    #[test]
    fn remote_replay_rebuilds_same_lines(
        edits in prop::collection::vec(edit_strategy(), 1..40),
        seed in any::<u64>()
    ) {
        let mut doc = Crdt::with_config(CrdtConfig::builder(1).seed(seed).build());
        let mut model = Vec::new();
        for edit in &edits {
            apply(&mut doc, &mut model, edit);
        }

        // Feed the surviving characters to a fresh replica in reverse order.
        let mut replica = Crdt::new(2);
        let chars: Vec<_> = doc.chars().cloned().collect();
        for ch in chars.into_iter().rev() {
            replica.handle_remote_insert(ch).unwrap();
        }

        prop_assert!(replica.is_well_formed());
        prop_assert_eq!(replica.lines(), doc.lines());
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_append_line() {
    let mut doc = Crdt::new(1);
    let a = doc.handle_local_insert('a', Position::new(0, 0)).unwrap();
    let b = doc.handle_local_insert('b', Position::new(0, 1)).unwrap();
    doc.handle_local_insert('\n', Position::new(0, 2)).unwrap();

    assert_eq!(doc.text(), "ab\n");
    assert_eq!(doc.line_count(), 1);
    assert_eq!(a.compare_to(&b), std::cmp::Ordering::Less);
}

#[test]
fn scenario_blank_line_then_char() {
    let mut doc = Crdt::new(1);
    doc.handle_local_insert('\n', Position::new(0, 0)).unwrap();
    doc.handle_local_insert('x', Position::new(1, 0)).unwrap();

    let lines: Vec<String> = doc
        .lines()
        .iter()
        .map(|line| line.iter().map(|ch| ch.value()).collect())
        .collect();
    assert_eq!(lines, vec!["\n".to_string(), "x".to_string()]);
}

#[test]
fn scenario_delete_only_line() {
    let mut doc = Crdt::new(1);
    doc.handle_local_insert('\n', Position::new(0, 0)).unwrap();
    doc.handle_local_delete(Position::new(0, 0), Position::new(1, 0))
        .unwrap();
    assert_eq!(doc.line_count(), 0);
}
