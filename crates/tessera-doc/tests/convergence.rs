//! Convergence tests for the document store
//!
//! These tests verify that replicas converge to the same lines once they
//! have applied the same operations, whatever the (causally safe) delivery
//! order, and that duplicate deletes degrade to no-ops.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tessera_doc::{Char, Crdt, CrdtConfig, DocError, Identifier, Position};

#[derive(Clone, Debug)]
enum Op {
    Insert(Char),
    Delete(Char),
}

fn replica(site: u64) -> Crdt {
    Crdt::with_config(CrdtConfig::builder(site).seed(site * 31).build())
}

fn position_of_offset(doc: &Crdt, mut offset: usize) -> Position {
    for (line_index, line) in doc.lines().iter().enumerate() {
        if offset < line.len() {
            return Position::new(line_index, offset);
        }
        offset -= line.len();
    }
    Position::line_start(doc.line_count())
}

/// Run `count` random local edits and return the operations they produced.
fn random_edits(doc: &mut Crdt, rng: &mut StdRng, count: usize) -> Vec<Op> {
    let mut ops = Vec::new();
    for _ in 0..count {
        let len = doc.len();
        if len > 0 && rng.gen_bool(0.3) {
            let start = rng.gen_range(0..len);
            let end = rng.gen_range(start + 1..=len.min(start + 4));
            let from = position_of_offset(doc, start);
            let to = position_of_offset(doc, end);
            for ch in doc.handle_local_delete(from, to).unwrap() {
                ops.push(Op::Delete(ch));
            }
        } else {
            let value = *[b'x', b'y', b'z', b'\n'].choose(rng).unwrap() as char;
            let at = position_of_offset(doc, rng.gen_range(0..=len));
            ops.push(Op::Insert(doc.handle_local_insert(value, at).unwrap()));
        }
    }
    ops
}

/// Deliver all inserts before any delete, each group shuffled.
fn deliver(doc: &mut Crdt, ops: &[Op], rng: &mut StdRng) {
    let mut inserts: Vec<&Char> = Vec::new();
    let mut deletes: Vec<&Char> = Vec::new();
    for op in ops {
        match op {
            Op::Insert(ch) => inserts.push(ch),
            Op::Delete(ch) => deletes.push(ch),
        }
    }
    inserts.shuffle(rng);
    deletes.shuffle(rng);

    for ch in inserts {
        doc.handle_remote_insert(ch.clone()).unwrap();
    }
    for ch in deletes {
        match doc.handle_remote_delete(ch) {
            Ok(_) => {}
            Err(err) => assert!(err.is_benign(), "unexpected error: {err}"),
        }
    }
}

// ============================================================================
// Basic convergence
// ============================================================================

#[test]
fn test_remote_order_is_irrelevant() {
    let mut three = Crdt::new(10);
    let mut five = Crdt::new(11);
    let a = Char::new('a', vec![Identifier::new(3, 1)]).unwrap();
    let b = Char::new('b', vec![Identifier::new(5, 1)]).unwrap();

    three.handle_remote_insert(a.clone()).unwrap();
    three.handle_remote_insert(b.clone()).unwrap();
    five.handle_remote_insert(b).unwrap();
    five.handle_remote_insert(a).unwrap();

    assert_eq!(three.text(), "ab");
    assert_eq!(three.lines(), five.lines());
}

#[test]
fn test_concurrent_inserts_at_same_position() {
    let mut alice = replica(1);
    let mut bob = replica(2);

    let shared = alice
        .handle_local_insert_str("Hello\n", Position::new(0, 0))
        .unwrap();
    for ch in shared {
        bob.handle_remote_insert(ch).unwrap();
    }

    // Both type at the end of the first word.
    let from_alice = alice
        .handle_local_insert_str(" World", Position::new(0, 5))
        .unwrap();
    let from_bob = bob
        .handle_local_insert_str(" Rust", Position::new(0, 5))
        .unwrap();

    for ch in from_bob {
        alice.handle_remote_insert(ch).unwrap();
    }
    for ch in from_alice {
        bob.handle_remote_insert(ch).unwrap();
    }

    assert_eq!(alice.text(), bob.text());
    assert!(alice.text().starts_with("Hello"));
    assert!(alice.text().ends_with('\n'));
    assert!(alice.is_well_formed());
}

#[test]
fn test_concurrent_delete_of_same_char() {
    let mut alice = replica(1);
    let mut bob = replica(2);

    for ch in alice
        .handle_local_insert_str("ab\ncd", Position::new(0, 0))
        .unwrap()
    {
        bob.handle_remote_insert(ch).unwrap();
    }

    let by_alice = alice
        .handle_local_delete(Position::new(0, 1), Position::new(1, 1))
        .unwrap();
    let by_bob = bob
        .handle_local_delete(Position::new(0, 2), Position::new(1, 0))
        .unwrap();

    for ch in &by_bob {
        match alice.handle_remote_delete(ch) {
            Ok(_) | Err(DocError::CharacterNotFound(_)) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }
    for ch in &by_alice {
        match bob.handle_remote_delete(ch) {
            Ok(_) | Err(DocError::CharacterNotFound(_)) => {}
            Err(err) => panic!("unexpected error: {err}"),
        }
    }

    assert_eq!(alice.text(), "ad");
    assert_eq!(alice.lines(), bob.lines());
}

#[test]
fn test_insert_into_line_deleted_remotely() {
    let mut alice = replica(1);
    let mut bob = replica(2);

    for ch in alice
        .handle_local_insert_str("one\ntwo\n", Position::new(0, 0))
        .unwrap()
    {
        bob.handle_remote_insert(ch).unwrap();
    }

    let deleted = alice
        .handle_local_delete(Position::new(0, 0), Position::new(2, 0))
        .unwrap();
    let typed = bob.handle_local_insert('!', Position::new(1, 1)).unwrap();

    alice.handle_remote_insert(typed.clone()).unwrap();
    for ch in &deleted {
        bob.handle_remote_delete(ch).unwrap();
    }

    assert_eq!(alice.text(), "!");
    assert_eq!(bob.text(), "!");
    assert!(alice.is_well_formed());
    assert!(bob.is_well_formed());
}

// ============================================================================
// Stress / Randomized Tests
// ============================================================================

#[test]
fn test_random_edits_converge() {
    let mut rng = StdRng::seed_from_u64(12345);

    for round in 0..20 {
        let mut replicas: Vec<Crdt> = (1..=3).map(replica).collect();

        // Shared starting text.
        let seed_ops = random_edits(&mut replicas[0], &mut rng, 15);
        for doc in replicas.iter_mut().skip(1) {
            deliver(doc, &seed_ops, &mut rng);
        }

        // Concurrent editing.
        let ops: Vec<Vec<Op>> = replicas
            .iter_mut()
            .map(|doc| random_edits(doc, &mut rng, 25))
            .collect();

        for (i, doc) in replicas.iter_mut().enumerate() {
            let foreign: Vec<Op> = ops
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, ops)| ops.iter().cloned())
                .collect();
            deliver(doc, &foreign, &mut rng);
        }

        for doc in &replicas {
            assert!(doc.is_well_formed(), "round {round}: malformed document");
            assert_eq!(doc.lines(), replicas[0].lines(), "round {round}: diverged");
        }
    }
}

#[test]
fn test_duplicate_delete_is_noop() {
    let mut doc = replica(1);
    let chars = doc
        .handle_local_insert_str("abc", Position::new(0, 0))
        .unwrap();

    doc.handle_remote_delete(&chars[1]).unwrap();
    let err = doc.handle_remote_delete(&chars[1]).unwrap_err();

    assert!(matches!(err, DocError::CharacterNotFound(_)));
    assert_eq!(doc.text(), "ac");
}
