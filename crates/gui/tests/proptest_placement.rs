//! Property-based invariant tests for the placement state machine.
//!
//! 1. A block never holds more than one word, and both indexes agree
//! 2. Counters match the per-word states
//! 3. Unknown ids are rejected without changing anything
//! 4. Replaying the history on a fresh machine reproduces the placement

use blockmatch_lib::placement::{PlacementStateMachine, WordState};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Drop(u8, u8),
    Remove(u8),
}

/// Ids 1..=6 exist; 7 is unknown on both sides.
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u8..=7, 1u8..=7).prop_map(|(w, b)| Op::Drop(w, b)),
        1 => (1u8..=7).prop_map(Op::Remove),
    ]
}

fn machine() -> PlacementStateMachine {
    let ids = || (1..=6).map(|i: u8| i.to_string());
    PlacementStateMachine::new(ids(), ids())
}

fn apply(m: &mut PlacementStateMachine, op: &Op) -> bool {
    match op {
        Op::Drop(w, b) => m.drop_word(&w.to_string(), &b.to_string()).is_ok(),
        Op::Remove(w) => m.remove(&w.to_string()).is_ok(),
    }
}

fn check_consistency(m: &PlacementStateMachine) -> Result<(), TestCaseError> {
    let mut placed = 0;
    let mut correct = 0;
    for i in 1..=6u8 {
        let word = i.to_string();
        match m.state(&word) {
            Some(WordState::Placed { block_id, correct: c }) => {
                placed += 1;
                if c {
                    correct += 1;
                }
                prop_assert_eq!(m.occupant(&block_id), Some(&word));
                prop_assert_eq!(c, block_id == word);
            }
            Some(WordState::Unplaced) => {
                prop_assert!(m.block_of(&word).is_none());
            }
            None => prop_assert!(false, "known word {} has no state", word),
        }
    }
    for i in 1..=6u8 {
        let block = i.to_string();
        if let Some(word) = m.occupant(&block) {
            prop_assert_eq!(m.block_of(word), Some(&block));
        }
    }
    prop_assert_eq!(m.placed_count(), placed);
    prop_assert_eq!(m.correct_count(), correct);
    prop_assert!(m.correct_count() <= m.placed_count());
    prop_assert_eq!(m.is_complete(), placed == 6);
    Ok(())
}

proptest! {
    #[test]
    fn occupancy_stays_consistent(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut m = machine();
        for op in &ops {
            apply(&mut m, op);
            check_consistency(&m)?;
        }
    }

    #[test]
    fn unknown_ids_change_nothing(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut m = machine();
        for op in &ops {
            let before = m.placement_map();
            let history_len = m.history().len();
            let mentions_unknown = match op {
                Op::Drop(w, b) => *w == 7 || *b == 7,
                Op::Remove(w) => *w == 7,
            };
            let accepted = apply(&mut m, op);
            prop_assert_eq!(accepted, !mentions_unknown);
            if mentions_unknown {
                prop_assert_eq!(m.placement_map(), before);
                prop_assert_eq!(m.history().len(), history_len);
            }
        }
    }

    #[test]
    fn history_replay_reproduces_state(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut m = machine();
        for op in &ops {
            apply(&mut m, op);
        }

        let mut fresh = machine();
        fresh.replay(m.history()).unwrap();
        prop_assert_eq!(fresh.placement_map(), m.placement_map());
        prop_assert_eq!(fresh.history(), m.history());
    }

    #[test]
    fn submission_covers_every_word(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut m = machine();
        for op in &ops {
            apply(&mut m, op);
        }
        let submission = m.submission("t");
        prop_assert_eq!(submission.answers.len(), 6);
        prop_assert_eq!(submission.summary.total, 6);
        prop_assert_eq!(submission.summary.correct, m.correct_count());
        for answer in &submission.answers {
            prop_assert_eq!(answer.actual_block_id.as_ref(), m.block_of(&answer.question_id));
        }
    }
}
