//! Word → block placement state machine.
//!
//! A word is either unplaced or placed on exactly one block, and a block holds
//! at most one word. A placement is correct when the word and the block share
//! an id.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use shared::{BlockId, Submission, SubmissionRecord, SubmissionSummary, WordId};

use crate::error::{EngineError, Result};
use crate::model::ExerciseModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WordState {
    Unplaced,
    Placed { block_id: BlockId, correct: bool },
}

/// Effect of one transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlacementOutcome {
    Placed {
        word_id: WordId,
        block_id: BlockId,
        correct: bool,
        /// Block the word was on before
        moved_from: Option<BlockId>,
        /// Word that occupied the target block and is now unplaced
        evicted: Option<WordId>,
    },
    Removed {
        word_id: WordId,
        block_id: BlockId,
    },
    Unchanged,
}

/// A recorded transition, replayable after a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlacementOp {
    Drop { word_id: WordId, block_id: BlockId },
    Remove { word_id: WordId },
}

#[derive(Debug, Clone, Default)]
pub struct PlacementStateMachine {
    /// Word ids in exercise order
    words: Vec<WordId>,
    blocks: HashSet<BlockId>,
    placement: HashMap<WordId, BlockId>,
    occupants: HashMap<BlockId, WordId>,
    history: Vec<PlacementOp>,
}

fn is_correct(word_id: &str, block_id: &str) -> bool {
    word_id == block_id
}

impl PlacementStateMachine {
    pub fn new(
        words: impl IntoIterator<Item = WordId>,
        blocks: impl IntoIterator<Item = BlockId>,
    ) -> Self {
        Self {
            words: words.into_iter().collect(),
            blocks: blocks.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn from_model(model: &ExerciseModel) -> Self {
        Self::new(
            model.words().iter().map(|w| w.id.clone()),
            model.blocks().iter().map(|b| b.id.clone()),
        )
    }

    fn check_word(&self, word_id: &str) -> Result<()> {
        if self.words.iter().any(|w| w == word_id) {
            Ok(())
        } else {
            Err(EngineError::UnknownWord(word_id.to_string()))
        }
    }

    // ── Transitions ───────────────────────────────────────────

    /// Place `word_id` on `block_id`, vacating its old block and unplacing
    /// any other word already there.
    pub fn drop_word(&mut self, word_id: &str, block_id: &str) -> Result<PlacementOutcome> {
        self.check_word(word_id)?;
        if !self.blocks.contains(block_id) {
            return Err(EngineError::UnknownBlock(block_id.to_string()));
        }
        if self.placement.get(word_id).map(String::as_str) == Some(block_id) {
            return Ok(PlacementOutcome::Unchanged);
        }

        let moved_from = self.placement.remove(word_id);
        if let Some(old) = &moved_from {
            self.occupants.remove(old);
        }
        let evicted = self.occupants.remove(block_id);
        if let Some(other) = &evicted {
            self.placement.remove(other);
        }

        self.placement
            .insert(word_id.to_string(), block_id.to_string());
        self.occupants
            .insert(block_id.to_string(), word_id.to_string());
        self.history.push(PlacementOp::Drop {
            word_id: word_id.to_string(),
            block_id: block_id.to_string(),
        });

        let correct = is_correct(word_id, block_id);
        tracing::debug!(word = word_id, block = block_id, correct, ?evicted, "word placed");
        Ok(PlacementOutcome::Placed {
            word_id: word_id.to_string(),
            block_id: block_id.to_string(),
            correct,
            moved_from,
            evicted,
        })
    }

    pub fn remove(&mut self, word_id: &str) -> Result<PlacementOutcome> {
        self.check_word(word_id)?;
        let Some(block_id) = self.placement.remove(word_id) else {
            return Ok(PlacementOutcome::Unchanged);
        };
        self.occupants.remove(&block_id);
        self.history.push(PlacementOp::Remove {
            word_id: word_id.to_string(),
        });
        Ok(PlacementOutcome::Removed {
            word_id: word_id.to_string(),
            block_id,
        })
    }

    /// Unplace every word and forget the history.
    pub fn reset(&mut self) {
        self.placement.clear();
        self.occupants.clear();
        self.history.clear();
    }

    /// Apply recorded operations in order. Stops at the first unknown id.
    pub fn replay(&mut self, ops: &[PlacementOp]) -> Result<()> {
        for op in ops {
            match op {
                PlacementOp::Drop { word_id, block_id } => {
                    self.drop_word(word_id, block_id)?;
                }
                PlacementOp::Remove { word_id } => {
                    self.remove(word_id)?;
                }
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self, word_id: &str) -> Option<WordState> {
        if !self.words.iter().any(|w| w == word_id) {
            return None;
        }
        Some(match self.placement.get(word_id) {
            Some(block_id) => WordState::Placed {
                block_id: block_id.clone(),
                correct: is_correct(word_id, block_id),
            },
            None => WordState::Unplaced,
        })
    }

    /// Word currently on `block_id`
    pub fn occupant(&self, block_id: &str) -> Option<&WordId> {
        self.occupants.get(block_id)
    }

    pub fn block_of(&self, word_id: &str) -> Option<&BlockId> {
        self.placement.get(word_id)
    }

    /// Word → block, ordered by word id
    pub fn placement_map(&self) -> BTreeMap<WordId, BlockId> {
        self.placement
            .iter()
            .map(|(w, b)| (w.clone(), b.clone()))
            .collect()
    }

    pub fn unplaced_words(&self) -> impl Iterator<Item = &WordId> {
        self.words
            .iter()
            .filter(|w| !self.placement.contains_key(w.as_str()))
    }

    pub fn history(&self) -> &[PlacementOp] {
        &self.history
    }

    pub fn total(&self) -> usize {
        self.words.len()
    }

    pub fn placed_count(&self) -> usize {
        self.placement.len()
    }

    pub fn correct_count(&self) -> usize {
        self.placement
            .iter()
            .filter(|(w, b)| is_correct(w, b))
            .count()
    }

    /// Every word placed, whatever the correctness
    pub fn is_complete(&self) -> bool {
        self.total() > 0 && self.placed_count() == self.total()
    }

    pub fn can_submit(&self) -> bool {
        self.is_complete()
    }

    /// `(placed/total, correct/total)`, both 0 for an empty exercise
    pub fn progress(&self) -> (f64, f64) {
        if self.words.is_empty() {
            return (0.0, 0.0);
        }
        let total = self.total() as f64;
        (
            self.placed_count() as f64 / total,
            self.correct_count() as f64 / total,
        )
    }

    /// Records for the submit API, one per word in exercise order.
    pub fn submission(&self, test_id: &str) -> Submission {
        let answers: Vec<SubmissionRecord> = self
            .words
            .iter()
            .map(|word_id| {
                let actual = self.placement.get(word_id).cloned();
                SubmissionRecord {
                    question_id: word_id.clone(),
                    is_correct: actual.as_deref().is_some_and(|b| is_correct(word_id, b)),
                    actual_block_id: actual,
                    expected_block_id: word_id.clone(),
                }
            })
            .collect();
        Submission {
            test_id: test_id.to_string(),
            summary: SubmissionSummary {
                correct: answers.iter().filter(|a| a.is_correct).count(),
                total: answers.len(),
            },
            answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn six() -> PlacementStateMachine {
        let ids: Vec<String> = (1..=6).map(|i| i.to_string()).collect();
        PlacementStateMachine::new(ids.clone(), ids)
    }

    fn placed(block: &str, correct: bool) -> Option<WordState> {
        Some(WordState::Placed {
            block_id: block.to_string(),
            correct,
        })
    }

    #[test]
    fn test_redrop_vacates_old_block() {
        let mut sm = six();
        sm.drop_word("3", "3").unwrap();
        assert_eq!(sm.state("3"), placed("3", true));

        let outcome = sm.drop_word("3", "5").unwrap();
        assert_eq!(sm.state("3"), placed("5", false));
        assert_eq!(sm.occupant("3"), None);
        assert!(matches!(
            outcome,
            PlacementOutcome::Placed { moved_from: Some(ref b), evicted: None, .. } if b == "3"
        ));
    }

    #[test]
    fn test_drop_evicts_occupant() {
        let mut sm = six();
        sm.drop_word("2", "5").unwrap();
        let outcome = sm.drop_word("1", "5").unwrap();

        assert_eq!(sm.state("2"), Some(WordState::Unplaced));
        assert_eq!(sm.state("1"), placed("5", false));
        assert_eq!(sm.occupant("5").map(String::as_str), Some("1"));
        assert!(matches!(
            outcome,
            PlacementOutcome::Placed { evicted: Some(ref w), .. } if w == "2"
        ));
    }

    #[test]
    fn test_complete_with_four_correct() {
        let mut sm = six();
        for (w, b) in [("1", "1"), ("2", "2"), ("3", "3"), ("4", "4"), ("5", "6"), ("6", "5")] {
            sm.drop_word(w, b).unwrap();
        }
        assert!(sm.is_complete());
        assert!(sm.can_submit());
        assert_eq!(sm.correct_count(), 4);
        assert_eq!(sm.placed_count(), 6);
        let (placed, correct) = sm.progress();
        assert_eq!(placed, 1.0);
        assert!((correct - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_completion_independent_of_correctness() {
        let mut sm = six();
        for i in 1..=5 {
            sm.drop_word(&i.to_string(), &i.to_string()).unwrap();
        }
        assert_eq!(sm.correct_count(), 5);
        assert!(!sm.is_complete());
    }

    #[test]
    fn test_same_block_redrop_is_noop() {
        let mut sm = six();
        sm.drop_word("1", "1").unwrap();
        assert_eq!(sm.drop_word("1", "1").unwrap(), PlacementOutcome::Unchanged);
        assert_eq!(sm.history().len(), 1);
    }

    #[test]
    fn test_remove_and_reset() {
        let mut sm = six();
        sm.drop_word("1", "2").unwrap();
        assert!(matches!(sm.remove("1").unwrap(), PlacementOutcome::Removed { .. }));
        assert_eq!(sm.remove("1").unwrap(), PlacementOutcome::Unchanged);
        assert_eq!(sm.occupant("2"), None);

        sm.drop_word("4", "4").unwrap();
        sm.reset();
        assert_eq!(sm.placed_count(), 0);
        assert_eq!(sm.correct_count(), 0);
        assert!(sm.history().is_empty());
        assert_eq!(sm.unplaced_words().count(), 6);
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let mut sm = six();
        assert_eq!(
            sm.drop_word("9", "1"),
            Err(EngineError::UnknownWord("9".into()))
        );
        assert_eq!(
            sm.drop_word("1", "9"),
            Err(EngineError::UnknownBlock("9".into()))
        );
        assert!(sm.remove("nope").is_err());
        assert_eq!(sm.placed_count(), 0);
        assert_eq!(sm.state("nope"), None);
    }

    #[test]
    fn test_reset_and_replay_round_trip() {
        let mut sm = six();
        sm.drop_word("1", "2").unwrap();
        sm.drop_word("2", "2").unwrap();
        sm.drop_word("3", "3").unwrap();
        sm.remove("3").unwrap();
        sm.drop_word("6", "6").unwrap();

        let map = sm.placement_map();
        let correct = sm.correct_count();
        let ops = sm.history().to_vec();

        sm.reset();
        sm.replay(&ops).unwrap();
        assert_eq!(sm.placement_map(), map);
        assert_eq!(sm.correct_count(), correct);
    }

    #[test]
    fn test_submission_records() {
        let mut sm = six();
        sm.drop_word("1", "1").unwrap();
        sm.drop_word("2", "3").unwrap();
        let submission = sm.submission("six");

        assert_eq!(submission.answers.len(), 6);
        assert_eq!(submission.summary.correct, 1);
        assert_eq!(submission.summary.total, 6);
        let second = &submission.answers[1];
        assert_eq!(second.question_id, "2");
        assert_eq!(second.actual_block_id.as_deref(), Some("3"));
        assert_eq!(second.expected_block_id, "2");
        assert!(!second.is_correct);
        assert_eq!(submission.answers[5].actual_block_id, None);
    }
}
