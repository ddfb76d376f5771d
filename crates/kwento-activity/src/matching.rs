//! Matching-pairs activity.
//!
//! Each [`MatchingPair`] contributes a left prompt and a right answer that
//! share one id. The learner connects prompts to answers by selecting one of
//! each; a connection is correct when both sides carry the same id.
//!
//! The right column is shuffled once when the activity is mounted. The order
//! is seeded, so the same pairs always shuffle the same way unless the host
//! supplies its own seed, and a reset keeps the order.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{ActivityError, Result};
use crate::model::{ActivityKind, ActivityResult, Answer, AnswerReview, MatchingPair};
use crate::reveal::{Activity, Phase, RevealGate};
use crate::score;
use crate::timing::ActivityTiming;

/// State of one matching attempt.
#[derive(Debug)]
pub struct MatchingActivity {
    pairs: Vec<MatchingPair>,
    right_order: Vec<usize>,
    matches: HashMap<String, String>,
    selected_left: Option<String>,
    selected_right: Option<String>,
    reviews: Vec<AnswerReview>,
    gate: RevealGate,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl MatchingActivity {
    /// Mounts an activity on the system clock.
    #[must_use]
    pub fn new(pairs: Vec<MatchingPair>, timing: ActivityTiming) -> Self {
        Self::with_clock(pairs, timing, Arc::new(SystemClock))
    }

    /// Mounts an activity on the given clock.
    #[must_use]
    pub fn with_clock(
        pairs: Vec<MatchingPair>,
        timing: ActivityTiming,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let seed = seed_for(&pairs);
        let started_at = clock.now();
        let mut activity = Self {
            right_order: Vec::new(),
            pairs,
            matches: HashMap::new(),
            selected_left: None,
            selected_right: None,
            reviews: Vec::new(),
            gate: RevealGate::new(timing.matching_reveal()),
            clock,
            started_at,
        };
        activity.shuffle(seed);
        activity
    }

    /// Reshuffles the right column with an explicit seed.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle(seed);
        self
    }

    /// Sets the callback fired when the attempt completes.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnMut(&ActivityResult) + Send + 'static) -> Self {
        self.gate.set_callback(Box::new(callback));
        self
    }

    fn shuffle(&mut self, seed: u64) {
        let mut order: Vec<usize> = (0..self.pairs.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        self.right_order = order;
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Pairs in their original order (the left column).
    #[must_use]
    pub fn pairs(&self) -> &[MatchingPair] {
        &self.pairs
    }

    /// Pairs in right-column display order.
    #[must_use]
    pub fn right_column(&self) -> Vec<&MatchingPair> {
        self.right_order.iter().map(|&i| &self.pairs[i]).collect()
    }

    /// The right id matched to `left_id`.
    #[must_use]
    pub fn matched_right(&self, left_id: &str) -> Option<&str> {
        self.matches.get(left_id).map(String::as_str)
    }

    /// Returns `true` if some left item is matched to `right_id`.
    #[must_use]
    pub fn is_right_matched(&self, right_id: &str) -> bool {
        self.matches.values().any(|right| right == right_id)
    }

    /// Number of connections made.
    #[must_use]
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// The selected left id.
    #[must_use]
    pub fn selected_left(&self) -> Option<&str> {
        self.selected_left.as_deref()
    }

    /// The selected right id.
    #[must_use]
    pub fn selected_right(&self) -> Option<&str> {
        self.selected_right.as_deref()
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        self.gate.phase()
    }

    /// Per-pair correctness, in pair order, once answers are checked.
    #[must_use]
    pub fn reviews(&self) -> &[AnswerReview] {
        &self.reviews
    }

    /// Returns `true` when every left item is matched and results are not shown.
    #[must_use]
    pub fn can_check(&self) -> bool {
        self.matches.len() == self.pairs.len() && !self.gate.phase().is_locked()
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    /// Toggles the selection of a left item and clears any right selection.
    ///
    /// Returns `Ok(false)` without changing anything if the item is already
    /// matched.
    pub fn select_left(&mut self, left_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        self.ensure_known(left_id)?;
        if self.matches.contains_key(left_id) {
            return Ok(false);
        }

        if self.selected_left.as_deref() == Some(left_id) {
            self.selected_left = None;
        } else {
            self.selected_left = Some(left_id.to_string());
        }
        self.selected_right = None;
        Ok(true)
    }

    /// Selects a right item, completing a match if a left item is selected.
    ///
    /// Returns `Ok(false)` without changing anything if the right item is
    /// already matched.
    pub fn select_right(&mut self, right_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        self.ensure_known(right_id)?;
        if self.is_right_matched(right_id) {
            return Ok(false);
        }

        if let Some(left_id) = self.selected_left.take() {
            debug!(left = %left_id, right = right_id, "Pair matched");
            self.matches.insert(left_id, right_id.to_string());
            self.selected_right = None;
        } else if self.selected_right.as_deref() == Some(right_id) {
            self.selected_right = None;
        } else {
            self.selected_right = Some(right_id.to_string());
        }
        Ok(true)
    }

    /// Removes the connection from `left_id`, freeing both sides.
    ///
    /// Returns whether a connection existed.
    pub fn unmatch(&mut self, left_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        let removed = self.matches.remove(left_id).is_some();
        if removed {
            debug!(left = left_id, "Pair unmatched");
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------------
    // Checking
    // ------------------------------------------------------------------------

    /// Scores the connections and enters the reveal window.
    ///
    /// # Errors
    ///
    /// [`ActivityError::Locked`] if results are already shown,
    /// [`ActivityError::Incomplete`] while any left item is unmatched.
    pub fn check_answers(&mut self) -> Result<ActivityResult> {
        self.ensure_unlocked()?;
        if self.matches.len() < self.pairs.len() {
            return Err(ActivityError::incomplete(
                self.pairs.len() - self.matches.len(),
                self.pairs.len(),
            ));
        }

        let reviews: Vec<AnswerReview> = self
            .pairs
            .iter()
            .map(|pair| {
                let right = self.matched_right(&pair.id).unwrap_or_default().to_string();
                AnswerReview {
                    id: pair.id.clone(),
                    correct: right == pair.id,
                    answer: right,
                }
            })
            .collect();

        let now = self.clock.now();
        let score = reviews.iter().filter(|review| review.correct).count();
        let result = ActivityResult {
            score,
            percentage: score::percentage(score, self.pairs.len()),
            answers: reviews
                .iter()
                .map(|review| Answer::Text(review.answer.clone()))
                .collect(),
            time_spent_seconds: score::elapsed_seconds(self.started_at, now),
        };

        self.selected_left = None;
        self.selected_right = None;
        self.reviews = reviews;
        self.gate.begin(result.clone(), now)?;
        Ok(result)
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.gate.phase().is_locked() {
            return Err(ActivityError::Locked);
        }
        Ok(())
    }

    fn ensure_known(&self, id: &str) -> Result<()> {
        if self.pairs.iter().any(|pair| pair.id == id) {
            Ok(())
        } else {
            Err(ActivityError::UnknownPair(id.to_string()))
        }
    }
}

impl Activity for MatchingActivity {
    fn kind(&self) -> ActivityKind {
        ActivityKind::MatchingPairs
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn tick(&mut self) -> Option<ActivityResult> {
        self.gate.poll(self.clock.now())
    }

    fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.gate.phase().deadline()
    }

    fn is_locked(&self) -> bool {
        self.gate.phase().is_locked()
    }

    fn result(&self) -> Option<&ActivityResult> {
        self.gate.phase().result()
    }

    fn reset(&mut self) {
        debug!("Matching board reset");
        self.matches.clear();
        self.selected_left = None;
        self.selected_right = None;
        self.reviews.clear();
        self.gate.reset();
    }
}

/// Stable seed derived from the pair ids.
fn seed_for(pairs: &[MatchingPair]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for pair in pairs {
        pair.id.hash(&mut hasher);
    }
    hasher.finish()
}
