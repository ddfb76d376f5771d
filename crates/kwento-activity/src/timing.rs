//! Reveal-window timing for activities.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default reveal window after checking a drag-and-drop board.
const fn default_drag_drop_reveal_ms() -> u64 {
    3000
}

/// Default reveal window after checking a matching board.
const fn default_matching_reveal_ms() -> u64 {
    3000
}

/// Default reveal window after each quiz question.
const fn default_question_reveal_ms() -> u64 {
    2500
}

/// How long correctness stays on screen before an activity moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTiming {
    /// Drag-and-drop: check answers -> completion callback.
    #[serde(default = "default_drag_drop_reveal_ms")]
    pub drag_drop_reveal_ms: u64,

    /// Matching pairs: check answers -> completion callback.
    #[serde(default = "default_matching_reveal_ms")]
    pub matching_reveal_ms: u64,

    /// Multiple choice / story comprehension: submit -> next question or
    /// completion callback.
    #[serde(default = "default_question_reveal_ms")]
    pub question_reveal_ms: u64,
}

impl Default for ActivityTiming {
    fn default() -> Self {
        Self {
            drag_drop_reveal_ms: default_drag_drop_reveal_ms(),
            matching_reveal_ms: default_matching_reveal_ms(),
            question_reveal_ms: default_question_reveal_ms(),
        }
    }
}

impl ActivityTiming {
    /// Timing with every reveal window closed immediately.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            drag_drop_reveal_ms: 0,
            matching_reveal_ms: 0,
            question_reveal_ms: 0,
        }
    }

    /// Drag-and-drop reveal window.
    #[must_use]
    pub const fn drag_drop_reveal(&self) -> Duration {
        Duration::from_millis(self.drag_drop_reveal_ms)
    }

    /// Matching reveal window.
    #[must_use]
    pub const fn matching_reveal(&self) -> Duration {
        Duration::from_millis(self.matching_reveal_ms)
    }

    /// Per-question reveal window.
    #[must_use]
    pub const fn question_reveal(&self) -> Duration {
        Duration::from_millis(self.question_reveal_ms)
    }

    /// Rejects windows longer than one minute, which would stall the learner.
    ///
    /// Returns the offending field name and its value.
    pub fn validate(&self) -> std::result::Result<(), (&'static str, u64)> {
        const MAX_REVEAL_MS: u64 = 60_000;
        for (name, value) in [
            ("dragDropRevealMs", self.drag_drop_reveal_ms),
            ("matchingRevealMs", self.matching_reveal_ms),
            ("questionRevealMs", self.question_reveal_ms),
        ] {
            if value > MAX_REVEAL_MS {
                return Err((name, value));
            }
        }
        Ok(())
    }
}
