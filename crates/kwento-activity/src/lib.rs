//! Kwento activity engine
//!
//! State machines for the interactive exercises a learner completes between
//! story chapters: drag-and-drop categorization, matching pairs, multiple
//! choice and story comprehension. Each activity scores an attempt, holds a
//! reveal window so the learner sees what was right, then reports an
//! [`ActivityResult`] exactly once.
//!
//! Activities never read the wall clock directly. They take a [`Clock`] so
//! hosts and tests control time, and they never sleep; see [`settle`] for
//! the async driver.

pub mod clock;
pub mod drag_drop;
pub mod drop_zone;
pub mod error;
pub mod matching;
pub mod model;
pub mod quiz;
pub mod reveal;
pub mod score;
pub mod timing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use drag_drop::{DragDropActivity, TouchDrag};
pub use drop_zone::{DropZoneRegistry, Point, Rect};
pub use error::{ActivityError, Result};
pub use matching::MatchingActivity;
pub use model::{
    ActivityKind, ActivityResult, Answer, AnswerReview, Category, DragDropItem, MatchingPair,
    Question, Story,
};
pub use quiz::{QuestionFeedback, QuizActivity, QuizStep};
pub use reveal::{settle, Activity, CompletionCallback, Phase, RevealGate};
pub use timing::ActivityTiming;
