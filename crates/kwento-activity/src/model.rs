//! Activity content and result types.
//!
//! Content types arrive from the lesson API as JSON and use the backend's
//! camelCase field names. [`ActivityResult`] is what an activity hands back to
//! its host once an attempt completes.

use serde::{Deserialize, Serialize};

// ============================================================================
// ActivityKind
// ============================================================================

/// The four interactive exercise widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    /// Linear multiple-choice quiz.
    MultipleChoice,
    /// Sort items into categories.
    DragDrop,
    /// Connect each prompt with its answer.
    MatchingPairs,
    /// Read a story, then answer linear questions about it.
    StoryComprehension,
}

impl std::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleChoice => write!(f, "multiple_choice"),
            Self::DragDrop => write!(f, "drag_drop"),
            Self::MatchingPairs => write!(f, "matching_pairs"),
            Self::StoryComprehension => write!(f, "story_comprehension"),
        }
    }
}

// ============================================================================
// Content
// ============================================================================

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question identifier.
    pub id: String,
    /// Prompt shown to the learner.
    pub question: String,
    /// Options in display order.
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct_answer: usize,
    /// Shown alongside the correctness reveal when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Creates a question without an explanation.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_answer: usize,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_answer,
            explanation: None,
        }
    }

    /// Attaches an explanation.
    #[must_use]
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }
}

/// An item to be sorted into a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragDropItem {
    /// Item identifier.
    pub id: String,
    /// Display text.
    pub text: String,
    /// The `category_id` of the category this item belongs to.
    pub correct_category: String,
    /// Authoring order.
    #[serde(default)]
    pub order_index: u32,
}

impl DragDropItem {
    /// Creates an item.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        correct_category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            correct_category: correct_category.into(),
            order_index: 0,
        }
    }
}

/// A drop target in the drag-and-drop activity.
///
/// `id` is the database identifier; `category_id` is the stable key that
/// items reference through [`DragDropItem::correct_category`] and that drop
/// zones are registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Database identifier.
    pub id: String,
    /// Drop-target key.
    pub category_id: String,
    /// Display name.
    pub name: String,
    /// Color tag used by the host for styling.
    #[serde(default)]
    pub color: String,
    /// Display order.
    #[serde(default)]
    pub order_index: u32,
}

impl Category {
    /// Creates a category whose database id equals its drop-target key.
    #[must_use]
    pub fn new(category_id: impl Into<String>, name: impl Into<String>) -> Self {
        let category_id = category_id.into();
        Self {
            id: category_id.clone(),
            category_id,
            name: name.into(),
            color: String::new(),
            order_index: 0,
        }
    }
}

/// A prompt and its answer, matched by sharing one `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingPair {
    /// Shared by both sides.
    pub id: String,
    /// Left-side prompt.
    pub left: String,
    /// Right-side answer.
    pub right: String,
}

impl MatchingPair {
    /// Creates a pair.
    #[must_use]
    pub fn new(id: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Story text read before a comprehension quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story title.
    pub title: String,
    /// Full story body.
    pub content: String,
}

// ============================================================================
// Results
// ============================================================================

/// One submitted answer.
///
/// Linear activities record option indices; drag-drop and matching record
/// category ids and right-side ids, with an empty string for an item that was
/// never answered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Selected option index.
    Index(usize),
    /// Category id or right-side id.
    Text(String),
}

impl Answer {
    /// The placeholder for an item left unanswered.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Returns `true` for the unanswered placeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }
}

impl From<usize> for Answer {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Answer {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Answer {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// The outcome of one activity attempt, handed to the completion callback.
///
/// `answers` is aligned positionally with the activity's input list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResult {
    /// Number of correct answers.
    pub score: usize,
    /// `score` over the input count, 0-100, rounded.
    pub percentage: u32,
    /// One entry per input item, in input order.
    pub answers: Vec<Answer>,
    /// Whole seconds between mount and the answer check.
    #[serde(rename = "timeSpent")]
    pub time_spent_seconds: u64,
}

/// Correctness of one answered item, shown while results are revealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReview {
    /// Item or pair identifier.
    pub id: String,
    /// What the learner answered.
    pub answer: String,
    /// Whether the answer was right.
    pub correct: bool,
}
