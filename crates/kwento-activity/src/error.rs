//! Error types for the activity engine.
//!
//! An activity never fails because of I/O: every error here corresponds to a
//! control that the learner-facing UI keeps disabled (checking answers before
//! everything is placed, submitting without a selection, touching a board that
//! is already showing results). Hosts that mirror those controls never see
//! these errors; hosts that drive the engine programmatically get a precise
//! reason instead of a silent no-op.

/// A specialized `Result` type for activity operations.
pub type Result<T> = std::result::Result<T, ActivityError>;

/// Errors that can occur while driving an activity attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActivityError {
    // ========================================================================
    // Phase Errors
    // ========================================================================
    /// The activity is showing results (or has completed) and accepts no input.
    #[error("activity is locked while results are shown")]
    Locked,

    /// The operation is not valid for the current step of a linear activity.
    #[error("operation '{operation}' is not allowed during the {step} step")]
    WrongStep {
        /// The attempted operation.
        operation: &'static str,
        /// The step the activity is currently in.
        step: &'static str,
    },

    // ========================================================================
    // Completion Gates
    // ========================================================================
    /// Answers cannot be checked until every item or pair has been handled.
    #[error("cannot check answers: {remaining} of {total} still unanswered")]
    Incomplete {
        /// How many items or pairs are still open.
        remaining: usize,
        /// Size of the original input set.
        total: usize,
    },

    /// A submission was attempted without selecting an option first.
    #[error("select an option before submitting")]
    NoSelection,

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No item with this identifier exists in the activity.
    #[error("unknown item '{0}'")]
    UnknownItem(String),

    /// The item exists but is not in the available set (already placed).
    #[error("item '{0}' is not available to drag")]
    ItemNotAvailable(String),

    /// No category (drop zone) with this identifier exists.
    #[error("unknown category '{0}'")]
    UnknownCategory(String),

    /// The item is not placed in the given category.
    #[error("item '{item}' is not placed in category '{category}'")]
    NotPlaced {
        /// The item identifier.
        item: String,
        /// The category identifier.
        category: String,
    },

    /// No matching pair with this identifier exists.
    #[error("unknown pair '{0}'")]
    UnknownPair(String),

    /// The selected option index is outside the question's option list.
    #[error("option {index} is out of range (question has {len} options)")]
    OptionOutOfRange {
        /// The requested option index.
        index: usize,
        /// Number of options on the question.
        len: usize,
    },
}

impl ActivityError {
    /// Creates a new `Incomplete` error.
    #[must_use]
    pub const fn incomplete(remaining: usize, total: usize) -> Self {
        Self::Incomplete { remaining, total }
    }

    /// Creates a new `WrongStep` error.
    #[must_use]
    pub const fn wrong_step(operation: &'static str, step: &'static str) -> Self {
        Self::WrongStep { operation, step }
    }

    /// Returns `true` if the error only reflects a control that is disabled
    /// right now and would succeed later in the same attempt.
    #[must_use]
    pub const fn is_gate(&self) -> bool {
        matches!(
            self,
            Self::Locked | Self::WrongStep { .. } | Self::Incomplete { .. } | Self::NoSelection
        )
    }
}
