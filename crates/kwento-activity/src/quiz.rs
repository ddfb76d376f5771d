//! Linear question activities: multiple choice and story comprehension.
//!
//! Questions are answered strictly in order. Each submission reveals whether
//! the answer was right (and the explanation, if any) for a fixed window,
//! after which the next question appears. When the window after the last
//! question closes, the attempt is scored and reported; its elapsed time
//! includes that window. A quiz without questions completes at 0% as soon as
//! it is ticked past the story step.
//!
//! Story comprehension adds a reading step before the first question. The
//! learner can return to the story text later without losing their place.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::error::{ActivityError, Result};
use crate::model::{ActivityKind, ActivityResult, Answer, Question, Story};
use crate::reveal::{Activity, RevealGate};
use crate::score;
use crate::timing::ActivityTiming;

/// What the learner is shown after submitting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    /// Whether the submitted option was right.
    pub correct: bool,
    /// The option the learner picked.
    pub selected_index: usize,
    /// The right option.
    pub correct_index: usize,
    /// Explanation attached to the question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Where a linear activity currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    /// Reading the story; questions resume at `resume_at`.
    Story {
        /// Question index shown when the learner continues.
        resume_at: usize,
    },
    /// Choosing an option for question `index`.
    Answering {
        /// Zero-based question index.
        index: usize,
    },
    /// Showing correctness for question `index` until `deadline`.
    Feedback {
        /// Zero-based question index.
        index: usize,
        /// What was revealed.
        feedback: QuestionFeedback,
        /// When the activity moves on.
        deadline: DateTime<Utc>,
    },
    /// Every question answered and the completion callback fired.
    Finished,
}

impl QuizStep {
    /// Short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Story { .. } => "story",
            Self::Answering { .. } => "answering",
            Self::Feedback { .. } => "feedback",
            Self::Finished => "finished",
        }
    }
}

/// State of one multiple-choice or story-comprehension attempt.
#[derive(Debug)]
pub struct QuizActivity {
    questions: Vec<Question>,
    story: Option<Story>,
    step: QuizStep,
    selected: Option<usize>,
    correct_count: usize,
    answers: Vec<usize>,
    question_reveal: chrono::Duration,
    gate: RevealGate,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl QuizActivity {
    /// Mounts a multiple-choice quiz on the system clock.
    #[must_use]
    pub fn multiple_choice(questions: Vec<Question>, timing: ActivityTiming) -> Self {
        Self::new(questions, None, timing, Arc::new(SystemClock))
    }

    /// Mounts a story-comprehension quiz on the system clock.
    #[must_use]
    pub fn story_comprehension(
        story: Story,
        questions: Vec<Question>,
        timing: ActivityTiming,
    ) -> Self {
        Self::new(questions, Some(story), timing, Arc::new(SystemClock))
    }

    /// Mounts a quiz; a story adds the reading step.
    #[must_use]
    pub fn new(
        questions: Vec<Question>,
        story: Option<Story>,
        timing: ActivityTiming,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started_at = clock.now();
        let question_reveal = chrono::Duration::from_std(timing.question_reveal())
            .unwrap_or_else(|_| chrono::Duration::zero());
        Self {
            step: initial_step(story.as_ref()),
            questions,
            story,
            selected: None,
            correct_count: 0,
            answers: Vec::new(),
            question_reveal,
            // The per-question deadline already covers the last reveal.
            gate: RevealGate::new(Duration::ZERO),
            clock,
            started_at,
        }
    }

    /// Sets the callback fired when the attempt completes.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnMut(&ActivityResult) + Send + 'static) -> Self {
        self.gate.set_callback(Box::new(callback));
        self
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> &QuizStep {
        &self.step
    }

    /// The story, for story comprehension.
    #[must_use]
    pub const fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    /// All questions.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Index of the question being answered or revealed.
    #[must_use]
    pub const fn current_index(&self) -> Option<usize> {
        match self.step {
            QuizStep::Answering { index } | QuizStep::Feedback { index, .. } => Some(index),
            QuizStep::Story { .. } | QuizStep::Finished => None,
        }
    }

    /// The question being answered or revealed.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|index| self.questions.get(index))
    }

    /// The tentative selection for the current question.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The feedback being shown.
    #[must_use]
    pub const fn feedback(&self) -> Option<&QuestionFeedback> {
        match &self.step {
            QuizStep::Feedback { feedback, .. } => Some(feedback),
            _ => None,
        }
    }

    /// Correct answers so far.
    #[must_use]
    pub const fn correct_count(&self) -> usize {
        self.correct_count
    }

    /// Submitted option indices so far, one per answered question.
    #[must_use]
    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    /// Returns `true` when an option is selected on an open question.
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        matches!(self.step, QuizStep::Answering { .. }) && self.selected.is_some()
    }

    // ------------------------------------------------------------------------
    // Story step
    // ------------------------------------------------------------------------

    /// Leaves the story text for the questions.
    pub fn begin_questions(&mut self) -> Result<()> {
        let QuizStep::Story { resume_at } = self.step else {
            return Err(ActivityError::wrong_step("begin_questions", self.step.name()));
        };
        debug!(question = resume_at, "Questions started");
        self.step = QuizStep::Answering { index: resume_at };
        Ok(())
    }

    /// Returns to the story text, keeping the current question.
    pub fn show_story(&mut self) -> Result<()> {
        if self.story.is_none() {
            return Err(ActivityError::wrong_step("show_story", self.step.name()));
        }
        match self.step {
            QuizStep::Answering { index } => {
                self.step = QuizStep::Story { resume_at: index };
                Ok(())
            }
            QuizStep::Story { .. } => Ok(()),
            QuizStep::Feedback { .. } | QuizStep::Finished => Err(ActivityError::Locked),
        }
    }

    // ------------------------------------------------------------------------
    // Answering
    // ------------------------------------------------------------------------

    /// Records a tentative selection for the current question.
    pub fn select_option(&mut self, option: usize) -> Result<()> {
        let question = self.open_question("select_option")?;
        let len = question.options.len();
        if option >= len {
            return Err(ActivityError::OptionOutOfRange { index: option, len });
        }
        self.selected = Some(option);
        Ok(())
    }

    /// Submits the selection and reveals its correctness.
    ///
    /// # Errors
    ///
    /// [`ActivityError::NoSelection`] if nothing is selected;
    /// [`ActivityError::Locked`] while feedback is shown.
    pub fn submit(&mut self) -> Result<QuestionFeedback> {
        let question = self.open_question("submit")?;
        let Some(selected) = self.selected else {
            return Err(ActivityError::NoSelection);
        };

        let feedback = QuestionFeedback {
            correct: selected == question.correct_answer,
            selected_index: selected,
            correct_index: question.correct_answer,
            explanation: question.explanation.clone(),
        };
        let index = self.current_index().unwrap_or_default();

        if feedback.correct {
            self.correct_count += 1;
        }
        self.answers.push(selected);
        debug!(
            question = index,
            selected,
            correct = feedback.correct,
            "Answer submitted"
        );

        let now = self.clock.now();
        self.step = QuizStep::Feedback {
            index,
            feedback: feedback.clone(),
            deadline: now + self.question_reveal,
        };
        Ok(feedback)
    }

    /// Scores the attempt and fires the completion callback.
    fn finish(&mut self, now: DateTime<Utc>) -> Option<ActivityResult> {
        self.step = QuizStep::Finished;
        let result = ActivityResult {
            score: self.correct_count,
            percentage: score::percentage(self.correct_count, self.questions.len()),
            answers: self.answers.iter().copied().map(Answer::Index).collect(),
            time_spent_seconds: score::elapsed_seconds(self.started_at, now),
        };
        self.gate.begin(result, now).ok()?;
        self.gate.poll(now)
    }

    fn open_question(&self, operation: &'static str) -> Result<&Question> {
        match self.step {
            QuizStep::Answering { index } => self
                .questions
                .get(index)
                .ok_or(ActivityError::wrong_step(operation, "finished")),
            QuizStep::Feedback { .. } | QuizStep::Finished => Err(ActivityError::Locked),
            QuizStep::Story { .. } => Err(ActivityError::wrong_step(operation, "story")),
        }
    }
}

impl Activity for QuizActivity {
    fn kind(&self) -> ActivityKind {
        if self.story.is_some() {
            ActivityKind::StoryComprehension
        } else {
            ActivityKind::MultipleChoice
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn tick(&mut self) -> Option<ActivityResult> {
        let now = self.clock.now();
        if self.questions.is_empty() && matches!(self.step, QuizStep::Answering { .. }) {
            debug!("Quiz has no questions");
            return self.finish(now);
        }
        let QuizStep::Feedback {
            index, deadline, ..
        } = self.step
        else {
            return None;
        };
        if now < deadline {
            return None;
        }

        self.selected = None;
        if index + 1 < self.questions.len() {
            debug!(question = index + 1, "Next question");
            self.step = QuizStep::Answering { index: index + 1 };
            None
        } else {
            self.finish(now)
        }
    }

    fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match self.step {
            QuizStep::Feedback { deadline, .. } => Some(deadline),
            QuizStep::Answering { .. } if self.questions.is_empty() => Some(self.started_at),
            _ => None,
        }
    }

    fn is_locked(&self) -> bool {
        matches!(self.step, QuizStep::Feedback { .. } | QuizStep::Finished)
    }

    fn result(&self) -> Option<&ActivityResult> {
        self.gate.phase().result()
    }

    fn reset(&mut self) {
        debug!("Quiz reset");
        self.step = initial_step(self.story.as_ref());
        self.selected = None;
        self.correct_count = 0;
        self.answers.clear();
        self.gate.reset();
    }
}

const fn initial_step(story: Option<&Story>) -> QuizStep {
    match story {
        Some(_) => QuizStep::Story { resume_at: 0 },
        None => QuizStep::Answering { index: 0 },
    }
}
