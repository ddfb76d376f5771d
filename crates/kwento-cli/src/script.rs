//! Scripted activity replays.
//!
//! A script is a JSON file holding one activity definition and the learner's
//! actions in order:
//!
//! ```json
//! {
//!   "activity": { "type": "MATCHING_PAIRS", "pairs": [ ... ] },
//!   "actions": [
//!     { "action": "selectLeft", "id": "a" },
//!     { "action": "selectRight", "id": "a" },
//!     { "action": "check" }
//!   ]
//! }
//! ```
//!
//! Replays run on the wall clock: before each action, any open reveal window
//! is waited out, exactly as a learner would have to.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use kwento_activity::{
    settle, Activity, ActivityError, ActivityKind, ActivityResult, ActivityTiming, Category,
    Clock, DragDropActivity, DragDropItem, MatchingActivity, MatchingPair, Point, Question,
    QuizActivity, Rect, Story, SystemClock,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// The activity under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityDefinition {
    /// Drag items into categories.
    DragDrop {
        /// Items, in authoring order.
        items: Vec<DragDropItem>,
        /// Drop targets.
        categories: Vec<Category>,
    },
    /// Connect prompts with answers.
    MatchingPairs {
        /// Pairs, in authoring order.
        pairs: Vec<MatchingPair>,
        /// Fixed seed for the right-column order.
        #[serde(default, rename = "shuffleSeed")]
        shuffle_seed: Option<u64>,
    },
    /// Linear questions.
    MultipleChoice {
        /// Questions, in order.
        questions: Vec<Question>,
    },
    /// A story followed by linear questions.
    StoryComprehension {
        /// The story text.
        story: Story,
        /// Questions, in order.
        questions: Vec<Question>,
    },
}

/// One learner action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// Mouse drag start.
    Drag {
        /// Item id.
        item: String,
    },
    /// Mouse drop onto a category.
    Drop {
        /// Category id.
        category: String,
    },
    /// Abandon the current drag.
    CancelDrag,
    /// Send a placed item back to the pool.
    Remove {
        /// Category holding the item.
        category: String,
        /// Item id.
        item: String,
    },
    /// Register a drop zone's bounds for touch input.
    RegisterZone {
        /// Category id.
        category: String,
        /// Zone bounds.
        bounds: Rect,
    },
    /// Touch drag start.
    TouchStart {
        /// Item id.
        item: String,
        /// Horizontal touch position.
        x: f64,
        /// Vertical touch position.
        y: f64,
    },
    /// Touch drag move.
    TouchMove {
        /// Horizontal touch position.
        x: f64,
        /// Vertical touch position.
        y: f64,
    },
    /// Touch release.
    TouchEnd {
        /// Horizontal touch position.
        x: f64,
        /// Vertical touch position.
        y: f64,
    },
    /// Select or toggle a left-column prompt.
    SelectLeft {
        /// Pair id.
        id: String,
    },
    /// Select a right-column answer.
    SelectRight {
        /// Pair id.
        id: String,
    },
    /// Undo a match.
    Unmatch {
        /// Left pair id.
        id: String,
    },
    /// Leave the story for the questions.
    BeginQuestions,
    /// Go back to the story.
    ShowStory,
    /// Choose an option on the current question.
    Select {
        /// Zero-based option index.
        option: usize,
    },
    /// Submit the current question.
    Submit,
    /// Check a drag-and-drop or matching board.
    Check,
    /// Pause, e.g. to simulate reading time.
    Wait {
        /// Milliseconds.
        ms: u64,
    },
    /// Restart the attempt.
    Reset,
}

impl Action {
    /// Action name as written in scripts.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Drag { .. } => "drag",
            Self::Drop { .. } => "drop",
            Self::CancelDrag => "cancelDrag",
            Self::Remove { .. } => "remove",
            Self::RegisterZone { .. } => "registerZone",
            Self::TouchStart { .. } => "touchStart",
            Self::TouchMove { .. } => "touchMove",
            Self::TouchEnd { .. } => "touchEnd",
            Self::SelectLeft { .. } => "selectLeft",
            Self::SelectRight { .. } => "selectRight",
            Self::Unmatch { .. } => "unmatch",
            Self::BeginQuestions => "beginQuestions",
            Self::ShowStory => "showStory",
            Self::Select { .. } => "select",
            Self::Submit => "submit",
            Self::Check => "check",
            Self::Wait { .. } => "wait",
            Self::Reset => "reset",
        }
    }
}

/// A definition plus the actions to replay against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScript {
    /// The activity.
    pub activity: ActivityDefinition,
    /// Learner actions, in order.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl ActivityScript {
    /// Reads a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CliError::ScriptNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(CliError::script_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };
        serde_json::from_str(&contents).map_err(|e| CliError::script_parse(path, e.to_string()))
    }
}

/// A mounted activity of any kind.
enum Session {
    DragDrop(DragDropActivity),
    Matching(MatchingActivity),
    Quiz(QuizActivity),
}

impl Session {
    fn mount(definition: ActivityDefinition, timing: ActivityTiming) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match definition {
            ActivityDefinition::DragDrop { items, categories } => {
                Self::DragDrop(DragDropActivity::with_clock(items, categories, timing, clock))
            }
            ActivityDefinition::MatchingPairs {
                pairs,
                shuffle_seed,
            } => {
                let activity = MatchingActivity::with_clock(pairs, timing, clock);
                Self::Matching(match shuffle_seed {
                    Some(seed) => activity.with_shuffle_seed(seed),
                    None => activity,
                })
            }
            ActivityDefinition::MultipleChoice { questions } => {
                Self::Quiz(QuizActivity::new(questions, None, timing, clock))
            }
            ActivityDefinition::StoryComprehension { story, questions } => {
                Self::Quiz(QuizActivity::new(questions, Some(story), timing, clock))
            }
        }
    }

    fn activity_mut(&mut self) -> &mut dyn Activity {
        match self {
            Self::DragDrop(activity) => activity,
            Self::Matching(activity) => activity,
            Self::Quiz(activity) => activity,
        }
    }

    /// Applies one non-wait action.
    ///
    /// `Ok(false)` means the action is not meaningful for this activity kind.
    fn apply(&mut self, action: &Action) -> std::result::Result<bool, ActivityError> {
        match (self, action) {
            (Self::DragDrop(a), Action::Drag { item }) => a.begin_drag(item)?,
            (Self::DragDrop(a), Action::Drop { category }) => {
                if !a.drop_on(category)? {
                    debug!(category, "Drop without an active drag ignored");
                }
            }
            (Self::DragDrop(a), Action::CancelDrag) => a.cancel_drag(),
            (Self::DragDrop(a), Action::Remove { category, item }) => a.remove(category, item)?,
            (Self::DragDrop(a), Action::RegisterZone { category, bounds }) => {
                a.zones_mut().register(category.as_str(), *bounds);
            }
            (Self::DragDrop(a), Action::TouchStart { item, x, y }) => {
                a.touch_start(item, Point::new(*x, *y))?;
            }
            (Self::DragDrop(a), Action::TouchMove { x, y }) => {
                let over = a.touch_move(Point::new(*x, *y));
                debug!(zone = ?over, "Touch moved");
            }
            (Self::DragDrop(a), Action::TouchEnd { x, y }) => {
                if !a.touch_end(Point::new(*x, *y))? {
                    debug!(x, y, "Touch released outside every drop zone");
                }
            }
            (Self::DragDrop(a), Action::Check) => {
                a.check_answers()?;
            }
            (Self::Matching(a), Action::SelectLeft { id }) => {
                a.select_left(id)?;
            }
            (Self::Matching(a), Action::SelectRight { id }) => {
                a.select_right(id)?;
            }
            (Self::Matching(a), Action::Unmatch { id }) => {
                a.unmatch(id)?;
            }
            (Self::Matching(a), Action::Check) => {
                a.check_answers()?;
            }
            (Self::Quiz(a), Action::BeginQuestions) => a.begin_questions()?,
            (Self::Quiz(a), Action::ShowStory) => a.show_story()?,
            (Self::Quiz(a), Action::Select { option }) => a.select_option(*option)?,
            (Self::Quiz(a), Action::Submit) => {
                let feedback = a.submit()?;
                debug!(correct = feedback.correct, "Question answered");
            }
            (session, Action::Reset) => session.activity_mut().reset(),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Replays `script` and returns the completed result.
///
/// # Errors
///
/// Fails on the first action the engine rejects or that does not apply to
/// the activity kind, and with [`CliError::Unfinished`] if the actions run
/// out before the attempt completes.
pub async fn replay(script: ActivityScript, timing: ActivityTiming) -> Result<ActivityResult> {
    let mut session = Session::mount(script.activity, timing);
    let kind = session.activity_mut().kind();
    info!(%kind, actions = script.actions.len(), "Replaying activity script");

    let mut completed = None;
    for (index, action) in script.actions.iter().enumerate() {
        if let Some(result) = settle(session.activity_mut()).await {
            completed = Some(result);
        }

        if let Action::Wait { ms } = action {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            if let Some(result) = session.activity_mut().tick() {
                completed = Some(result);
            }
            continue;
        }

        debug!(index, action = action.name(), "Applying action");
        match session.apply(action) {
            Ok(true) => {}
            Ok(false) => return Err(unsupported(index, action, kind)),
            Err(source) => {
                return Err(CliError::ActionFailed {
                    index,
                    action: action.name(),
                    source,
                });
            }
        }
        if matches!(action, Action::Reset) {
            completed = None;
        }
    }

    if let Some(result) = settle(session.activity_mut()).await {
        completed = Some(result);
    }
    completed.ok_or(CliError::Unfinished)
}

const fn unsupported(index: usize, action: &Action, kind: ActivityKind) -> CliError {
    CliError::UnsupportedAction {
        index,
        action: action.name(),
        kind,
    }
}
