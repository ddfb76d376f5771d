//! Drag-and-drop categorisation activity.
//!
//! The learner drags every item into one of several categories, then checks
//! the board. Items are scored by comparing the category they were dropped in
//! with their `correct_category`.
//!
//! # Example
//!
//! ```
//! use kwento_activity::{ActivityTiming, Category, DragDropActivity, DragDropItem};
//!
//! let items = vec![
//!     DragDropItem::new("i1", "aso", "hayop"),
//!     DragDropItem::new("i2", "mangga", "prutas"),
//! ];
//! let categories = vec![Category::new("hayop", "Hayop"), Category::new("prutas", "Prutas")];
//!
//! let mut activity = DragDropActivity::new(items, categories, ActivityTiming::instant());
//! activity.begin_drag("i1").unwrap();
//! activity.drop_on("hayop").unwrap();
//! activity.begin_drag("i2").unwrap();
//! activity.drop_on("hayop").unwrap();
//!
//! let result = activity.check_answers().unwrap();
//! assert_eq!(result.score, 1);
//! assert_eq!(result.percentage, 50);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::drop_zone::{DropZoneRegistry, Point};
use crate::error::{ActivityError, Result};
use crate::model::{ActivityKind, ActivityResult, Answer, AnswerReview, Category, DragDropItem};
use crate::reveal::{Activity, Phase, RevealGate};
use crate::score;
use crate::timing::ActivityTiming;

/// An in-progress touch drag.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchDrag {
    /// The item under the finger.
    pub item_id: String,
    /// Last reported touch position.
    pub position: Point,
}

/// State of one drag-and-drop attempt.
#[derive(Debug)]
pub struct DragDropActivity {
    items: Vec<DragDropItem>,
    categories: Vec<Category>,
    available: Vec<DragDropItem>,
    placements: HashMap<String, Vec<DragDropItem>>,
    dragging: Option<String>,
    touch: Option<TouchDrag>,
    zones: DropZoneRegistry,
    reviews: Vec<AnswerReview>,
    gate: RevealGate,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl DragDropActivity {
    /// Mounts an activity on the system clock.
    #[must_use]
    pub fn new(items: Vec<DragDropItem>, categories: Vec<Category>, timing: ActivityTiming) -> Self {
        Self::with_clock(items, categories, timing, Arc::new(SystemClock))
    }

    /// Mounts an activity on the given clock.
    ///
    /// Categories are displayed by `order_index`; items keep their input
    /// order, which is also the order of the submitted answers.
    #[must_use]
    pub fn with_clock(
        items: Vec<DragDropItem>,
        mut categories: Vec<Category>,
        timing: ActivityTiming,
        clock: Arc<dyn Clock>,
    ) -> Self {
        categories.sort_by_key(|category| category.order_index);
        let started_at = clock.now();
        let mut activity = Self {
            available: Vec::new(),
            placements: HashMap::new(),
            items,
            categories,
            dragging: None,
            touch: None,
            zones: DropZoneRegistry::new(),
            reviews: Vec::new(),
            gate: RevealGate::new(timing.drag_drop_reveal()),
            clock,
            started_at,
        };
        activity.restore_board();
        activity
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

    /// Items in their original order.
    #[must_use]
    pub fn items(&self) -> &[DragDropItem] {
        &self.items
    }

    /// Categories in display order.
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Items not yet placed.
    #[must_use]
    pub fn available(&self) -> &[DragDropItem] {
        &self.available
    }

    /// Items dropped into `category_id`, in drop order.
    #[must_use]
    pub fn placed(&self, category_id: &str) -> &[DragDropItem] {
        self.placements.get(category_id).map_or(&[], Vec::as_slice)
    }

    /// The category an item currently sits in.
    #[must_use]
    pub fn category_of(&self, item_id: &str) -> Option<&str> {
        self.placements
            .iter()
            .find(|(_, placed)| placed.iter().any(|item| item.id == item_id))
            .map(|(category_id, _)| category_id.as_str())
    }

    /// The item currently being dragged.
    #[must_use]
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// The touch drag in progress, if any.
    #[must_use]
    pub const fn touch(&self) -> Option<&TouchDrag> {
        self.touch.as_ref()
    }

    /// Drop zones used to resolve touch releases.
    pub fn zones_mut(&mut self) -> &mut DropZoneRegistry {
        &mut self.zones
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        self.gate.phase()
    }

    /// Per-item correctness, in item order, once answers are checked.
    #[must_use]
    pub fn reviews(&self) -> &[AnswerReview] {
        &self.reviews
    }

    /// Returns `true` when every item is placed and results are not shown.
    #[must_use]
    pub fn can_check(&self) -> bool {
        self.available.is_empty() && !self.gate.phase().is_locked()
    }

    // ------------------------------------------------------------------------
    // Mouse drag
    // ------------------------------------------------------------------------

    /// Picks up an available item.
    pub fn begin_drag(&mut self, item_id: &str) -> Result<()> {
        self.ensure_unlocked()?;
        if !self.available.iter().any(|item| item.id == item_id) {
            return Err(if self.items.iter().any(|item| item.id == item_id) {
                ActivityError::ItemNotAvailable(item_id.to_string())
            } else {
                ActivityError::UnknownItem(item_id.to_string())
            });
        }
        debug!(item = item_id, "Drag started");
        self.dragging = Some(item_id.to_string());
        Ok(())
    }

    /// Abandons the current drag; the item stays available.
    pub fn cancel_drag(&mut self) {
        if let Some(item) = self.dragging.take() {
            debug!(item = %item, "Drag cancelled");
        }
        self.touch = None;
    }

    /// Drops the dragged item into `category_id`.
    ///
    /// Returns `Ok(false)` when nothing is being dragged. Dropping onto an
    /// unknown category cancels the drag.
    pub fn drop_on(&mut self, category_id: &str) -> Result<bool> {
        self.ensure_unlocked()?;
        if !self.placements.contains_key(category_id) {
            self.cancel_drag();
            return Err(ActivityError::UnknownCategory(category_id.to_string()));
        }
        let Some(item_id) = self.dragging.take() else {
            return Ok(false);
        };
        self.touch = None;

        let Some(index) = self.available.iter().position(|item| item.id == item_id) else {
            return Ok(false);
        };
        let item = self.available.remove(index);
        debug!(item = %item.id, category = category_id, "Item dropped");
        self.placements
            .entry(category_id.to_string())
            .or_default()
            .push(item);
        Ok(true)
    }

    /// Moves a placed item back to the available set.
    pub fn remove(&mut self, category_id: &str, item_id: &str) -> Result<()> {
        self.ensure_unlocked()?;
        let placed = self
            .placements
            .get_mut(category_id)
            .ok_or_else(|| ActivityError::UnknownCategory(category_id.to_string()))?;
        let index = placed
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| ActivityError::NotPlaced {
                item: item_id.to_string(),
                category: category_id.to_string(),
            })?;
        let item = placed.remove(index);
        debug!(item = item_id, category = category_id, "Item removed");
        self.available.push(item);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Touch drag
    // ------------------------------------------------------------------------

    /// Starts a touch drag of an available item.
    pub fn touch_start(&mut self, item_id: &str, position: Point) -> Result<()> {
        self.begin_drag(item_id)?;
        self.touch = Some(TouchDrag {
            item_id: item_id.to_string(),
            position,
        });
        Ok(())
    }

    /// Tracks the finger; returns the zone under it for hover highlighting.
    pub fn touch_move(&mut self, position: Point) -> Option<&str> {
        let touch = self.touch.as_mut()?;
        touch.position = position;
        self.zones.zone_at(position)
    }

    /// Ends a touch drag at `position`.
    ///
    /// Drops into the zone under the release point. Releasing outside every
    /// zone cancels the drag and returns `Ok(false)`.
    pub fn touch_end(&mut self, position: Point) -> Result<bool> {
        if self.touch.is_none() {
            return Ok(false);
        }
        match self.zones.zone_at(position).map(str::to_string) {
            Some(category_id) => self.drop_on(&category_id),
            None => {
                debug!(x = position.x, y = position.y, "Touch released outside drop zones");
                self.cancel_drag();
                Ok(false)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Checking
    // ------------------------------------------------------------------------

    /// Scores the board and enters the reveal window.
    ///
    /// # Errors
    ///
    /// [`ActivityError::Locked`] if results are already shown,
    /// [`ActivityError::Incomplete`] while items remain unplaced.
    pub fn check_answers(&mut self) -> Result<ActivityResult> {
        self.ensure_unlocked()?;
        if !self.available.is_empty() {
            return Err(ActivityError::incomplete(
                self.available.len(),
                self.items.len(),
            ));
        }

        let reviews: Vec<AnswerReview> = self
            .items
            .iter()
            .map(|item| {
                let placed_in = self.category_of(&item.id).unwrap_or_default().to_string();
                AnswerReview {
                    id: item.id.clone(),
                    correct: placed_in == item.correct_category,
                    answer: placed_in,
                }
            })
            .collect();

        let now = self.clock.now();
        let score = reviews.iter().filter(|review| review.correct).count();
        let result = ActivityResult {
            score,
            percentage: score::percentage(score, self.items.len()),
            answers: reviews
                .iter()
                .map(|review| Answer::Text(review.answer.clone()))
                .collect(),
            time_spent_seconds: score::elapsed_seconds(self.started_at, now),
        };

        self.dragging = None;
        self.touch = None;
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

    fn restore_board(&mut self) {
        self.available = self.items.clone();
        self.placements = self
            .categories
            .iter()
            .map(|category| (category.category_id.clone(), Vec::new()))
            .collect();
        self.dragging = None;
        self.touch = None;
        self.reviews.clear();
    }
}

impl Activity for DragDropActivity {
    fn kind(&self) -> ActivityKind {
        ActivityKind::DragDrop
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
        debug!("Drag-and-drop board reset");
        self.restore_board();
        self.gate.reset();
    }
}
