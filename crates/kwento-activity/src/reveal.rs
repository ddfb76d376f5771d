//! The reveal window between checking answers and reporting completion.
//!
//! After answers are checked the learner sees correctness highlighting for a
//! fixed delay before the host is told the attempt is over. This module models
//! that as an explicit two-phase state machine:
//!
//! - `Active` -> `Revealing { result, deadline }` on a successful check
//! - `Revealing` -> `Completed(result)` the first time the activity is polled
//!   at or after `deadline`; the completion callback fires exactly then
//! - any phase -> `Active` on reset, dropping a pending callback
//!
//! Nothing here sleeps. Hosts either call [`Activity::tick`] from their own
//! event loop or await [`settle`], which sleeps on the tokio timer until the
//! next deadline.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{ActivityError, Result};
use crate::model::{ActivityKind, ActivityResult};

/// Receives the result of a completed attempt.
pub type CompletionCallback = Box<dyn FnMut(&ActivityResult) + Send>;

// ============================================================================
// Phase
// ============================================================================

/// Where an attempt is in its check/reveal/complete lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Accepting input.
    Active,
    /// Answers checked; correctness is shown until `deadline`.
    Revealing {
        /// The computed result, reported once the window closes.
        result: ActivityResult,
        /// When the completion callback becomes due.
        deadline: DateTime<Utc>,
    },
    /// The completion callback has fired.
    Completed(ActivityResult),
}

impl Phase {
    /// Returns `true` if the phase rejects learner input.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// The result, once answers have been checked.
    #[must_use]
    pub const fn result(&self) -> Option<&ActivityResult> {
        match self {
            Self::Active => None,
            Self::Revealing { result, .. } | Self::Completed(result) => Some(result),
        }
    }

    /// The pending deadline while revealing.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Revealing { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Revealing { .. } => "revealing",
            Self::Completed(_) => "completed",
        }
    }
}

// ============================================================================
// RevealGate
// ============================================================================

/// Owns the phase, the reveal delay and the completion callback.
pub struct RevealGate {
    phase: Phase,
    delay: Duration,
    on_complete: Option<CompletionCallback>,
}

impl std::fmt::Debug for RevealGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevealGate")
            .field("phase", &self.phase)
            .field("delay", &self.delay)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

impl RevealGate {
    /// Creates an active gate with the given reveal delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            phase: Phase::Active,
            delay,
            on_complete: None,
        }
    }

    /// Sets the callback fired when an attempt completes.
    pub fn set_callback(&mut self, callback: CompletionCallback) {
        self.on_complete = Some(callback);
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The configured reveal delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Enters the reveal window with `result`.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Locked`] unless the gate is active.
    pub fn begin(&mut self, result: ActivityResult, now: DateTime<Utc>) -> Result<()> {
        if self.phase.is_locked() {
            return Err(ActivityError::Locked);
        }
        let delay =
            chrono::Duration::from_std(self.delay).unwrap_or_else(|_| chrono::Duration::zero());
        let deadline = now + delay;
        debug!(
            score = result.score,
            percentage = result.percentage,
            %deadline,
            "Revealing results"
        );
        self.phase = Phase::Revealing { result, deadline };
        Ok(())
    }

    /// Completes the attempt if the reveal window has closed.
    ///
    /// Returns the result exactly once, on the poll that performs the
    /// transition; the callback fires at the same moment.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<ActivityResult> {
        let Phase::Revealing { result, deadline } = &self.phase else {
            return None;
        };
        if now < *deadline {
            return None;
        }

        let result = result.clone();
        self.phase = Phase::Completed(result.clone());
        info!(
            score = result.score,
            percentage = result.percentage,
            time_spent = result.time_spent_seconds,
            "Activity attempt completed"
        );
        if let Some(callback) = self.on_complete.as_mut() {
            callback(&result);
        }
        Some(result)
    }

    /// Returns to the active phase, discarding any pending completion.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Revealing { .. }) {
            debug!("Reset during reveal window; pending completion dropped");
        }
        self.phase = Phase::Active;
    }
}

// ============================================================================
// Activity
// ============================================================================

/// Behavior shared by every interactive exercise.
pub trait Activity {
    /// Which widget this is.
    fn kind(&self) -> ActivityKind;

    /// The activity's notion of "now".
    fn now(&self) -> DateTime<Utc>;

    /// Advances any expired reveal window.
    ///
    /// Returns the final result on the tick that completes the attempt.
    fn tick(&mut self) -> Option<ActivityResult>;

    /// The next instant at which [`Activity::tick`] would change state.
    fn next_deadline(&self) -> Option<DateTime<Utc>>;

    /// Returns `true` while learner input is rejected.
    fn is_locked(&self) -> bool;

    /// The result once answers have been checked.
    fn result(&self) -> Option<&ActivityResult>;

    /// Restores the state observed right after mount.
    fn reset(&mut self);
}

/// Sleeps through every pending reveal window and ticks the activity.
///
/// Returns the completed result, or `None` when the activity stops at a state
/// that needs learner input (for example the next quiz question). Requires an
/// activity whose clock advances with real time.
pub async fn settle<A: Activity + ?Sized>(activity: &mut A) -> Option<ActivityResult> {
    while let Some(deadline) = activity.next_deadline() {
        let wait = (deadline - activity.now()).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;
        if let Some(result) = activity.tick() {
            return Some(result);
        }
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::Answer;

    fn sample_result() -> ActivityResult {
        ActivityResult {
            score: 1,
            percentage: 50,
            answers: vec![Answer::from("a"), Answer::from("a")],
            time_spent_seconds: 12,
        }
    }

    #[test]
    fn test_gate_starts_active() {
        let gate = RevealGate::new(Duration::from_secs(3));
        assert_eq!(gate.phase(), &Phase::Active);
        assert!(!gate.phase().is_locked());
        assert!(gate.phase().result().is_none());
    }

    #[test]
    fn test_gate_reveal_then_complete() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);

        let mut gate = RevealGate::new(Duration::from_secs(3));
        gate.set_callback(Box::new(move |result| sink.lock().unwrap().push(result.clone())));

        let now = Utc::now();
        gate.begin(sample_result(), now).unwrap();
        assert_eq!(gate.phase().name(), "revealing");
        assert_eq!(
            gate.phase().deadline(),
            Some(now + chrono::Duration::seconds(3))
        );

        // Before the deadline nothing happens
        assert!(gate.poll(now + chrono::Duration::milliseconds(2999)).is_none());
        assert!(fired.lock().unwrap().is_empty());

        // At the deadline the callback fires once
        let result = gate.poll(now + chrono::Duration::seconds(3)).unwrap();
        assert_eq!(result, sample_result());
        assert_eq!(fired.lock().unwrap().len(), 1);

        // Further polls are inert
        assert!(gate.poll(now + chrono::Duration::seconds(10)).is_none());
        assert_eq!(fired.lock().unwrap().len(), 1);
        assert_eq!(gate.phase(), &Phase::Completed(sample_result()));
    }

    #[test]
    fn test_gate_rejects_second_begin() {
        let mut gate = RevealGate::new(Duration::from_secs(3));
        gate.begin(sample_result(), Utc::now()).unwrap();
        assert_eq!(
            gate.begin(sample_result(), Utc::now()).unwrap_err(),
            ActivityError::Locked
        );
    }

    #[test]
    fn test_reset_drops_pending_completion() {
        let fired = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&fired);

        let mut gate = RevealGate::new(Duration::from_secs(3));
        gate.set_callback(Box::new(move |_| *sink.lock().unwrap() += 1));

        let now = Utc::now();
        gate.begin(sample_result(), now).unwrap();
        gate.reset();

        assert!(gate.poll(now + chrono::Duration::seconds(5)).is_none());
        assert_eq!(*fired.lock().unwrap(), 0);
        assert_eq!(gate.phase(), &Phase::Active);
    }

    #[test]
    fn test_zero_delay_completes_on_first_poll() {
        let mut gate = RevealGate::new(Duration::ZERO);
        let now = Utc::now();
        gate.begin(sample_result(), now).unwrap();
        assert!(gate.poll(now).is_some());
    }
}
