//! Local idle tracking.

use chrono::{Duration, NaiveDateTime};

/// Tracks local activity against the idle timeout.
///
/// Idle state is never persisted. Activity covers both user interaction and
/// remote changes that bring content on screen; only user interaction keeps
/// the screen awake through the night window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleTimer {
    timeout: Duration,
    last_activity: NaiveDateTime,
    last_interaction: Option<NaiveDateTime>,
}

impl IdleTimer {
    /// Start the timer at `now`.
    #[must_use]
    pub fn new(timeout: Duration, now: NaiveDateTime) -> Self {
        Self {
            timeout,
            last_activity: now,
            last_interaction: None,
        }
    }

    /// Record a user interaction.
    pub fn interact(&mut self, now: NaiveDateTime) {
        self.last_activity = self.last_activity.max(now);
        self.last_interaction = Some(now);
    }

    /// Restart the idle countdown without counting as an interaction.
    pub fn touch(&mut self, now: NaiveDateTime) {
        self.last_activity = self.last_activity.max(now);
    }

    /// Whether strictly more than the timeout has passed since the last activity.
    #[must_use]
    pub fn is_idle(&self, now: NaiveDateTime) -> bool {
        now - self.last_activity > self.timeout
    }

    /// Whether the user interacted within the timeout.
    #[must_use]
    pub fn is_awake(&self, now: NaiveDateTime) -> bool {
        self.last_interaction
            .is_some_and(|at| now - at <= self.timeout)
    }

    /// Moment the timer turns idle.
    #[must_use]
    pub fn idle_since(&self) -> NaiveDateTime {
        self.last_activity + self.timeout
    }

    /// Change the timeout, keeping the last activity.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Configured timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
