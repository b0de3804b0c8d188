//! Photo rotation for the screensaver.

use chrono::{Duration, NaiveDateTime};

use crate::model::Photo;

/// Rotates through the family's photos while the screensaver is shown.
///
/// Rotation restarts from the first photo every time the screensaver is
/// entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slideshow {
    photos: Vec<Photo>,
    interval: Duration,
    started_at: Option<NaiveDateTime>,
}

impl Slideshow {
    /// Create a slideshow over `photos` in their given order.
    #[must_use]
    pub fn new(photos: Vec<Photo>, interval: Duration) -> Self {
        Self {
            photos,
            interval,
            started_at: None,
        }
    }

    /// Whether there is anything to show.
    #[must_use]
    pub fn has_photos(&self) -> bool {
        !self.photos.is_empty()
    }

    /// Replace the photo set; rotation continues from the current position.
    pub fn set_photos(&mut self, photos: Vec<Photo>) {
        self.photos = photos;
    }

    /// Change the rotation interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Mark the screensaver shown at `now`; a no-op while already running.
    pub fn start(&mut self, now: NaiveDateTime) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Mark the screensaver hidden.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    /// Whether the screensaver is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// The photo to show at `now`.
    #[must_use]
    pub fn current(&self, now: NaiveDateTime) -> Option<&Photo> {
        if self.photos.is_empty() {
            return None;
        }
        let elapsed = self.started_at.map_or(Duration::zero(), |start| now - start);
        let interval_ms = self.interval.num_milliseconds().max(1);
        let steps = elapsed.num_milliseconds().max(0) / interval_ms;
        let len = i64::try_from(self.photos.len()).unwrap_or(i64::MAX);
        let index = usize::try_from(steps % len).unwrap_or(0);
        self.photos.get(index)
    }
}
