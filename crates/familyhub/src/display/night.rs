//! Night-mode window.

use chrono::{NaiveTime, Timelike};

use crate::error::{Error, Result};

/// Parse an `HH:MM` (or `HH:MM:SS`) time of day.
///
/// # Errors
///
/// Returns an invalid-input error for anything else.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| Error::invalid_input(format!("'{value}' is not a time of day (HH:MM)")))
}

/// Daily time range during which the display shows only a clock.
///
/// The range is half-open, `[start, end)`, and wraps past midnight when
/// `start` is later than `end`. Equal bounds never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl NightWindow {
    /// Create a window.
    #[must_use]
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build a window from optional configured bounds.
    ///
    /// Returns `None` unless both bounds are set.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is not a valid time of day.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        match (start, end) {
            (Some(start), Some(end)) => Ok(Some(Self::new(
                parse_time_of_day(start)?,
                parse_time_of_day(end)?,
            ))),
            _ => Ok(None),
        }
    }

    /// Window start.
    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Window end.
    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether `time` falls inside the window.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        // Sub-second precision is irrelevant at the boundaries
        let time = time.with_nanosecond(0).unwrap_or(time);
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}
