//! The mom display.
//!
//! [`DisplayMachine`] folds remote changes, local interaction and the wall
//! clock into exactly one [`Screen`]; [`DisplayRunner`] drives it from a
//! [`ChangeFeed`](crate::feed::ChangeFeed), a tick and user input, and keeps
//! the feed connected.

pub mod alert;
pub mod idle;
pub mod machine;
pub mod mode;
pub mod night;
pub mod runner;
pub mod slideshow;

use chrono::Duration;

use crate::config::DisplayConfig;
use crate::error::Result;
use crate::model::DisplaySettings;

pub use alert::{Alerter, Silent, TerminalBell};
pub use machine::{Acknowledgement, DisplayMachine, Effect, Evaluation, MessageCard, ResolvedContent, Screen};
pub use mode::{ModeInputs, ModeKind};
pub use night::NightWindow;
pub use runner::{
    forward_interactions, AnchoredClock, Clock, DisplayRunner, Frame, Interaction, SystemClock,
};

/// Display timing for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPrefs {
    /// Time without activity before the screensaver starts.
    pub idle_timeout: Duration,
    /// Time each photo stays on screen.
    pub photo_interval: Duration,
    /// Night window, if configured.
    pub night: Option<NightWindow>,
}

impl DisplayPrefs {
    /// Combine a family's settings with the configured defaults.
    ///
    /// Each setting falls back to the default independently; the night window
    /// comes from the family only if it sets both bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a night-mode bound is malformed.
    pub fn resolve(settings: &DisplaySettings, defaults: &DisplayConfig) -> Result<Self> {
        let idle = settings.idle_timeout_secs.unwrap_or(defaults.idle_timeout_secs);
        let photo = settings
            .photo_interval_secs
            .unwrap_or(defaults.photo_interval_secs);

        let night = match (&settings.night_mode_start, &settings.night_mode_end) {
            (Some(start), Some(end)) => NightWindow::from_bounds(Some(start), Some(end))?,
            _ => NightWindow::from_bounds(
                defaults.night_mode_start.as_deref(),
                defaults.night_mode_end.as_deref(),
            )?,
        };

        Ok(Self {
            idle_timeout: Duration::seconds(i64::from(idle)),
            photo_interval: Duration::seconds(i64::from(photo.max(1))),
            night,
        })
    }
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::seconds(300),
            photo_interval: Duration::seconds(30),
            night: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_prefs_use_defaults_when_unset() {
        let prefs = DisplayPrefs::resolve(&DisplaySettings::default(), &DisplayConfig::default())
            .unwrap();
        assert_eq!(prefs, DisplayPrefs::default());
    }

    #[test]
    fn test_family_settings_override() {
        let settings = DisplaySettings {
            family_id: 1,
            idle_timeout_secs: Some(60),
            photo_interval_secs: None,
            night_mode_start: Some("22:00".to_string()),
            night_mode_end: Some("06:00".to_string()),
        };
        let prefs = DisplayPrefs::resolve(&settings, &DisplayConfig::default()).unwrap();
        assert_eq!(prefs.idle_timeout, Duration::seconds(60));
        assert_eq!(prefs.photo_interval, Duration::seconds(30));
        let night = prefs.night.unwrap();
        assert_eq!(night.start(), NaiveTime::from_hms_opt(22, 0, 0).unwrap());
    }

    #[test]
    fn test_half_set_night_falls_back_to_defaults() {
        let settings = DisplaySettings {
            night_mode_start: Some("21:00".to_string()),
            ..DisplaySettings::default()
        };
        let defaults = DisplayConfig {
            night_mode_start: Some("23:00".to_string()),
            night_mode_end: Some("07:00".to_string()),
            ..DisplayConfig::default()
        };
        let prefs = DisplayPrefs::resolve(&settings, &defaults).unwrap();
        assert_eq!(
            prefs.night.unwrap().start(),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_night_rejected() {
        let settings = DisplaySettings {
            night_mode_start: Some("late".to_string()),
            night_mode_end: Some("06:00".to_string()),
            ..DisplaySettings::default()
        };
        assert!(DisplayPrefs::resolve(&settings, &DisplayConfig::default()).is_err());
    }
}
