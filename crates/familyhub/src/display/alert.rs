//! Notification sound for urgent messages.

use std::fmt;
use std::io::Write;

use tracing::warn;

use crate::error::{Error, Result};

/// Plays the urgent-message notification.
pub trait Alerter: Send + Sync + fmt::Debug {
    /// Play the notification once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Alert`] if playback fails.
    fn play(&self) -> Result<()>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl Alerter for TerminalBell {
    fn play(&self) -> Result<()> {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| Error::Alert(e.to_string()))
    }
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Alerter for Silent {
    fn play(&self) -> Result<()> {
        Ok(())
    }
}

/// Play an alert, logging and discarding any failure.
pub fn play_best_effort(alerter: &dyn Alerter) {
    if let Err(e) = alerter.play() {
        warn!("Could not play notification sound: {}", e);
    }
}
