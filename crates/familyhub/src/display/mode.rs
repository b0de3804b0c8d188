//! Render-mode precedence.

use std::fmt;

use crate::model::DisplayView;

/// The five mutually exclusive things the mom display can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// Large clock, nothing else.
    Night,
    /// Photo slideshow.
    Screensaver,
    /// A tutorial.
    Tutorial,
    /// A message popup with an acknowledge button.
    UrgentMessage,
    /// The normal dashboard.
    Dashboard,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Night => "night",
            Self::Screensaver => "screensaver",
            Self::Tutorial => "tutorial",
            Self::UrgentMessage => "urgent_message",
            Self::Dashboard => "dashboard",
        };
        f.write_str(name)
    }
}

/// Everything the mode depends on, already reduced to facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeInputs {
    /// An unread urgent message row exists.
    pub urgent_pending: bool,
    /// The view requested by the display-control record.
    pub remote_view: DisplayView,
    /// The requested tutorial was loaded and is showable.
    pub tutorial_resolved: bool,
    /// The `message` push carries a showable inline payload.
    pub inline_message: bool,
    /// The user dismissed a remotely requested screensaver.
    pub screensaver_dismissed: bool,
    /// The idle timeout has elapsed.
    pub idle_elapsed: bool,
    /// The night window is active and the user is not interacting.
    pub night_active: bool,
    /// At least one photo can be shown.
    pub has_photos: bool,
}

/// Pick the mode for `inputs`.
///
/// Rules, first match wins:
/// 1. unread urgent message
/// 2. remote tutorial that resolved
/// 3. remote message with inline payload
/// 4. remote screensaver, idle or night, when there are photos
/// 5. night
/// 6. dashboard
#[must_use]
pub fn resolve(inputs: &ModeInputs) -> ModeKind {
    if inputs.urgent_pending {
        return ModeKind::UrgentMessage;
    }
    if inputs.remote_view == DisplayView::Tutorial && inputs.tutorial_resolved {
        return ModeKind::Tutorial;
    }
    if inputs.remote_view == DisplayView::Message && inputs.inline_message {
        return ModeKind::UrgentMessage;
    }

    let remote_screensaver =
        inputs.remote_view == DisplayView::Screensaver && !inputs.screensaver_dismissed;
    if (remote_screensaver || inputs.idle_elapsed || inputs.night_active) && inputs.has_photos {
        return ModeKind::Screensaver;
    }
    if inputs.night_active {
        return ModeKind::Night;
    }
    ModeKind::Dashboard
}
