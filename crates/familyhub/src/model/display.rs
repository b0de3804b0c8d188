//! The shared display-control record and per-family display settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::family::{FamilyId, MemberId};

/// What the controllers want the mom display to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayView {
    /// The normal dashboard.
    #[default]
    Dashboard,
    /// A tutorial referenced by `content_id`.
    Tutorial,
    /// An inline message carried in `content_data`.
    Message,
    /// The photo slideshow.
    Screensaver,
}

text_enum!(DisplayView {
    Dashboard => "dashboard",
    Tutorial => "tutorial",
    Message => "message",
    Screensaver => "screensaver",
});

/// Inline message payload of a `message` push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMessage {
    /// Message text.
    pub message: String,
    /// Who sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_member_id: Option<MemberId>,
    /// Persisted message row this payload mirrors, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    /// Whether the sender flagged it urgent.
    #[serde(default)]
    pub is_urgent: bool,
}

/// The single per-family display-control record.
///
/// `version` increases by one on every write; a display ignores any record
/// whose version is not newer than the one it last applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayControl {
    /// Owning family.
    pub family_id: FamilyId,
    /// Requested view.
    pub current_view: DisplayView,
    /// Tutorial id for the `tutorial` view.
    pub content_id: Option<i64>,
    /// Free-form payload, used by the `message` view.
    pub content_data: Option<serde_json::Value>,
    /// Member who made the change.
    pub triggered_by: Option<MemberId>,
    /// Monotonic per-family version; 0 means never written.
    pub version: u64,
    /// When the change was written.
    pub updated_at: DateTime<Utc>,
}

impl DisplayControl {
    /// The record a family has before anyone writes it.
    #[must_use]
    pub fn initial(family_id: FamilyId) -> Self {
        Self {
            family_id,
            current_view: DisplayView::Dashboard,
            content_id: None,
            content_data: None,
            triggered_by: None,
            version: 0,
            updated_at: DateTime::<Utc>::default(),
        }
    }

    /// Decode the inline message of a `message` push.
    ///
    /// Accepts either an [`InlineMessage`] object or a bare JSON string.
    /// Returns `None` for other views, a missing payload or blank text.
    #[must_use]
    pub fn inline_message(&self) -> Option<InlineMessage> {
        if self.current_view != DisplayView::Message {
            return None;
        }
        let inline = match self.content_data.as_ref()? {
            serde_json::Value::String(text) => InlineMessage {
                message: text.clone(),
                from_member_id: self.triggered_by,
                message_id: None,
                is_urgent: true,
            },
            value => serde_json::from_value(value.clone()).ok()?,
        };
        (!inline.message.trim().is_empty()).then_some(inline)
    }

    /// Check whether this record supersedes `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.version > other.version
    }
}

/// A requested change to the display-control record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayUpdate {
    /// View to show.
    pub view: DisplayView,
    /// Tutorial id for the `tutorial` view.
    pub content_id: Option<i64>,
    /// Payload for the `message` view.
    pub content_data: Option<serde_json::Value>,
    /// Acting member.
    pub triggered_by: Option<MemberId>,
}

/// Per-family display settings; unset values fall back to configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Owning family.
    pub family_id: FamilyId,
    /// Seconds without interaction before the screensaver starts.
    pub idle_timeout_secs: Option<u32>,
    /// Seconds per photo in the slideshow.
    pub photo_interval_secs: Option<u32>,
    /// Night-mode start (`HH:MM`).
    pub night_mode_start: Option<String>,
    /// Night-mode end (`HH:MM`).
    pub night_mode_end: Option<String>,
}
