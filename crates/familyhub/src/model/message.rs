//! Messages sent from family members to the mom display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::family::{FamilyId, MemberId};

/// A persisted message.
///
/// Messages are never deleted; acknowledging one sets `is_read` and `read_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Row id.
    pub id: i64,
    /// Owning family.
    pub family_id: FamilyId,
    /// Sender.
    pub from_member_id: Option<MemberId>,
    /// Body text.
    pub text: String,
    /// Urgent messages preempt the display and play an alert.
    pub is_urgent: bool,
    /// Set once the recipient acknowledges it.
    pub is_read: bool,
    /// When it was sent.
    pub created_at: DateTime<Utc>,
    /// When it was acknowledged.
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    /// An unread urgent message preempts every display mode.
    #[must_use]
    pub fn is_pending_urgent(&self) -> bool {
        self.is_urgent && !self.is_read
    }
}

/// Fields for sending a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Owning family.
    pub family_id: FamilyId,
    /// Sender.
    pub from_member_id: Option<MemberId>,
    /// Body text.
    pub text: String,
    /// Whether to preempt the display.
    pub is_urgent: bool,
}
