//! Change notifications for the mom display.
//!
//! A [`ChangeFeed`] turns writes to the display-control record and the
//! messages table into a per-family stream of [`ChangeEvent`]s. Two feeds
//! are provided:
//!
//! - [`LocalFeed`]: in-process fan-out of the events [`FamilyHub`] publishes
//!   on every write.
//! - [`PollingFeed`]: watches the database itself, so a display process sees
//!   writes made by other processes sharing the same file.
//!
//! A [`Subscription`] that yields `None` has disconnected; the display runner
//! reconnects with backoff.
//!
//! [`FamilyHub`]: crate::hub::FamilyHub

mod local;
mod poll;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::model::{DisplayControl, FamilyId, Message};

pub use local::LocalFeed;
pub use poll::PollingFeed;

/// Tables a subscription can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// The per-family display-control record.
    DisplayControl,
    /// Message rows.
    Messages,
}

impl Table {
    /// Every table the mom display needs.
    pub const DISPLAY: &'static [Table] = &[Table::DisplayControl, Table::Messages];
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisplayControl => write!(f, "display_control"),
            Self::Messages => write!(f, "messages"),
        }
    }
}

/// A change to a watched table.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// The display-control record was written.
    DisplayControl(DisplayControl),
    /// A message was sent.
    MessageInserted(Message),
    /// A message changed, e.g. it was marked read.
    MessageUpdated(Message),
    /// Events were dropped; the subscriber should re-read current state.
    Resync {
        /// Family whose events were lost.
        family_id: FamilyId,
    },
}

impl ChangeEvent {
    /// The family the change belongs to.
    #[must_use]
    pub fn family_id(&self) -> FamilyId {
        match self {
            Self::DisplayControl(control) => control.family_id,
            Self::MessageInserted(message) | Self::MessageUpdated(message) => message.family_id,
            Self::Resync { family_id } => *family_id,
        }
    }

    /// The table the change belongs to, `None` for [`ChangeEvent::Resync`].
    #[must_use]
    pub fn table(&self) -> Option<Table> {
        match self {
            Self::DisplayControl(_) => Some(Table::DisplayControl),
            Self::MessageInserted(_) | Self::MessageUpdated(_) => Some(Table::Messages),
            Self::Resync { .. } => None,
        }
    }

    /// Whether a subscription to `family_id` and `tables` should receive this event.
    #[must_use]
    pub fn matches(&self, family_id: FamilyId, tables: &[Table]) -> bool {
        self.family_id() == family_id && self.table().map_or(true, |t| tables.contains(&t))
    }
}

/// A source of change notifications keyed by family and table.
#[async_trait]
pub trait ChangeFeed: Send + Sync + fmt::Debug {
    /// Start receiving changes for one family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Subscribe`](crate::Error::Subscribe) if the feed cannot
    /// be reached.
    async fn subscribe(&self, family_id: FamilyId, tables: &[Table]) -> Result<Subscription>;
}

/// A live stream of changes for one family.
#[derive(Debug)]
pub struct Subscription {
    family_id: FamilyId,
    rx: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Create a subscription and the sender that feeds it.
    #[must_use]
    pub fn channel(family_id: FamilyId, capacity: usize) -> (mpsc::Sender<ChangeEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { family_id, rx })
    }

    /// The subscribed family.
    #[must_use]
    pub fn family_id(&self) -> FamilyId {
        self.family_id
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the feed has disconnected.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(family_id: FamilyId) -> Message {
        Message {
            id: 1,
            family_id,
            from_member_id: None,
            text: "hi".to_string(),
            is_urgent: false,
            is_read: false,
            created_at: Utc::now(),
            read_at: None,
        }
    }

    #[test]
    fn test_event_family_and_table() {
        let control = ChangeEvent::DisplayControl(DisplayControl::initial(4));
        assert_eq!(control.family_id(), 4);
        assert_eq!(control.table(), Some(Table::DisplayControl));

        let inserted = ChangeEvent::MessageInserted(message(5));
        assert_eq!(inserted.family_id(), 5);
        assert_eq!(inserted.table(), Some(Table::Messages));

        assert_eq!(ChangeEvent::Resync { family_id: 6 }.table(), None);
    }

    #[test]
    fn test_event_matches_filters() {
        let event = ChangeEvent::MessageUpdated(message(2));
        assert!(event.matches(2, Table::DISPLAY));
        assert!(!event.matches(3, Table::DISPLAY));
        assert!(!event.matches(2, &[Table::DisplayControl]));

        let resync = ChangeEvent::Resync { family_id: 2 };
        assert!(resync.matches(2, &[Table::DisplayControl]));
    }

    #[test]
    fn test_table_display() {
        assert_eq!(Table::DisplayControl.to_string(), "display_control");
        assert_eq!(Table::Messages.to_string(), "messages");
    }

    #[tokio::test]
    async fn test_subscription_ends_when_sender_dropped() {
        let (tx, mut sub) = Subscription::channel(1, 4);
        tx.send(ChangeEvent::Resync { family_id: 1 }).await.unwrap();
        drop(tx);

        assert_eq!(sub.family_id(), 1);
        assert!(sub.next().await.is_some());
        assert!(sub.next().await.is_none());
    }
}
