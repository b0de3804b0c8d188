//! Database-polling change feed.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{ChangeEvent, ChangeFeed, Subscription, Table};
use crate::error::{Error, Result};
use crate::hub::FamilyHub;
use crate::model::FamilyId;

/// Watches the shared database for display-control and message changes.
///
/// Each subscription runs its own polling task. A failed read ends the
/// subscription, which the subscriber sees as a disconnect.
#[derive(Debug, Clone)]
pub struct PollingFeed {
    hub: FamilyHub,
    interval: Duration,
}

impl PollingFeed {
    /// Create a feed that polls every `interval`.
    #[must_use]
    pub fn new(hub: FamilyHub, interval: Duration) -> Self {
        Self {
            hub,
            interval: interval.max(Duration::from_millis(10)),
        }
    }
}

#[async_trait]
impl ChangeFeed for PollingFeed {
    async fn subscribe(&self, family_id: FamilyId, tables: &[Table]) -> Result<Subscription> {
        let cursor = Cursor::start(&self.hub, family_id)
            .map_err(|e| Error::subscribe(family_id, e.to_string()))?;
        let capacity = self.hub.config().realtime.channel_capacity;
        let (tx, subscription) = Subscription::channel(family_id, capacity);

        let hub = self.hub.clone();
        let tables = tables.to_vec();
        let period = self.interval;
        tokio::spawn(async move {
            poll_loop(hub, cursor, tables, period, tx).await;
            debug!("Polling subscription for family {} closed", family_id);
        });

        debug!("Polling family {} every {:?}", family_id, self.interval);
        Ok(subscription)
    }
}

/// What the subscriber has already been told about.
#[derive(Debug)]
struct Cursor {
    family_id: FamilyId,
    display_version: u64,
    last_message_id: i64,
    read_since: DateTime<Utc>,
    reported_read: HashSet<i64>,
}

impl Cursor {
    fn start(hub: &FamilyHub, family_id: FamilyId) -> Result<Self> {
        let display_version = hub.display_control(family_id)?.version;
        let last_message_id = hub.read(|s| s.latest_message_id(family_id))?;
        Ok(Self {
            family_id,
            display_version,
            last_message_id,
            read_since: Utc::now(),
            reported_read: HashSet::new(),
        })
    }

    fn poll(&mut self, hub: &FamilyHub, tables: &[Table]) -> Result<Vec<ChangeEvent>> {
        let mut events = Vec::new();

        if tables.contains(&Table::DisplayControl) {
            let control = hub.display_control(self.family_id)?;
            if control.version > self.display_version {
                self.display_version = control.version;
                events.push(ChangeEvent::DisplayControl(control));
            }
        }

        if tables.contains(&Table::Messages) {
            let polled_at = Utc::now();
            let (inserted, read) = hub.read(|s| {
                Ok((
                    s.messages_after(self.family_id, self.last_message_id)?,
                    s.messages_read_since(self.family_id, self.read_since)?,
                ))
            })?;

            for message in inserted {
                self.last_message_id = self.last_message_id.max(message.id);
                if message.is_read {
                    self.reported_read.insert(message.id);
                }
                events.push(ChangeEvent::MessageInserted(message));
            }
            for message in read {
                if self.reported_read.insert(message.id) {
                    events.push(ChangeEvent::MessageUpdated(message));
                }
            }
            // Keep a one-second overlap so rows stamped just before the poll aren't missed
            self.read_since = polled_at - chrono::Duration::seconds(1);
            let read_since = self.read_since;
            if self.reported_read.len() > 1024 {
                let still_recent: HashSet<i64> = hub
                    .read(|s| s.messages_read_since(self.family_id, read_since))?
                    .into_iter()
                    .map(|m| m.id)
                    .collect();
                self.reported_read.retain(|id| still_recent.contains(id));
            }
        }

        Ok(events)
    }
}

async fn poll_loop(
    hub: FamilyHub,
    mut cursor: Cursor,
    tables: Vec<Table>,
    period: Duration,
    tx: mpsc::Sender<ChangeEvent>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = tx.closed() => return,
            _ = ticker.tick() => {}
        }

        let events = match cursor.poll(&hub, &tables) {
            Ok(events) => events,
            Err(e) => {
                warn!("Polling family {} failed: {}", cursor.family_id, e);
                return;
            }
        };
        for event in events {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{DisplayUpdate, DisplayView, NewMessage};

    async fn setup() -> (FamilyHub, FamilyId, Subscription) {
        let hub = FamilyHub::in_memory(Config::default()).unwrap();
        let family_id = hub.read(|s| s.create_family("Levi")).unwrap().id;
        let feed = PollingFeed::new(hub.clone(), Duration::from_millis(20));
        let sub = feed.subscribe(family_id, Table::DISPLAY).await.unwrap();
        (hub, family_id, sub)
    }

    async fn next(sub: &mut Subscription) -> ChangeEvent {
        tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .expect("timed out waiting for change")
            .expect("subscription closed")
    }

    #[tokio::test]
    async fn test_poll_sees_display_writes() {
        let (hub, family_id, mut sub) = setup().await;

        hub.read(|s| {
            s.update_display(
                family_id,
                &DisplayUpdate {
                    view: DisplayView::Screensaver,
                    ..DisplayUpdate::default()
                },
            )
        })
        .unwrap();

        match next(&mut sub).await {
            ChangeEvent::DisplayControl(control) => {
                assert_eq!(control.current_view, DisplayView::Screensaver);
                assert_eq!(control.version, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_poll_sees_inserts_and_reads() {
        let (hub, family_id, mut sub) = setup().await;

        let sent = hub
            .read(|s| {
                s.insert_message(&NewMessage {
                    family_id,
                    from_member_id: None,
                    text: "Call me".to_string(),
                    is_urgent: true,
                })
            })
            .unwrap();
        assert_eq!(next(&mut sub).await, ChangeEvent::MessageInserted(sent.clone()));

        let read = hub.read(|s| s.mark_message_read(sent.id)).unwrap();
        assert_eq!(next(&mut sub).await, ChangeEvent::MessageUpdated(read));

        // The read is reported once even though it stays inside the overlap window
        let quiet = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
        assert!(quiet.is_err());
    }

    #[tokio::test]
    async fn test_existing_rows_are_not_replayed() {
        let hub = FamilyHub::in_memory(Config::default()).unwrap();
        let family_id = hub.read(|s| s.create_family("Levi")).unwrap().id;
        hub.read(|s| s.update_display(family_id, &DisplayUpdate::default()))
            .unwrap();

        let feed = PollingFeed::new(hub, Duration::from_millis(20));
        let mut sub = feed.subscribe(family_id, Table::DISPLAY).await.unwrap();

        let quiet = tokio::time::timeout(Duration::from_millis(100), sub.next()).await;
        assert!(quiet.is_err());
    }
}
