//! In-process change feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use super::{ChangeEvent, ChangeFeed, Subscription, Table};
use crate::error::{Error, Result};
use crate::model::FamilyId;

#[derive(Debug)]
struct Inner {
    events: broadcast::Sender<ChangeEvent>,
    generation: watch::Sender<u64>,
    available: AtomicBool,
    capacity: usize,
}

/// Broadcasts published changes to every matching subscription.
///
/// Cloning shares the same channel.
#[derive(Debug, Clone)]
pub struct LocalFeed {
    inner: Arc<Inner>,
}

impl LocalFeed {
    /// Create a feed that buffers up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (events, _) = broadcast::channel(capacity);
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                events,
                generation,
                available: AtomicBool::new(true),
                capacity,
            }),
        }
    }

    /// Deliver a change to current subscribers.
    pub fn publish(&self, event: ChangeEvent) {
        trace!("Publishing {:?}", event);
        // No subscribers is not an error
        let _ = self.inner.events.send(event);
    }

    /// End every open subscription.
    pub fn disconnect_all(&self) {
        debug!("Disconnecting all local subscriptions");
        self.inner.generation.send_modify(|generation| *generation += 1);
    }

    /// Make new subscriptions succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }
}

impl Default for LocalFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl ChangeFeed for LocalFeed {
    async fn subscribe(&self, family_id: FamilyId, tables: &[Table]) -> Result<Subscription> {
        if !self.inner.available.load(Ordering::SeqCst) {
            return Err(Error::subscribe(family_id, "local feed unavailable"));
        }

        let mut events = self.inner.events.subscribe();
        let mut generation = self.inner.generation.subscribe();
        debug!("Subscribing to {:?} for family {}", tables_label(tables), family_id);
        let tables = tables.to_vec();
        let (tx, subscription) = Subscription::channel(family_id, self.inner.capacity);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = generation.changed() => break,
                    () = tx.closed() => break,
                    received = events.recv() => match received {
                        Ok(event) => {
                            if event.matches(family_id, &tables) && tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(
                                "Subscription for family {} lagged, {} events dropped",
                                family_id, skipped
                            );
                            if tx.send(ChangeEvent::Resync { family_id }).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            debug!("Local subscription for family {} closed", family_id);
        });

        Ok(subscription)
    }
}

fn tables_label(tables: &[Table]) -> Vec<String> {
    tables.iter().map(ToString::to_string).collect()
}
