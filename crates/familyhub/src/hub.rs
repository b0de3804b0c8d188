//! Shared access to storage, the change feed and the write retry policy.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::{Config, FeedMode};
use crate::error::{Error, Result};
use crate::feed::{ChangeEvent, ChangeFeed, LocalFeed, PollingFeed};
use crate::model::{DisplayControl, DisplayUpdate, FamilyId, Message, NewMessage};
use crate::retry::{retry_async, RetryPolicy};
use crate::storage::Storage;

/// Handle to a family database.
///
/// Reads run directly against storage. Writes go through the retry policy,
/// and writes to the display-control record or the messages table are
/// published on the in-process [`LocalFeed`]. Cloning is cheap and shares
/// everything.
#[derive(Debug, Clone)]
pub struct FamilyHub {
    storage: Arc<Mutex<Storage>>,
    feed: LocalFeed,
    retry: RetryPolicy,
    config: Arc<Config>,
}

impl FamilyHub {
    /// Wrap an open storage.
    #[must_use]
    pub fn new(storage: Storage, config: Config) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            feed: LocalFeed::new(config.realtime.channel_capacity),
            retry: RetryPolicy::from_config(&config.retry),
            config: Arc::new(config),
        }
    }

    /// Open the database named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        info!("Family hub ready at {}", storage.path().display());
        Ok(Self::new(storage, config))
    }

    /// A hub over a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory(config: Config) -> Result<Self> {
        Ok(Self::new(Storage::open_in_memory()?, config))
    }

    /// The configuration the hub was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The in-process feed writes are published on.
    #[must_use]
    pub fn local_feed(&self) -> &LocalFeed {
        &self.feed
    }

    /// The change feed selected by `realtime.mode`.
    #[must_use]
    pub fn change_feed(&self) -> Arc<dyn ChangeFeed> {
        match self.config.realtime.mode {
            FeedMode::Local => Arc::new(self.feed.clone()),
            FeedMode::Poll => Arc::new(PollingFeed::new(self.clone(), self.config.poll_interval())),
        }
    }

    /// Run a read against storage.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the storage lock
    /// is poisoned.
    pub fn read<T>(&self, f: impl FnOnce(&Storage) -> Result<T>) -> Result<T> {
        let storage = self
            .storage
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))?;
        f(&storage)
    }

    /// Run a write against storage under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the first permanent error, or [`Error::RetriesExhausted`].
    pub async fn write<T>(
        &self,
        operation: &str,
        mut f: impl FnMut(&Storage) -> Result<T>,
    ) -> Result<T> {
        retry_async(&self.retry, operation, || std::future::ready(self.read(&mut f))).await
    }

    /// The family's display-control record, or its initial state if never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub fn display_control(&self, family_id: FamilyId) -> Result<DisplayControl> {
        Ok(self
            .read(|s| s.display_control(family_id))?
            .unwrap_or_else(|| DisplayControl::initial(family_id)))
    }

    /// Overwrite the display-control record and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_display(
        &self,
        family_id: FamilyId,
        update: &DisplayUpdate,
    ) -> Result<DisplayControl> {
        let control = self
            .write("update_display", |s| s.update_display(family_id, update))
            .await?;
        self.feed.publish(ChangeEvent::DisplayControl(control.clone()));
        Ok(control)
    }

    /// Persist a message and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn send_message(&self, message: &NewMessage) -> Result<Message> {
        let stored = self
            .write("insert_message", |s| s.insert_message(message))
            .await?;
        self.feed.publish(ChangeEvent::MessageInserted(stored.clone()));
        Ok(stored)
    }

    /// Mark one of the family's messages read and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the message belongs to another family,
    /// or an error if the write fails.
    pub async fn mark_message_read(&self, family_id: FamilyId, message_id: i64) -> Result<Message> {
        let owner = self
            .read(|s| s.message(message_id))?
            .map(|message| message.family_id);
        if owner != Some(family_id) {
            return Err(Error::not_found("message", message_id));
        }

        let message = self
            .write("mark_message_read", |s| s.mark_message_read(message_id))
            .await?;
        debug!("Message {} read", message_id);
        self.feed.publish(ChangeEvent::MessageUpdated(message.clone()));
        Ok(message)
    }
}
