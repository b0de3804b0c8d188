//! Message rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_timestamp, parse_timestamp, sql_limit, Storage};
use crate::error::{Error, Result};
use crate::model::{FamilyId, Message, NewMessage};

const MESSAGE_COLUMNS: &str =
    "id, family_id, from_member_id, text, is_urgent, is_read, created_at, read_at";

impl Storage {
    /// Persist a new message.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is blank, the family does not exist, or the
    /// database operation fails.
    pub fn insert_message(&self, message: &NewMessage) -> Result<Message> {
        let text = message.text.trim();
        if text.is_empty() {
            return Err(Error::invalid_input("message text must not be empty"));
        }
        if self.family(message.family_id)?.is_none() {
            return Err(Error::not_found("family", message.family_id));
        }

        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO messages (family_id, from_member_id, text, is_urgent, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            params![
                message.family_id,
                message.from_member_id,
                text,
                message.is_urgent,
                format_timestamp(&created_at),
            ],
        )?;
        let id = self.conn().last_insert_rowid();
        debug!(
            "Stored message {} for family {} (urgent: {})",
            id, message.family_id, message.is_urgent
        );

        Ok(Message {
            id,
            family_id: message.family_id,
            from_member_id: message.from_member_id,
            text: text.to_string(),
            is_urgent: message.is_urgent,
            is_read: false,
            created_at,
            read_at: None,
        })
    }

    /// Get a message by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn message(&self, id: i64) -> Result<Option<Message>> {
        let message = self
            .conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                [id],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// Mark a message read.
    ///
    /// Marking an already-read message keeps its original `read_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message does not exist or the database operation fails.
    pub fn mark_message_read(&self, id: i64) -> Result<Message> {
        self.conn().execute(
            "UPDATE messages SET is_read = 1, read_at = ?1 WHERE id = ?2 AND is_read = 0",
            params![format_timestamp(&Utc::now()), id],
        )?;
        self.message(id)?.ok_or_else(|| Error::not_found("message", id))
    }

    /// Recent messages of a family, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn messages(&self, family_id: FamilyId, unread_only: bool, limit: usize) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE family_id = ?1 AND (?2 = 0 OR is_read = 0)
             ORDER BY id DESC LIMIT ?3"
        ))?;
        let messages = stmt
            .query_map(params![family_id, unread_only, sql_limit(limit)], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Unread urgent messages of a family, oldest first.
    ///
    /// The oldest one is what the display shows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn unread_urgent(&self, family_id: FamilyId) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE family_id = ?1 AND is_urgent = 1 AND is_read = 0
             ORDER BY id ASC"
        ))?;
        let messages = stmt
            .query_map([family_id], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Messages of a family with an id greater than `after_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn messages_after(&self, family_id: FamilyId, after_id: i64) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE family_id = ?1 AND id > ?2
             ORDER BY id ASC"
        ))?;
        let messages = stmt
            .query_map(params![family_id, after_id], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Messages of a family read at or after `since`, oldest read first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn messages_read_since(
        &self,
        family_id: FamilyId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE family_id = ?1 AND is_read = 1 AND read_at >= ?2
             ORDER BY read_at ASC, id ASC"
        ))?;
        let messages = stmt
            .query_map(params![family_id, format_timestamp(&since)], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Highest message id of a family, or 0 if it has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn latest_message_id(&self, family_id: FamilyId) -> Result<i64> {
        let id: Option<i64> = self.conn().query_row(
            "SELECT MAX(id) FROM messages WHERE family_id = ?1",
            [family_id],
            |row| row.get(0),
        )?;
        Ok(id.unwrap_or(0))
    }
}

fn row_to_message(row: &Row) -> rusqlite::Result<Message> {
    let created_at: String = row.get(6)?;
    let read_at: Option<String> = row.get(7)?;
    Ok(Message {
        id: row.get(0)?,
        family_id: row.get(1)?,
        from_member_id: row.get(2)?,
        text: row.get(3)?,
        is_urgent: row.get(4)?,
        is_read: row.get(5)?,
        created_at: parse_timestamp(6, &created_at)?,
        read_at: read_at.map(|value| parse_timestamp(7, &value)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{family, storage};

    fn send(storage: &Storage, family_id: FamilyId, text: &str, urgent: bool) -> Message {
        storage
            .insert_message(&NewMessage {
                family_id,
                from_member_id: None,
                text: text.to_string(),
                is_urgent: urgent,
            })
            .unwrap()
    }

    #[test]
    fn test_insert_and_get_message() {
        let storage = storage();
        let family_id = family(&storage);

        let sent = send(&storage, family_id, "  Dinner at 7  ", false);
        assert_eq!(sent.text, "Dinner at 7");
        assert!(!sent.is_read);
        assert_eq!(storage.message(sent.id).unwrap(), Some(sent));
    }

    #[test]
    fn test_insert_rejects_blank_text() {
        let storage = storage();
        let family_id = family(&storage);
        let err = storage
            .insert_message(&NewMessage {
                family_id,
                from_member_id: None,
                text: "   ".to_string(),
                is_urgent: true,
            })
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn test_mark_read_sets_read_at_once() {
        let storage = storage();
        let family_id = family(&storage);
        let sent = send(&storage, family_id, "Call me", true);

        let read = storage.mark_message_read(sent.id).unwrap();
        assert!(read.is_read);
        let first_read_at = read.read_at.unwrap();

        let again = storage.mark_message_read(sent.id).unwrap();
        assert_eq!(again.read_at, Some(first_read_at));
        assert!(storage.mark_message_read(404).unwrap_err().is_not_found());
    }

    #[test]
    fn test_unread_urgent_oldest_first() {
        let storage = storage();
        let family_id = family(&storage);
        let first = send(&storage, family_id, "first", true);
        send(&storage, family_id, "not urgent", false);
        let second = send(&storage, family_id, "second", true);

        let pending = storage.unread_urgent(family_id).unwrap();
        assert_eq!(pending.iter().map(|m| m.id).collect::<Vec<_>>(), [first.id, second.id]);

        storage.mark_message_read(first.id).unwrap();
        let pending = storage.unread_urgent(family_id).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
    }

    #[test]
    fn test_messages_newest_first_with_filter() {
        let storage = storage();
        let family_id = family(&storage);
        let a = send(&storage, family_id, "a", false);
        let b = send(&storage, family_id, "b", false);
        storage.mark_message_read(a.id).unwrap();

        let all = storage.messages(family_id, false, 10).unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), [b.id, a.id]);

        let unread = storage.messages(family_id, true, 10).unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, b.id);

        assert_eq!(storage.messages(family_id, false, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_messages_are_family_scoped() {
        let storage = storage();
        let mine = family(&storage);
        let theirs = family(&storage);
        send(&storage, theirs, "not for you", true);

        assert!(storage.unread_urgent(mine).unwrap().is_empty());
        assert_eq!(storage.latest_message_id(mine).unwrap(), 0);
        assert!(storage.messages_after(mine, 0).unwrap().is_empty());
    }

    #[test]
    fn test_messages_after_and_read_since() {
        let storage = storage();
        let family_id = family(&storage);
        let a = send(&storage, family_id, "a", true);
        let b = send(&storage, family_id, "b", true);
        assert_eq!(storage.latest_message_id(family_id).unwrap(), b.id);

        let newer = storage.messages_after(family_id, a.id).unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].id, b.id);

        let before = Utc::now() - chrono::Duration::seconds(1);
        storage.mark_message_read(b.id).unwrap();
        let read = storage.messages_read_since(family_id, before).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, b.id);
    }
}
