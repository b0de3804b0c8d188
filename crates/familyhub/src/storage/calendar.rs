//! Care rotation and calendar events.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_date, parse_date, parse_text, sql_limit, Storage};
use crate::error::{Error, Result};
use crate::model::{Event, FamilyId, MemberId, NewEvent, RotationEntry};

/// Stored form of a local event time; fixed width so it sorts as text.
const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const EVENT_COLUMNS: &str =
    "id, family_id, title, category, starts_at, responsible_member_id, visible_to_mother";

impl Storage {
    /// Put a member on duty for a day, replacing whoever was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the member is not in the family or the database
    /// operation fails.
    pub fn set_rotation(
        &self,
        family_id: FamilyId,
        date: NaiveDate,
        member_id: MemberId,
        note: Option<&str>,
    ) -> Result<RotationEntry> {
        self.require_member_of(family_id, member_id)?;
        let note = note.map(str::trim).filter(|n| !n.is_empty());
        let entry = self.conn().query_row(
            "INSERT INTO rotation_schedule (family_id, date, member_id, note)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(family_id, date) DO UPDATE SET
                 member_id = excluded.member_id,
                 note = excluded.note
             RETURNING id, family_id, date, member_id, note",
            params![family_id, format_date(date), member_id, note],
            row_to_rotation,
        )?;
        debug!("Member {} on duty {} for family {}", member_id, date, family_id);
        Ok(entry)
    }

    /// Take a day off the rotation.
    ///
    /// Returns whether a day was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_rotation(&self, family_id: FamilyId, date: NaiveDate) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM rotation_schedule WHERE family_id = ?1 AND date = ?2",
            params![family_id, format_date(date)],
        )?;
        Ok(affected > 0)
    }

    /// Who is on duty on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn rotation_on(&self, family_id: FamilyId, date: NaiveDate) -> Result<Option<RotationEntry>> {
        let entry = self
            .conn()
            .query_row(
                "SELECT id, family_id, date, member_id, note FROM rotation_schedule
                 WHERE family_id = ?1 AND date = ?2",
                params![family_id, format_date(date)],
                row_to_rotation,
            )
            .optional()?;
        Ok(entry)
    }

    /// Rotation days from `from` through `to`, in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn rotation_between(
        &self,
        family_id: FamilyId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RotationEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, date, member_id, note FROM rotation_schedule
             WHERE family_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;
        let entries = stmt
            .query_map(
                params![family_id, format_date(from), format_date(to)],
                row_to_rotation,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Add a calendar event.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank, the family does not exist, the
    /// responsible member is not in the family, or the database operation
    /// fails.
    pub fn add_event(&self, event: &NewEvent) -> Result<Event> {
        let title = event.title.trim();
        if title.is_empty() {
            return Err(Error::invalid_input("event title must not be empty"));
        }
        if self.family(event.family_id)?.is_none() {
            return Err(Error::not_found("family", event.family_id));
        }
        if let Some(member_id) = event.responsible_member_id {
            self.require_member_of(event.family_id, member_id)?;
        }
        self.conn().execute(
            "INSERT INTO events
                 (family_id, title, category, starts_at, responsible_member_id, visible_to_mother)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.family_id,
                title,
                event.category.as_str(),
                format_local(event.starts_at),
                event.responsible_member_id,
                event.visible_to_mother,
            ],
        )?;
        Ok(Event {
            id: self.conn().last_insert_rowid(),
            family_id: event.family_id,
            title: title.to_string(),
            category: event.category,
            starts_at: event.starts_at,
            responsible_member_id: event.responsible_member_id,
            visible_to_mother: event.visible_to_mother,
        })
    }

    /// Remove an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the event does not exist in the family or the
    /// database operation fails.
    pub fn delete_event(&self, family_id: FamilyId, id: i64) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM events WHERE id = ?1 AND family_id = ?2",
            params![id, family_id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("event", id));
        }
        Ok(())
    }

    /// Events starting from `from` through `to`, soonest first.
    ///
    /// With `mother_only`, events hidden from the mom display are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn events_between(
        &self,
        family_id: FamilyId,
        from: NaiveDateTime,
        to: NaiveDateTime,
        mother_only: bool,
        limit: usize,
    ) -> Result<Vec<Event>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {EVENT_COLUMNS} FROM events
             WHERE family_id = ?1 AND starts_at >= ?2 AND starts_at <= ?3
               AND (?4 = 0 OR visible_to_mother = 1)
             ORDER BY starts_at ASC, id ASC LIMIT ?5"
        ))?;
        let events = stmt
            .query_map(
                params![
                    family_id,
                    format_local(from),
                    format_local(to),
                    mother_only,
                    sql_limit(limit),
                ],
                row_to_event,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn require_member_of(&self, family_id: FamilyId, member_id: MemberId) -> Result<()> {
        match self.member(member_id)? {
            Some(member) if member.family_id == family_id => Ok(()),
            _ => Err(Error::not_found("member", member_id)),
        }
    }
}

fn format_local(time: NaiveDateTime) -> String {
    time.format(LOCAL_TIME_FORMAT).to_string()
}

fn parse_local(idx: usize, value: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_rotation(row: &Row) -> rusqlite::Result<RotationEntry> {
    let date: String = row.get(2)?;
    Ok(RotationEntry {
        id: row.get(0)?,
        family_id: row.get(1)?,
        date: parse_date(2, &date)?,
        member_id: row.get(3)?,
        note: row.get(4)?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    let category: String = row.get(3)?;
    let starts_at: String = row.get(4)?;
    Ok(Event {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        category: parse_text(3, &category)?,
        starts_at: parse_local(4, &starts_at)?,
        responsible_member_id: row.get(5)?,
        visible_to_mother: row.get(6)?,
    })
}
