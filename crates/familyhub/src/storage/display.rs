//! The versioned display-control row and per-family display settings.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_timestamp, parse_text, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{DisplayControl, DisplaySettings, DisplayUpdate, FamilyId};

const CONTROL_COLUMNS: &str =
    "family_id, current_view, content_id, content_data, triggered_by, version, updated_at";

impl Storage {
    /// Get a family's display-control record.
    ///
    /// Returns `None` if nobody has written it yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn display_control(&self, family_id: FamilyId) -> Result<Option<DisplayControl>> {
        let control = self
            .conn()
            .query_row(
                &format!("SELECT {CONTROL_COLUMNS} FROM display_control WHERE family_id = ?1"),
                [family_id],
                row_to_control,
            )
            .optional()?;
        Ok(control)
    }

    /// Write a family's display-control record, bumping its version.
    ///
    /// The first write creates the row at version 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the family does not exist or the database operation fails.
    pub fn update_display(
        &self,
        family_id: FamilyId,
        update: &DisplayUpdate,
    ) -> Result<DisplayControl> {
        if self.family(family_id)?.is_none() {
            return Err(Error::not_found("family", family_id));
        }

        let content_data = update
            .content_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let control = self.conn().query_row(
            &format!(
                "INSERT INTO display_control
                     (family_id, current_view, content_id, content_data, triggered_by, version, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                 ON CONFLICT(family_id) DO UPDATE SET
                     current_view = excluded.current_view,
                     content_id = excluded.content_id,
                     content_data = excluded.content_data,
                     triggered_by = excluded.triggered_by,
                     version = display_control.version + 1,
                     updated_at = excluded.updated_at
                 RETURNING {CONTROL_COLUMNS}"
            ),
            params![
                family_id,
                update.view.as_str(),
                update.content_id,
                content_data,
                update.triggered_by,
                format_timestamp(&Utc::now()),
            ],
            row_to_control,
        )?;

        debug!(
            "Display for family {} set to {} (v{})",
            family_id, control.current_view, control.version
        );
        Ok(control)
    }

    /// Get a family's display settings.
    ///
    /// A family that never saved settings gets all-unset values.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn display_settings(&self, family_id: FamilyId) -> Result<DisplaySettings> {
        let settings = self
            .conn()
            .query_row(
                "SELECT family_id, idle_timeout_secs, photo_interval_secs, night_mode_start, night_mode_end
                 FROM display_settings WHERE family_id = ?1",
                [family_id],
                |row| {
                    Ok(DisplaySettings {
                        family_id: row.get(0)?,
                        idle_timeout_secs: row.get(1)?,
                        photo_interval_secs: row.get(2)?,
                        night_mode_start: row.get(3)?,
                        night_mode_end: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(settings.unwrap_or_else(|| DisplaySettings {
            family_id,
            ..DisplaySettings::default()
        }))
    }

    /// Replace a family's display settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the family does not exist or the database operation fails.
    pub fn set_display_settings(&self, settings: &DisplaySettings) -> Result<()> {
        if self.family(settings.family_id)?.is_none() {
            return Err(Error::not_found("family", settings.family_id));
        }
        self.conn().execute(
            "INSERT OR REPLACE INTO display_settings
                 (family_id, idle_timeout_secs, photo_interval_secs, night_mode_start, night_mode_end)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                settings.family_id,
                settings.idle_timeout_secs,
                settings.photo_interval_secs,
                settings.night_mode_start,
                settings.night_mode_end,
            ],
        )?;
        Ok(())
    }
}

fn row_to_control(row: &Row) -> rusqlite::Result<DisplayControl> {
    let view: String = row.get(1)?;
    let content_data: Option<String> = row.get(3)?;
    let version: i64 = row.get(5)?;
    let updated_at: String = row.get(6)?;

    let content_data = content_data
        .map(|text| serde_json::from_str(&text))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    let version = u64::try_from(version)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Integer, Box::new(e)))?;

    Ok(DisplayControl {
        family_id: row.get(0)?,
        current_view: parse_text(1, &view)?,
        content_id: row.get(2)?,
        content_data,
        triggered_by: row.get(4)?,
        version,
        updated_at: parse_timestamp(6, &updated_at)?,
    })
}
