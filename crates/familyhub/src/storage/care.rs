//! Medications, dose logs, tasks and the shopping list.

use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::{format_date, format_timestamp, parse_date, parse_text, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{
    DoseLog, DoseStatus, FamilyId, Medication, MemberId, NewMedication, ShoppingItem,
    ShoppingStatus, Task, TaskStatus, TimeWindow,
};

impl Storage {
    /// Add a medication to the schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the family does not exist, or the
    /// database operation fails.
    pub fn add_medication(&self, medication: &NewMedication) -> Result<Medication> {
        let name = medication.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("medication name must not be empty"));
        }
        if self.family(medication.family_id)?.is_none() {
            return Err(Error::not_found("family", medication.family_id));
        }
        self.conn().execute(
            "INSERT INTO medications (family_id, name, dosage, time_window, is_active)
             VALUES (?1, ?2, ?3, ?4, 1)",
            params![
                medication.family_id,
                name,
                medication.dosage,
                medication.time_window.as_str(),
            ],
        )?;
        Ok(Medication {
            id: self.conn().last_insert_rowid(),
            family_id: medication.family_id,
            name: name.to_string(),
            dosage: medication.dosage.clone(),
            time_window: medication.time_window,
            is_active: true,
        })
    }

    /// Get a medication by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn medication(&self, id: i64) -> Result<Option<Medication>> {
        let medication = self
            .conn()
            .query_row(
                "SELECT id, family_id, name, dosage, time_window, is_active
                 FROM medications WHERE id = ?1",
                [id],
                row_to_medication,
            )
            .optional()?;
        Ok(medication)
    }

    /// Active medications of a family, by window then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn medications(&self, family_id: FamilyId) -> Result<Vec<Medication>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, name, dosage, time_window, is_active FROM medications
             WHERE family_id = ?1 AND is_active = 1
             ORDER BY time_window DESC, name ASC, id ASC",
        )?;
        let medications = stmt
            .query_map([family_id], row_to_medication)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    /// Record the outcome of a medication's dose on a day.
    ///
    /// Logging the same medication and day again replaces the earlier status.
    ///
    /// # Errors
    ///
    /// Returns an error if the medication does not exist in the family or the
    /// database operation fails.
    pub fn log_dose(
        &self,
        family_id: FamilyId,
        medication_id: i64,
        date: NaiveDate,
        status: DoseStatus,
        logged_by: Option<MemberId>,
    ) -> Result<DoseLog> {
        let medication = self
            .medication(medication_id)?
            .filter(|m| m.family_id == family_id)
            .ok_or_else(|| Error::not_found("medication", medication_id))?;

        let log = self.conn().query_row(
            "INSERT INTO dose_logs (family_id, medication_id, date, time_window, status, logged_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(medication_id, date, time_window) DO UPDATE SET
                 status = excluded.status,
                 logged_by = excluded.logged_by
             RETURNING id, family_id, medication_id, date, time_window, status, logged_by",
            params![
                family_id,
                medication_id,
                format_date(date),
                medication.time_window.as_str(),
                status.as_str(),
                logged_by,
            ],
            row_to_dose,
        )?;
        debug!(
            "Logged {} dose of medication {} on {}",
            status, medication_id, date
        );
        Ok(log)
    }

    /// Dose logs of a family for one day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn doses_on(&self, family_id: FamilyId, date: NaiveDate) -> Result<Vec<DoseLog>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, medication_id, date, time_window, status, logged_by
             FROM dose_logs WHERE family_id = ?1 AND date = ?2
             ORDER BY medication_id ASC",
        )?;
        let doses = stmt
            .query_map(params![family_id, format_date(date)], row_to_dose)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(doses)
    }

    /// Create a task.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is blank, the family does not exist, or
    /// the database operation fails.
    pub fn add_task(
        &self,
        family_id: FamilyId,
        title: &str,
        assigned_to: Option<MemberId>,
    ) -> Result<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::invalid_input("task title must not be empty"));
        }
        if self.family(family_id)?.is_none() {
            return Err(Error::not_found("family", family_id));
        }
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO tasks (family_id, title, assigned_to, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                family_id,
                title,
                assigned_to,
                TaskStatus::New.as_str(),
                format_timestamp(&created_at),
            ],
        )?;
        Ok(Task {
            id: self.conn().last_insert_rowid(),
            family_id,
            title: title.to_string(),
            assigned_to,
            status: TaskStatus::New,
            created_at,
        })
    }

    /// Move a task to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the task does not exist in the family or the
    /// database operation fails.
    pub fn set_task_status(&self, family_id: FamilyId, id: i64, status: TaskStatus) -> Result<Task> {
        let affected = self.conn().execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2 AND family_id = ?3",
            params![status.as_str(), id, family_id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("task", id));
        }
        self.conn()
            .query_row(
                "SELECT id, family_id, title, assigned_to, status, created_at FROM tasks WHERE id = ?1",
                [id],
                row_to_task,
            )
            .map_err(Error::from)
    }

    /// Tasks of a family, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn tasks(&self, family_id: FamilyId) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, title, assigned_to, status, created_at FROM tasks
             WHERE family_id = ?1 ORDER BY id DESC",
        )?;
        let tasks = stmt
            .query_map([family_id], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Put an item on the shopping list.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the family does not exist, or
    /// the database operation fails.
    pub fn add_shopping_item(
        &self,
        family_id: FamilyId,
        name: &str,
        quantity: Option<&str>,
    ) -> Result<ShoppingItem> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("item name must not be empty"));
        }
        if self.family(family_id)?.is_none() {
            return Err(Error::not_found("family", family_id));
        }
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO shopping_items (family_id, name, quantity, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                family_id,
                name,
                quantity,
                ShoppingStatus::Open.as_str(),
                format_timestamp(&created_at),
            ],
        )?;
        Ok(ShoppingItem {
            id: self.conn().last_insert_rowid(),
            family_id,
            name: name.to_string(),
            quantity: quantity.map(str::to_string),
            status: ShoppingStatus::Open,
            created_at,
        })
    }

    /// Mark a shopping item open or bought.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist in the family or the
    /// database operation fails.
    pub fn set_shopping_status(
        &self,
        family_id: FamilyId,
        id: i64,
        status: ShoppingStatus,
    ) -> Result<ShoppingItem> {
        let affected = self.conn().execute(
            "UPDATE shopping_items SET status = ?1 WHERE id = ?2 AND family_id = ?3",
            params![status.as_str(), id, family_id],
        )?;
        if affected == 0 {
            return Err(Error::not_found("shopping item", id));
        }
        self.conn()
            .query_row(
                "SELECT id, family_id, name, quantity, status, created_at
                 FROM shopping_items WHERE id = ?1",
                [id],
                row_to_shopping_item,
            )
            .map_err(Error::from)
    }

    /// The shopping list, open items first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn shopping_items(&self, family_id: FamilyId) -> Result<Vec<ShoppingItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, family_id, name, quantity, status, created_at FROM shopping_items
             WHERE family_id = ?1
             ORDER BY CASE status WHEN 'open' THEN 0 ELSE 1 END, id ASC",
        )?;
        let items = stmt
            .query_map([family_id], row_to_shopping_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn row_to_medication(row: &Row) -> rusqlite::Result<Medication> {
    let window: String = row.get(4)?;
    Ok(Medication {
        id: row.get(0)?,
        family_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        time_window: parse_text::<TimeWindow>(4, &window)?,
        is_active: row.get(5)?,
    })
}

fn row_to_dose(row: &Row) -> rusqlite::Result<DoseLog> {
    let date: String = row.get(3)?;
    let window: String = row.get(4)?;
    let status: String = row.get(5)?;
    Ok(DoseLog {
        id: row.get(0)?,
        family_id: row.get(1)?,
        medication_id: row.get(2)?,
        date: parse_date(3, &date)?,
        time_window: parse_text(4, &window)?,
        status: parse_text(5, &status)?,
        logged_by: row.get(6)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(Task {
        id: row.get(0)?,
        family_id: row.get(1)?,
        title: row.get(2)?,
        assigned_to: row.get(3)?,
        status: parse_text(4, &status)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

fn row_to_shopping_item(row: &Row) -> rusqlite::Result<ShoppingItem> {
    let status: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(ShoppingItem {
        id: row.get(0)?,
        family_id: row.get(1)?,
        name: row.get(2)?,
        quantity: row.get(3)?,
        status: parse_text(4, &status)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}
