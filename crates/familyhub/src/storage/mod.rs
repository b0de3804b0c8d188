//! Storage layer for familyhub.
//!
//! `SQLite`-backed row storage for every family-scoped record. Row access is
//! split by concern across the submodules, each adding methods to
//! [`Storage`].

mod accounts;
mod calendar;
mod care;
mod content;
mod display;
mod messages;
pub mod migrations;
pub mod schema;

pub use accounts::SessionRecord;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Storage engine for family records.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist,
    /// then brings the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets the display process poll while a controller process writes
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;
        conn.busy_timeout(std::time::Duration::from_millis(250))?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Clamp a row limit into `SQLite`'s integer range.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Format a timestamp for storage.
///
/// Fixed-width UTC text, so stored timestamps compare correctly as strings.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Parse a stored RFC 3339 timestamp from column `idx`.
pub(crate) fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Format a calendar day for storage.
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored `YYYY-MM-DD` day from column `idx`.
pub(crate) fn parse_date(idx: usize, value: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a stored enum text from column `idx`.
pub(crate) fn parse_text<T>(idx: usize, value: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    value.parse().map_err(|e: Error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.to_string().into())
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Storage;
    use crate::model::{FamilyId, Member, NewMember, Role};

    pub fn storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    pub fn family(storage: &Storage) -> FamilyId {
        storage.create_family("Levi").unwrap().id
    }

    pub fn member(storage: &Storage, family_id: FamilyId, user_id: &str, role: Role) -> Member {
        storage
            .insert_member(&NewMember {
                family_id,
                user_id: user_id.to_string(),
                first_name: user_id.split('@').next().unwrap_or(user_id).to_string(),
                role,
                is_mother: false,
                phone: None,
            })
            .unwrap()
    }
}
