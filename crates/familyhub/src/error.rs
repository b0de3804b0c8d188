//! Error types for familyhub.
//!
//! This module defines all error types used throughout the familyhub crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for familyhub operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Access Errors ===
    /// No valid session: not logged in, unknown token or expired session.
    #[error("not logged in: {reason}")]
    Unauthenticated {
        /// Why the session was rejected.
        reason: String,
    },

    /// Logged in, but the member may not perform the operation.
    #[error("not permitted: {reason}")]
    Forbidden {
        /// Why access was denied.
        reason: String,
    },

    // === Domain Errors ===
    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record that was looked up.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Input failed validation.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },

    // === Change Feed Errors ===
    /// Subscribing to the change feed failed.
    #[error("failed to subscribe to changes for family {family_id}: {message}")]
    Subscribe {
        /// Family whose changes were requested.
        family_id: i64,
        /// Description of what went wrong.
        message: String,
    },

    // === Retry Errors ===
    /// A write kept failing with transient errors until the retry budget ran out.
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Name of the operation.
        operation: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last error observed.
        #[source]
        source: Box<Error>,
    },

    // === Alert Errors ===
    /// The audible alert could not be played.
    #[error("alert playback failed: {0}")]
    Alert(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for familyhub operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unauthenticated error.
    #[must_use]
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Create a forbidden error.
    #[must_use]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a subscription error.
    #[must_use]
    pub fn subscribe(family_id: i64, message: impl Into<String>) -> Self {
        Self::Subscribe {
            family_id,
            message: message.into(),
        }
    }

    /// Check if retrying the failed operation could succeed.
    ///
    /// Only busy or locked database errors are transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DatabaseQuery(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Check if this error means the caller is not logged in.
    #[must_use]
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// Check if this error means the caller is logged in but not permitted.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// Check if this error is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_error() -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        )
    }

    #[test]
    fn test_error_display() {
        let err = Error::unauthenticated("no session");
        assert_eq!(err.to_string(), "not logged in: no session");

        let err = Error::forbidden("viewer cannot send messages");
        assert_eq!(err.to_string(), "not permitted: viewer cannot send messages");
    }

    #[test]
    fn test_access_predicates_are_distinct() {
        let unauth = Error::unauthenticated("expired");
        let forbidden = Error::forbidden("viewer");

        assert!(unauth.is_unauthenticated());
        assert!(!unauth.is_forbidden());
        assert!(forbidden.is_forbidden());
        assert!(!forbidden.is_unauthenticated());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("tutorial", 42);
        assert_eq!(err.to_string(), "tutorial 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_busy_is_transient() {
        let err: Error = busy_error().into();
        assert!(err.is_transient());
    }

    #[test]
    fn test_other_errors_not_transient() {
        assert!(!Error::internal("bug").is_transient());
        assert!(!Error::invalid_input("empty").is_transient());
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_retries_exhausted_display() {
        let err = Error::RetriesExhausted {
            operation: "update_display".to_string(),
            attempts: 5,
            source: Box::new(busy_error().into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("update_display"));
        assert!(msg.contains("5 attempts"));
    }

    #[test]
    fn test_subscribe_error_display() {
        let err = Error::subscribe(7, "feed offline");
        let msg = err.to_string();
        assert!(msg.contains("family 7"));
        assert!(msg.contains("feed offline"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "tick_interval_ms must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("tick_interval_ms"));
    }
}
