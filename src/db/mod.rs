pub mod repository;
pub mod sqlite;

pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    /// A patch attempted to move a patient to a different doctor.
    /// The owning doctor is set once at creation and never changes.
    #[error("patient owner cannot be reassigned")]
    OwnerImmutable,
}

impl DatabaseError {
    /// Whether the underlying failure is a UNIQUE constraint violation
    /// (duplicate email, duplicate patient document for one doctor).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.code == rusqlite::ErrorCode::ConstraintViolation
            }
            _ => false,
        }
    }
}
