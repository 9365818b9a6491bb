//! Account store error types.

use std::time::Duration;
use thiserror::Error;

/// Account store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same unique key already exists
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Store operation exceeded its deadline
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::DuplicateKey(
                    db_err
                        .constraint()
                        .unwrap_or("unique constraint")
                        .to_string(),
                )
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
