//! Custom error types for the common library
//!
//! This module defines the errors surfaced by the record store and the
//! operation scope that bounds every store call.

use sqlx::Error as SqlxError;
use std::time::Duration;
use thiserror::Error;

/// Custom error type for record store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error occurred while connecting to the store
    #[error("store connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during query execution
    #[error("store query error: {0}")]
    Query(#[source] SqlxError),

    /// The operation scope expired before the store answered
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// A single-record lookup matched nothing
    #[error("no document matched the filter")]
    NotFound,

    /// An insert collided with a unique index
    #[error("duplicate value for unique field '{0}'")]
    DuplicateKey(String),

    /// A document could not be converted to or from its typed shape
    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("store configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Classify a sqlx error raised while executing a statement.
    ///
    /// Unique violations become [`StoreError::DuplicateKey`] carrying the
    /// constraint name, pool and I/O failures become
    /// [`StoreError::Connection`], everything else is a query error.
    pub fn from_query(err: SqlxError) -> Self {
        match err {
            SqlxError::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateKey(db.constraint().unwrap_or("unknown").to_string())
            }
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                StoreError::Connection(err)
            }
            other => StoreError::Query(other),
        }
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
