//! # FlexCRM Storage Errors
//!
//! Defines [`StoreError`], the single error type of the persistence layer.
//! It covers SQLite failures (tagged with the operation that triggered them),
//! use of a closed store, schema declaration mistakes and record conversion
//! problems raised by entity `from_record` implementations.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error during '{operation}': {source}")]
    Sqlite {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("I/O error during operation '{operation}' on path '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The store connection is closed")]
    Closed,

    #[error("The store connection lock is poisoned")]
    Poisoned,

    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Field '{field}' of table '{table}' is reserved and cannot be declared or overridden")]
    ReservedField { table: String, field: String },

    #[error("Field '{field}' is missing from the record")]
    MissingField { field: String },

    #[error("Field '{field}' holds a {found} value, expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field '{field}' holds an invalid timestamp '{value}'")]
    InvalidTimestamp { field: String, value: String },

    #[error("No row with id {id} in table '{table}'")]
    MissingRow { table: String, id: i64 },
}

impl StoreError {
    pub fn sqlite(source: rusqlite::Error, operation: impl Into<String>) -> Self {
        StoreError::Sqlite {
            operation: operation.into(),
            source,
        }
    }

    pub fn io(source: std::io::Error, operation: impl Into<String>, path: PathBuf) -> Self {
        StoreError::Io {
            source,
            operation: operation.into(),
            path,
        }
    }
}

/// Shorthand for results of storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
