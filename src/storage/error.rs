//! Storage error type with conflict/not-found discrimination.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// No row for the given key.
    NotFound,
    /// Unique-constraint violation on create.
    Conflict,
    /// Anything else (connection, serialization, etc).
    Other,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
    pub is_retryable: bool,
}

impl StorageError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: StorageErrorKind::NotFound,
            message: message.into(),
            is_retryable: false,
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: StorageErrorKind::Conflict,
            message: message.into(),
            is_retryable: false,
        }
    }

    pub fn other(message: impl Into<String>, is_retryable: bool) -> Self {
        Self {
            kind: StorageErrorKind::Other,
            message: message.into(),
            is_retryable,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StorageErrorKind::Conflict
    }

    /// Map an sqlx error onto the storage taxonomy.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::not_found("row not found"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::conflict(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => Self::other(err.to_string(), true),
            _ => Self::other(err.to_string(), false),
        }
    }
}

impl From<StorageError> for crate::error::AdapterError {
    fn from(err: StorageError) -> Self {
        use crate::error::{AdapterError, AdapterErrorKind};

        AdapterError::new(AdapterErrorKind::Storage {
            message: err.message,
            is_retryable: err.is_retryable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_conflict_are_distinct() {
        let nf = StorageError::not_found("missing");
        let cf = StorageError::conflict("duplicate key");
        assert!(nf.is_not_found() && !nf.is_conflict());
        assert!(cf.is_conflict() && !cf.is_not_found());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = StorageError::from_sqlx(sqlx::Error::RowNotFound);
        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(!err.is_retryable);
    }
}
