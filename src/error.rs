//! Custom error types for shelf
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for shelf operations
#[derive(Error, Debug)]
pub enum ShelfError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The remote backup store could not be reached or answered with an error
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A book cannot be lent because it already has an open loan
    #[error("Book is already on loan: {0}")]
    OnLoan(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ShelfError {
    /// Create a "not found" error for readers
    pub fn reader_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Reader",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for books
    pub fn book_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Book",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for loans
    pub fn loan_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Loan",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for backup snapshots
    pub fn snapshot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Snapshot",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a remote availability error
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for ShelfError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias for shelf operations
pub type ShelfResult<T> = Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShelfError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = ShelfError::snapshot_not_found("backup_2024_03_20_08_00_00.db");
        assert_eq!(
            err.to_string(),
            "Snapshot not found: backup_2024_03_20_08_00_00.db"
        );
        assert!(err.is_not_found());
        assert!(!err.is_remote_unavailable());
    }

    #[test]
    fn test_remote_unavailable_error() {
        let err = ShelfError::RemoteUnavailable("connection refused".into());
        assert_eq!(err.to_string(), "Remote store unavailable: connection refused");
        assert!(err.is_remote_unavailable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let shelf_err: ShelfError = io_err.into();
        assert!(matches!(shelf_err, ShelfError::Io(_)));
    }
}
