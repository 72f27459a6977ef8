//! Custom error types for audit-trail
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Audit failures get their own variant so a
//! caller can tell "the business operation failed" apart from "the business
//! operation succeeded but could not be audited and was rolled back".

use thiserror::Error;

/// Why an audit write could not be completed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditFailure {
    /// The event payload could not be produced
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// The event store rejected the append after all retries
    #[error("event store append failed: {0}")]
    Append(String),

    /// An update or delete succeeded but no pre-state was captured
    #[error("no pre-state snapshot was captured for entity {0}")]
    MissingSnapshot(i64),
}

/// The main error type for audit-trail operations
#[derive(Error, Debug)]
pub enum TrailError {
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

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Optimistic concurrency check failed
    #[error("{entity_type} {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        entity_type: &'static str,
        id: i64,
        expected: i32,
        actual: i32,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// The business change succeeded but its audit event could not be written
    #[error("Audit of {operation} failed, change rolled back: {reason}")]
    AuditFailed {
        operation: String,
        reason: AuditFailure,
    },
}

impl TrailError {
    /// Create a "not found" error for any entity type
    pub fn not_found(entity_type: &'static str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            identifier: identifier.to_string(),
        }
    }

    /// Create an audit failure for the given operation
    pub fn audit_failed(operation: impl ToString, reason: AuditFailure) -> Self {
        Self::AuditFailed {
            operation: operation.to_string(),
            reason,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if the business operation succeeded but its audit was rejected
    pub fn is_audit_failure(&self) -> bool {
        matches!(self, Self::AuditFailed { .. })
    }

    /// Errors worth retrying: plain I/O hiccups on the append path
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for TrailError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TrailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit-trail operations
pub type TrailResult<T> = Result<T, TrailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrailError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TrailError::not_found("EMPLOYEE", 42);
        assert_eq!(err.to_string(), "EMPLOYEE not found: 42");
        assert!(err.is_not_found());
        assert!(!err.is_audit_failure());
    }

    #[test]
    fn test_audit_failure_is_distinguishable() {
        let err = TrailError::audit_failed(
            "UPDATE HR/EMPLOYEE",
            AuditFailure::Append("disk full".into()),
        );
        assert!(err.is_audit_failure());
        assert_eq!(
            err.to_string(),
            "Audit of UPDATE HR/EMPLOYEE failed, change rolled back: event store append failed: disk full"
        );
    }

    #[test]
    fn test_version_conflict_display() {
        let err = TrailError::VersionConflict {
            entity_type: "EMPLOYEE",
            id: 7,
            expected: 2,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "EMPLOYEE 7 was modified concurrently: expected version 2, found 3"
        );
    }

    #[test]
    fn test_from_io_error_is_transient() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted");
        let err: TrailError = io_err.into();
        assert!(matches!(err, TrailError::Io(_)));
        assert!(err.is_transient());
    }
}
