//! # Error Types
//!
//! Structured error types for flange_core. Errors carry enough context for
//! a field technician (or a calling tool) to see which input or file caused
//! the problem.
//!
//! Note that a missing *lookup* (no TPI for a diameter, no allowable stress
//! at a temperature) is not an error: the calculation functions return
//! `Option` and the form evaluation turns gaps into validation messages.
//! `FlangeError` is for things that stop an operation outright.
//!
//! ## Example
//!
//! ```rust
//! use flange_core::errors::{FlangeError, FlangeResult};
//!
//! fn validate_bolt_count(count: u32) -> FlangeResult<()> {
//!     if count % 2 != 0 {
//!         return Err(FlangeError::invalid_input(
//!             "bolt_holes",
//!             count.to_string(),
//!             "Bolt count must be even",
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for flange_core operations
pub type FlangeResult<T> = Result<T, FlangeError>;

/// Structured error type for flange_core operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum FlangeError {
    /// An input value is invalid (out of range, unparseable, etc.)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// Blank required field (job number, ...)
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Bolt grade, nut grade, lubricant or gasket not recognised
    #[error("Unknown {kind}: {name}")]
    UnknownCatalogEntry { kind: String, name: String },

    /// A job or flange form id does not exist in the job book
    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: String, id: String },

    /// Reference data could not be parsed
    #[error("Reference data error in {source_name}: {reason}")]
    ReferenceData { source_name: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// `jobs.json` is being edited elsewhere
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// `jobs.json` written by an incompatible release
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Report rendering failed
    #[error("Report error: {reason}")]
    ReportError { reason: String },
}

impl FlangeError {
    /// Value present but unusable
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FlangeError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Required field left blank
    pub fn missing_field(field: impl Into<String>) -> Self {
        FlangeError::MissingField {
            field: field.into(),
        }
    }

    /// Create an UnknownCatalogEntry error
    pub fn unknown(kind: impl Into<String>, name: impl Into<String>) -> Self {
        FlangeError::UnknownCatalogEntry {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a RecordNotFound error
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        FlangeError::RecordNotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FlangeError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Lock held by someone else
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        FlangeError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError from any displayable cause
    pub fn serialization(reason: impl std::fmt::Display) -> Self {
        FlangeError::SerializationError {
            reason: reason.to_string(),
        }
    }

    /// Lock conflicts clear once the other user closes the book
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FlangeError::FileLocked { .. })
    }

    /// Stable code for `--json` output and tests
    pub fn error_code(&self) -> &'static str {
        match self {
            FlangeError::InvalidInput { .. } => "INVALID_INPUT",
            FlangeError::MissingField { .. } => "MISSING_FIELD",
            FlangeError::UnknownCatalogEntry { .. } => "UNKNOWN_CATALOG_ENTRY",
            FlangeError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            FlangeError::ReferenceData { .. } => "REFERENCE_DATA",
            FlangeError::FileError { .. } => "FILE_ERROR",
            FlangeError::FileLocked { .. } => "FILE_LOCKED",
            FlangeError::SerializationError { .. } => "SERIALIZATION_ERROR",
            FlangeError::VersionMismatch { .. } => "VERSION_MISMATCH",
            FlangeError::ReportError { .. } => "REPORT_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = FlangeError::invalid_input("bolt_holes", "7", "Bolt count must be even");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidInput\""));
        let roundtrip: FlangeError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FlangeError::missing_field("job_number").error_code(), "MISSING_FIELD");
        assert_eq!(FlangeError::unknown("bolt grade", "A999").error_code(), "UNKNOWN_CATALOG_ENTRY");
        assert_eq!(FlangeError::not_found("Job", "abc").error_code(), "RECORD_NOT_FOUND");
    }

    #[test]
    fn test_only_locks_are_recoverable() {
        assert!(FlangeError::file_locked("jobs.json", "tech", "now").is_recoverable());
        assert!(!FlangeError::serialization("bad json").is_recoverable());
    }

    #[test]
    fn test_display_mentions_context() {
        let err = FlangeError::not_found("Flange form", "1234");
        assert_eq!(err.to_string(), "Flange form not found: 1234");
    }
}
