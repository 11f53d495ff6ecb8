//! # Error Types
//!
//! Structured error types for rebar_core. A drafting run either produces a
//! complete, consistent set of primitives or fails with one of these errors;
//! there is no degraded output mode.
//!
//! ## Example
//!
//! ```rust
//! use rebar_core::errors::{DraftError, DraftResult};
//!
//! fn validate_height(height_mm: u32) -> DraftResult<()> {
//!     if !(100..=1500).contains(&height_mm) {
//!         return Err(DraftError::configuration(
//!             "height_mm",
//!             height_mm.to_string(),
//!             "must lie within 100..=1500 mm",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_height(50).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for rebar_core operations
pub type DraftResult<T> = Result<T, DraftError>;

/// Structured error type for drafting operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum DraftError {
    /// A beam parameter is out of range, malformed, or inconsistent with
    /// another parameter. Raised before any geometry is built.
    #[error("Invalid configuration for '{field}': {value} - {reason}")]
    Configuration {
        field: String,
        value: String,
        reason: String,
    },

    /// The dimension points produced by the stirrup layout do not match any
    /// known dimension chain
    #[error("Unhandled stirrup spacing pattern: {points:?} (left zone: {left_zone}, right zone: {right_zone})")]
    UnhandledSpacingPattern {
        points: Vec<f64>,
        left_zone: bool,
        right_zone: bool,
    },

    /// The drawing sink rejected a primitive or definition
    #[error("Drawing sink failed during {operation}: {reason}")]
    SinkFailure { operation: String, reason: String },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DraftError {
    /// Create a Configuration error
    pub fn configuration(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        DraftError::Configuration {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnhandledSpacingPattern error
    pub fn unhandled_pattern(points: &[f64], left_zone: bool, right_zone: bool) -> Self {
        DraftError::UnhandledSpacingPattern {
            points: points.to_vec(),
            left_zone,
            right_zone,
        }
    }

    /// Create a SinkFailure error
    pub fn sink_failure(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        DraftError::SinkFailure {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        DraftError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(path: impl Into<String>, locked_by: impl Into<String>, locked_at: impl Into<String>) -> Self {
        DraftError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DraftError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            DraftError::Configuration { .. } => "CONFIGURATION_ERROR",
            DraftError::UnhandledSpacingPattern { .. } => "UNHANDLED_SPACING_PATTERN",
            DraftError::SinkFailure { .. } => "SINK_FAILURE",
            DraftError::FileError { .. } => "FILE_ERROR",
            DraftError::FileLocked { .. } => "FILE_LOCKED",
            DraftError::SerializationError { .. } => "SERIALIZATION_ERROR",
            DraftError::VersionMismatch { .. } => "VERSION_MISMATCH",
            DraftError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

impl From<serde_json::Error> for DraftError {
    fn from(e: serde_json::Error) -> Self {
        DraftError::SerializationError { reason: e.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = DraftError::configuration("span_mm", "120", "must lie within 300..=15000 mm");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"Configuration\""));
        let roundtrip: DraftError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DraftError::sink_failure("add_polyline", "closed").error_code(), "SINK_FAILURE");
        assert_eq!(
            DraftError::unhandled_pattern(&[0.0, 1000.0, 2000.0], true, true).error_code(),
            "UNHANDLED_SPACING_PATTERN"
        );
    }

    #[test]
    fn test_only_lock_errors_are_recoverable() {
        assert!(DraftError::file_locked("a.rbp", "someone", "now").is_recoverable());
        assert!(!DraftError::configuration("name", "", "empty").is_recoverable());
        assert!(!DraftError::sink_failure("persist", "disk full").is_recoverable());
    }

    #[test]
    fn test_unhandled_pattern_message_lists_points() {
        let error = DraftError::unhandled_pattern(&[0.0, 1000.0, 2000.0], true, true);
        let message = error.to_string();
        assert!(message.contains("1000.0"));
        assert!(message.contains("left zone: true"));
    }
}
