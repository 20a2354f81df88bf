// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for swathcodec.
//!
//! Errors are grouped the way callers react to them:
//! - configuration errors detected while opening a session
//! - resource errors (allocation, file system) during opening
//! - stream errors while reading or writing pings
//! - capability gaps of a particular format
//!
//! Advisory conditions (time gap, out of bounds, speed too low) are not
//! errors; they travel inside a successful read status, see
//! [`Advisory`](crate::io::filter::Advisory).

use serde::Serialize;
use thiserror::Error;

/// Status codes surfaced across the session boundary.
///
/// Every [`SwathError`] and every advisory maps onto exactly one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Success,
    EndOfFile,
    Unintelligible,
    TimeGap,
    OutOfTime,
    OutOfBounds,
    SpeedTooLow,
    ResourceExhausted,
    OpenFailed,
    WriteFailed,
    Unsupported,
    UnknownFormat,
    UseAfterClose,
    BadParameter,
    IoFailure,
    NoFix,
}

impl StatusCode {
    /// Whether this code is an advisory a caller may ignore.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            StatusCode::TimeGap
                | StatusCode::OutOfTime
                | StatusCode::OutOfBounds
                | StatusCode::SpeedTooLow
        )
    }

    /// Short lowercase name, stable for machine-readable output.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::EndOfFile => "end_of_file",
            StatusCode::Unintelligible => "unintelligible",
            StatusCode::TimeGap => "time_gap",
            StatusCode::OutOfTime => "out_of_time",
            StatusCode::OutOfBounds => "out_of_bounds",
            StatusCode::SpeedTooLow => "speed_too_low",
            StatusCode::ResourceExhausted => "resource_exhausted",
            StatusCode::OpenFailed => "open_failed",
            StatusCode::WriteFailed => "write_failed",
            StatusCode::Unsupported => "unsupported",
            StatusCode::UnknownFormat => "unknown_format",
            StatusCode::UseAfterClose => "use_after_close",
            StatusCode::BadParameter => "bad_parameter",
            StatusCode::IoFailure => "io_failure",
            StatusCode::NoFix => "no_fix",
        }
    }
}

/// Errors that can occur while opening, reading or writing a swath session.
#[derive(Debug, Clone, Error)]
pub enum SwathError {
    /// The stream has no more records.
    #[error("End of file")]
    EndOfFile,

    /// A record is present but fails structural validation.
    #[error("Unintelligible {format} record: {reason}")]
    Unintelligible {
        /// Format name that rejected the record
        format: String,
        /// Why the record was rejected
        reason: String,
    },

    /// Underlying stream failure while reading.
    #[error("I/O failure: {0}")]
    Io(String),

    /// A session parameter is out of range.
    #[error("Bad parameter '{parameter}': {reason}")]
    BadParameter {
        /// Parameter name
        parameter: String,
        /// Validation failure
        reason: String,
    },

    /// Memory for buffers or codec state could not be obtained.
    #[error("Resource exhausted: {what}")]
    ResourceExhausted {
        /// What was being allocated
        what: String,
    },

    /// Opening a session failed; `cause` is the originating error.
    #[error("Failed to open '{path}': {cause}")]
    OpenFailed {
        /// Path (or stream label) being opened
        path: String,
        /// Originating cause
        cause: Box<SwathError>,
    },

    /// Serializing a record to the stream failed.
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// Failure description
        reason: String,
    },

    /// The format does not provide an optional capability.
    #[error("Unsupported capability: '{capability}'")]
    Unsupported {
        /// Capability name
        capability: String,
    },

    /// No format is registered under the identifier.
    #[error("Unknown format id {format_id}")]
    UnknownFormat {
        /// Requested format id
        format_id: i32,
    },

    /// An operation was attempted on a closed session.
    #[error("Session used after close: {operation}")]
    UseAfterClose {
        /// Operation that was attempted
        operation: String,
    },

    /// Interpolation was requested from an empty fix store.
    #[error("No {signal} fixes available")]
    NoFix {
        /// Signal class (position, heading, attitude)
        signal: String,
    },
}

impl SwathError {
    /// Create an unintelligible-record error.
    pub fn unintelligible(format: impl Into<String>, reason: impl Into<String>) -> Self {
        SwathError::Unintelligible {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Create a bad-parameter error.
    pub fn bad_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        SwathError::BadParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Create a resource-exhausted error.
    pub fn resource_exhausted(what: impl Into<String>) -> Self {
        SwathError::ResourceExhausted { what: what.into() }
    }

    /// Wrap an originating cause into an open failure.
    pub fn open_failed(path: impl Into<String>, cause: SwathError) -> Self {
        SwathError::OpenFailed {
            path: path.into(),
            cause: Box::new(cause),
        }
    }

    /// Create a write-failed error.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        SwathError::WriteFailed {
            reason: reason.into(),
        }
    }

    /// Create an unsupported-capability error.
    pub fn unsupported(capability: impl Into<String>) -> Self {
        SwathError::Unsupported {
            capability: capability.into(),
        }
    }

    /// Create an unknown-format error.
    pub fn unknown_format(format_id: i32) -> Self {
        SwathError::UnknownFormat { format_id }
    }

    /// Create a use-after-close error.
    pub fn use_after_close(operation: impl Into<String>) -> Self {
        SwathError::UseAfterClose {
            operation: operation.into(),
        }
    }

    /// Create a no-fix error.
    pub fn no_fix(signal: impl Into<String>) -> Self {
        SwathError::NoFix {
            signal: signal.into(),
        }
    }

    /// Boundary status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            SwathError::EndOfFile => StatusCode::EndOfFile,
            SwathError::Unintelligible { .. } => StatusCode::Unintelligible,
            SwathError::Io(_) => StatusCode::IoFailure,
            SwathError::BadParameter { .. } => StatusCode::BadParameter,
            SwathError::ResourceExhausted { .. } => StatusCode::ResourceExhausted,
            SwathError::OpenFailed { .. } => StatusCode::OpenFailed,
            SwathError::WriteFailed { .. } => StatusCode::WriteFailed,
            SwathError::Unsupported { .. } => StatusCode::Unsupported,
            SwathError::UnknownFormat { .. } => StatusCode::UnknownFormat,
            SwathError::UseAfterClose { .. } => StatusCode::UseAfterClose,
            SwathError::NoFix { .. } => StatusCode::NoFix,
        }
    }

    /// The innermost cause of an open failure, or `self`.
    pub fn root_cause(&self) -> &SwathError {
        match self {
            SwathError::OpenFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Whether a read loop must stop after this error.
    ///
    /// `Unintelligible` is the only stream error a caller may skip past.
    pub fn is_fatal_to_stream(&self) -> bool {
        !matches!(self, SwathError::Unintelligible { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("status", self.status().as_str().to_string())];
        match self {
            SwathError::EndOfFile => {}
            SwathError::Unintelligible { format, reason } => {
                fields.push(("format", format.clone()));
                fields.push(("reason", reason.clone()));
            }
            SwathError::Io(message) => fields.push(("message", message.clone())),
            SwathError::BadParameter { parameter, reason } => {
                fields.push(("parameter", parameter.clone()));
                fields.push(("reason", reason.clone()));
            }
            SwathError::ResourceExhausted { what } => fields.push(("what", what.clone())),
            SwathError::OpenFailed { path, cause } => {
                fields.push(("path", path.clone()));
                fields.push(("cause", cause.to_string()));
            }
            SwathError::WriteFailed { reason } => fields.push(("reason", reason.clone())),
            SwathError::Unsupported { capability } => {
                fields.push(("capability", capability.clone()))
            }
            SwathError::UnknownFormat { format_id } => {
                fields.push(("format_id", format_id.to_string()))
            }
            SwathError::UseAfterClose { operation } => {
                fields.push(("operation", operation.clone()))
            }
            SwathError::NoFix { signal } => fields.push(("signal", signal.clone())),
        }
        fields
    }
}

impl From<std::io::Error> for SwathError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => SwathError::EndOfFile,
            std::io::ErrorKind::OutOfMemory => SwathError::resource_exhausted(err.to_string()),
            _ => SwathError::Io(err.to_string()),
        }
    }
}

impl From<std::collections::TryReserveError> for SwathError {
    fn from(err: std::collections::TryReserveError) -> Self {
        SwathError::resource_exhausted(err.to_string())
    }
}

/// Result type for swathcodec operations.
pub type Result<T> = std::result::Result<T, SwathError>;
