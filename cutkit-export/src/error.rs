//! Error types for cutkit-export
//!
//! Template and validation errors are recovered inside the naming layer by
//! switching to the fallback template. Filesystem errors are surfaced to the
//! caller once the retry budget (if any) is spent. Raw OS codes only appear
//! as a diagnostic suffix in the rendered message.

use crate::fsops::retry::ErrorCode;
use std::path::PathBuf;
use thiserror::Error;

/// Template evaluation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Malformed placeholder expression
    #[error("Template syntax error at offset {pos}: {message}")]
    Syntax { pos: usize, message: String },

    /// Placeholder references a name outside the naming context
    #[error("Unknown template variable: {0}")]
    UnknownVariable(String),

    /// Placeholder evaluated to something other than a string or number
    #[error("Template expression `{0}` does not evaluate to a string")]
    NotAString(String),

    /// Property access or concatenation applied to an unsupported value
    #[error("Invalid operand in template expression `{0}`")]
    InvalidOperand(String),
}

/// First problem found in a set of candidate output names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No input file path")]
    NoInputPath,

    #[error("At least one resulting file name has no length")]
    EmptyName,

    #[error("At least one resulting file name contains invalid character(s): {name}")]
    InvalidCharacters { name: String },

    #[error("At least one resulting file name is the same as the input path: {name}")]
    SameAsInput { name: String },

    #[error("At least one resulting file name ends with a whitespace character or a dot: {name}")]
    TrailingDotOrWhitespace { name: String },

    #[error("At least one resulting file will have a too long path ({length} characters): {name}")]
    PathTooLong { name: String, length: usize },

    #[error("Output file name template results in duplicate file names: {name}")]
    DuplicateNames { name: String },
}

/// Filesystem operation failure
#[derive(Debug, Error)]
pub enum FsError {
    /// Transient failure that persisted through the whole retry budget
    #[error("Failed to {operation} after {attempts} attempts ({code}): {source}")]
    OperationFailed {
        operation: String,
        attempts: u32,
        code: ErrorCode,
        #[source]
        source: std::io::Error,
    },

    /// Failure that is not worth retrying
    #[error("Failed to {operation} ({code}): {source}")]
    Permanent {
        operation: String,
        code: ErrorCode,
        #[source]
        source: std::io::Error,
    },

    /// Aborted through the cancellation token
    #[error("Cancelled: {operation}")]
    Cancelled { operation: String },

    /// Scan or reconstruction found nothing usable
    #[error("No usable files found: {0}")]
    EmptyResult(String),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Plain I/O failure outside the retry layer
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FsError::Io {
            path: path.into(),
            source,
        }
    }
}
