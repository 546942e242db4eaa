//! Error types for cellpatch-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cellpatch-core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Malformed A1-style cell reference
    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    /// Malformed range, or a range too large to materialize
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),

    /// Row number out of bounds (1-based)
    #[error("Row {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column number out of bounds (1-based)
    #[error("Column {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u32, u32),

    /// A format specification value was rejected
    #[error("Invalid format spec: {0}")]
    InvalidFormatSpec(String),

    /// A value that cannot be stored in a cell
    #[error("Invalid cell value: {0}")]
    InvalidValue(String),
}

impl Error {
    /// Shorthand for an [`Error::InvalidFormatSpec`]
    pub fn format_spec<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormatSpec(msg.into())
    }

    /// True for the reference/range family of errors
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidReference(_)
                | Error::InvalidRange(_)
                | Error::RowOutOfBounds(..)
                | Error::ColumnOutOfBounds(..)
        )
    }
}
