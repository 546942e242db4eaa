//! XLSX error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while opening, editing or saving a package
#[derive(Debug, Error)]
pub enum XlsxError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook path does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// ZIP error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Invalid file format
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// Missing required part
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// Malformed XML in a package part
    #[error("XML error in {part}: {message}")]
    Xml { part: String, message: String },

    /// No sheet with this exact name
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// The sheet is a chartsheet, dialog sheet or macro sheet
    #[error("Sheet '{0}' is not a worksheet")]
    NotAWorksheet(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] cellpatch_core::Error),
}

impl XlsxError {
    pub(crate) fn xml<E: std::fmt::Display>(part: &str, err: E) -> Self {
        XlsxError::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }

    /// File missing, not a ZIP, or lacking essential parts
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            XlsxError::NotFound(_)
                | XlsxError::Zip(_)
                | XlsxError::InvalidFormat(_)
                | XlsxError::MissingPart(_)
        )
    }
}
