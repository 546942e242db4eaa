//! # cellpatch-core
//!
//! Core types for the cellpatch workbook editor.
//!
//! This crate holds everything that does not need a package on disk:
//! - [`CellAddress`] and [`CellRange`] - A1 references and rectangular spans
//! - [`CellValue`] - Values read from and written to cells
//! - [`FormatSpec`] and [`CellFormat`] - Formatting requests and read-back
//! - [`InternPool`] - The deduplicating table behind shared strings and styles
//!
//! ## Example
//!
//! ```rust
//! use cellpatch_core::{column_letter_to_number, parse_range, number_to_column_letter};
//!
//! assert_eq!(column_letter_to_number("AA").unwrap(), 27);
//! assert_eq!(number_to_column_letter(28).unwrap(), "AB");
//!
//! let range = parse_range("B2:D5").unwrap();
//! assert_eq!((range.row_count(), range.col_count()), (4, 3));
//! ```

pub mod cell;
pub mod error;
pub mod style;

// Re-exports for convenience
pub use cell::{
    column_letter_to_number, format_reference, number_to_column_letter, parse_cell_reference,
    parse_range, CellAddress, CellRange, CellValue,
};
pub use error::{Error, Result};
pub use style::{
    Background, BorderLineStyle, BorderPosition, BorderSide, BorderSpec, CellFormat, Color,
    FormatSpec, HorizontalAlignment, InternPool, NumberFormat, VerticalAlignment,
};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;

/// Largest range a single read or write will materialize
pub const MAX_RANGE_CELLS: u64 = 10_000_000;
