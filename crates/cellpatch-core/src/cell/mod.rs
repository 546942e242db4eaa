//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - the free reference functions used by the workbook layer

mod address;
mod value;

pub use address::{
    column_letter_to_number, format_reference, number_to_column_letter, parse_cell_reference,
    parse_range, CellAddress, CellRange, CellRangeIterator,
};
pub use value::{CellValue, ERROR_MARKER_PREFIX};
