//! Cell styling vocabulary
//!
//! This module contains the types shared by format requests and read-back:
//! - [`FormatSpec`] - Requested formatting for a range
//! - [`CellFormat`] - Formatting reported for one cell
//! - [`Color`], [`BorderLineStyle`], [`HorizontalAlignment`], [`NumberFormat`]
//! - [`InternPool`] - Deduplicating table used for strings and style records

mod alignment;
mod border;
mod color;
mod format;
mod number_format;
mod pool;

pub use alignment::{HorizontalAlignment, VerticalAlignment};
pub use border::{BorderLineStyle, BorderPosition, BorderSide, BorderSpec};
pub use color::Color;
pub use format::{Background, CellFormat, FormatSpec, FORMAT_SPEC_KEYS, MAX_FONT_SIZE};
pub use number_format::{NumberFormat, FIRST_CUSTOM_NUM_FMT_ID};
pub use pool::InternPool;
