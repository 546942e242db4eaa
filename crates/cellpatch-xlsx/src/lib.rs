//! # cellpatch-xlsx
//!
//! In-place editing of XLSX (Office Open XML) workbooks.
//!
//! A workbook is opened into an [`XlsxSession`]. Reads and writes parse only
//! the parts they need; saving rewrites the parts that changed and copies every
//! other member of the package byte for byte.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cellpatch_core::{Color, FormatSpec};
//! use cellpatch_xlsx::{WriteInput, XlsxSession};
//!
//! let mut session = XlsxSession::open("report.xlsx")?;
//! let sheet = session.sheet_names()[0].clone();
//!
//! session.write_values(&sheet, "A1:B1", &WriteInput::from_json(&serde_json::json!(["Name", 42])))?;
//! session.apply_format(&sheet, "A1:B1", &FormatSpec::new().bold(true).background(Color::rgb(255, 255, 0)))?;
//! session.save()?;
//! # Ok::<(), cellpatch_xlsx::XlsxError>(())
//! ```

pub mod content_types;
pub mod error;
pub mod package;
pub mod part_cache;
pub mod relationships;
pub mod session;
pub mod shared_strings;
pub mod styles;
pub mod workbook;
pub mod worksheet;
pub mod xml;

pub use error::{XlsxError, XlsxResult};
pub use package::Package;
pub use session::{WriteInput, XlsxSession};
pub use styles::{StyleCounts, StyleSheet};
pub use workbook::{SheetEntry, SheetKind, WorkbookIndex};
