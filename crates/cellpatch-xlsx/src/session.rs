//! Editing session over one workbook file
//!
//! [`XlsxSession`] owns the package and every part parsed from it. Parts are
//! parsed on first use; on save only the dirty ones are serialized, every
//! other member keeps its original bytes.

use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use cellpatch_core::{
    BorderSide, BorderSpec, CellFormat, CellRange, CellValue, Error as CoreError, FormatSpec,
    MAX_RANGE_CELLS,
};
use serde_json::Value as JsonValue;

use crate::content_types::{ContentTypes, CT_SHARED_STRINGS, CT_STYLES};
use crate::error::{XlsxError, XlsxResult};
use crate::package::{Package, CONTENT_TYPES_PART};
use crate::part_cache::{CachedPart, PartCache};
use crate::relationships::{
    rel_types, relative_target, resolve_target, Relationships, REL_BASE_STRICT,
    REL_BASE_TRANSITIONAL,
};
use crate::shared_strings::{SharedStrings, DEFAULT_SHARED_STRINGS_PART};
use crate::styles::{StyleCounts, StyleSheet, DEFAULT_STYLES_PART};
use crate::workbook::WorkbookIndex;
use crate::worksheet::{StoredValue, Worksheet};

/// Values accepted by [`XlsxSession::write_values`]
///
/// The shape decides how values are laid over the target range; see
/// [`WriteInput::cells_for`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteInput {
    /// One value for the top-left cell
    Scalar(CellValue),
    /// A flat list
    Row(Vec<CellValue>),
    /// Row-major rows
    Grid(Vec<Vec<CellValue>>),
}

impl WriteInput {
    /// Classify a JSON value: a list of lists is a grid, any other list a row
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Array(items) if items.first().map(JsonValue::is_array).unwrap_or(false) => {
                WriteInput::Grid(
                    items
                        .iter()
                        .map(|row| match row {
                            JsonValue::Array(cells) => cells.iter().map(CellValue::from_json).collect(),
                            other => vec![CellValue::from_json(other)],
                        })
                        .collect(),
                )
            }
            JsonValue::Array(items) => {
                WriteInput::Row(items.iter().map(CellValue::from_json).collect())
            }
            other => WriteInput::Scalar(CellValue::from_json(other)),
        }
    }

    fn values(&self) -> Box<dyn Iterator<Item = &CellValue> + '_> {
        match self {
            WriteInput::Scalar(v) => Box::new(std::iter::once(v)),
            WriteInput::Row(row) => Box::new(row.iter()),
            WriteInput::Grid(rows) => Box::new(rows.iter().flatten()),
        }
    }

    /// Reject values a worksheet cannot hold
    pub fn validate(&self) -> Result<(), CoreError> {
        self.values().try_for_each(CellValue::validate)
    }

    /// Values placed on a `rows` x `cols` target, as 0-based (row, col) offsets
    ///
    /// A flat list runs down a single-column target and across any other; on a
    /// multi-row, multi-column target it is repeated on every row. Input larger
    /// than the target is clipped, never wrapped.
    pub fn cells_for(&self, rows: u32, cols: u32) -> Vec<(u32, u32, &CellValue)> {
        let mut out = Vec::new();
        match self {
            WriteInput::Scalar(v) => out.push((0, 0, v)),
            WriteInput::Row(items) if rows > 1 && cols == 1 => {
                out.extend(items.iter().take(rows as usize).enumerate().map(|(r, v)| (r as u32, 0, v)));
            }
            WriteInput::Row(items) => {
                for r in 0..rows {
                    out.extend(items.iter().take(cols as usize).enumerate().map(|(c, v)| (r, c as u32, v)));
                }
            }
            WriteInput::Grid(grid) => {
                for (r, row) in grid.iter().take(rows as usize).enumerate() {
                    out.extend(
                        row.iter()
                            .take(cols as usize)
                            .enumerate()
                            .map(|(c, v)| (r as u32, c as u32, v)),
                    );
                }
            }
        }
        out
    }
}

impl From<CellValue> for WriteInput {
    fn from(value: CellValue) -> Self {
        WriteInput::Scalar(value)
    }
}

impl From<Vec<CellValue>> for WriteInput {
    fn from(row: Vec<CellValue>) -> Self {
        WriteInput::Row(row)
    }
}

impl From<Vec<Vec<CellValue>>> for WriteInput {
    fn from(grid: Vec<Vec<CellValue>>) -> Self {
        WriteInput::Grid(grid)
    }
}

/// A workbook-level part the session may have to create
#[derive(Debug)]
struct WorkbookPart<T> {
    path: String,
    cached: CachedPart<T>,
    /// Not yet in the content types or workbook relationships
    created: bool,
}

impl<T> WorkbookPart<T> {
    fn loaded(path: String, value: T) -> Self {
        Self {
            path,
            cached: CachedPart::clean(value),
            created: false,
        }
    }

    /// A member found at its conventional path with no workbook relationship
    fn unrelated(path: String, value: T) -> Self {
        Self {
            path,
            cached: CachedPart::clean(value),
            created: true,
        }
    }

    fn needs_registration(&self) -> bool {
        self.created && self.cached.dirty
    }

    fn created(path: &str, value: T) -> Self {
        let mut cached = CachedPart::clean(value);
        cached.mark_dirty();
        Self {
            path: path.to_string(),
            cached,
            created: true,
        }
    }
}

/// An open workbook
#[derive(Debug)]
pub struct XlsxSession {
    path: PathBuf,
    package: Package,
    workbook: WorkbookIndex,
    worksheets: PartCache<Worksheet>,
    shared_strings: Option<WorkbookPart<SharedStrings>>,
    shared_strings_probed: bool,
    styles: Option<WorkbookPart<StyleSheet>>,
    styles_probed: bool,
    /// A write removed a formula, so the calculation chain is stale
    calc_chain_stale: bool,
}

/// Parse a range reference and enforce the per-call cell limit
fn checked_range(range_ref: &str) -> XlsxResult<CellRange> {
    let range = CellRange::parse(range_ref)?;
    if range.cell_count() > MAX_RANGE_CELLS {
        return Err(CoreError::InvalidRange(format!(
            "{} covers {} cells, more than the limit of {}",
            range_ref,
            range.cell_count(),
            MAX_RANGE_CELLS
        ))
        .into());
    }
    Ok(range)
}

impl XlsxSession {
    /// Load a workbook and index its sheets
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        let path = path.as_ref().to_path_buf();
        let package = Package::open(&path)?;
        Self::from_package(path, package)
    }

    fn from_package(path: PathBuf, package: Package) -> XlsxResult<Self> {
        let workbook = WorkbookIndex::load(&package)?;
        log::info!(
            "opened {} ({} parts, {} sheets)",
            path.display(),
            package.parts().len(),
            workbook.sheets().len()
        );
        Ok(Self {
            path,
            package,
            workbook,
            worksheets: PartCache::new(),
            shared_strings: None,
            shared_strings_probed: false,
            styles: None,
            styles_probed: false,
            calc_chain_stale: false,
        })
    }

    /// File the session saves to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.list_sheets()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Whether any part has unsaved changes
    pub fn is_modified(&self) -> bool {
        self.worksheets.any_dirty()
            || self.shared_strings.as_ref().map(|p| p.cached.dirty).unwrap_or(false)
            || self.styles.as_ref().map(|p| p.cached.dirty).unwrap_or(false)
    }

    /// Record counts of the stylesheet, if the workbook has one
    pub fn style_counts(&mut self) -> XlsxResult<Option<StyleCounts>> {
        self.load_styles()?;
        Ok(self.styles.as_ref().map(|s| s.cached.value.counts()))
    }

    /// Number of entries in the shared string table
    pub fn shared_string_count(&mut self) -> XlsxResult<usize> {
        self.load_shared_strings()?;
        Ok(self
            .shared_strings
            .as_ref()
            .map(|s| s.cached.value.len())
            .unwrap_or(0))
    }

    /// Row-major values of a range; missing cells are [`CellValue::Empty`]
    pub fn read_values(&mut self, sheet: &str, range_ref: &str) -> XlsxResult<Vec<Vec<CellValue>>> {
        let range = checked_range(range_ref)?;
        let part = self.load_worksheet(sheet)?;
        self.load_shared_strings()?;

        let worksheet = self.worksheet(&part)?;
        let strings = self.shared_strings.as_ref().map(|s| &s.cached.value);
        Ok(worksheet.read_range(&range, strings))
    }

    /// Formatting of every styled cell in a range that has non-default properties
    pub fn read_formats(&mut self, sheet: &str, range_ref: &str) -> XlsxResult<Vec<CellFormat>> {
        let range = checked_range(range_ref)?;
        let part = self.load_worksheet(sheet)?;
        self.load_styles()?;

        let worksheet = self.worksheet(&part)?;
        let Some(styles) = self.styles.as_ref().map(|s| &s.cached.value) else {
            return Ok(Vec::new());
        };

        let mut formats = Vec::new();
        for (addr, xf) in worksheet.styled_cells(&range) {
            let mut format = styles.cell_format(xf);
            if !format.is_empty() {
                format.cell = addr.to_a1_string();
                formats.push(format);
            }
        }
        Ok(formats)
    }

    /// Write values over a range; see [`WriteInput::cells_for`] for shaping
    ///
    /// Everything that can fail is checked before the first cell changes.
    pub fn write_values(
        &mut self,
        sheet: &str,
        range_ref: &str,
        input: &WriteInput,
    ) -> XlsxResult<()> {
        let range = checked_range(range_ref)?;
        input.validate()?;
        let part = self.load_worksheet(sheet)?;

        let cells = input.cells_for(range.row_count(), range.col_count());
        let needs_strings = cells
            .iter()
            .any(|(_, _, v)| matches!(v, CellValue::String(_) | CellValue::Error(_)));
        if needs_strings {
            self.ensure_shared_strings()?;
        }

        let mut planned = Vec::with_capacity(cells.len());
        for (dr, dc, value) in cells {
            let stored = match value {
                CellValue::Empty => StoredValue::Clear,
                CellValue::Boolean(b) => StoredValue::Boolean(*b),
                CellValue::Integer(_) | CellValue::Number(_) => {
                    StoredValue::Number(value.numeric_text().unwrap_or_default())
                }
                CellValue::String(s) | CellValue::Error(s) => {
                    let strings = self.shared_strings_mut()?;
                    let (index, _) = strings.cached.value.intern(s);
                    strings.cached.mark_dirty();
                    StoredValue::SharedString(index)
                }
            };
            planned.push((range.start.row + dr, range.start.col + dc, stored));
        }

        let entry = self.worksheet_entry(&part)?;
        let mut formulas_removed = false;
        for (row, col, stored) in &planned {
            formulas_removed |= entry.value.set_value(*row, *col, stored);
        }
        if !planned.is_empty() {
            entry.mark_dirty();
        }
        if formulas_removed {
            self.calc_chain_stale = true;
        }
        log::debug!("{}!{}: wrote {} cells", sheet, range, planned.len());
        Ok(())
    }

    /// Merge a format request onto the current style of every cell in a range
    pub fn apply_format(&mut self, sheet: &str, range_ref: &str, spec: &FormatSpec) -> XlsxResult<()> {
        let range = checked_range(range_ref)?;
        spec.validate()?;
        let part = self.load_worksheet(sheet)?;
        if spec.is_empty() {
            log::debug!("{}!{}: empty format request", sheet, range);
            return Ok(());
        }
        self.ensure_styles()?;

        let rows = range.row_count();
        let cols = range.col_count();
        let mut assignments = Vec::with_capacity(range.cell_count() as usize);
        {
            let worksheet = self.worksheet(&part)?;
            for addr in range.cells() {
                let edges = spec.border_edges_at(
                    addr.row - range.start.row,
                    addr.col - range.start.col,
                    rows,
                    cols,
                );
                assignments.push((addr, worksheet.style_index(addr.row, addr.col), edges));
            }
        }

        let styles = self.styles_mut()?;
        let mut cache: AHashMap<(u32, Vec<(BorderSide, BorderSpec)>), u32> = AHashMap::new();
        let mut resolved = Vec::with_capacity(assignments.len());
        for (addr, base, edges) in assignments {
            let key = (base, edges.iter().map(|(s, b)| (*s, *b)).collect::<Vec<_>>());
            let xf = match cache.get(&key) {
                Some(&xf) => xf,
                None => {
                    let xf = styles.cached.value.merge(base, spec, &edges);
                    cache.insert(key, xf);
                    xf
                }
            };
            resolved.push((addr, xf));
        }
        if styles.cached.value.take_modified() {
            styles.cached.mark_dirty();
        }

        let entry = self.worksheet_entry(&part)?;
        for (addr, xf) in &resolved {
            entry.value.set_style(addr.row, addr.col, *xf);
        }
        entry.mark_dirty();
        log::debug!(
            "{}!{}: formatted {} cells with {} distinct styles",
            sheet,
            range,
            resolved.len(),
            cache.len()
        );
        Ok(())
    }

    /// Write changes back to the session's file
    pub fn save(&mut self) -> XlsxResult<()> {
        let path = self.path.clone();
        self.save_as(path)
    }

    /// Write changes to `path` and make it the session's file
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> XlsxResult<()> {
        let path = path.as_ref().to_path_buf();
        let written = self.flush()?;
        self.package.save_to(&path)?;
        self.mark_clean();
        log::info!("saved {} ({} parts rewritten)", path.display(), written);
        self.path = path;
        Ok(())
    }

    /// Write the current workbook to any seekable writer
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> XlsxResult<W> {
        self.flush()?;
        self.mark_clean();
        self.package.write_to(writer)
    }

    /// Release the session without saving
    pub fn close(self) {
        log::debug!("closing {}", self.path.display());
    }

    // === Part loading ===

    /// Parse the worksheet behind a sheet name, returning its part path
    fn load_worksheet(&mut self, sheet: &str) -> XlsxResult<String> {
        let part = self.workbook.worksheet_part(sheet)?.to_string();
        let package = &self.package;
        self.worksheets.get_or_load(&part, || {
            let data = package.require(&part)?;
            Worksheet::parse(data, &part)
        })?;
        Ok(part)
    }

    fn worksheet(&self, part: &str) -> XlsxResult<&Worksheet> {
        self.worksheets
            .get(part)
            .map(|e| &e.value)
            .ok_or_else(|| XlsxError::MissingPart(part.to_string()))
    }

    fn worksheet_entry(&mut self, part: &str) -> XlsxResult<&mut CachedPart<Worksheet>> {
        self.worksheets
            .get_mut(part)
            .ok_or_else(|| XlsxError::MissingPart(part.to_string()))
    }

    /// Path of the workbook-level part related with `kind`, if it exists
    fn related_part(&self, kind: &str) -> XlsxResult<Option<String>> {
        let rels_part = self.workbook.workbook_rels_part();
        let Some(data) = self.package.get(&rels_part) else {
            return Ok(None);
        };
        let rels = Relationships::parse(data, &rels_part)?;
        Ok(rels
            .find_kind(kind)
            .map(|rel| resolve_target(self.workbook.workbook_part(), &rel.target))
            .filter(|part| self.package.contains(part)))
    }

    /// `default_part` when the package has it, whatever the relationships say
    fn conventional_part(&self, default_part: &str) -> Option<String> {
        self.package
            .contains(default_part)
            .then(|| default_part.to_string())
    }

    fn load_shared_strings(&mut self) -> XlsxResult<()> {
        if self.shared_strings_probed {
            return Ok(());
        }
        if let Some(part) = self.related_part(rel_types::SHARED_STRINGS)? {
            let table = SharedStrings::parse(self.package.require(&part)?, &part)?;
            self.shared_strings = Some(WorkbookPart::loaded(part, table));
        } else if let Some(part) = self.conventional_part(DEFAULT_SHARED_STRINGS_PART) {
            log::warn!("{} has no workbook relationship, reading it anyway", part);
            let table = SharedStrings::parse(self.package.require(&part)?, &part)?;
            self.shared_strings = Some(WorkbookPart::unrelated(part, table));
        }
        self.shared_strings_probed = true;
        Ok(())
    }

    fn ensure_shared_strings(&mut self) -> XlsxResult<()> {
        self.load_shared_strings()?;
        if self.shared_strings.is_none() {
            let part = self.free_part_name(DEFAULT_SHARED_STRINGS_PART);
            log::info!("creating shared string table {}", part);
            let table = SharedStrings::new_empty(self.workbook.main_namespace());
            self.shared_strings = Some(WorkbookPart::created(&part, table));
        }
        Ok(())
    }

    fn shared_strings_mut(&mut self) -> XlsxResult<&mut WorkbookPart<SharedStrings>> {
        self.shared_strings
            .as_mut()
            .ok_or_else(|| XlsxError::MissingPart(DEFAULT_SHARED_STRINGS_PART.to_string()))
    }

    fn load_styles(&mut self) -> XlsxResult<()> {
        if self.styles_probed {
            return Ok(());
        }
        if let Some(part) = self.related_part(rel_types::STYLES)? {
            let styles = StyleSheet::parse(self.package.require(&part)?, &part)?;
            self.styles = Some(WorkbookPart::loaded(part, styles));
        } else if let Some(part) = self.conventional_part(DEFAULT_STYLES_PART) {
            log::warn!("{} has no workbook relationship, reading it anyway", part);
            let styles = StyleSheet::parse(self.package.require(&part)?, &part)?;
            self.styles = Some(WorkbookPart::unrelated(part, styles));
        }
        self.styles_probed = true;
        Ok(())
    }

    fn ensure_styles(&mut self) -> XlsxResult<()> {
        self.load_styles()?;
        if self.styles.is_none() {
            let part = self.free_part_name(DEFAULT_STYLES_PART);
            log::info!("creating stylesheet {}", part);
            let styles = StyleSheet::minimal(self.workbook.main_namespace())?;
            self.styles = Some(WorkbookPart::created(&part, styles));
        }
        Ok(())
    }

    fn styles_mut(&mut self) -> XlsxResult<&mut WorkbookPart<StyleSheet>> {
        self.styles
            .as_mut()
            .ok_or_else(|| XlsxError::MissingPart(DEFAULT_STYLES_PART.to_string()))
    }

    /// `preferred`, or a numbered variant when an unrelated member already has that name
    fn free_part_name(&self, preferred: &str) -> String {
        if !self.package.contains(preferred) {
            return preferred.to_string();
        }
        let (stem, ext) = preferred.rsplit_once('.').unwrap_or((preferred, "xml"));
        (2..)
            .map(|n| format!("{}{}.{}", stem, n, ext))
            .find(|name| !self.package.contains(name))
            .unwrap_or_else(|| preferred.to_string())
    }

    // === Saving ===

    /// Put every dirty part into the package; returns how many were written
    fn flush(&mut self) -> XlsxResult<usize> {
        let mut to_register = Vec::new();
        if let Some(sst) = self.shared_strings.as_ref().filter(|p| p.needs_registration()) {
            to_register.push((sst.path.clone(), CT_SHARED_STRINGS, rel_types::SHARED_STRINGS));
        }
        if let Some(styles) = self.styles.as_ref().filter(|p| p.needs_registration()) {
            to_register.push((styles.path.clone(), CT_STYLES, rel_types::STYLES));
        }
        if !to_register.is_empty() || self.calc_chain_stale {
            self.update_manifests(&to_register)?;
        }
        if let Some(sst) = self.shared_strings.as_mut().filter(|p| p.needs_registration()) {
            sst.created = false;
        }
        if let Some(styles) = self.styles.as_mut().filter(|p| p.needs_registration()) {
            styles.created = false;
        }

        let mut written = 0;
        for (path, worksheet) in self.worksheets.dirty_entries() {
            self.package.set(path, worksheet.to_bytes());
            written += 1;
        }
        if let Some(sst) = self.shared_strings.as_ref().filter(|p| p.cached.dirty) {
            self.package.set(&sst.path, sst.cached.value.to_bytes());
            written += 1;
        }
        if let Some(styles) = self.styles.as_ref().filter(|p| p.cached.dirty) {
            self.package.set(&styles.path, styles.cached.value.to_bytes());
            written += 1;
        }
        Ok(written)
    }

    /// Register new parts in the content types and workbook relationships,
    /// and drop a stale calculation chain from both
    fn update_manifests(&mut self, new_parts: &[(String, &str, &str)]) -> XlsxResult<()> {
        let mut content_types =
            ContentTypes::parse(self.package.require(CONTENT_TYPES_PART)?, CONTENT_TYPES_PART)?;
        let rels_part = self.workbook.workbook_rels_part();
        let mut rels = match self.package.get(&rels_part) {
            Some(data) => Relationships::parse(data, &rels_part)?,
            None => Relationships::empty(),
        };
        let rel_base = if self.workbook.is_strict() {
            REL_BASE_STRICT
        } else {
            REL_BASE_TRANSITIONAL
        };

        for (part, content_type, kind) in new_parts {
            content_types.ensure_override(part, content_type);
            let target = relative_target(self.workbook.workbook_part(), part);
            let id = rels.add(&format!("{}/{}", rel_base, kind), &target);
            log::debug!("related {} as {}", part, id);
        }

        if self.calc_chain_stale {
            if let Some(part) = self.related_part(rel_types::CALC_CHAIN)? {
                self.package.remove(&part);
                content_types.remove_override(&part);
                log::info!("dropped stale calculation chain {}", part);
            }
            rels.remove_kind(rel_types::CALC_CHAIN);
            self.calc_chain_stale = false;
        }

        self.package.set(CONTENT_TYPES_PART, content_types.to_bytes());
        self.package.set(&rels_part, rels.to_bytes());
        Ok(())
    }

    fn mark_clean(&mut self) {
        self.worksheets.mark_all_clean();
        if let Some(sst) = self.shared_strings.as_mut() {
            sst.cached.dirty = false;
        }
        if let Some(styles) = self.styles.as_mut() {
            styles.cached.dirty = false;
        }
    }
}
