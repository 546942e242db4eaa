//! Worksheet cell model
//!
//! `sheetData` is lifted out of the part's tree into rows keyed by row number
//! and cells keyed by column, so lookups and inserts are map operations. Every
//! other element of the worksheet stays in the tree untouched. On output the
//! rows and cells are written back in ascending order.
//!
//! Rows and cells that cannot be addressed (malformed or duplicate `r`) are
//! kept verbatim and written after the addressable ones; reads skip them.

use std::collections::BTreeMap;

use cellpatch_core::{CellAddress, CellRange, CellValue, MAX_COLS, MAX_ROWS};

use crate::error::XlsxResult;
use crate::shared_strings::{item_text, SharedStrings};
use crate::xml::{NamespaceScope, XmlDocument, XmlElement, XmlNode};

/// Elements the schema places after `<sheetData>` in a worksheet
const SHEET_DATA_FOLLOWERS: &[&str] = &[
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

/// What a write stores in a cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// Remove the value and type, keep the cell and its style
    Clear,
    Boolean(bool),
    /// Numeric literal for `<v>`
    Number(String),
    /// Index into the shared string table
    SharedString(u32),
}

/// Qualified names used inside `sheetData`, resolved once per part
#[derive(Debug, Clone)]
struct CellNames {
    row: String,
    c: String,
    v: String,
    f: String,
    is: String,
}

impl CellNames {
    fn new(scope: &NamespaceScope) -> Self {
        Self {
            row: scope.name("row"),
            c: scope.name("c"),
            v: scope.name("v"),
            f: scope.name("f"),
            is: scope.name("is"),
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    /// The `<row>` element without children
    element: XmlElement,
    cells: BTreeMap<u32, XmlElement>,
    /// Children kept verbatim, written after the cells
    stray: Vec<XmlNode>,
    /// Written to in this session; `spans` is stale once set
    touched: bool,
}

impl Row {
    fn new(element: XmlElement) -> Self {
        Self {
            element,
            cells: BTreeMap::new(),
            stray: Vec::new(),
            touched: false,
        }
    }

    fn parse(mut element: XmlElement, row_num: u32, names: &CellNames, part: &str) -> Self {
        let children = std::mem::take(&mut element.children);
        let mut row = Row::new(element);
        let mut prev_col = 0u32;

        for node in children {
            let mut cell = match node {
                XmlNode::Element(e) if e.name == names.c => e,
                XmlNode::Text(t) if t.trim().is_empty() => continue,
                other => {
                    row.stray.push(other);
                    continue;
                }
            };

            let col = match cell.attr("r") {
                None if prev_col < MAX_COLS => {
                    let col = prev_col + 1;
                    let r = CellAddress::new(row_num, col).to_a1_string();
                    cell.attributes.insert(0, ("r".to_string(), r));
                    col
                }
                None => {
                    log::warn!("{}: row {} has more than {} cells", part, row_num, MAX_COLS);
                    row.stray.push(XmlNode::Element(cell));
                    continue;
                }
                Some(r) => match CellAddress::parse(r) {
                    Ok(addr) if addr.row == row_num => addr.col,
                    _ => {
                        log::warn!("{}: skipping cell with reference '{}' in row {}", part, r, row_num);
                        row.stray.push(XmlNode::Element(cell));
                        continue;
                    }
                },
            };

            if row.cells.contains_key(&col) {
                log::warn!(
                    "{}: duplicate cell {}",
                    part,
                    CellAddress::new(row_num, col)
                );
                row.stray.push(XmlNode::Element(cell));
                continue;
            }
            prev_col = col;
            row.cells.insert(col, cell);
        }
        row
    }

    fn to_element(&self) -> XmlElement {
        let mut element = self.element.clone();
        if self.touched {
            element.remove_attr("spans");
        }
        element.children = self
            .cells
            .values()
            .cloned()
            .map(XmlNode::Element)
            .chain(self.stray.iter().cloned())
            .collect();
        element
    }
}

/// A parsed worksheet part
#[derive(Debug, Clone)]
pub struct Worksheet {
    doc: XmlDocument,
    scope: NamespaceScope,
    names: CellNames,
    rows: BTreeMap<u32, Row>,
    /// `sheetData` children that are not addressable rows
    stray_rows: Vec<XmlNode>,
}

impl Worksheet {
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        let mut doc = XmlDocument::parse(data, part)?;
        let scope = doc.namespace_scope();
        let names = CellNames::new(&scope);

        let mut rows = BTreeMap::new();
        let mut stray_rows = Vec::new();

        if let Some(sheet_data) = doc.root.child_mut(&scope.name("sheetData")) {
            let children = std::mem::take(&mut sheet_data.children);
            let mut prev_row = 0u32;

            for node in children {
                let mut element = match node {
                    XmlNode::Element(e) if e.name == names.row => e,
                    XmlNode::Text(t) if t.trim().is_empty() => continue,
                    other => {
                        stray_rows.push(other);
                        continue;
                    }
                };

                let row_num = match element.attr("r") {
                    None => prev_row + 1,
                    Some(r) => r.trim().parse::<u32>().unwrap_or(0),
                };
                if row_num == 0 || row_num > MAX_ROWS || rows.contains_key(&row_num) {
                    log::warn!(
                        "{}: skipping row with reference '{}'",
                        part,
                        element.attr("r").unwrap_or_default()
                    );
                    stray_rows.push(XmlNode::Element(element));
                    continue;
                }
                if element.attr("r").is_none() {
                    element.attributes.insert(0, ("r".to_string(), row_num.to_string()));
                }
                prev_row = row_num;
                rows.insert(row_num, Row::parse(element, row_num, &names, part));
            }
        }

        log::debug!("{}: {} rows", part, rows.len());
        Ok(Self {
            doc,
            scope,
            names,
            rows,
            stray_rows,
        })
    }

    /// Element of an existing cell
    pub fn cell(&self, row: u32, col: u32) -> Option<&XmlElement> {
        self.rows.get(&row)?.cells.get(&col)
    }

    /// Decoded value of a cell; missing cells are empty
    pub fn cell_value(&self, row: u32, col: u32, strings: Option<&SharedStrings>) -> CellValue {
        match self.cell(row, col) {
            Some(cell) => self.decode(cell, strings),
            None => CellValue::Empty,
        }
    }

    /// Row-major values covering `range`
    pub fn read_range(
        &self,
        range: &CellRange,
        strings: Option<&SharedStrings>,
    ) -> Vec<Vec<CellValue>> {
        (range.start.row..=range.end.row)
            .map(|r| {
                let row = self.rows.get(&r);
                (range.start.col..=range.end.col)
                    .map(|c| match row.and_then(|row| row.cells.get(&c)) {
                        Some(cell) => self.decode(cell, strings),
                        None => CellValue::Empty,
                    })
                    .collect()
            })
            .collect()
    }

    /// Style index of a cell, 0 when unset
    pub fn style_index(&self, row: u32, col: u32) -> u32 {
        self.cell(row, col)
            .and_then(|c| c.attr_u32("s"))
            .unwrap_or(0)
    }

    /// Existing cells inside `range` with a non-default style, row-major
    pub fn styled_cells(&self, range: &CellRange) -> Vec<(CellAddress, u32)> {
        let mut out = Vec::new();
        for (&r, row) in self.rows.range(range.start.row..=range.end.row) {
            for (&c, cell) in row.cells.range(range.start.col..=range.end.col) {
                let s = cell.attr_u32("s").unwrap_or(0);
                if s != 0 {
                    out.push((CellAddress::new(r, c), s));
                }
            }
        }
        out
    }

    /// Store a value, dropping any formula; returns whether a formula was removed
    pub fn set_value(&mut self, row: u32, col: u32, value: &StoredValue) -> bool {
        let names = self.names.clone();
        let v_element = XmlElement::new(names.v.clone());
        let cell = self.cell_mut_or_create(row, col);

        let formula_removed = cell.remove_children(&names.f) > 0;
        cell.remove_children(&names.v);
        cell.remove_children(&names.is);
        cell.remove_attr("t");

        let (t, text) = match value {
            StoredValue::Clear => return formula_removed,
            StoredValue::Boolean(b) => (Some("b"), String::from(if *b { "1" } else { "0" })),
            StoredValue::Number(n) => (None, n.clone()),
            StoredValue::SharedString(i) => (Some("s"), i.to_string()),
        };
        if let Some(t) = t {
            cell.set_attr("t", t);
        }
        let mut v = v_element;
        v.set_text(text);
        cell.insert_before_any(v, &["extLst"]);
        formula_removed
    }

    /// Set a cell's style index, creating the cell if needed
    pub fn set_style(&mut self, row: u32, col: u32, xf: u32) {
        let cell = self.cell_mut_or_create(row, col);
        if xf == 0 {
            cell.remove_attr("s");
        } else {
            cell.set_attr("s", xf.to_string());
        }
    }

    /// Number of addressable cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.cells.len()).sum()
    }

    /// Bounding range of every addressable cell
    pub fn used_range(&self) -> Option<CellRange> {
        let first_row = *self.rows.iter().find(|(_, r)| !r.cells.is_empty())?.0;
        let last_row = *self.rows.iter().rev().find(|(_, r)| !r.cells.is_empty())?.0;
        let mut min_col = u32::MAX;
        let mut max_col = 0;
        for row in self.rows.values() {
            if let (Some((&lo, _)), Some((&hi, _))) =
                (row.cells.first_key_value(), row.cells.last_key_value())
            {
                min_col = min_col.min(lo);
                max_col = max_col.max(hi);
            }
        }
        Some(CellRange::new(
            CellAddress::new(first_row, min_col),
            CellAddress::new(last_row, max_col),
        ))
    }

    /// Serialize with rows and cells in ascending order and a fresh dimension
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut doc = self.doc.clone();

        let children: Vec<XmlNode> = self
            .rows
            .values()
            .map(|row| XmlNode::Element(row.to_element()))
            .chain(self.stray_rows.iter().cloned())
            .collect();
        match doc.root.child_mut(&self.scope.name("sheetData")) {
            Some(sheet_data) => sheet_data.children = children,
            None => {
                let mut sheet_data = self.scope.element("sheetData");
                sheet_data.children = children;
                doc.root.insert_before_any(sheet_data, SHEET_DATA_FOLLOWERS);
            }
        }

        if let Some(dimension) = doc.root.child_mut(&self.scope.name("dimension")) {
            let dim = self
                .used_range()
                .map(|r| r.to_a1_string())
                .unwrap_or_else(|| "A1".to_string());
            dimension.set_attr("ref", dim);
        }

        doc.to_bytes()
    }

    fn cell_mut_or_create(&mut self, row: u32, col: u32) -> &mut XmlElement {
        let names = &self.names;
        let row_entry = self.rows.entry(row).or_insert_with(|| {
            Row::new(XmlElement::new(names.row.clone()).with_attr("r", row.to_string()))
        });
        row_entry.touched = true;
        row_entry.cells.entry(col).or_insert_with(|| {
            XmlElement::new(names.c.clone())
                .with_attr("r", CellAddress::new(row, col).to_a1_string())
        })
    }

    fn decode(&self, cell: &XmlElement, strings: Option<&SharedStrings>) -> CellValue {
        let v = cell.child(&self.names.v).map(|v| v.text());
        match cell.attr("t").unwrap_or("n") {
            "s" => {
                let Some(v) = v else {
                    return CellValue::Empty;
                };
                let resolved = v
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(|i| strings.and_then(|s| s.resolve(i)));
                match resolved {
                    Some(s) => CellValue::String(s.to_string()),
                    None => {
                        log::warn!(
                            "cell {} refers to missing shared string '{}'",
                            cell.attr("r").unwrap_or_default(),
                            v
                        );
                        CellValue::Empty
                    }
                }
            }
            "inlineStr" => match cell.child(&self.names.is) {
                Some(is) => CellValue::String(item_text(is, &self.scope)),
                None => v.map(CellValue::String).unwrap_or_default(),
            },
            "b" => v
                .map(|v| CellValue::Boolean(matches!(v.trim(), "1" | "true")))
                .unwrap_or_default(),
            "e" => v.map(CellValue::Error).unwrap_or_default(),
            "str" | "d" => v.map(CellValue::String).unwrap_or_default(),
            _ => match v {
                Some(v) if !v.trim().is_empty() => CellValue::from_numeric_text(&v),
                _ => CellValue::Empty,
            },
        }
    }
}
