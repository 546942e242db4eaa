//! Style engine over styles.xml
//!
//! The stylesheet stays an XML tree so everything the engine does not model
//! (cellStyles, dxfs, theme references, extensions) is written back as read.
//! Fonts, fills, borders and cellXfs are mirrored into [`InternPool`]s of
//! canonical elements: index `n` in a pool is the `n`th record of the
//! collection, and find-or-create by structural equality keeps repeated format
//! requests from growing any table.

mod merge;
mod readback;

use std::collections::BTreeMap;

use cellpatch_core::{
    style::FIRST_CUSTOM_NUM_FMT_ID, Background, BorderSide, BorderSpec, CellFormat, FormatSpec,
    InternPool, NumberFormat,
};

use crate::error::XlsxResult;
use crate::xml::{NamespaceScope, XmlDocument, XmlElement};

/// Conventional path of a newly created stylesheet
pub const DEFAULT_STYLES_PART: &str = "xl/styles.xml";

/// Top-level stylesheet elements in schema order
const STYLESHEET_ORDER: &[&str] = &[
    "numFmts",
    "fonts",
    "fills",
    "borders",
    "cellStyleXfs",
    "cellXfs",
    "cellStyles",
    "dxfs",
    "tableStyles",
    "colors",
    "extLst",
];

/// An interned record collection of the stylesheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Collection {
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

impl Collection {
    fn local(&self) -> &'static str {
        match self {
            Collection::Fonts => "fonts",
            Collection::Fills => "fills",
            Collection::Borders => "borders",
            Collection::CellXfs => "cellXfs",
        }
    }

    fn item(&self) -> &'static str {
        match self {
            Collection::Fonts => "font",
            Collection::Fills => "fill",
            Collection::Borders => "border",
            Collection::CellXfs => "xf",
        }
    }
}

/// Record counts of the interned collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleCounts {
    pub fonts: usize,
    pub fills: usize,
    pub borders: usize,
    pub num_fmts: usize,
    pub cell_xfs: usize,
}

/// A parsed stylesheet with interned record tables
#[derive(Debug, Clone)]
pub struct StyleSheet {
    doc: XmlDocument,
    scope: NamespaceScope,
    fonts: InternPool<XmlElement>,
    fills: InternPool<XmlElement>,
    borders: InternPool<XmlElement>,
    cell_xfs: InternPool<XmlElement>,
    /// Custom number formats as (id, code)
    num_fmts: Vec<(u32, String)>,
    modified: bool,
}

impl StyleSheet {
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        let doc = XmlDocument::parse(data, part)?;
        let scope = doc.namespace_scope();

        let load = |c: Collection| -> InternPool<XmlElement> {
            let mut pool = InternPool::new();
            if let Some(list) = doc.root.find_local(c.local()) {
                for el in list.elements().filter(|e| e.local_name() == c.item()) {
                    pool.push_existing(el.canonical());
                }
            }
            pool
        };
        let fonts = load(Collection::Fonts);
        let fills = load(Collection::Fills);
        let borders = load(Collection::Borders);
        let cell_xfs = load(Collection::CellXfs);

        let mut num_fmts = Vec::new();
        if let Some(list) = doc.root.find_local("numFmts") {
            for el in list.elements().filter(|e| e.local_name() == "numFmt") {
                match (el.attr_u32("numFmtId"), el.attr("formatCode")) {
                    (Some(id), Some(code)) => num_fmts.push((id, code.to_string())),
                    _ => log::warn!("{}: skipping incomplete numFmt", part),
                }
            }
        }

        log::debug!(
            "{}: {} fonts, {} fills, {} borders, {} cellXfs, {} custom number formats",
            part,
            fonts.len(),
            fills.len(),
            borders.len(),
            cell_xfs.len(),
            num_fmts.len()
        );

        Ok(Self {
            doc,
            scope,
            fonts,
            fills,
            borders,
            cell_xfs,
            num_fmts,
            modified: false,
        })
    }

    /// The smallest stylesheet spreadsheet applications accept
    pub fn minimal(namespace: &str) -> XlsxResult<Self> {
        let xml = format!(
            concat!(
                r#"<styleSheet xmlns="{}">"#,
                r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>"#,
                r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
                r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
                r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
                r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
                r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
                r#"</styleSheet>"#
            ),
            namespace
        );
        Self::parse(xml.as_bytes(), DEFAULT_STYLES_PART)
    }

    pub fn counts(&self) -> StyleCounts {
        StyleCounts {
            fonts: self.fonts.len(),
            fills: self.fills.len(),
            borders: self.borders.len(),
            num_fmts: self.num_fmts.len(),
            cell_xfs: self.cell_xfs.len(),
        }
    }

    /// Whether records were added since the last call
    pub fn take_modified(&mut self) -> bool {
        std::mem::take(&mut self.modified)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes()
    }

    /// Number format id for a code: built-in id, existing custom id, or a new one
    pub fn num_fmt_id(&mut self, code: &str) -> u32 {
        if let Some(id) = NumberFormat::builtin_id(code) {
            return id;
        }
        if let Some((id, _)) = self.num_fmts.iter().find(|(_, c)| c == code) {
            return *id;
        }

        let id = self
            .num_fmts
            .iter()
            .map(|(id, _)| *id)
            .max()
            .unwrap_or(0)
            .max(FIRST_CUSTOM_NUM_FMT_ID - 1)
            + 1;
        let record = self
            .scope
            .element("numFmt")
            .with_attr("numFmtId", id.to_string())
            .with_attr("formatCode", code);
        self.append_record("numFmts", "numFmt", record);
        self.num_fmts.push((id, code.to_string()));
        log::debug!("new number format {} = '{}'", id, code);
        id
    }

    /// Format code for a number format id
    pub fn num_fmt_code(&self, id: u32) -> Option<String> {
        self.num_fmts
            .iter()
            .find(|(i, _)| *i == id)
            .map(|(_, code)| code.clone())
            .or_else(|| NumberFormat::builtin_code(id).map(str::to_string))
    }

    /// Style index for `base_xf` with `spec` overlaid and `edges` as its borders
    ///
    /// Properties the request leaves out keep their value from the base style.
    /// Equal results resolve to the same index.
    pub fn merge(
        &mut self,
        base_xf: u32,
        spec: &FormatSpec,
        edges: &BTreeMap<BorderSide, BorderSpec>,
    ) -> u32 {
        self.ensure_base_records();

        let mut xf = self
            .cell_xfs
            .get(base_xf)
            .or_else(|| self.cell_xfs.get(0))
            .cloned()
            .unwrap_or_else(|| self.default_xf());

        if spec.touches_font() {
            let base = self.record(Collection::Fonts, xf.attr_u32("fontId").unwrap_or(0));
            let font = merge::merge_font(base, spec, &self.scope);
            let id = self.intern(Collection::Fonts, font);
            xf.set_attr("fontId", id.to_string());
            xf.set_attr("applyFont", "1");
        }

        if let Some(background) = spec.background_color {
            let id = match background {
                Background::None => 0,
                Background::Solid(color) => {
                    let fill = merge::solid_fill(color, &self.scope);
                    self.intern(Collection::Fills, fill)
                }
            };
            xf.set_attr("fillId", id.to_string());
            xf.set_attr("applyFill", "1");
        }

        if !edges.is_empty() {
            let base = self.record(Collection::Borders, xf.attr_u32("borderId").unwrap_or(0));
            let border = merge::merge_border(base, edges, &self.scope);
            let id = self.intern(Collection::Borders, border);
            xf.set_attr("borderId", id.to_string());
            xf.set_attr("applyBorder", "1");
        }

        if let Some(code) = &spec.number_format {
            let id = self.num_fmt_id(code);
            xf.set_attr("numFmtId", id.to_string());
            xf.set_attr("applyNumberFormat", "1");
        }

        if spec.touches_alignment() {
            merge::merge_alignment(&mut xf, spec, &self.scope);
            xf.set_attr("applyAlignment", "1");
        }

        self.intern(Collection::CellXfs, xf)
    }

    /// Non-default properties of a style index
    pub fn cell_format(&self, xf_id: u32) -> CellFormat {
        let mut fmt = CellFormat::default();
        let Some(xf) = self.cell_xfs.get(xf_id) else {
            return fmt;
        };

        let font_id = xf.attr_u32("fontId").unwrap_or(0);
        if xf.attr("applyFont") == Some("1") || font_id > 0 {
            if let Some(font) = self.fonts.get(font_id) {
                readback::read_font(font, &mut fmt);
            }
        }

        // 0 and 1 are the reserved none/gray125 fills
        let fill_id = xf.attr_u32("fillId").unwrap_or(0);
        if fill_id > 1 {
            if let Some(fill) = self.fills.get(fill_id) {
                readback::read_fill(fill, &mut fmt);
            }
        }

        let border_id = xf.attr_u32("borderId").unwrap_or(0);
        if border_id > 0 {
            if let Some(border) = self.borders.get(border_id) {
                readback::read_border(border, &mut fmt);
            }
        }

        let num_fmt_id = xf.attr_u32("numFmtId").unwrap_or(0);
        if num_fmt_id > 0 {
            fmt.number_format = self
                .num_fmt_code(num_fmt_id)
                .filter(|code| !NumberFormat::from_code(code).is_general());
        }

        if let Some(alignment) = xf.find_local("alignment") {
            readback::read_alignment(alignment, &mut fmt);
        }
        fmt
    }

    fn default_xf(&self) -> XmlElement {
        self.scope
            .element("xf")
            .with_attr("numFmtId", "0")
            .with_attr("fontId", "0")
            .with_attr("fillId", "0")
            .with_attr("borderId", "0")
            .with_attr("xfId", "0")
    }

    /// Copy of a record, or an empty one when the index is out of range
    fn record(&self, collection: Collection, index: u32) -> XmlElement {
        self.pool(collection)
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.scope.element(collection.item()))
    }

    /// Give empty collections the records index 0 (and fill 1) must hold
    fn ensure_base_records(&mut self) {
        if self.fonts.is_empty() {
            let font = self
                .scope
                .element("font")
                .with_child(self.scope.element("sz").with_attr("val", "11"))
                .with_child(self.scope.element("name").with_attr("val", "Calibri"));
            self.intern(Collection::Fonts, font);
        }
        if self.fills.is_empty() {
            for pattern in ["none", "gray125"] {
                let fill = self.scope.element("fill").with_child(
                    self.scope
                        .element("patternFill")
                        .with_attr("patternType", pattern),
                );
                self.intern(Collection::Fills, fill);
            }
        }
        if self.borders.is_empty() {
            let mut border = self.scope.element("border");
            for side in ["left", "right", "top", "bottom", "diagonal"] {
                border.push(self.scope.element(side));
            }
            self.intern(Collection::Borders, border);
        }
        if self.cell_xfs.is_empty() {
            let xf = self.default_xf();
            self.intern(Collection::CellXfs, xf);
        }
    }

    fn pool(&self, collection: Collection) -> &InternPool<XmlElement> {
        match collection {
            Collection::Fonts => &self.fonts,
            Collection::Fills => &self.fills,
            Collection::Borders => &self.borders,
            Collection::CellXfs => &self.cell_xfs,
        }
    }

    fn pool_mut(&mut self, collection: Collection) -> &mut InternPool<XmlElement> {
        match collection {
            Collection::Fonts => &mut self.fonts,
            Collection::Fills => &mut self.fills,
            Collection::Borders => &mut self.borders,
            Collection::CellXfs => &mut self.cell_xfs,
        }
    }

    /// Find-or-create a record, appending it to the XML collection when new
    fn intern(&mut self, collection: Collection, record: XmlElement) -> u32 {
        let canonical = record.canonical();
        let (id, added) = self.pool_mut(collection).get_or_insert(canonical.clone());
        if added {
            self.append_record(collection.local(), collection.item(), canonical);
            log::debug!("new {} record {}", collection.item(), id);
        }
        id
    }

    /// Append to a collection, creating it in schema order if missing, and
    /// refresh its `count`
    fn append_record(&mut self, list_local: &str, item_local: &str, record: XmlElement) {
        if self.doc.root.find_local(list_local).is_none() {
            let followers = STYLESHEET_ORDER
                .iter()
                .position(|l| *l == list_local)
                .map(|pos| &STYLESHEET_ORDER[pos + 1..])
                .unwrap_or(&[]);
            let list = self.scope.element(list_local);
            self.doc.root.insert_before_any(list, followers);
        }

        let Some(list) = self
            .doc
            .root
            .elements_mut()
            .find(|e| e.local_name() == list_local)
        else {
            return;
        };
        list.push(record);
        let count = list
            .elements()
            .filter(|e| e.local_name() == item_local)
            .count();
        list.set_attr("count", count.to_string());
        self.modified = true;
    }
}
