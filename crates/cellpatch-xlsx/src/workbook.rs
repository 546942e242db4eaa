//! Workbook index: sheet names in document order and the parts behind them

use crate::error::{XlsxError, XlsxResult};
use crate::package::Package;
use crate::relationships::{rel_types, rels_path_for, resolve_target, Relationships};
use crate::xml::XmlDocument;

/// Package-level relationships part
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// Where the workbook part lives when `_rels/.rels` does not say
pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// SpreadsheetML main namespace (transitional)
pub const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Namespace of `r:id` attributes (transitional and strict)
const NS_DOC_RELATIONSHIPS: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    "http://purl.oclc.org/ooxml/officeDocument/relationships",
];

/// What kind of sheet a `<sheet>` entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Worksheet,
    Chartsheet,
    Dialogsheet,
    Macrosheet,
    Unknown,
}

impl SheetKind {
    fn from_rel_kind(kind: &str) -> Self {
        match kind {
            rel_types::WORKSHEET => SheetKind::Worksheet,
            rel_types::CHARTSHEET => SheetKind::Chartsheet,
            rel_types::DIALOGSHEET => SheetKind::Dialogsheet,
            rel_types::MACROSHEET => SheetKind::Macrosheet,
            _ => SheetKind::Unknown,
        }
    }
}

/// One `<sheet>` entry of workbook.xml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: String,
    /// Resolved part path, `None` when the relationship is missing
    pub part: Option<String>,
    pub kind: SheetKind,
}

/// Ordered sheet name -> part mapping, built once at open
#[derive(Debug, Clone)]
pub struct WorkbookIndex {
    workbook_part: String,
    main_namespace: String,
    sheets: Vec<SheetEntry>,
}

impl WorkbookIndex {
    /// Locate and read workbook.xml and its relationships
    pub fn load(package: &Package) -> XlsxResult<Self> {
        let workbook_part = find_workbook_part(package)?;
        let data = package.require(&workbook_part)?;
        let doc = XmlDocument::parse(data, &workbook_part)?;

        let rels_part = rels_path_for(&workbook_part);
        let rels = match package.get(&rels_part) {
            Some(data) => Relationships::parse(data, &rels_part)?,
            None => Relationships::empty(),
        };

        let root = &doc.root;
        let scope = doc.namespace_scope();
        let main_namespace = root.own_namespace().unwrap_or(NS_MAIN).to_string();
        let rid_key = NS_DOC_RELATIONSHIPS
            .iter()
            .find_map(|uri| root.prefix_for_namespace(uri))
            .map(|p| format!("{}:id", p))
            .unwrap_or_else(|| "r:id".to_string());

        let mut sheets = Vec::new();
        let sheet_name = scope.name("sheet");
        if let Some(list) = root.child(&scope.name("sheets")) {
            for el in list.children_named(&sheet_name) {
                let Some(name) = el.attr("name") else {
                    log::warn!("{}: <sheet> without a name skipped", workbook_part);
                    continue;
                };
                let rel_id = el.attr(&rid_key).unwrap_or_default().to_string();
                let (part, kind) = match rels.get(&rel_id) {
                    Some(rel) => {
                        let kind = rel.rel_type.rsplit('/').next().unwrap_or_default();
                        (
                            Some(resolve_target(&workbook_part, &rel.target)),
                            SheetKind::from_rel_kind(kind),
                        )
                    }
                    None => {
                        log::warn!("sheet '{}' has no relationship '{}'", name, rel_id);
                        (None, SheetKind::Unknown)
                    }
                };
                sheets.push(SheetEntry {
                    name: name.to_string(),
                    rel_id,
                    part,
                    kind,
                });
            }
        }

        log::debug!("{} lists {} sheets", workbook_part, sheets.len());
        Ok(Self {
            workbook_part,
            main_namespace,
            sheets,
        })
    }

    /// Path of workbook.xml inside the package
    pub fn workbook_part(&self) -> &str {
        &self.workbook_part
    }

    /// Path of the workbook's relationships part
    pub fn workbook_rels_part(&self) -> String {
        rels_path_for(&self.workbook_part)
    }

    /// Namespace new SpreadsheetML parts should use
    pub fn main_namespace(&self) -> &str {
        &self.main_namespace
    }

    /// Whether the package uses the strict namespace set
    pub fn is_strict(&self) -> bool {
        self.main_namespace.starts_with("http://purl.oclc.org/")
    }

    /// Sheet names in document order
    pub fn list_sheets(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheets(&self) -> &[SheetEntry] {
        &self.sheets
    }

    /// Entry for an exact sheet name
    pub fn resolve(&self, name: &str) -> XlsxResult<&SheetEntry> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))
    }

    /// Part path of a worksheet, rejecting other sheet kinds
    pub fn worksheet_part(&self, name: &str) -> XlsxResult<&str> {
        let entry = self.resolve(name)?;
        if entry.kind != SheetKind::Worksheet {
            return Err(XlsxError::NotAWorksheet(name.to_string()));
        }
        entry
            .part
            .as_deref()
            .ok_or_else(|| XlsxError::MissingPart(format!("worksheet for sheet '{}'", name)))
    }
}

/// The officeDocument target of `_rels/.rels`, else the conventional path
fn find_workbook_part(package: &Package) -> XlsxResult<String> {
    if let Some(data) = package.get(PACKAGE_RELS_PART) {
        let rels = Relationships::parse(data, PACKAGE_RELS_PART)?;
        if let Some(rel) = rels.find_kind(rel_types::OFFICE_DOCUMENT) {
            let part = resolve_target("", &rel.target);
            if package.contains(&part) {
                return Ok(part);
            }
            log::warn!("officeDocument target '{}' is missing", part);
        }
    }
    if package.contains(DEFAULT_WORKBOOK_PART) {
        return Ok(DEFAULT_WORKBOOK_PART.to_string());
    }
    Err(XlsxError::MissingPart(DEFAULT_WORKBOOK_PART.to_string()))
}
