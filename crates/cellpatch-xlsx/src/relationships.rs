//! Package relationship parts (`*.rels`)

use crate::error::XlsxResult;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// Namespace of relationship parts
pub const NS_PACKAGE_RELATIONSHIPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type base for transitional packages
pub const REL_BASE_TRANSITIONAL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship type base for strict packages
pub const REL_BASE_STRICT: &str = "http://purl.oclc.org/ooxml/officeDocument/relationships";

/// Last path segment of the relationship types this engine cares about
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str = "officeDocument";
    pub const WORKSHEET: &str = "worksheet";
    pub const CHARTSHEET: &str = "chartsheet";
    pub const DIALOGSHEET: &str = "dialogsheet";
    pub const MACROSHEET: &str = "xlMacrosheet";
    pub const SHARED_STRINGS: &str = "sharedStrings";
    pub const STYLES: &str = "styles";
    pub const CALC_CHAIN: &str = "calcChain";
}

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the type ends in `/kind` (matches both transitional and strict URIs)
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(kind)
    }
}

/// Path of the relationships part belonging to `part` (`xl/workbook.xml` ->
/// `xl/_rels/workbook.xml.rels`)
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the relationship
///
/// Absolute targets (`/xl/worksheets/sheet1.xml`) are package-rooted; relative
/// ones are joined to the source part's directory. `.` and `..` segments are
/// normalized.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let joined = if let Some(rooted) = target.strip_prefix('/') {
        rooted.to_string()
    } else {
        match source_part.rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, target),
            None => target.to_string(),
        }
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target for `target_part` written relative to the directory of `source_part`
///
/// Only handles parts in the same directory or below it, which is all this
/// engine creates; anything else gets a package-rooted target.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let dir = source_part.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    if dir.is_empty() {
        return target_part.to_string();
    }
    match target_part.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(rest) => rest.to_string(),
        None => format!("/{}", target_part),
    }
}

/// A parsed relationships part
#[derive(Debug, Clone)]
pub struct Relationships {
    doc: XmlDocument,
}

impl Relationships {
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        Ok(Self {
            doc: XmlDocument::parse(data, part)?,
        })
    }

    /// An empty relationships part
    pub fn empty() -> Self {
        let root = XmlElement::new("Relationships").with_attr("xmlns", NS_PACKAGE_RELATIONSHIPS);
        Self {
            doc: XmlDocument::new(root),
        }
    }

    fn rel_name(&self) -> String {
        self.doc.namespace_scope().name("Relationship")
    }

    /// All entries in document order
    pub fn entries(&self) -> Vec<Relationship> {
        let name = self.rel_name();
        self.doc
            .root
            .children_named(&name)
            .filter_map(|el| {
                Some(Relationship {
                    id: el.attr("Id")?.to_string(),
                    rel_type: el.attr("Type").unwrap_or_default().to_string(),
                    target: el.attr("Target")?.to_string(),
                    external: el.attr("TargetMode") == Some("External"),
                })
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Relationship> {
        self.entries().into_iter().find(|r| r.id == id)
    }

    /// First internal relationship of the given kind
    pub fn find_kind(&self, kind: &str) -> Option<Relationship> {
        self.entries()
            .into_iter()
            .find(|r| !r.external && r.is_kind(kind))
    }

    /// Append a relationship with a fresh `rIdN` and return the id
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let entries = self.entries();
        let mut n = entries
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        while entries.iter().any(|r| r.id == format!("rId{}", n)) {
            n += 1;
        }
        let id = format!("rId{}", n);

        let el = XmlElement::new(self.rel_name())
            .with_attr("Id", id.clone())
            .with_attr("Type", rel_type)
            .with_attr("Target", target);
        self.doc.root.push(el);
        id
    }

    /// Remove every relationship of this kind; returns how many were removed
    pub fn remove_kind(&mut self, kind: &str) -> usize {
        let name = self.rel_name();
        let before = self.doc.root.children.len();
        self.doc.root.children.retain(|n| match n {
            XmlNode::Element(e) if e.name == name => {
                let rel_type = e.attr("Type").unwrap_or_default();
                rel_type.rsplit('/').next() != Some(kind)
            }
            _ => true,
        });
        before - self.doc.root.children.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes()
    }
}
