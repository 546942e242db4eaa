//! Shared string table (xl/sharedStrings.xml)
//!
//! Existing `<si>` entries are never rewritten, so rich text runs and phonetic
//! data survive. New strings are appended as plain `<si><t>` entries.

use cellpatch_core::InternPool;

use crate::error::XlsxResult;
use crate::xml::{
    decode_excel_escapes, encode_excel_escapes, NamespaceScope, XmlDocument, XmlElement, XmlNode,
};

/// Conventional path of a newly created table
pub const DEFAULT_SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// Deduplicating string table backed by the part's XML tree
#[derive(Debug, Clone)]
pub struct SharedStrings {
    doc: XmlDocument,
    scope: NamespaceScope,
    pool: InternPool<String>,
    /// Total references (`count`), kept close to what the file said
    count: u64,
}

impl SharedStrings {
    /// Parse an existing part
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        let doc = XmlDocument::parse(data, part)?;
        let scope = doc.namespace_scope();

        let si_name = scope.name("si");
        let mut pool = InternPool::new();
        for si in doc.root.children_named(&si_name) {
            pool.push_existing(item_text(si, &scope));
        }

        let count = doc
            .root
            .attr("count")
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or(pool.len() as u64);
        log::debug!("{}: {} shared strings", part, pool.len());

        Ok(Self {
            doc,
            scope,
            pool,
            count,
        })
    }

    /// An empty table in the given SpreadsheetML namespace
    pub fn new_empty(namespace: &str) -> Self {
        let root = XmlElement::new("sst")
            .with_attr("xmlns", namespace)
            .with_attr("count", "0")
            .with_attr("uniqueCount", "0");
        Self {
            doc: XmlDocument::new(root),
            scope: NamespaceScope::default(),
            pool: InternPool::new(),
            count: 0,
        }
    }

    /// String at `index`, `None` when out of range
    pub fn resolve(&self, index: u32) -> Option<&str> {
        self.pool.get(index).map(String::as_str)
    }

    /// Index for `s`, appending a new entry if needed
    ///
    /// Returns the index and whether the table grew.
    pub fn intern(&mut self, s: &str) -> (u32, bool) {
        let (index, added) = self.pool.get_or_insert(s.to_string());
        if added {
            let item = self.new_item(s);
            self.doc.root.insert_before_any(item, &["extLst"]);
        }
        self.count += 1;
        self.doc.root.set_attr("count", self.count.to_string());
        self.doc
            .root
            .set_attr("uniqueCount", self.pool.len().to_string());
        (index, added)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes()
    }

    fn new_item(&self, s: &str) -> XmlElement {
        let mut t = self.scope.element("t");
        let edge_space = s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace);
        if edge_space {
            t.set_attr("xml:space", "preserve");
        }
        t.set_text(encode_excel_escapes(s));
        self.scope.element("si").with_child(t)
    }
}

/// Plain text of an `<si>` or `<is>` element: its `<t>` plus every run's `<t>`
///
/// Phonetic runs (`<rPh>`) are not part of the value.
pub(crate) fn item_text(item: &XmlElement, scope: &NamespaceScope) -> String {
    let t_name = scope.name("t");
    let r_name = scope.name("r");
    let mut out = String::new();
    for child in &item.children {
        let XmlNode::Element(el) = child else { continue };
        if el.name == t_name {
            out.push_str(&el.text());
        } else if el.name == r_name {
            for t in el.children_named(&t_name) {
                out.push_str(&t.text());
            }
        }
    }
    decode_excel_escapes(&out)
}
