//! `[Content_Types].xml`

use crate::error::XlsxResult;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// A parsed content types part
#[derive(Debug, Clone)]
pub struct ContentTypes {
    doc: XmlDocument,
}

/// Override `PartName` form of a package path
fn part_name(part: &str) -> String {
    format!("/{}", part.trim_start_matches('/'))
}

impl ContentTypes {
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        Ok(Self {
            doc: XmlDocument::parse(data, part)?,
        })
    }

    fn override_name(&self) -> String {
        self.doc.namespace_scope().name("Override")
    }

    /// Content type declared for a part, by override or by extension default
    pub fn content_type_of(&self, part: &str) -> Option<String> {
        let wanted = part_name(part);
        let override_name = self.override_name();
        let default_name = self.doc.namespace_scope().name("Default");

        let overridden = self
            .doc
            .root
            .children_named(&override_name)
            .find(|el| {
                el.attr("PartName")
                    .map(|p| p.eq_ignore_ascii_case(&wanted))
                    .unwrap_or(false)
            })
            .and_then(|el| el.attr("ContentType"));
        if let Some(ct) = overridden {
            return Some(ct.to_string());
        }

        let ext = part.rsplit_once('.')?.1;
        let by_extension = self
            .doc
            .root
            .children_named(&default_name)
            .find(|el| {
                el.attr("Extension")
                    .map(|e| e.eq_ignore_ascii_case(ext))
                    .unwrap_or(false)
            })
            .and_then(|el| el.attr("ContentType"))
            .map(str::to_string);
        by_extension
    }

    pub fn has_override(&self, part: &str) -> bool {
        let wanted = part_name(part);
        let name = self.override_name();
        let found = self.doc.root.children_named(&name).any(|el| {
            el.attr("PartName")
                .map(|p| p.eq_ignore_ascii_case(&wanted))
                .unwrap_or(false)
        });
        found
    }

    /// Add an override unless one exists; returns whether anything changed
    pub fn ensure_override(&mut self, part: &str, content_type: &str) -> bool {
        if self.has_override(part) {
            return false;
        }
        let el = XmlElement::new(self.override_name())
            .with_attr("PartName", part_name(part))
            .with_attr("ContentType", content_type);
        self.doc.root.push(el);
        true
    }

    /// Remove the override for a part; returns whether one existed
    pub fn remove_override(&mut self, part: &str) -> bool {
        let wanted = part_name(part);
        let name = self.override_name();
        let before = self.doc.root.children.len();
        self.doc.root.children.retain(|n| match n {
            XmlNode::Element(e) if e.name == name => !e
                .attr("PartName")
                .map(|p| p.eq_ignore_ascii_case(&wanted))
                .unwrap_or(false),
            _ => true,
        });
        before != self.doc.root.children.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.doc.to_bytes()
    }
}
