//! Owned, order-preserving XML tree for package parts
//!
//! A part that gets edited is parsed into this tree once and written back from
//! it, so every element, attribute, namespace declaration, comment and
//! processing instruction the engine does not understand survives the edit.

mod escape;

pub use escape::{decode_excel_escapes, encode_excel_escapes, escape_xml, escape_xml_attr};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};

/// Declaration written at the top of every serialized part
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node inside an element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data
    Text(String),
    CData(String),
    Comment(String),
    /// Raw content between `<?` and `?>`
    ProcessingInstruction(String),
}

/// An element with its qualified name, attributes in document order and children
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// Local part of a qualified name
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

impl XmlElement {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`XmlElement::set_attr`]
    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`XmlElement::push`]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of this element's name, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(p, _)| p)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace an attribute in place, or append it
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Numeric attribute, `None` when absent or unparsable
    pub fn attr_u32(&self, key: &str) -> Option<u32> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    /// Prefix bound to `uri` by an `xmlns:prefix` declaration on this element
    pub fn prefix_for_namespace(&self, uri: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, v)| k.starts_with("xmlns:") && v == uri)
            .map(|(k, _)| &k["xmlns:".len()..])
    }

    /// Namespace URI of this element, from its own declarations
    pub fn own_namespace(&self) -> Option<&str> {
        match self.prefix() {
            Some(p) => self.attr(&format!("xmlns:{}", p)),
            None => self.attr("xmlns"),
        }
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements with this qualified name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// First child element with this local name, whatever its prefix
    pub fn find_local(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// Remove every child element with this local name
    pub fn remove_local(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, XmlNode::Element(e) if e.local_name() == local));
        before - self.children.len()
    }

    /// Remove every child element with this name, returning how many went
    pub fn remove_children(&mut self, name: &str) -> usize {
        let before = self.children.len();
        self.children
            .retain(|n| !matches!(n, XmlNode::Element(e) if e.name == name));
        before - self.children.len()
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert a child before the first child element whose local name appears
    /// in `followers`, or append when none does
    ///
    /// `followers` lists the siblings the schema places after `child`.
    pub fn insert_before_any(&mut self, child: XmlElement, followers: &[&str]) {
        let pos = self.children.iter().position(
            |n| matches!(n, XmlNode::Element(e) if followers.contains(&e.local_name())),
        );
        match pos {
            Some(pos) => self.children.insert(pos, XmlNode::Element(child)),
            None => self.push(child),
        }
    }

    /// Concatenated text and CDATA of the direct children
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Replace all children with one text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![XmlNode::Text(text.into())];
    }

    /// Copy with attributes sorted and whitespace-only text dropped, so two
    /// elements that mean the same thing compare equal
    pub fn canonical(&self) -> XmlElement {
        let mut attributes = self.attributes.clone();
        attributes.sort();
        let children = self
            .children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Element(e) => Some(XmlNode::Element(e.canonical())),
                XmlNode::Text(t) if t.trim().is_empty() => None,
                XmlNode::Comment(_) | XmlNode::ProcessingInstruction(_) => None,
                other => Some(other.clone()),
            })
            .collect();
        XmlElement {
            name: self.name.clone(),
            attributes,
            children,
        }
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape_xml_attr(v));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl XmlNode {
    fn write_to(&self, out: &mut String) {
        match self {
            XmlNode::Element(e) => e.write_to(out),
            XmlNode::Text(t) => out.push_str(&escape_xml(t)),
            XmlNode::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(t);
                out.push_str("]]>");
            }
            XmlNode::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            }
            XmlNode::ProcessingInstruction(t) => {
                out.push_str("<?");
                out.push_str(t);
                out.push_str("?>");
            }
        }
    }
}

/// Element name prefixing for one part
///
/// A part may bind its main namespace to a prefix (`<x:worksheet
/// xmlns:x="...">`); elements the engine creates in that part must use the
/// same prefix. Each parsed part carries its own scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    prefix: Option<String>,
}

impl NamespaceScope {
    /// Scope matching the root element's own prefix
    pub fn of_root(root: &XmlElement) -> Self {
        Self {
            prefix: root.prefix().map(str::to_string),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Qualified name for a local name in this part's main namespace
    pub fn name(&self, local: &str) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, local),
            None => local.to_string(),
        }
    }

    /// New element in this part's main namespace
    pub fn element(&self, local: &str) -> XmlElement {
        XmlElement::new(self.name(local))
    }
}

/// A parsed part: prolog nodes, the root element, trailing nodes
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Parse a part; `part` names it in errors
    pub fn parse(data: &[u8], part: &str) -> XlsxResult<Self> {
        let mut reader = Reader::from_reader(data);
        reader.trim_text(false);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let node = match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e, part)?);
                    None
                }
                Ok(Event::Empty(e)) => Some(XmlNode::Element(element_from_start(&e, part)?)),
                Ok(Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        XlsxError::xml(part, "closing tag without an open element")
                    })?;
                    Some(XmlNode::Element(element))
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| XlsxError::xml(part, e))?;
                    Some(XmlNode::Text(text.into_owned()))
                }
                Ok(Event::CData(t)) => Some(XmlNode::CData(
                    String::from_utf8_lossy(&t.into_inner()).into_owned(),
                )),
                Ok(Event::Comment(t)) => {
                    Some(XmlNode::Comment(String::from_utf8_lossy(&t).into_owned()))
                }
                Ok(Event::PI(t)) => Some(XmlNode::ProcessingInstruction(
                    String::from_utf8_lossy(&t).into_owned(),
                )),
                Ok(Event::Decl(_)) | Ok(Event::DocType(_)) => None,
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::xml(part, e)),
            };
            buf.clear();

            let Some(node) = node else { continue };
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }
            match node {
                XmlNode::Element(e) if root.is_none() => root = Some(e),
                XmlNode::Element(_) => {
                    return Err(XlsxError::xml(part, "more than one root element"))
                }
                // whitespace between top-level nodes is not kept
                XmlNode::Text(t) if t.trim().is_empty() => {}
                XmlNode::Text(_) | XmlNode::CData(_) => {
                    return Err(XlsxError::xml(part, "text outside the root element"))
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if !stack.is_empty() {
            return Err(XlsxError::xml(part, "unexpected end of document"));
        }
        let root = root.ok_or_else(|| XlsxError::xml(part, "no root element"))?;
        Ok(Self {
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize with a standard declaration
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
        for node in &self.prolog {
            node.write_to(&mut out);
        }
        self.root.write_to(&mut out);
        for node in &self.epilog {
            node.write_to(&mut out);
        }
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml_string().into_bytes()
    }

    pub fn namespace_scope(&self) -> NamespaceScope {
        NamespaceScope::of_root(&self.root)
    }
}

fn element_from_start(e: &BytesStart<'_>, part: &str) -> XlsxResult<XmlElement> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| XlsxError::xml(part, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| XlsxError::xml(part, err))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}
