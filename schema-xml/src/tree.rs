// SPDX-License-Identifier: MIT OR Apache-2.0

//! An owned XML element tree with namespace-aware navigation, plus the text
//! entry and exit points built on `xml-rs` events.
//!
//! This is deliberately small: it carries exactly what the codec engine
//! needs (attributes, element and text children, qualified names) and none
//! of what it doesn't (comments, processing instructions, DTDs).

use std::collections::HashMap;

use xml::reader::XmlEvent as ReadEvent;
use xml::writer::XmlEvent as WriteEvent;

use crate::{Error, QName};

/// A child node of an [`Element`]: either a nested element or a text run.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An attribute: qualified name and lexical value.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

/// One element of the tree, owning its attributes and children.
///
/// `Element` has value semantics: cloning clones the whole subtree, and a
/// child appended to a parent is owned by that parent alone.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    name: QName,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(name: QName) -> Self {
        Element {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &QName {
        &self.name
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.name.namespace.as_deref()
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.name.prefix.as_deref()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Returns the value of the un-namespaced attribute `local_name`, if any.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.namespace.is_none() && a.name.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Returns the value of the attribute `local_name` in `namespace`, if any.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.matches(local_name, Some(namespace)))
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, local_name: &str) -> bool {
        self.attribute(local_name).is_some()
    }

    pub fn has_attribute_ns(&self, namespace: &str, local_name: &str) -> bool {
        self.attribute_ns(namespace, local_name).is_some()
    }

    /// Sets the un-namespaced attribute `local_name`, replacing any existing value.
    pub fn set_attribute(&mut self, local_name: &str, value: String) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.namespace.is_none() && a.name.local_name == local_name)
        {
            Some(a) => a.value = value,
            None => self.attributes.push(Attribute {
                name: QName::new(local_name),
                value,
            }),
        }
    }

    /// Sets the attribute `local_name` in `namespace`, replacing any existing value.
    pub fn set_attribute_ns(&mut self, namespace: &str, local_name: &str, value: String) {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name.matches(local_name, Some(namespace)))
        {
            Some(a) => a.value = value,
            None => self.attributes.push(Attribute {
                name: QName::namespaced(local_name, namespace),
                value,
            }),
        }
    }

    /// Returns the concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        fn collect(el: &Element, out: &mut String) {
            for node in &el.children {
                match node {
                    Node::Text(t) => out.push_str(t),
                    Node::Element(c) => collect(c, out),
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }

    /// Replaces all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text.to_owned()));
        }
    }

    pub fn append_child(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Iterates over direct element children, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Returns the first direct child named `local_name`.
    ///
    /// A `namespace` of `None` matches a child in any namespace; pass
    /// `Some(ns)` to restrict the match.
    pub fn first_child(&self, local_name: &str, namespace: Option<&str>) -> Option<&Element> {
        self.child_elements().find(|c| {
            c.local_name() == local_name
                && (namespace.is_none() || c.namespace() == namespace)
        })
    }

    /// Returns all direct children named `local_name`, in document order.
    ///
    /// Namespace handling matches [`Element::first_child`].
    pub fn children_named(&self, local_name: &str, namespace: Option<&str>) -> Vec<&Element> {
        self.child_elements()
            .filter(|c| {
                c.local_name() == local_name
                    && (namespace.is_none() || c.namespace() == namespace)
            })
            .collect()
    }

    /// Returns the first descendant (excluding `self`) named `local_name`,
    /// depth-first in document order.
    pub fn find_descendant(&self, local_name: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.local_name() == local_name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(local_name) {
                return Some(found);
            }
        }
        None
    }

    /// Serializes this element (and subtree) to a string, without an XML
    /// declaration.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        let mut writer = xml::writer::EventWriter::new_with_config(
            &mut out,
            xml::writer::EmitterConfig {
                write_document_declaration: false,
                ..Default::default()
            },
        );
        write_element(self, &mut writer, &HashMap::new())?;
        Ok(String::from_utf8(out).expect("xml-rs produced invalid UTF-8"))
    }
}

/// Looks an element up by ID attribute value.
///
/// Without schema-bound ID typing there is no real ID semantic, so this
/// scans for attributes literally named `Id`, then `ID`, then `id`, in that
/// precedence order; each candidate name is searched over the whole subtree
/// before falling back to the next.
pub fn get_element_by_id<'a>(root: &'a Element, id: &str) -> Option<&'a Element> {
    fn find_by_attr<'a>(el: &'a Element, attr: &str, id: &str) -> Option<&'a Element> {
        if el.attribute(attr) == Some(id) {
            return Some(el);
        }
        el.child_elements().find_map(|c| find_by_attr(c, attr, id))
    }
    ["Id", "ID", "id"]
        .iter()
        .find_map(|attr| find_by_attr(root, attr, id))
}

/// A parsed document: a thin owner of the root element.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Parses an XML document from text.
    pub fn parse(text: &str) -> Result<Document, Error> {
        let mut reader = xml::reader::EventReader::new(text.as_bytes());
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        loop {
            match reader.next()? {
                ReadEvent::StartElement {
                    name, attributes, ..
                } => {
                    let mut el = Element::new(QName::from_xml_name(&name));
                    for attr in &attributes {
                        el.attributes.push(Attribute {
                            name: QName::from_xml_name(&attr.name),
                            value: attr.value.clone(),
                        });
                    }
                    stack.push(el);
                }
                ReadEvent::EndElement { .. } => {
                    // xml-rs guarantees starts and ends are balanced.
                    if let Some(el) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(Node::Element(el)),
                            None => root = Some(el),
                        }
                    }
                }
                ReadEvent::Characters(text) | ReadEvent::CData(text) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(text));
                    }
                }
                ReadEvent::EndDocument => break,
                // Comments, PIs, ignorable whitespace, StartDocument.
                _ => {}
            }
        }
        match root {
            Some(root) => Ok(Document { root }),
            None => Err(Error::ParamRequired { name: "root" }),
        }
    }

    /// Builds a minimal single-element document by synthesizing and parsing
    /// the literal fragment
    /// `<prefix:local_name xmlns:prefix="namespace"></prefix:local_name>`,
    /// omitting the prefix and namespace clauses when absent.
    pub fn with_root(
        local_name: &str,
        namespace: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<Document, Error> {
        let prefix = prefix.filter(|p| !p.is_empty());
        let name = match prefix {
            Some(p) => format!("{}:{}", p, local_name),
            None => local_name.to_owned(),
        };
        let xmlns = match (namespace, prefix) {
            (Some(ns), Some(p)) => format!(" xmlns:{}=\"{}\"", p, ns),
            (Some(ns), None) => format!(" xmlns=\"{}\"", ns),
            (None, _) => String::new(),
        };
        Document::parse(&format!("<{}{}></{}>", name, xmlns, name))
    }

    #[inline]
    pub fn root(&self) -> &Element {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    #[inline]
    pub fn into_root(self) -> Element {
        self.root
    }

    pub fn to_xml_string(&self) -> Result<String, Error> {
        self.root.to_xml_string()
    }
}

/// Writes `el` and its subtree, declaring namespace mappings not already in
/// `scope` (a prefix-to-URI map, where the empty prefix is the default
/// namespace).
fn write_element<W: std::io::Write>(
    el: &Element,
    writer: &mut xml::writer::EventWriter<W>,
    scope: &HashMap<String, String>,
) -> Result<(), Error> {
    let mut local_scope = scope.clone();
    let mut decls: Vec<(String, String)> = Vec::new();

    fn declare(
        scope: &mut HashMap<String, String>,
        decls: &mut Vec<(String, String)>,
        prefix: &str,
        uri: &str,
    ) {
        if scope.get(prefix).map(String::as_str) != Some(uri) {
            scope.insert(prefix.to_owned(), uri.to_owned());
            decls.push((prefix.to_owned(), uri.to_owned()));
        }
    }

    let qualified = match (el.prefix(), el.namespace()) {
        (Some(p), Some(_)) => format!("{}:{}", p, el.local_name()),
        _ => el.local_name().to_owned(),
    };
    if let Some(ns) = el.namespace() {
        declare(
            &mut local_scope,
            &mut decls,
            el.prefix().unwrap_or(""),
            ns,
        );
    }

    // Unprefixed attributes are always un-namespaced, so a namespaced
    // attribute must resolve to some non-empty prefix, synthesizing one if
    // neither the attribute nor the scope supplies it.
    let mut resolved: Vec<(String, &str)> = Vec::with_capacity(el.attributes.len());
    for attr in &el.attributes {
        let qualified = match attr.name.namespace.as_deref() {
            None => attr.name.local_name.clone(),
            Some(ns) => {
                let prefix = attr
                    .name
                    .prefix
                    .clone()
                    .or_else(|| {
                        local_scope
                            .iter()
                            .find(|(p, u)| !p.is_empty() && u.as_str() == ns)
                            .map(|(p, _)| p.clone())
                    })
                    .unwrap_or_else(|| {
                        let mut i = 1;
                        loop {
                            let candidate = format!("ns{}", i);
                            if !local_scope.contains_key(&candidate) {
                                break candidate;
                            }
                            i += 1;
                        }
                    });
                declare(&mut local_scope, &mut decls, &prefix, ns);
                format!("{}:{}", prefix, attr.name.local_name)
            }
        };
        resolved.push((qualified, &attr.value));
    }

    let mut start = WriteEvent::start_element(qualified.as_str());
    for (prefix, uri) in &decls {
        start = if prefix.is_empty() {
            start.default_ns(uri.as_str())
        } else {
            start.ns(prefix.as_str(), uri.as_str())
        };
    }
    for (name, value) in &resolved {
        start = start.attr(name.as_str(), value);
    }
    writer.write(start)?;

    for node in &el.children {
        match node {
            Node::Text(t) => writer.write(WriteEvent::characters(t))?,
            Node::Element(c) => write_element(c, writer, &local_scope)?,
        }
    }
    writer.write(WriteEvent::end_element())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::Builder::new().is_test(true).try_init();
    }

    #[test]
    fn parse_simple() {
        init();
        let doc = Document::parse(r#"<a x="1"><b>hi</b><c/></a>"#).unwrap();
        let root = doc.root();
        assert_eq!(root.local_name(), "a");
        assert_eq!(root.attribute("x"), Some("1"));
        assert_eq!(root.first_child("b", None).unwrap().text(), "hi");
        assert!(root.first_child("c", None).is_some());
        assert!(root.first_child("d", None).is_none());
    }

    #[test]
    fn parse_bad_xml() {
        init();
        assert!(matches!(Document::parse("argh"), Err(Error::Parse(_))));
        assert!(matches!(Document::parse("<a><b></a>"), Err(Error::Parse(_))));
    }

    #[test]
    fn parse_namespaces() {
        init();
        let doc = Document::parse(
            r#"<ds:Sig xmlns:ds="urn:sig" ds:Algorithm="rsa"><ds:Value>x</ds:Value></ds:Sig>"#,
        )
        .unwrap();
        let root = doc.root();
        assert_eq!(root.local_name(), "Sig");
        assert_eq!(root.namespace(), Some("urn:sig"));
        assert_eq!(root.prefix(), Some("ds"));
        assert_eq!(root.attribute_ns("urn:sig", "Algorithm"), Some("rsa"));
        assert_eq!(root.attribute("Algorithm"), None);
        assert!(root.first_child("Value", Some("urn:sig")).is_some());
        assert!(root.first_child("Value", Some("urn:other")).is_none());
        // None namespace is a wildcard for lookups.
        assert!(root.first_child("Value", None).is_some());
    }

    #[test]
    fn cdata_is_text() {
        init();
        let doc = Document::parse("<a><![CDATA[1 < 2]]></a>").unwrap();
        assert_eq!(doc.root().text(), "1 < 2");
    }

    #[test]
    fn text_concatenates_descendants() {
        init();
        let doc = Document::parse("<a>x<b>y</b>z</a>").unwrap();
        assert_eq!(doc.root().text(), "xyz");
    }

    #[test]
    fn with_root_synthesis() {
        init();
        let doc = Document::with_root("Signature", Some("urn:sig"), Some("ds")).unwrap();
        assert_eq!(doc.root().local_name(), "Signature");
        assert_eq!(doc.root().namespace(), Some("urn:sig"));
        assert_eq!(doc.root().prefix(), Some("ds"));

        let doc = Document::with_root("root", None, None).unwrap();
        assert_eq!(doc.root().local_name(), "root");
        assert_eq!(doc.root().namespace(), None);

        let doc = Document::with_root("root", Some("urn:x"), None).unwrap();
        assert_eq!(doc.root().namespace(), Some("urn:x"));
        assert_eq!(doc.root().prefix(), None);
    }

    #[test]
    fn write_round_trip() {
        init();
        let text = r#"<ds:Sig xmlns:ds="urn:sig" Algorithm="rsa"><ds:Value>abc</ds:Value></ds:Sig>"#;
        let doc = Document::parse(text).unwrap();
        let out = doc.to_xml_string().unwrap();
        let reparsed = Document::parse(&out).unwrap();
        assert_eq!(doc.root(), reparsed.root());
    }

    #[test]
    fn write_plain() {
        init();
        let mut el = Element::new(QName::new("Sig"));
        el.set_attribute("Algorithm", "rsa".to_owned());
        assert_eq!(el.to_xml_string().unwrap(), r#"<Sig Algorithm="rsa" />"#);

        el.set_text("abc");
        assert_eq!(
            el.to_xml_string().unwrap(),
            r#"<Sig Algorithm="rsa">abc</Sig>"#
        );
    }

    #[test]
    fn write_synthesizes_attr_prefix() {
        init();
        let mut el = Element::new(QName::new("root"));
        el.set_attribute_ns("urn:x", "attr", "v".to_owned());
        let out = el.to_xml_string().unwrap();
        assert_eq!(out, r#"<root xmlns:ns1="urn:x" ns1:attr="v" />"#);
        let reparsed = Document::parse(&out).unwrap();
        assert_eq!(reparsed.root().attribute_ns("urn:x", "attr"), Some("v"));
    }

    #[test]
    fn set_attribute_replaces() {
        init();
        let mut el = Element::new(QName::new("a"));
        el.set_attribute("x", "1".to_owned());
        el.set_attribute("x", "2".to_owned());
        assert_eq!(el.attributes().len(), 1);
        assert_eq!(el.attribute("x"), Some("2"));
    }

    #[test]
    fn children_named_in_document_order() {
        init();
        let doc = Document::parse("<a><b i='1'/><c/><b i='2'/></a>").unwrap();
        let named = doc.root().children_named("b", None);
        assert_eq!(named.len(), 2);
        assert_eq!(named[0].attribute("i"), Some("1"));
        assert_eq!(named[1].attribute("i"), Some("2"));
    }

    #[test]
    fn find_descendant_depth_first() {
        init();
        let doc = Document::parse("<a><b><target i='deep'/></b><target i='shallow'/></a>").unwrap();
        // Depth-first document order finds the nested one first.
        assert_eq!(
            doc.root().find_descendant("target").unwrap().attribute("i"),
            Some("deep")
        );
        assert!(doc.root().find_descendant("missing").is_none());
    }

    #[test]
    fn element_by_id_precedence() {
        init();
        let doc = Document::parse(
            r#"<a><b id="k" n="lower"/><c ID="k" n="upper"/><d Id="k" n="mixed"/></a>"#,
        )
        .unwrap();
        // `Id` wins over `ID` wins over `id`, each searched tree-wide.
        assert_eq!(
            get_element_by_id(doc.root(), "k").unwrap().attribute("n"),
            Some("mixed")
        );

        let doc = Document::parse(r#"<a><b id="k" n="lower"/><c ID="k" n="upper"/></a>"#).unwrap();
        assert_eq!(
            get_element_by_id(doc.root(), "k").unwrap().attribute("n"),
            Some("upper")
        );
        assert!(get_element_by_id(doc.root(), "other").is_none());
    }
}
