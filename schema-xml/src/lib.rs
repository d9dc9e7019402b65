// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema-driven bidirectional mapping between typed Rust object graphs and
//! XML element trees.
//!
//! Each type declares, via an immutable [`Schema`] built once at registration
//! time, which of its properties map to XML attributes and which to child
//! elements: qualified name, required/default policy, value conversion,
//! nested-object factories, and flattened ("no root") repeated-element
//! collections. The [`XmlObject`] trait then provides the two symmetric
//! tree-walking operations, [`XmlObject::get_xml`] and [`XmlObject::load_xml`],
//! together with change tracking over a per-instance cached element.

pub mod de;
pub mod error;
pub mod schema;
pub mod ser;
pub mod tree;
pub mod value;

pub use de::from_str;
pub use error::Error;
pub use schema::{Binding, Leaf, Schema, SchemaBuilder, XmlObject};
pub use tree::{get_element_by_id, Document, Element, Node};
pub use value::Convert;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Shorthand for `Box<dyn std::error::Error + 'static>`.
pub type BoxedStdError = Box<dyn std::error::Error + 'static>;

/// A qualified name: local name, namespace URI, and prefix.
///
/// The namespace and prefix are optional; "no namespace" is represented by
/// the single canonical value `None`, never by an empty string. Equality of
/// two qualified names ignores the prefix, which is semantically
/// insignificant.
#[derive(Clone, Debug, Eq)]
pub struct QName {
    pub local_name: String,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
}

impl QName {
    pub fn new(local_name: &str) -> Self {
        QName {
            local_name: local_name.to_owned(),
            namespace: None,
            prefix: None,
        }
    }

    pub fn namespaced(local_name: &str, namespace: &str) -> Self {
        QName {
            local_name: local_name.to_owned(),
            namespace: Some(namespace.to_owned()),
            prefix: None,
        }
    }

    pub fn prefixed(local_name: &str, namespace: &str, prefix: &str) -> Self {
        QName {
            local_name: local_name.to_owned(),
            namespace: Some(namespace.to_owned()),
            prefix: Some(prefix.to_owned()),
        }
    }

    /// Loose qualified-name match: equal local names and equal namespaces,
    /// where both-absent namespaces match.
    pub fn matches(&self, local_name: &str, namespace: Option<&str>) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    pub(crate) fn matches_name(&self, other: &QName) -> bool {
        self.matches(&other.local_name, other.namespace.as_deref())
    }

    pub(crate) fn from_xml_name(name: &xml::name::OwnedName) -> Self {
        let namespace = match name.namespace.as_deref() {
            // Work around xml-rs's erroneous lack of builtin
            // xmlns:xml="http://www.w3.org/XML/1998/namespace" mapping.
            None if name.prefix.as_deref() == Some("xml") => Some(XML_NS.to_owned()),
            None | Some("") => None,
            Some(ns) => Some(ns.to_owned()),
        };
        QName {
            local_name: name.local_name.clone(),
            namespace,
            prefix: match name.prefix.as_deref() {
                None | Some("") => None,
                Some(p) => Some(p.to_owned()),
            },
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.local_name == other.local_name && self.namespace == other.namespace
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace.as_deref() {
            None => write!(f, "{}", self.local_name),
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_matching() {
        let plain = QName::new("Value");
        assert!(plain.matches("Value", None));
        assert!(!plain.matches("Value", Some("urn:x")));
        assert!(!plain.matches("Other", None));

        let ns = QName::prefixed("Signature", "urn:sig", "ds");
        assert!(ns.matches("Signature", Some("urn:sig")));
        assert!(!ns.matches("Signature", None));

        // Prefix is not part of equality.
        assert_eq!(ns, QName::namespaced("Signature", "urn:sig"));
    }

    #[test]
    fn display() {
        assert_eq!(QName::new("a").to_string(), "a");
        assert_eq!(QName::namespaced("a", "urn:x").to_string(), "{urn:x}a");
    }
}
