// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deserialization: the element-to-object walk.

use log::trace;

use crate::schema::{ChildKind, XmlObject};
use crate::tree::{Document, Element};
use crate::Error;

/// Parses an XML document and loads its root element into a fresh `T`.
pub fn from_str<T: XmlObject + Default>(text: &str) -> Result<T, Error> {
    let document = Document::parse(text)?;
    let mut out = T::default();
    load_xml(&mut out, Some(document.root()))?;
    Ok(out)
}

/// Populates `instance` in place from `element`.
///
/// Fails fast on the first schema violation; on error the instance's
/// properties are not guaranteed consistent and it should be discarded.
pub fn load_xml<T: XmlObject>(instance: &mut T, element: Option<&Element>) -> Result<(), Error> {
    let element = element.ok_or(Error::ParamRequired { name: "element" })?;
    let schema = T::schema();
    let owner = schema.name.local_name.as_str();

    if !schema.name.matches_name(element.name()) {
        return Err(Error::ElementMalformed {
            expected: owner.to_owned(),
        });
    }
    trace!("loading <{}>", &schema.name);

    for attr in &schema.attributes {
        let raw = match attr.name.namespace.as_deref() {
            Some(ns) => element.attribute_ns(ns, &attr.name.local_name),
            None => element.attribute(&attr.name.local_name),
        };
        match raw {
            Some(text) => (attr.set)(instance, text)?,
            None if attr.required => {
                return Err(Error::AttributeMissing {
                    attribute: attr.name.local_name.clone(),
                    owner: owner.to_owned(),
                });
            }
            None => (attr.reset)(instance),
        }
    }

    for child in &schema.elements {
        match &child.kind {
            ChildKind::Flattened {
                min_occurs,
                max_occurs,
                load,
                ..
            } => {
                // The wrapper element never exists; the collection scans the
                // parent's children itself.
                let count = load(instance, element)?;
                if count < *min_occurs || count > *max_occurs {
                    return Err(Error::CollectionLimit {
                        collection: child.name.local_name.clone(),
                        owner: owner.to_owned(),
                    });
                }
            }
            ChildKind::Leaf { set, reset, .. } => {
                let found = element
                    .child_elements()
                    .find(|c| child.name.matches_name(c.name()));
                match found {
                    Some(c) => set(instance, &c.text())?,
                    None if child.required => {
                        return Err(Error::ElementMissing {
                            element: child.name.local_name.clone(),
                            owner: owner.to_owned(),
                        });
                    }
                    None => reset(instance),
                }
            }
            ChildKind::Nested { load, .. } => {
                let found = element
                    .child_elements()
                    .find(|c| child.name.matches_name(c.name()));
                match found {
                    Some(c) => load(instance, c)?,
                    None if child.required => {
                        return Err(Error::ElementMissing {
                            element: child.name.local_name.clone(),
                            owner: owner.to_owned(),
                        });
                    }
                    // An optional nested property is left untouched when absent.
                    None => {}
                }
            }
        }
    }

    instance.on_load_xml(element)?;

    // Adopt the element's prefix and cache the element itself, so an
    // unchanged instance's next get_xml returns this exact node.
    let binding = instance.binding_mut();
    binding.set_prefix(element.prefix().unwrap_or(""));
    binding.store(element.clone());
    Ok(())
}
