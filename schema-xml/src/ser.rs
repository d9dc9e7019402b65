// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialization: the change tracker and the object-to-element walk.

use log::trace;

use crate::schema::{ChildKind, XmlObject};
use crate::tree::Element;
use crate::Error;

/// Returns true if `instance` must be rebuilt: either it has no cached
/// element, or some nested child (checked depth-first in declaration order,
/// short-circuiting) reports a change of its own.
///
/// This is re-evaluated on every [`get_xml`] call, never cached itself.
pub fn has_changed<T: XmlObject>(instance: &T) -> bool {
    let schema = T::schema();
    for child in &schema.elements {
        let changed = match &child.kind {
            ChildKind::Nested { changed, .. } => changed(instance),
            ChildKind::Flattened { changed, .. } => changed(instance),
            ChildKind::Leaf { .. } => false,
        };
        if changed {
            return true;
        }
    }
    instance.binding().element().is_none()
}

/// Serializes `instance` to an element, returning the cached one unchanged
/// when [`has_changed`] reports no change.
pub fn get_xml<T: XmlObject>(instance: &mut T) -> Result<&Element, Error> {
    if has_changed(instance) {
        let element = build(instance)?;
        instance.binding_mut().store(element);
    }
    // `build` + `store` above guarantee the cache is populated.
    instance.binding().element().ok_or_else(|| Error::NullParam {
        type_name: T::schema().name.local_name.clone(),
    })
}

/// Serializes `instance` to text.
pub fn to_string<T: XmlObject>(instance: &mut T) -> Result<String, Error> {
    get_xml(instance)?.to_xml_string()
}

fn build<T: XmlObject>(instance: &mut T) -> Result<Element, Error> {
    let schema = T::schema();
    let owner = schema.name.local_name.as_str();
    trace!("building <{}>", &schema.name);

    let mut name = schema.name.clone();
    if let Some(p) = instance.binding().prefix() {
        name.prefix = if p.is_empty() { None } else { Some(p.to_owned()) };
    }
    let mut element = Element::new(name);

    for attr in &schema.attributes {
        let value = (attr.get)(instance);
        if attr.required && value.is_none() {
            return Err(Error::AttributeMissing {
                attribute: attr.name.local_name.clone(),
                owner: owner.to_owned(),
            });
        }
        // Attributes equal to their default are never written.
        if attr.required || !(attr.is_default)(instance) {
            if let Some(value) = value {
                match attr.name.namespace.as_deref() {
                    None => element.set_attribute(&attr.name.local_name, value),
                    Some(ns) => element.set_attribute_ns(ns, &attr.name.local_name, value),
                }
            }
        }
    }

    for child in &schema.elements {
        match &child.kind {
            ChildKind::Leaf {
                get, is_default, ..
            } => {
                let value = get(instance);
                if child.required && value.is_none() {
                    return Err(Error::ElementMissing {
                        element: child.name.local_name.clone(),
                        owner: owner.to_owned(),
                    });
                }
                // Same default-omission rule as attributes.
                if child.required || !is_default(instance) {
                    if let Some(value) = value {
                        let mut leaf = Element::new(child.name.clone());
                        leaf.set_text(&value);
                        element.append_child(leaf);
                    }
                }
            }
            ChildKind::Nested { present, build, .. } => {
                if child.required && !present(instance) {
                    return Err(Error::ElementMissing {
                        element: child.name.local_name.clone(),
                        owner: owner.to_owned(),
                    });
                }
                if let Some(node) = build(instance)? {
                    element.append_child(node);
                }
            }
            ChildKind::Flattened {
                min_occurs,
                max_occurs,
                build,
                ..
            } => {
                let items = build(instance)?;
                if items.len() < *min_occurs || items.len() > *max_occurs {
                    return Err(Error::CollectionLimit {
                        collection: child.name.local_name.clone(),
                        owner: owner.to_owned(),
                    });
                }
                for item in items {
                    element.append_child(item);
                }
            }
        }
    }

    instance.on_get_xml(&mut element);
    Ok(element)
}
