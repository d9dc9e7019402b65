// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schema descriptors: the per-type static metadata driving the codec engine.
//!
//! Each serializable type exposes one immutable [`Schema`] describing its
//! qualified element name and, in declaration order, how each property maps
//! to an attribute or child element. The schema is built once through
//! [`SchemaBuilder`] and shared across all instances, typically from a
//! `once_cell::sync::Lazy` static inside [`XmlObject::schema`]:
//!
//! ```rust
//! use once_cell::sync::Lazy;
//! use schema_xml::value::Text;
//! use schema_xml::{Binding, Leaf, Schema, XmlObject};
//!
//! #[derive(Debug, Default)]
//! struct Sig {
//!     algorithm: Option<String>,
//!     binding: Binding,
//! }
//!
//! impl XmlObject for Sig {
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: Lazy<Schema<Sig>> = Lazy::new(|| {
//!             Schema::builder("Sig")
//!                 .attribute(
//!                     Leaf::new("Algorithm").required(),
//!                     Text,
//!                     |s: &Sig| s.algorithm.as_ref(),
//!                     |s, v| s.algorithm = v,
//!                 )
//!                 .build()
//!         });
//!         &SCHEMA
//!     }
//!     fn binding(&self) -> &Binding {
//!         &self.binding
//!     }
//!     fn binding_mut(&mut self) -> &mut Binding {
//!         &mut self.binding
//!     }
//! }
//! ```
//!
//! Property access is captured at registration time as plain accessor and
//! mutator functions; the engine never reaches into fields itself. Nested
//! types additionally supply a factory function producing a fresh instance
//! during deserialization.

use crate::tree::{Document, Element};
use crate::value::Convert;
use crate::{Error, QName};

type GetFn<T> = Box<dyn Fn(&T) -> Option<String> + Send + Sync>;
type IsDefaultFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type SetFn<T> = Box<dyn Fn(&mut T, &str) -> Result<(), Error> + Send + Sync>;
type ResetFn<T> = Box<dyn Fn(&mut T) + Send + Sync>;
type PredicateFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// How one property maps to an attribute.
pub(crate) struct AttrSpec<T> {
    pub(crate) name: QName,
    pub(crate) required: bool,
    pub(crate) get: GetFn<T>,
    pub(crate) is_default: IsDefaultFn<T>,
    pub(crate) set: SetFn<T>,
    pub(crate) reset: ResetFn<T>,
}

/// How one property maps to a child element (or a flattened run of them).
pub(crate) struct ChildSpec<T> {
    pub(crate) name: QName,
    pub(crate) required: bool,
    pub(crate) kind: ChildKind<T>,
}

pub(crate) enum ChildKind<T> {
    /// Text content converted to and from a leaf value.
    Leaf {
        get: GetFn<T>,
        is_default: IsDefaultFn<T>,
        set: SetFn<T>,
        reset: ResetFn<T>,
    },
    /// A nested serializable object, matched by the nested type's qualified name.
    Nested {
        changed: PredicateFn<T>,
        present: PredicateFn<T>,
        build: Box<dyn Fn(&mut T) -> Result<Option<Element>, Error> + Send + Sync>,
        load: Box<dyn Fn(&mut T, &Element) -> Result<(), Error> + Send + Sync>,
    },
    /// A flattened ("no root") homogeneous collection: the items appear
    /// directly under the parent, with no wrapper element, bounded by
    /// `[min_occurs, max_occurs]`.
    Flattened {
        min_occurs: usize,
        max_occurs: usize,
        changed: PredicateFn<T>,
        build: Box<dyn Fn(&mut T) -> Result<Vec<Element>, Error> + Send + Sync>,
        load: Box<dyn Fn(&mut T, &Element) -> Result<usize, Error> + Send + Sync>,
    },
}

/// The static metadata for one serializable type: qualified name plus the
/// declaration-ordered attribute and element mappings.
///
/// Immutable once built; iteration order is declaration order and determines
/// emission order.
pub struct Schema<T> {
    pub(crate) name: QName,
    pub(crate) attributes: Vec<AttrSpec<T>>,
    pub(crate) elements: Vec<ChildSpec<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn builder(local_name: &str) -> SchemaBuilder<T> {
        SchemaBuilder {
            name: QName::new(local_name),
            attributes: Vec::new(),
            elements: Vec::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &QName {
        &self.name
    }
}

/// Descriptor for a leaf attribute or element: qualified name, required
/// flag, and default value.
///
/// A property equal to its default (including an absent value with no
/// default) is omitted from output unless required; a required property may
/// never be absent.
pub struct Leaf<V> {
    pub(crate) name: QName,
    pub(crate) required: bool,
    pub(crate) default: Option<V>,
}

impl<V> Leaf<V> {
    pub fn new(local_name: &str) -> Self {
        Leaf {
            name: QName::new(local_name),
            required: false,
            default: None,
        }
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.name.namespace = Some(namespace.to_owned());
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.name.prefix = Some(prefix.to_owned());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, value: V) -> Self {
        self.default = Some(value);
        self
    }
}

/// Builds a [`Schema`], one property mapping at a time, in declaration order.
pub struct SchemaBuilder<T> {
    name: QName,
    attributes: Vec<AttrSpec<T>>,
    elements: Vec<ChildSpec<T>>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Sets the namespace URI of the element this type serializes to.
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.name.namespace = Some(namespace.to_owned());
        self
    }

    /// Sets the preferred prefix of the element this type serializes to.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.name.prefix = Some(prefix.to_owned());
        self
    }

    /// Declares an attribute property with its converter and accessor/mutator pair.
    pub fn attribute<C>(
        mut self,
        leaf: Leaf<C::Value>,
        converter: C,
        get: fn(&T) -> Option<&C::Value>,
        set: fn(&mut T, Option<C::Value>),
    ) -> Self
    where
        C: Convert,
        C::Value: PartialEq + Clone + Send + Sync + 'static,
    {
        let Leaf {
            name,
            required,
            default,
        } = leaf;
        let compared = default.clone();
        let parser = converter.clone();
        self.attributes.push(AttrSpec {
            name,
            required,
            get: Box::new(move |t| get(t).map(|v| converter.to_text(v))),
            is_default: Box::new(move |t| get(t) == compared.as_ref()),
            set: Box::new(move |t, text| {
                let value = parser.parse(text).map_err(Error::value)?;
                set(t, Some(value));
                Ok(())
            }),
            reset: Box::new(move |t| set(t, default.clone())),
        });
        self
    }

    /// Declares a leaf element property: text content through a converter.
    pub fn element<C>(
        mut self,
        leaf: Leaf<C::Value>,
        converter: C,
        get: fn(&T) -> Option<&C::Value>,
        set: fn(&mut T, Option<C::Value>),
    ) -> Self
    where
        C: Convert,
        C::Value: PartialEq + Clone + Send + Sync + 'static,
    {
        let Leaf {
            name,
            required,
            default,
        } = leaf;
        let compared = default.clone();
        let parser = converter.clone();
        self.elements.push(ChildSpec {
            name,
            required,
            kind: ChildKind::Leaf {
                get: Box::new(move |t| get(t).map(|v| converter.to_text(v))),
                is_default: Box::new(move |t| get(t) == compared.as_ref()),
                set: Box::new(move |t, text| {
                    let value = parser.parse(text).map_err(Error::value)?;
                    set(t, Some(value));
                    Ok(())
                }),
                reset: Box::new(move |t| set(t, default.clone())),
            },
        });
        self
    }

    /// Declares a nested object property.
    ///
    /// The child element is matched by `U`'s own qualified name; `make`
    /// produces the fresh instance filled during deserialization.
    pub fn nested<U: XmlObject>(
        mut self,
        required: bool,
        make: fn() -> U,
        get: fn(&T) -> Option<&U>,
        get_mut: fn(&mut T) -> &mut Option<U>,
    ) -> Self {
        let name = U::schema().name.clone();
        self.elements.push(ChildSpec {
            name,
            required,
            kind: ChildKind::Nested {
                changed: Box::new(move |t| get(t).map_or(false, |u| crate::ser::has_changed(u))),
                present: Box::new(move |t| get(t).is_some()),
                build: Box::new(move |t| match get_mut(t).as_mut() {
                    Some(child) => Ok(Some(crate::ser::get_xml(child)?.clone())),
                    None => Ok(None),
                }),
                load: Box::new(move |t, el| {
                    let mut child = make();
                    crate::de::load_xml(&mut child, Some(el))?;
                    *get_mut(t) = Some(child);
                    Ok(())
                }),
            },
        });
        self
    }

    /// Declares a flattened collection property holding `Vec<U>`.
    ///
    /// The items appear directly under this type's element with no wrapper;
    /// on both paths the engine validates that the item count lies within
    /// `[min_occurs, max_occurs]` (inclusive).
    pub fn flattened<U: XmlObject>(
        mut self,
        min_occurs: usize,
        max_occurs: usize,
        make: fn() -> U,
        get: fn(&T) -> &Vec<U>,
        get_mut: fn(&mut T) -> &mut Vec<U>,
    ) -> Self {
        debug_assert!(min_occurs <= max_occurs);
        let name = U::schema().name.clone();
        let matched = name.clone();
        self.elements.push(ChildSpec {
            name,
            required: false,
            kind: ChildKind::Flattened {
                min_occurs,
                max_occurs,
                changed: Box::new(move |t| get(t).iter().any(|u| crate::ser::has_changed(u))),
                build: Box::new(move |t| {
                    let mut out = Vec::new();
                    for child in get_mut(t).iter_mut() {
                        out.push(crate::ser::get_xml(child)?.clone());
                    }
                    Ok(out)
                }),
                load: Box::new(move |t, parent| {
                    let items = get_mut(t);
                    items.clear();
                    for candidate in parent.child_elements() {
                        if matched.matches_name(candidate.name()) {
                            let mut child = make();
                            crate::de::load_xml(&mut child, Some(candidate))?;
                            items.push(child);
                        }
                    }
                    Ok(items.len())
                }),
            },
        });
        self
    }

    pub fn build(self) -> Schema<T> {
        Schema {
            name: self.name,
            attributes: self.attributes,
            elements: self.elements,
        }
    }
}

/// Per-instance binding state: the cached element and the prefix override.
///
/// The cache holds the last element built by `get_xml` or bound by
/// `load_xml` and is reused verbatim while the change tracker reports no
/// changes. Only the engine fills it; callers that mutate leaf properties
/// behind the engine's back must call [`Binding::invalidate`] to force a
/// rebuild.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    element: Option<Element>,
    prefix: Option<String>,
}

impl Binding {
    /// The cached element, if this instance has been built or bound.
    #[inline]
    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    /// The prefix this instance emits its own qualified name with, when it
    /// overrides the schema-declared one. Adopted from the source element by
    /// `load_xml` (empty when the element had none).
    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = Some(prefix.to_owned());
    }

    /// Drops the cached element so the next `get_xml` rebuilds it.
    pub fn invalidate(&mut self) {
        self.element = None;
    }

    pub(crate) fn store(&mut self, element: Element) {
        self.element = Some(element);
    }
}

/// A type that maps to and from an XML element under a declared [`Schema`].
///
/// Implementors supply the schema, access to the per-instance [`Binding`],
/// and optionally the two customization hooks; the codec engine itself comes
/// as provided methods.
pub trait XmlObject: Sized + 'static {
    /// This type's immutable schema descriptor.
    fn schema() -> &'static Schema<Self>;

    fn binding(&self) -> &Binding;

    fn binding_mut(&mut self) -> &mut Binding;

    /// Hook invoked after the engine has built this instance's element,
    /// before it is cached; may mutate the element further.
    fn on_get_xml(&mut self, _element: &mut Element) {}

    /// Hook invoked after the engine has populated this instance's
    /// properties from `_element`, before the element is cached.
    fn on_load_xml(&mut self, _element: &Element) -> Result<(), Error> {
        Ok(())
    }

    /// True if the cached element is absent or any nested child reports a
    /// change; false means the cache is still a faithful representation.
    fn has_changed(&self) -> bool {
        crate::ser::has_changed(self)
    }

    /// Serializes this instance, returning the cached element unchanged when
    /// nothing has changed since it was built or loaded.
    fn get_xml(&mut self) -> Result<&Element, Error> {
        crate::ser::get_xml(self)
    }

    /// Populates this instance from `element`, which must carry this type's
    /// qualified name. Fails with [`Error::ParamRequired`] on `None`.
    fn load_xml(&mut self, element: Option<&Element>) -> Result<(), Error> {
        crate::de::load_xml(self, element)
    }

    /// Serializes this instance to text.
    fn to_xml_string(&mut self) -> Result<String, Error> {
        crate::ser::to_string(self)
    }

    /// The cached element, if any.
    fn element(&self) -> Option<&Element> {
        self.binding().element()
    }

    /// A fresh element carrying this type's qualified name, with the
    /// instance's prefix override applied.
    fn create_element(&self) -> Element {
        let schema = Self::schema();
        let mut name = schema.name.clone();
        if let Some(p) = self.binding().prefix() {
            name.prefix = if p.is_empty() { None } else { Some(p.to_owned()) };
        }
        Element::new(name)
    }

    /// A minimal single-element document rooted at this type's qualified name.
    fn create_document(&self) -> Result<Document, Error> {
        let schema = Self::schema();
        let prefix = self.binding().prefix().or(schema.name.prefix.as_deref());
        Document::with_root(
            &schema.name.local_name,
            schema.name.namespace.as_deref(),
            prefix,
        )
    }

    /// The bound element, or [`Error::NullParam`] if none is cached yet.
    fn bound_element(&self) -> Result<&Element, Error> {
        self.binding().element().ok_or_else(|| Error::NullParam {
            type_name: Self::schema().name.local_name.clone(),
        })
    }

    /// Finds the first descendant of the bound element named `name`.
    fn get_element(&self, name: &str, required: bool) -> Result<Option<&Element>, Error> {
        let el = self.bound_element()?;
        match el.find_descendant(name) {
            Some(found) => Ok(Some(found)),
            None if required => Err(Error::ElementMissing {
                element: name.to_owned(),
                owner: el.local_name().to_owned(),
            }),
            None => Ok(None),
        }
    }

    /// Reads an un-namespaced attribute of the bound element, falling back
    /// to `default` when absent and not required.
    fn get_attribute(
        &self,
        name: &str,
        default: Option<&str>,
        required: bool,
    ) -> Result<Option<String>, Error> {
        let el = self.bound_element()?;
        match el.attribute(name) {
            Some(value) => Ok(Some(value.to_owned())),
            None if required => Err(Error::AttributeMissing {
                attribute: name.to_owned(),
                owner: el.local_name().to_owned(),
            }),
            None => Ok(default.map(str::to_owned)),
        }
    }

    /// Direct children of the bound element named `local_name`, defaulting
    /// the namespace to this type's own.
    fn get_children(
        &self,
        local_name: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<&Element>, Error> {
        let el = self.bound_element()?;
        let ns = namespace.or_else(|| Self::schema().name.namespace.as_deref());
        Ok(el.children_named(local_name, ns))
    }

    /// First direct child of the bound element named `local_name` in this
    /// type's namespace.
    fn get_child(&self, local_name: &str, required: bool) -> Result<Option<&Element>, Error> {
        let el = self.bound_element()?;
        match el.first_child(local_name, Self::schema().name.namespace.as_deref()) {
            Some(found) => Ok(Some(found)),
            None if required => Err(Error::ElementMissing {
                element: local_name.to_owned(),
                owner: el.local_name().to_owned(),
            }),
            None => Ok(None),
        }
    }

    /// First direct child of the bound element named `local_name`; a `None`
    /// namespace matches any.
    fn get_first_child(
        &self,
        local_name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<&Element>, Error> {
        Ok(self.bound_element()?.first_child(local_name, namespace))
    }
}
