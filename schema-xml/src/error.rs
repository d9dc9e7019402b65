// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors raised while serializing or deserializing.
//!
//! All failures are immediate and non-retryable: they represent schema
//! violations or malformed input, never transient conditions. A failed
//! `get_xml`/`load_xml` leaves no guarantee of a consistent partial object
//! or element; callers should discard the instance or element on error.

use crate::BoxedStdError;

#[derive(Debug)]
pub enum Error {
    /// A required input argument was absent, e.g. `load_xml(None)`.
    ParamRequired { name: &'static str },

    /// An operation required a bound element but the instance has none cached.
    NullParam { type_name: String },

    /// A required attribute was absent on serialize or deserialize.
    AttributeMissing { attribute: String, owner: String },

    /// A required child element was absent on serialize or deserialize.
    ElementMissing { element: String, owner: String },

    /// The element passed to `load_xml` does not match the type's qualified name.
    ElementMalformed { expected: String },

    /// A flattened collection's child count fell outside `[min_occurs, max_occurs]`.
    CollectionLimit { collection: String, owner: String },

    /// A syntax or encoding error from the underlying XML reader.
    Parse(xml::reader::Error),

    /// An error from the underlying XML writer.
    Emit(xml::writer::Error),

    /// A converter rejected a lexical value.
    Value(BoxedStdError),
}

impl Error {
    pub(crate) fn value(e: BoxedStdError) -> Self {
        Error::Value(e)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ParamRequired { name } => {
                write!(f, "required parameter {:?} is absent", name)
            }
            Error::NullParam { type_name } => {
                write!(f, "{} has no XML element bound", type_name)
            }
            Error::AttributeMissing { attribute, owner } => {
                write!(f, "required attribute {:?} is missing in <{}>", attribute, owner)
            }
            Error::ElementMissing { element, owner } => {
                write!(f, "required element <{}> is missing in <{}>", element, owner)
            }
            Error::ElementMalformed { expected } => {
                write!(f, "element is malformed or is not <{}>", expected)
            }
            Error::CollectionLimit { collection, owner } => {
                write!(
                    f,
                    "collection of <{}> in <{}> has an occurrence count outside its declared bounds",
                    collection, owner
                )
            }
            Error::Parse(e) => e.msg().fmt(f),
            Error::Emit(e) => e.fmt(f),
            Error::Value(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            // xml::reader::Error doesn't implement source so skip over it when
            // there's an underlying error.
            Error::Parse(e) => match e.kind() {
                xml::reader::ErrorKind::Syntax(_) => Some(e),
                xml::reader::ErrorKind::Io(io) => Some(io),
                xml::reader::ErrorKind::Utf8(utf) => Some(utf),
                xml::reader::ErrorKind::UnexpectedEof => Some(e),
            },
            Error::Emit(e) => Some(e),
            Error::Value(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<xml::reader::Error> for Error {
    fn from(e: xml::reader::Error) -> Self {
        Error::Parse(e)
    }
}

impl From<xml::writer::Error> for Error {
    fn from(e: xml::writer::Error) -> Self {
        Error::Emit(e)
    }
}
