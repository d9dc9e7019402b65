// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample schema vocabulary shared by the integration tests: a small
//! XML-DSIG-flavored object model exercising attributes, leaf elements,
//! defaults, nesting, and flattened collections.

use once_cell::sync::Lazy;
use schema_xml::value::{Base64, Num, Text};
use schema_xml::{Binding, Leaf, Schema, XmlObject};

pub const SIG_NS: &str = "urn:example:sig";

/// Un-namespaced element with a required attribute, a defaulted numeric
/// attribute, a defaulted leaf element, and a base64 leaf element.
#[derive(Debug, Default)]
pub struct Sig {
    pub algorithm: Option<String>,
    pub key_size: Option<u32>,
    pub value: Option<String>,
    pub digest: Option<Vec<u8>>,
    pub binding: Binding,
}

impl XmlObject for Sig {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Sig>> = Lazy::new(|| {
            Schema::builder("Sig")
                .attribute(
                    Leaf::new("Algorithm").required(),
                    Text,
                    |s: &Sig| s.algorithm.as_ref(),
                    |s, v| s.algorithm = v,
                )
                .attribute(
                    Leaf::new("KeySize").default(2048),
                    Num::<u32>::new(),
                    |s: &Sig| s.key_size.as_ref(),
                    |s, v| s.key_size = v,
                )
                .element(
                    Leaf::new("Value").default(String::new()),
                    Text,
                    |s: &Sig| s.value.as_ref(),
                    |s, v| s.value = v,
                )
                .element(
                    Leaf::new("Digest"),
                    Base64,
                    |s: &Sig| s.digest.as_ref(),
                    |s, v| s.digest = v,
                )
                .build()
        });
        &SCHEMA
    }

    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}

/// Repeated child of [`SignedInfo`]; appears flattened, never wrapped.
#[derive(Debug, Default)]
pub struct Transform {
    pub algorithm: Option<String>,
    pub binding: Binding,
}

impl XmlObject for Transform {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Transform>> = Lazy::new(|| {
            Schema::builder("Transform")
                .namespace(SIG_NS)
                .prefix("ds")
                .attribute(
                    Leaf::new("Algorithm").required(),
                    Text,
                    |t: &Transform| t.algorithm.as_ref(),
                    |t, v| t.algorithm = v,
                )
                .build()
        });
        &SCHEMA
    }

    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}

/// Holds a flattened `Transform` collection (1 to 3 occurrences) plus a
/// namespaced leaf element.
#[derive(Debug, Default)]
pub struct SignedInfo {
    pub transforms: Vec<Transform>,
    pub digest_value: Option<String>,
    pub binding: Binding,
}

impl XmlObject for SignedInfo {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<SignedInfo>> = Lazy::new(|| {
            Schema::builder("SignedInfo")
                .namespace(SIG_NS)
                .prefix("ds")
                .flattened(
                    1,
                    3,
                    Transform::default,
                    |s: &SignedInfo| &s.transforms,
                    |s| &mut s.transforms,
                )
                .element(
                    Leaf::new("DigestValue").namespace(SIG_NS).prefix("ds"),
                    Text,
                    |s: &SignedInfo| s.digest_value.as_ref(),
                    |s, v| s.digest_value = v,
                )
                .build()
        });
        &SCHEMA
    }

    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}

#[derive(Debug, Default)]
pub struct KeyInfo {
    pub key_name: Option<String>,
    pub binding: Binding,
}

impl XmlObject for KeyInfo {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<KeyInfo>> = Lazy::new(|| {
            Schema::builder("KeyInfo")
                .namespace(SIG_NS)
                .prefix("ds")
                .element(
                    Leaf::new("KeyName").namespace(SIG_NS).prefix("ds"),
                    Text,
                    |k: &KeyInfo| k.key_name.as_ref(),
                    |k, v| k.key_name = v,
                )
                .build()
        });
        &SCHEMA
    }

    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}

/// Root element: one required nested object and one optional nested object.
#[derive(Debug, Default)]
pub struct Signature {
    pub signed_info: Option<SignedInfo>,
    pub key_info: Option<KeyInfo>,
    pub binding: Binding,
}

impl XmlObject for Signature {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Signature>> = Lazy::new(|| {
            Schema::builder("Signature")
                .namespace(SIG_NS)
                .prefix("ds")
                .nested(
                    true,
                    SignedInfo::default,
                    |s: &Signature| s.signed_info.as_ref(),
                    |s| &mut s.signed_info,
                )
                .nested(
                    false,
                    KeyInfo::default,
                    |s: &Signature| s.key_info.as_ref(),
                    |s| &mut s.key_info,
                )
                .build()
        });
        &SCHEMA
    }

    fn binding(&self) -> &Binding {
        &self.binding
    }

    fn binding_mut(&mut self) -> &mut Binding {
        &mut self.binding
    }
}
