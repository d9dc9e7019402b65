// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attribute and leaf element behavior: required checks, default omission,
//! converters, caching, and the bound-element helpers.

use assert_matches::assert_matches;
use schema_xml::{from_str, Document, Element, Error, XmlObject};
use test_suite::{Sig, Transform};

fn init() {
    let _ = env_logger::Builder::new().is_test(true).try_init();
}

#[test]
fn serialize_omits_defaults() {
    init();
    let mut sig = Sig {
        algorithm: Some("rsa".to_owned()),
        ..Default::default()
    };
    assert_eq!(sig.to_xml_string().unwrap(), r#"<Sig Algorithm="rsa" />"#);

    // A value equal to its declared default is omitted too.
    sig.key_size = Some(2048);
    sig.value = Some(String::new());
    sig.binding.invalidate();
    assert_eq!(sig.to_xml_string().unwrap(), r#"<Sig Algorithm="rsa" />"#);
}

#[test]
fn serialize_emits_non_defaults() {
    init();
    let mut sig = Sig {
        algorithm: Some("rsa".to_owned()),
        key_size: Some(4096),
        value: Some("abc".to_owned()),
        ..Default::default()
    };
    assert_eq!(
        sig.to_xml_string().unwrap(),
        r#"<Sig Algorithm="rsa" KeySize="4096"><Value>abc</Value></Sig>"#
    );
}

#[test]
fn serialize_requires_algorithm() {
    init();
    let mut sig = Sig::default();
    assert_matches!(
        sig.get_xml(),
        Err(Error::AttributeMissing { attribute, owner })
            if attribute == "Algorithm" && owner == "Sig"
    );
}

#[test]
fn load_assigns_defaults() {
    init();
    let sig: Sig = from_str(r#"<Sig Algorithm="rsa" />"#).unwrap();
    assert_eq!(sig.algorithm.as_deref(), Some("rsa"));
    assert_eq!(sig.key_size, Some(2048));
    assert_eq!(sig.value.as_deref(), Some(""));
    assert_eq!(sig.digest, None);
}

#[test]
fn load_requires_algorithm() {
    init();
    assert_matches!(
        from_str::<Sig>("<Sig />"),
        Err(Error::AttributeMissing { attribute, owner })
            if attribute == "Algorithm" && owner == "Sig"
    );
}

#[test]
fn load_rejects_wrong_element() {
    init();
    assert_matches!(
        from_str::<Sig>(r#"<Other Algorithm="rsa" />"#),
        Err(Error::ElementMalformed { expected }) if expected == "Sig"
    );
}

#[test]
fn load_requires_element() {
    init();
    let mut sig = Sig::default();
    assert_matches!(
        sig.load_xml(None),
        Err(Error::ParamRequired { name: "element" })
    );
}

#[test]
fn get_xml_reuses_cache() {
    init();
    let mut sig = Sig {
        algorithm: Some("rsa".to_owned()),
        ..Default::default()
    };
    let first = sig.get_xml().unwrap() as *const Element;
    assert!(!sig.has_changed());
    let second = sig.get_xml().unwrap() as *const Element;
    assert_eq!(first, second);
}

#[test]
fn load_then_get_returns_loaded_tree() {
    init();
    let doc = Document::parse(r#"<Sig Algorithm="rsa" KeySize="4096" />"#).unwrap();
    let mut sig = Sig::default();
    sig.load_xml(Some(doc.root())).unwrap();
    assert!(!sig.has_changed());
    assert_eq!(sig.get_xml().unwrap(), doc.root());
}

#[test]
fn invalidate_forces_rebuild() {
    init();
    let mut sig = Sig {
        algorithm: Some("rsa".to_owned()),
        ..Default::default()
    };
    sig.get_xml().unwrap();

    // The engine can't see a direct field write; the cache stays stale
    // until invalidated.
    sig.key_size = Some(4096);
    assert!(!sig.has_changed());
    assert_eq!(sig.get_xml().unwrap().attribute("KeySize"), None);

    sig.binding.invalidate();
    assert!(sig.has_changed());
    assert_eq!(sig.get_xml().unwrap().attribute("KeySize"), Some("4096"));
}

#[test]
fn prefix_adoption() {
    init();
    let doc = Document::parse(
        r#"<t:Transform xmlns:t="urn:example:sig" Algorithm="c14n" />"#,
    )
    .unwrap();
    let mut transform = Transform::default();
    transform.load_xml(Some(doc.root())).unwrap();
    assert_eq!(transform.binding.prefix(), Some("t"));

    // A rebuild keeps the adopted prefix rather than the schema's "ds".
    transform.binding.invalidate();
    assert_eq!(transform.get_xml().unwrap().prefix(), Some("t"));

    // An unprefixed source element adopts the empty prefix.
    let doc = Document::parse(
        r#"<Transform xmlns="urn:example:sig" Algorithm="c14n" />"#,
    )
    .unwrap();
    let mut transform = Transform::default();
    transform.load_xml(Some(doc.root())).unwrap();
    assert_eq!(transform.binding.prefix(), Some(""));
    transform.binding.invalidate();
    assert_eq!(transform.get_xml().unwrap().prefix(), None);
}

#[test]
fn bound_helpers_require_binding() {
    init();
    let sig = Sig::default();
    assert_matches!(
        sig.bound_element(),
        Err(Error::NullParam { type_name }) if type_name == "Sig"
    );
    assert_matches!(
        sig.get_attribute("Algorithm", None, true),
        Err(Error::NullParam { .. })
    );
    assert_matches!(sig.get_child("Value", false), Err(Error::NullParam { .. }));
}

#[test]
fn bound_helpers_after_load() {
    init();
    let sig: Sig =
        from_str(r#"<Sig Algorithm="rsa"><Value>abc</Value></Sig>"#).unwrap();

    assert_eq!(
        sig.get_attribute("Algorithm", None, true).unwrap().as_deref(),
        Some("rsa")
    );
    assert_eq!(
        sig.get_attribute("Missing", Some("fallback"), false)
            .unwrap()
            .as_deref(),
        Some("fallback")
    );
    assert_matches!(
        sig.get_attribute("Missing", None, true),
        Err(Error::AttributeMissing { attribute, owner })
            if attribute == "Missing" && owner == "Sig"
    );

    assert_eq!(
        sig.get_element("Value", true).unwrap().unwrap().text(),
        "abc"
    );
    assert_eq!(sig.get_element("Missing", false).unwrap(), None);
    assert_matches!(
        sig.get_element("Missing", true),
        Err(Error::ElementMissing { element, owner })
            if element == "Missing" && owner == "Sig"
    );

    assert_eq!(
        sig.get_first_child("Value", None).unwrap().unwrap().text(),
        "abc"
    );
}

#[test]
fn base64_digest() {
    init();
    let mut sig = Sig {
        algorithm: Some("rsa".to_owned()),
        digest: Some(vec![1, 2, 3]),
        ..Default::default()
    };
    assert_eq!(
        sig.to_xml_string().unwrap(),
        r#"<Sig Algorithm="rsa"><Digest>AQID</Digest></Sig>"#
    );

    let loaded: Sig =
        from_str(r#"<Sig Algorithm="rsa"><Digest>AQID</Digest></Sig>"#).unwrap();
    assert_eq!(loaded.digest.as_deref(), Some(&[1, 2, 3][..]));

    assert_matches!(
        from_str::<Sig>(r#"<Sig Algorithm="rsa"><Digest>!!!</Digest></Sig>"#),
        Err(Error::Value(_))
    );
}

#[test]
fn bad_number_is_value_error() {
    init();
    assert_matches!(
        from_str::<Sig>(r#"<Sig Algorithm="rsa" KeySize="huge" />"#),
        Err(Error::Value(_))
    );
}

#[test]
fn create_element_and_document() {
    init();
    let transform = Transform::default();
    let el = transform.create_element();
    assert_eq!(el.local_name(), "Transform");
    assert_eq!(el.namespace(), Some("urn:example:sig"));
    assert_eq!(el.prefix(), Some("ds"));

    let doc = transform.create_document().unwrap();
    assert_eq!(doc.root().local_name(), "Transform");
    assert_eq!(doc.root().namespace(), Some("urn:example:sig"));
    assert_eq!(doc.root().prefix(), Some("ds"));

    let sig = Sig::default();
    let doc = sig.create_document().unwrap();
    assert_eq!(doc.root().local_name(), "Sig");
    assert_eq!(doc.root().namespace(), None);
}
