// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional converters between domain values and their XML lexical
//! forms.
//!
//! A [`Convert`] impl is captured inside a schema entry at registration time;
//! the engine calls [`Convert::to_text`] while serializing and
//! [`Convert::parse`] while deserializing. Converters are stateless and pure.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use base64::Engine as _;

use crate::BoxedStdError;

/// XML white space characters, per XML Schema's `whiteSpace` facet.
const XML_WS: &[char] = &['\x09', '\x0A', '\x0D', '\x20'];

/// Maps a domain value to and from its string lexical form.
pub trait Convert: Clone + Send + Sync + 'static {
    type Value;

    /// The serialize ("get") direction.
    fn to_text(&self, value: &Self::Value) -> String;

    /// The deserialize ("set") direction.
    fn parse(&self, text: &str) -> Result<Self::Value, BoxedStdError>;
}

/// The identity converter: the string value is used verbatim.
#[derive(Clone, Copy, Debug, Default)]
pub struct Text;

impl Convert for Text {
    type Value = String;

    fn to_text(&self, value: &String) -> String {
        value.clone()
    }

    fn parse(&self, text: &str) -> Result<String, BoxedStdError> {
        Ok(text.to_owned())
    }
}

/// Binary data as standard base64 with padding.
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64;

impl Convert for Base64 {
    type Value = Vec<u8>;

    fn to_text(&self, value: &Vec<u8>) -> String {
        base64::engine::general_purpose::STANDARD.encode(value)
    }

    fn parse(&self, text: &str) -> Result<Vec<u8>, BoxedStdError> {
        base64::engine::general_purpose::STANDARD
            .decode(text.trim_matches(XML_WS))
            .map_err(|e| Box::new(e) as BoxedStdError)
    }
}

/// Any numeric (or other `Display`/`FromStr`) value in its decimal form.
///
/// Surrounding XML white space is collapsed before parsing, as the lexical
/// space of the schema number types requires.
#[derive(Debug, Default)]
pub struct Num<V>(PhantomData<V>);

impl<V> Num<V> {
    pub const fn new() -> Self {
        Num(PhantomData)
    }
}

impl<V> Clone for Num<V> {
    fn clone(&self) -> Self {
        Num(PhantomData)
    }
}

impl<V> Copy for Num<V> {}

impl<V> Convert for Num<V>
where
    V: Display + FromStr + Send + Sync + 'static,
    V::Err: std::error::Error + 'static,
{
    type Value = V;

    fn to_text(&self, value: &V) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str) -> Result<V, BoxedStdError> {
        V::from_str(text.trim_matches(XML_WS)).map_err(|e| Box::new(e) as BoxedStdError)
    }
}

/// `xs:boolean`: serializes as `true`/`false`, accepts `true|false|1|0`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Boolean;

impl Convert for Boolean {
    type Value = bool;

    fn to_text(&self, value: &bool) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str) -> Result<bool, BoxedStdError> {
        // https://www.w3.org/TR/xmlschema11-2/#boolean:
        // booleanRep ::= 'true' | 'false' | '1' | '0'
        match text.trim_matches(XML_WS) {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(Box::new(ValueError(format!("invalid bool {:?}", text)))),
        }
    }
}

/// A simple error for converter failures.
#[derive(Debug)]
pub struct ValueError(pub String);

impl std::fmt::Display for ValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ValueError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let c = Base64;
        assert_eq!(c.to_text(&b"hello".to_vec()), "aGVsbG8=");
        assert_eq!(c.parse("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(c.parse(" aGVsbG8=\n").unwrap(), b"hello");
        c.parse("!!!").unwrap_err();
    }

    #[test]
    fn bool_lexical_forms() {
        let c = Boolean;
        assert!(c.parse("true").unwrap());
        assert!(c.parse("1").unwrap());
        assert!(!c.parse("false").unwrap());
        assert!(!c.parse("0").unwrap());
        assert!(c.parse(" true ").unwrap());
        c.parse("yes").unwrap_err();
        assert_eq!(c.to_text(&true), "true");
    }

    #[test]
    fn num_trims_whitespace() {
        let c = Num::<u32>::new();
        assert_eq!(c.parse("42").unwrap(), 42);
        assert_eq!(c.parse("\n\t 42 ").unwrap(), 42);
        c.parse("forty-two").unwrap_err();
        assert_eq!(c.to_text(&42), "42");
    }
}
