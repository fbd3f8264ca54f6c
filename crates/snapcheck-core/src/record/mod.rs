//! Tagged record trees
//!
//! A [`Record`] is the persisted, self-describing form of a value. Every node
//! carries exactly one [`TypeTag`], an optional kind (sequence flavour or
//! date/time flavour), an optional qualified class name and a payload.

mod json;
mod tag;

pub use json::{canonical_json, float_from_json, float_to_json};
pub use tag::TypeTag;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Record kind of a list
pub const KIND_LIST: &str = "list";
/// Record kind of a tuple
pub const KIND_TUPLE: &str = "tuple";

/// Payload of a record node
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Complex { re: f64, im: f64 },
    /// Ordered child records (sequences, sets)
    Items(Vec<Record>),
    /// Named child records (string-keyed mappings, instance attributes)
    Fields(Vec<(String, Record)>),
    /// Key/value record pairs (mappings with arbitrary keys)
    Pairs(Vec<(Record, Record)>),
    Quantity { magnitude: Box<Record>, unit: String },
    /// A single wrapped record (custom-encoded classes)
    Nested(Box<Record>),
    /// Uninterpreted payload of an extension tag
    Raw(serde_json::Value),
}

/// One node of an encoded value
#[derive(Debug, Clone)]
pub struct Record {
    pub tag: TypeTag,
    pub kind: Option<String>,
    pub class: Option<String>,
    pub payload: Payload,
    /// Set on records the decoder could not turn back into typed values.
    /// Never persisted.
    placeholder: bool,
}

impl Record {
    pub fn new(tag: TypeTag, payload: Payload) -> Self {
        Self {
            tag,
            kind: None,
            class: None,
            payload,
            placeholder: false,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// The sentinel written where a cycle was cut
    pub fn recursion_sentinel() -> Self {
        Self::new(TypeTag::RecursiveReference, Payload::Null)
    }

    pub fn is_recursion_sentinel(&self) -> bool {
        self.tag == TypeTag::RecursiveReference
    }

    /// Mark this record as a decoded placeholder
    pub fn into_placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }

    /// Whether the record stands in for a value that could not be decoded
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Child records of a sequence or set
    pub fn items(&self) -> Option<&[Record]> {
        match &self.payload {
            Payload::Items(items) => Some(items),
            _ => None,
        }
    }

    /// Named children of a mapping or class instance
    pub fn fields(&self) -> Option<&[(String, Record)]> {
        match &self.payload {
            Payload::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a named child
    pub fn field(&self, name: &str) -> Option<&Record> {
        self.fields()?
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, record)| record)
    }

    /// Canonical JSON text: sorted object keys, no whitespace. Two records
    /// with the same canonical string are identical.
    pub fn canonical_string(&self) -> String {
        canonical_json(&self.to_json())
    }

    /// Pretty JSON text for diffs and inspection
    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| self.canonical_string())
    }

    /// One-line description, e.g. `sequence<tuple>[3]` or `class-instance(pkg.Point){2}`
    pub fn describe(&self) -> String {
        let mut text = self.tag.to_string();
        if let Some(kind) = &self.kind {
            text.push_str(&format!("<{}>", kind));
        }
        if let Some(class) = &self.class {
            text.push_str(&format!("({})", class));
        }
        match &self.payload {
            Payload::Items(items) => text.push_str(&format!("[{}]", items.len())),
            Payload::Fields(fields) => text.push_str(&format!("{{{}}}", fields.len())),
            Payload::Pairs(pairs) => text.push_str(&format!("{{{}}}", pairs.len())),
            Payload::Quantity { unit, .. } => text.push_str(&format!(" [{}]", unit)),
            Payload::Nested(_) | Payload::Raw(_) => {}
            _ => text.push_str(&format!(" {}", canonical_json(&self.payload_json()))),
        }
        if self.placeholder {
            text.push_str(" (placeholder)");
        }
        text
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.kind == other.kind
            && self.class == other.class
            && self.payload == other.payload
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Record::from_json(&json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i64) -> Record {
        Record::new(TypeTag::NumericExact, Payload::Int(value))
    }

    #[test]
    fn test_placeholder_flag_is_ignored_by_equality() {
        let record = int(1);
        assert_eq!(record.clone().into_placeholder(), record);
        assert!(record.clone().into_placeholder().is_placeholder());
        assert!(!record.is_placeholder());
    }

    #[test]
    fn test_describe() {
        let tuple = Record::new(TypeTag::Sequence, Payload::Items(vec![int(1), int(2)]))
            .with_kind(KIND_TUPLE);
        assert_eq!(tuple.describe(), "sequence<tuple>[2]");
        assert_eq!(int(5).describe(), "numeric-exact 5");

        let point = Record::new(
            TypeTag::ClassInstance,
            Payload::Fields(vec![("x".to_string(), int(1))]),
        )
        .with_class("geometry.Point");
        assert_eq!(point.describe(), "class-instance(geometry.Point){1}");
    }

    #[test]
    fn test_field_lookup() {
        let mapping = Record::new(
            TypeTag::Mapping,
            Payload::Fields(vec![("a".to_string(), int(1))]),
        );
        assert_eq!(mapping.field("a"), Some(&int(1)));
        assert!(mapping.field("b").is_none());
        assert!(int(1).field("a").is_none());
    }
}
