//! In-memory values that can be snapshotted
//!
//! `Value` is the dynamic form of whatever a test produced: primitives,
//! collections, date/time values, unit quantities, user objects exposing
//! capability traits, and identity-bearing shared nodes that make aliasing and
//! cycles expressible.

mod capability;
mod convert;
mod shared;

pub use capability::{
    AttributeState, Attributes, Capability, DictState, MetadataEncodable, SlotState,
    SnapshotDecodable, SnapshotEncodable, SnapshotObject, StateError, UnitQuantity,
};
pub use shared::SharedValue;

use crate::record::{Record, TypeTag};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A complex number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// A magnitude paired with a unit string, e.g. `3.5 meter / second`
#[derive(Debug, Clone)]
pub struct Quantity {
    /// Scalar or array magnitude
    pub magnitude: Box<Value>,
    /// Unit expression, stored verbatim
    pub unit: String,
}

impl Quantity {
    pub fn new(magnitude: impl Into<Value>, unit: impl Into<String>) -> Self {
        Self {
            magnitude: Box::new(magnitude.into()),
            unit: unit.into(),
        }
    }
}

/// Date and time values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateTimeValue {
    Date(NaiveDate),
    Time(NaiveTime),
    /// Date and time without timezone information
    Naive(NaiveDateTime),
    /// Date and time with a UTC offset
    Zoned(DateTime<FixedOffset>),
    /// A signed duration
    Delta(chrono::Duration),
}

/// Stand-in produced by the decoder when a record cannot be turned back into
/// a typed value (unregistered class, unknown tag, recursion sentinel).
///
/// Encoding a placeholder yields its original record, and comparisons
/// against it ignore class identity.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPlaceholder {
    record: Record,
}

impl DecodedPlaceholder {
    pub fn new(record: Record) -> Self {
        Self {
            record: record.into_placeholder(),
        }
    }

    /// Tag of the stored record
    pub fn tag(&self) -> &TypeTag {
        &self.record.tag
    }

    /// Qualified class name, if the record named one
    pub fn class(&self) -> Option<&str> {
        self.record.class.as_deref()
    }

    /// The raw stored record
    pub fn record(&self) -> &Record {
        &self.record
    }
}

/// A snapshot-able value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Unordered collection; duplicates are kept and compared as a multiset
    Set(Vec<Value>),
    /// Mapping in insertion order; keys may be any value
    Map(Vec<(Value, Value)>),
    Quantity(Quantity),
    Path(PathBuf),
    DateTime(DateTimeValue),
    /// User-defined object, classified by its capabilities
    Object(Arc<dyn SnapshotObject>),
    /// Identity-bearing node; the same node reached twice on one path is a cycle
    Shared(SharedValue),
    Placeholder(DecodedPlaceholder),
}

impl Value {
    /// Wrap a user object
    pub fn object<T: SnapshotObject>(object: T) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Build a mapping from string keys
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Value::Str(key.into()), value.into()))
                .collect(),
        )
    }

    /// Build a list
    pub fn list<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a set
    pub fn set<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::Set(items.into_iter().map(Into::into).collect())
    }

    /// Short human-readable name of the variant
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Complex(_) => "complex".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Bytes(_) => "bytes".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Quantity(_) => "quantity".to_string(),
            Value::Path(_) => "path".to_string(),
            Value::DateTime(_) => "datetime".to_string(),
            Value::Object(object) => object.qualified_name().to_string(),
            Value::Shared(_) => "shared".to_string(),
            Value::Placeholder(placeholder) => match placeholder.class() {
                Some(class) => class.to_string(),
                None => format!("<{}>", placeholder.tag()),
            },
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value as a float; ints are widened
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Items of a list or tuple
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a string key in a mapping
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(candidate, _)| candidate.as_str() == Some(key))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Downcast-free access to an object
    pub fn as_object(&self) -> Option<&Arc<dyn SnapshotObject>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "{}-{}j", self.re, -self.im)
        } else {
            write!(f, "{}+{}j", self.re, self.im)
        }
    }
}
