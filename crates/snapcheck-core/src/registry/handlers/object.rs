//! Handlers for unit quantities and user-defined objects

use super::unexpected_payload;
use crate::compare::{KeyedEntry, MismatchKind, Walk};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{SnapcheckResult, SnapshotWarning};
use crate::location::Segment;
use crate::record::{Payload, Record, TypeTag};
use crate::registry::{ClassEntry, TypeHandler};
use crate::value::{Attributes, Capability, Quantity, SnapshotObject, StateError, Value};
use serde_json::Value as Json;
use std::sync::Arc;

fn object_capability(value: &Value) -> Option<Capability<'_>> {
    value.as_object().map(|object| Capability::of(object.as_ref()))
}

/// Class names must agree unless one side is a decoded placeholder
fn classes_match(expected: &Record, actual: &Record, walk: &mut Walk<'_>) -> bool {
    if expected.is_placeholder() || actual.is_placeholder() || expected.class == actual.class {
        return true;
    }
    walk.report(
        MismatchKind::ClassChanged,
        format!(
            "class changed: {} -> {}",
            expected.class.as_deref().unwrap_or("?"),
            actual.class.as_deref().unwrap_or("?")
        ),
        expected.class.clone().map(Json::String),
        actual.class.clone().map(Json::String),
    );
    false
}

/// Look up the record's class, or warn and fall back to a placeholder
fn lookup_class<'r>(
    record: &Record,
    decoder: &mut Decoder<'r>,
) -> Result<&'r ClassEntry, Value> {
    let class = record.class.as_deref().unwrap_or_default();
    match decoder.registry().class(class) {
        Some(entry) => Ok(entry),
        None => {
            decoder.warn(SnapshotWarning::DecodeClassNotFound {
                location: decoder.location().to_string(),
                class: class.to_string(),
            });
            Err(decoder.placeholder(record))
        }
    }
}

/// Turn a reconstruction outcome into a value, or warn and fall back to a placeholder
fn rebuilt(
    result: Result<Arc<dyn SnapshotObject>, StateError>,
    record: &Record,
    decoder: &mut Decoder<'_>,
) -> Value {
    match result {
        Ok(object) => Value::Object(object),
        Err(error) => {
            decoder.warn(SnapshotWarning::ClassStateRejected {
                location: decoder.location().to_string(),
                class: record.class.clone().unwrap_or_default(),
                reason: error.to_string(),
            });
            decoder.placeholder(record)
        }
    }
}

fn attribute_entries(record: &Record) -> Vec<KeyedEntry<'_>> {
    record
        .fields()
        .unwrap_or_default()
        .iter()
        .map(|(name, value)| KeyedEntry::named(name, Segment::Attribute(name.clone()), value))
        .collect()
}

/// String-keyed mapping as attributes
fn as_attributes(value: &Value) -> Option<Attributes> {
    match value {
        Value::Map(entries) => entries
            .iter()
            .map(|(key, item)| key.as_str().map(|name| (name.to_string(), item.clone())))
            .collect(),
        _ => None,
    }
}

/// Magnitude and unit, from plain quantities or quantity-like objects
pub struct QuantityHandler;

impl TypeHandler for QuantityHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::UnitQuantity
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Quantity(_))
            || matches!(object_capability(value), Some(Capability::Quantity(_)))
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let (magnitude, unit, class) = match value {
            Value::Quantity(quantity) => {
                let magnitude = encoder.encode_child(Segment::Magnitude, &quantity.magnitude);
                (magnitude, quantity.unit.clone(), None)
            }
            Value::Object(object) => match object.as_quantity() {
                Some(quantity) => {
                    let magnitude = encoder.encode_child(Segment::Magnitude, &quantity.magnitude());
                    (
                        magnitude,
                        quantity.unit(),
                        Some(object.qualified_name().to_string()),
                    )
                }
                None => (Record::new(TypeTag::Primitive, Payload::Null), String::new(), None),
            },
            _ => (Record::new(TypeTag::Primitive, Payload::Null), String::new(), None),
        };

        let record = Record::new(
            TypeTag::UnitQuantity,
            Payload::Quantity {
                magnitude: Box::new(magnitude),
                unit,
            },
        );
        match class {
            Some(class) => record.with_class(class),
            None => record,
        }
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let Payload::Quantity { magnitude, unit } = &record.payload else {
            return Err(unexpected_payload(record, decoder));
        };
        let magnitude = decoder.decode_child(Segment::Magnitude, magnitude)?;
        Ok(Value::Quantity(Quantity::new(magnitude, unit.clone())))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        match (&expected.payload, &actual.payload) {
            (
                Payload::Quantity {
                    magnitude: expected_magnitude,
                    unit: expected_unit,
                },
                Payload::Quantity {
                    magnitude: actual_magnitude,
                    unit: actual_unit,
                },
            ) => {
                if expected_unit != actual_unit {
                    walk.report(
                        MismatchKind::UnitChanged,
                        format!("unit changed: {} -> {}", expected_unit, actual_unit),
                        Some(Json::String(expected_unit.clone())),
                        Some(Json::String(actual_unit.clone())),
                    );
                }
                walk.compare_child(Segment::Magnitude, expected_magnitude, actual_magnitude);
            }
            _ => walk.report_value_change(expected, actual),
        }
    }
}

/// Objects with a custom encoding hook
pub struct CustomEncodedHandler;

impl TypeHandler for CustomEncodedHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::ClassCustomEncoded
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(object_capability(value), Some(Capability::CustomEncoded(_)))
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let Value::Object(object) = value else {
            return Record::new(TypeTag::ClassCustomEncoded, Payload::Null);
        };
        let encoded = object
            .as_encodable()
            .map(|hook| hook.snapshot_encode())
            .unwrap_or(Value::Null);
        let nested = encoder.encode_child(Segment::Encoded, &encoded);
        Record::new(TypeTag::ClassCustomEncoded, Payload::Nested(Box::new(nested)))
            .with_class(object.qualified_name())
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let Payload::Nested(nested) = &record.payload else {
            return Err(unexpected_payload(record, decoder));
        };
        let entry = match lookup_class(record, decoder) {
            Ok(entry) => entry,
            Err(placeholder) => return Ok(placeholder),
        };
        let payload = decoder.decode_child(Segment::Encoded, nested)?;

        let result = match entry.decode(&payload) {
            Err(StateError::Unsupported) => match as_attributes(&payload) {
                Some(attributes) => entry.from_attributes(&attributes),
                None => Err(StateError::Unsupported),
            },
            other => other,
        };
        Ok(rebuilt(result, record, decoder))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if !classes_match(expected, actual, walk) {
            return;
        }
        match (&expected.payload, &actual.payload) {
            (Payload::Nested(a), Payload::Nested(b)) => walk.compare_child(Segment::Encoded, a, b),
            _ => walk.report_value_change(expected, actual),
        }
    }
}

/// Objects exposing their state as attributes, slots or a dictionary
pub struct ClassInstanceHandler;

impl TypeHandler for ClassInstanceHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::ClassInstance
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(
            object_capability(value),
            Some(Capability::Attributes(_) | Capability::Slots(_) | Capability::Dict(_))
        )
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let Value::Object(object) = value else {
            return Record::new(TypeTag::ClassInstance, Payload::Fields(Vec::new()));
        };
        let state = Capability::of(object.as_ref()).state().unwrap_or_default();
        let fields = state
            .iter()
            .map(|(name, item)| {
                let record = encoder.encode_child(Segment::Attribute(name.to_string()), item);
                (name.to_string(), record)
            })
            .collect();
        Record::new(TypeTag::ClassInstance, Payload::Fields(fields))
            .with_class(object.qualified_name())
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let Some(fields) = record.fields() else {
            return Err(unexpected_payload(record, decoder));
        };
        let entry = match lookup_class(record, decoder) {
            Ok(entry) => entry,
            Err(placeholder) => return Ok(placeholder),
        };

        let mut attributes = Attributes::new();
        for (name, child) in fields {
            let value = decoder.decode_child(Segment::Attribute(name.clone()), child)?;
            attributes.insert(name.clone(), value);
        }

        let result = match entry.from_attributes(&attributes) {
            Err(StateError::Unsupported) => entry.decode(&Value::Map(
                attributes
                    .into_iter()
                    .map(|(name, value)| (Value::Str(name), value))
                    .collect(),
            )),
            other => other,
        };
        Ok(rebuilt(result, record, decoder))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if !classes_match(expected, actual, walk) {
            return;
        }
        let expected_entries = attribute_entries(expected);
        let actual_entries = attribute_entries(actual);
        walk.compare_keyed(&expected_entries, &actual_entries, "attribute");
    }
}
