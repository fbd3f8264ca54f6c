//! Handlers for sequences, sets and mappings

use super::unexpected_payload;
use crate::compare::{keyed_entries, MismatchKind, Walk};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::SnapcheckResult;
use crate::location::Segment;
use crate::record::{Payload, Record, TypeTag, KIND_LIST, KIND_TUPLE};
use crate::registry::TypeHandler;
use crate::value::Value;
use serde_json::Value as Json;
use std::collections::HashMap;

fn encode_items(items: &[Value], encoder: &mut Encoder<'_>) -> Vec<Record> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| encoder.encode_child(Segment::Index(index), item))
        .collect()
}

fn decode_items(items: &[Record], decoder: &mut Decoder<'_>) -> SnapcheckResult<Vec<Value>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decoder.decode_child(Segment::Index(index), item))
        .collect()
}

/// Lists and tuples
pub struct SequenceHandler;

impl TypeHandler for SequenceHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Sequence
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::List(_) | Value::Tuple(_))
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let (items, kind) = match value {
            Value::Tuple(items) => (items.as_slice(), KIND_TUPLE),
            Value::List(items) => (items.as_slice(), KIND_LIST),
            _ => (&[][..], KIND_LIST),
        };
        Record::new(TypeTag::Sequence, Payload::Items(encode_items(items, encoder))).with_kind(kind)
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let items = record
            .items()
            .ok_or_else(|| unexpected_payload(record, decoder))?;
        let values = decode_items(items, decoder)?;
        Ok(match record.kind.as_deref() {
            Some(KIND_TUPLE) => Value::Tuple(values),
            _ => Value::List(values),
        })
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        let expected_kind = expected.kind.as_deref().unwrap_or(KIND_LIST);
        let actual_kind = actual.kind.as_deref().unwrap_or(KIND_LIST);
        if expected_kind != actual_kind {
            walk.report_type_change(expected, actual);
            return;
        }

        let (Some(expected_items), Some(actual_items)) = (expected.items(), actual.items()) else {
            walk.report_value_change(expected, actual);
            return;
        };
        if expected_items.len() != actual_items.len() {
            walk.report(
                MismatchKind::LengthChanged,
                format!(
                    "length changed: {} -> {}",
                    expected_items.len(),
                    actual_items.len()
                ),
                Some(Json::from(expected_items.len())),
                Some(Json::from(actual_items.len())),
            );
            return;
        }

        for (index, (a, b)) in expected_items.iter().zip(actual_items).enumerate() {
            walk.compare_child(Segment::Index(index), a, b);
        }
    }
}

/// Unordered collections, stored sorted by canonical element form
pub struct SetHandler;

impl TypeHandler for SetHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Set
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Set(_))
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let items = match value {
            Value::Set(items) => encode_items(items, encoder),
            _ => Vec::new(),
        };
        let mut keyed: Vec<(String, Record)> = items
            .into_iter()
            .map(|record| (record.canonical_string(), record))
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let items = keyed.into_iter().map(|(_, record)| record).collect();
        Record::new(TypeTag::Set, Payload::Items(items))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let items = record
            .items()
            .ok_or_else(|| unexpected_payload(record, decoder))?;
        Ok(Value::Set(decode_items(items, decoder)?))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        let (Some(expected_items), Some(actual_items)) = (expected.items(), actual.items()) else {
            walk.report_value_change(expected, actual);
            return;
        };

        let mut remaining: HashMap<String, usize> = HashMap::new();
        for item in actual_items {
            *remaining.entry(item.canonical_string()).or_default() += 1;
        }

        for item in expected_items {
            match remaining.get_mut(&item.canonical_string()) {
                Some(count) if *count > 0 => *count -= 1,
                _ => walk.report(
                    MismatchKind::MissingElement,
                    format!("missing element {}", item.payload_json()),
                    Some(item.to_json()),
                    None,
                ),
            }
        }

        for item in actual_items {
            if let Some(count) = remaining.get_mut(&item.canonical_string()) {
                if *count > 0 {
                    *count -= 1;
                    walk.report(
                        MismatchKind::ExtraElement,
                        format!("extra element {}", item.payload_json()),
                        None,
                        Some(item.to_json()),
                    );
                }
            }
        }
    }
}

/// Mappings whose keys are all strings
pub struct MappingHandler;

impl TypeHandler for MappingHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Mapping
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Map(entries) => entries.iter().all(|(key, _)| matches!(key, Value::Str(_))),
            _ => false,
        }
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        // a repeated key keeps its first position and its last value
        let mut slots: Vec<(&str, &Value)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        if let Value::Map(entries) = value {
            for (key, item) in entries {
                let name = key.as_str().unwrap_or_default();
                match positions.get(name) {
                    Some(&position) => slots[position].1 = item,
                    None => {
                        positions.insert(name, slots.len());
                        slots.push((name, item));
                    }
                }
            }
        }

        let fields = slots
            .into_iter()
            .map(|(name, item)| {
                let record = encoder.encode_child(Segment::Key(name.to_string()), item);
                (name.to_string(), record)
            })
            .collect();
        Record::new(TypeTag::Mapping, Payload::Fields(fields))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let fields = record
            .fields()
            .ok_or_else(|| unexpected_payload(record, decoder))?;
        let mut entries = Vec::with_capacity(fields.len());
        for (name, child) in fields {
            let value = decoder.decode_child(Segment::Key(name.clone()), child)?;
            entries.push((Value::Str(name.clone()), value));
        }
        Ok(Value::Map(entries))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        walk.compare_keyed(&keyed_entries(expected), &keyed_entries(actual), "key");
    }
}

/// Mappings with keys that are not all strings, stored as `[key, value]` pairs
pub struct KeyListMappingHandler;

impl TypeHandler for KeyListMappingHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::KeyListMapping
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        // keys are equal when their encodings are; the first position and
        // the last value win
        let mut slots: Vec<(Record, String, &Value)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        if let Value::Map(entries) = value {
            for (key, item) in entries {
                let key = encoder.encode_child(Segment::Index(slots.len()), key);
                let canonical = key.canonical_string();
                match positions.get(&canonical).copied() {
                    Some(position) => slots[position].2 = item,
                    None => {
                        positions.insert(canonical.clone(), slots.len());
                        slots.push((key, canonical, item));
                    }
                }
            }
        }

        let pairs = slots
            .into_iter()
            .map(|(key, canonical, item)| {
                let item = encoder.encode_child(Segment::EncodedKey(canonical), item);
                (key, item)
            })
            .collect();
        Record::new(TypeTag::KeyListMapping, Payload::Pairs(pairs))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let Payload::Pairs(pairs) = &record.payload else {
            return Err(unexpected_payload(record, decoder));
        };
        let mut entries = Vec::with_capacity(pairs.len());
        for (index, (key, item)) in pairs.iter().enumerate() {
            let segment = Segment::EncodedKey(key.canonical_string());
            let key = decoder.decode_child(Segment::Index(index), key)?;
            let value = decoder.decode_child(segment, item)?;
            entries.push((key, value));
        }
        Ok(Value::Map(entries))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        walk.compare_keyed(&keyed_entries(expected), &keyed_entries(actual), "key");
    }
}
