//! JSON form of records
//!
//! Node layout: `{"type": <tag>, ["kind": str], ["class": str], "value": <payload>}`.
//! Known tags have their payload shape checked; extension tags keep the raw
//! payload untouched.

use super::{Payload, Record, TypeTag, KIND_LIST, KIND_TUPLE};
use crate::error::{SnapcheckError, SnapcheckResult};
use crate::location::{Location, Segment};
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;

const TYPE_KEY: &str = "type";
const KIND_KEY: &str = "kind";
const CLASS_KEY: &str = "class";
const VALUE_KEY: &str = "value";

/// Date/time record kinds
pub(crate) const DATETIME_KINDS: [&str; 5] = [
    "date",
    "time",
    "datetime_without_timezone",
    "datetime_with_timezone",
    "timedelta",
];

/// Encode a float, spelling non-finite values as strings
pub fn float_to_json(value: f64) -> Json {
    if value.is_nan() {
        Json::String("NaN".to_string())
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        Json::String(text.to_string())
    } else {
        Number::from_f64(value).map(Json::Number).unwrap_or(Json::Null)
    }
}

/// Inverse of [`float_to_json`]
pub fn float_from_json(json: &Json) -> Option<f64> {
    match json {
        Json::Number(number) => number.as_f64(),
        Json::String(text) => match text.as_str() {
            "NaN" | "nan" => Some(f64::NAN),
            "inf" | "Infinity" => Some(f64::INFINITY),
            "-inf" | "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

/// Render JSON with object keys sorted at every level
pub fn canonical_json(json: &Json) -> String {
    sorted(json).to_string()
}

fn sorted(json: &Json) -> Json {
    match json {
        Json::Object(map) => {
            let ordered: BTreeMap<&String, Json> =
                map.iter().map(|(key, value)| (key, sorted(value))).collect();
            let mut out = Map::new();
            for (key, value) in ordered {
                out.insert(key.clone(), value);
            }
            Json::Object(out)
        }
        Json::Array(items) => Json::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

impl Record {
    /// JSON form of this node and its children
    pub fn to_json(&self) -> Json {
        let mut node = Map::new();
        node.insert(TYPE_KEY.to_string(), Json::String(self.tag.to_string()));
        if let Some(kind) = &self.kind {
            node.insert(KIND_KEY.to_string(), Json::String(kind.clone()));
        }
        if let Some(class) = &self.class {
            node.insert(CLASS_KEY.to_string(), Json::String(class.clone()));
        }
        node.insert(VALUE_KEY.to_string(), self.payload_json());
        Json::Object(node)
    }

    /// JSON form of the payload alone
    pub fn payload_json(&self) -> Json {
        match &self.payload {
            Payload::Null => Json::Null,
            Payload::Bool(value) => Json::Bool(*value),
            Payload::Int(value) => Json::Number((*value).into()),
            Payload::Float(value) => float_to_json(*value),
            Payload::Text(text) => Json::String(text.clone()),
            Payload::Complex { re, im } => Json::Array(vec![float_to_json(*re), float_to_json(*im)]),
            Payload::Items(items) => Json::Array(items.iter().map(Record::to_json).collect()),
            Payload::Fields(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, record)| (name.clone(), record.to_json()))
                    .collect(),
            ),
            Payload::Pairs(pairs) => Json::Array(
                pairs
                    .iter()
                    .map(|(key, value)| Json::Array(vec![key.to_json(), value.to_json()]))
                    .collect(),
            ),
            Payload::Quantity { magnitude, unit } => {
                let mut map = Map::new();
                map.insert("magnitude".to_string(), magnitude.to_json());
                map.insert("unit".to_string(), Json::String(unit.clone()));
                Json::Object(map)
            }
            Payload::Nested(record) => record.to_json(),
            Payload::Raw(raw) => raw.clone(),
        }
    }

    /// Parse and validate a record tree
    pub fn from_json(json: &Json) -> SnapcheckResult<Record> {
        parse_node(json, &mut Location::root())
    }

    /// Parse a record from JSON text
    pub fn from_json_str(text: &str) -> SnapcheckResult<Record> {
        let json: Json = serde_json::from_str(text)?;
        Record::from_json(&json)
    }
}

fn malformed(location: &Location, message: impl Into<String>) -> SnapcheckError {
    SnapcheckError::record_format(location, message)
}

fn optional_string(
    node: &Map<String, Json>,
    key: &str,
    location: &Location,
) -> SnapcheckResult<Option<String>> {
    match node.get(key) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(malformed(location, format!("'{}' must be a string", key))),
    }
}

fn parse_child(json: &Json, location: &mut Location, segment: Segment) -> SnapcheckResult<Record> {
    location.push(segment);
    let result = parse_node(json, location);
    location.pop();
    result
}

fn parse_node(json: &Json, location: &mut Location) -> SnapcheckResult<Record> {
    let node = json
        .as_object()
        .ok_or_else(|| malformed(location, "record node must be an object"))?;
    let tag = match node.get(TYPE_KEY) {
        Some(Json::String(tag)) => TypeTag::parse(tag),
        Some(_) => return Err(malformed(location, "'type' must be a string")),
        None => return Err(malformed(location, "record node has no 'type'")),
    };
    let kind = optional_string(node, KIND_KEY, location)?;
    let class = optional_string(node, CLASS_KEY, location)?;
    let value = node
        .get(VALUE_KEY)
        .ok_or_else(|| malformed(location, "record node has no 'value'"))?;

    if tag.is_class() && class.is_none() {
        return Err(malformed(location, format!("'{}' record has no 'class'", tag)));
    }

    let payload = parse_payload(&tag, kind.as_deref(), value, location)?;
    Ok(Record {
        tag,
        kind,
        class,
        payload,
        placeholder: false,
    })
}

fn parse_payload(
    tag: &TypeTag,
    kind: Option<&str>,
    value: &Json,
    location: &mut Location,
) -> SnapcheckResult<Payload> {
    let expected = |what: &str| malformed(location, format!("'{}' payload must be {}", tag, what));

    match tag {
        TypeTag::Primitive => match value {
            Json::Null => Ok(Payload::Null),
            Json::Bool(flag) => Ok(Payload::Bool(*flag)),
            Json::String(text) => Ok(Payload::Text(text.clone())),
            _ => Err(expected("null, a boolean or a string")),
        },
        TypeTag::NumericExact => value
            .as_i64()
            .map(Payload::Int)
            .ok_or_else(|| expected("a 64-bit integer")),
        TypeTag::NumericFloat => float_from_json(value)
            .map(Payload::Float)
            .ok_or_else(|| expected("a number")),
        TypeTag::NumericComplex => match value.as_array().map(Vec::as_slice) {
            Some([re, im]) => match (float_from_json(re), float_from_json(im)) {
                (Some(re), Some(im)) => Ok(Payload::Complex { re, im }),
                _ => Err(expected("a pair of numbers")),
            },
            _ => Err(expected("a pair of numbers")),
        },
        TypeTag::Bytes | TypeTag::Path | TypeTag::Unrecognized => value
            .as_str()
            .map(|text| Payload::Text(text.to_string()))
            .ok_or_else(|| expected("a string")),
        TypeTag::Sequence | TypeTag::Set => {
            if *tag == TypeTag::Sequence
                && !matches!(kind, None | Some(KIND_LIST) | Some(KIND_TUPLE))
            {
                return Err(malformed(
                    location,
                    format!("unknown sequence kind '{}'", kind.unwrap_or_default()),
                ));
            }
            let items = value.as_array().ok_or_else(|| expected("an array"))?;
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                records.push(parse_child(item, location, Segment::Index(index))?);
            }
            Ok(Payload::Items(records))
        }
        TypeTag::Mapping | TypeTag::ClassInstance => {
            let map = value.as_object().ok_or_else(|| expected("an object"))?;
            let mut fields = Vec::with_capacity(map.len());
            for (name, child) in map {
                let segment = if *tag == TypeTag::Mapping {
                    Segment::Key(name.clone())
                } else {
                    Segment::Attribute(name.clone())
                };
                fields.push((name.clone(), parse_child(child, location, segment)?));
            }
            Ok(Payload::Fields(fields))
        }
        TypeTag::KeyListMapping => {
            let entries = value.as_array().ok_or_else(|| expected("an array of pairs"))?;
            let mut pairs = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                location.push(Segment::Index(index));
                let pair = match entry.as_array().map(Vec::as_slice) {
                    Some([key, value]) => {
                        let key = parse_child(key, location, Segment::Field("key"));
                        let value = parse_child(value, location, Segment::Field("value"));
                        key.and_then(|key| value.map(|value| (key, value)))
                    }
                    _ => Err(malformed(location, "key-list entry must be a [key, value] pair")),
                };
                location.pop();
                pairs.push(pair?);
            }
            Ok(Payload::Pairs(pairs))
        }
        TypeTag::ClassCustomEncoded => Ok(Payload::Nested(Box::new(parse_child(
            value,
            location,
            Segment::Encoded,
        )?))),
        TypeTag::UnitQuantity => {
            let map = value
                .as_object()
                .ok_or_else(|| expected("an object with 'magnitude' and 'unit'"))?;
            let unit = map
                .get("unit")
                .and_then(Json::as_str)
                .ok_or_else(|| expected("an object with a string 'unit'"))?
                .to_string();
            let magnitude = map
                .get("magnitude")
                .ok_or_else(|| expected("an object with a 'magnitude'"))?;
            let magnitude = parse_child(magnitude, location, Segment::Magnitude)?;
            Ok(Payload::Quantity {
                magnitude: Box::new(magnitude),
                unit,
            })
        }
        TypeTag::DateTime => match kind {
            Some("timedelta") => float_from_json(value)
                .map(Payload::Float)
                .ok_or_else(|| expected("a number of seconds")),
            Some(kind) if DATETIME_KINDS.contains(&kind) => value
                .as_str()
                .map(|text| Payload::Text(text.to_string()))
                .ok_or_else(|| expected("a string")),
            Some(kind) => Err(malformed(location, format!("unknown datetime kind '{}'", kind))),
            None => Err(malformed(location, "'datetime' record has no 'kind'")),
        },
        TypeTag::RecursiveReference => Ok(Payload::Null),
        TypeTag::Extension(_) => Ok(Payload::Raw(value.clone())),
    }
}
