use super::*;
use crate::compare::{MismatchKind, Walk};
use crate::engine::SnapshotEngine;
use crate::error::{SnapcheckError, SnapshotWarning};
use crate::record::{Payload, KIND_TUPLE};
use crate::value::{
    AttributeState, Attributes, Complex, DateTimeValue, DictState, Quantity, SharedValue,
    SnapshotEncodable, SnapshotObject, StateError, UnitQuantity,
};
use chrono::{FixedOffset, NaiveDate, TimeZone};

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

impl AttributeState for Point {
    fn attributes(&self) -> Attributes {
        Attributes::new().with("x", self.x).with("y", self.y)
    }
}

impl SnapshotObject for Point {
    fn qualified_name(&self) -> &str {
        Self::QUALIFIED_NAME
    }

    fn as_attribute_state(&self) -> Option<&dyn AttributeState> {
        Some(self)
    }
}

impl SnapshotDecodable for Point {
    const QUALIFIED_NAME: &'static str = "geometry::Point";

    fn from_attributes(attributes: &Attributes) -> Result<Self, StateError> {
        let coordinate = |name: &str| {
            attributes
                .require(name)?
                .as_i64()
                .ok_or_else(|| StateError::invalid_attribute(name, "expected an integer"))
        };
        Ok(Point {
            x: coordinate("x")?,
            y: coordinate("y")?,
        })
    }
}

#[derive(Debug)]
struct Celsius(f64);

impl SnapshotEncodable for Celsius {
    fn snapshot_encode(&self) -> Value {
        Value::from(format!("{}C", self.0))
    }
}

impl SnapshotObject for Celsius {
    fn qualified_name(&self) -> &str {
        Self::QUALIFIED_NAME
    }

    fn as_encodable(&self) -> Option<&dyn SnapshotEncodable> {
        Some(self)
    }
}

impl SnapshotDecodable for Celsius {
    const QUALIFIED_NAME: &'static str = "weather::Celsius";

    fn snapshot_decode(payload: &Value) -> Result<Self, StateError> {
        payload
            .as_str()
            .and_then(|text| text.strip_suffix('C'))
            .and_then(|number| number.parse().ok())
            .map(Celsius)
            .ok_or_else(|| StateError::Invalid(format!("not a temperature: {:?}", payload)))
    }
}

#[derive(Debug)]
struct Speed {
    value: f64,
}

impl UnitQuantity for Speed {
    fn magnitude(&self) -> Value {
        Value::from(self.value)
    }

    fn unit(&self) -> String {
        "meter / second".to_string()
    }
}

impl SnapshotEncodable for Speed {
    fn snapshot_encode(&self) -> Value {
        Value::Null
    }
}

impl SnapshotObject for Speed {
    fn qualified_name(&self) -> &str {
        "physics::Speed"
    }

    fn as_quantity(&self) -> Option<&dyn UnitQuantity> {
        Some(self)
    }

    fn as_encodable(&self) -> Option<&dyn SnapshotEncodable> {
        Some(self)
    }
}

#[derive(Debug)]
struct Config;

impl DictState for Config {
    fn to_dict(&self) -> Attributes {
        Attributes::new().with("debug", true)
    }
}

impl SnapshotObject for Config {
    fn qualified_name(&self) -> &str {
        "app::Config"
    }

    fn as_dict_state(&self) -> Option<&dyn DictState> {
        Some(self)
    }
}

#[derive(Debug)]
struct Opaque;

impl SnapshotObject for Opaque {
    fn qualified_name(&self) -> &str {
        "ffi::Opaque"
    }
}

fn registry_with_classes() -> TypeRegistry {
    TypeRegistry::builder()
        .register_class::<Point>()
        .register_class::<Celsius>()
        .build()
}

fn round_trip_matches(engine: &SnapshotEngine, value: &Value) {
    let record = engine.encode(value);
    let json = record.to_json();
    let reparsed = Record::from_json(&json).unwrap();
    let decoded = engine.decode(&reparsed).unwrap();
    let result = engine.matches(Some(&record), &decoded);
    assert!(result.is_match(), "{}", result.summary(true));
}

#[test]
fn test_classification_order() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.classify(&Value::Null), TypeTag::Primitive);
    assert_eq!(registry.classify(&Value::from(3)), TypeTag::NumericExact);
    assert_eq!(registry.classify(&Value::from(3.5)), TypeTag::NumericFloat);
    assert_eq!(registry.classify(&Value::bytes(b"ab".to_vec())), TypeTag::Bytes);
    assert_eq!(registry.classify(&Value::map([("a", 1)])), TypeTag::Mapping);
    assert_eq!(
        registry.classify(&Value::Map(vec![(Value::from(1), Value::from("one"))])),
        TypeTag::KeyListMapping
    );
    // quantity wins over custom encoding
    assert_eq!(
        registry.classify(&Value::object(Speed { value: 1.0 })),
        TypeTag::UnitQuantity
    );
    assert_eq!(
        registry.classify(&Value::object(Celsius(20.0))),
        TypeTag::ClassCustomEncoded
    );
    assert_eq!(
        registry.classify(&Value::object(Point { x: 1, y: 2 })),
        TypeTag::ClassInstance
    );
    assert_eq!(registry.classify(&Value::object(Config)), TypeTag::ClassInstance);
    assert_eq!(registry.classify(&Value::object(Opaque)), TypeTag::Unrecognized);
}

#[test]
fn test_classify_shared_nodes() {
    let registry = TypeRegistry::new();
    assert_eq!(registry.classify(&Value::shared(1.5)), TypeTag::NumericFloat);

    let node = SharedValue::new(Value::Null);
    *node.write() = Value::Shared(node.clone());
    assert_eq!(
        registry.classify(&Value::Shared(node.clone())),
        TypeTag::RecursiveReference
    );
    *node.write() = Value::Null;
}

#[test]
fn test_resolve_builtin_tags() {
    let registry = TypeRegistry::new();
    for tag in TypeTag::BUILTIN.iter() {
        let handler = registry.resolve(tag).unwrap();
        assert_eq!(&handler.tag(), tag);
    }
    assert!(registry.resolve(&TypeTag::parse("unknown-future-tag")).is_none());
}

#[test]
fn test_round_trip_builtin_values() {
    let engine = SnapshotEngine::default();
    let zoned = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let values = vec![
        Value::Null,
        Value::from(true),
        Value::from("text"),
        Value::from(i64::MAX),
        Value::from(-0.125),
        Value::from(f64::NAN),
        Value::from(f64::NEG_INFINITY),
        Value::from(Complex::new(1.0, -2.5)),
        Value::bytes(vec![0u8, 255, 10]),
        Value::list([1, 2, 3]),
        Value::tuple(["a", "b"]),
        Value::set([3, 1, 2]),
        Value::map([("k", Value::list([1.5]))]),
        Value::Map(vec![(Value::tuple([1, 2]), Value::from("pair"))]),
        Value::from(Quantity::new(9.81, "meter / second ** 2")),
        Value::from(std::path::PathBuf::from("data/input.csv")),
        Value::from(date),
        Value::from(date.and_hms_micro_opt(8, 15, 0, 250).unwrap()),
        Value::from(date.and_hms_opt(23, 59, 58).unwrap().time()),
        Value::from(zoned),
        Value::from(chrono::Duration::milliseconds(-1500)),
    ];
    for value in &values {
        round_trip_matches(&engine, value);
    }
}

#[test]
fn test_tuple_kind_preserved() {
    let engine = SnapshotEngine::default();
    let record = engine.encode(&Value::tuple([1]));
    assert_eq!(record.kind.as_deref(), Some(KIND_TUPLE));
    assert!(matches!(engine.decode(&record).unwrap(), Value::Tuple(_)));
}

#[test]
fn test_datetime_text_formats() {
    let engine = SnapshotEngine::default();
    let date = NaiveDate::from_ymd_opt(2021, 7, 4).unwrap();
    let record = engine.encode(&Value::from(date.and_hms_opt(9, 5, 1).unwrap()));
    assert_eq!(record.kind.as_deref(), Some("datetime_without_timezone"));
    assert_eq!(
        record.payload,
        Payload::Text("2021-07-04T09:05:01.000000".to_string())
    );

    let delta = engine.encode(&Value::from(chrono::Duration::seconds(90)));
    assert_eq!(delta.payload, Payload::Float(90.0));
}

#[test]
fn test_invalid_datetime_text_is_format_error() {
    let engine = SnapshotEngine::default();
    let record = Record::new(TypeTag::DateTime, Payload::Text("yesterday".to_string()))
        .with_kind("date");
    assert!(matches!(
        engine.decode(&record),
        Err(SnapcheckError::RecordFormat { .. })
    ));
}

#[test]
fn test_invalid_base64_is_format_error() {
    let engine = SnapshotEngine::default();
    let record = Record::new(
        TypeTag::Sequence,
        Payload::Items(vec![Record::new(
            TypeTag::Bytes,
            Payload::Text("not base64!".to_string()),
        )]),
    );
    match engine.decode(&record) {
        Err(SnapcheckError::RecordFormat { location, .. }) => assert_eq!(location, "$[0]"),
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn test_registered_classes_round_trip() {
    let engine = SnapshotEngine::new(std::sync::Arc::new(registry_with_classes()));

    let point = Value::object(Point { x: 3, y: -4 });
    let (decoded, warnings) = engine
        .decode_with_warnings(&engine.encode(&point))
        .unwrap();
    assert!(warnings.is_empty());
    let object = decoded.as_object().unwrap();
    assert_eq!(object.qualified_name(), "geometry::Point");
    round_trip_matches(&engine, &point);

    let celsius = Value::object(Celsius(21.5));
    let decoded = engine.decode(&engine.encode(&celsius)).unwrap();
    assert_eq!(decoded.as_object().unwrap().qualified_name(), "weather::Celsius");
    round_trip_matches(&engine, &celsius);
}

#[test]
fn test_unregistered_class_decodes_to_placeholder() {
    let engine = SnapshotEngine::default();
    let record = engine.encode(&Value::object(Point { x: 1, y: 2 }));
    let (decoded, warnings) = engine.decode_with_warnings(&record).unwrap();

    match &decoded {
        Value::Placeholder(placeholder) => {
            assert_eq!(placeholder.class(), Some("geometry::Point"));
            assert_eq!(placeholder.tag(), &TypeTag::ClassInstance);
            assert!(placeholder.record().is_placeholder());
        }
        other => panic!("expected a placeholder, got {:?}", other),
    }
    assert_eq!(
        warnings,
        vec![SnapshotWarning::DecodeClassNotFound {
            location: "$".to_string(),
            class: "geometry::Point".to_string(),
        }]
    );
}

#[test]
fn test_rejected_state_decodes_to_placeholder() {
    let engine = SnapshotEngine::new(std::sync::Arc::new(registry_with_classes()));
    let record = Record::new(
        TypeTag::ClassInstance,
        Payload::Fields(vec![(
            "x".to_string(),
            Record::new(TypeTag::Primitive, Payload::Text("one".to_string())),
        )]),
    )
    .with_class("geometry::Point");

    let (decoded, warnings) = engine.decode_with_warnings(&record).unwrap();
    assert!(matches!(decoded, Value::Placeholder(_)));
    assert!(matches!(
        &warnings[..],
        [SnapshotWarning::ClassStateRejected { class, .. }] if class == "geometry::Point"
    ));
}

#[test]
fn test_unknown_tag_decodes_to_placeholder() {
    let engine = SnapshotEngine::default();
    let json = serde_json::json!({"type": "tensor", "value": {"shape": [2, 2]}});
    let record = Record::from_json(&json).unwrap();
    let (decoded, warnings) = engine.decode_with_warnings(&record).unwrap();
    assert!(matches!(decoded, Value::Placeholder(_)));
    assert!(matches!(&warnings[..], [SnapshotWarning::UnknownTag { tag, .. }] if tag == "tensor"));

    // re-encoding the placeholder writes the stored record back
    assert_eq!(engine.encode(&decoded).to_json(), json);
}

#[test]
fn test_unrecognized_value_warns() {
    let engine = SnapshotEngine::default();
    let (record, warnings) = engine.encode_with_warnings(&Value::list([Value::object(Opaque)]));
    let item = &record.items().unwrap()[0];
    assert_eq!(item.tag, TypeTag::Unrecognized);
    assert_eq!(item.payload, Payload::Text("Opaque".to_string()));
    assert_eq!(
        warnings,
        vec![SnapshotWarning::UnsupportedType {
            location: "$[0]".to_string(),
            type_name: "ffi::Opaque".to_string(),
        }]
    );
}

/// Money amounts stored as integer cents under their own tag
struct MoneyHandler;

#[derive(Debug)]
struct Money {
    cents: i64,
}

impl SnapshotEncodable for Money {
    fn snapshot_encode(&self) -> Value {
        Value::from(self.cents)
    }
}

impl SnapshotObject for Money {
    fn qualified_name(&self) -> &str {
        "bank::Money"
    }

    fn as_encodable(&self) -> Option<&dyn SnapshotEncodable> {
        Some(self)
    }
}

impl TypeHandler for MoneyHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Extension("money".to_string())
    }

    fn accepts(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|object| object.qualified_name() == "bank::Money")
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let cents = value
            .as_object()
            .and_then(|object| object.as_encodable())
            .and_then(|hook| hook.snapshot_encode().as_i64())
            .unwrap_or_default();
        Record::new(self.tag(), Payload::Raw(serde_json::json!(cents)))
    }

    fn decode(&self, record: &Record, _decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match &record.payload {
            Payload::Raw(raw) => Ok(Value::object(Money {
                cents: raw.as_i64().unwrap_or_default(),
            })),
            _ => Ok(Value::Null),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report(MismatchKind::ValueChanged, "amount changed", None, None);
        }
    }
}

#[test]
fn test_extension_handler() {
    let registry = TypeRegistry::builder()
        .with_handler(std::sync::Arc::new(MoneyHandler))
        .build();
    assert_eq!(registry.tags()[0], TypeTag::Extension("money".to_string()));

    let engine = SnapshotEngine::new(std::sync::Arc::new(registry));
    let record = engine.encode(&Value::object(Money { cents: 1250 }));
    assert_eq!(record.tag, TypeTag::Extension("money".to_string()));
    assert_eq!(record.payload, Payload::Raw(serde_json::json!(1250)));

    let decoded = engine.decode(&record).unwrap();
    assert_eq!(decoded.as_object().unwrap().qualified_name(), "bank::Money");

    let changed = engine.matches(Some(&record), &Value::object(Money { cents: 1251 }));
    assert_eq!(changed.entries()[0].reason, "amount changed");

    // without the extension the record stays opaque but still compares
    let plain = SnapshotEngine::default();
    assert!(matches!(plain.decode(&record).unwrap(), Value::Placeholder(_)));
    assert!(plain.compare(&record, &record).is_match());
}

#[test]
fn test_class_names_listed() {
    let registry = registry_with_classes();
    assert_eq!(
        registry.class_names(),
        vec!["geometry::Point".to_string(), "weather::Celsius".to_string()]
    );
    assert!(registry.has_class("weather::Celsius"));
    assert!(registry.class("missing::Class").is_none());
}

#[test]
fn test_dict_state_encodes_fields() {
    let engine = SnapshotEngine::default();
    let record = engine.encode(&Value::object(Config));
    assert_eq!(record.class.as_deref(), Some("app::Config"));
    assert_eq!(
        record.field("debug").map(|field| &field.payload),
        Some(&Payload::Bool(true))
    );
}

#[test]
fn test_zoned_datetime_keeps_offset() {
    let engine = SnapshotEngine::default();
    let zoned = FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2020, 1, 2, 3, 4, 5)
        .unwrap();
    let record = engine.encode(&Value::from(zoned));
    assert_eq!(
        record.payload,
        Payload::Text("2020-01-02T03:04:05.000000-0500".to_string())
    );
    match engine.decode(&record).unwrap() {
        Value::DateTime(DateTimeValue::Zoned(decoded)) => assert_eq!(decoded, zoned),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_classify_nested_shared_nodes() {
    let registry = TypeRegistry::new();
    let inner = Value::shared(Value::map([("a", 1)]));
    let outer = Value::shared(inner.clone());
    assert_eq!(registry.classify(&outer), TypeTag::Mapping);

    // readers do not block each other
    if let Value::Shared(node) = &inner {
        let _guard = node.read();
        assert_eq!(registry.classify(&outer), TypeTag::Mapping);
    }
}

#[test]
fn test_repeated_string_keys_keep_last_value() {
    let engine = SnapshotEngine::default();
    let value = Value::Map(vec![
        (Value::from("a"), Value::from(1)),
        (Value::from("b"), Value::from(5)),
        (Value::from("a"), Value::from(2)),
    ]);
    assert!(engine.comparator().compare_values(&value, &value).is_match());

    let record = engine.encode(&value);
    let fields = record.fields().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].0, "a");
    assert_eq!(fields[0].1.payload, Payload::Int(2));
    assert_eq!(fields[1].0, "b");
    round_trip_matches(&engine, &value);
}

#[test]
fn test_repeated_non_string_keys_keep_last_value() {
    let engine = SnapshotEngine::default();
    let value = Value::Map(vec![
        (Value::from(1), Value::from("first")),
        (Value::from(2), Value::from("other")),
        (Value::from(1), Value::from("last")),
    ]);
    assert!(engine.comparator().compare_values(&value, &value).is_match());

    let record = engine.encode(&value);
    match &record.payload {
        Payload::Pairs(pairs) => {
            assert_eq!(pairs.len(), 2);
            assert_eq!(pairs[0].1.payload, Payload::Text("last".to_string()));
        }
        other => panic!("expected pairs, got {:?}", other),
    }
    round_trip_matches(&engine, &value);
}

#[test]
fn test_key_list_value_error_location() {
    let engine = SnapshotEngine::default();
    let key = engine.encode(&Value::from(7));
    let record = Record::new(
        TypeTag::KeyListMapping,
        Payload::Pairs(vec![(
            key.clone(),
            Record::new(TypeTag::Bytes, Payload::Text("not base64!".to_string())),
        )]),
    );
    match engine.decode(&record) {
        Err(SnapcheckError::RecordFormat { location, .. }) => {
            assert_eq!(location, format!("$[{}]", key.canonical_string()))
        }
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn test_zoned_datetimes_compare_as_instants() {
    let engine = SnapshotEngine::default();
    let west = FixedOffset::west_opt(5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2020, 1, 2, 3, 4, 5)
        .unwrap();
    let utc = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2020, 1, 2, 8, 4, 5)
        .unwrap();
    let later = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2020, 1, 2, 9, 4, 5)
        .unwrap();

    let expected = engine.encode(&Value::from(west));
    assert!(engine.compare(&expected, &engine.encode(&Value::from(utc))).is_match());

    let result = engine.compare(&expected, &engine.encode(&Value::from(later)));
    assert_eq!(result.entries().len(), 1);
    assert_eq!(result.entries()[0].kind, MismatchKind::ValueChanged);
}
