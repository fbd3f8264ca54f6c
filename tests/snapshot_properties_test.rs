//! Encoding and comparison properties of the snapshot engine

use chrono::NaiveDate;
use snapcheck::{
    AttributeState, Attributes, CompareOptions, Comparator, Complex, MismatchKind, Quantity,
    SharedValue, SnapshotDecodable, SnapshotEngine, SnapshotObject, StateError, ToleranceConfig,
    TypeRegistry, Value,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct Sensor {
    id: String,
    reading: f64,
}

impl AttributeState for Sensor {
    fn attributes(&self) -> Attributes {
        Attributes::new()
            .with("id", self.id.clone())
            .with("reading", self.reading)
    }
}

impl SnapshotObject for Sensor {
    fn qualified_name(&self) -> &str {
        Self::QUALIFIED_NAME
    }

    fn as_attribute_state(&self) -> Option<&dyn AttributeState> {
        Some(self)
    }
}

impl SnapshotDecodable for Sensor {
    const QUALIFIED_NAME: &'static str = "lab::Sensor";

    fn from_attributes(attributes: &Attributes) -> Result<Self, StateError> {
        let id = attributes
            .require("id")?
            .as_str()
            .ok_or_else(|| StateError::invalid_attribute("id", "expected a string"))?;
        let reading = attributes
            .require("reading")?
            .as_f64()
            .ok_or_else(|| StateError::invalid_attribute("reading", "expected a float"))?;
        Ok(Sensor {
            id: id.to_string(),
            reading,
        })
    }
}

fn sensor_engine() -> SnapshotEngine {
    SnapshotEngine::new(Arc::new(
        TypeRegistry::builder().register_class::<Sensor>().build(),
    ))
}

fn absolute_only(absolute: f64) -> CompareOptions {
    CompareOptions::default().with_tolerance(ToleranceConfig::new(absolute, 0.0).unwrap())
}

#[test]
fn test_round_trip_matches() {
    let engine = sensor_engine();
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let value = Value::map([
        ("none", Value::Null),
        ("flag", Value::from(true)),
        ("count", Value::from(42)),
        ("ratio", Value::from(0.1 + 0.2)),
        ("z", Value::from(Complex::new(1.0, -2.0))),
        ("name", Value::from("probe")),
        ("raw", Value::bytes(vec![0u8, 159, 255])),
        ("pair", Value::tuple([1, 2])),
        ("tags", Value::set(["b", "a"])),
        ("speed", Value::from(Quantity::new(3.5, "meter / second"))),
        ("file", Value::from(PathBuf::from("data/input.csv"))),
        ("day", Value::from(date)),
        (
            "sensor",
            Value::object(Sensor {
                id: "s-1".to_string(),
                reading: 20.25,
            }),
        ),
    ]);

    let record = engine.encode(&value);
    let decoded = engine.decode(&record).unwrap();
    assert!(engine.comparator().compare_values(&value, &decoded).is_match());

    match decoded.get("sensor").and_then(Value::as_object) {
        Some(object) => assert_eq!(object.qualified_name(), "lab::Sensor"),
        None => panic!("sensor did not decode to an object"),
    }
}

#[test]
fn test_record_survives_json_text() {
    let engine = SnapshotEngine::default();
    let value = Value::list([Value::from(f64::NAN), Value::from(f64::INFINITY), Value::from(-0.5)]);
    let record = engine.encode(&value);

    let text = serde_json::to_string(&record).unwrap();
    assert!(text.contains("\"NaN\""));
    let parsed: snapcheck::Record = serde_json::from_str(&text).unwrap();
    assert!(engine.compare(&record, &parsed).is_match());
}

#[test]
fn test_absolute_tolerance() {
    let registry = TypeRegistry::new();
    let comparator = Comparator::new(&registry, absolute_only(1e-6));
    assert!(comparator
        .compare_values(&Value::from(1.000000), &Value::from(1.0000005))
        .is_match());

    let result = comparator.compare_values(&Value::from(1.0), &Value::from(1.00001));
    assert!(result.is_mismatch());
    assert_eq!(result.entries()[0].kind, MismatchKind::OutOfTolerance);
}

#[test]
fn test_set_order_independence() {
    let engine = SnapshotEngine::default();
    assert_eq!(
        engine.encode(&Value::set([1, 2, 3])),
        engine.encode(&Value::set([3, 2, 1]))
    );
}

#[test]
fn test_mapping_key_differences() {
    let engine = SnapshotEngine::default();
    let result = engine
        .comparator()
        .compare_values(&Value::map([("a", 1), ("b", 2)]), &Value::map([("a", 1), ("c", 2)]));

    let entries = result.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].location, "$[\"b\"]");
    assert_eq!(entries[0].kind, MismatchKind::MissingKey);
    assert_eq!(entries[1].location, "$[\"c\"]");
    assert_eq!(entries[1].kind, MismatchKind::ExtraKey);

    let summary = result.summary(false);
    assert!(summary.starts_with("Found 2 mismatch(es):"));
}

#[test]
fn test_missing_baseline_is_unchecked() {
    let engine = SnapshotEngine::default();
    assert!(engine.matches(None, &Value::from(1)).is_unchecked());
}

#[test]
fn test_self_referential_list() {
    let node = SharedValue::new(Value::list(["head"]));
    if let Value::List(items) = &mut *node.write() {
        items.push(Value::Shared(node.clone()));
    }
    let value = Value::Shared(node.clone());

    let engine = SnapshotEngine::default();
    let record = engine.encode(&value);
    assert!(record.items().unwrap()[1].is_recursion_sentinel());

    let result = engine.comparator().compare_values(&value, &value);
    assert_eq!(result.entries().len(), 1);
    assert_eq!(result.entries()[0].kind, MismatchKind::RecursionBoundary);
    assert_eq!(result.entries()[0].location, "$[1]");

    // drop the cycle so the node can be freed
    *node.write() = Value::Null;
}

#[test]
fn test_unknown_class_placeholder_compares_structurally() {
    let stored = sensor_engine().encode(&Value::object(Sensor {
        id: "s-9".to_string(),
        reading: 1.5,
    }));

    // a reader without the class registered
    let plain = SnapshotEngine::default();
    let (placeholder, warnings) = plain.decode_with_warnings(&stored).unwrap();
    assert!(matches!(placeholder, Value::Placeholder(_)));
    assert_eq!(warnings.len(), 1);

    let fresh = sensor_engine().encode(&Value::object(Sensor {
        id: "s-9".to_string(),
        reading: 1.5,
    }));
    let placeholder_record = plain.encode(&placeholder);
    assert!(plain.compare(&placeholder_record, &fresh).is_match());

    let changed = sensor_engine().encode(&Value::object(Sensor {
        id: "s-9".to_string(),
        reading: 2.5,
    }));
    let result = plain.compare(&placeholder_record, &changed);
    assert_eq!(result.entries()[0].location, "$.reading");
}
