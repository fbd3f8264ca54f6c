//! Handlers for leaf values

use super::unexpected_payload;
use crate::compare::{MismatchKind, Walk};
use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{SnapcheckResult, SnapshotWarning};
use crate::record::{Payload, Record, TypeTag};
use crate::registry::TypeHandler;
use crate::value::{Complex, DateTimeValue, Value};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::path::PathBuf;

/// Null, booleans and strings
pub struct PrimitiveHandler;

impl TypeHandler for PrimitiveHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Primitive
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::Bool(_) | Value::Str(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let payload = match value {
            Value::Bool(flag) => Payload::Bool(*flag),
            Value::Str(text) => Payload::Text(text.clone()),
            _ => Payload::Null,
        };
        Record::new(TypeTag::Primitive, payload)
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match &record.payload {
            Payload::Null => Ok(Value::Null),
            Payload::Bool(flag) => Ok(Value::Bool(*flag)),
            Payload::Text(text) => Ok(Value::Str(text.clone())),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report_value_change(expected, actual);
        }
    }
}

/// Integers
pub struct ExactHandler;

impl TypeHandler for ExactHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::NumericExact
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Int(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let number = value.as_i64().unwrap_or_default();
        Record::new(TypeTag::NumericExact, Payload::Int(number))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match record.payload {
            Payload::Int(number) => Ok(Value::Int(number)),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report_value_change(expected, actual);
        }
    }
}

/// Floats, kept at full precision and compared with tolerance
pub struct FloatHandler;

impl TypeHandler for FloatHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::NumericFloat
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Float(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let number = value.as_f64().unwrap_or(f64::NAN);
        Record::new(TypeTag::NumericFloat, Payload::Float(number))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match record.payload {
            Payload::Float(number) => Ok(Value::Float(number)),
            Payload::Int(number) => Ok(Value::Float(number as f64)),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        match (&expected.payload, &actual.payload) {
            (Payload::Float(a), Payload::Float(b)) => walk.compare_floats(*a, *b),
            _ => walk.report_value_change(expected, actual),
        }
    }
}

/// Complex numbers, compared componentwise with tolerance
pub struct ComplexHandler;

impl TypeHandler for ComplexHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::NumericComplex
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Complex(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let Complex { re, im } = match value {
            Value::Complex(number) => *number,
            _ => Complex::new(f64::NAN, f64::NAN),
        };
        Record::new(TypeTag::NumericComplex, Payload::Complex { re, im })
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match record.payload {
            Payload::Complex { re, im } => Ok(Value::Complex(Complex::new(re, im))),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        match (&expected.payload, &actual.payload) {
            (Payload::Complex { re: er, im: ei }, Payload::Complex { re: ar, im: ai }) => {
                let tolerance = walk.tolerance();
                if !(tolerance.within(*er, *ar) && tolerance.within(*ei, *ai)) {
                    let reason = format!(
                        "out of tolerance: {} vs {} exceeds {}",
                        Complex::new(*er, *ei),
                        Complex::new(*ar, *ai),
                        tolerance
                    );
                    walk.report(
                        MismatchKind::OutOfTolerance,
                        reason,
                        Some(expected.payload_json()),
                        Some(actual.payload_json()),
                    );
                }
            }
            _ => walk.report_value_change(expected, actual),
        }
    }
}

/// Binary data, stored as standard base64
pub struct BytesHandler;

impl TypeHandler for BytesHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Bytes
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Bytes(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let text = match value {
            Value::Bytes(data) => BASE64.encode(data),
            _ => String::new(),
        };
        Record::new(TypeTag::Bytes, Payload::Text(text))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match &record.payload {
            Payload::Text(text) => BASE64
                .decode(text)
                .map(Value::Bytes)
                .map_err(|e| decoder.error(format!("invalid base64 in 'bytes' record: {}", e))),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report_value_change(expected, actual);
        }
    }
}

/// Filesystem paths
pub struct PathHandler;

impl TypeHandler for PathHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Path
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Path(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let text = match value {
            Value::Path(path) => path.to_string_lossy().into_owned(),
            _ => String::new(),
        };
        Record::new(TypeTag::Path, Payload::Text(text))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match &record.payload {
            Payload::Text(text) => Ok(Value::Path(PathBuf::from(text))),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report_value_change(expected, actual);
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.6f";
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const ZONED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";
// parsing accepts any number of fractional digits
const TIME_PARSE: &str = "%H:%M:%S%.f";
const NAIVE_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ZONED_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Dates, times, datetimes and durations
pub struct DateTimeHandler;

impl DateTimeHandler {
    fn kind(value: &DateTimeValue) -> &'static str {
        match value {
            DateTimeValue::Date(_) => "date",
            DateTimeValue::Time(_) => "time",
            DateTimeValue::Naive(_) => "datetime_without_timezone",
            DateTimeValue::Zoned(_) => "datetime_with_timezone",
            DateTimeValue::Delta(_) => "timedelta",
        }
    }

    fn total_seconds(delta: &chrono::Duration) -> f64 {
        delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
    }

    fn parse(kind: &str, text: &str) -> Result<DateTimeValue, chrono::ParseError> {
        Ok(match kind {
            "date" => DateTimeValue::Date(NaiveDate::parse_from_str(text, DATE_FORMAT)?),
            "time" => DateTimeValue::Time(NaiveTime::parse_from_str(text, TIME_PARSE)?),
            "datetime_with_timezone" => {
                DateTimeValue::Zoned(DateTime::parse_from_str(text, ZONED_PARSE)?)
            }
            _ => DateTimeValue::Naive(NaiveDateTime::parse_from_str(text, NAIVE_PARSE)?),
        })
    }
}

impl TypeHandler for DateTimeHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::DateTime
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::DateTime(_))
    }

    fn encode(&self, value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        let Value::DateTime(datetime) = value else {
            return Record::new(TypeTag::DateTime, Payload::Null);
        };
        let payload = match datetime {
            DateTimeValue::Date(date) => Payload::Text(date.format(DATE_FORMAT).to_string()),
            DateTimeValue::Time(time) => Payload::Text(time.format(TIME_FORMAT).to_string()),
            DateTimeValue::Naive(naive) => Payload::Text(naive.format(NAIVE_FORMAT).to_string()),
            DateTimeValue::Zoned(zoned) => Payload::Text(zoned.format(ZONED_FORMAT).to_string()),
            DateTimeValue::Delta(delta) => Payload::Float(Self::total_seconds(delta)),
        };
        Record::new(TypeTag::DateTime, payload).with_kind(Self::kind(datetime))
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        let kind = record.kind.as_deref().unwrap_or_default();
        match (&record.payload, kind) {
            (Payload::Float(seconds), "timedelta") => {
                if !seconds.is_finite() {
                    return Err(decoder.error("timedelta must be a finite number of seconds"));
                }
                let micros = (seconds * 1e6).round() as i64;
                Ok(Value::DateTime(DateTimeValue::Delta(
                    chrono::Duration::microseconds(micros),
                )))
            }
            (Payload::Text(text), kind) if kind != "timedelta" => Self::parse(kind, text)
                .map(Value::DateTime)
                .map_err(|e| decoder.error(format!("invalid {} '{}': {}", kind, text, e))),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.kind != actual.kind {
            walk.report_type_change(expected, actual);
            return;
        }
        match (&expected.payload, &actual.payload) {
            (Payload::Float(a), Payload::Float(b)) => walk.compare_floats(*a, *b),
            (Payload::Text(a), Payload::Text(b))
                if expected.kind.as_deref() == Some("datetime_with_timezone") =>
            {
                // the same instant under another offset is equal
                let same_instant = match (
                    DateTime::parse_from_str(a, ZONED_PARSE),
                    DateTime::parse_from_str(b, ZONED_PARSE),
                ) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => a == b,
                };
                if !same_instant {
                    walk.report_value_change(expected, actual);
                }
            }
            (a, b) if a != b => walk.report_value_change(expected, actual),
            _ => {}
        }
    }
}

/// Catch-all: stores the debug representation and warns
pub struct UnrecognizedHandler;

impl TypeHandler for UnrecognizedHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::Unrecognized
    }

    fn accepts(&self, _value: &Value) -> bool {
        true
    }

    fn encode(&self, value: &Value, encoder: &mut Encoder<'_>) -> Record {
        let type_name = value.type_name();
        encoder.warn(SnapshotWarning::UnsupportedType {
            location: encoder.location().to_string(),
            type_name: type_name.clone(),
        });
        let text = match value {
            Value::Object(object) => format!("{:?}", object),
            other => format!("{:?}", other),
        };
        Record::new(TypeTag::Unrecognized, Payload::Text(text)).with_class(type_name)
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        match &record.payload {
            Payload::Text(_) => Ok(decoder.placeholder(record)),
            _ => Err(unexpected_payload(record, decoder)),
        }
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        if expected.payload != actual.payload {
            walk.report_value_change(expected, actual);
        }
    }
}

/// Resolves recursion sentinels. Never classifies a value: sentinels are
/// written by the encoder and compared by the walk before dispatch.
pub struct RecursionHandler;

impl TypeHandler for RecursionHandler {
    fn tag(&self) -> TypeTag {
        TypeTag::RecursiveReference
    }

    fn accepts(&self, _value: &Value) -> bool {
        false
    }

    fn encode(&self, _value: &Value, _encoder: &mut Encoder<'_>) -> Record {
        Record::recursion_sentinel()
    }

    fn decode(&self, record: &Record, decoder: &mut Decoder<'_>) -> SnapcheckResult<Value> {
        Ok(decoder.placeholder(record))
    }

    fn compare(&self, expected: &Record, actual: &Record, walk: &mut Walk<'_>) {
        walk.compare(expected, actual);
    }
}
