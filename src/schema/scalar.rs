//! Scalar column builders
//!
//! Each builder returns a validator annotated `{cql: true, type: <kind>}`,
//! plus `default` when the caller chose one.

use serde_json::Value;

use super::annotation::{Annotation, Transform};
use super::defaults::{DateTrigger, DefaultSpec, UuidTrigger};
use super::types::CqlType;
use super::validator::{Rule, Validator};

fn scalar(kind: CqlType) -> Validator {
    Validator::new(Rule::Scalar(kind)).meta(Annotation::cql(kind.type_name()))
}

/// A scalar with a caller-chosen default, recorded in the annotation.
pub(crate) fn defaulted(kind: CqlType, default: DefaultSpec) -> Validator {
    Validator::new(Rule::Scalar(kind))
        .with_default(default)
        .meta(Annotation::cql(kind.type_name()).with_default(default))
}

pub fn ascii() -> Validator {
    scalar(CqlType::Ascii).strict(true)
}

pub fn text() -> Validator {
    scalar(CqlType::Text).strict(true)
}

pub fn varchar() -> Validator {
    scalar(CqlType::Varchar)
}

/// 32-bit signed integer; numeral strings convert unless strict
pub fn int() -> Validator {
    scalar(CqlType::Int)
}

/// 64-bit signed integer; beyond 2^53 - 1 pass it as a string
pub fn bigint() -> Validator {
    scalar(CqlType::Bigint)
}

pub fn counter() -> Validator {
    scalar(CqlType::Counter)
}

pub fn decimal() -> Validator {
    scalar(CqlType::Decimal)
}

pub fn double() -> Validator {
    scalar(CqlType::Double)
}

pub fn float() -> Validator {
    scalar(CqlType::Float)
}

pub fn varint() -> Validator {
    scalar(CqlType::Varint)
}

/// Hex string or array of byte values
pub fn blob() -> Validator {
    scalar(CqlType::Blob)
}

pub fn boolean() -> Validator {
    scalar(CqlType::Boolean)
}

pub fn inet() -> Validator {
    scalar(CqlType::Inet)
}

/// Epoch millis or ISO-8601 date/date-time
pub fn timestamp() -> Validator {
    scalar(CqlType::Timestamp)
}

/// Timestamp stamped with the current time on matching operations
pub fn timestamp_with(trigger: DateTrigger) -> Validator {
    defaulted(CqlType::Timestamp, DefaultSpec::Date(trigger))
}

/// Uuid, generated as v4 on create
pub fn uuid() -> Validator {
    scalar(CqlType::Uuid).with_default(DefaultSpec::Uuid(UuidTrigger::V4))
}

pub fn uuid_with(trigger: UuidTrigger) -> Validator {
    defaulted(CqlType::Uuid, DefaultSpec::Uuid(trigger))
}

/// Time uuid, generated as v1 on create
pub fn timeuuid() -> Validator {
    scalar(CqlType::Timeuuid).with_default(DefaultSpec::Uuid(UuidTrigger::V1))
}

pub fn timeuuid_with(trigger: UuidTrigger) -> Validator {
    defaulted(CqlType::Timeuuid, DefaultSpec::Uuid(trigger))
}

/// Any JSON value, stored as text
pub fn json() -> Validator {
    json_column(None)
}

/// JSON value matching `shape`, stored as text
pub fn json_shaped(shape: impl Into<Validator>) -> Validator {
    json_column(Some(shape.into()))
}

fn json_column(shape: Option<Validator>) -> Validator {
    let annotation = Annotation::cql(CqlType::Text.type_name())
        .with_serialize(Transform::new(encode_json))
        .with_deserialize(Transform::new(decode_json));

    Validator::new(Rule::Json(shape.map(Box::new))).meta(annotation)
}

fn encode_json(value: &Value) -> Value {
    Value::String(value.to_string())
}

/// Non-text or unparsable input passes through unchanged.
fn decode_json(value: &Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::object::Schema;
    use crate::schema::pipeline::{validate, ValidateOptions};
    use serde_json::json;

    fn passes(validator: &Validator, value: Value) -> bool {
        validate(&value, validator, &ValidateOptions::default()).is_ok()
    }

    #[test]
    fn test_canonical_annotations() {
        assert_eq!(int().to_cql().unwrap().to_json(), json!({"cql": true, "type": "int"}));
        assert_eq!(
            timestamp_with(DateTrigger::Update).to_cql().unwrap().to_json(),
            json!({"cql": true, "type": "timestamp", "default": "update"})
        );
        assert_eq!(json().to_cql().unwrap().to_json(), json!({"cql": true, "type": "text"}));
    }

    #[test]
    fn test_implicit_uuid_defaults_are_not_annotated() {
        assert_eq!(uuid().default_spec(), Some(DefaultSpec::Uuid(UuidTrigger::V4)));
        assert_eq!(timeuuid().default_spec(), Some(DefaultSpec::Uuid(UuidTrigger::V1)));
        assert!(uuid().to_cql().unwrap().default.is_none());
        assert_eq!(
            uuid_with(UuidTrigger::Empty).to_cql().unwrap().default,
            Some(DefaultSpec::Uuid(UuidTrigger::Empty))
        );
    }

    #[test]
    fn test_text_is_strict() {
        assert!(text().is_strict());
        assert!(ascii().is_strict());
        assert!(!int().is_strict());
    }

    #[test]
    fn test_json_accepts_falsy_values() {
        for value in [json!(""), json!(false), json!(null), json!(0), json!([]), json!({"a": 1})] {
            assert!(passes(&json(), value));
        }
    }

    #[test]
    fn test_json_shape() {
        let shape = Schema::new().field("name", text().required());
        let column = json_shaped(shape);
        assert!(passes(&column, json!({"name": "x"})));
        assert!(!passes(&column, json!({"name": 1})));
        assert!(!passes(&column, json!({})));
        assert!(!passes(&column, json!(null)));
    }

    #[test]
    fn test_json_transforms_round_trip() {
        for value in [
            json!({"a": [1, 2]}),
            json!([1, "b"]),
            json!("s"),
            json!(true),
            json!(false),
            json!(""),
        ] {
            let stored = encode_json(&value);
            assert!(stored.is_string());
            assert_eq!(decode_json(&stored), value);
            assert_eq!(encode_json(&decode_json(&stored)), stored);
        }
    }

    #[test]
    fn test_blob_forms() {
        assert!(passes(&blob(), json!("")));
        assert!(passes(&blob(), json!("0xCAFE")));
        assert!(passes(&blob(), json!("deadbeef")));
        assert!(passes(&blob(), json!([0, 127, 255])));
        assert!(!passes(&blob(), json!("xyz")));
        assert!(!passes(&blob(), json!([256])));
        assert!(!passes(&blob(), json!(12)));
    }
}
