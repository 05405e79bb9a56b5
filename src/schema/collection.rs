//! map, list and set columns
//!
//! A list or set column takes either a full replacement array or an
//! update descriptor:
//!
//! ```text
//! list: ["a", "b"]                     set: ["a", "b"]
//! list: {"append": ["c"]}              set: {"add": ["c"]}
//! list: {"prepend": ["z"], "index": {"0": "y"}}
//! list: {"remove": ["a"]}              set: {"remove": ["a"]}
//! ```
//!
//! A descriptor must carry at least one recognized key and nothing else.
//! Transforms keep whichever shape came in and convert only elements.

use serde_json::{Map, Value};

use super::annotation::{Annotation, SubType, Transform};
use super::errors::ValidationDetails;
use super::pipeline::{Validate, ValidationState};
use super::rules::{index_key, map_key};
use super::validator::{make_path, type_error, Rule, Validator};

const LIST_OPERATIONS: &[&str] = &["prepend", "append", "remove", "index"];
const SET_OPERATIONS: &[&str] = &["add", "remove"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SequenceKind {
    List,
    Set,
}

impl SequenceKind {
    fn type_name(&self) -> &'static str {
        match self {
            SequenceKind::List => "list",
            SequenceKind::Set => "set",
        }
    }

    fn operations(&self) -> &'static [&'static str] {
        match self {
            SequenceKind::List => LIST_OPERATIONS,
            SequenceKind::Set => SET_OPERATIONS,
        }
    }
}

/// Map column.
///
/// `key_type` is recorded in the annotation only; field names are checked
/// against the word/dash pattern, not against the key type.
pub fn map(key_type: impl Into<String>, value_type: Validator) -> Validator {
    let sub_type = SubType::Pair(key_type.into(), element_type_name(&value_type));

    let to_stored = value_type.clone();
    let to_app = value_type.clone();
    let annotation = Annotation::cql("map")
        .with_sub_type(sub_type)
        .with_serialize(Transform::new(move |v| convert_entries(v, &|x| to_stored.serialize(x))))
        .with_deserialize(Transform::new(move |v| convert_entries(v, &|x| to_app.deserialize(x))));

    Validator::new(Rule::Map(Box::new(value_type))).meta(annotation)
}

/// List column: ordered, duplicates allowed
pub fn list(element_type: Validator) -> Validator {
    sequence(SequenceKind::List, element_type)
}

/// Set column: no duplicate elements
pub fn set(element_type: Validator) -> Validator {
    sequence(SequenceKind::Set, element_type)
}

fn sequence(kind: SequenceKind, element_type: Validator) -> Validator {
    let sub_type = SubType::Element(element_type_name(&element_type));

    let to_stored = element_type.clone();
    let to_app = element_type.clone();
    let annotation = Annotation::cql(kind.type_name())
        .with_sub_type(sub_type)
        .with_serialize(Transform::new(move |v| convert_elements(v, &|x| to_stored.serialize(x))))
        .with_deserialize(Transform::new(move |v| convert_elements(v, &|x| to_app.deserialize(x))));

    Validator::new(Rule::Sequence(kind, Box::new(element_type))).meta(annotation)
}

/// Canonical type of an element; empty when the element is not CQL-tagged.
fn element_type_name(element: &Validator) -> String {
    element.cql_type().unwrap_or_default()
}

fn convert_entries(value: &Value, convert: &dyn Fn(&Value) -> Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        Value::Object(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, item)| (key.clone(), convert(item)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn convert_elements(value: &Value, convert: &dyn Fn(&Value) -> Value) -> Value {
    match value {
        Value::Null => Value::Array(Vec::new()),
        Value::Array(items) => Value::Array(items.iter().map(convert).collect()),
        Value::Object(operations) => Value::Object(
            operations
                .iter()
                .map(|(op, arg)| {
                    let converted = match arg {
                        Value::Array(items) => Value::Array(items.iter().map(convert).collect()),
                        Value::Object(indexed) => {
                            convert_entries(&Value::Object(indexed.clone()), convert)
                        }
                        other => other.clone(),
                    };
                    (op.clone(), converted)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

pub(crate) fn check_map(
    values: &Validator,
    value: &Value,
    path: &str,
    state: &mut ValidationState<'_>,
) -> Option<Value> {
    let Some(entries) = value.as_object() else {
        state.report(type_error(path, "map", value));
        return None;
    };

    let before = state.failures();
    let mut accepted = Map::new();
    for (key, item) in entries {
        let item_path = make_path(path, key);
        if !map_key().is_match(key) {
            state.report(ValidationDetails::pattern_mismatch(
                item_path,
                "key of word or dash characters",
                key.as_str(),
            ));
        } else if let Some(checked) = values.check(item, &item_path, state) {
            accepted.insert(key.clone(), checked);
        }
        if state.halted() {
            return None;
        }
    }

    (state.failures() == before).then_some(Value::Object(accepted))
}

pub(crate) fn check_sequence(
    kind: SequenceKind,
    element: &Validator,
    value: &Value,
    path: &str,
    state: &mut ValidationState<'_>,
) -> Option<Value> {
    match value {
        Value::Array(items) => check_items(element, items, path, kind == SequenceKind::Set, state),
        Value::Object(operations) => check_descriptor(kind, element, operations, path, state),
        _ => {
            state.report(type_error(
                path,
                &format!("{} or update descriptor", kind.type_name()),
                value,
            ));
            None
        }
    }
}

fn check_items(
    element: &Validator,
    items: &[Value],
    path: &str,
    unique: bool,
    state: &mut ValidationState<'_>,
) -> Option<Value> {
    let before = state.failures();
    let mut accepted = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{}[{}]", path, i);
        if let Some(checked) = element.check(item, &item_path, state) {
            if unique && accepted.iter().any(|seen| same_value(seen, &checked)) {
                state.report(ValidationDetails::duplicate(item_path));
            } else {
                accepted.push(checked);
            }
        }
        if state.halted() {
            return None;
        }
    }

    (state.failures() == before).then_some(Value::Array(accepted))
}

/// Structural equality where numbers compare by value (`1 == 1.0`)
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).map_or(false, |y| same_value(x, y)))
        }
        _ => a == b,
    }
}

fn check_descriptor(
    kind: SequenceKind,
    element: &Validator,
    operations: &Map<String, Value>,
    path: &str,
    state: &mut ValidationState<'_>,
) -> Option<Value> {
    let recognized = kind.operations();
    let before = state.failures();

    if !operations.keys().any(|op| recognized.contains(&op.as_str())) {
        state.report(ValidationDetails::missing_key_group(path, recognized));
        if state.halted() {
            return None;
        }
    }

    let mut accepted = Map::new();
    for (op, arg) in operations {
        let op_path = make_path(path, op);
        let checked = if !recognized.contains(&op.as_str()) {
            state.report(ValidationDetails::unknown_key(op_path));
            None
        } else if op == "index" {
            check_index(element, arg, &op_path, state)
        } else if let Value::Array(items) = arg {
            check_items(element, items, &op_path, false, state)
        } else {
            state.report(type_error(&op_path, "array", arg));
            None
        };

        if let Some(checked) = checked {
            accepted.insert(op.clone(), checked);
        }
        if state.halted() {
            return None;
        }
    }

    (state.failures() == before).then_some(Value::Object(accepted))
}

fn check_index(
    element: &Validator,
    arg: &Value,
    path: &str,
    state: &mut ValidationState<'_>,
) -> Option<Value> {
    let Some(positions) = arg.as_object() else {
        state.report(type_error(path, "index map", arg));
        return None;
    };

    let before = state.failures();
    let mut accepted = Map::new();
    for (position, item) in positions {
        let item_path = make_path(path, position);
        if !index_key().is_match(position) {
            state.report(ValidationDetails::pattern_mismatch(
                item_path,
                "non-negative integer index",
                position.as_str(),
            ));
        } else if let Some(checked) = element.check(item, &item_path, state) {
            accepted.insert(position.clone(), checked);
        }
        if state.halted() {
            return None;
        }
    }

    (state.failures() == before).then_some(Value::Object(accepted))
}
