//! Column validators
//!
//! A `Validator` is an immutable rule for one value plus the metadata
//! chain describing it. Combinators consume the validator and return the
//! extended one, so a definition reads as a single expression:
//!
//! ```ignore
//! let created = cql::timestamp_with(DateTrigger::Create).required();
//! ```
//!
//! Validation semantics:
//! - `null` fails unless the validator is nullable (json accepts it)
//! - strings convert to numbers only for non-strict `int`
//! - absent object fields are checked by the owning `Schema`, which also
//!   resolves defaults

use serde_json::Value;

use super::annotation::{Annotation, Metadata};
use super::collection::{self, SequenceKind};
use super::defaults::DefaultSpec;
use super::errors::ValidationDetails;
use super::object::Schema;
use super::pipeline::{Validate, ValidationState};
use super::rules::{check_scalar, json_type_name};
use super::types::CqlType;

#[derive(Debug, Clone)]
pub(crate) enum Rule {
    /// Any value at all
    Any,
    Scalar(CqlType),
    /// Any value, or one matching the shape
    Json(Option<Box<Validator>>),
    /// Object whose values all match
    Map(Box<Validator>),
    Sequence(SequenceKind, Box<Validator>),
    Object(Box<Schema>),
}

/// Rule and metadata for one value
#[derive(Debug, Clone)]
pub struct Validator {
    rule: Rule,
    required: bool,
    nullable: bool,
    strict: bool,
    default: Option<DefaultSpec>,
    metadata: Metadata,
}

impl Validator {
    pub(crate) fn new(rule: Rule) -> Self {
        Self {
            rule,
            required: false,
            nullable: false,
            strict: false,
            default: None,
            metadata: Metadata::new(),
        }
    }

    /// Accepts anything, including `null`
    pub fn any() -> Self {
        Self::new(Rule::Any)
    }

    /// Nested object
    pub fn object(schema: Schema) -> Self {
        Self::new(Rule::Object(Box::new(schema)))
    }

    /// Field must be present (or defaulted)
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Field may be absent (the initial state)
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Accepts `null` as a value
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Turns implicit conversion off (`true`) or back on (`false`)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Appends an annotation to the metadata chain
    pub fn meta(mut self, annotation: Annotation) -> Self {
        self.metadata.push(annotation);
        self
    }

    /// Sets the default generated for absent values
    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.default = Some(default);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn default_spec(&self) -> Option<DefaultSpec> {
        self.default
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The merged CQL annotation, or `None` for non-CQL validators
    pub fn to_cql(&self) -> Option<Annotation> {
        self.metadata.canonical()
    }

    /// The CQL type name from the merged annotation
    pub fn cql_type(&self) -> Option<String> {
        self.to_cql().and_then(|annotation| annotation.type_name)
    }

    /// The nested schema, if this validator wraps one
    pub fn as_object(&self) -> Option<&Schema> {
        match &self.rule {
            Rule::Object(schema) => Some(schema),
            _ => None,
        }
    }

    fn accepts_null(&self) -> bool {
        self.nullable || matches!(self.rule, Rule::Any | Rule::Json(None))
    }

    pub(crate) fn resolve_default(&self, state: &ValidationState<'_>) -> Option<Value> {
        let default = self.default?;
        default.resolve(state.context()?)
    }
}

impl From<Schema> for Validator {
    fn from(schema: Schema) -> Self {
        Validator::object(schema)
    }
}

impl Validate for Validator {
    fn check(&self, value: &Value, path: &str, state: &mut ValidationState<'_>) -> Option<Value> {
        if value.is_null() {
            if self.accepts_null() {
                return Some(Value::Null);
            }
            state.report(ValidationDetails::null_value(path));
            return None;
        }

        match &self.rule {
            Rule::Any | Rule::Json(None) => Some(value.clone()),
            Rule::Json(Some(shape)) => shape.check(value, path, state),
            Rule::Scalar(kind) => match check_scalar(*kind, value, path, self.strict) {
                Ok(accepted) => Some(accepted),
                Err(details) => {
                    state.report(details);
                    None
                }
            },
            Rule::Map(values) => collection::check_map(values, value, path, state),
            Rule::Sequence(kind, element) => {
                collection::check_sequence(*kind, element, value, path, state)
            }
            Rule::Object(schema) => schema.check(value, path, state),
        }
    }

    fn serialize(&self, value: &Value) -> Value {
        match self.to_cql().and_then(|annotation| annotation.serialize) {
            Some(transform) => transform.apply(value),
            None => match &self.rule {
                Rule::Object(schema) => schema.serialize(value),
                _ => value.clone(),
            },
        }
    }

    fn deserialize(&self, value: &Value) -> Value {
        match self.to_cql().and_then(|annotation| annotation.deserialize) {
            Some(transform) => transform.apply(value),
            None => match &self.rule {
                Rule::Object(schema) => schema.deserialize(value),
                _ => value.clone(),
            },
        }
    }
}

/// Creates a field path from prefix and field name.
pub(crate) fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Creates a type mismatch report.
pub(crate) fn type_error(path: &str, expected: &str, actual: &Value) -> ValidationDetails {
    ValidationDetails::type_mismatch(path, expected, json_type_name(actual))
}
