//! CQL column validators
//!
//! A `Validator` checks one value and also carries the CQL annotations and
//! the serialize/deserialize transforms for that column. A `Schema` groups
//! column validators into a table and owns the table's key metadata.
//!
//! # Design Principles
//!
//! - Checking, defaulting and serialization are one pipeline (`validate`)
//! - Annotations are an ordered list merged on read, later layers win
//! - Defaults depend on the operation label, never on ambient state
//! - Schemas are immutable; key setters return a new schema

mod annotation;
mod collection;
mod defaults;
mod definition;
mod errors;
mod factory;
mod object;
mod pipeline;
mod rules;
mod scalar;
mod types;
mod validator;

pub use annotation::{Annotation, Metadata, SubType, Transform};
pub use collection::{list, map, set};
pub use defaults::{
    DateTrigger, DefaultSpec, OperationContext, UuidTrigger, OPERATION_CREATE, OPERATION_UPDATE,
};
pub use definition::{FieldDefinition, TableDefinition};
pub use errors::{
    SchemaError, SchemaResult, ValidationDetails, ValidationError, ValidationErrorCode,
};
pub use factory::{create, CreateOptions};
pub use object::{KeyDef, Schema};
pub use pipeline::{validate, Validate, ValidateOptions, Validation, ValidationState};
pub use scalar::{
    ascii, bigint, blob, boolean, counter, decimal, double, float, inet, int, json, json_shaped,
    text, timestamp, timestamp_with, timeuuid, timeuuid_with, uuid, uuid_with, varchar, varint,
};
pub use types::CqlType;
pub use validator::Validator;
