//! cqlschema - CQL column types as validators and serialization pipelines
//!
//! Build a column with the `cql` builders, group columns into a `Schema`,
//! then run `validate` to check a document, fill defaults for the current
//! operation, and get back the form to store:
//!
//! ```
//! use cqlschema::{cql, validate, Schema, ValidateOptions};
//! use serde_json::json;
//!
//! let users = Schema::new()
//!     .field("id", cql::timeuuid())
//!     .field("name", cql::text().required())
//!     .field("prefs", cql::json())
//!     .with_partition_key("id");
//!
//! let stored = validate(
//!     &json!({"name": "ada", "prefs": {"dark": true}}),
//!     &users,
//!     &ValidateOptions::for_operation("create"),
//! )
//! .into_result()
//! .unwrap();
//!
//! assert!(stored["id"].is_string());
//! assert_eq!(stored["prefs"], json!("{\"dark\":true}"));
//! ```

pub mod config;
pub mod observability;
pub mod schema;

/// Column type builders, one per CQL type
pub mod cql {
    pub use crate::schema::{
        ascii, bigint, blob, boolean, counter, create, decimal, double, float, inet, int, json,
        json_shaped, list, map, set, text, timestamp, timestamp_with, timeuuid, timeuuid_with,
        uuid, uuid_with, varchar, varint,
    };
}

pub use config::ValidationConfig;
pub use schema::{
    validate, Annotation, CqlType, DefaultSpec, KeyDef, OperationContext, Schema, SchemaError,
    SchemaResult, TableDefinition, Validate, ValidateOptions, Validation, ValidationError,
    ValidationErrorCode, Validator,
};
