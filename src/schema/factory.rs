//! Build a column validator from a type name
//!
//! `create` is the dynamic counterpart of the `cql::*` builders, used when
//! column types come from data (see `TableDefinition`). Misuse is a
//! construction error, reported as `SchemaError` before any value is seen.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collection::{list, map, set};
use super::defaults::DefaultSpec;
use super::errors::{SchemaError, SchemaResult};
use super::scalar;
use super::types::CqlType;
use super::validator::Validator;
use crate::observability::Event;

/// Options for `create`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateOptions {
    /// Key and value type names of a map
    pub map_type: Option<(String, String)>,
    /// Element type name of a list
    pub list_type: Option<String>,
    /// Element type name of a set
    pub set_type: Option<String>,
    /// Also accept `null`
    pub nullable: bool,
    /// Default trigger: create/update for timestamp, empty/v1/v4 for uuids
    pub default: Option<String>,
}

impl CreateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_of(key_type: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            map_type: Some((key_type.into(), value_type.into())),
            ..Self::default()
        }
    }

    pub fn list_of(element_type: impl Into<String>) -> Self {
        Self {
            list_type: Some(element_type.into()),
            ..Self::default()
        }
    }

    pub fn set_of(element_type: impl Into<String>) -> Self {
        Self {
            set_type: Some(element_type.into()),
            ..Self::default()
        }
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, trigger: impl Into<String>) -> Self {
        self.default = Some(trigger.into());
        self
    }
}

/// Builds the validator for `type_name`.
///
/// # Errors
///
/// - `UnknownType` for names outside the CQL catalogue
/// - `MissingSubType` for map/list/set without their element option
/// - `InvalidDefault` for a default the kind does not support
pub fn create(type_name: &str, options: &CreateOptions) -> SchemaResult<Validator> {
    let kind: CqlType = type_name.parse()?;

    let default = options
        .default
        .as_deref()
        .map(|trigger| DefaultSpec::parse_for(kind, trigger))
        .transpose()?;

    let validator = match default {
        Some(spec) => scalar::defaulted(kind, spec),
        None => build(kind, options)?,
    };
    let validator = if options.nullable {
        validator.nullable()
    } else {
        validator
    };

    debug!(
        event = Event::SchemaTypeCreated.as_str(),
        type_name,
        nullable = options.nullable,
        "column validator created"
    );
    Ok(validator)
}

fn build(kind: CqlType, options: &CreateOptions) -> SchemaResult<Validator> {
    let validator = match kind {
        CqlType::Ascii => scalar::ascii(),
        CqlType::Bigint => scalar::bigint(),
        CqlType::Blob => scalar::blob(),
        CqlType::Boolean => scalar::boolean(),
        CqlType::Counter => scalar::counter(),
        CqlType::Decimal => scalar::decimal(),
        CqlType::Double => scalar::double(),
        CqlType::Float => scalar::float(),
        CqlType::Inet => scalar::inet(),
        CqlType::Int => scalar::int(),
        CqlType::Json => scalar::json(),
        CqlType::Text => scalar::text(),
        CqlType::Timestamp => scalar::timestamp(),
        CqlType::Timeuuid => scalar::timeuuid(),
        CqlType::Uuid => scalar::uuid(),
        CqlType::Varchar => scalar::varchar(),
        CqlType::Varint => scalar::varint(),
        CqlType::Map => {
            let (key_type, value_type) = options
                .map_type
                .as_ref()
                .ok_or_else(|| missing_sub_type(kind, "mapType"))?;
            // key type is only recorded, but it still has to be a real type
            key_type.parse::<CqlType>()?;
            map(key_type.clone(), element(value_type)?)
        }
        CqlType::List => {
            let element_type = options
                .list_type
                .as_deref()
                .ok_or_else(|| missing_sub_type(kind, "listType"))?;
            list(element(element_type)?)
        }
        CqlType::Set => {
            let element_type = options
                .set_type
                .as_deref()
                .ok_or_else(|| missing_sub_type(kind, "setType"))?;
            set(element(element_type)?)
        }
    };
    Ok(validator)
}

fn element(type_name: &str) -> SchemaResult<Validator> {
    create(type_name, &CreateOptions::default())
}

fn missing_sub_type(kind: CqlType, option: &'static str) -> SchemaError {
    SchemaError::MissingSubType {
        type_name: kind.type_name().to_string(),
        option,
    }
}
