//! Declarative table definitions
//!
//! A definition is a JSON document naming each column's type, plus the
//! table's keys and aliases:
//!
//! ```json
//! {
//!   "fields": {
//!     "id":      { "type": "timeuuid", "required": true },
//!     "tags":    { "type": "set", "setType": "text" },
//!     "scores":  { "type": "map", "mapType": ["text", "int"], "nullable": true },
//!     "created": { "type": "timestamp", "default": "create" }
//!   },
//!   "partitionKey": "id",
//!   "clusteringKey": ["created"],
//!   "lookupKeys": ["tags"],
//!   "aliases": { "identifier": "id" }
//! }
//! ```
//!
//! Building checks that every key and alias names a declared field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::errors::{SchemaError, SchemaResult};
use super::factory::{create, CreateOptions};
use super::object::{KeyDef, Schema};
use crate::observability::Event;

/// One column of a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(flatten)]
    pub options: CreateOptions,
    #[serde(default)]
    pub required: bool,
}

/// A table: columns plus key metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDefinition {
    pub fields: BTreeMap<String, FieldDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<KeyDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_key: Option<KeyDef>,
    #[serde(default)]
    pub lookup_keys: Vec<String>,
    /// Alias name to field name
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub allow_unknown: bool,
}

impl TableDefinition {
    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_value(value: Value) -> SchemaResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Builds the schema described by this definition.
    pub fn build(&self) -> SchemaResult<Schema> {
        self.validate_structure()?;

        let mut schema = Schema::new().allow_unknown(self.allow_unknown);
        for (name, field) in &self.fields {
            let validator = create(&field.type_name, &field.options).map_err(|e| match e {
                SchemaError::UnknownType(_)
                | SchemaError::MissingSubType { .. }
                | SchemaError::InvalidDefault { .. } => {
                    SchemaError::MalformedDefinition(format!("field '{}': {}", name, e))
                }
                other => other,
            })?;
            let validator = if field.required {
                validator.required()
            } else {
                validator
            };
            schema = schema.field(name.clone(), validator);
        }

        if let Some(key) = &self.partition_key {
            schema = schema.with_partition_key(key.clone());
        }
        if let Some(key) = &self.clustering_key {
            schema = schema.with_clustering_key(key.clone());
        }
        if !self.lookup_keys.is_empty() {
            schema = schema.with_lookup_keys(self.lookup_keys.iter().cloned());
        }
        for (alias, field) in &self.aliases {
            schema = schema.with_alias(alias.clone(), field.clone());
        }

        debug!(
            event = Event::DefinitionLoaded.as_str(),
            fields = self.fields.len(),
            "table definition built"
        );
        Ok(schema)
    }

    /// Validates the definition itself (not a document)
    pub fn validate_structure(&self) -> SchemaResult<()> {
        if self.fields.is_empty() {
            return Err(SchemaError::MalformedDefinition(
                "definition must declare at least one field".into(),
            ));
        }

        let keys = self
            .partition_key
            .iter()
            .chain(self.clustering_key.iter())
            .flat_map(KeyDef::field_names)
            .chain(self.lookup_keys.iter().map(String::as_str));
        for key in keys {
            if !self.fields.contains_key(key) {
                return Err(SchemaError::MalformedDefinition(format!(
                    "key '{}' is not a declared field",
                    key
                )));
            }
        }

        for (alias, field) in &self.aliases {
            if !self.fields.contains_key(field) {
                return Err(SchemaError::MalformedDefinition(format!(
                    "alias '{}' targets undeclared field '{}'",
                    alias, field
                )));
            }
            if self.fields.contains_key(alias) {
                return Err(SchemaError::MalformedDefinition(format!(
                    "alias '{}' shadows a declared field",
                    alias
                )));
            }
        }

        Ok(())
    }
}
