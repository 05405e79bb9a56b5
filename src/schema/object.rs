//! Object schemas and table key metadata
//!
//! A `Schema` is the table-level wrapper around a set of column
//! validators. Key metadata (partition key, clustering key, lookup keys)
//! and aliases live here and only here: a column `Validator` has none.
//!
//! Every key or alias setter takes `&self` and returns a new schema; the
//! original is never touched. Key assignments are kept as an ordered log
//! so that `concat` carries forward whichever operand assigned last.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use super::annotation::Annotation;
use super::errors::ValidationDetails;
use super::pipeline::{Validate, ValidationState};
use super::validator::{make_path, type_error, Validator};
use crate::observability::Event;

/// A key declaration, stored exactly as assigned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDef {
    Name(String),
    Composite(Vec<KeyDef>),
}

/// Returned for keys that were never assigned, or were reset
static UNSET: KeyDef = KeyDef::Composite(Vec::new());

impl KeyDef {
    /// Whether this is the empty sequence
    pub fn is_empty(&self) -> bool {
        matches!(self, KeyDef::Composite(parts) if parts.is_empty())
    }

    /// Every field name in the declaration, depth first
    pub fn field_names(&self) -> Vec<&str> {
        match self {
            KeyDef::Name(name) => vec![name.as_str()],
            KeyDef::Composite(parts) => parts.iter().flat_map(KeyDef::field_names).collect(),
        }
    }
}

impl From<&str> for KeyDef {
    fn from(name: &str) -> Self {
        KeyDef::Name(name.to_string())
    }
}

impl From<String> for KeyDef {
    fn from(name: String) -> Self {
        KeyDef::Name(name)
    }
}

impl<T: Into<KeyDef>> From<Vec<T>> for KeyDef {
    fn from(parts: Vec<T>) -> Self {
        KeyDef::Composite(parts.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<KeyDef>, const N: usize> From<[T; N]> for KeyDef {
    fn from(parts: [T; N]) -> Self {
        KeyDef::Composite(parts.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum KeyMeta {
    /// `None` records an explicit reset
    PartitionKey(Option<KeyDef>),
    ClusteringKey(Option<KeyDef>),
    LookupKeys(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rename {
    from: String,
    to: String,
}

/// Object schema: named column validators plus table metadata
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, Validator>,
    renames: Vec<Rename>,
    allow_unknown: bool,
    keys: Vec<KeyMeta>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field
    pub fn field(mut self, name: impl Into<String>, validator: impl Into<Validator>) -> Self {
        self.fields.insert(name.into(), validator.into());
        self
    }

    /// Lets undeclared keys through unchanged
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Validator> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Validator)> {
        self.fields.iter().map(|(name, validator)| (name.as_str(), validator))
    }

    fn derive(&self, meta: KeyMeta) -> Schema {
        let mut next = self.clone();
        next.keys.push(meta);
        next
    }

    fn last_key(&self, pick: impl Fn(&KeyMeta) -> Option<&Option<KeyDef>>) -> &KeyDef {
        self.keys
            .iter()
            .rev()
            .find_map(pick)
            .and_then(Option::as_ref)
            .unwrap_or(&UNSET)
    }

    /// Partition key, or the empty sequence if unset
    pub fn partition_key(&self) -> &KeyDef {
        self.last_key(|meta| match meta {
            KeyMeta::PartitionKey(key) => Some(key),
            _ => None,
        })
    }

    pub fn with_partition_key(&self, key: impl Into<KeyDef>) -> Schema {
        self.derive(KeyMeta::PartitionKey(Some(key.into())))
    }

    /// Resets the partition key to unset
    pub fn without_partition_key(&self) -> Schema {
        self.derive(KeyMeta::PartitionKey(None))
    }

    /// Clustering key, or the empty sequence if unset
    pub fn clustering_key(&self) -> &KeyDef {
        self.last_key(|meta| match meta {
            KeyMeta::ClusteringKey(key) => Some(key),
            _ => None,
        })
    }

    pub fn with_clustering_key(&self, key: impl Into<KeyDef>) -> Schema {
        self.derive(KeyMeta::ClusteringKey(Some(key.into())))
    }

    /// Resets the clustering key to unset
    pub fn without_clustering_key(&self) -> Schema {
        self.derive(KeyMeta::ClusteringKey(None))
    }

    pub fn lookup_keys(&self) -> &[String] {
        self.keys
            .iter()
            .rev()
            .find_map(|meta| match meta {
                KeyMeta::LookupKeys(keys) => Some(keys.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn with_lookup_keys<I, S>(&self, keys: I) -> Schema
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(KeyMeta::LookupKeys(keys.into_iter().map(Into::into).collect()))
    }

    /// Accepts `alias` in input and stores it under `field`
    pub fn with_alias(&self, alias: impl Into<String>, field: impl Into<String>) -> Schema {
        let mut next = self.clone();
        next.renames.push(Rename {
            from: alias.into(),
            to: field.into(),
        });
        next
    }

    /// Alias name to canonical field name
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.renames
            .iter()
            .map(|rename| (rename.from.clone(), rename.to.clone()))
            .collect()
    }

    /// Fields, aliases and key metadata of both schemas; `other` wins on
    /// field name collisions and its key assignments count as the latest.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut merged = self.clone();
        for (name, validator) in &other.fields {
            merged.fields.insert(name.clone(), validator.clone());
        }
        merged.renames.extend(other.renames.iter().cloned());
        merged.keys.extend(other.keys.iter().cloned());
        merged.allow_unknown = self.allow_unknown || other.allow_unknown;
        merged
    }

    /// Field name to merged CQL annotation; non-CQL fields are left out.
    pub fn to_cql(&self) -> BTreeMap<String, Annotation> {
        self.fields
            .iter()
            .filter_map(|(name, validator)| Some((name.clone(), validator.to_cql()?)))
            .collect()
    }
}

impl Validate for Schema {
    fn check(&self, value: &Value, path: &str, state: &mut ValidationState<'_>) -> Option<Value> {
        let Some(input) = value.as_object() else {
            state.report(type_error(path, "object", value));
            return None;
        };

        let before = state.failures();
        let mut working = input.clone();

        for rename in &self.renames {
            if let Some(aliased) = working.remove(&rename.from) {
                if working.contains_key(&rename.to) {
                    state.report(ValidationDetails::rename_conflict(
                        &make_path(path, &rename.from),
                        &rename.to,
                    ));
                    if state.halted() {
                        return None;
                    }
                } else {
                    working.insert(rename.to.clone(), aliased);
                }
            }
        }

        let allow_unknown = self.allow_unknown || state.allow_unknown();
        let mut accepted = Map::new();
        for (key, item) in &working {
            match self.fields.get(key) {
                Some(field) => {
                    if let Some(checked) = field.check(item, &make_path(path, key), state) {
                        accepted.insert(key.clone(), checked);
                    }
                }
                None if allow_unknown => {
                    accepted.insert(key.clone(), item.clone());
                }
                None => state.report(ValidationDetails::unknown_key(make_path(path, key))),
            }
            if state.halted() {
                return None;
            }
        }

        for (name, field) in &self.fields {
            if working.contains_key(name) {
                continue;
            }
            if let Some(generated) = field.resolve_default(state) {
                trace!(event = Event::DefaultApplied.as_str(), field = %name, "default applied");
                accepted.insert(name.clone(), generated);
            } else if field.is_required() {
                state.report(ValidationDetails::missing_field(make_path(path, name)));
                if state.halted() {
                    return None;
                }
            }
        }

        (state.failures() == before).then_some(Value::Object(accepted))
    }

    fn serialize(&self, value: &Value) -> Value {
        convert_fields(&self.fields, value, |field, item| field.serialize(item))
    }

    fn deserialize(&self, value: &Value) -> Value {
        convert_fields(&self.fields, value, |field, item| field.deserialize(item))
    }
}

fn convert_fields(
    fields: &BTreeMap<String, Validator>,
    value: &Value,
    convert: impl Fn(&Validator, &Value) -> Value,
) -> Value {
    let Some(entries) = value.as_object() else {
        return value.clone();
    };

    Value::Object(
        entries
            .iter()
            .map(|(key, item)| {
                let converted = match fields.get(key) {
                    Some(field) => convert(field, item),
                    None => item.clone(),
                };
                (key.clone(), converted)
            })
            .collect(),
    )
}
