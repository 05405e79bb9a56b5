//! Validator metadata and the canonical merge
//!
//! Every validator keeps the annotations attached to it in call order.
//! Nothing is merged until export: `Metadata::canonical` folds the whole
//! chain into one record, later keys overwriting earlier ones, and only
//! if some annotation in the chain carries the `cql` key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::DefaultSpec;

/// A value conversion attached to an annotation
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Transform {
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn apply(&self, value: &Value) -> Value {
        (self.0)(value)
    }

    /// Whether both handles point at the same function
    pub fn ptr_eq(&self, other: &Transform) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// Element type(s) of a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubType {
    /// list/set element type
    Element(String),
    /// map key and value types
    Pair(String, String),
}

impl SubType {
    fn to_json(&self) -> Value {
        match self {
            SubType::Element(name) => Value::String(name.clone()),
            SubType::Pair(key, value) => Value::Array(vec![
                Value::String(key.clone()),
                Value::String(value.clone()),
            ]),
        }
    }
}

/// One metadata record
#[derive(Debug, Clone, Default)]
pub struct Annotation {
    pub cql: Option<bool>,
    pub type_name: Option<String>,
    pub sub_type: Option<SubType>,
    pub default: Option<DefaultSpec>,
    pub serialize: Option<Transform>,
    pub deserialize: Option<Transform>,
    pub extra: BTreeMap<String, Value>,
}

impl Annotation {
    pub fn new() -> Self {
        Self::default()
    }

    /// A CQL-tagged annotation for `type_name`
    pub fn cql(type_name: impl Into<String>) -> Self {
        Self {
            cql: Some(true),
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Sets an arbitrary key.
    ///
    /// `cql` (bool) and `type` (string) land in their typed slots; every
    /// other key is stored as given and replaces a typed slot of the same
    /// name.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        match (key.as_str(), &value) {
            ("cql", Value::Bool(flag)) => {
                self.extra.remove("cql");
                self.cql = Some(*flag);
            }
            ("type", Value::String(name)) => {
                self.extra.remove("type");
                self.type_name = Some(name.clone());
            }
            _ => {
                self.clear_slot(&key);
                self.extra.insert(key, value);
            }
        }
        self
    }

    pub fn with_sub_type(mut self, sub_type: SubType) -> Self {
        self.sub_type = Some(sub_type);
        self
    }

    pub fn with_default(mut self, default: DefaultSpec) -> Self {
        self.extra.remove("default");
        self.default = Some(default);
        self
    }

    pub fn with_serialize(mut self, transform: Transform) -> Self {
        self.serialize = Some(transform);
        self
    }

    pub fn with_deserialize(mut self, transform: Transform) -> Self {
        self.deserialize = Some(transform);
        self
    }

    /// Whether the annotation carries the `cql` key
    pub fn is_cql(&self) -> bool {
        self.cql.is_some() || self.extra.contains_key("cql")
    }

    /// Looks up an arbitrary key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Empties the typed slot stored under `key`, if there is one.
    ///
    /// Sub-type keys are not slots: a collection's element types are fixed
    /// when it is built.
    fn clear_slot(&mut self, key: &str) {
        match key {
            "cql" => self.cql = None,
            "type" => self.type_name = None,
            "default" => self.default = None,
            _ => {}
        }
    }

    /// Overlays `later` onto `self`; keys only `self` has are kept.
    fn overlay(&mut self, later: &Annotation) {
        if later.cql.is_some() {
            self.extra.remove("cql");
            self.cql = later.cql;
        }
        if later.type_name.is_some() {
            self.extra.remove("type");
            self.type_name = later.type_name.clone();
        }
        if later.sub_type.is_some() {
            self.sub_type = later.sub_type.clone();
        }
        if later.default.is_some() {
            self.extra.remove("default");
            self.default = later.default;
        }
        if later.serialize.is_some() {
            self.serialize = later.serialize.clone();
        }
        if later.deserialize.is_some() {
            self.deserialize = later.deserialize.clone();
        }
        for (key, value) in &later.extra {
            self.clear_slot(key);
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Renders the record for a DDL generator.
    ///
    /// Transforms are omitted. The sub-type key follows the type:
    /// `listType`, `setType`, `mapType`, otherwise `subType`.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.extra {
            out.insert(key.clone(), value.clone());
        }
        if let Some(cql) = self.cql {
            out.insert("cql".into(), Value::Bool(cql));
        }
        if let Some(type_name) = &self.type_name {
            out.insert("type".into(), Value::String(type_name.clone()));
        }
        if let Some(sub_type) = &self.sub_type {
            let key = match self.type_name.as_deref() {
                Some("list") => "listType",
                Some("set") => "setType",
                Some("map") => "mapType",
                _ => "subType",
            };
            out.insert(key.into(), sub_type.to_json());
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), Value::String(default.trigger().into()));
        }
        Value::Object(out)
    }
}

/// Ordered annotations on one validator
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    entries: Vec<Annotation>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        self.entries.push(annotation);
    }

    pub fn entries(&self) -> &[Annotation] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The merged CQL record, or `None` when no annotation carries `cql`.
    ///
    /// Every key is folded across the whole chain in order, so the last
    /// annotation to set a key decides its value.
    pub fn canonical(&self) -> Option<Annotation> {
        if !self.entries.iter().any(Annotation::is_cql) {
            return None;
        }

        let mut merged = Annotation::default();
        for entry in &self.entries {
            merged.overlay(entry);
        }
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::defaults::DateTrigger;
    use serde_json::json;

    #[test]
    fn test_no_cql_no_canonical() {
        let mut metadata = Metadata::new();
        metadata.push(Annotation::new().with("label", json!("x")));
        assert!(metadata.canonical().is_none());
    }

    #[test]
    fn test_three_layer_merge() {
        let mut metadata = Metadata::new();
        metadata.push(Annotation::cql("text").with("a", json!(1)).with("b", json!(1)));
        metadata.push(Annotation::new().with("b", json!(2)).with("c", json!(2)));
        metadata.push(Annotation::new().with("c", json!(3)).with("d", json!(3)));

        let merged = metadata.canonical().unwrap();
        assert_eq!(
            merged.to_json(),
            json!({"cql": true, "type": "text", "a": 1, "b": 2, "c": 3, "d": 3})
        );
    }

    #[test]
    fn test_later_type_overrides_earlier() {
        let mut metadata = Metadata::new();
        metadata.push(Annotation::cql("text"));
        metadata.push(Annotation::new().with("type", json!("varchar")));
        assert_eq!(metadata.canonical().unwrap().type_name.as_deref(), Some("varchar"));
    }

    #[test]
    fn test_cql_from_last_entry_that_has_it() {
        let mut metadata = Metadata::new();
        metadata.push(Annotation::cql("int"));
        metadata.push(Annotation::new().with("cql", json!(false)));
        metadata.push(Annotation::new().with("note", json!("kept")));

        let merged = metadata.canonical().unwrap();
        assert_eq!(merged.cql, Some(false));
        assert_eq!(merged.get("note"), Some(&json!("kept")));
    }

    #[test]
    fn test_later_default_overrides_typed_slot() {
        let mut metadata = Metadata::new();
        let create = DefaultSpec::Date(DateTrigger::Create);
        metadata.push(Annotation::cql("timestamp").with_default(create));
        metadata.push(Annotation::new().with("default", json!("update")));

        let merged = metadata.canonical().unwrap();
        assert!(merged.default.is_none());
        assert_eq!(merged.to_json()["default"], json!("update"));

        metadata.push(Annotation::new().with_default(create));
        let merged = metadata.canonical().unwrap();
        assert!(merged.get("default").is_none());
        assert_eq!(merged.to_json()["default"], json!("create"));
    }

    #[test]
    fn test_untyped_values_replace_slots() {
        let mut metadata = Metadata::new();
        metadata.push(Annotation::cql("int"));
        metadata.push(Annotation::new().with("type", json!(["custom"])).with("cql", json!(1)));

        let merged = metadata.canonical().unwrap();
        assert!(merged.type_name.is_none());
        assert!(merged.cql.is_none());
        assert_eq!(merged.to_json(), json!({"cql": 1, "type": ["custom"]}));
    }

    #[test]
    fn test_sub_type_rendering() {
        let list = Annotation::cql("list").with_sub_type(SubType::Element("int".into()));
        assert_eq!(list.to_json()["listType"], json!("int"));

        let map = Annotation::cql("map").with_sub_type(SubType::Pair("text".into(), "int".into()));
        assert_eq!(map.to_json()["mapType"], json!(["text", "int"]));
    }

    #[test]
    fn test_transform_survives_merge() {
        let upper = Transform::new(|v| json!(v.as_str().map(str::to_uppercase)));
        let mut metadata = Metadata::new();
        metadata.push(Annotation::cql("text").with_serialize(upper.clone()));
        metadata.push(Annotation::new().with("note", json!(1)));

        let merged = metadata.canonical().unwrap();
        let serialize = merged.serialize.unwrap();
        assert!(serialize.ptr_eq(&upper));
        assert_eq!(serialize.apply(&json!("abc")), json!("ABC"));
    }
}
