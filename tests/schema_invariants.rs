//! Schema Invariant Tests
//!
//! Table-level behavior of a schema:
//! - Validation is deterministic
//! - Required fields must be present, undeclared fields are rejected
//! - Defaults depend only on the operation label
//! - Key metadata is copy-on-write
//! - Annotation layers merge with the latest winning

use std::io::Write;

use cqlschema::schema::{DateTrigger, UuidTrigger};
use cqlschema::{
    cql, validate, Annotation, KeyDef, Schema, TableDefinition, ValidateOptions, ValidationConfig,
    ValidationErrorCode,
};
use regex::Regex;
use serde_json::json;
use tempfile::NamedTempFile;

// =============================================================================
// Helper Functions
// =============================================================================

fn users() -> Schema {
    Schema::new()
        .field("id", cql::timeuuid())
        .field("name", cql::text().required())
        .field("age", cql::int())
}

fn iso_millis() -> Regex {
    Regex::new(r"^\d{4}-\d\d-\d\dT\d\d:\d\d:\d\d\.\d+Z$").unwrap()
}

fn uuid_version(version: char) -> Regex {
    Regex::new(&format!(
        r"^[0-9a-f]{{8}}-[0-9a-f]{{4}}-{}[0-9a-f]{{3}}-[89ab][0-9a-f]{{3}}-[0-9a-f]{{12}}$",
        version
    ))
    .unwrap()
}

// =============================================================================
// Validation Determinism Tests
// =============================================================================

/// Same document validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let schema = users();
    let options = ValidateOptions::default();
    let doc = json!({"name": "Alice", "age": 30});

    for _ in 0..100 {
        let result = validate(&doc, &schema, &options);
        assert_eq!(result.value, Some(doc.clone()));
    }
}

/// Invalid document fails consistently.
#[test]
fn test_invalid_document_fails_consistently() {
    let schema = users();
    let doc = json!({"age": 30});

    for _ in 0..100 {
        let result = validate(&doc, &schema, &ValidateOptions::default());
        assert_eq!(result.error.unwrap().code(), ValidationErrorCode::Required);
    }
}

// =============================================================================
// Field Presence Tests
// =============================================================================

#[test]
fn test_extra_field_fails() {
    let result = validate(&json!({"name": "a", "extra": 1}), &users(), &ValidateOptions::default());
    let error = result.error.unwrap();
    assert_eq!(error.code(), ValidationErrorCode::UnknownKey);
    assert_eq!(error.first().field, "extra");
}

#[test]
fn test_nested_paths_in_errors() {
    let schema = Schema::new().field("profile", Schema::new().field("age", cql::int()));
    let doc = json!({"profile": {"age": "old"}});
    let result = validate(&doc, &schema, &ValidateOptions::default());
    assert_eq!(result.error.unwrap().first().field, "profile.age");
}

#[test]
fn test_collect_all_reports_every_failure() {
    let doc = json!({"age": "x", "extra": true});

    let early = validate(&doc, &users(), &ValidateOptions::default());
    assert_eq!(early.error.unwrap().details().len(), 1);

    let all = validate(&doc, &users(), &ValidateOptions::default().collect_all());
    let error = all.error.unwrap();
    assert_eq!(error.details().len(), 3);
    assert!(error.to_string().contains("(+2 more)"));
}

// =============================================================================
// Default Tests
// =============================================================================

#[test]
fn test_uuid_defaults_fire_on_create_only() {
    let schema = Schema::new().field("id", cql::uuid()).field("tid", cql::timeuuid());

    let created = validate(&json!({}), &schema, &ValidateOptions::for_operation("create"))
        .into_result()
        .unwrap();
    assert!(uuid_version('4').is_match(created["id"].as_str().unwrap()));
    assert!(uuid_version('1').is_match(created["tid"].as_str().unwrap()));

    let updated = validate(&json!({}), &schema, &ValidateOptions::for_operation("update"))
        .into_result()
        .unwrap();
    assert_eq!(updated, json!({}));

    let no_context = validate(&json!({}), &schema, &ValidateOptions::default())
        .into_result()
        .unwrap();
    assert_eq!(no_context, json!({}));
}

#[test]
fn test_explicit_uuid_defaults() {
    let schema = Schema::new()
        .field("empty", cql::uuid_with(UuidTrigger::Empty))
        .field("v4", cql::timeuuid_with(UuidTrigger::V4));

    let created = validate(&json!({}), &schema, &ValidateOptions::for_operation("create"))
        .into_result()
        .unwrap();
    assert_eq!(created["empty"], json!("00000000-0000-0000-0000-000000000000"));
    assert!(uuid_version('4').is_match(created["v4"].as_str().unwrap()));
}

#[test]
fn test_timestamp_defaults_by_operation() {
    let schema = Schema::new()
        .field("created", cql::timestamp_with(DateTrigger::Create))
        .field("updated", cql::timestamp_with(DateTrigger::Update));

    let created = validate(&json!({}), &schema, &ValidateOptions::for_operation("create"))
        .into_result()
        .unwrap();
    assert!(iso_millis().is_match(created["created"].as_str().unwrap()));
    assert!(iso_millis().is_match(created["updated"].as_str().unwrap()));

    let updated = validate(&json!({}), &schema, &ValidateOptions::for_operation("update"))
        .into_result()
        .unwrap();
    assert!(updated.get("created").is_none());
    assert!(iso_millis().is_match(updated["updated"].as_str().unwrap()));

    let other = validate(&json!({}), &schema, &ValidateOptions::for_operation("delete"))
        .into_result()
        .unwrap();
    assert_eq!(other, json!({}));
}

#[test]
fn test_present_values_are_not_replaced() {
    let id = "123e4567-e89b-12d3-a456-426614174000";
    let doc = json!({"id": id, "name": "a"});
    let stored = validate(&doc, &users(), &ValidateOptions::for_operation("create"))
        .into_result()
        .unwrap();
    assert_eq!(stored["id"], json!(id));
}

#[test]
fn test_default_satisfies_required() {
    let schema = Schema::new().field("id", cql::uuid().required());
    assert!(validate(&json!({}), &schema, &ValidateOptions::for_operation("create")).is_ok());
    assert!(!validate(&json!({}), &schema, &ValidateOptions::for_operation("update")).is_ok());
}

// =============================================================================
// Key Metadata Tests
// =============================================================================

#[test]
fn test_partition_key_set_and_reset() {
    let keyed = users().with_partition_key(["a", "b"]);
    assert_eq!(keyed.partition_key(), &KeyDef::from(vec!["a", "b"]));
    assert_eq!(
        serde_json::to_value(keyed.partition_key()).unwrap(),
        json!(["a", "b"])
    );

    let reset = keyed.without_partition_key();
    assert!(reset.partition_key().is_empty());
    assert_eq!(serde_json::to_value(reset.partition_key()).unwrap(), json!([]));
}

#[test]
fn test_key_setters_derive_new_schemas() {
    let base = users();
    let derived = base
        .with_partition_key("id")
        .with_clustering_key(["name", "age"])
        .with_lookup_keys(["name"])
        .with_alias("fullName", "name");

    assert!(base.partition_key().is_empty());
    assert!(base.lookup_keys().is_empty());
    assert!(base.aliases().is_empty());

    assert_eq!(derived.partition_key(), &KeyDef::from("id"));
    assert_eq!(derived.clustering_key(), &KeyDef::from(["name", "age"]));
    assert_eq!(derived.lookup_keys(), ["name".to_string()]);
    assert_eq!(derived.aliases()["fullName"], "name");
}

#[test]
fn test_concat_keeps_latest_keys() {
    let left = users().with_partition_key("id");
    let right = Schema::new().field("email", cql::text()).with_clustering_key("email");
    let merged = left.concat(&right);

    assert_eq!(merged.partition_key(), &KeyDef::from("id"));
    assert_eq!(merged.clustering_key(), &KeyDef::from("email"));
    assert_eq!(merged.to_cql().len(), 4);
}

// =============================================================================
// Annotation Export Tests
// =============================================================================

#[test]
fn test_three_layer_merge() {
    let column = cql::text()
        .meta(Annotation::new().with("a", json!(1)).with("b", json!(1)))
        .meta(Annotation::new().with("b", json!(2)).with("c", json!(2)))
        .meta(Annotation::new().with("c", json!(3)).with("d", json!(3)));

    assert_eq!(
        column.to_cql().unwrap().to_json(),
        json!({"cql": true, "type": "text", "a": 1, "b": 2, "c": 3, "d": 3})
    );
}

/// A later layer's `default` replaces the one the builder recorded.
#[test]
fn test_three_layer_merge_overrides_default() {
    let column = cql::timestamp_with(DateTrigger::Create)
        .meta(Annotation::new().with("default", json!("update")).with("a", json!(1)))
        .meta(Annotation::new().with("a", json!(2)).with("b", json!(2)))
        .meta(Annotation::new().with("b", json!(3)).with("c", json!(3)));

    assert_eq!(
        column.to_cql().unwrap().to_json(),
        json!({"cql": true, "type": "timestamp", "default": "update", "a": 2, "b": 3, "c": 3})
    );
}

#[test]
fn test_retyping_layer_wins() {
    let column = cql::text().meta(Annotation::cql("varchar"));
    assert_eq!(column.cql_type().as_deref(), Some("varchar"));
}

#[test]
fn test_schema_export_skips_plain_fields() {
    let schema = users().field("scratch", cqlschema::Validator::any());
    let exported = schema.to_cql();

    assert_eq!(exported.len(), 3);
    assert!(!exported.contains_key("scratch"));
    assert_eq!(exported["id"].to_json(), json!({"cql": true, "type": "timeuuid"}));
}

// =============================================================================
// Definition and Config Tests
// =============================================================================

#[test]
fn test_definition_drives_validation() {
    let definition = TableDefinition::from_json_str(
        r#"{
            "fields": {
                "id": {"type": "uuid", "default": "v4"},
                "title": {"type": "text", "required": true},
                "meta": {"type": "json"}
            },
            "partitionKey": ["id"]
        }"#,
    )
    .unwrap();
    let schema = definition.build().unwrap();

    assert_eq!(schema.partition_key(), &KeyDef::from(["id"]));
    assert_eq!(schema.to_cql()["id"].to_json()["default"], json!("v4"));

    let stored = validate(
        &json!({"title": "t", "meta": [1]}),
        &schema,
        &ValidateOptions::for_operation("create"),
    )
    .into_result()
    .unwrap();
    assert_eq!(stored["meta"], json!("[1]"));
    assert!(uuid_version('4').is_match(stored["id"].as_str().unwrap()));
}

#[test]
fn test_config_file_sets_options() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{"abortEarly": false, "defaultOperation": "create"}}"#).unwrap();

    let options = ValidationConfig::load(file.path()).unwrap().to_options();
    let result = validate(&json!({"age": "x", "extra": 1}), &users(), &options);
    assert_eq!(result.error.unwrap().details().len(), 3);

    let stored = validate(&json!({"name": "a"}), &users(), &options).into_result().unwrap();
    assert!(stored["id"].is_string());
}
