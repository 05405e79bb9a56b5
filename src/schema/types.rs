//! CQL column kinds
//!
//! Scalar kinds:
//! - ascii, text, varchar: strings
//! - int: 32-bit signed integer
//! - bigint, counter: 64-bit signed integer
//! - decimal, double, float: numbers or numeral strings
//! - varint: arbitrary-precision integer
//! - blob, boolean, inet, timestamp, timeuuid, uuid
//!
//! Collection kinds:
//! - map, list, set
//!
//! `json` is not a CQL kind of its own; it is stored as `text`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SchemaError;

/// Column kinds understood by the type factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CqlType {
    Ascii,
    Bigint,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    Json,
    Text,
    Timestamp,
    Timeuuid,
    Uuid,
    Varchar,
    Varint,
    Map,
    List,
    Set,
}

impl CqlType {
    /// Every kind, in factory order
    pub const ALL: [CqlType; 20] = [
        CqlType::Ascii,
        CqlType::Bigint,
        CqlType::Blob,
        CqlType::Boolean,
        CqlType::Counter,
        CqlType::Decimal,
        CqlType::Double,
        CqlType::Float,
        CqlType::Inet,
        CqlType::Int,
        CqlType::Json,
        CqlType::Text,
        CqlType::Timestamp,
        CqlType::Timeuuid,
        CqlType::Uuid,
        CqlType::Varchar,
        CqlType::Varint,
        CqlType::Map,
        CqlType::List,
        CqlType::Set,
    ];

    /// Returns the type name used in annotations and definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            CqlType::Ascii => "ascii",
            CqlType::Bigint => "bigint",
            CqlType::Blob => "blob",
            CqlType::Boolean => "boolean",
            CqlType::Counter => "counter",
            CqlType::Decimal => "decimal",
            CqlType::Double => "double",
            CqlType::Float => "float",
            CqlType::Inet => "inet",
            CqlType::Int => "int",
            CqlType::Json => "json",
            CqlType::Text => "text",
            CqlType::Timestamp => "timestamp",
            CqlType::Timeuuid => "timeuuid",
            CqlType::Uuid => "uuid",
            CqlType::Varchar => "varchar",
            CqlType::Varint => "varint",
            CqlType::Map => "map",
            CqlType::List => "list",
            CqlType::Set => "set",
        }
    }

    /// Whether the kind is built from element types
    pub fn is_collection(&self) -> bool {
        matches!(self, CqlType::Map | CqlType::List | CqlType::Set)
    }

    /// Whether the kind accepts a date-family default
    pub fn accepts_date_default(&self) -> bool {
        matches!(self, CqlType::Timestamp)
    }

    /// Whether the kind accepts a uuid-family default
    pub fn accepts_uuid_default(&self) -> bool {
        matches!(self, CqlType::Uuid | CqlType::Timeuuid)
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for CqlType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CqlType::ALL
            .iter()
            .copied()
            .find(|kind| kind.type_name() == s)
            .ok_or_else(|| SchemaError::UnknownType(s.to_string()))
    }
}
