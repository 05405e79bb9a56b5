//! Operation-scoped default values
//!
//! A default is a function of the caller's operation label, evaluated only
//! when `validate` meets an absent field. Nothing here runs at schema
//! construction time.
//!
//! | family | trigger  | fires on             | yields               |
//! |--------|----------|----------------------|----------------------|
//! | date   | create   | `create`             | now, ISO-8601 millis |
//! | date   | update   | `create`, `update`   | now, ISO-8601 millis |
//! | uuid   | empty    | `create`             | nil UUID             |
//! | uuid   | v1 / v4  | `create`             | fresh UUID           |

use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{SchemaError, SchemaResult};
use super::types::CqlType;

pub const OPERATION_CREATE: &str = "create";
pub const OPERATION_UPDATE: &str = "update";

/// Caller-supplied label for the write being validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    operation: String,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn create() -> Self {
        Self::new(OPERATION_CREATE)
    }

    pub fn update() -> Self {
        Self::new(OPERATION_UPDATE)
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    fn is(&self, operation: &str) -> bool {
        self.operation == operation
    }
}

/// When a date default fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTrigger {
    /// Creation time only
    Create,
    /// Creation or modification time
    Update,
}

/// Which uuid a uuid default produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidTrigger {
    /// The nil uuid
    Empty,
    /// Time-based
    V1,
    /// Random
    V4,
}

/// A default-value generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSpec {
    Date(DateTrigger),
    Uuid(UuidTrigger),
}

impl DefaultSpec {
    /// Family name ("date" or "uuid")
    pub fn family(&self) -> &'static str {
        match self {
            DefaultSpec::Date(_) => "date",
            DefaultSpec::Uuid(_) => "uuid",
        }
    }

    /// Trigger name as written in definitions
    pub fn trigger(&self) -> &'static str {
        match self {
            DefaultSpec::Date(DateTrigger::Create) => "create",
            DefaultSpec::Date(DateTrigger::Update) => "update",
            DefaultSpec::Uuid(UuidTrigger::Empty) => "empty",
            DefaultSpec::Uuid(UuidTrigger::V1) => "v1",
            DefaultSpec::Uuid(UuidTrigger::V4) => "v4",
        }
    }

    /// Parses a trigger name for a column kind.
    ///
    /// The family comes from the kind: `timestamp` takes date triggers,
    /// `uuid`/`timeuuid` take uuid triggers, nothing else takes a default.
    pub fn parse_for(kind: CqlType, trigger: &str) -> SchemaResult<Self> {
        let spec = if kind.accepts_date_default() {
            match trigger {
                "create" => Some(DefaultSpec::Date(DateTrigger::Create)),
                "update" => Some(DefaultSpec::Date(DateTrigger::Update)),
                _ => None,
            }
        } else if kind.accepts_uuid_default() {
            match trigger {
                "empty" => Some(DefaultSpec::Uuid(UuidTrigger::Empty)),
                "v1" => Some(DefaultSpec::Uuid(UuidTrigger::V1)),
                "v4" => Some(DefaultSpec::Uuid(UuidTrigger::V4)),
                _ => None,
            }
        } else {
            None
        };

        spec.ok_or_else(|| SchemaError::InvalidDefault {
            type_name: kind.type_name().to_string(),
            default: trigger.to_string(),
        })
    }

    /// Produces the default for `context`, or `None` when the trigger
    /// does not match the operation.
    pub fn resolve(&self, context: &OperationContext) -> Option<Value> {
        match self {
            DefaultSpec::Date(trigger) => {
                let fires = match trigger {
                    DateTrigger::Create => context.is(OPERATION_CREATE),
                    DateTrigger::Update => {
                        context.is(OPERATION_CREATE) || context.is(OPERATION_UPDATE)
                    }
                };
                fires.then(|| Value::String(now_iso()))
            }
            DefaultSpec::Uuid(trigger) => {
                if !context.is(OPERATION_CREATE) {
                    return None;
                }
                let id = match trigger {
                    UuidTrigger::Empty => Uuid::nil(),
                    UuidTrigger::V1 => Uuid::now_v1(&node_id()),
                    UuidTrigger::V4 => Uuid::new_v4(),
                };
                Some(Value::String(id.hyphenated().to_string()))
            }
        }
    }
}

impl fmt::Display for DefaultSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family(), self.trigger())
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Random node id with the multicast bit set, as RFC 4122 asks for
/// node ids that are not a real MAC address.
fn node_id() -> [u8; 6] {
    let mut node: [u8; 6] = rand::random();
    node[0] |= 0x01;
    node
}
