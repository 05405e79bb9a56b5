//! Observable events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events in cqlschema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Construction
    /// A column validator was built by `create`
    SchemaTypeCreated,
    /// A table definition was turned into a schema
    DefinitionLoaded,

    // Configuration
    /// Validation configuration loaded
    ConfigLoaded,

    // Validation
    /// A value passed validation
    ValidationPassed,
    /// A value failed validation
    ValidationFailed,
    /// A single failure was recorded
    ValidationDetail,
    /// An absent field was filled from its default
    DefaultApplied,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaTypeCreated => "SCHEMA_TYPE_CREATED",
            Event::DefinitionLoaded => "DEFINITION_LOADED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ValidationPassed => "VALIDATION_PASSED",
            Event::ValidationFailed => "VALIDATION_FAILED",
            Event::ValidationDetail => "VALIDATION_DETAIL",
            Event::DefaultApplied => "DEFAULT_APPLIED",
        }
    }

    /// Returns true if this event reports rejected input
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::ValidationFailed | Event::ValidationDetail)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
