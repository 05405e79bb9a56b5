//! Schema error types
//!
//! Two families:
//! - `ValidationError`: a value failed a rule. Returned inside a
//!   `Validation`, never raised.
//! - `SchemaError`: the schema itself was built wrong (unknown type name,
//!   malformed sub-type, default of the wrong family, bad definition or
//!   config). Returned from construction functions.

use std::fmt;

use thiserror::Error;

/// Value-level failure codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// Value has the wrong JSON type for the column kind
    TypeMismatch,
    /// Numeric value outside the column kind's range
    OutOfRange,
    /// String does not match the column kind's format
    PatternMismatch,
    /// Required field is absent
    Required,
    /// `null` given for a column that does not accept it
    NullNotAllowed,
    /// Field or descriptor key is not declared
    UnknownKey,
    /// Update descriptor carries none of its recognized keys
    MissingKeyGroup,
    /// Set contains the same element twice
    DuplicateElement,
    /// Alias and its target field are both present
    RenameConflict,
}

impl ValidationErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorCode::TypeMismatch => "CQL_TYPE_MISMATCH",
            ValidationErrorCode::OutOfRange => "CQL_OUT_OF_RANGE",
            ValidationErrorCode::PatternMismatch => "CQL_PATTERN_MISMATCH",
            ValidationErrorCode::Required => "CQL_REQUIRED",
            ValidationErrorCode::NullNotAllowed => "CQL_NULL_NOT_ALLOWED",
            ValidationErrorCode::UnknownKey => "CQL_UNKNOWN_KEY",
            ValidationErrorCode::MissingKeyGroup => "CQL_MISSING_KEY_GROUP",
            ValidationErrorCode::DuplicateElement => "CQL_DUPLICATE_ELEMENT",
            ValidationErrorCode::RenameConflict => "CQL_RENAME_CONFLICT",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Failure code
    pub code: ValidationErrorCode,
    /// Field path (e.g., "tags[2]", "profile.email", or "" for the root)
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        code: ValidationErrorCode,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            code,
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(ValidationErrorCode::TypeMismatch, field, expected, actual)
    }

    pub fn out_of_range(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(ValidationErrorCode::OutOfRange, field, expected, actual)
    }

    pub fn pattern_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(ValidationErrorCode::PatternMismatch, field, expected, actual)
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::Required, field, "field to be present", "missing")
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::NullNotAllowed, field, "non-null value", "null")
    }

    pub fn unknown_key(field: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::UnknownKey, field, "no undeclared keys", "extra key present")
    }

    pub fn missing_key_group(field: impl Into<String>, keys: &[&str]) -> Self {
        Self::new(
            ValidationErrorCode::MissingKeyGroup,
            field,
            format!("at least one of [{}]", keys.join(", ")),
            "none present",
        )
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::new(ValidationErrorCode::DuplicateElement, field, "unique element", "duplicate")
    }

    pub fn rename_conflict(from: &str, to: &str) -> Self {
        Self::new(
            ValidationErrorCode::RenameConflict,
            from,
            format!("only one of '{}' or '{}'", from, to),
            "both present",
        )
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "$root" } else { &self.field };
        write!(f, "field '{}': expected {}, got {}", field, self.expected, self.actual)
    }
}

/// A value failed one or more rules.
///
/// Holds at least one entry. With `abort_early` (the default) it holds
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    details: Vec<ValidationDetails>,
}

impl ValidationError {
    pub(crate) fn from_details(details: Vec<ValidationDetails>) -> Option<Self> {
        if details.is_empty() {
            None
        } else {
            Some(Self { details })
        }
    }

    /// Returns the code of the first failure
    pub fn code(&self) -> ValidationErrorCode {
        self.first().code
    }

    /// Returns the first failure
    pub fn first(&self) -> &ValidationDetails {
        &self.details[0]
    }

    /// Returns every collected failure, in discovery order
    pub fn details(&self) -> &[ValidationDetails] {
        &self.details
    }

    /// Returns the human-readable message for the first failure
    pub fn message(&self) -> String {
        self.first().to_string()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.first())?;
        if self.details.len() > 1 {
            write!(f, " (+{} more)", self.details.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Construction-time errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown CQL type: '{0}'")]
    UnknownType(String),

    #[error("Type '{type_name}' requires option '{option}'")]
    MissingSubType { type_name: String, option: &'static str },

    #[error("Invalid default '{default}' for type '{type_name}'")]
    InvalidDefault { type_name: String, default: String },

    #[error("Malformed definition: {0}")]
    MalformedDefinition(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;
