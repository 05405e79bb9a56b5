//! Validation entry point and serialization pipeline
//!
//! `validate` runs in three steps:
//! 1. check the value against the rule tree, converting where allowed
//! 2. fill absent fields from their defaults (only with an operation context)
//! 3. on success, apply serialize transforms to produce the stored form
//!
//! `deserialize` is the inverse of step 3 and runs without validation.

use serde_json::Value;
use tracing::{debug, trace};

use super::defaults::OperationContext;
use super::errors::{ValidationDetails, ValidationError};
use crate::observability::Event;

/// Something `validate` can run
pub trait Validate {
    /// Checks `value` at `path`, reporting failures into `state`.
    ///
    /// Returns the accepted value (with conversions and defaults applied)
    /// or `None` when this subtree reported a failure.
    fn check(&self, value: &Value, path: &str, state: &mut ValidationState<'_>) -> Option<Value>;

    /// Application shape to stored shape
    fn serialize(&self, value: &Value) -> Value;

    /// Stored shape to application shape
    fn deserialize(&self, value: &Value) -> Value;
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// Operation label gating defaults; no context means no defaults
    pub context: Option<OperationContext>,
    /// Stop at the first failure
    pub abort_early: bool,
    /// Let undeclared object keys through on every object
    pub allow_unknown: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            context: None,
            abort_early: true,
            allow_unknown: false,
        }
    }
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options carrying an operation context
    pub fn for_operation(operation: impl Into<String>) -> Self {
        Self {
            context: Some(OperationContext::new(operation)),
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: OperationContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Collect every failure instead of stopping at the first
    pub fn collect_all(mut self) -> Self {
        self.abort_early = false;
        self
    }

    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }
}

/// Failure sink and ambient options for one `validate` call
#[derive(Debug)]
pub struct ValidationState<'a> {
    options: &'a ValidateOptions,
    details: Vec<ValidationDetails>,
}

impl<'a> ValidationState<'a> {
    pub(crate) fn new(options: &'a ValidateOptions) -> Self {
        Self {
            options,
            details: Vec::new(),
        }
    }

    pub fn context(&self) -> Option<&'a OperationContext> {
        self.options.context.as_ref()
    }

    pub fn allow_unknown(&self) -> bool {
        self.options.allow_unknown
    }

    pub fn report(&mut self, details: ValidationDetails) {
        trace!(
            event = Event::ValidationDetail.as_str(),
            code = details.code.code(),
            field = %details.field,
            "rule failed"
        );
        self.details.push(details);
    }

    /// Number of failures reported so far
    pub fn failures(&self) -> usize {
        self.details.len()
    }

    /// Whether checking should stop now
    pub fn halted(&self) -> bool {
        self.options.abort_early && !self.details.is_empty()
    }
}

/// Outcome of `validate`
#[derive(Debug, Clone)]
pub struct Validation {
    pub error: Option<ValidationError>,
    /// Stored form of the value; `None` on failure
    pub value: Option<Value>,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Value, ValidationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value.unwrap_or(Value::Null)),
        }
    }
}

/// Validates `value`, then serializes it for storage.
pub fn validate<V: Validate + ?Sized>(
    value: &Value,
    schema: &V,
    options: &ValidateOptions,
) -> Validation {
    let mut state = ValidationState::new(options);
    let checked = schema.check(value, "", &mut state);

    if let Some(error) = ValidationError::from_details(state.details) {
        debug!(
            event = Event::ValidationFailed.as_str(),
            code = error.code().code(),
            failures = error.details().len(),
            "{}",
            error.first()
        );
        return Validation {
            error: Some(error),
            value: None,
        };
    }

    debug!(
        event = Event::ValidationPassed.as_str(),
        operation = options.context.as_ref().map(OperationContext::operation),
        "validation passed"
    );
    Validation {
        error: None,
        value: checked.map(|accepted| schema.serialize(&accepted)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validator::Validator;
    use serde_json::json;

    #[test]
    fn test_into_result() {
        let ok = validate(&json!(1), &Validator::any(), &ValidateOptions::default());
        assert_eq!(ok.into_result().unwrap(), json!(1));
    }

    #[test]
    fn test_for_operation_sets_context() {
        let options = ValidateOptions::for_operation("create");
        assert_eq!(options.context.unwrap().operation(), "create");
    }

    #[test]
    fn test_state_halts_only_when_aborting_early() {
        let early = ValidateOptions::default();
        let mut state = ValidationState::new(&early);
        assert!(!state.halted());
        state.report(ValidationDetails::missing_field("a"));
        assert!(state.halted());

        let all = ValidateOptions::default().collect_all();
        let mut state = ValidationState::new(&all);
        state.report(ValidationDetails::missing_field("a"));
        assert!(!state.halted());
        assert_eq!(state.failures(), 1);
    }
}
