//! Validation configuration
//!
//! A JSON file sets the defaults every `validate` call starts from:
//!
//! ```json
//! { "abortEarly": false, "allowUnknown": false, "defaultOperation": "create" }
//! ```
//!
//! Every field is optional. Keys are camelCase, like table definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::observability::Event;
use crate::schema::{OperationContext, SchemaError, SchemaResult, ValidateOptions};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Stop at the first failure (optional, default true)
    #[serde(default = "default_abort_early")]
    pub abort_early: bool,

    /// Let undeclared object keys through (optional, default false)
    #[serde(default)]
    pub allow_unknown: bool,

    /// Operation label used as the default context (optional, default none)
    #[serde(default)]
    pub default_operation: Option<String>,
}

fn default_abort_early() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            abort_early: default_abort_early(),
            allow_unknown: false,
            default_operation: None,
        }
    }
}

impl ValidationConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::Config(format!("Failed to read config: {}", e)))?;

        let config = Self::from_json_str(&content)?;

        info!(
            event = Event::ConfigLoaded.as_str(),
            path = %path.display(),
            abort_early = config.abort_early,
            "validation config loaded"
        );
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let config: ValidationConfig = serde_json::from_str(content)
            .map_err(|e| SchemaError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> SchemaResult<()> {
        if let Some(operation) = &self.default_operation {
            if operation.trim().is_empty() {
                return Err(SchemaError::Config(
                    "defaultOperation must not be empty".into(),
                ));
            }
        }
        Ok(())
    }

    /// Options for `validate` carrying these settings
    pub fn to_options(&self) -> ValidateOptions {
        ValidateOptions {
            context: self.default_operation.clone().map(OperationContext::new),
            abort_early: self.abort_early,
            allow_unknown: self.allow_unknown,
        }
    }
}
