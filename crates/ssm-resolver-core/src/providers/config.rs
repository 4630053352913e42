//! Static provider configuration
//!
//! A provider receives its settings as a flat bag of named values, the same
//! way a templating host passes per-provider options. The SSM provider only
//! reads `region`; anything else is carried along untouched.
//!
//! Configuration can be built in code or loaded from a JSON, TOML or YAML
//! file, with the format detected from the file extension.
//!
//! # Example
//!
//! ```rust,ignore
//! use ssm_resolver_core::providers::StaticConfig;
//!
//! let config = StaticConfig::new().with("region", "eu-west-1");
//! assert_eq!(config.string("region"), "eu-west-1");
//!
//! let from_file = StaticConfig::from_file("provider.yaml")?;
//! ```

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Flat configuration handed to a provider at construction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct StaticConfig {
    values: Map<String, JsonValue>,
}

impl StaticConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string value (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), JsonValue::String(value.into()));
        self
    }

    /// Look up a string setting
    ///
    /// Missing keys and non-string values both yield an empty string, which
    /// providers treat as "use the default".
    pub fn string(&self, key: &str) -> String {
        match self.values.get(key) {
            Some(JsonValue::String(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty YAML document parses as null, not as a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration, auto-detecting format from the file extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let content = std::fs::read_to_string(path)?;

        match extension.as_str() {
            "json" => Self::from_json_str(&content),
            "toml" => Self::from_toml_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            _ => Err(ConfigError::UnknownFormat(extension)),
        }
    }
}
