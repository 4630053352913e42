//! Core traits for secret resolution providers
//!
//! This module defines the error taxonomy, the value type returned for
//! path-prefix lookups, and the trait every provider implements. A host
//! templating engine holds providers as `Arc<dyn StringMapProvider>` and
//! only ever asks for one of two lookup shapes: a single key, or all values
//! under a path prefix.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Boxed error type used to carry upstream causes
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Remote request that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Single value lookup by exact name
    GetParameter,
    /// Listing of all values under a path prefix
    GetParametersByPath,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GetParameter => f.write_str("get parameter"),
            Operation::GetParametersByPath => f.write_str("get parameters by path"),
        }
    }
}

/// Part of a single-value response that was absent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    /// The response carried no parameter at all
    Parameter,
    /// The parameter carried no value
    Value,
}

impl fmt::Display for MissingPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPart::Parameter => f.write_str("response contained no parameter"),
            MissingPart::Value => f.write_str("parameter contained no value"),
        }
    }
}

/// Errors that can occur when resolving a key
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The remote request itself failed
    #[error("ssm: {operation} {key}: {source}")]
    Upstream {
        operation: Operation,
        key: String,
        #[source]
        source: BoxError,
    },

    /// The single-value request succeeded but yielded nothing usable
    #[error("ssm: get parameter {key}: {part}")]
    MissingResult { key: String, part: MissingPart },

    /// The path listing succeeded but returned zero entries
    #[error("ssm: get parameters by path {key}: no parameters found")]
    EmptyResult { key: String },
}

impl ProviderError {
    /// Wrap an upstream failure
    pub fn upstream(operation: Operation, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ProviderError::Upstream {
            operation,
            key: key.into(),
            source: source.into(),
        }
    }

    /// Check if this error came from the remote call rather than its result
    pub fn is_upstream(&self) -> bool {
        matches!(self, ProviderError::Upstream { .. })
    }

    /// The key or path the failed lookup was made for
    pub fn key(&self) -> &str {
        match self {
            ProviderError::Upstream { key, .. }
            | ProviderError::MissingResult { key, .. }
            | ProviderError::EmptyResult { key } => key,
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A value inside a path-prefix mapping
///
/// Parameter Store only returns strings today. New variants belong here
/// only once the store starts returning typed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MapValue {
    String(String),
}

impl MapValue {
    /// Borrow the value as a string slice
    pub fn as_str(&self) -> &str {
        match self {
            MapValue::String(s) => s,
        }
    }
}

impl fmt::Display for MapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for MapValue {
    fn from(value: String) -> Self {
        MapValue::String(value)
    }
}

impl From<&str> for MapValue {
    fn from(value: &str) -> Self {
        MapValue::String(value.to_string())
    }
}

/// Core trait for secret resolution providers
///
/// # Async Design
///
/// Both lookups are async because the backing store is remote. Providers
/// are expected to cache so that repeated lookups of the same key within a
/// run stay local.
#[async_trait::async_trait]
pub trait StringMapProvider: Send + Sync + fmt::Debug {
    /// Returns the unique name of this provider
    fn name(&self) -> &str;

    /// Resolve a single value by its exact key
    async fn get_string(&self, key: &str) -> ProviderResult<String>;

    /// Resolve every value directly under a path prefix
    ///
    /// The returned map is keyed by the name relative to `key`, without the
    /// separating `/`.
    async fn get_string_map(&self, key: &str) -> ProviderResult<HashMap<String, MapValue>>;
}
