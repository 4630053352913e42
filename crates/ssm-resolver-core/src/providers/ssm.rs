//! AWS SSM Parameter Store provider
//!
//! Resolves single parameters and path prefixes from Parameter Store.
//! Templates are commonly rendered more than once per run, so every
//! successful lookup is cached for the lifetime of the provider and never
//! expires.
//!
//! # Caching Rules
//!
//! - Single values and path listings live in separate caches; the same
//!   string looked up both ways is fetched and cached twice.
//! - A cached single value that is blank after trimming counts as a miss
//!   and is fetched again.
//! - A cached path listing is always a hit.
//! - Failures are never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use ssm_resolver_core::providers::{SsmProvider, StaticConfig};
//!
//! let config = StaticConfig::new().with("region", "us-east-1");
//! let ssm = SsmProvider::new(&config, factory);
//!
//! let password = ssm.get_string("/app/prod/db_password").await?;
//! let settings = ssm.get_string_map("/app/prod").await?;
//! ```

use super::client::{ClientAccessor, ClientFactory, Parameter};
use super::config::StaticConfig;
use super::traits::{
    MapValue, MissingPart, Operation, ProviderError, ProviderResult, StringMapProvider,
};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Prefix of the plain-text retrieval line written to stderr
const DIAGNOSTIC_SOURCE: &str = "SSM";

/// Caching Parameter Store provider
///
/// Safe to share between tasks. The store handle is built once on first
/// use; cache locks are never held across a request.
pub struct SsmProvider {
    client: ClientAccessor,
    /// Single parameter values by name
    params_cache: RwLock<HashMap<String, String>>,
    /// Path listings by path, keyed by short name
    map_cache: RwLock<HashMap<String, HashMap<String, MapValue>>>,
    /// Receives the retrieval line, stderr unless replaced
    diagnostics: Mutex<Box<dyn Write + Send>>,
}

impl fmt::Debug for SsmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsmProvider")
            .field("client", &self.client)
            .field("params_cache", &self.params_cache)
            .field("map_cache", &self.map_cache)
            .finish_non_exhaustive()
    }
}

impl SsmProvider {
    /// Create a provider from its static configuration
    ///
    /// Reads the `region` setting; an empty value selects the default
    /// region of the client factory.
    pub fn new(config: &StaticConfig, factory: Arc<dyn ClientFactory>) -> Self {
        let region = Some(config.string("region")).filter(|r| !r.is_empty());
        Self::with_region(region, factory)
    }

    /// Create a provider for an explicit region
    pub fn with_region(region: Option<String>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            client: ClientAccessor::new(region, factory),
            params_cache: RwLock::new(HashMap::new()),
            map_cache: RwLock::new(HashMap::new()),
            diagnostics: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Send the retrieval line somewhere other than stderr
    pub fn with_diagnostics(mut self, out: impl Write + Send + 'static) -> Self {
        self.diagnostics = Mutex::new(Box::new(out));
        self
    }

    /// Configured region, `None` when the default is used
    pub fn region(&self) -> Option<&str> {
        self.client.region()
    }

    fn cached_string(&self, key: &str) -> Option<String> {
        let cache = self.params_cache.read().unwrap_or_else(PoisonError::into_inner);
        cache
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    fn cached_map(&self, key: &str) -> Option<HashMap<String, MapValue>> {
        let cache = self.map_cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }

    /// Resolve a single parameter by exact name
    pub async fn get_string(&self, key: &str) -> ProviderResult<String> {
        if let Some(value) = self.cached_string(key) {
            tracing::debug!(key = key, "SSM parameter cache hit");
            return Ok(value);
        }

        let client = self.client.client().await;
        let out = client
            .get_parameter(key, true)
            .await
            .map_err(|e| ProviderError::upstream(Operation::GetParameter, key, e))?;

        let parameter = out.parameter.ok_or_else(|| ProviderError::MissingResult {
            key: key.to_string(),
            part: MissingPart::Parameter,
        })?;

        let value = parameter.value.ok_or_else(|| ProviderError::MissingResult {
            key: key.to_string(),
            part: MissingPart::Value,
        })?;

        self.params_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());

        self.report_retrieved(key);

        Ok(value)
    }

    /// Resolve every parameter directly under a path
    ///
    /// Keys of the returned map are the parameter names with the leading
    /// `key/` removed. An empty listing is an error.
    pub async fn get_string_map(&self, key: &str) -> ProviderResult<HashMap<String, MapValue>> {
        if let Some(values) = self.cached_map(key) {
            tracing::debug!(key = key, "SSM path cache hit");
            return Ok(values);
        }

        let client = self.client.client().await;
        let out = client
            .get_parameters_by_path(key, true)
            .await
            .map_err(|e| ProviderError::upstream(Operation::GetParametersByPath, key, e))?;

        if out.parameters.is_empty() {
            return Err(ProviderError::EmptyResult {
                key: key.to_string(),
            });
        }

        let values = flatten_parameters(key, out.parameters);

        self.map_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), values.clone());

        self.report_retrieved(key);

        Ok(values)
    }

    /// Best-effort retrieval notice
    fn report_retrieved(&self, key: &str) {
        tracing::debug!(key = key, "SSM parameter retrieved");
        let mut out = self.diagnostics.lock().unwrap_or_else(PoisonError::into_inner);
        report_retrieved_to(&mut **out, key);
    }
}

#[async_trait::async_trait]
impl StringMapProvider for SsmProvider {
    fn name(&self) -> &str {
        "ssm"
    }

    async fn get_string(&self, key: &str) -> ProviderResult<String> {
        SsmProvider::get_string(self, key).await
    }

    async fn get_string_map(&self, key: &str) -> ProviderResult<HashMap<String, MapValue>> {
        SsmProvider::get_string_map(self, key).await
    }
}

/// Key a listing by the part of each name after `path/`
///
/// Entries without a name or value, or whose name does not continue the
/// path past a separator, are skipped.
fn flatten_parameters(path: &str, parameters: Vec<Parameter>) -> HashMap<String, MapValue> {
    let mut values = HashMap::with_capacity(parameters.len());

    for param in parameters {
        let (Some(name), Some(value)) = (param.name, param.value) else {
            tracing::warn!(path = path, "Skipping SSM parameter without name or value");
            continue;
        };

        if !name.starts_with(path) {
            tracing::warn!(path = path, name = %name, "Skipping SSM parameter outside path");
            continue;
        }

        match name.get(path.len() + 1..) {
            Some(short) => {
                values.insert(short.to_string(), MapValue::String(value));
            }
            None => {
                tracing::warn!(path = path, name = %name, "Skipping SSM parameter outside path");
            }
        }
    }

    values
}

/// Write the retrieval line, ignoring write errors
fn report_retrieved_to(out: &mut dyn Write, key: &str) {
    let _ = writeln!(out, "{}: successfully retrieved key={}", DIAGNOSTIC_SOURCE, key);
}
