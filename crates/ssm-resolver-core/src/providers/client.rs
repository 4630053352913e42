//! Remote store client
//!
//! [`ParameterStore`] is the narrow view of Parameter Store the provider
//! needs: one exact-name lookup and one path listing. [`ClientFactory`]
//! builds a store handle for a region, and [`ClientAccessor`] memoizes the
//! handle so it is built once per provider on first use.

use super::traits::BoxError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A single entry returned by the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameter {
    /// Full parameter name, e.g. `/app/prod/db_host`
    pub name: Option<String>,
    /// Parameter value, decrypted when requested
    pub value: Option<String>,
}

impl Parameter {
    /// Create a parameter with both name and value present
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }
}

/// Response of an exact-name lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParameterOutput {
    pub parameter: Option<Parameter>,
}

/// Response of a path listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParametersByPathOutput {
    pub parameters: Vec<Parameter>,
}

/// The two request shapes issued against the remote store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch one parameter by its exact name
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<GetParameterOutput, BoxError>;

    /// Fetch every parameter directly under `path`
    async fn get_parameters_by_path(
        &self,
        path: &str,
        with_decryption: bool,
    ) -> Result<GetParametersByPathOutput, BoxError>;
}

/// Builds store handles
///
/// Construction never fails; credential or network problems surface on the
/// first request instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ClientFactory: Send + Sync {
    /// Create a handle targeting `region`, or the default region when `None`
    async fn create(&self, region: Option<String>) -> Arc<dyn ParameterStore>;
}

/// Lazily constructed, memoized store handle
pub struct ClientAccessor {
    region: Option<String>,
    factory: Arc<dyn ClientFactory>,
    client: OnceCell<Arc<dyn ParameterStore>>,
}

impl fmt::Debug for ClientAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientAccessor")
            .field("region", &self.region)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl ClientAccessor {
    /// Create an accessor; no handle is built until [`ClientAccessor::client`]
    pub fn new(region: Option<String>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            region,
            factory,
            client: OnceCell::new(),
        }
    }

    /// Region the handle targets, `None` for the default
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Whether the handle has been built yet
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// Return the store handle, building it on first call
    ///
    /// Concurrent first callers wait on a single construction.
    pub async fn client(&self) -> Arc<dyn ParameterStore> {
        self.client
            .get_or_init(|| async {
                tracing::debug!(
                    region = self.region.as_deref().unwrap_or("<default>"),
                    "Creating SSM client"
                );
                self.factory.create(self.region.clone()).await
            })
            .await
            .clone()
    }
}
