//! In-memory Parameter Store
//!
//! A [`ParameterStore`] backed by a sorted map, for local development and
//! tests. It mirrors the service closely enough for the provider: exact
//! name lookups, non-recursive path listings, and request counters so
//! callers can verify how often the network would have been hit.
//!
//! # Example
//!
//! ```rust,ignore
//! use ssm_resolver_core::providers::{InMemoryClientFactory, InMemoryParameterStore, SsmProvider};
//!
//! let store = InMemoryParameterStore::new()
//!     .with_parameter("/app/prod/db_host", "localhost");
//! let factory = InMemoryClientFactory::new(store);
//! let ssm = SsmProvider::with_region(None, factory.clone());
//! ```

use super::client::{
    ClientFactory, GetParameterOutput, GetParametersByPathOutput, Parameter, ParameterStore,
};
use super::traits::BoxError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Parameter Store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: RwLock<BTreeMap<String, String>>,
    /// Message returned as an upstream error while set
    failure: RwLock<Option<String>>,
    get_calls: AtomicUsize,
    list_calls: AtomicUsize,
    /// Requests received without decryption
    plaintext_calls: AtomicUsize,
}

impl InMemoryParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter (builder pattern)
    pub fn with_parameter(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name, value);
        self
    }

    /// Insert or overwrite a parameter
    pub fn put(&self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into());
    }

    /// Make every subsequent request fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    /// Stop failing requests
    pub fn recover(&self) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of exact-name lookups received
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Number of path listings received
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Whether every request received asked for decryption
    pub fn always_decrypted(&self) -> bool {
        self.plaintext_calls.load(Ordering::SeqCst) == 0
    }

    fn record(&self, counter: &AtomicUsize, with_decryption: bool) -> Result<(), BoxError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if !with_decryption {
            self.plaintext_calls.fetch_add(1, Ordering::SeqCst);
        }

        match self.failure.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<GetParameterOutput, BoxError> {
        self.record(&self.get_calls, with_decryption)?;

        let parameters = self.parameters.read().unwrap_or_else(PoisonError::into_inner);
        Ok(GetParameterOutput {
            parameter: parameters
                .get(name)
                .map(|value| Parameter::new(name, value.clone())),
        })
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        with_decryption: bool,
    ) -> Result<GetParametersByPathOutput, BoxError> {
        self.record(&self.list_calls, with_decryption)?;

        let prefix = format!("{}/", path.trim_end_matches('/'));
        let parameters = self.parameters.read().unwrap_or_else(PoisonError::into_inner);

        // Direct children only, like a non-recursive listing
        let children = parameters
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .filter(|(name, _)| !name[prefix.len()..].contains('/'))
            .map(|(name, value)| Parameter::new(name.clone(), value.clone()))
            .collect();

        Ok(GetParametersByPathOutput {
            parameters: children,
        })
    }
}

/// Factory handing out one shared [`InMemoryParameterStore`]
#[derive(Debug)]
pub struct InMemoryClientFactory {
    store: Arc<InMemoryParameterStore>,
    regions: Mutex<Vec<Option<String>>>,
}

impl InMemoryClientFactory {
    /// Wrap a store in a factory
    pub fn new(store: InMemoryParameterStore) -> Arc<Self> {
        Self::shared(Arc::new(store))
    }

    /// Wrap an already shared store in a factory
    pub fn shared(store: Arc<InMemoryParameterStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            regions: Mutex::new(Vec::new()),
        })
    }

    /// The store handed to every client
    pub fn store(&self) -> &Arc<InMemoryParameterStore> {
        &self.store
    }

    /// Number of clients created so far
    pub fn created(&self) -> usize {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Region requested by each client creation, in order
    pub fn regions(&self) -> Vec<Option<String>> {
        self.regions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl ClientFactory for InMemoryClientFactory {
    async fn create(&self, region: Option<String>) -> Arc<dyn ParameterStore> {
        self.regions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(region);
        Arc::clone(&self.store) as Arc<dyn ParameterStore>
    }
}
