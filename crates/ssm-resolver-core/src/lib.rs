//! SSM Resolver Core
//!
//! Cached resolution of secrets and configuration values from AWS SSM
//! Parameter Store, for hosts that render templates and may ask for the
//! same key several times in one run.
//!
//! See [`providers`] for the provider, its client lifecycle, and the
//! available backends.

pub mod providers;

pub use providers::{
    ClientFactory, MapValue, ParameterStore, ProviderError, ProviderResult, SsmProvider,
    StaticConfig, StringMapProvider,
};
