//! Secret Resolution Providers
//!
//! This module resolves secrets from AWS Systems Manager Parameter Store for
//! a templating host. Two lookup shapes are supported: a single parameter by
//! exact name, and every parameter directly under a path prefix.
//!
//! # Architecture
//!
//! - [`SsmProvider`] is the public entry point. It caches every successful
//!   lookup for the life of the process.
//! - [`ClientAccessor`] builds the remote handle once, on first use, through
//!   an injected [`ClientFactory`].
//! - [`ParameterStore`] is the seam to the remote service. The `aws` feature
//!   provides the SDK-backed implementation; [`InMemoryParameterStore`]
//!   serves local development and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use ssm_resolver_core::providers::{AwsClientFactory, SsmProvider, StaticConfig};
//!
//! let config = StaticConfig::new().with("region", "us-east-1");
//! let ssm = SsmProvider::new(&config, AwsClientFactory::shared());
//!
//! // Second call is served from cache
//! let host = ssm.get_string("/app/prod/db_host").await?;
//! let host = ssm.get_string("/app/prod/db_host").await?;
//! ```

pub mod traits;
pub mod config;
pub mod client;
pub mod ssm;
pub mod memory;
#[cfg(feature = "aws")]
pub mod aws;

// Re-export core types
pub use traits::{
    BoxError, MapValue, MissingPart, Operation, ProviderError, ProviderResult, StringMapProvider,
};
pub use config::{ConfigError, StaticConfig};
pub use client::{
    ClientAccessor, ClientFactory, GetParameterOutput, GetParametersByPathOutput, Parameter,
    ParameterStore,
};

// Re-export provider implementations
pub use ssm::SsmProvider;
pub use memory::{InMemoryClientFactory, InMemoryParameterStore};
#[cfg(feature = "aws")]
pub use aws::{AwsClientFactory, AwsParameterStore};
