//! AWS SDK backend
//!
//! Implements [`ParameterStore`] on top of `aws-sdk-ssm`. Credentials and
//! the default region come from the standard AWS provider chain
//! (environment, shared config files, instance metadata).

use super::client::{
    ClientFactory, GetParameterOutput, GetParametersByPathOutput, Parameter, ParameterStore,
};
use super::traits::BoxError;
use aws_sdk_ssm::config::Region;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use std::fmt;
use std::sync::Arc;

/// Parameter Store client backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct AwsParameterStore {
    client: aws_sdk_ssm::Client,
}

impl AwsParameterStore {
    /// Wrap an existing SDK client
    pub fn new(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

fn to_parameter(param: &aws_sdk_ssm::types::Parameter) -> Parameter {
    Parameter {
        name: param.name().map(str::to_string),
        value: param.value().map(str::to_string),
    }
}

/// Unwrap service errors so their code and message reach the caller
///
/// `SdkError` itself only displays its category ("service error"), which
/// hides `ParameterNotFound` and friends. Transport failures keep their
/// whole cause chain in the message.
fn sdk_error<E, R>(err: SdkError<E, R>) -> BoxError
where
    E: std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    match err {
        SdkError::ServiceError(context) => Box::new(context.into_err()),
        other => DisplayErrorContext(other).to_string().into(),
    }
}

#[async_trait::async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<GetParameterOutput, BoxError> {
        let out = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(GetParameterOutput {
            parameter: out.parameter().map(to_parameter),
        })
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        with_decryption: bool,
    ) -> Result<GetParametersByPathOutput, BoxError> {
        let mut pages = self
            .client
            .get_parameters_by_path()
            .path(path)
            .with_decryption(with_decryption)
            .into_paginator()
            .send();

        let mut parameters = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            parameters.extend(page.parameters().iter().map(to_parameter));
        }

        tracing::debug!(path = path, count = parameters.len(), "Listed SSM path");

        Ok(GetParametersByPathOutput { parameters })
    }
}

/// Builds [`AwsParameterStore`] handles from the ambient AWS configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsClientFactory;

impl AwsClientFactory {
    /// Create a factory ready to hand to a provider
    pub fn shared() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait::async_trait]
impl ClientFactory for AwsClientFactory {
    async fn create(&self, region: Option<String>) -> Arc<dyn ParameterStore> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let sdk_config = loader.load().await;
        tracing::debug!(
            region = ?sdk_config.region(),
            "Loaded AWS configuration for SSM"
        );

        Arc::new(AwsParameterStore::new(aws_sdk_ssm::Client::new(&sdk_config)))
    }
}
