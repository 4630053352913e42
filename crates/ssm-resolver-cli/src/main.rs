//! SSM Resolver CLI
//!
//! Resolves parameters from AWS SSM Parameter Store through a single cached
//! provider, so repeated keys in one invocation cost one request.
//!
//! # Usage
//!
//! ```bash
//! # Resolve single parameters
//! ssm-resolve --region eu-west-1 get /app/prod/db_host /app/prod/db_password
//!
//! # Resolve everything under a path
//! ssm-resolve get-map /app/prod --format yaml
//!
//! # Read the region from a provider config file
//! ssm-resolve --config provider.toml get /app/prod/api_key
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: A key or path could not be resolved
//! - 2: Invalid provider configuration

mod cli;

use clap::Parser;
use cli::{build_config, execute, ExitCode, ResolveCli};
use ssm_resolver_core::providers::{AwsClientFactory, SsmProvider};

#[tokio::main]
async fn main() {
    let cli = ResolveCli::parse();

    // Logs go to stderr so stdout carries only resolved values
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run(&cli).await;
    std::process::exit(exit_code.into());
}

async fn run(cli: &ResolveCli) -> ExitCode {
    let config = match build_config(cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid provider configuration");
            eprintln!("Error: {}", e);
            return ExitCode::ConfigError;
        }
    };

    let provider = SsmProvider::new(&config, AwsClientFactory::shared());
    tracing::debug!(region = ?provider.region(), "SSM provider ready");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match execute(&provider, &cli.command, &mut out).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::ResolveFailed
        }
    }
}
