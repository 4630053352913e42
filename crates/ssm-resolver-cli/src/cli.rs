//! Command definitions and execution for `ssm-resolve`

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use ssm_resolver_core::providers::{ConfigError, MapValue, StaticConfig, StringMapProvider};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

/// Resolve secrets from AWS SSM Parameter Store
#[derive(Parser, Debug)]
#[command(name = "ssm-resolve", version, about, long_about = None)]
pub struct ResolveCli {
    /// AWS region; overrides the region in --config
    #[arg(long, env = "SSM_RESOLVER_REGION", global = true)]
    pub region: Option<String>,

    /// Provider configuration file (JSON, YAML or TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve one or more parameters by exact name
    Get {
        /// Parameter names, e.g. /app/prod/db_password
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Resolve every parameter directly under a path
    GetMap {
        /// Path prefix, e.g. /app/prod
        path: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    ResolveFailed = 1,
    ConfigError = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Build the provider configuration from the file and command-line flags
pub fn build_config(cli: &ResolveCli) -> Result<StaticConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => StaticConfig::from_file(path)?,
        None => StaticConfig::new(),
    };

    if let Some(region) = &cli.region {
        config = config.with("region", region.clone());
    }

    Ok(config)
}

/// Run a command against a provider, writing results to `out`
pub async fn execute(
    provider: &dyn StringMapProvider,
    command: &Commands,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Get { keys } => {
            for key in keys {
                let value = provider
                    .get_string(key)
                    .await
                    .with_context(|| format!("failed to resolve {}", key))?;
                writeln!(out, "{}={}", key, value)?;
            }
        }
        Commands::GetMap { path, format } => {
            let values = provider
                .get_string_map(path)
                .await
                .with_context(|| format!("failed to resolve path {}", path))?;
            out.write_all(render_map(&values, *format)?.as_bytes())?;
        }
    }
    Ok(())
}

/// Render a mapping with keys in sorted order
pub fn render_map(
    values: &HashMap<String, MapValue>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let sorted: BTreeMap<&String, &MapValue> = values.iter().collect();

    let rendered = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&sorted)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(&sorted)?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssm_resolver_core::providers::{
        InMemoryClientFactory, InMemoryParameterStore, SsmProvider,
    };

    fn test_provider() -> (SsmProvider, std::sync::Arc<InMemoryClientFactory>) {
        let store = InMemoryParameterStore::new()
            .with_parameter("/app/prod/db_host", "h")
            .with_parameter("/app/prod/db_port", "5432");
        let factory = InMemoryClientFactory::new(store);
        (SsmProvider::with_region(None, factory.clone()), factory)
    }

    #[test]
    fn test_parse_get_with_region() {
        let cli = ResolveCli::try_parse_from([
            "ssm-resolve",
            "--region",
            "eu-west-1",
            "get",
            "/a",
            "/b",
        ])
        .unwrap();

        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert!(matches!(cli.command, Commands::Get { ref keys } if keys.len() == 2));
    }

    #[test]
    fn test_parse_get_requires_key() {
        assert!(ResolveCli::try_parse_from(["ssm-resolve", "get"]).is_err());
    }

    #[test]
    fn test_parse_get_map_format() {
        let cli =
            ResolveCli::try_parse_from(["ssm-resolve", "get-map", "/app", "--format", "yaml"])
                .unwrap();

        match cli.command {
            Commands::GetMap { path, format } => {
                assert_eq!(path, "/app");
                assert_eq!(format, OutputFormat::Yaml);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_region_flag_overrides_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "region = \"us-west-1\"").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = ResolveCli::try_parse_from(["ssm-resolve", "--config", path, "get", "/a"])
            .unwrap();
        assert_eq!(build_config(&cli).unwrap().string("region"), "us-west-1");

        let cli = ResolveCli::try_parse_from([
            "ssm-resolve",
            "--config",
            path,
            "--region",
            "us-east-2",
            "get",
            "/a",
        ])
        .unwrap();
        assert_eq!(build_config(&cli).unwrap().string("region"), "us-east-2");
    }

    #[tokio::test]
    async fn test_execute_get_prints_pairs_and_caches() {
        let (provider, factory) = test_provider();
        let command = Commands::Get {
            keys: vec!["/app/prod/db_host".into(), "/app/prod/db_host".into()],
        };

        let mut out = Vec::new();
        execute(&provider, &command, &mut out).await.unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "/app/prod/db_host=h\n/app/prod/db_host=h\n"
        );
        assert_eq!(factory.store().get_calls(), 1);
    }

    #[tokio::test]
    async fn test_execute_get_map_json() {
        let (provider, _factory) = test_provider();
        let command = Commands::GetMap {
            path: "/app/prod".into(),
            format: OutputFormat::Json,
        };

        let mut out = Vec::new();
        execute(&provider, &command, &mut out).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, serde_json::json!({"db_host": "h", "db_port": "5432"}));
    }

    #[tokio::test]
    async fn test_execute_reports_failing_key() {
        let (provider, _factory) = test_provider();
        let command = Commands::Get {
            keys: vec!["/missing".into()],
        };

        let mut out = Vec::new();
        let err = execute(&provider, &command, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("/missing"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_render_map_yaml_sorted() {
        let values: HashMap<String, MapValue> = [("b", "2"), ("a", "1")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), MapValue::from(v)))
            .collect();

        let yaml = render_map(&values, OutputFormat::Yaml).unwrap();
        assert!(yaml.find("a:").unwrap() < yaml.find("b:").unwrap());

        let parsed: BTreeMap<String, String> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["a"], "1");
        assert_eq!(parsed["b"], "2");
    }
}
