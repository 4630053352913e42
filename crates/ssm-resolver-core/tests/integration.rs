//! Integration tests for the SSM provider against the in-memory store

use ssm_resolver_core::providers::{
    InMemoryClientFactory, InMemoryParameterStore, MapValue, ProviderError, SsmProvider,
    StaticConfig, StringMapProvider,
};
use std::collections::HashMap;
use std::sync::Arc;

fn create_test_provider(region: &str) -> (SsmProvider, Arc<InMemoryClientFactory>) {
    let store = InMemoryParameterStore::new()
        .with_parameter("/app/prod/db_host", "h")
        .with_parameter("/app/prod/db_port", "5432")
        .with_parameter("/app/prod/api_key", "s3cr3t")
        .with_parameter("/app/staging/db_host", "staging-db");

    let factory = InMemoryClientFactory::new(store);
    let config = StaticConfig::new().with("region", region);
    let provider = SsmProvider::new(&config, factory.clone());

    (provider, factory)
}

#[tokio::test]
async fn test_two_pass_render_hits_network_once() {
    let (provider, factory) = create_test_provider("");
    let keys = ["/app/prod/db_host", "/app/prod/api_key"];

    for _pass in 0..2 {
        for key in keys {
            provider.get_string(key).await.unwrap();
        }
        provider.get_string_map("/app/prod").await.unwrap();
    }

    let store = factory.store();
    assert_eq!(store.get_calls(), 2);
    assert_eq!(store.list_calls(), 1);
    assert_eq!(factory.created(), 1);
    assert!(store.always_decrypted());
}

#[tokio::test]
async fn test_prefix_listing_strips_path() {
    let (provider, _factory) = create_test_provider("");

    let values = provider.get_string_map("/app/prod").await.unwrap();

    let expected: HashMap<String, MapValue> = [
        ("db_host", "h"),
        ("db_port", "5432"),
        ("api_key", "s3cr3t"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), MapValue::from(v)))
    .collect();
    assert_eq!(values, expected);
}

#[tokio::test]
async fn test_unknown_key_reports_missing_parameter() {
    let (provider, factory) = create_test_provider("");

    let err = provider.get_string("/app/prod/nope").await.unwrap_err();
    assert!(matches!(err, ProviderError::MissingResult { .. }));

    // Failures are not cached
    provider.get_string("/app/prod/nope").await.unwrap_err();
    assert_eq!(factory.store().get_calls(), 2);
}

#[tokio::test]
async fn test_unknown_path_is_empty_result() {
    let (provider, factory) = create_test_provider("");

    let err = provider.get_string_map("/app/dev").await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyResult { .. }));

    // A value appearing later is picked up since nothing was cached
    factory.store().put("/app/dev/db_host", "dev-db");
    let values = provider.get_string_map("/app/dev").await.unwrap();
    assert_eq!(values["db_host"], MapValue::from("dev-db"));
}

#[tokio::test]
async fn test_cached_values_survive_upstream_outage() {
    let (provider, factory) = create_test_provider("");

    provider.get_string("/app/prod/db_host").await.unwrap();
    provider.get_string_map("/app/staging").await.unwrap();

    factory.store().fail_with("RequestTimeout");

    assert_eq!(provider.get_string("/app/prod/db_host").await.unwrap(), "h");
    assert!(provider.get_string_map("/app/staging").await.is_ok());

    let err = provider.get_string("/app/prod/db_port").await.unwrap_err();
    assert!(err.is_upstream());
    assert!(err.to_string().contains("RequestTimeout"));
}

#[tokio::test]
async fn test_region_routing() {
    let (with_region, factory) = create_test_provider("eu-west-1");
    with_region.get_string("/app/prod/db_host").await.unwrap();
    assert_eq!(factory.regions(), vec![Some("eu-west-1".to_string())]);

    let (default_region, factory) = create_test_provider("");
    default_region.get_string("/app/prod/db_host").await.unwrap();
    assert_eq!(factory.regions(), vec![None]);
}

#[tokio::test]
async fn test_no_client_until_first_lookup() {
    let (provider, factory) = create_test_provider("us-east-1");
    assert_eq!(factory.created(), 0);
    assert_eq!(provider.region(), Some("us-east-1"));

    provider.get_string("/app/prod/db_host").await.unwrap();
    assert_eq!(factory.created(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_provider_builds_one_client() {
    let (provider, factory) = create_test_provider("");
    let provider: Arc<dyn StringMapProvider> = Arc::new(provider);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    provider.get_string("/app/prod/db_port").await.map(|_| ())
                } else {
                    provider.get_string_map("/app/staging").await.map(|_| ())
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(factory.created(), 1);
}
