//! Wiring configuration into a populated collector registry.

use chrono::{DateTime, Utc};
use digitalocean_api::{ApiError, Client, SpacesClient, StatusPageClient};
use thiserror::Error;
use tracing::{info, warn};

use crate::collector::{
    AccountCollector, AppCollector, BalanceCollector, BuildInfo, DatabaseCollector,
    DomainCollector, DropletCollector, ExporterCollector, FloatingIpCollector, ImageCollector,
    IncidentCollector, KeyCollector, KubernetesCollector, LoadBalancerCollector,
    ProcessCollector, SnapshotCollector, SpacesCollector, VolumeCollector, spaces,
};
use crate::config::ExporterConfig;
use crate::error_counter::ErrorCounter;
use crate::registry::{CollectorRegistry, RegistryError};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to create API client: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn spaces_client(config: &ExporterConfig) -> Result<SpacesClient, ApiError> {
    let client = SpacesClient::new(
        config.spaces.access_key_id.clone(),
        config.spaces.access_key_secret.clone(),
    )?;

    match &config.spaces.endpoint {
        Some(endpoint) => client.with_endpoint(endpoint),
        None => Ok(client),
    }
}

/// Create every collector the configuration allows, in exposition order.
pub fn build_registry(
    config: &ExporterConfig,
    build: BuildInfo,
    errors: ErrorCounter,
    start_time: DateTime<Utc>,
) -> Result<CollectorRegistry, SetupError> {
    let client = Client::builder(config.token.clone())
        .base_url(config.api.url.clone())
        .retry(config.api.retry())
        .build()?;
    let status = StatusPageClient::with_base_url(&config.api.status_url)?;
    let timeout = config.timeout();

    if !config.spaces_enabled() {
        warn!(
            "Spaces access key id or secret not set, Spaces buckets will not be exported"
        );
    }

    let registry = CollectorRegistry::builder(errors.clone())
        .register(ExporterCollector::new(build, start_time))?
        .register(AccountCollector::new(client.clone(), errors.clone(), timeout))?
        .register(AppCollector::new(client.clone(), errors.clone(), timeout))?
        .register(BalanceCollector::new(client.clone(), errors.clone(), timeout))?
        .register(DatabaseCollector::new(client.clone(), errors.clone(), timeout))?
        .register(DomainCollector::new(client.clone(), errors.clone(), timeout))?
        .register(DropletCollector::new(client.clone(), errors.clone(), timeout))?
        .register(FloatingIpCollector::new(client.clone(), errors.clone(), timeout))?
        .register(ImageCollector::new(client.clone(), errors.clone(), timeout))?
        .register(KeyCollector::new(client.clone(), errors.clone(), timeout))?
        .register(LoadBalancerCollector::new(client.clone(), errors.clone(), timeout))?
        .register(SnapshotCollector::new(client.clone(), errors.clone(), timeout))?
        .register(VolumeCollector::new(client.clone(), errors.clone(), timeout))?
        .register(KubernetesCollector::new(client, errors.clone(), timeout))?
        .register(IncidentCollector::new(status, errors.clone(), timeout))?
        .register_if(config.spaces_enabled(), spaces::NAME, || {
            spaces_client(config).map(|client| {
                SpacesCollector::new(
                    client,
                    config.spaces.regions.clone(),
                    errors.clone(),
                    timeout,
                )
            })
        })?
        .register(ProcessCollector::new(errors.clone(), timeout))?
        .build();

    info!(
        collectors = registry.collector_names().len(),
        "Collectors registered"
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(spaces: Option<(&str, &str)>) -> ExporterConfig {
        let mut config = ExporterConfig {
            token: "token".to_string(),
            ..Default::default()
        };
        if let Some((id, secret)) = spaces {
            config.spaces.access_key_id = id.to_string();
            config.spaces.access_key_secret = secret.to_string();
        }
        config
    }

    fn build(config: &ExporterConfig) -> CollectorRegistry {
        build_registry(config, BuildInfo::current(), ErrorCounter::new(), Utc::now()).unwrap()
    }

    #[test]
    fn test_all_collectors_registered_in_order() {
        let registry = build(&config(Some(("id", "secret"))));

        assert_eq!(
            registry.collector_names(),
            vec![
                "exporter",
                "account",
                "app",
                "balance",
                "database",
                "domain",
                "droplet",
                "floating_ip",
                "image",
                "key",
                "load_balancer",
                "snapshot",
                "volume",
                "kubernetes",
                "incident",
                "spaces",
                "process",
            ]
        );
    }

    #[test]
    fn test_spaces_requires_both_keys() {
        assert!(!build(&config(None)).contains("spaces"));
        assert!(!build(&config(Some(("id", "")))).contains("spaces"));
        assert!(!build(&config(Some(("", "secret")))).contains("spaces"));
        assert!(build(&config(Some(("id", "secret")))).contains("spaces"));
    }

    #[test]
    fn test_bad_api_url_is_fatal() {
        let mut config = config(None);
        config.api.url = "not a url".to_string();

        let result = build_registry(&config, BuildInfo::current(), ErrorCounter::new(), Utc::now());
        assert!(matches!(result, Err(SetupError::Api(_))));
    }
}
