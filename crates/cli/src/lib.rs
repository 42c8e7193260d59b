//! Library half of the `jobwatch` binary.
//!
//! Exposes configuration, gateway wiring and output formatting so the
//! binary entrypoint and tests share them.

pub mod config;
pub mod output;

use std::sync::Arc;

use jobwatch_backend::{BackendError, BackendFamily, CatalogRouter, HttpBackend};
use jobwatch_tracker::JobGateway;

use crate::config::WatcherConfig;

/// Build both HTTP backends and the gateway routing between them.
///
/// The catalog is empty until [`JobGateway::refresh`] runs.
pub fn build_gateway(config: &WatcherConfig) -> Result<JobGateway, BackendError> {
    let legacy = http_backend(config, BackendFamily::Legacy, &config.legacy_url)?;
    let generic = http_backend(config, BackendFamily::Generic, &config.generic_url)?;
    let router = Arc::new(CatalogRouter::new(Arc::new(legacy), Arc::new(generic)));
    Ok(JobGateway::new(router, config.poll.clone()))
}

fn http_backend(
    config: &WatcherConfig,
    family: BackendFamily,
    url: &str,
) -> Result<HttpBackend, BackendError> {
    let backend = HttpBackend::with_timeout(family, url, config.request_timeout())?;
    Ok(match &config.api_token {
        Some(token) => backend.with_token(token.clone()),
        None => backend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn gateway_starts_with_empty_catalog() {
        let config = WatcherConfig::from_lookup(|key| {
            (key == "JOBWATCH_API_TOKEN").then(|| "token".to_string())
        })
        .unwrap();

        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.list().await.count, 0);
        assert_eq!(gateway.tracker().tracked_count().await, 0);
        assert_eq!(gateway.tracker().config(), &config.poll);
    }
}
