//! Configuration for the catalog CLI
//!
//! Values are layered: defaults, then `farmacia.toml`, then environment
//! variables, then command-line flags.

use anyhow::{Context, Result};
use farmacia_api_client::{ClientConfig, PrestashopClient};
use farmacia_core::cache::TtlCache;
use farmacia_core::config::Config;
use farmacia_telemetry::TelemetryConfig;
use std::sync::Arc;

/// Resolved settings for one CLI run
pub struct Settings {
    pub file: Config,
    pub client: ClientConfig,
}

impl Settings {
    /// Load the config file and apply environment and flag overrides
    pub fn load(path: Option<&str>, base_url: Option<&str>) -> Result<Self> {
        let file = Config::load(path).context("Failed to load configuration")?;

        let mut client = ClientConfig::from_file_config(&file.schema)?;
        if let Some(url) = base_url {
            client = client.with_base_url(url);
        }
        client.validate()?;

        Ok(Self { file, client })
    }

    /// Logging setup; `--verbose` wins over the config file
    pub fn telemetry(&self, verbose: bool) -> TelemetryConfig {
        if verbose {
            return TelemetryConfig::verbose();
        }
        let section = &self.file.schema.telemetry;
        TelemetryConfig {
            log_level: section.log_level.clone(),
            json: section.json,
            ..TelemetryConfig::default()
        }
    }

    /// API client for the resolved configuration
    pub fn client(&self) -> Result<PrestashopClient> {
        Ok(PrestashopClient::with_config(self.client.clone())?)
    }

    /// Response cache with the configured TTL
    pub fn cache(&self) -> Arc<TtlCache> {
        Arc::new(TtlCache::new(self.file.schema.cache.to_cache_config()))
    }
}
