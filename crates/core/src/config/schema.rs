//! Configuration schema definitions
//!
//! Every section and field is optional in the file; missing values fall back
//! to the defaults below, and API values left unset are resolved later from
//! the environment by the API client.

use crate::cache::CacheConfig;
use crate::error::{Error, Result};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub cache: CacheSection,

    /// Unset means the client's environment preset applies
    #[serde(default)]
    pub retry: Option<RetrySection>,

    #[serde(default)]
    pub telemetry: TelemetrySection,
}

impl ConfigSchema {
    /// Reject values that would disable the cache or break backoff
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(Error::config("[cache] ttl_secs must be greater than zero")
                .with_suggestion("Remove the key to use the one hour default"));
        }
        if let Some(ref retry) = self.retry {
            retry
                .to_retry_config()
                .validate()
                .map_err(|e| Error::config(format!("[retry] {}", e.message)))?;
        }
        Ok(())
    }

    /// Retry policy from the `[retry]` section, if the file has one
    #[must_use]
    pub fn retry_config(&self) -> Option<RetryConfig> {
        self.retry.as_ref().map(RetrySection::to_retry_config)
    }
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiSection {
    /// Proxy base URL, e.g. `http://localhost:3000/api/prestashop`
    pub base_url: Option<String>,

    /// PrestaShop webservice key
    pub api_key: Option<String>,

    /// Base URL product and category images are served from
    pub image_base_url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Environment name (development, staging, production)
    pub environment: Option<String>,
}

/// Response cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSection {
    /// Convert into the cache's runtime configuration
    #[must_use]
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig::with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

/// Retry policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

impl RetrySection {
    /// Convert into the retry policy's runtime configuration
    #[must_use]
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySection {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
