//! Configuration for the PrestaShop API client
//!
//! Values are layered: built-in defaults, then the `[api]`/`[retry]` sections
//! of `farmacia.toml`, then environment variables.

use crate::error::{ApiError, ApiResult};
use farmacia_core::config::ConfigSchema;
use farmacia_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default proxy endpoint in front of the PrestaShop webservice
const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/prestashop";

/// Default shop origin product images are served from
const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:8080";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development against a local proxy
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse an environment name, defaulting to production
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }

    /// Parse from the `FARMACIA_ENV` environment variable
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse(&env::var("FARMACIA_ENV").unwrap_or_default())
    }

    /// Retry policy suited to the environment
    #[must_use]
    pub fn default_retry(self) -> RetryConfig {
        match self {
            Self::Development => RetryConfig::quick(),
            Self::Staging | Self::Production => RetryConfig::default(),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the webservice proxy (`.../api/prestashop`)
    pub base_url: String,
    /// PrestaShop webservice key, sent as the basic-auth user
    pub api_key: Option<String>,
    /// Shop origin used to build image URLs
    pub image_base_url: String,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `FARMACIA_API_URL`: proxy base URL
    /// - `PRESTASHOP_API_KEY`: webservice key
    /// - `FARMACIA_IMAGE_BASE_URL`: shop origin for image URLs
    /// - `FARMACIA_ENV`: environment (development/staging/production)
    /// - `FARMACIA_TIMEOUT_SECS`: request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();
        let config = Self {
            environment,
            retry: environment.default_retry(),
            ..Self::default()
        };
        config.apply_env()
    }

    /// Build configuration from a parsed config file, then apply environment
    /// overrides
    pub fn from_file_config(schema: &ConfigSchema) -> ApiResult<Self> {
        Self::default().with_file_config(schema).apply_env()
    }

    /// Overlay values set in a config file
    #[must_use]
    pub fn with_file_config(mut self, schema: &ConfigSchema) -> Self {
        let api = &schema.api;
        if let Some(ref name) = api.environment {
            self.environment = Environment::parse(name);
            self.retry = self.environment.default_retry();
        }
        if let Some(ref url) = api.base_url {
            self.base_url.clone_from(url);
        }
        if let Some(ref key) = api.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(ref url) = api.image_base_url {
            self.image_base_url.clone_from(url);
        }
        if let Some(secs) = api.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retry) = schema.retry_config() {
            self.retry = retry;
        }
        self
    }

    /// Overlay values set in the environment
    pub fn apply_env(mut self) -> ApiResult<Self> {
        if let Ok(url) = env::var("FARMACIA_API_URL") {
            self.base_url = url;
        }
        if let Ok(key) = env::var("PRESTASHOP_API_KEY") {
            self.api_key = Some(key);
        }
        if let Ok(url) = env::var("FARMACIA_IMAGE_BASE_URL") {
            self.image_base_url = url;
        }
        if let Ok(secs) = env::var("FARMACIA_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| ApiError::config(format!("FARMACIA_TIMEOUT_SECS is not a number: {secs}")))?;
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    /// Create development configuration (local proxy, quick retries)
    #[must_use]
    pub fn development() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: env::var("PRESTASHOP_API_KEY").ok(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::quick(),
            environment: Environment::Development,
        }
    }

    /// Create production configuration
    #[must_use]
    pub fn production() -> Self {
        Self {
            api_key: env::var("PRESTASHOP_API_KEY").ok(),
            retry: RetryConfig::default(),
            environment: Environment::Production,
            ..Self::default()
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the webservice key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder-style method to set the image origin
    #[must_use]
    pub fn with_image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = url.into();
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(format!(
                "base_url must start with http:// or https://: {}",
                self.base_url
            )));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        self.retry.validate().map_err(|e| ApiError::config(e.message))?;

        Ok(())
    }
}
