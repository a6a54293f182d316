//! Main API client implementation

use crate::config::ClientConfig;
use crate::endpoints::{AuthApi, CartApi, CategoriesApi, OrdersApi, ProductsApi};
use crate::error::{ApiError, ApiResult, ErrorContext};
use crate::query::ApiQuery;
use crate::transform::TransformContext;
use farmacia_core::retry::{retry, RetryConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// PrestaShop webservice client
///
/// Wraps `reqwest` and adds:
/// - Retry with exponential backoff for transient failures (never for 401)
/// - The webservice key as basic-auth user on every request
/// - `output_format=JSON` on every request
/// - Request correlation IDs for tracing
///
/// Cloning is cheap; endpoint handles hold their own clone.
#[derive(Clone)]
pub struct PrestashopClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl PrestashopClient {
    /// Create a new client with default configuration from environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static("farmacia-api-client/0.3"));

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Transformer context for responses of this client
    #[must_use]
    pub fn transform_context(&self) -> TransformContext {
        TransformContext::new(self.config.image_base_url.clone())
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access product endpoints
    #[must_use]
    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.clone())
    }

    /// Access category endpoints
    #[must_use]
    pub fn categories(&self) -> CategoriesApi {
        CategoriesApi::new(self.clone())
    }

    /// Access customer authentication endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access cart endpoints
    #[must_use]
    pub fn cart(&self) -> CartApi {
        CartApi::new(self.clone())
    }

    /// Access order endpoints
    #[must_use]
    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods with retry
    // -------------------------------------------------------------------------

    /// GET `<base_url>/<endpoint>` with the given webservice query
    #[instrument(skip(self, query))]
    pub async fn get_json(&self, endpoint: &str, query: &ApiQuery) -> ApiResult<Value> {
        self.request(Method::GET, endpoint, query, None).await
    }

    /// POST a JSON record
    #[instrument(skip(self, body))]
    pub async fn post_json(&self, endpoint: &str, body: &Value) -> ApiResult<Value> {
        self.request(Method::POST, endpoint, &ApiQuery::new(), Some(body))
            .await
    }

    /// PUT a JSON record
    #[instrument(skip(self, body))]
    pub async fn put_json(&self, endpoint: &str, body: &Value) -> ApiResult<Value> {
        self.request(Method::PUT, endpoint, &ApiQuery::new(), Some(body))
            .await
    }

    /// DELETE a record
    #[instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str) -> ApiResult<()> {
        self.request(Method::DELETE, endpoint, &ApiQuery::new(), None)
            .await
            .map(|_| ())
    }

    /// Absolute URL for an endpoint
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Execute a request with the configured retry policy
    ///
    /// POST creates records (customers, carts, orders), so it runs once: a
    /// retried POST after a lost response would create a duplicate.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &ApiQuery,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let url = self.url(endpoint);
        let policy = if method == Method::POST {
            RetryConfig::no_retry()
        } else {
            self.config.retry.clone()
        };

        let result = retry(policy, ApiError::is_retryable, || {
            self.execute_single_request(method.clone(), &url, query, body)
        })
        .await;

        match result {
            Ok(outcome) => {
                debug!(
                    endpoint,
                    attempts = outcome.attempts,
                    elapsed_ms = u64::try_from(outcome.total_duration.as_millis()).unwrap_or(u64::MAX),
                    "Request succeeded"
                );
                Ok(outcome.value)
            }
            Err(e) => {
                let context = ErrorContext {
                    request_id: None,
                    endpoint: endpoint.to_string(),
                    method: method.to_string(),
                };
                warn!(%context, error = %e, "Request failed");
                Err(e)
            }
        }
    }

    /// Execute a single request without retry
    async fn execute_single_request(
        &self,
        method: Method,
        url: &str,
        query: &ApiQuery,
        body: Option<&Value>,
    ) -> ApiResult<Value> {
        let request_id = Uuid::new_v4().to_string();
        debug!(request_id = %request_id, %method, url, "Sending request");

        let mut request = self
            .inner
            .request(method, url)
            .header(X_REQUEST_ID, &request_id)
            .query(&[("output_format", "JSON")])
            .query(query.pairs());

        if let Some(ref key) = self.config.api_key {
            request = request.basic_auth(key, Option::<&str>::None);
        }

        if let Some(b) = body {
            request = request.query(&[("io_format", "JSON")]).json(b);
        }

        let response = request.send().await?;
        handle_response(response).await
    }
}

/// Decode a response body, mapping non-success statuses to [`ApiError`].
///
/// An empty success body (DELETE, some PUTs) decodes to `Value::Null`.
async fn handle_response(response: Response) -> ApiResult<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::from_response(status.as_u16(), &text));
    }

    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}
