//! Error types for the API client

use farmacia_core::retry::Retryable;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP status PrestaShop uses for a missing or invalid webservice key
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Backend answered with a non-success status
    #[error("API error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Backend error code, when the body carried one
        code: Option<String>,
        /// Error message or raw response body
        message: String,
    },

    /// Credentials were rejected at the domain level
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The backend was reachable but the entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind, e.g. "product"
        entity: &'static str,
        /// Identifier or slug that was looked up
        key: String,
    },

    /// The entity already exists, e.g. a registered email
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// Entity kind, e.g. "customer"
        entity: &'static str,
        /// Conflicting identifier
        key: String,
    },

    /// Caller input rejected before any request was sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A successful response did not contain the expected record
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a not-found error
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an error from a non-success response body.
    ///
    /// PrestaShop reports failures as `{"errors":[{"code":..,"message":..}]}`;
    /// anything else is kept verbatim as the message.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) if !envelope.errors.is_empty() => {
                let first = &envelope.errors[0];
                Self::Http {
                    status,
                    code: first.code.as_ref().map(code_to_string),
                    message: first.message.clone().unwrap_or_else(|| body.to_string()),
                }
            }
            _ => Self::Http {
                status,
                code: None,
                message: body.to_string(),
            },
        }
    }

    /// HTTP status, when the error came from a response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized(_) => Some(STATUS_UNAUTHORIZED),
            _ => None,
        }
    }

    /// Backend error code, when the response carried one
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether this is an authentication failure
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_)) || self.status() == Some(STATUS_UNAUTHORIZED)
    }

    /// Whether the entity was missing rather than the backend unreachable
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is retryable
    ///
    /// Transport failures and every non-401 status are retried; authentication
    /// failures never resolve with time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => !self.is_auth_error(),
            Self::Http { status, .. } => *status != STATUS_UNAUTHORIZED,
            Self::Unauthorized(_)
            | Self::NotFound { .. }
            | Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::Json(_)
            | Self::Conflict { .. }
            | Self::Validation(_)
            | Self::UnexpectedResponse(_)
            | Self::InvalidUrl(_) => false,
        }
    }

    /// Short message suitable for showing to a shopper
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { entity, .. } => format!("The requested {entity} does not exist"),
            Self::Unauthorized(_) => "Invalid email or password".to_string(),
            Self::Conflict { entity, .. } => format!("This {entity} is already registered"),
            Self::Validation(msg) => msg.clone(),
            e if e.is_auth_error() => "Your session is not authorized".to_string(),
            Self::Request(_) | Self::Http { .. } => {
                "The catalog is temporarily unavailable, please try again".to_string()
            }
            _ => "Something went wrong while loading data".to_string(),
        }
    }
}

impl Retryable for ApiError {
    fn is_retryable(&self) -> bool {
        ApiError::is_retryable(self)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    code: Option<serde_json::Value>,
    message: Option<String>,
}

fn code_to_string(code: &serde_json::Value) -> String {
    match code {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Error context for better debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Request ID for correlation
    pub request_id: Option<String>,
    /// Endpoint that was called
    pub endpoint: String,
    /// HTTP method used
    pub method: String,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.endpoint)?;
        if let Some(ref id) = self.request_id {
            write!(f, " (request_id: {id})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_prestashop_envelope() {
        let body = r#"{"errors":[{"code":3,"message":"Id(s) not exists: 999"}]}"#;
        let err = ApiError::from_response(404, body);

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.code(), Some("3"));
        assert!(err.to_string().contains("Id(s) not exists"));
    }

    #[test]
    fn test_from_response_plain_body() {
        let err = ApiError::from_response(502, "Bad Gateway");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.code(), None);
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn test_auth_errors_not_retryable() {
        let err = ApiError::from_response(401, "Unauthorized");
        assert!(err.is_auth_error());
        assert!(!err.is_retryable());

        assert!(!ApiError::Unauthorized("bad password".into()).is_retryable());
    }

    #[test]
    fn test_server_and_client_errors_retryable() {
        assert!(ApiError::from_response(500, "").is_retryable());
        assert!(ApiError::from_response(404, "").is_retryable());
        assert!(ApiError::from_response(429, "").is_retryable());
    }

    #[test]
    fn test_not_found_is_distinct() {
        let err = ApiError::not_found("product", "crema-solar");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "product not found: crema-solar");
    }

    #[test]
    fn test_user_message() {
        assert_eq!(
            ApiError::not_found("category", "7").user_message(),
            "The requested category does not exist"
        );
        assert!(ApiError::from_response(503, "")
            .user_message()
            .contains("temporarily unavailable"));
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext {
            request_id: Some("abc".into()),
            endpoint: "products".into(),
            method: "GET".into(),
        };
        assert_eq!(ctx.to_string(), "GET products (request_id: abc)");
    }
}
