//! Error types used throughout the gateway
//!
//! Errors are classified by origin, not by transport status:
//! configuration problems fail before any network I/O, transport failures
//! carry the method and endpoint that was attempted, and API failures
//! carry the provider's full error list so callers can match on specific
//! Cloudflare error codes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single `{code, message}` pair from the Cloudflare response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Main error type for the gateway
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum CloudflareError {
    /// A required identifier or credential was not resolvable from
    /// settings. Raised before any network call; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The HTTP transport itself failed (DNS, connect, TLS, timeout)
    /// after exhausting retries.
    #[error("Cloudflare HTTP request failed: {message} ({method} {endpoint})")]
    Request {
        method: String,
        endpoint: String,
        message: String,
    },

    /// The provider responded with `success: false`.
    #[error("Cloudflare API error: {message}")]
    Api {
        message: String,
        errors: Vec<ApiErrorEntry>,
    },

    /// The response body was not a JSON object. Indicates a transport or
    /// proxy problem, not a business error.
    #[error("Invalid JSON response from Cloudflare API: {0}")]
    MalformedResponse(String),
}

impl CloudflareError {
    pub fn missing_credentials() -> Self {
        Self::Configuration(
            "Cloudflare credentials are not configured. Set CLOUDFLARE_TOKEN or \
             CLOUDFLARE_EMAIL and CLOUDFLARE_API_KEY."
                .into(),
        )
    }

    pub fn missing_zone_id() -> Self {
        Self::Configuration("Cloudflare Zone ID is not configured.".into())
    }

    pub fn missing_account_id() -> Self {
        Self::Configuration("Cloudflare Account ID is not configured.".into())
    }

    /// Build an API error from the envelope's error list.
    ///
    /// The message is taken from the first error, falling back to its
    /// code, falling back to a generic message.
    pub fn from_api_errors(errors: Vec<ApiErrorEntry>) -> Self {
        let message = match errors.first() {
            Some(first) if !first.message.is_empty() => first.message.clone(),
            Some(first) => first.code.to_string(),
            None => "Unknown Cloudflare API error".to_string(),
        };

        Self::Api { message, errors }
    }

    /// Check if an API error contains a specific Cloudflare error code.
    ///
    /// Always false for non-API errors.
    pub fn has_error_code(&self, code: i64) -> bool {
        match self {
            Self::Api { errors, .. } => errors.iter().any(|e| e.code == code),
            _ => false,
        }
    }

    /// The provider's error list, empty for non-API errors.
    pub fn api_errors(&self) -> &[ApiErrorEntry] {
        match self {
            Self::Api { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, CloudflareError>;
