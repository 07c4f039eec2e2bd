//! Error types for backend access
//!
//! Provides error handling for:
//! - Transport failures (connection, TLS, timeouts)
//! - Non-success HTTP responses
//! - Undecodable response bodies
//! - Configuration loading

use piplan_model::SchemaError;

/// Errors from one backend request
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body was not the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request could not be formed
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Client configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Create status error, truncating long bodies
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > 512 {
            let cut = (0..=512).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
            body.truncate(cut);
            body.push('…');
        }
        Self::Status { status, body }
    }

    /// Check if the backend rejected our credentials
    #[inline]
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Errors while loading tracker configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration text is not valid TOML for the expected shape
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Base URL missing or malformed
    #[error("invalid base url: '{0}'")]
    InvalidBaseUrl(String),

    /// Field schema failed validation
    #[error("invalid field schema: {0}")]
    Schema(#[from] SchemaError),
}
