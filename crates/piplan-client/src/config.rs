//! Tracker connection configuration
//!
//! Passed explicitly into [`JiraHttpSource`](crate::JiraHttpSource); nothing
//! in this crate reads process environment on its own.

use crate::error::ConfigError;
use piplan_model::FieldSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable the binary reads the bearer token from
pub const TOKEN_ENV_VAR: &str = "PIPLAN_TOKEN";

/// Connection settings for the ticketing backend
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// REST API root (`https://tracker.example/rest/api/2`)
    pub base_url: String,
    /// Bearer token; never serialized
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Issue browse root used to render links (`https://tracker.example/browse`)
    pub browse_url: Option<String>,
    /// Per-request timeout in seconds; transport default when absent
    pub request_timeout_secs: Option<u64>,
    /// Backend field ids
    pub fields: FieldSchema,
}

impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("browse_url", &self.browse_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("fields", &self.fields)
            .finish()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            browse_url: None,
            request_timeout_secs: Some(60),
            fields: FieldSchema::default(),
        }
    }
}

impl TrackerConfig {
    /// Create configuration for an API root
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// With bearer token
    #[inline]
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// With field schema
    #[inline]
    #[must_use]
    pub fn with_fields(mut self, fields: FieldSchema) -> Self {
        self.fields = fields;
        self
    }

    /// Parse from TOML text and validate
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::InvalidBaseUrl` / `ConfigError::Schema` from validation
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check base URL and field schema
    ///
    /// # Errors
    /// - `ConfigError::InvalidBaseUrl` unless the URL is http(s)
    /// - `ConfigError::Schema` for an unusable field schema
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        self.fields.validate()?;
        Ok(())
    }

    /// API root without trailing slash
    #[inline]
    #[must_use]
    pub fn api_root(&self) -> &str {
        self.base_url.trim().trim_end_matches('/')
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
