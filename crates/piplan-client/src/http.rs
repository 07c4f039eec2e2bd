//! reqwest-backed [`IssueSource`]
//!
//! - `POST {api}/search` with a JSON body for paginated queries
//! - `GET {api}/issue/{key}?fields=...` for single issues (404 → absent)
//!
//! Authentication is a bearer token from [`TrackerConfig`].

use crate::config::TrackerConfig;
use crate::error::ClientError;
use crate::source::{IssueSource, SearchPage, SearchRequest};
use async_trait::async_trait;
use piplan_model::RawIssue;
use reqwest::{Client, RequestBuilder, StatusCode};

/// HTTP client for a ticketing REST API
#[derive(Debug, Clone)]
pub struct JiraHttpSource {
    client: Client,
    config: TrackerConfig,
}

impl JiraHttpSource {
    /// Create source from validated configuration
    ///
    /// # Errors
    /// - `ClientError::Config` if the configuration does not validate
    /// - `ClientError::Transport` if the HTTP client cannot be built
    pub fn new(config: TrackerConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl IssueSource for JiraHttpSource {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage, ClientError> {
        let url = format!("{}/search", self.config.api_root());
        tracing::debug!(start_at = request.start_at, max_results = request.max_results, "search page");

        let response = self
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status(status.as_u16(), body));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_issue(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Option<RawIssue>, ClientError> {
        if key.trim().is_empty() || key.contains('/') {
            return Err(ClientError::InvalidRequest(format!("bad issue key '{key}'")));
        }
        let url = format!("{}/issue/{}", self.config.api_root(), key.trim());
        tracing::debug!(%key, "fetch issue");

        let response = self
            .authorize(self.client.get(&url))
            .query(&[("fields", fields.join(","))])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::status(status.as_u16(), body));
        }
        let bytes = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
