//! Backend seam
//!
//! [`IssueSource`] is the only way the rest of the workspace talks to the
//! ticketing system. The HTTP implementation lives in [`crate::http`]; tests
//! substitute fixed fixtures.

use crate::error::ClientError;
use async_trait::async_trait;
use piplan_model::RawIssue;
use serde::{Deserialize, Serialize};

/// One page request against the search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Query string (JQL)
    pub jql: String,
    /// Offset of the first result
    pub start_at: usize,
    /// Page size
    pub max_results: usize,
    /// Field ids to return
    pub fields: Vec<String>,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchPage {
    /// Offset of the first issue in this page
    pub start_at: usize,
    /// Total number of matches reported by the backend
    pub total: usize,
    /// Issues in this page
    pub issues: Vec<RawIssue>,
}

/// Read-only access to the ticketing backend
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one page of search results
    ///
    /// # Errors
    /// Any transport, status or decode failure for this page.
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage, ClientError>;

    /// Fetch one issue by key; `Ok(None)` when the backend reports it absent
    ///
    /// # Errors
    /// Any transport, status or decode failure other than absence.
    async fn fetch_issue(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<Option<RawIssue>, ClientError>;
}
