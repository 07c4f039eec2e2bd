//! Paginated search with a hard result cap
//!
//! Failures never propagate out of this module: a failed page ends pagination
//! and keeps what was accumulated, a failed single fetch reads as absent.
//! Callers learn about degradation through [`SearchOutcome`].

use crate::source::{IssueSource, SearchRequest};
use piplan_model::RawIssue;
use serde::Serialize;
use std::sync::Arc;

/// Default page size
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Default cap on accumulated results
pub const DEFAULT_HARD_CAP: usize = 2_000;

/// Result of paging through one query
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    /// Issues in backend order, at most `hard_cap`
    pub issues: Vec<RawIssue>,
    /// Backend total from the last page seen
    pub reported_total: usize,
    /// Hard cap cut the result short
    pub truncated: bool,
    /// A page request failed and pagination stopped early
    pub aborted: bool,
}

impl SearchOutcome {
    /// Check if the result may be missing issues
    #[inline]
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.truncated || self.aborted
    }
}

/// Query front-end over an [`IssueSource`]
#[derive(Clone)]
pub struct IssueSearchClient {
    source: Arc<dyn IssueSource>,
    page_size: usize,
    hard_cap: usize,
}

impl std::fmt::Debug for IssueSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueSearchClient")
            .field("page_size", &self.page_size)
            .field("hard_cap", &self.hard_cap)
            .finish_non_exhaustive()
    }
}

impl IssueSearchClient {
    /// Create client with default page size and cap
    #[must_use]
    pub fn new(source: Arc<dyn IssueSource>) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            hard_cap: DEFAULT_HARD_CAP,
        }
    }

    /// With page size (at least 1)
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// With cap on accumulated results (at least 1)
    #[inline]
    #[must_use]
    pub fn with_hard_cap(mut self, hard_cap: usize) -> Self {
        self.hard_cap = hard_cap.max(1);
        self
    }

    /// Page through every result of `jql`
    ///
    /// Stops when the backend reports nothing remaining, returns an empty
    /// page, `hard_cap` issues have accumulated, or a page request fails.
    pub async fn search_all(&self, jql: &str, fields: &[String]) -> SearchOutcome {
        let mut outcome = SearchOutcome::default();
        let mut start_at = 0usize;

        loop {
            let remaining_cap = self.hard_cap.saturating_sub(outcome.issues.len());
            if remaining_cap == 0 {
                outcome.truncated = outcome.reported_total > outcome.issues.len();
                break;
            }

            let request = SearchRequest {
                jql: jql.to_string(),
                start_at,
                max_results: self.page_size.min(remaining_cap),
                fields: fields.to_vec(),
            };

            let page = match self.source.search_page(&request).await {
                Ok(page) => page,
                Err(e) if e.is_auth_failure() => {
                    tracing::error!(start_at, error = %e, "search rejected credentials; check the token");
                    outcome.aborted = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(start_at, error = %e, "search page failed; keeping partial results");
                    outcome.aborted = true;
                    break;
                }
            };

            outcome.reported_total = page.total;
            let received = page.issues.len();
            let take = received.min(remaining_cap);
            outcome.issues.extend(page.issues.into_iter().take(take));
            start_at += received;

            if take < received {
                outcome.truncated = true;
                break;
            }
            if received == 0 || start_at >= page.total {
                break;
            }
        }

        if outcome.truncated {
            tracing::warn!(
                cap = self.hard_cap,
                total = outcome.reported_total,
                "search hit result cap; results are incomplete"
            );
        }
        tracing::debug!(count = outcome.issues.len(), "search finished");
        outcome
    }

    /// Fetch one issue; absent on any failure
    pub async fn fetch_one(&self, key: &str, fields: &[String]) -> Option<RawIssue> {
        match self.source.fetch_issue(key, fields).await {
            Ok(issue) => issue,
            Err(e) if e.is_auth_failure() => {
                tracing::error!(%key, error = %e, "issue fetch rejected credentials");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "issue fetch failed");
                None
            }
        }
    }
}
