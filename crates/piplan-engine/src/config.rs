//! Engine configuration

use piplan_client::{DEFAULT_HARD_CAP, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregation engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Search page size
    pub page_size: usize,
    /// Cap on issues accumulated per query
    pub hard_cap: usize,
    /// Maximum in-flight side-load and summary fetches
    pub max_concurrent_fetches: usize,
    /// Deadline per entry-point call in milliseconds; none when absent
    pub call_timeout_ms: Option<u64>,
    /// Labels every listed issue must carry
    pub statistics_labels: Vec<String>,
    /// Issue browse root for rendering linked features
    pub browse_url: Option<String>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// With hard cap
    #[inline]
    #[must_use]
    pub fn with_hard_cap(mut self, hard_cap: usize) -> Self {
        self.hard_cap = hard_cap;
        self
    }

    /// With max concurrent fetches
    #[inline]
    #[must_use]
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    /// With per-call deadline
    #[inline]
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// With browse root
    #[inline]
    #[must_use]
    pub fn with_browse_url(mut self, url: impl Into<String>) -> Self {
        self.browse_url = Some(url.into());
        self
    }

    /// Per-call deadline
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Fetch concurrency, at least 1
    #[inline]
    #[must_use]
    pub fn fetch_concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            hard_cap: DEFAULT_HARD_CAP,
            max_concurrent_fetches: 8,
            call_timeout_ms: None,
            statistics_labels: vec!["BuildIssue".to_string(), "Internal_Dev".to_string()],
            browse_url: None,
        }
    }
}
