//! Per-run summary cache using moka
//!
//! Capability summaries are looked up once per distinct key. Absent results
//! are cached as well so a missing capability is fetched only once.

use crate::search::IssueSearchClient;
use moka::future::Cache;
use piplan_model::{FieldSchema, FieldShape};

/// Default capacity for one aggregation run
pub const DEFAULT_SUMMARY_CAPACITY: u64 = 10_000;

/// Memoized key → summary lookups
#[derive(Debug, Clone)]
pub struct SummaryCache {
    inner: Cache<String, Option<String>>,
    summary_field: String,
}

impl SummaryCache {
    /// Create cache reading the schema's summary field
    #[must_use]
    pub fn new(schema: &FieldSchema) -> Self {
        Self::with_capacity(schema, DEFAULT_SUMMARY_CAPACITY)
    }

    /// Create cache with max capacity
    #[must_use]
    pub fn with_capacity(schema: &FieldSchema, max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
            summary_field: schema.summary.clone(),
        }
    }

    /// Summary of `key`, fetching on first use
    ///
    /// `None` when the issue is absent, failed to load, or has no summary.
    pub async fn summary(&self, client: &IssueSearchClient, key: &str) -> Option<String> {
        let field = &self.summary_field;
        self.inner
            .get_with(key.to_string(), async {
                let fields = [field.clone()];
                client.fetch_one(key, &fields).await.and_then(|issue| {
                    FieldShape::of(issue.field(field))
                        .display()
                        .map(str::to_string)
                })
            })
            .await
    }
}
