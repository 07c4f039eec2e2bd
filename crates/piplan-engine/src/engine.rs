//! Aggregation entry points
//!
//! Every call is independent: the row mapping, the set of known parents and
//! the summary cache live only for the duration of one call. Side-loaded
//! parents and capability summaries are fetched with bounded concurrency and
//! consumed in request order, so results do not depend on fetch timing.

use crate::config::EngineConfig;
use crate::error::{required, EngineError, EngineResult};
use crate::hierarchy::{Hierarchy, HierarchyBuilder, Scope};
use crate::query;
use futures::stream::{self, StreamExt};
use piplan_client::{IssueSearchClient, IssueSource, SummaryCache};
use piplan_model::{FieldExtractor, FieldSchema, RawIssue};
use piplan_rules::{class_counts, FlatIssue};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

/// Issue hierarchy aggregation engine
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    client: IssueSearchClient,
    schema: FieldSchema,
    config: EngineConfig,
}

impl AggregationEngine {
    /// Create engine over a backend
    #[must_use]
    pub fn new(source: Arc<dyn IssueSource>, schema: FieldSchema, config: EngineConfig) -> Self {
        let client = IssueSearchClient::new(source)
            .with_page_size(config.page_size)
            .with_hard_cap(config.hard_cap);
        Self {
            client,
            schema,
            config,
        }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Field schema in use
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Planning view of one work group for one program interval
    ///
    /// # Errors
    /// - `EngineError::InvalidInput` for a blank work group or fix version
    /// - `EngineError::Timeout` when the configured deadline passes
    pub async fn build(&self, work_group: &str, fix_version: &str) -> EngineResult<Hierarchy> {
        let work_group = required("work_group", work_group)?;
        let fix_version = required("fix_version", fix_version)?;
        self.with_deadline(self.aggregate(work_group, Scope::interval(fix_version)))
            .await
    }

    /// Planning view of one work group across all program intervals
    ///
    /// # Errors
    /// - `EngineError::InvalidInput` for a blank work group
    /// - `EngineError::Timeout` when the configured deadline passes
    pub async fn build_backlog(&self, work_group: &str) -> EngineResult<Hierarchy> {
        let work_group = required("work_group", work_group)?;
        self.with_deadline(self.aggregate(work_group, Scope::AllIntervals))
            .await
    }

    /// Flat labelled fault-report list for one work group and interval
    ///
    /// # Errors
    /// - `EngineError::InvalidInput` for a blank work group or fix version
    /// - `EngineError::Timeout` when the configured deadline passes
    pub async fn list_issues(
        &self,
        work_group: &str,
        fix_version: &str,
    ) -> EngineResult<Vec<FlatIssue>> {
        let work_group = required("work_group", work_group)?;
        let fix_version = required("fix_version", fix_version)?;
        self.with_deadline(self.listing(work_group, fix_version))
            .await
    }

    /// Label class → occurrence count over [`list_issues`](Self::list_issues)
    ///
    /// # Errors
    /// Same as [`list_issues`](Self::list_issues).
    pub async fn get_statistics(
        &self,
        work_group: &str,
        fix_version: &str,
    ) -> EngineResult<BTreeMap<String, usize>> {
        let issues = self.list_issues(work_group, fix_version).await?;
        Ok(class_counts(&issues))
    }

    async fn with_deadline<T>(&self, work: impl Future<Output = T>) -> EngineResult<T> {
        match self.config.call_timeout() {
            Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
                tracing::warn!(?limit, "aggregation deadline passed");
                EngineError::Timeout(limit)
            }),
            None => Ok(work.await),
        }
    }

    async fn aggregate(&self, work_group: &str, scope: Scope) -> Hierarchy {
        let fields = self.schema.hierarchy_fields();
        let jql = query::hierarchy_query(&self.schema, work_group);
        let outcome = self.client.search_all(&jql, &fields).await;

        let mut builder = HierarchyBuilder::new(&self.schema, scope);
        let seeded = builder.seed_all(&outcome.issues);
        builder.plan_children(&outcome.issues);

        let mut side_loaded = 0;
        loop {
            let missing = builder.resolve_round();
            if missing.is_empty() {
                break;
            }
            side_loaded += missing.len();
            for (key, issue) in self.fetch_parents(missing, &fields).await {
                match issue {
                    Some(issue) => {
                        if !builder.seed_side_loaded(&key, &issue) {
                            tracing::debug!(%key, "side-loaded issue is not a parent type");
                        }
                    }
                    None => tracing::warn!(%key, "referenced parent could not be loaded"),
                }
            }
        }

        builder.attach_pending();
        builder.recanonicalize();

        let summaries = self.fetch_summaries(builder.capability_keys()).await;
        builder.apply_summaries(&summaries);

        let hierarchy = builder.finish(outcome.truncated, outcome.aborted);
        tracing::info!(
            %work_group,
            fix_version = hierarchy.fix_version.as_deref().unwrap_or("*"),
            issues = outcome.issues.len(),
            seeded,
            side_loaded,
            rows = hierarchy.rows.len(),
            unattached = hierarchy.unattached.len(),
            truncated = hierarchy.truncated,
            "hierarchy built"
        );
        hierarchy
    }

    async fn fetch_parents(
        &self,
        keys: Vec<String>,
        fields: &[String],
    ) -> Vec<(String, Option<RawIssue>)> {
        let client = &self.client;
        stream::iter(keys)
            .map(move |key| async move {
                let issue = client.fetch_one(&key, fields).await;
                (key, issue)
            })
            .buffered(self.config.fetch_concurrency())
            .collect()
            .await
    }

    async fn fetch_summaries(&self, keys: Vec<String>) -> HashMap<String, Option<String>> {
        let client = &self.client;
        let cache = &SummaryCache::new(&self.schema);
        stream::iter(keys)
            .map(move |key| async move {
                let summary = cache.summary(client, &key).await;
                (key, summary)
            })
            .buffered(self.config.fetch_concurrency())
            .collect()
            .await
    }

    async fn listing(&self, work_group: &str, fix_version: &str) -> Vec<FlatIssue> {
        let jql = query::listing_query(
            &self.schema,
            work_group,
            fix_version,
            &self.config.statistics_labels,
        );
        let outcome = self
            .client
            .search_all(&jql, &self.schema.listing_fields())
            .await;

        let fx = FieldExtractor::new(&self.schema);
        let browse = self.config.browse_url.as_deref();
        let issues: Vec<FlatIssue> = outcome
            .issues
            .iter()
            .map(|issue| FlatIssue::from_issue(issue, &fx, browse))
            .collect();

        tracing::info!(%work_group, %fix_version, issues = issues.len(), truncated = outcome.truncated, "issues listed");
        issues
    }
}
