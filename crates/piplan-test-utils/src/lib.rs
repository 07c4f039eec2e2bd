//! Testing utilities for PI planning workspace
//!
//! Issue fixtures laid out with the default [`FieldSchema`] ids and a scripted
//! in-memory [`IssueSource`].

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use piplan_client::{ClientError, IssueSource, SearchPage, SearchRequest};
use piplan_model::{FieldSchema, RawIssue};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Type id the default schema treats as Feature
pub const FEATURE_TYPE_ID: &str = "10400";

/// Fluent builder for [`RawIssue`] fixtures
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    key: String,
    schema: FieldSchema,
    fields: Map<String, Value>,
}

impl IssueBuilder {
    pub fn new(key: &str, type_name: &str, type_id: &str) -> Self {
        let schema = FieldSchema::default();
        let mut fields = Map::new();
        fields.insert(
            schema.issue_type.clone(),
            json!({"name": type_name, "id": type_id}),
        );
        fields.insert(schema.summary.clone(), json!(format!("{key} summary")));
        Self {
            key: key.to_string(),
            schema,
            fields,
        }
    }

    pub fn feature(key: &str) -> Self {
        Self::new(key, "Feature", FEATURE_TYPE_ID)
    }

    pub fn epic(key: &str) -> Self {
        Self::new(key, "Epic", "10000")
    }

    pub fn story(key: &str) -> Self {
        Self::new(key, "Story", "10001")
    }

    pub fn fault_report(key: &str) -> Self {
        Self::new(key, "Fault Report", "10200")
    }

    pub fn capability(key: &str) -> Self {
        Self::new(key, "Capability", "10300")
    }

    pub fn field(mut self, id: &str, value: Value) -> Self {
        self.fields.insert(id.to_string(), value);
        self
    }

    fn push(mut self, id: String, value: Value) -> Self {
        match self.fields.entry(id).or_insert_with(|| json!([])) {
            Value::Array(items) => items.push(value),
            other => *other = json!([value]),
        }
        self
    }

    pub fn summary(self, text: &str) -> Self {
        let id = self.schema.summary.clone();
        self.field(&id, json!(text))
    }

    pub fn status(self, name: &str) -> Self {
        let id = self.schema.status.clone();
        self.field(&id, json!({"name": name}))
    }

    pub fn priority(self, name: &str) -> Self {
        let id = self.schema.priority.clone();
        self.field(&id, json!({"name": name}))
    }

    pub fn assignee(self, name: &str) -> Self {
        let id = self.schema.assignee.clone();
        self.field(&id, json!({"displayName": name}))
    }

    pub fn fix_version(self, name: &str) -> Self {
        let id = self.schema.fix_versions.clone();
        self.push(id, json!({"name": name}))
    }

    pub fn label(self, label: &str) -> Self {
        let id = self.schema.labels.clone();
        self.push(id, json!(label))
    }

    pub fn labels(self, labels: &[&str]) -> Self {
        labels.iter().fold(self, |b, l| b.label(l))
    }

    pub fn epic_link(self, key: &str) -> Self {
        let id = self.schema.epic_link.clone();
        self.field(&id, json!(key))
    }

    /// Generic parent reference; `type_name` is the declared parent type
    pub fn parent(self, key: &str, type_name: Option<&str>) -> Self {
        let id = self.schema.parent.clone();
        let value = match type_name {
            Some(name) => json!({"key": key, "fields": {"issuetype": {"name": name}}}),
            None => json!({"key": key}),
        };
        self.field(&id, value)
    }

    /// Outward relationship link to an issue of `type_name`
    pub fn link(self, key: &str, type_name: &str) -> Self {
        let id = self.schema.issue_links.clone();
        self.push(
            id,
            json!({
                "type": {"name": "Relates"},
                "outwardIssue": {"key": key, "fields": {"issuetype": {"name": type_name}}}
            }),
        )
    }

    /// Inward relationship link carrying a type id
    pub fn link_with_type_id(self, key: &str, type_name: &str, type_id: &str) -> Self {
        let id = self.schema.issue_links.clone();
        self.push(
            id,
            json!({
                "type": {"name": "Implements"},
                "inwardIssue": {
                    "key": key,
                    "fields": {"issuetype": {"name": type_name, "id": type_id}}
                }
            }),
        )
    }

    pub fn story_points(self, points: f64) -> Self {
        let id = self.schema.story_points.clone();
        self.field(&id, json!(points))
    }

    /// Append one raw sprint entry
    pub fn sprint(self, raw: &str) -> Self {
        let id = self.schema.sprints[0].clone();
        self.push(id, json!(raw))
    }

    /// Sprint entry in the legacy `com.atlassian...Sprint@...[...]` encoding
    pub fn sprint_named(self, name: &str) -> Self {
        self.sprint(&format!(
            "com.atlassian.greenhopper.service.sprint.Sprint@1a2b[id=42,rapidViewId=7,state=ACTIVE,name={name},startDate=2025-03-03]"
        ))
    }

    pub fn pi_scope(self, value: &str) -> Self {
        let id = self.schema.pi_scope.clone();
        self.field(&id, json!({"value": value}))
    }

    pub fn capability_link(self, key: &str) -> Self {
        let id = self.schema.capability_link.clone();
        self.field(&id, json!(key))
    }

    pub fn build(self) -> RawIssue {
        RawIssue {
            key: self.key,
            id: None,
            fields: self.fields,
        }
    }
}

/// Scripted [`IssueSource`]
///
/// Search requests are routed to the first registered result set whose needle
/// occurs in the query text; unmatched queries return nothing.
#[derive(Debug, Default)]
pub struct InMemorySource {
    routes: Vec<(String, Vec<RawIssue>)>,
    issues: HashMap<String, RawIssue>,
    failing_page: Option<usize>,
    failing_fetches: HashSet<String>,
    total_override: Option<usize>,
    delay: Option<Duration>,
    searches: Mutex<Vec<SearchRequest>>,
    fetches: Mutex<Vec<String>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `issues` to queries containing `needle`
    pub fn on_query(mut self, needle: &str, issues: Vec<RawIssue>) -> Self {
        self.routes.push((needle.to_string(), issues));
        self
    }

    /// Serve `issues` to every query
    pub fn on_any_query(self, issues: Vec<RawIssue>) -> Self {
        self.on_query("", issues)
    }

    /// Make `issue` available to single-issue fetches
    pub fn with_issue(mut self, issue: RawIssue) -> Self {
        self.issues.insert(issue.key.clone(), issue);
        self
    }

    /// Fail the search page starting at `start_at`
    pub fn failing_page(mut self, start_at: usize) -> Self {
        self.failing_page = Some(start_at);
        self
    }

    /// Fail single-issue fetches of `key`
    pub fn failing_fetch(mut self, key: &str) -> Self {
        self.failing_fetches.insert(key.to_string());
        self
    }

    /// Report `total` regardless of the scripted result size
    pub fn reporting_total(mut self, total: usize) -> Self {
        self.total_override = Some(total);
        self
    }

    /// Sleep before answering every request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().len()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.searches.lock().clone()
    }

    pub fn fetched_keys(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IssueSource for InMemorySource {
    async fn search_page(&self, request: &SearchRequest) -> Result<SearchPage, ClientError> {
        self.searches.lock().push(request.clone());
        self.pause().await;

        if self.failing_page == Some(request.start_at) {
            return Err(ClientError::status(503, "scripted failure"));
        }
        let issues = self
            .routes
            .iter()
            .find(|(needle, _)| request.jql.contains(needle.as_str()))
            .map(|(_, issues)| issues.as_slice())
            .unwrap_or_default();

        let start = request.start_at.min(issues.len());
        let end = (start + request.max_results).min(issues.len());
        Ok(SearchPage {
            start_at: request.start_at,
            total: self.total_override.unwrap_or(issues.len()),
            issues: issues[start..end].to_vec(),
        })
    }

    async fn fetch_issue(
        &self,
        key: &str,
        _fields: &[String],
    ) -> Result<Option<RawIssue>, ClientError> {
        self.fetches.lock().push(key.to_string());
        self.pause().await;

        if self.failing_fetches.contains(key) {
            return Err(ClientError::status(500, "scripted failure"));
        }
        Ok(self.issues.get(key).cloned())
    }
}
