//! Parent rows of the planning hierarchy
//!
//! A [`ParentRow`] is created once per Feature/Epic key per aggregation run
//! and accumulates its children's points, details and sprint placement.

use crate::extract::FieldExtractor;
use crate::issue::RawIssue;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Bucket for children without a sprint in the requested interval
pub const NO_SPRINT: &str = "No Sprint";

/// Canonical sprint label → child keys, in first-placement order
pub type SprintBuckets = IndexMap<String, Vec<String>>;

/// Per-child breakdown entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDetail {
    /// Child issue key
    pub key: String,
    /// Child point estimate (`0.0` when missing)
    pub story_points: f64,
    /// Child assignee display name
    pub assignee: String,
    /// Child status name
    pub status: String,
}

/// One Feature/Epic row with its rolled-up children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRow {
    /// Issue type name (`Feature`, `Epic`, ...)
    pub issue_type: String,
    /// Summary text
    pub summary: String,
    /// Status name
    pub status: String,
    /// Priority name
    pub priority: String,
    /// PI-scope selection
    pub pi_scope: String,
    /// Assignee display name
    pub assignee: String,
    /// Key of the owning capability
    pub parent_link: Option<String>,
    /// Summary of the owning capability, resolved after aggregation
    pub parent_summary: Option<String>,
    /// Program-interval labels this row declares
    #[serde(rename = "fixVersions")]
    pub fix_versions: IndexSet<String>,
    /// Own point estimate
    pub story_points: f64,
    /// Sum of attached children's points
    pub sum_story_points: f64,
    /// Sprint placement of attached children
    pub sprints: SprintBuckets,
    /// Attached children in attachment order
    pub stories_detail: Vec<StoryDetail>,
}

impl ParentRow {
    /// Seed a row from a Feature/Epic issue
    ///
    /// Accumulators start empty; `parent_summary` is filled in later.
    #[must_use]
    pub fn from_issue(issue: &RawIssue, fx: &FieldExtractor<'_>) -> Self {
        Self {
            issue_type: fx.type_name(issue),
            summary: fx.summary(issue),
            status: fx.status(issue),
            priority: fx.priority(issue),
            pi_scope: fx.pi_scope(issue),
            assignee: fx.assignee(issue),
            parent_link: fx.capability_key(issue),
            parent_summary: None,
            fix_versions: fx.fix_versions(issue),
            story_points: fx.story_points(issue),
            sum_story_points: 0.0,
            sprints: SprintBuckets::new(),
            stories_detail: Vec::new(),
        }
    }

    /// Roll a child up into this row
    ///
    /// The child lands in every listed bucket (once per bucket), or in
    /// [`NO_SPRINT`] when `buckets` is empty.
    pub fn attach(&mut self, detail: StoryDetail, buckets: &[String]) {
        self.sum_story_points += detail.story_points;
        if buckets.is_empty() {
            self.place(NO_SPRINT, &detail.key);
        } else {
            for bucket in buckets {
                self.place(bucket, &detail.key);
            }
        }
        self.stories_detail.push(detail);
    }

    /// Put a child key into a bucket, ignoring repeats
    pub fn place(&mut self, bucket: &str, key: &str) {
        let keys = self.sprints.entry(bucket.to_string()).or_default();
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    /// Sum of points over `stories_detail`
    #[must_use]
    pub fn detail_points(&self) -> f64 {
        self.stories_detail.iter().map(|d| d.story_points).sum()
    }

    /// Recompute `sum_story_points` from `stories_detail`
    pub fn recompute_sum(&mut self) {
        self.sum_story_points = self.detail_points();
    }
}
