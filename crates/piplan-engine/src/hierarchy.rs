//! Hierarchy assembly
//!
//! [`HierarchyBuilder`] holds the row mapping for one aggregation run and
//! applies the passes in order:
//!
//! 1. [`seed_all`](HierarchyBuilder::seed_all): Feature/Epic rows, first write wins
//! 2. [`plan_children`](HierarchyBuilder::plan_children): scope and queue
//!    children
//! 3. [`resolve_round`](HierarchyBuilder::resolve_round) until it reports no
//!    missing parents, with [`seed_side_loaded`](HierarchyBuilder::seed_side_loaded)
//!    for each fetched parent in between, then
//!    [`attach_pending`](HierarchyBuilder::attach_pending)
//! 4. [`recanonicalize`](HierarchyBuilder::recanonicalize): merge bucket keys
//!    that normalize to the same label
//!
//! The builder does no I/O; fetching missing parents and capability summaries
//! is left to the engine.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use piplan_model::{FieldExtractor, FieldSchema, ParentRow, RawIssue, SprintBuckets, StoryDetail, NO_SPRINT};
use piplan_rules::{canonicalize, ParentResolver, PiToken, ResolvedVia};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};

/// Which program intervals a run covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One interval, identified by its fix-version label
    Interval {
        /// Fix-version label (`PI_25w10`)
        fix_version: String,
        /// Token matched against sprint names
        token: PiToken,
    },
    /// Every interval (backlog view)
    AllIntervals,
}

impl Scope {
    /// Scope for one fix version
    #[must_use]
    pub fn interval(fix_version: &str) -> Self {
        Self::Interval {
            fix_version: fix_version.to_string(),
            token: PiToken::from_fix_version(fix_version),
        }
    }

    /// Fix version of an interval scope
    #[must_use]
    pub fn fix_version(&self) -> Option<&str> {
        match self {
            Self::Interval { fix_version, .. } => Some(fix_version),
            Self::AllIntervals => None,
        }
    }
}

/// Aggregated planning view for one work group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    /// Interval the view covers; none for the backlog view
    pub fix_version: Option<String>,
    /// Snapshot time
    pub generated_at: DateTime<Utc>,
    /// Search hit the result cap
    pub truncated: bool,
    /// A search page failed and results stopped early
    pub partial: bool,
    /// Feature/Epic rows in seed order
    pub rows: IndexMap<String, ParentRow>,
    /// In-scope children that could not be attached to any row
    pub unattached: Vec<String>,
}

impl Hierarchy {
    /// Row for a parent key
    #[must_use]
    pub fn row(&self, key: &str) -> Option<&ParentRow> {
        self.rows.get(key)
    }

    /// Check if the view may be missing issues
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.truncated || self.partial
    }
}

/// In-scope child waiting for parent resolution
#[derive(Debug, Clone)]
struct QueuedChild {
    issue: RawIssue,
    buckets: Vec<String>,
}

/// Resolved child waiting for attachment
#[derive(Debug, Clone)]
struct PendingChild {
    parent: Option<String>,
    detail: StoryDetail,
    buckets: Vec<String>,
}

/// Row mapping under construction for one run
#[derive(Debug)]
pub struct HierarchyBuilder<'s> {
    fx: FieldExtractor<'s>,
    resolver: ParentResolver<'s>,
    scope: Scope,
    rows: IndexMap<String, ParentRow>,
    seen_children: HashSet<String>,
    requested: HashSet<String>,
    queued: VecDeque<QueuedChild>,
    pending: Vec<PendingChild>,
    unattached: Vec<String>,
}

impl<'s> HierarchyBuilder<'s> {
    /// Create empty builder
    #[must_use]
    pub fn new(schema: &'s FieldSchema, scope: Scope) -> Self {
        Self {
            fx: FieldExtractor::new(schema),
            resolver: ParentResolver::new(schema),
            scope,
            rows: IndexMap::new(),
            seen_children: HashSet::new(),
            requested: HashSet::new(),
            queued: VecDeque::new(),
            pending: Vec::new(),
            unattached: Vec::new(),
        }
    }

    /// Rows seeded so far
    #[must_use]
    pub fn rows(&self) -> &IndexMap<String, ParentRow> {
        &self.rows
    }

    /// Seed a row from a search result
    ///
    /// Requires a Feature/Epic that declares the scope's fix version (any
    /// Feature/Epic in the all-intervals scope). Returns `false` when the
    /// issue does not qualify or its key is already seeded.
    pub fn seed(&mut self, issue: &RawIssue) -> bool {
        if !self.fx.kind(issue).is_parent() {
            return false;
        }
        let admitted = match &self.scope {
            Scope::Interval { fix_version, .. } => self.fx.declares_fix_version(issue, fix_version),
            Scope::AllIntervals => true,
        };
        admitted && self.insert_row(&issue.key, issue)
    }

    /// Seed every qualifying issue; returns the number of new rows
    pub fn seed_all(&mut self, issues: &[RawIssue]) -> usize {
        issues.iter().filter(|issue| self.seed(issue)).count()
    }

    /// Seed a parent fetched outside the original result set
    ///
    /// Only the type is checked. The row is keyed by the key children
    /// resolved to.
    pub fn seed_side_loaded(&mut self, key: &str, issue: &RawIssue) -> bool {
        self.fx.kind(issue).is_parent() && self.insert_row(key, issue)
    }

    fn insert_row(&mut self, key: &str, issue: &RawIssue) -> bool {
        if self.rows.contains_key(key) {
            tracing::debug!(%key, "parent already seeded; keeping first");
            return false;
        }
        self.rows
            .insert(key.to_string(), ParentRow::from_issue(issue, &self.fx));
        true
    }

    /// Scope every child in `issues` and queue it for resolution
    ///
    /// Children keep result order; repeated keys are queued once. Returns the
    /// number of children queued.
    pub fn plan_children(&mut self, issues: &[RawIssue]) -> usize {
        let before = self.queued.len();
        for issue in issues {
            if !self.fx.kind(issue).is_child() {
                continue;
            }
            if !self.seen_children.insert(issue.key.clone()) {
                tracing::debug!(key = %issue.key, "duplicate child ignored");
                continue;
            }
            if let Some(buckets) = self.child_buckets(issue) {
                self.queued.push_back(QueuedChild {
                    issue: issue.clone(),
                    buckets,
                });
            }
        }
        self.queued.len() - before
    }

    /// Resolve queued children in order until one depends on a pending fetch
    ///
    /// A child sees the rows seeded from the result set plus every parent
    /// requested by an earlier child. When a child's links point at a parent
    /// requested in this round, resolution stops there so the caller can
    /// [`seed_side_loaded`](Self::seed_side_loaded) the batch first. Returns
    /// the parent keys to fetch; empty once every child is resolved.
    pub fn resolve_round(&mut self) -> Vec<String> {
        let mut batch = IndexSet::new();

        while let Some(child) = self.queued.front() {
            let resolution = self.resolver.resolve(&child.issue, &self.rows);
            let explicit = resolution
                .as_ref()
                .is_some_and(|r| matches!(r.via, ResolvedVia::EpicLink | ResolvedVia::ParentField));
            if !explicit
                && !batch.is_empty()
                && self.fx.links(&child.issue).iter().any(|l| batch.contains(&l.key))
            {
                tracing::debug!(child = %child.issue.key, "waiting for side-loaded parents");
                break;
            }
            let Some(child) = self.queued.pop_front() else {
                break;
            };

            let parent = resolution.map(|r| r.key);
            if let Some(key) = &parent {
                if !self.rows.contains_key(key) && self.requested.insert(key.clone()) {
                    batch.insert(key.clone());
                }
            }
            self.pending.push(PendingChild {
                parent,
                detail: StoryDetail {
                    key: child.issue.key.clone(),
                    story_points: self.fx.story_points(&child.issue),
                    assignee: self.fx.assignee(&child.issue),
                    status: self.fx.status(&child.issue),
                },
                buckets: child.buckets,
            });
        }

        batch.into_iter().collect()
    }

    /// Sprint buckets of an in-scope child; `None` when out of scope
    ///
    /// In an interval scope a child is in scope when it declares the fix
    /// version or carries a sprint entry naming the interval; only labels of
    /// such entries become buckets. In the all-intervals scope every child is
    /// in scope and every parsed label is a bucket.
    fn child_buckets(&self, issue: &RawIssue) -> Option<Vec<String>> {
        let entries = self.fx.sprint_entries(issue);
        let mut labels: Vec<String> = Vec::new();

        match &self.scope {
            Scope::Interval { fix_version, token } => {
                let mut any_match = false;
                for entry in entries {
                    let sprint = canonicalize(entry, token.as_str());
                    any_match |= sprint.matches_pi;
                    if let Some(label) = sprint.matching_label() {
                        push_unique(&mut labels, label);
                    }
                }
                (any_match || self.fx.declares_fix_version(issue, fix_version)).then_some(labels)
            }
            Scope::AllIntervals => {
                for entry in entries {
                    if let Some(label) = canonicalize(entry, "").label {
                        push_unique(&mut labels, &label);
                    }
                }
                Some(labels)
            }
        }
    }

    /// Attach queued children to their rows
    ///
    /// Children whose parent has no row are recorded as unattached.
    pub fn attach_pending(&mut self) {
        for child in std::mem::take(&mut self.pending) {
            match child.parent.as_deref().and_then(|key| self.rows.get_mut(key)) {
                Some(row) => row.attach(child.detail, &child.buckets),
                None => {
                    tracing::debug!(child = %child.detail.key, parent = ?child.parent, "child left unattached");
                    self.unattached.push(child.detail.key);
                }
            }
        }
    }

    /// Normalize every bucket key once more and merge equal labels
    ///
    /// Buckets are visited in insertion order; merged key lists keep their
    /// order and drop repeats.
    pub fn recanonicalize(&mut self) {
        for row in self.rows.values_mut() {
            let mut merged = SprintBuckets::new();
            for (label, keys) in std::mem::take(&mut row.sprints) {
                let canonical = if label == NO_SPRINT {
                    label
                } else {
                    canonicalize(&Value::String(label.clone()), "")
                        .label
                        .unwrap_or(label)
                };
                let bucket = merged.entry(canonical).or_default();
                for key in keys {
                    if !bucket.contains(&key) {
                        bucket.push(key);
                    }
                }
            }
            row.sprints = merged;
        }
    }

    /// Distinct capability keys referenced by rows, in row order
    #[must_use]
    pub fn capability_keys(&self) -> Vec<String> {
        self.rows
            .values()
            .filter_map(|row| row.parent_link.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fill `parent_summary` from looked-up capability summaries
    pub fn apply_summaries(&mut self, summaries: &HashMap<String, Option<String>>) {
        for row in self.rows.values_mut() {
            if let Some(key) = &row.parent_link {
                row.parent_summary = summaries.get(key).cloned().flatten();
            }
        }
    }

    /// Seal the run
    #[must_use]
    pub fn finish(self, truncated: bool, partial: bool) -> Hierarchy {
        Hierarchy {
            fix_version: self.scope.fix_version().map(str::to_string),
            generated_at: Utc::now(),
            truncated,
            partial,
            rows: self.rows,
            unattached: self.unattached,
        }
    }
}

fn push_unique(labels: &mut Vec<String>, label: &str) {
    if !labels.iter().any(|l| l == label) {
        labels.push(label.to_string());
    }
}
