//! Backend-specific field identifiers
//!
//! Custom program-management fields (sprint, PI scope, story points,
//! capability and epic links) have instance-specific ids. Every id is
//! configurable; the defaults match a typical on-premise tracker.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

/// Field identifiers used to read attributes from a raw issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    /// Issue type reference (`{"name": ..., "id": ...}`)
    pub issue_type: String,
    /// Summary text
    pub summary: String,
    /// Status reference
    pub status: String,
    /// Priority reference
    pub priority: String,
    /// Assignee reference
    pub assignee: String,
    /// Fix-version list
    pub fix_versions: String,
    /// Label list
    pub labels: String,
    /// Relationship links
    pub issue_links: String,
    /// Generic parent reference
    pub parent: String,
    /// Dedicated linked-epic field
    pub epic_link: String,
    /// Link to the owning capability
    pub capability_link: String,
    /// Story-point estimate
    pub story_points: String,
    /// PI-scope selection (committed, uncommitted, ...)
    pub pi_scope: String,
    /// Fields carrying sprint membership, read in order
    pub sprints: Vec<String>,
    /// JQL clause name of the work-group field
    pub work_group_clause: String,
    /// Issue type ids treated as Feature regardless of type name
    pub feature_type_ids: Vec<String>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            issue_type: "issuetype".to_string(),
            summary: "summary".to_string(),
            status: "status".to_string(),
            priority: "priority".to_string(),
            assignee: "assignee".to_string(),
            fix_versions: "fixVersions".to_string(),
            labels: "labels".to_string(),
            issue_links: "issuelinks".to_string(),
            parent: "parent".to_string(),
            epic_link: "customfield_10101".to_string(),
            capability_link: "customfield_12600".to_string(),
            story_points: "customfield_10106".to_string(),
            pi_scope: "customfield_13100".to_string(),
            sprints: vec!["customfield_10105".to_string()],
            work_group_clause: "Leading Work Group".to_string(),
            feature_type_ids: vec!["10400".to_string()],
        }
    }
}

impl FieldSchema {
    /// Create schema with default field ids
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With story-point field id
    #[inline]
    #[must_use]
    pub fn with_story_points(mut self, id: impl Into<String>) -> Self {
        self.story_points = id.into();
        self
    }

    /// With sprint field ids
    #[inline]
    #[must_use]
    pub fn with_sprints<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sprints = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Check that every field id is usable
    ///
    /// # Errors
    /// - `SchemaError::EmptyFieldId` for a blank id
    /// - `SchemaError::NoSprintFields` when no sprint field is configured
    pub fn validate(&self) -> Result<(), SchemaError> {
        let named = [
            ("issue_type", &self.issue_type),
            ("summary", &self.summary),
            ("status", &self.status),
            ("priority", &self.priority),
            ("assignee", &self.assignee),
            ("fix_versions", &self.fix_versions),
            ("labels", &self.labels),
            ("issue_links", &self.issue_links),
            ("parent", &self.parent),
            ("epic_link", &self.epic_link),
            ("capability_link", &self.capability_link),
            ("story_points", &self.story_points),
            ("pi_scope", &self.pi_scope),
            ("work_group_clause", &self.work_group_clause),
        ];
        if let Some((name, _)) = named.iter().find(|(_, id)| id.trim().is_empty()) {
            return Err(SchemaError::EmptyFieldId(*name));
        }
        if self.sprints.is_empty() {
            return Err(SchemaError::NoSprintFields);
        }
        if self.sprints.iter().any(|id| id.trim().is_empty()) {
            return Err(SchemaError::EmptyFieldId("sprints"));
        }
        Ok(())
    }

    /// Field ids to request for hierarchy aggregation
    #[must_use]
    pub fn hierarchy_fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.issue_type.clone(),
            self.summary.clone(),
            self.status.clone(),
            self.priority.clone(),
            self.assignee.clone(),
            self.fix_versions.clone(),
            self.issue_links.clone(),
            self.parent.clone(),
            self.epic_link.clone(),
            self.capability_link.clone(),
            self.story_points.clone(),
            self.pi_scope.clone(),
        ];
        fields.extend(self.sprints.iter().cloned());
        fields
    }

    /// Field ids to request for the flat labelled issue list
    #[must_use]
    pub fn listing_fields(&self) -> Vec<String> {
        vec![
            self.summary.clone(),
            self.status.clone(),
            self.fix_versions.clone(),
            self.labels.clone(),
            self.issue_links.clone(),
        ]
    }
}
