//! Null-safe typed reads from raw issues
//!
//! Every accessor coerces with a default: strings default to empty, numbers
//! to `0.0`, structured values to `None` or an empty collection.

use crate::issue::{IssueKind, LinkTarget, RawIssue};
use crate::schema::FieldSchema;
use crate::shape::FieldShape;
use indexmap::IndexSet;
use serde_json::Value;

/// Reads typed values from raw issues according to a [`FieldSchema`]
#[derive(Debug, Clone, Copy)]
pub struct FieldExtractor<'s> {
    schema: &'s FieldSchema,
}

impl<'s> FieldExtractor<'s> {
    /// Create extractor over schema
    #[inline]
    #[must_use]
    pub fn new(schema: &'s FieldSchema) -> Self {
        Self { schema }
    }

    /// Schema in use
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &'s FieldSchema {
        self.schema
    }

    /// Shape of a field on an issue
    #[inline]
    #[must_use]
    pub fn shape<'a>(&self, issue: &'a RawIssue, id: &str) -> FieldShape<'a> {
        FieldShape::of(issue.field(id))
    }

    fn display(&self, issue: &RawIssue, id: &str) -> String {
        self.shape(issue, id)
            .display()
            .map(str::to_string)
            .unwrap_or_default()
    }

    /// Planning role from the issue type field
    #[must_use]
    pub fn kind(&self, issue: &RawIssue) -> IssueKind {
        let shape = self.shape(issue, &self.schema.issue_type);
        let (name, id) = match shape {
            FieldShape::Reference(map) => (
                map.get("name").and_then(Value::as_str).unwrap_or_default(),
                map.get("id").and_then(Value::as_str),
            ),
            FieldShape::Text(name) => (name, None),
            _ => ("", None),
        };
        IssueKind::classify(name, id, &self.schema.feature_type_ids)
    }

    /// Issue type name as declared
    #[must_use]
    pub fn type_name(&self, issue: &RawIssue) -> String {
        self.display(issue, &self.schema.issue_type)
    }

    /// Summary text
    #[must_use]
    pub fn summary(&self, issue: &RawIssue) -> String {
        self.display(issue, &self.schema.summary)
    }

    /// Status name
    #[must_use]
    pub fn status(&self, issue: &RawIssue) -> String {
        self.display(issue, &self.schema.status)
    }

    /// Priority name
    #[must_use]
    pub fn priority(&self, issue: &RawIssue) -> String {
        self.display(issue, &self.schema.priority)
    }

    /// Assignee display name
    #[must_use]
    pub fn assignee(&self, issue: &RawIssue) -> String {
        self.display(issue, &self.schema.assignee)
    }

    /// PI-scope selection value
    #[must_use]
    pub fn pi_scope(&self, issue: &RawIssue) -> String {
        let shape = self.shape(issue, &self.schema.pi_scope);
        match shape {
            // multi-select custom fields arrive as lists of options
            FieldShape::List(_) => shape
                .items()
                .iter()
                .find_map(FieldShape::display)
                .map(str::to_string)
                .unwrap_or_default(),
            other => other.display().map(str::to_string).unwrap_or_default(),
        }
    }

    /// Story-point estimate, `0.0` when missing or unparseable
    #[must_use]
    pub fn story_points(&self, issue: &RawIssue) -> f64 {
        self.shape(issue, &self.schema.story_points)
            .number()
            .unwrap_or(0.0)
    }

    /// Fix-version names in declaration order
    #[must_use]
    pub fn fix_versions(&self, issue: &RawIssue) -> IndexSet<String> {
        self.shape(issue, &self.schema.fix_versions)
            .items()
            .iter()
            .filter_map(FieldShape::display)
            .map(str::to_string)
            .collect()
    }

    /// Check if the issue declares a fix version
    #[must_use]
    pub fn declares_fix_version(&self, issue: &RawIssue, fix_version: &str) -> bool {
        self.fix_versions(issue).contains(fix_version)
    }

    /// Labels, verbatim
    #[must_use]
    pub fn labels(&self, issue: &RawIssue) -> Vec<String> {
        self.shape(issue, &self.schema.labels)
            .items()
            .iter()
            .filter_map(FieldShape::text)
            .map(str::to_string)
            .collect()
    }

    /// Key of the owning capability
    #[must_use]
    pub fn capability_key(&self, issue: &RawIssue) -> Option<String> {
        self.shape(issue, &self.schema.capability_link)
            .reference_key()
            .map(str::to_string)
    }

    /// Raw sprint entries across all configured sprint fields
    ///
    /// List fields contribute one entry per element; nulls are skipped.
    #[must_use]
    pub fn sprint_entries<'a>(&self, issue: &'a RawIssue) -> Vec<&'a Value> {
        self.schema
            .sprints
            .iter()
            .filter_map(|id| issue.field(id))
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().collect::<Vec<_>>(),
                other => vec![other],
            })
            .filter(|v| !v.is_null())
            .collect()
    }

    /// Relationship link targets in link order
    ///
    /// Each link contributes its inward or outward issue, whichever is present.
    #[must_use]
    pub fn links(&self, issue: &RawIssue) -> Vec<LinkTarget> {
        self.shape(issue, &self.schema.issue_links)
            .items()
            .iter()
            .filter_map(|link| match link {
                FieldShape::Reference(map) => map
                    .get("inwardIssue")
                    .or_else(|| map.get("outwardIssue")),
                _ => None,
            })
            .filter_map(link_target)
            .collect()
    }
}

/// Build link target from an embedded issue reference
fn link_target(value: &Value) -> Option<LinkTarget> {
    let key = value.get("key")?.as_str()?.to_string();
    let issue_type = value.get("fields").and_then(|f| f.get("issuetype"));
    Some(LinkTarget {
        key,
        type_name: issue_type
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        type_id: issue_type
            .and_then(|t| t.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn story() -> RawIssue {
        let schema = FieldSchema::default();
        RawIssue::new("STORY-1")
            .with_field(&schema.issue_type, json!({"name": "Story", "id": "10001"}))
            .with_field(&schema.status, json!({"name": "In Progress"}))
            .with_field(&schema.priority, json!({"name": "High"}))
            .with_field(&schema.assignee, json!({"displayName": "Doe, Jane"}))
            .with_field(&schema.story_points, json!("3"))
            .with_field(&schema.fix_versions, json!([{"name": "PI_25w10"}, {"name": "PI_25w23"}]))
            .with_field(&schema.pi_scope, json!({"value": "Committed"}))
            .with_field(&schema.capability_link, json!("CAP-9"))
            .with_field(&schema.labels, json!(["BuildIssue", "sw_core"]))
            .with_field(&schema.sprints[0], json!(["a", null, "b"]))
            .with_field(
                &schema.issue_links,
                json!([
                    {"type": {"name": "Relates"}, "outwardIssue": {"key": "FEAT-2", "fields": {"issuetype": {"name": "Feature", "id": "10400"}}}},
                    {"type": {"name": "Blocks"}, "inwardIssue": {"key": "BUG-3"}},
                    {"type": {"name": "Broken"}}
                ]),
            )
    }

    #[test]
    fn scalar_fields() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let issue = story();

        assert_eq!(fx.kind(&issue), IssueKind::Story);
        assert_eq!(fx.type_name(&issue), "Story");
        assert_eq!(fx.status(&issue), "In Progress");
        assert_eq!(fx.priority(&issue), "High");
        assert_eq!(fx.assignee(&issue), "Doe, Jane");
        assert_eq!(fx.pi_scope(&issue), "Committed");
        assert_eq!(fx.story_points(&issue), 3.0);
        assert_eq!(fx.capability_key(&issue).as_deref(), Some("CAP-9"));
    }

    #[test]
    fn collection_fields() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let issue = story();

        let versions: Vec<_> = fx.fix_versions(&issue).into_iter().collect();
        assert_eq!(versions, vec!["PI_25w10", "PI_25w23"]);
        assert!(fx.declares_fix_version(&issue, "PI_25w10"));
        assert!(!fx.declares_fix_version(&issue, "PI_26w01"));
        assert_eq!(fx.labels(&issue), vec!["BuildIssue", "sw_core"]);
        assert_eq!(fx.sprint_entries(&issue), vec![&json!("a"), &json!("b")]);
    }

    #[test]
    fn links_take_inward_or_outward() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let links = fx.links(&story());

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].key, "FEAT-2");
        assert_eq!(links[0].type_name.as_deref(), Some("Feature"));
        assert_eq!(links[0].type_id.as_deref(), Some("10400"));
        assert_eq!(links[1].key, "BUG-3");
        assert_eq!(links[1].type_name, None);
    }

    #[test]
    fn malformed_values_default() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let issue = RawIssue::new("X-1")
            .with_field(&schema.story_points, json!({"unexpected": true}))
            .with_field(&schema.status, json!(42))
            .with_field(&schema.fix_versions, Value::Null)
            .with_field(&schema.issue_links, json!("not a list"));

        assert_eq!(fx.story_points(&issue), 0.0);
        assert_eq!(fx.status(&issue), "");
        assert!(fx.fix_versions(&issue).is_empty());
        assert!(fx.links(&issue).is_empty());
        assert_eq!(fx.kind(&issue), IssueKind::Other);
        assert!(fx.sprint_entries(&issue).is_empty());
    }

    #[test]
    fn pi_scope_from_option_list() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let issue = RawIssue::new("F-1").with_field(&schema.pi_scope, json!([{"value": "Uncommitted"}]));
        assert_eq!(fx.pi_scope(&issue), "Uncommitted");
    }
}
