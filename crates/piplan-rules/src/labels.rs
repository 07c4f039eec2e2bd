//! Label classification for fault-report statistics
//!
//! Labels are lower-cased and folded to a class made of at most their first
//! two underscore-delimited segments (`buildissue_sw_core` → `buildissue_sw`).
//! Housekeeping labels never count.

use piplan_model::{FieldExtractor, RawIssue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels used to select issues, excluded from classes and counts
///
/// `internla_dev` is a misspelling present on real issues.
pub const HOUSEKEEPING_LABELS: [&str; 3] = ["buildissue", "internal_dev", "internla_dev"];

/// Fold one label into its class
#[must_use]
pub fn label_class(label: &str) -> String {
    let parts: Vec<&str> = label.splitn(3, '_').collect();
    if parts.len() > 1 {
        parts[..2].join("_")
    } else {
        label.to_string()
    }
}

/// Classes of a label list, housekeeping classes removed
#[must_use]
pub fn label_classes(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| label_class(&l.to_lowercase()))
        .filter(|class| !HOUSEKEEPING_LABELS.contains(&class.as_str()))
        .collect()
}

/// Count class occurrences across issues
#[must_use]
pub fn class_counts<'a, I>(issues: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a FlatIssue>,
{
    let mut counts = BTreeMap::new();
    for class in issues.into_iter().flat_map(|i| i.classes.iter()) {
        *counts.entry(class.clone()).or_insert(0) += 1;
    }
    counts
}

/// Flat, label-centric view of one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatIssue {
    /// Issue key
    pub key: String,
    /// Summary text
    pub summary: String,
    /// Status name
    pub status: String,
    /// Lower-cased labels
    pub labels: Vec<String>,
    /// Label classes without housekeeping labels
    pub classes: Vec<String>,
    /// Linked Feature issues (browse URLs when a browse base is given)
    pub linked_features: Vec<String>,
}

impl FlatIssue {
    /// Build from a raw issue
    ///
    /// Only link targets whose type id is in the schema's feature-type
    /// allowlist are listed.
    #[must_use]
    pub fn from_issue(issue: &RawIssue, fx: &FieldExtractor<'_>, browse_base: Option<&str>) -> Self {
        let labels = fx.labels(issue);
        let feature_ids = &fx.schema().feature_type_ids;
        let linked_features = fx
            .links(issue)
            .into_iter()
            .filter(|l| {
                l.type_id
                    .as_deref()
                    .is_some_and(|id| feature_ids.iter().any(|f| f == id))
            })
            .map(|l| match browse_base {
                Some(base) => format!("{}/{}", base.trim_end_matches('/'), l.key),
                None => l.key,
            })
            .collect();

        Self {
            key: issue.key.clone(),
            summary: fx.summary(issue),
            status: fx.status(issue),
            classes: label_classes(&labels),
            labels: labels.iter().map(|l| l.to_lowercase()).collect(),
            linked_features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use piplan_model::FieldSchema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn class_keeps_two_segments() {
        assert_eq!(label_class("buildissue_sw_core"), "buildissue_sw");
        assert_eq!(label_class("sw_core"), "sw_core");
        assert_eq!(label_class("a_b_c_d"), "a_b");
        assert_eq!(label_class("timing"), "timing");
    }

    #[test]
    fn classes_drop_housekeeping() {
        let classes = label_classes(&strings(&["BuildIssue", "Internal_Dev", "internla_dev", "Timing", "SW_Core_X"]));
        assert_eq!(classes, strings(&["timing", "sw_core"]));
    }

    #[test]
    fn counts_across_issues() {
        let issue = |key: &str, classes: &[&str]| FlatIssue {
            key: key.to_string(),
            summary: String::new(),
            status: String::new(),
            labels: Vec::new(),
            classes: strings(classes),
            linked_features: Vec::new(),
        };
        let issues = vec![issue("A", &["timing", "sw_core"]), issue("B", &["timing"])];
        let counts = class_counts(&issues);

        assert_eq!(counts.get("timing"), Some(&2));
        assert_eq!(counts.get("sw_core"), Some(&1));
        assert!(HOUSEKEEPING_LABELS.iter().all(|l| !counts.contains_key(*l)));
    }

    #[test]
    fn flat_issue_from_raw() {
        let schema = FieldSchema::default();
        let fx = FieldExtractor::new(&schema);
        let raw = RawIssue::new("FR-1")
            .with_field(&schema.summary, json!("Build breaks"))
            .with_field(&schema.status, json!({"name": "Open"}))
            .with_field(&schema.labels, json!(["BuildIssue", "Internal_Dev", "BuildIssue_SW_Core"]))
            .with_field(
                &schema.issue_links,
                json!([
                    {"outwardIssue": {"key": "FEAT-1", "fields": {"issuetype": {"id": "10400", "name": "Feature"}}}},
                    {"inwardIssue": {"key": "EPIC-2", "fields": {"issuetype": {"id": "10000", "name": "Epic"}}}}
                ]),
            );

        let flat = FlatIssue::from_issue(&raw, &fx, Some("https://tracker.example/browse/"));
        assert_eq!(flat.status, "Open");
        assert_eq!(flat.labels, strings(&["buildissue", "internal_dev", "buildissue_sw_core"]));
        assert_eq!(flat.classes, strings(&["buildissue_sw"]));
        assert_eq!(flat.linked_features, strings(&["https://tracker.example/browse/FEAT-1"]));

        let bare = FlatIssue::from_issue(&raw, &fx, None);
        assert_eq!(bare.linked_features, strings(&["FEAT-1"]));
    }
}
