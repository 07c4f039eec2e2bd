//! Raw issue records and their classification

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Issue record as returned by the backend
///
/// The key is globally unique and immutable. Field values are kept as raw
/// JSON; use [`FieldExtractor`](crate::FieldExtractor) to read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIssue {
    /// Issue key (`PROJ-123`)
    pub key: String,
    /// Backend-internal id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Field id → raw value
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl RawIssue {
    /// Create issue with no fields
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: None,
            fields: Map::new(),
        }
    }

    /// With field value
    #[inline]
    #[must_use]
    pub fn with_field(mut self, id: impl Into<String>, value: Value) -> Self {
        self.fields.insert(id.into(), value);
        self
    }

    /// Raw value of a field
    #[inline]
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&Value> {
        self.fields.get(id)
    }
}

/// Planning role of an issue type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Feature (parent row)
    Feature,
    /// Epic (parent row)
    Epic,
    /// Story (child)
    Story,
    /// Fault report (child)
    FaultReport,
    /// Anything else
    Other,
}

impl IssueKind {
    /// Classify by type name and optional type id
    ///
    /// Ids listed in `feature_type_ids` are Features whatever their name.
    #[must_use]
    pub fn classify(name: &str, id: Option<&str>, feature_type_ids: &[String]) -> Self {
        if id.is_some_and(|id| feature_type_ids.iter().any(|f| f == id)) {
            return Self::Feature;
        }
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "epic" => Self::Epic,
            "story" => Self::Story,
            "fault report" => Self::FaultReport,
            other if other.contains("feature") => Self::Feature,
            _ => Self::Other,
        }
    }

    /// Check if this kind seeds a parent row
    #[inline]
    #[must_use]
    pub fn is_parent(&self) -> bool {
        matches!(self, Self::Feature | Self::Epic)
    }

    /// Check if this kind rolls up under a parent
    #[inline]
    #[must_use]
    pub fn is_child(&self) -> bool {
        matches!(self, Self::Story | Self::FaultReport)
    }

    /// Display name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feature => "Feature",
            Self::Epic => "Epic",
            Self::Story => "Story",
            Self::FaultReport => "Fault Report",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of one relationship link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTarget {
    /// Linked issue key
    pub key: String,
    /// Declared issue type name of the target, if embedded
    pub type_name: Option<String>,
    /// Declared issue type id of the target, if embedded
    pub type_id: Option<String>,
}

impl LinkTarget {
    /// Check if the target is declared as a parent-level type
    #[must_use]
    pub fn is_parent_typed(&self, feature_type_ids: &[String]) -> bool {
        match &self.type_name {
            Some(name) => IssueKind::classify(name, self.type_id.as_deref(), feature_type_ids)
                .is_parent(),
            None => self
                .type_id
                .as_deref()
                .is_some_and(|id| feature_type_ids.iter().any(|f| f == id)),
        }
    }
}
