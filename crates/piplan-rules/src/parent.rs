//! Parent resolution for child work items
//!
//! Priority chain, first success wins:
//!
//! 1. dedicated linked-epic field (string, or reference with `key`)
//! 2. generic `parent` reference, unless it declares a non-parent type
//! 3. relationship links: a target already known as a parent, else the first
//!    target typed Epic/Feature
//!
//! Explicit hierarchy fields always outrank relationship links.

use indexmap::{IndexMap, IndexSet};
use piplan_model::{FieldExtractor, FieldSchema, FieldShape, IssueKind, RawIssue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Lookup of parent keys already present in the current run
pub trait KnownParents {
    /// Check if `key` is a known parent row
    fn contains_parent(&self, key: &str) -> bool;
}

impl KnownParents for IndexSet<String> {
    fn contains_parent(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl KnownParents for HashSet<String> {
    fn contains_parent(&self, key: &str) -> bool {
        self.contains(key)
    }
}

impl<V> KnownParents for IndexMap<String, V> {
    fn contains_parent(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl<V> KnownParents for HashMap<String, V> {
    fn contains_parent(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

/// Tier of the chain that produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedVia {
    /// Linked-epic field
    EpicLink,
    /// Generic parent reference
    ParentField,
    /// Relationship link to an already-known parent
    KnownLink,
    /// Relationship link to an Epic/Feature-typed issue
    TypedLink,
}

/// Resolved parent key with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Parent issue key
    pub key: String,
    /// Tier that produced it
    pub via: ResolvedVia,
}

impl Resolution {
    fn new(key: impl Into<String>, via: ResolvedVia) -> Self {
        Self {
            key: key.into(),
            via,
        }
    }
}

/// Resolves a child issue's owning Feature/Epic
#[derive(Debug, Clone, Copy)]
pub struct ParentResolver<'s> {
    fx: FieldExtractor<'s>,
}

impl<'s> ParentResolver<'s> {
    /// Create resolver over schema
    #[inline]
    #[must_use]
    pub fn new(schema: &'s FieldSchema) -> Self {
        Self {
            fx: FieldExtractor::new(schema),
        }
    }

    /// Resolve the parent key of `child`
    ///
    /// `None` means the child cannot be attached to any parent row.
    #[must_use]
    pub fn resolve<K>(&self, child: &RawIssue, known: &K) -> Option<Resolution>
    where
        K: KnownParents + ?Sized,
    {
        let resolution = self
            .from_epic_link(child)
            .or_else(|| self.from_parent_field(child))
            .or_else(|| self.from_links(child, known));

        match &resolution {
            Some(r) => tracing::debug!(child = %child.key, parent = %r.key, via = ?r.via, "parent resolved"),
            None => tracing::debug!(child = %child.key, "no parent resolved"),
        }
        resolution
    }

    fn from_epic_link(&self, child: &RawIssue) -> Option<Resolution> {
        self.fx
            .shape(child, &self.fx.schema().epic_link)
            .reference_key()
            .map(|key| Resolution::new(key, ResolvedVia::EpicLink))
    }

    fn from_parent_field(&self, child: &RawIssue) -> Option<Resolution> {
        let shape = self.fx.shape(child, &self.fx.schema().parent);
        let key = shape.reference_key()?;

        let declared = match shape {
            FieldShape::Reference(map) => map
                .get("fields")
                .and_then(|f| f.get("issuetype"))
                .map(|t| {
                    (
                        t.get("name").and_then(Value::as_str).unwrap_or_default(),
                        t.get("id").and_then(Value::as_str),
                    )
                }),
            _ => None,
        };

        // nested children point their parent at another child
        let allowed = declared.map_or(true, |(name, id)| {
            (name.is_empty() && id.is_none())
                || IssueKind::classify(name, id, &self.fx.schema().feature_type_ids).is_parent()
        });
        allowed.then(|| Resolution::new(key, ResolvedVia::ParentField))
    }

    fn from_links<K>(&self, child: &RawIssue, known: &K) -> Option<Resolution>
    where
        K: KnownParents + ?Sized,
    {
        let links = self.fx.links(child);
        if let Some(link) = links.iter().find(|l| known.contains_parent(&l.key)) {
            return Some(Resolution::new(link.key.clone(), ResolvedVia::KnownLink));
        }
        let feature_ids = &self.fx.schema().feature_type_ids;
        links
            .into_iter()
            .find(|l| l.is_parent_typed(feature_ids))
            .map(|l| Resolution::new(l.key, ResolvedVia::TypedLink))
    }
}
