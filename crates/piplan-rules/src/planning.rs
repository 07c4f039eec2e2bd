//! Planning-view filters over aggregated rows
//!
//! - assignee exclusion (drop stories and rows owned by excluded people)
//! - committed/backlog partition for a selected program interval

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use piplan_model::{ParentRow, NO_SPRINT};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Sprint columns of the planning board, in display order
pub const SPRINT_COLUMNS: [&str; 6] = [
    "Sprint 1", "Sprint 2", "Sprint 3", "Sprint 4", "Sprint 5", NO_SPRINT,
];

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)""#).expect("static regex"));
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"<<Q(\d+)>>").expect("static regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;\n|]+").expect("static regex"));

/// Lower-case and collapse whitespace
fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse a free-form list of assignee names
///
/// Accepted forms:
/// - `;`, `|` or newline separated names
/// - `"Last, First"` quoted names (commas inside quotes are kept)
/// - bare `Last, First, Last, First` pairs (even number of comma parts)
///
/// Names are normalized (lower-case, single spaces).
#[must_use]
pub fn parse_excluded_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut quoted: Vec<String> = Vec::new();
    let masked = QUOTED
        .replace_all(raw, |caps: &regex::Captures<'_>| {
            quoted.push(caps[1].trim().to_string());
            format!("<<Q{}>>", quoted.len() - 1)
        })
        .into_owned();

    let items: Vec<String> = if SEPARATORS.is_match(&masked) {
        SEPARATORS
            .split(&masked)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    } else if masked.contains(',') {
        let parts: Vec<&str> = masked
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() % 2 == 0 {
            parts
                .chunks(2)
                .map(|pair| format!("{}, {}", pair[0], pair[1]))
                .collect()
        } else {
            vec![masked.clone()]
        }
    } else {
        vec![masked.clone()]
    };

    items
        .iter()
        .map(|item| {
            PLACEHOLDER
                .replace_all(item, |caps: &regex::Captures<'_>| {
                    caps[1]
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| quoted.get(i).cloned())
                        .unwrap_or_default()
                })
                .into_owned()
        })
        .map(|item| normalize(&item))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Remove excluded assignees' work from the rows
///
/// Per row: stories whose assignee is excluded leave `stories_detail`,
/// `sum_story_points` is recomputed from what remains, and sprint buckets
/// drop those keys (keys without a known assignee stay). Rows whose own
/// assignee is excluded are removed. An empty exclusion set changes nothing.
pub fn exclude_assignees(rows: &mut IndexMap<String, ParentRow>, excluded: &[String]) {
    let excluded: HashSet<String> = excluded.iter().map(|n| normalize(n)).collect();
    if excluded.is_empty() {
        return;
    }

    rows.retain(|_, row| !excluded.contains(&normalize(&row.assignee)));

    for row in rows.values_mut() {
        let by_key: HashMap<String, String> = row
            .stories_detail
            .iter()
            .map(|d| (d.key.clone(), normalize(&d.assignee)))
            .collect();

        row.stories_detail
            .retain(|d| !excluded.contains(&normalize(&d.assignee)));
        row.recompute_sum();

        for keys in row.sprints.values_mut() {
            keys.retain(|k| match by_key.get(k) {
                Some(who) if !who.is_empty() => !excluded.contains(who),
                _ => true,
            });
        }
    }
}

/// Rows split for one program interval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    /// Committed to the interval
    pub committed: IndexMap<String, ParentRow>,
    /// Not committed and not done
    pub backlog: IndexMap<String, ParentRow>,
}

/// Split rows into committed and backlog for `fix_version`
///
/// Committed: PI scope starts with "committed" and the row either declares
/// `fix_version` or has attached stories. Everything else not in status
/// "done" is backlog; done rows are dropped.
#[must_use]
pub fn partition_rows(rows: IndexMap<String, ParentRow>, fix_version: &str) -> Partition {
    let mut partition = Partition::default();
    for (key, row) in rows {
        let committed_scope = row.pi_scope.trim().to_lowercase().starts_with("committed");
        let in_pi = row.fix_versions.contains(fix_version);
        let has_stories = !row.stories_detail.is_empty();

        if committed_scope && (in_pi || has_stories) {
            partition.committed.insert(key, row);
        } else if !row.status.trim().eq_ignore_ascii_case("done") {
            partition.backlog.insert(key, row);
        }
    }
    partition
}
