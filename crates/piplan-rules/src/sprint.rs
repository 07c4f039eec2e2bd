//! Sprint name canonicalization
//!
//! The backend encodes sprint membership as serialized blobs
//! (`...Sprint@1a2b[id=7,state=ACTIVE,name=PI25w10 Sprint 2,...]`), as sprint
//! objects, as lists of either, or not at all. [`canonicalize`] reduces any of
//! these to a `"Sprint N"` label plus a flag telling whether the entry belongs
//! to the requested program interval.
//!
//! Extraction is best-effort: anything unparsable yields no label, which the
//! engine files under "No Sprint".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys probed, in order, for a sprint name on a structured entry
const NAME_KEYS: [&str; 3] = ["name", "sprintName", "value"];

/// `name=` member of a serialized sprint blob; stops at the next comma
static NAME_MEMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"name=([^,\]]*)").expect("static regex"));

/// `Sprint 7`, `sprint-07`, `Sprint#7`; digits must not run into letters
static SPRINT_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)sprint[\s_\-:#.]*(\d+)(?:[^0-9a-z]|$)").expect("static regex")
});

/// `S7`, `S-07`, as a standalone token
static SPRINT_ABBREV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z])S[\s_\-]?(\d+)(?:[^0-9A-Za-z]|$)").expect("static regex")
});

/// Two digits, `w`, two digits (`25w10`)
static PI_WEEK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d{2}w\d{2})").expect("static regex"));

/// Short program-interval token matched against sprint names
///
/// Derived from a fix-version label: `PI_25w10` → `25w10`. Labels without the
/// week pattern fall back to the whole label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PiToken(String);

impl PiToken {
    /// Derive token from a fix-version label
    #[must_use]
    pub fn from_fix_version(label: &str) -> Self {
        let token = PI_WEEK
            .captures(label)
            .and_then(|c| c.get(1))
            .map_or_else(|| label.trim(), |m| m.as_str());
        Self(token.to_lowercase())
    }

    /// Token text (lower-case)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive substring match; an empty token matches nothing
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        !self.0.is_empty() && text.to_lowercase().contains(&self.0)
    }
}

impl std::fmt::Display for PiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of canonicalizing one raw sprint value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalSprint {
    /// `"Sprint N"`, if a sprint number was found
    pub label: Option<String>,
    /// Whether the sprint name contains the PI token
    pub matches_pi: bool,
}

impl CanonicalSprint {
    /// Nothing recognised
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Label, if the entry both parsed and belongs to the interval
    #[inline]
    #[must_use]
    pub fn matching_label(&self) -> Option<&str> {
        self.label.as_deref().filter(|_| self.matches_pi)
    }
}

/// Canonical bucket label for a sprint number
#[inline]
#[must_use]
pub fn canonical_label(number: u64) -> String {
    format!("Sprint {number}")
}

/// Canonicalize a raw sprint value against a PI token
///
/// - null → nothing
/// - list → first entry matching the PI; else the first entry that parsed
///   (as non-matching); else nothing
/// - object → recurse on its first name-bearing member
/// - string → `name=` member (or the whole string) is the sprint name; it
///   matches when it contains `pi_token`, case-insensitively
#[must_use]
pub fn canonicalize(raw: &Value, pi_token: &str) -> CanonicalSprint {
    match raw {
        Value::String(text) => canonicalize_text(text, pi_token),
        Value::Array(entries) => {
            let mut fallback: Option<String> = None;
            for entry in entries {
                let result = canonicalize(entry, pi_token);
                if result.matches_pi {
                    return result;
                }
                if fallback.is_none() {
                    fallback = result.label;
                }
            }
            CanonicalSprint {
                label: fallback,
                matches_pi: false,
            }
        }
        Value::Object(map) => NAME_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map_or_else(CanonicalSprint::none, |name| canonicalize_text(name, pi_token)),
        _ => CanonicalSprint::none(),
    }
}

fn canonicalize_text(text: &str, pi_token: &str) -> CanonicalSprint {
    let name = NAME_MEMBER
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or(text, |m| m.as_str())
        .trim();

    let token = pi_token.trim().to_lowercase();
    let matches_pi = !token.is_empty() && name.to_lowercase().contains(&token);

    CanonicalSprint {
        label: sprint_number(name).map(canonical_label),
        matches_pi,
    }
}

fn sprint_number(name: &str) -> Option<u64> {
    SPRINT_WORD
        .captures(name)
        .or_else(|| SPRINT_ABBREV.captures(name))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}
