//! Tagged view over a single backend field value
//!
//! The backend returns the same logical field as a string, a number, a
//! structured reference object or a list depending on the instance and field
//! configuration. [`FieldShape`] names those shapes once so callers coerce
//! through a fixed set of functions instead of branching on raw JSON.

use serde_json::{Map, Value};

/// Keys conventionally carrying a display name on a reference object
const DISPLAY_KEYS: [&str; 3] = ["name", "displayName", "value"];

/// Shape of one field value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldShape<'a> {
    /// Field missing or null
    Absent,
    /// Scalar string
    Text(&'a str),
    /// Scalar number
    Number(f64),
    /// Scalar boolean
    Flag(bool),
    /// Structured reference (`{"key": ..., "name": ...}` and similar)
    Reference(&'a Map<String, Value>),
    /// List of values
    List(&'a [Value]),
}

impl<'a> FieldShape<'a> {
    /// Classify an optional raw value
    #[must_use]
    pub fn of(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => Self::Text(s),
            Some(Value::Number(n)) => n.as_f64().map_or(Self::Absent, Self::Number),
            Some(Value::Bool(b)) => Self::Flag(*b),
            Some(Value::Object(map)) => Self::Reference(map),
            Some(Value::Array(items)) => Self::List(items),
        }
    }

    /// Check if the field carries no value
    #[inline]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Scalar string, if the field is text
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(*s),
            _ => None,
        }
    }

    /// Numeric value; numeric strings are parsed, non-finite values rejected
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Issue key carried by this field
    ///
    /// A plain string is taken as the key itself; a reference contributes its
    /// `key` member.
    #[must_use]
    pub fn reference_key(&self) -> Option<&'a str> {
        let key = match self {
            Self::Text(s) => *s,
            Self::Reference(map) => map.get("key")?.as_str()?,
            _ => return None,
        };
        let key = key.trim();
        (!key.is_empty()).then_some(key)
    }

    /// Display string: text as-is, or the first display-bearing member of a
    /// reference
    #[must_use]
    pub fn display(&self) -> Option<&'a str> {
        match self {
            Self::Text(s) => Some(*s),
            Self::Reference(map) => DISPLAY_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str)),
            _ => None,
        }
    }

    /// Items of a list field; scalars and references count as a single item
    #[must_use]
    pub fn items(&self) -> Vec<FieldShape<'a>> {
        match self {
            Self::Absent => Vec::new(),
            Self::List(items) => items.iter().map(|v| FieldShape::of(Some(v))).collect(),
            other => vec![*other],
        }
    }
}
