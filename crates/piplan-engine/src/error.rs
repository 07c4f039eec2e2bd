//! Error types for the aggregation engine
//!
//! Backend failures never appear here: they degrade into partial results
//! inside the client. Only caller input and the per-call deadline fail a run.

use std::time::Duration;

/// Engine entry-point errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Required argument missing or blank
    #[error("invalid input: {0} must not be empty")]
    InvalidInput(&'static str),

    /// Call exceeded the configured deadline
    #[error("aggregation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Trimmed, non-empty argument
pub(crate) fn required<'a>(name: &'static str, value: &'a str) -> EngineResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EngineError::InvalidInput(name))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_arguments_are_rejected() {
        assert_eq!(required("work_group", "  "), Err(EngineError::InvalidInput("work_group")));
        assert_eq!(required("work_group", " WG "), Ok("WG"));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            EngineError::InvalidInput("fix_version").to_string(),
            "invalid input: fix_version must not be empty"
        );
        assert_eq!(
            EngineError::Timeout(Duration::from_secs(2)).to_string(),
            "aggregation timed out after 2s"
        );
    }
}
