//! Error types for the model crate
//!
//! Field values never fail to extract; the only fallible operation here is
//! validating a [`FieldSchema`](crate::FieldSchema) loaded from configuration.

/// Errors raised while validating a field schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// A required field identifier is empty
    #[error("field id for '{0}' must not be empty")]
    EmptyFieldId(&'static str),

    /// No sprint field configured
    #[error("at least one sprint field must be configured")]
    NoSprintFields,
}
