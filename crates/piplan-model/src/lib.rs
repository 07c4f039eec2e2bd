//! PI Planning Model
//!
//! Typed views over the loosely-typed issue records returned by the ticketing
//! backend, and the rows the aggregation produces from them.
//!
//! # Architecture
//!
//! ```text
//! RawIssue ──► FieldShape (per field) ──► FieldExtractor ──► ParentRow / StoryDetail
//!                   ▲
//!              FieldSchema (backend-specific field ids)
//! ```
//!
//! Nothing in this crate performs I/O. Malformed field values are coerced to
//! defaults and never produce errors.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod extract;
pub mod issue;
pub mod row;
pub mod schema;
pub mod shape;

pub use error::SchemaError;
pub use extract::FieldExtractor;
pub use issue::{IssueKind, LinkTarget, RawIssue};
pub use row::{ParentRow, SprintBuckets, StoryDetail, NO_SPRINT};
pub use schema::FieldSchema;
pub use shape::FieldShape;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with issue records
    pub use crate::extract::FieldExtractor;
    pub use crate::issue::{IssueKind, LinkTarget, RawIssue};
    pub use crate::row::{ParentRow, StoryDetail, NO_SPRINT};
    pub use crate::schema::FieldSchema;
    pub use crate::shape::FieldShape;
}
