//! PI Planning Rules
//!
//! Pure, deterministic rules applied by the aggregation engine:
//!
//! - **Sprint canonicalization**: free-form sprint encodings → `"Sprint N"`
//!   plus a program-interval match flag
//! - **Parent resolution**: child issue → owning Feature/Epic key through a
//!   fixed priority chain
//! - **Label statistics**: label → class folding and occurrence counts
//! - **Planning filters**: assignee exclusion and committed/backlog partition
//!
//! No rule performs I/O or keeps state between calls.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod labels;
pub mod parent;
pub mod planning;
pub mod sprint;

pub use labels::{class_counts, label_class, label_classes, FlatIssue, HOUSEKEEPING_LABELS};
pub use parent::{KnownParents, ParentResolver, Resolution, ResolvedVia};
pub use planning::{
    exclude_assignees, parse_excluded_list, partition_rows, Partition, SPRINT_COLUMNS,
};
pub use sprint::{canonical_label, canonicalize, CanonicalSprint, PiToken};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
