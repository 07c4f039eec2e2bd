//! PI Planning Engine
//!
//! Reconstructs the Feature/Epic → Story/Fault Report planning hierarchy of a
//! work group from a flat, paginated issue search.
//!
//! # Architecture
//!
//! ```text
//! IssueSearchClient ──► RawIssue* ──► HierarchyBuilder ──► Hierarchy
//!        ▲                               │  ▲
//!        └──── fetch_one (side-load) ◄───┘  └── ParentResolver, canonicalize
//!        └──── SummaryCache (capability summaries)
//! ```
//!
//! # Entry points
//!
//! - [`AggregationEngine::build`]: one program interval
//! - [`AggregationEngine::build_backlog`]: all intervals
//! - [`AggregationEngine::list_issues`] / [`AggregationEngine::get_statistics`]:
//!   flat labelled fault reports and their label-class counts
//!
//! Backend failures degrade to partial results flagged on the output; the
//! only errors are blank arguments and the optional per-call deadline.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod query;

pub use config::EngineConfig;
pub use engine::AggregationEngine;
pub use error::{EngineError, EngineResult};
pub use hierarchy::{Hierarchy, HierarchyBuilder, Scope};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running aggregations
    pub use crate::config::EngineConfig;
    pub use crate::engine::AggregationEngine;
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::hierarchy::{Hierarchy, Scope};
    pub use piplan_client::{IssueSource, JiraHttpSource, TrackerConfig};
    pub use piplan_model::{FieldSchema, ParentRow, StoryDetail, NO_SPRINT};
    pub use piplan_rules::{FlatIssue, Partition};
}
