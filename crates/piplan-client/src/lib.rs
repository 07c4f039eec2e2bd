//! PI Planning Client
//!
//! Read-only access to the ticketing backend.
//!
//! - [`IssueSource`]: the backend seam (one page, one issue)
//! - [`JiraHttpSource`]: reqwest implementation of the seam
//! - [`IssueSearchClient`]: pagination, hard cap and failure degradation
//! - [`SummaryCache`]: moka-backed per-run summary memoization

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod search;
pub mod source;

pub use cache::SummaryCache;
pub use config::{TrackerConfig, TOKEN_ENV_VAR};
pub use error::{ClientError, ConfigError};
pub use http::JiraHttpSource;
pub use search::{IssueSearchClient, SearchOutcome, DEFAULT_HARD_CAP, DEFAULT_PAGE_SIZE};
pub use source::{IssueSource, SearchPage, SearchRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
