//! Autostale: closes pull requests that have gone quiet.
//!
//! Fetches the least recently updated open pull requests of a repository
//! over GitHub's GraphQL API, selects those inactive for longer than a
//! threshold, then comments on and closes each of them concurrently. A dry
//! run computes the same selection and report without sending mutations.

pub mod actions;
pub mod client;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod stale;
pub mod template;
pub mod triage;
pub mod types;

pub use client::{GraphQlClient, QueryError, Remote, classify_response};
pub use config::{Config, Secret, parse_args};
pub use fetch::{PAGE_SIZE, fetch_open_pull_requests};
pub use pipeline::{RunSummary, run};
pub use report::build_summary;
pub use stale::select_stale;
pub use triage::{triage, triage_all};
pub use types::{PullRequestCandidate, TriageOutcome, TriageResult};
