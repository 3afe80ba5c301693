//! # App Dashboard Library
//!
//! This library builds the data behind a dashboard of mobile apps. For every
//! configured GitHub repository it gathers the repository descriptor, the
//! latest release, the active milestone, recent pull requests and the App
//! Store / Google Play listings, and merges them into one record per app.
//! The `app-dashboard` binary writes those records to `apps.json`.
//!
//! ## Quick Example
//!
//! ```
//! use app_dashboard::config::{self, RepoRef};
//!
//! let config = config::parse(r#"{
//!     "repositories": [
//!         { "repository": "aill-org/tadoku-log", "platforms": ["ios"] }
//!     ]
//! }"#).unwrap();
//!
//! let repo = config.repositories[0].repo_ref().unwrap();
//! assert_eq!(repo, RepoRef::parse("aill-org/tadoku-log").unwrap());
//! assert!(RepoRef::parse("not-a-reference").is_err());
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the `config.json` schema and `owner/repo`
//!   references.
//! - **GitHub executor (`gh`)**: runs the `gh` CLI with failure
//!   classification and exponential backoff.
//! - **Sources (`sources`)**: typed accessors for repository info, releases,
//!   milestones and pull requests, plus the `SourceOperations` seam.
//! - **Stores (`stores`)**: App Store and Google Play lookups over HTTP.
//! - **Merge (`merge`)**: combines the sources into an `AppRecord`.
//! - **Batch (`batch`)**: merges every configured repository in parallel,
//!   isolating failures.
//! - **Writer (`writer`)**: persists `apps.json` atomically and verifies it.
//!
//! ## Execution Flow
//!
//! 1.  **Load** the configuration.
//! 2.  **Merge** each repository concurrently; inside each merge the sources
//!     are fetched concurrently as well.
//! 3.  **Report** the repositories that failed, keeping the others.
//! 4.  **Write** the successful records, unless this is a dry run.

pub mod batch;
pub mod config;
pub mod dates;
pub mod defaults;
pub mod error;
pub mod gh;
pub mod merge;
pub mod output;
pub mod sources;
pub mod stores;
pub mod writer;

#[cfg(test)]
mod config_proptest;
