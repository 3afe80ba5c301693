//! # Error Handling
//!
//! This module defines the centralized error type for the `app-dashboard`
//! library. It uses `thiserror` to describe every anticipated failure mode
//! with a descriptive message.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors. Each
//!   variant carries the context needed to report the failure without a
//!   backtrace (the offending repository, the `gh` command, the stderr text).
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into a few groups:
//!
//! - Input validation (`ConfigParse`, `MissingRepository`, `InvalidRepository`),
//!   raised before any I/O.
//! - `gh` transport failures (`GhAuth`, `GhRateLimit`, `GhNetwork`,
//!   `GhCommand`, `GhSpawn`, `JsonParse`). Only rate-limit and network
//!   failures are retried by the executor.
//! - Data failures for mandatory sources (`InvalidRepositoryData`,
//!   `RepositoryAccess`).
//! - `Merge`, which wraps any failure of a single repository merge with the
//!   repository that caused it.
//! - Persistence failures (`Write`).
//! - Wrapped library errors.

use thiserror::Error;

/// Remediation hint attached to authentication failures.
pub const AUTH_HINT: &str =
    "Authentication required. Run 'gh auth login' or set GH_TOKEN before retrying.";

/// Hint attached to failures to launch the `gh` program.
pub const INSTALL_HINT: &str =
    "Install the GitHub CLI (https://cli.github.com) or point --gh at the binary.";

/// Main error type for app-dashboard operations
#[derive(Error, Debug)]
pub enum Error {
    /// The dashboard configuration file could not be parsed or is missing a
    /// required section.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A repository entry has no `repository` reference at all.
    #[error("Repository configuration with repository field is required")]
    MissingRepository,

    /// A repository reference is not of the form `owner/repo`.
    #[error("Invalid repository format: {reference}")]
    InvalidRepository { reference: String },

    /// `gh` reported an authentication failure. Never retried.
    #[error("GitHub authentication failed: {stderr}\n  hint: {}", AUTH_HINT)]
    GhAuth { stderr: String },

    /// `gh` reported that the API rate limit was exceeded.
    #[error("Rate limit exceeded{}: {stderr}", retry_after.map(|s| format!(" (retry after {}s)", s)).unwrap_or_default())]
    GhRateLimit {
        stderr: String,
        /// Seconds the server asked us to wait, when it said so.
        retry_after: Option<u64>,
    },

    /// `gh` failed because of a network or transport problem.
    #[error("Network error talking to GitHub: {stderr}")]
    GhNetwork { stderr: String },

    /// Any other non-zero exit from `gh`, e.g. a resource that does not exist.
    #[error("gh command failed (exit {exit_code}): gh {command} - {stderr}")]
    GhCommand {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// The `gh` process could not be started at all.
    #[error("Failed to run gh {command}: {message}\n  hint: {}", INSTALL_HINT)]
    GhSpawn { command: String, message: String },

    /// A command succeeded but its output was not the JSON we expected.
    #[error("Failed to parse JSON from {context}: {message}")]
    JsonParse { context: String, message: String },

    /// The repository descriptor returned by the host has no name.
    #[error("Invalid repository data for {repository}")]
    InvalidRepositoryData { repository: String },

    /// The repository could not be read (missing, private, renamed).
    #[error("Failed to access repository {repository}: {message}")]
    RepositoryAccess { repository: String, message: String },

    /// An app-store lookup failed in a way the caller asked to see.
    #[error("{store} lookup failed for {id}: {message}")]
    StoreLookup {
        store: String,
        id: String,
        message: String,
    },

    /// Merging the data for one repository failed.
    #[error("Data merge failed for {repository}: {source}")]
    Merge {
        repository: String,
        #[source]
        source: Box<Error>,
    },

    /// Persisting the apps file failed.
    #[error("Failed to write JSON file: {message}")]
    Write { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An HTTP client error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Wraps `self` as the failure of the merge for `repository`.
    pub fn in_merge(self, repository: impl Into<String>) -> Self {
        Error::Merge {
            repository: repository.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through `Merge` wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Merge { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the underlying failure is an authentication failure.
    pub fn is_auth(&self) -> bool {
        matches!(self.root(), Error::GhAuth { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
