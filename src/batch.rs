//! Runs the merge for every configured repository.
//!
//! Merges run in parallel and settle independently: a repository that fails
//! is reported next to the ones that succeeded instead of aborting the run.

use std::borrow::Cow;

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::config::RepositoryConfig;
use crate::error::{Error, Result};
use crate::merge::{merge_app_data, AppRecord, Prefetched};
use crate::sources::SourceOperations;

/// Lookups one merge runs concurrently.
pub const FETCHES_PER_APP: usize = 6;

/// Upper bound on threads waiting on `gh` and the stores.
pub const MAX_IO_THREADS: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Fill missing display names from the repositories' manifests.
    pub detect_names: bool,
}

/// A repository whose merge failed.
#[derive(Debug)]
pub struct RepoFailure {
    /// The entry's reference, else its id.
    pub repository: String,
    pub error: Error,
}

/// Outcome of a batch, in configuration order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub apps: Vec<AppRecord>,
    pub failures: Vec<RepoFailure>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.apps.len() + self.failures.len()
    }

    /// Whether any failure was an authentication failure.
    pub fn has_auth_failure(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_auth())
    }
}

fn merge_entry(
    config: &RepositoryConfig,
    sources: &dyn SourceOperations,
    options: &BatchOptions,
) -> Result<AppRecord> {
    let mut entry = Cow::Borrowed(config);

    if options.detect_names && config.name.is_none() {
        if let Ok(repo_ref) = config.repo_ref() {
            if let Some(name) = sources.app_name(&repo_ref) {
                info!("Detected app name \"{}\" for {}", name, repo_ref);
                entry.to_mut().name = Some(name);
            }
        }
    }

    merge_app_data(&entry, Prefetched::default(), sources)
}

/// Threads for a batch over `repositories` entries: one per lookup, capped.
pub fn io_pool_size(repositories: usize) -> usize {
    repositories
        .saturating_mul(FETCHES_PER_APP)
        .clamp(1, MAX_IO_THREADS)
}

/// A dedicated pool for [`collect_apps`].
///
/// Lookups block on subprocesses, HTTP and retry backoff; run inside
/// [`rayon::ThreadPool::install`] they stay off the global pool.
pub fn io_pool(repositories: usize) -> std::result::Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(io_pool_size(repositories))
        .thread_name(|index| format!("app-dashboard-io-{}", index))
        .build()
}

/// Merges every entry of `configs`.
pub fn collect_apps(
    configs: &[RepositoryConfig],
    sources: &dyn SourceOperations,
    options: &BatchOptions,
) -> BatchReport {
    let outcomes: Vec<(String, Result<AppRecord>)> = configs
        .par_iter()
        .map(|config| (config.label(), merge_entry(config, sources, options)))
        .collect();

    let mut report = BatchReport::default();
    for (label, outcome) in outcomes {
        match outcome {
            Ok(app) => {
                info!("Processed {}", label);
                report.apps.push(app);
            }
            Err(e) => {
                debug!("Failed to process {}: {}", label, e);
                report.failures.push(RepoFailure {
                    repository: label,
                    error: e,
                });
            }
        }
    }
    report
}
