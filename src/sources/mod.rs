//! # Source Accessors
//!
//! Typed views over the GitHub data the dashboard shows, each built on the
//! [`GhClient`] executor:
//!
//! - [`repository`]: the repository descriptor (mandatory) and app-name
//!   detection from manifest files.
//! - [`releases`]: the latest release, the release list and the latest tag.
//! - [`milestones`]: open milestones and the active one.
//! - [`pull_requests`]: the recent activity feed.
//!
//! Only the repository descriptor can fail a merge. Every other accessor
//! degrades to "absent" or an empty list.
//!
//! [`SourceOperations`] bundles the accessors and the store lookups behind
//! one trait so the merge engine can be driven by a mock in tests.

pub mod milestones;
pub mod pull_requests;
pub mod releases;
pub mod repository;

pub use milestones::Milestone;
pub use pull_requests::PullRequest;
pub use releases::Release;
pub use repository::RepositoryInfo;

use crate::config::RepoRef;
use crate::error::Result;
use crate::gh::GhClient;
use crate::stores::{AppStoreInfo, AppStoreLookup, PlayStoreInfo, PlayStoreLookup};

/// Trait for the data a merge reads - allows mocking in tests
pub trait SourceOperations: Send + Sync {
    fn repository_info(&self, repo: &RepoRef) -> Result<RepositoryInfo>;

    fn latest_release(&self, repo: &RepoRef) -> Option<Release>;

    fn current_milestone(&self, repo: &RepoRef) -> Option<Milestone>;

    fn recent_pull_requests(&self, repo: &RepoRef) -> Vec<PullRequest>;

    fn app_store_info(&self, app_store_id: &str) -> Option<AppStoreInfo>;

    fn play_store_info(&self, package_id: &str) -> Option<PlayStoreInfo>;

    /// The app's own display name, when its manifests declare one.
    fn app_name(&self, _repo: &RepoRef) -> Option<String> {
        None
    }
}

/// Live implementation backed by `gh` and the store clients.
pub struct LiveSources {
    gh: GhClient,
    app_store: Box<dyn AppStoreLookup>,
    play_store: Box<dyn PlayStoreLookup>,
    pr_limit: usize,
    tag_fallback: bool,
}

impl LiveSources {
    pub fn new(
        gh: GhClient,
        app_store: Box<dyn AppStoreLookup>,
        play_store: Box<dyn PlayStoreLookup>,
    ) -> Self {
        Self {
            gh,
            app_store,
            play_store,
            pr_limit: pull_requests::DEFAULT_PR_LIMIT,
            tag_fallback: false,
        }
    }

    /// Length of the pull request feed per app.
    pub fn with_pr_limit(mut self, pr_limit: usize) -> Self {
        self.pr_limit = pr_limit;
        self
    }

    /// Use the latest tag when a repository has no release.
    pub fn with_tag_fallback(mut self, tag_fallback: bool) -> Self {
        self.tag_fallback = tag_fallback;
        self
    }

    pub fn gh(&self) -> &GhClient {
        &self.gh
    }
}

impl SourceOperations for LiveSources {
    fn repository_info(&self, repo: &RepoRef) -> Result<RepositoryInfo> {
        repository::repository_info(&self.gh, &repo.owner, &repo.repo)
    }

    fn latest_release(&self, repo: &RepoRef) -> Option<Release> {
        releases::latest_release(&self.gh, &repo.owner, &repo.repo).or_else(|| {
            self.tag_fallback
                .then(|| releases::latest_tag(&self.gh, &repo.owner, &repo.repo))
                .flatten()
        })
    }

    fn current_milestone(&self, repo: &RepoRef) -> Option<Milestone> {
        milestones::current_milestone(&self.gh, &repo.owner, &repo.repo)
    }

    fn recent_pull_requests(&self, repo: &RepoRef) -> Vec<PullRequest> {
        pull_requests::recent_pull_requests(&self.gh, &repo.owner, &repo.repo, self.pr_limit)
    }

    fn app_store_info(&self, app_store_id: &str) -> Option<AppStoreInfo> {
        self.app_store.lookup(app_store_id)
    }

    fn play_store_info(&self, package_id: &str) -> Option<PlayStoreInfo> {
        self.play_store.lookup(package_id)
    }

    fn app_name(&self, repo: &RepoRef) -> Option<String> {
        repository::detect_app_name(&self.gh, &repo.owner, &repo.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gh::testing::{fast_client, RoutedRunner};
    use crate::stores::{NoAppStore, NoPlayStore};
    use serde_json::json;

    fn live(runner: RoutedRunner) -> LiveSources {
        LiveSources::new(fast_client(runner), Box::new(NoAppStore), Box::new(NoPlayStore))
    }

    #[test]
    fn test_tag_fallback_only_when_enabled() {
        let runner = || {
            RoutedRunner::new().json(
                "api repos/owner/app/tags?per_page=1",
                json!([{ "name": "v0.3.0" }]),
            )
        };
        let repo = RepoRef::parse("owner/app").unwrap();

        assert!(live(runner()).latest_release(&repo).is_none());

        let release = live(runner())
            .with_tag_fallback(true)
            .latest_release(&repo)
            .unwrap();
        assert_eq!(release.version, "v0.3.0");
    }

    #[test]
    fn test_pr_limit_is_applied() {
        let prs: Vec<_> = (1..=4)
            .map(|n| json!({ "number": n, "title": "t", "url": "u", "state": "OPEN" }))
            .collect();
        let runner = RoutedRunner::new().json(
            "pr list --repo owner/app --state open --limit 5 --json number,title,url,state,mergedAt,closedAt,updatedAt",
            json!(prs),
        );
        let repo = RepoRef::parse("owner/app").unwrap();

        assert_eq!(live(runner).with_pr_limit(1).recent_pull_requests(&repo).len(), 1);
    }
}
