//! Recent pull request activity.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::dates::parse_timestamp;
use crate::gh::GhClient;

/// States fetched for the activity feed, in concatenation order.
pub const PR_STATES: [&str; 3] = ["open", "merged", "closed"];

/// How many pull requests are fetched per state.
pub const PER_STATE_LIMIT: usize = 5;

/// Default length of the activity feed.
pub const DEFAULT_PR_LIMIT: usize = 3;

const PR_FIELDS: &str = "number,title,url,state,mergedAt,closedAt,updatedAt";

/// A pull request as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub url: String,
    /// `open`, `merged` or `closed`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<String>,
}

/// A pull request as `gh pr list --json` reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GhPullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub state: String,
    pub merged_at: Option<String>,
    pub closed_at: Option<String>,
    pub updated_at: Option<String>,
}

impl GhPullRequest {
    /// The most relevant activity timestamp: updated, else merged, else closed.
    fn activity(&self) -> Option<DateTime<Utc>> {
        [&self.updated_at, &self.merged_at, &self.closed_at]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .and_then(|t| parse_timestamp(t))
    }
}

/// Lower-cases the state and drops an empty `mergedAt`.
pub fn normalize_pull_request(pr: GhPullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title,
        url: pr.url,
        state: pr.state.to_lowercase(),
        merged_at: pr.merged_at.filter(|m| !m.is_empty()),
    }
}

/// Keeps the first occurrence of each number.
pub fn dedupe_by_number(prs: Vec<GhPullRequest>) -> Vec<GhPullRequest> {
    let mut seen = HashSet::new();
    prs.into_iter().filter(|pr| seen.insert(pr.number)).collect()
}

/// Most recent activity first; entries without a usable timestamp go last.
pub fn sort_by_activity(prs: &mut [GhPullRequest]) {
    prs.sort_by_key(|pr| Reverse(pr.activity()));
}

fn pull_requests_by_state(gh: &GhClient, reference: &str, state: &str) -> Vec<GhPullRequest> {
    let limit = PER_STATE_LIMIT.to_string();
    let result = gh.execute_json::<Vec<GhPullRequest>>(&[
        "pr", "list", "--repo", reference, "--state", state, "--limit", &limit, "--json",
        PR_FIELDS,
    ]);

    match result {
        Ok(prs) => prs,
        Err(e) => {
            warn!("Failed to get {} PRs for {}: {}", state, reference, e);
            Vec::new()
        }
    }
}

/// The `limit` most recently active pull requests across all states.
///
/// The three state queries run concurrently. A failing query only removes
/// its own state from the feed, so this never fails.
pub fn recent_pull_requests(gh: &GhClient, owner: &str, repo: &str, limit: usize) -> Vec<PullRequest> {
    let reference = format!("{}/{}", owner, repo);

    let by_state: Vec<Vec<GhPullRequest>> = PR_STATES
        .par_iter()
        .map(|state| pull_requests_by_state(gh, &reference, state))
        .collect();

    let mut prs = dedupe_by_number(by_state.into_iter().flatten().collect());
    sort_by_activity(&mut prs);
    debug!("{} distinct pull requests for {}", prs.len(), reference);

    prs.into_iter()
        .take(limit)
        .map(normalize_pull_request)
        .collect()
}

/// A single pull request by number.
pub fn pull_request_details(gh: &GhClient, owner: &str, repo: &str, number: u64) -> Option<PullRequest> {
    let reference = format!("{}/{}", owner, repo);
    let number = number.to_string();
    gh.execute_json::<GhPullRequest>(&["pr", "view", &number, "--repo", &reference, "--json", PR_FIELDS])
        .map(normalize_pull_request)
        .map_err(|e| debug!("No pull request #{} in {}: {}", number, reference, e))
        .ok()
}
