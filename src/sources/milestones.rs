//! Milestone lookup and selection of the "current" milestone.
//!
//! Projects name milestones after the version they ship, so the active one is
//! the open milestone with the lowest semantic version in its title.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::dates::to_calendar_date;
use crate::error::Error;
use crate::gh::GhClient;

static VERSION_IN_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"v?(\d+)\.(\d+)\.(\d+)").expect("version pattern is a valid regex")
});

/// An open milestone with its issue counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub title: String,
    pub open_issues: u64,
    pub closed_issues: u64,
    pub total_issues: u64,
    /// Share of closed issues, 0 to 100.
    pub progress: u32,
    /// Due date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ApiMilestone {
    title: Option<String>,
    state: Option<String>,
    open_issues: Option<u64>,
    closed_issues: Option<u64>,
    due_on: Option<String>,
    html_url: Option<String>,
}

impl From<ApiMilestone> for Milestone {
    fn from(api: ApiMilestone) -> Self {
        let open_issues = api.open_issues.unwrap_or(0);
        let closed_issues = api.closed_issues.unwrap_or(0);
        Milestone {
            title: api.title.unwrap_or_default(),
            open_issues,
            closed_issues,
            total_issues: open_issues + closed_issues,
            progress: calculate_progress(open_issues, closed_issues),
            due_on: api
                .due_on
                .filter(|d| !d.is_empty())
                .map(|d| to_calendar_date(&d)),
            url: api.html_url.unwrap_or_default(),
        }
    }
}

/// Percentage of closed issues, rounded half up; 0 for an empty milestone.
pub fn calculate_progress(open_issues: u64, closed_issues: u64) -> u32 {
    let total = open_issues + closed_issues;
    if total == 0 {
        return 0;
    }
    (closed_issues as f64 / total as f64 * 100.0).round() as u32
}

/// The first `MAJOR.MINOR.PATCH` found anywhere in `title`.
pub fn milestone_version(title: &str) -> Option<Version> {
    let caps = VERSION_IN_TITLE.captures(title)?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

/// Picks the milestone with the lowest version.
///
/// Untitled milestones are ignored. Titles without a version rank after all
/// versioned ones; ties keep their original order.
pub fn select_active_milestone(milestones: &[Milestone]) -> Option<&Milestone> {
    milestones
        .iter()
        .filter(|m| !m.title.is_empty())
        .min_by_key(|m| {
            let version = milestone_version(&m.title);
            (version.is_none(), version)
        })
}

/// Open milestones in the order GitHub returns them.
pub fn open_milestones(gh: &GhClient, owner: &str, repo: &str) -> Vec<Milestone> {
    let reference = format!("{}/{}", owner, repo);
    let endpoint = format!("repos/{}/milestones", reference);

    match gh.api_json::<Vec<ApiMilestone>>(&endpoint) {
        Ok(milestones) => milestones
            .into_iter()
            .filter(|m| m.state.as_deref() == Some("open"))
            .map(Milestone::from)
            .collect(),
        Err(e @ Error::GhCommand { .. }) => {
            debug!("No milestones for {}: {}", reference, e);
            Vec::new()
        }
        Err(e) => {
            warn!("Failed to get milestones for {}: {}", reference, e);
            Vec::new()
        }
    }
}

/// The active milestone, if the repository has any open ones.
pub fn current_milestone(gh: &GhClient, owner: &str, repo: &str) -> Option<Milestone> {
    let milestones = open_milestones(gh, owner, repo);
    select_active_milestone(&milestones).cloned()
}
