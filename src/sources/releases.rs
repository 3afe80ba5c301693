//! Release lookup.
//!
//! "No release" is a normal state for a young repository, so every accessor
//! here answers `None` or an empty list instead of failing.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::dates::to_calendar_date;
use crate::error::Error;
use crate::gh::GhClient;

const RELEASE_FIELDS: &str = "tagName,publishedAt,url,isPrerelease";
const RELEASE_LIST_FIELDS: &str = "tagName,publishedAt,isPrerelease";

/// A published release as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// The release tag, e.g. `v1.0.0`.
    pub version: String,
    /// Publication date as `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhRelease {
    tag_name: String,
    published_at: Option<String>,
    url: Option<String>,
    #[serde(default)]
    is_prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct ApiTag {
    name: String,
}

fn tag_url(reference: &str, tag: &str) -> String {
    format!("https://github.com/{}/releases/tag/{}", reference, tag)
}

fn format_release(release: GhRelease, reference: &str) -> Release {
    Release {
        url: release
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| tag_url(reference, &release.tag_name)),
        date: release
            .published_at
            .filter(|d| !d.is_empty())
            .map(|d| to_calendar_date(&d)),
        version: release.tag_name,
    }
}

fn log_absent(what: &str, reference: &str, error: &Error) {
    match error {
        Error::GhCommand { .. } => debug!("No {} for {}: {}", what, reference, error),
        _ => warn!("Failed to get {} for {}: {}", what, reference, error),
    }
}

/// The newest non-prerelease release, if any.
pub fn latest_release(gh: &GhClient, owner: &str, repo: &str) -> Option<Release> {
    let reference = format!("{}/{}", owner, repo);
    let result = gh.execute_json::<GhRelease>(&[
        "release",
        "view",
        "--repo",
        &reference,
        "--json",
        RELEASE_FIELDS,
    ]);

    match result {
        Ok(release) if release.is_prerelease => {
            debug!("Latest release of {} is a prerelease", reference);
            None
        }
        Ok(release) => Some(format_release(release, &reference)),
        Err(e) => {
            log_absent("release", &reference, &e);
            None
        }
    }
}

/// Default page size for [`releases`].
pub const DEFAULT_RELEASE_LIMIT: usize = 5;

/// Up to `limit` releases, newest first, prereleases removed.
pub fn releases(gh: &GhClient, owner: &str, repo: &str, limit: usize) -> Vec<Release> {
    let reference = format!("{}/{}", owner, repo);
    let limit = limit.to_string();
    let result = gh.execute_json::<Vec<GhRelease>>(&[
        "release",
        "list",
        "--repo",
        &reference,
        "--limit",
        &limit,
        "--json",
        RELEASE_LIST_FIELDS,
    ]);

    match result {
        Ok(list) => list
            .into_iter()
            .filter(|release| !release.is_prerelease)
            .map(|release| format_release(release, &reference))
            .collect(),
        Err(e) => {
            log_absent("releases", &reference, &e);
            Vec::new()
        }
    }
}

/// The most recent tag, presented as a release without a date.
///
/// Used for repositories that tag versions without publishing releases.
pub fn latest_tag(gh: &GhClient, owner: &str, repo: &str) -> Option<Release> {
    let reference = format!("{}/{}", owner, repo);
    match gh.api_json::<Vec<ApiTag>>(&format!("repos/{}/tags?per_page=1", reference)) {
        Ok(tags) => tags.into_iter().next().map(|tag| Release {
            url: tag_url(&reference, &tag.name),
            version: tag.name,
            date: None,
        }),
        Err(e) => {
            log_absent("tags", &reference, &e);
            None
        }
    }
}
