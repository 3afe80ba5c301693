//! # Merge Engine
//!
//! Turns one [`RepositoryConfig`] into one [`AppRecord`], the unit the
//! dashboard renders.
//!
//! ## Pipeline
//!
//! 1. **Validate** the `repository` reference. Nothing is fetched for an
//!    entry without one, or with one that is not `owner/repo`.
//! 2. **Resolve** the six sources: repository descriptor, latest release,
//!    active milestone, recent pull requests, App Store and Play Store
//!    listings. A value supplied in [`Prefetched`] is used as is; the others
//!    are fetched concurrently through [`SourceOperations`]. Store lookups are
//!    skipped for stores the entry has no id for.
//! 3. **Assemble** the record, applying config overrides and fallbacks.
//! 4. **Normalize** timestamps and stamp `lastUpdated`.
//!
//! Any failure after validation is reported as [`Error::Merge`] naming the
//! repository. Only the repository descriptor is mandatory; the other sources
//! can be absent without failing the merge.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{RepoRef, RepositoryConfig};
use crate::dates::{format_instant, to_calendar_date, to_iso_instant};
use crate::error::{Error, Result};
use crate::sources::{Milestone, PullRequest, Release, RepositoryInfo, SourceOperations};
use crate::stores::{AppStoreInfo, PlayStoreInfo};

/// Icon used when neither the config nor a store provides one.
pub const PLACEHOLDER_ICON: &str = "https://via.placeholder.com/60";

/// Source data the caller already has, keyed by source.
///
/// Every `Some` field replaces the corresponding live fetch; `None` fields
/// are fetched.
#[derive(Debug, Clone, Default)]
pub struct Prefetched {
    pub repository: Option<RepositoryInfo>,
    pub release: Option<Release>,
    pub milestone: Option<Milestone>,
    pub pull_requests: Option<Vec<PullRequest>>,
    pub app_store: Option<AppStoreInfo>,
    pub play_store: Option<PlayStoreInfo>,
}

/// The dashboard entry for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: String,
    pub name: String,
    /// `owner/repo`
    pub repository: String,
    pub platforms: Vec<String>,
    pub icon: String,
    pub links: Links,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_release: Option<Release>,
    #[serde(default)]
    pub store_versions: StoreVersions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<MilestoneSummary>,
    #[serde(rename = "recentPRs", default)]
    pub recent_prs: Vec<PullRequest>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Links {
    pub github: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_store: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreVersions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_store: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_store: Option<String>,
}

/// The milestone fields shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSummary {
    pub title: String,
    pub open_issues: u64,
    pub closed_issues: u64,
    pub total_issues: u64,
    pub progress: u32,
    pub url: String,
}

impl From<Milestone> for MilestoneSummary {
    fn from(milestone: Milestone) -> Self {
        Self {
            title: milestone.title,
            open_issues: milestone.open_issues,
            closed_issues: milestone.closed_issues,
            total_issues: milestone.total_issues,
            progress: milestone.progress,
            url: milestone.url,
        }
    }
}

/// One store's listing, reduced to what the record needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreListing {
    pub url: Option<String>,
    pub version: Option<String>,
    pub icon: Option<String>,
    pub minimum_os: Option<String>,
}

/// Both stores' listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreData {
    pub app_store: Option<StoreListing>,
    pub play_store: Option<StoreListing>,
}

impl StoreData {
    pub fn new(app_store: Option<AppStoreInfo>, play_store: Option<PlayStoreInfo>) -> Self {
        Self {
            app_store: app_store.map(|info| StoreListing {
                url: info.app_store_url,
                version: info.version,
                icon: info.icon_url,
                minimum_os: info.minimum_os_version,
            }),
            play_store: play_store.map(|info| StoreListing {
                url: info.play_store_url,
                version: info.version,
                icon: info.icon_url,
                minimum_os: info.minimum_sdk_version,
            }),
        }
    }

    fn listings(&self) -> impl Iterator<Item = &StoreListing> {
        self.app_store.iter().chain(self.play_store.iter())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn present(value: &Option<String>) -> Option<String> {
    non_empty(value.as_deref()).map(str::to_string)
}

/// Config icon, else App Store icon, else Play Store icon, else the placeholder.
pub fn select_icon(config_icon: Option<&str>, stores: &StoreData) -> String {
    non_empty(config_icon)
        .or_else(|| {
            stores
                .listings()
                .find_map(|listing| non_empty(listing.icon.as_deref()))
        })
        .unwrap_or(PLACEHOLDER_ICON)
        .to_string()
}

/// Sources after overrides and live fetches have been combined.
struct Resolved {
    repository: Result<RepositoryInfo>,
    release: Option<Release>,
    milestone: Option<Milestone>,
    pull_requests: Vec<PullRequest>,
    app_store: Option<AppStoreInfo>,
    play_store: Option<PlayStoreInfo>,
}

fn resolve_sources(
    config: &RepositoryConfig,
    repo_ref: &RepoRef,
    prefetched: Prefetched,
    sources: &dyn SourceOperations,
) -> Resolved {
    let Prefetched {
        repository,
        release,
        milestone,
        pull_requests,
        app_store,
        play_store,
    } = prefetched;
    let app_store_id = config.app_store_id();
    let play_store_id = config.play_store_id();

    let fetch_repository = move || repository.map_or_else(|| sources.repository_info(repo_ref), Ok);
    let fetch_release = move || release.or_else(|| sources.latest_release(repo_ref));
    let fetch_milestone = move || milestone.or_else(|| sources.current_milestone(repo_ref));
    let fetch_pull_requests =
        move || pull_requests.unwrap_or_else(|| sources.recent_pull_requests(repo_ref));
    let fetch_app_store =
        move || app_store.or_else(|| app_store_id.and_then(|id| sources.app_store_info(id)));
    let fetch_play_store =
        move || play_store.or_else(|| play_store_id.and_then(|id| sources.play_store_info(id)));

    let ((repository, release), ((milestone, pull_requests), (app_store, play_store))) =
        rayon::join(
            || rayon::join(fetch_repository, fetch_release),
            || {
                rayon::join(
                    || rayon::join(fetch_milestone, fetch_pull_requests),
                    || rayon::join(fetch_app_store, fetch_play_store),
                )
            },
        );

    Resolved {
        repository,
        release,
        milestone,
        pull_requests,
        app_store,
        play_store,
    }
}

fn assemble(config: &RepositoryConfig, repo_ref: &RepoRef, resolved: Resolved) -> Result<AppRecord> {
    let repository = resolved.repository?;
    let stores = StoreData::new(resolved.app_store, resolved.play_store);

    let links = Links {
        github: non_empty(Some(repository.url.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| repo_ref.html_url()),
        app_store: stores.app_store.as_ref().and_then(|l| present(&l.url)),
        play_store: stores.play_store.as_ref().and_then(|l| present(&l.url)),
    };
    let store_versions = StoreVersions {
        app_store: stores.app_store.as_ref().and_then(|l| present(&l.version)),
        play_store: stores.play_store.as_ref().and_then(|l| present(&l.version)),
    };

    Ok(AppRecord {
        id: non_empty(config.id.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| repository.name.to_lowercase()),
        name: non_empty(config.name.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| repository.name.clone()),
        repository: non_empty(Some(repository.full_name.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| repo_ref.to_string()),
        platforms: config.platforms.clone(),
        icon: select_icon(config.icon.as_deref(), &stores),
        links,
        latest_release: resolved.release,
        store_versions,
        milestone: resolved.milestone.map(MilestoneSummary::from),
        recent_prs: resolved.pull_requests,
        last_updated: String::new(),
    })
}

fn normalize(mut record: AppRecord, now: DateTime<Utc>) -> AppRecord {
    record.last_updated = format_instant(now);
    if let Some(release) = record.latest_release.as_mut() {
        release.date = release.date.as_deref().map(to_calendar_date);
    }
    for pr in &mut record.recent_prs {
        pr.merged_at = pr.merged_at.as_deref().map(to_iso_instant);
    }
    record
}

/// Builds the record for `config`, stamped with the current time.
pub fn merge_app_data(
    config: &RepositoryConfig,
    prefetched: Prefetched,
    sources: &dyn SourceOperations,
) -> Result<AppRecord> {
    merge_app_data_at(config, prefetched, sources, Utc::now())
}

/// Builds the record for `config`, stamped with `now`.
pub fn merge_app_data_at(
    config: &RepositoryConfig,
    prefetched: Prefetched,
    sources: &dyn SourceOperations,
    now: DateTime<Utc>,
) -> Result<AppRecord> {
    let reference = non_empty(config.repository.as_deref()).ok_or(Error::MissingRepository)?;

    let merged = RepoRef::parse(reference).and_then(|repo_ref| {
        debug!("Merging data for {}", repo_ref);
        let resolved = resolve_sources(config, &repo_ref, prefetched, sources);
        assemble(config, &repo_ref, resolved)
    });

    merged
        .map(|record| normalize(record, now))
        .map_err(|e| e.in_merge(reference))
}
