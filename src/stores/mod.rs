//! # Store Lookups
//!
//! Public listing data from the Apple App Store ([`itunes`]) and Google Play
//! ([`play_store`]). Both are optional decorations of an app record: a lookup
//! that fails for any reason yields `None` and a warning, never an error.

pub mod itunes;
pub mod play_store;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use itunes::ItunesClient;
pub use play_store::{manual_play_store_info, PlayStoreClient};

/// Timeout applied to every store request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// App Store listing details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStoreInfo {
    pub app_store_url: Option<String>,
    pub version: Option<String>,
    pub icon_url: Option<String>,
    pub minimum_os_version: Option<String>,
}

/// Google Play listing details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStoreInfo {
    pub play_store_url: Option<String>,
    pub version: Option<String>,
    pub icon_url: Option<String>,
    pub minimum_sdk_version: Option<String>,
    pub package_id: Option<String>,
}

/// Looks up an App Store listing by numeric id.
pub trait AppStoreLookup: Send + Sync {
    fn lookup(&self, app_store_id: &str) -> Option<AppStoreInfo>;
}

/// Looks up a Play Store listing by package id.
pub trait PlayStoreLookup: Send + Sync {
    fn lookup(&self, package_id: &str) -> Option<PlayStoreInfo>;
}

/// App Store lookup that never finds anything (`update --no-stores`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAppStore;

impl AppStoreLookup for NoAppStore {
    fn lookup(&self, _app_store_id: &str) -> Option<AppStoreInfo> {
        None
    }
}

/// Play Store lookup that never finds anything (`update --no-stores`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlayStore;

impl PlayStoreLookup for NoPlayStore {
    fn lookup(&self, _package_id: &str) -> Option<PlayStoreInfo> {
        None
    }
}

/// Builds the HTTP client shared by the store lookups.
pub fn http_client() -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}
