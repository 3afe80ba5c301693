//! App Store lookups through the public iTunes Search API.

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::{AppStoreInfo, AppStoreLookup};
use crate::error::{Error, Result};

pub const ITUNES_LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Storefront queried by default.
pub const DEFAULT_COUNTRY: &str = "jp";

/// One entry of a lookup response. Only the fields the dashboard uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItunesEntry {
    #[serde(rename = "trackViewUrl")]
    pub track_view_url: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "artworkUrl512")]
    pub artwork_url_512: Option<String>,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url_100: Option<String>,
    #[serde(rename = "artworkUrl60")]
    pub artwork_url_60: Option<String>,
    #[serde(rename = "minimumOsVersion")]
    pub minimum_os_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<ItunesEntry>,
}

/// Builds `<base>?id=<id>&country=<country>`.
pub fn lookup_url(base_url: &str, app_store_id: &str, country: &str) -> Result<Url> {
    let url = Url::parse_with_params(base_url, &[("id", app_store_id), ("country", country)])?;
    Ok(url)
}

/// The largest icon available, upscaled to 512px where the CDN allows it.
pub fn high_resolution_icon(entry: &ItunesEntry) -> Option<String> {
    let non_empty = |url: &Option<String>| url.clone().filter(|u| !u.is_empty());

    non_empty(&entry.artwork_url_512)
        .or_else(|| non_empty(&entry.artwork_url_100).map(|u| u.replacen("100x100bb", "512x512bb", 1)))
        .or_else(|| non_empty(&entry.artwork_url_60).map(|u| u.replacen("60x60bb", "512x512bb", 1)))
}

pub fn format_app_store_info(entry: &ItunesEntry) -> AppStoreInfo {
    AppStoreInfo {
        app_store_url: entry.track_view_url.clone(),
        version: entry.version.clone(),
        icon_url: high_resolution_icon(entry),
        minimum_os_version: entry.minimum_os_version.clone(),
    }
}

/// Client for the iTunes lookup endpoint.
#[derive(Debug, Clone)]
pub struct ItunesClient {
    http: Client,
    base_url: String,
    country: String,
}

impl ItunesClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: ITUNES_LOOKUP_URL.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    /// Looks up `app_store_id`; `Ok(None)` when the store has no such app.
    pub fn search(&self, app_store_id: &str) -> Result<Option<AppStoreInfo>> {
        let url = lookup_url(&self.base_url, app_store_id, &self.country)?;
        debug!("GET {}", url);

        let response = self.http.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::StoreLookup {
                store: "App Store".to_string(),
                id: app_store_id.to_string(),
                message: format!("iTunes API request failed: {}", status),
            });
        }

        let body: LookupResponse = response.json()?;
        Ok(body.results.first().map(format_app_store_info))
    }
}

impl AppStoreLookup for ItunesClient {
    fn lookup(&self, app_store_id: &str) -> Option<AppStoreInfo> {
        if app_store_id.trim().is_empty() {
            return None;
        }
        match self.search(app_store_id) {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                warn!("No App Store listing for id {}", app_store_id);
                None
            }
            Err(e) => {
                warn!("Failed to search app by ID \"{}\": {}", app_store_id, e);
                None
            }
        }
    }
}
