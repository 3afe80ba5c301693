//! Google Play lookups.
//!
//! Google Play has no public metadata API, so the listing page itself is
//! fetched. Its existence confirms the package is published; the icon is read
//! from the page's `og:image` meta tag and the version from the embedded
//! listing data (`[[["1.4.2"]]` in the page's data callbacks), falling back to
//! the `softwareVersion` item property older page layouts carry.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use url::Url;

use super::{PlayStoreInfo, PlayStoreLookup};
use crate::error::{Error, Result};

pub const PLAY_STORE_DETAILS_URL: &str = "https://play.google.com/store/apps/details";

static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s[^>]*property="og:image"[^>]*content="([^"]+)""#)
        .expect("og:image pattern is a valid regex")
});

static OG_IMAGE_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s[^>]*content="([^"]+)"[^>]*property="og:image""#)
        .expect("og:image pattern is a valid regex")
});

/// A version string nested three arrays deep, as the listing data holds it.
static DATA_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\[\["(\d+(?:\.\d+)+[^"]*)"\]\]"#)
        .expect("listing version pattern is a valid regex")
});

static ITEMPROP_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)itemprop="softwareVersion"[^>]*>\s*([^<\s][^<]*?)\s*<"#)
        .expect("softwareVersion pattern is a valid regex")
});

/// The canonical listing URL for `package_id`.
pub fn store_url(package_id: &str) -> String {
    format!("{}?id={}", PLAY_STORE_DETAILS_URL, package_id)
}

/// Listing info built without network access.
pub fn manual_play_store_info(package_id: &str, version: Option<&str>) -> PlayStoreInfo {
    PlayStoreInfo {
        play_store_url: Some(store_url(package_id)),
        version: version.map(str::to_string),
        icon_url: None,
        minimum_sdk_version: None,
        package_id: Some(package_id.to_string()),
    }
}

/// Extracts the `og:image` URL from a listing page.
pub fn og_image(html: &str) -> Option<String> {
    OG_IMAGE
        .captures(html)
        .or_else(|| OG_IMAGE_CONTENT_FIRST.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
}

/// Extracts the published version from a listing page.
///
/// Pages for apps whose version "varies with device" carry none.
pub fn listing_version(html: &str) -> Option<String> {
    DATA_VERSION
        .captures(html)
        .or_else(|| ITEMPROP_VERSION.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|version| version.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

/// Client for Google Play listing pages.
#[derive(Debug, Clone)]
pub struct PlayStoreClient {
    http: Client,
    base_url: String,
    language: String,
    country: String,
}

impl PlayStoreClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: PLAY_STORE_DETAILS_URL.to_string(),
            language: "ja".to_string(),
            country: "JP".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetches the listing page; `Ok(None)` when the package is not published.
    pub fn fetch(&self, package_id: &str) -> Result<Option<PlayStoreInfo>> {
        let url = Url::parse_with_params(
            &self.base_url,
            &[
                ("id", package_id),
                ("hl", self.language.as_str()),
                ("gl", self.country.as_str()),
            ],
        )?;
        debug!("GET {}", url);

        let response = self.http.get(url).send()?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::StoreLookup {
                store: "Google Play".to_string(),
                id: package_id.to_string(),
                message: format!("listing request failed: {}", status),
            });
        }

        let page = response.text()?;
        let version = listing_version(&page);
        if version.is_none() {
            debug!("No version on the Google Play listing for {}", package_id);
        }
        Ok(Some(PlayStoreInfo {
            icon_url: og_image(&page),
            ..manual_play_store_info(package_id, version.as_deref())
        }))
    }
}

impl PlayStoreLookup for PlayStoreClient {
    fn lookup(&self, package_id: &str) -> Option<PlayStoreInfo> {
        if package_id.trim().is_empty() {
            return None;
        }
        match self.fetch(package_id) {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                warn!("No Google Play listing for {}", package_id);
                None
            }
            Err(e) => {
                warn!("Failed to get Play Store info for {}: {}", package_id, e);
                None
            }
        }
    }
}
