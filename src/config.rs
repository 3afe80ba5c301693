//! # Dashboard Configuration
//!
//! This module defines the data structures that represent the dashboard's
//! `config.json`, as well as the logic for parsing it.
//!
//! ## Format
//!
//! The file is a JSON object with a `repositories` array. Each entry names a
//! GitHub repository and, optionally, the store listings and presentation
//! overrides for the app built from it:
//!
//! ```json
//! {
//!   "repositories": [
//!     {
//!       "id": "tadoku",
//!       "name": "Tadoku Log",
//!       "repository": "aill-org/tadoku-log",
//!       "appStoreId": 6446930619,
//!       "playStoreId": "org.aill.tadoku_log",
//!       "platforms": ["ios", "android"]
//!     }
//!   ]
//! }
//! ```
//!
//! Only the presence of the `repositories` array is checked when loading.
//! Each entry's `owner/repo` reference is validated by [`RepoRef::parse`]
//! when the entry is merged, so one bad entry does not prevent the others
//! from being processed.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// The whole configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Tracked projects, in dashboard order.
    pub repositories: Vec<RepositoryConfig>,
}

/// One tracked project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    /// Stable identifier; defaults to the lower-cased repository name.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name; defaults to the repository name.
    #[serde(default)]
    pub name: Option<String>,
    /// The `owner/repo` reference. Required.
    #[serde(default)]
    pub repository: Option<String>,
    /// Numeric App Store id, given either as a string or a number.
    #[serde(default, deserialize_with = "string_or_number")]
    pub app_store_id: Option<String>,
    /// Android package id, e.g. `com.example.app`.
    #[serde(default)]
    pub play_store_id: Option<String>,
    /// Icon URL that takes precedence over store icons.
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl RepositoryConfig {
    /// Parses the `repository` field.
    ///
    /// Returns `MissingRepository` when the field is absent or empty, and
    /// `InvalidRepository` when it is not `owner/repo`.
    pub fn repo_ref(&self) -> Result<RepoRef> {
        match self.repository.as_deref() {
            None | Some("") => Err(Error::MissingRepository),
            Some(reference) => RepoRef::parse(reference),
        }
    }

    /// A name for this entry in reports: the reference, else the id.
    pub fn label(&self) -> String {
        self.repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
            .to_string()
    }

    /// The App Store id, if one is configured.
    pub fn app_store_id(&self) -> Option<&str> {
        non_empty(self.app_store_id.as_deref())
    }

    /// The Play Store package id, if one is configured.
    pub fn play_store_id(&self) -> Option<&str> {
        non_empty(self.play_store_id.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StoreId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<StoreId>::deserialize(deserializer)?.map(|id| match id {
        StoreId::Text(text) => text,
        StoreId::Number(number) => number.to_string(),
    }))
}

/// A validated `owner/repo` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parses `owner/repo`.
    ///
    /// The reference must split on `/` into exactly two non-empty segments.
    pub fn parse(reference: &str) -> Result<Self> {
        let mut parts = reference.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => Ok(Self {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            _ => Err(Error::InvalidRepository {
                reference: reference.to_string(),
            }),
        }
    }

    /// The repository's page on github.com.
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parse a configuration document
pub fn parse(json_content: &str) -> Result<DashboardConfig> {
    let value: serde_json::Value =
        serde_json::from_str(json_content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            hint: None,
        })?;

    if !value.get("repositories").is_some_and(|r| r.is_array()) {
        return Err(Error::ConfigParse {
            message: "expected a \"repositories\" array".to_string(),
            hint: Some(
                "The file must look like {\"repositories\": [{\"repository\": \"owner/repo\"}]}"
                    .to_string(),
            ),
        });
    }

    serde_json::from_value(value).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: None,
    })
}

/// Load configuration from a file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DashboardConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}
