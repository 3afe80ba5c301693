//! # Apps File Writer
//!
//! Persists the merged records as the dashboard's `apps.json`:
//!
//! ```json
//! { "apps": [ ... ], "lastUpdated": "2025-01-15T12:00:00.000Z", "totalApps": 3 }
//! ```
//!
//! The write is staged through `<output>.tmp` and renamed into place, so a
//! reader never sees a half-written file. An existing file is first copied to
//! `<output>.backup`. After the rename the file is read back and its counts
//! checked.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::dates::format_instant;
use crate::error::{Error, Result};
use crate::merge::AppRecord;

/// The persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppsFile {
    pub apps: Vec<AppRecord>,
    pub last_updated: String,
    pub total_apps: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppsFileRef<'a> {
    apps: &'a [AppRecord],
    last_updated: String,
    total_apps: usize,
}

/// What a successful write produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub bytes: u64,
    pub total_apps: usize,
    /// Copy of the previous file, when there was one.
    pub backup: Option<PathBuf>,
}

fn write_error(message: String) -> Error {
    Error::Write { message }
}

/// `path` with `suffix` appended to its file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Serializes `apps` as the persisted document, two-space indented with a
/// trailing newline.
pub fn format_apps_json(apps: &[AppRecord], now: DateTime<Utc>) -> Result<String> {
    let document = AppsFileRef {
        apps,
        last_updated: format_instant(now),
        total_apps: apps.len(),
    };
    let mut json = serde_json::to_string_pretty(&document)
        .map_err(|e| write_error(format!("Failed to serialize apps: {}", e)))?;
    json.push('\n');
    Ok(json)
}

fn ensure_parent_dir(output_path: &Path) -> Result<()> {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| {
                write_error(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })
        }
        _ => Ok(()),
    }
}

fn create_backup(output_path: &Path) -> Result<Option<PathBuf>> {
    if !output_path.is_file() {
        return Ok(None);
    }
    let backup = sibling_path(output_path, ".backup");
    fs::copy(output_path, &backup).map_err(|e| {
        write_error(format!(
            "Failed to back up '{}': {}",
            output_path.display(),
            e
        ))
    })?;
    debug!("Backed up {} to {}", output_path.display(), backup.display());
    Ok(Some(backup))
}

fn write_atomically(output_path: &Path, content: &str) -> Result<()> {
    let temp_path = sibling_path(output_path, ".tmp");

    let staged = fs::write(&temp_path, content)
        .and_then(|()| fs::rename(&temp_path, output_path));

    staged.map_err(|e| {
        // The temporary file may or may not exist depending on which step failed
        let _ = fs::remove_file(&temp_path);
        write_error(format!(
            "Failed to write '{}': {}",
            output_path.display(),
            e
        ))
    })
}

/// Reads the written file back and checks its counts.
pub fn verify_apps_file(output_path: &Path, expected: usize) -> Result<AppsFile> {
    let content = fs::read_to_string(output_path).map_err(|e| {
        write_error(format!(
            "Failed to read back '{}': {}",
            output_path.display(),
            e
        ))
    })?;
    let written: AppsFile = serde_json::from_str(&content).map_err(|e| {
        write_error(format!(
            "Written file '{}' is not valid: {}",
            output_path.display(),
            e
        ))
    })?;

    if written.total_apps != expected || written.apps.len() != expected {
        return Err(write_error(format!(
            "Data verification failed: expected {} apps, found totalApps={} with {} entries",
            expected,
            written.total_apps,
            written.apps.len()
        )));
    }
    Ok(written)
}

/// Writes `apps` to `output_path`, stamped with the current time.
pub fn write_apps_json(apps: &[AppRecord], output_path: &Path) -> Result<WriteSummary> {
    write_apps_json_at(apps, output_path, Utc::now())
}

/// Writes `apps` to `output_path`, stamped with `now`.
pub fn write_apps_json_at(
    apps: &[AppRecord],
    output_path: &Path,
    now: DateTime<Utc>,
) -> Result<WriteSummary> {
    ensure_parent_dir(output_path)?;
    let backup = create_backup(output_path)?;

    let content = format_apps_json(apps, now)?;
    write_atomically(output_path, &content)?;
    verify_apps_file(output_path, apps.len())?;

    info!(
        "Wrote {} apps ({} bytes) to {}",
        apps.len(),
        content.len(),
        output_path.display()
    );

    Ok(WriteSummary {
        path: output_path.to_path_buf(),
        bytes: content.len() as u64,
        total_apps: apps.len(),
        backup,
    })
}
