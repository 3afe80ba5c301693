//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks the
//! dashboard configuration without contacting GitHub or the stores:
//!
//! - the file parses and has a `repositories` array;
//! - every entry has an `owner/repo` reference;
//! - no two entries resolve to the same reference or id.
//!
//! This command is a safe, read-only operation.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use app_dashboard::config;
use app_dashboard::defaults::DEFAULT_CONFIG_PATH;
use app_dashboard::output::{emoji, OutputConfig};

/// Check the configuration file without fetching anything
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the dashboard configuration file to validate.
    #[arg(short, long, value_name = "FILE", env = "APP_DASHBOARD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = &args.config;
    println!(
        "{} Validating configuration: {}",
        emoji(&out, "🔍", "[SCAN]"),
        config_path.display()
    );

    let dashboard = match config::from_file(config_path) {
        Ok(dashboard) => {
            println!(
                "{} Configuration file parsed successfully",
                emoji(&out, "✅", "[OK]")
            );
            dashboard
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                emoji(&out, "❌", "[ERR]"),
                e
            );
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    let mut errors = 0;
    let mut warnings = 0;
    let mut seen_refs = HashSet::new();
    let mut seen_ids = HashSet::new();

    for (index, entry) in dashboard.repositories.iter().enumerate() {
        match entry.repo_ref() {
            Ok(repo_ref) => {
                let stores = match (entry.app_store_id(), entry.play_store_id()) {
                    (Some(_), Some(_)) => " (App Store, Google Play)",
                    (Some(_), None) => " (App Store)",
                    (None, Some(_)) => " (Google Play)",
                    (None, None) => "",
                };
                println!("{} {}{}", emoji(&out, "✅", "[OK]"), repo_ref, stores);

                if !seen_refs.insert(repo_ref.to_string()) {
                    println!(
                        "{} {} is listed more than once",
                        emoji(&out, "⚠️", "[WARN]"),
                        repo_ref
                    );
                    warnings += 1;
                }
            }
            Err(e) => {
                println!(
                    "{} Entry #{} ({}): {}",
                    emoji(&out, "❌", "[ERR]"),
                    index + 1,
                    entry.label(),
                    e
                );
                errors += 1;
            }
        }

        if let Some(id) = entry.id.as_deref().filter(|id| !id.is_empty()) {
            if !seen_ids.insert(id.to_string()) {
                println!(
                    "{} Duplicate id \"{}\"",
                    emoji(&out, "⚠️", "[WARN]"),
                    id
                );
                warnings += 1;
            }
        }
    }

    println!(
        "\n{} {} repositories, {} errors, {} warnings",
        emoji(&out, "📊", "[INFO]"),
        dashboard.repositories.len(),
        errors,
        warnings
    );

    if errors > 0 {
        bail!("{} invalid repository entries", errors);
    }
    Ok(())
}
