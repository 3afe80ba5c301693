//! # Update Command Implementation
//!
//! This module implements the `update` subcommand, which regenerates the
//! dashboard's `apps.json`.
//!
//! ## Process
//!
//! 1. Load `config.json`.
//! 2. Merge every repository in parallel through `gh` and the store lookups,
//!    on a thread pool of its own.
//! 3. Report each repository that failed; the others are kept.
//! 4. Write the successful records (or print them with `--dry-run`).
//!
//! The command fails when the configuration cannot be loaded, when no
//! repository could be processed, or when the file cannot be written.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use log::debug;

use app_dashboard::batch::{self, BatchOptions};
use app_dashboard::config;
use app_dashboard::defaults::{
    DEFAULT_CONFIG_PATH, DEFAULT_GH_PROGRAM, DEFAULT_MAX_RETRIES, DEFAULT_OUTPUT_PATH,
    DEFAULT_RETRY_DELAY_MS,
};
use app_dashboard::error::AUTH_HINT;
use app_dashboard::gh::{ExecOptions, GhClient};
use app_dashboard::output::{emoji, format_size, repo_label, run_summary, OutputConfig};
use app_dashboard::sources::pull_requests::DEFAULT_PR_LIMIT;
use app_dashboard::sources::LiveSources;
use app_dashboard::stores::{
    self, AppStoreLookup, ItunesClient, NoAppStore, NoPlayStore, PlayStoreClient, PlayStoreLookup,
};
use app_dashboard::writer;

/// Fetch data for every configured repository and write apps.json
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Path to the dashboard configuration file.
    #[arg(short, long, value_name = "FILE", env = "APP_DASHBOARD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Where to write the apps file.
    #[arg(short, long, value_name = "FILE", env = "APP_DASHBOARD_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Print the apps file instead of writing it.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Log every gh invocation and lookup.
    #[arg(short, long)]
    pub verbose: bool,

    /// Retries for rate-limited or network-failed gh calls.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Base delay between retries; doubled on every attempt.
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_RETRY_DELAY_MS)]
    pub retry_delay_ms: u64,

    /// Number of recent pull requests kept per app.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PR_LIMIT)]
    pub pr_limit: usize,

    /// Show the latest tag for repositories without releases.
    #[arg(long)]
    pub tag_fallback: bool,

    /// Take missing display names from package.json, pubspec.yaml or app.json.
    #[arg(long)]
    pub detect_names: bool,

    /// Skip the App Store and Google Play lookups.
    #[arg(long)]
    pub no_stores: bool,

    /// The GitHub CLI program to run.
    #[arg(long, value_name = "PATH", env = "APP_DASHBOARD_GH", default_value = DEFAULT_GH_PROGRAM)]
    pub gh: PathBuf,
}

fn store_lookups(no_stores: bool) -> Result<(Box<dyn AppStoreLookup>, Box<dyn PlayStoreLookup>)> {
    if no_stores {
        return Ok((Box::new(NoAppStore), Box::new(NoPlayStore)));
    }
    let http = stores::http_client().context("Failed to create the HTTP client")?;
    Ok((
        Box::new(ItunesClient::new(http.clone())),
        Box::new(PlayStoreClient::new(http)),
    ))
}

/// Execute the `update` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: UpdateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start = Instant::now();

    let dashboard = config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    println!(
        "{} Updating {} repositories from {}",
        emoji(&out, "🔄", "[SYNC]"),
        dashboard.repositories.len(),
        args.config.display()
    );

    let gh = GhClient::new(&args.gh).with_options(ExecOptions {
        max_retries: args.max_retries,
        base_delay: Duration::from_millis(args.retry_delay_ms),
    });
    let (app_store, play_store) = store_lookups(args.no_stores)?;
    let sources = LiveSources::new(gh, app_store, play_store)
        .with_pr_limit(args.pr_limit)
        .with_tag_fallback(args.tag_fallback);
    let options = BatchOptions {
        detect_names: args.detect_names,
    };

    let pool = batch::io_pool(dashboard.repositories.len())
        .context("Failed to create the I/O thread pool")?;
    debug!("Fetching with {} threads", pool.current_num_threads());
    let report = pool.install(|| {
        batch::collect_apps(&dashboard.repositories, &sources, &options)
    });

    for app in &report.apps {
        println!(
            "{} {}",
            emoji(&out, "✅", "[OK]"),
            repo_label(&out, &app.repository)
        );
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            emoji(&out, "❌", "[ERR]"),
            repo_label(&out, &failure.repository),
            failure.error
        );
    }
    if report.has_auth_failure() {
        eprintln!("{} {}", emoji(&out, "🔑", "[AUTH]"), AUTH_HINT);
    }

    if report.apps.is_empty() {
        bail!(
            "No repositories were processed successfully ({} failed)",
            report.failures.len()
        );
    }

    if args.dry_run {
        println!(
            "{} Dry run: not writing {}",
            emoji(&out, "📋", "[DRY-RUN]"),
            args.output.display()
        );
        let json = writer::format_apps_json(&report.apps, chrono::Utc::now())?;
        print!("{}", json);
    } else {
        let summary = writer::write_apps_json(&report.apps, &args.output)
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
        println!(
            "{} Wrote {} apps to {} ({})",
            emoji(&out, "💾", "[SAVE]"),
            summary.total_apps,
            summary.path.display(),
            format_size(summary.bytes)
        );
    }

    println!(
        "{} {}",
        emoji(&out, "🎉", "[DONE]"),
        run_summary(
            report.apps.len(),
            report.failures.len(),
            start.elapsed().as_secs_f64()
        )
    );
    Ok(())
}
