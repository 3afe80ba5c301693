//! Default values shared by the commands.
//!
//! Each path default can be overridden by a CLI flag or the matching
//! `APP_DASHBOARD_*` environment variable.

/// Configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Where the dashboard's frontend reads its data from.
pub const DEFAULT_OUTPUT_PATH: &str = "src/data/apps.json";

/// The GitHub CLI program, looked up on `PATH`.
pub const DEFAULT_GH_PROGRAM: &str = "gh";

/// Retry budget for `gh` invocations, after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = crate::gh::DEFAULT_MAX_RETRIES;

/// Base backoff delay in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
