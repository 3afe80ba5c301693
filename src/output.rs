//! # Terminal Output
//!
//! Status markers and summaries for the `app-dashboard` commands.
//!
//! ## Colour and emoji
//!
//! Emoji markers and ANSI colour are used together, or not at all. The
//! decision follows, in order:
//! - `--color=always|never` on the command line
//! - `NO_COLOR` (any value, see https://no-color.org/)
//! - `CLICOLOR=0` / `CLICOLOR_FORCE=1`
//! - `TERM=dumb`
//! - whether stdout is a terminal
//!
//! ## Usage
//!
//! ```rust,ignore
//! use app_dashboard::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Updating 3 repositories", emoji(&out, "🔄", "[SYNC]"));
//! ```

use std::env;

use console::style;

/// Whether colour and emoji are enabled for this run.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag value (`always`, `never` or `auto`)
    /// against the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `emoji_str` when colour is enabled, else `plain`.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// A repository label, bold when colour is enabled.
pub fn repo_label(config: &OutputConfig, label: &str) -> String {
    if config.use_color {
        style(label).bold().to_string()
    } else {
        label.to_string()
    }
}

/// Human-readable size, e.g. `512 B` or `12.4 KB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

/// The closing line of an update run.
pub fn run_summary(succeeded: usize, failed: usize, seconds: f64) -> String {
    let noun = if succeeded + failed == 1 {
        "repository"
    } else {
        "repositories"
    };
    if failed == 0 {
        format!("Updated {} {} in {:.1}s", succeeded, noun, seconds)
    } else {
        format!(
            "Updated {} of {} {} in {:.1}s ({} failed)",
            succeeded,
            succeeded + failed,
            noun,
            seconds,
            failed
        )
    }
}
