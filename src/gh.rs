//! # GitHub CLI Executor
//!
//! Every read against GitHub goes through the `gh` command-line tool, which
//! already knows how to authenticate (keyring, `GH_TOKEN`, `gh auth login`).
//! This module wraps it with failure classification and retries.
//!
//! ## Failure classification
//!
//! A non-zero exit is classified from stderr and the exit code by
//! [`classify_failure`], in this order:
//!
//! 1. **Auth**: stderr mentions authentication or tokens, or `gh` exited with
//!    [`AUTH_FAILURE_EXIT_CODE`]. Never retried.
//! 2. **RateLimit**: stderr mentions rate limiting. Retried; a "retry after N
//!    seconds" hint raises the next delay to at least N seconds.
//! 3. **Network**: connection, timeout and DNS problems. Retried.
//! 4. **Generic**: anything else, e.g. `HTTP 404: Not Found`. Not retried; the
//!    caller decides whether it means "no data".
//!
//! An `HTTP 4xx` status line (other than 401, 403 and 429) is generic whatever
//! else stderr says, and URLs or quoted names are ignored when looking for
//! markers, so a repository called `token-vault` is never an auth failure.
//!
//! ## Retry policy
//!
//! Retryable failures are re-run up to `max_retries` more times, waiting
//! [`backoff_delay`] between attempts. The `CommandRunner` trait is the seam
//! used by tests to script `gh` responses without spawning processes.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Exit code `gh` uses when it needs the user to authenticate.
pub const AUTH_FAILURE_EXIT_CODE: i32 = 4;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

const AUTH_MARKERS: &[&str] = &[
    "authentication",
    "auth login",
    "bad credentials",
    "token",
    "http 401",
    "not logged in",
];

const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "ratelimit",
    "too many requests",
    "http 429",
];

const NETWORK_MARKERS: &[&str] = &[
    "network",
    "connect",
    "timeout",
    "timed out",
    "could not resolve host",
    "no such host",
    "unexpected eof",
    "tls handshake",
];

static RETRY_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:retry[- ]after|try again in)[:=\s]*(\d+)")
        .expect("retry-after pattern is a valid regex")
});

static HTTP_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bHTTP (\d{3})\b").expect("HTTP status pattern is a valid regex")
});

/// URLs and quoted names, which echo user-chosen repository names.
static ECHOED_NAMES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s)"']+|'[^'\s]*'"#).expect("echoed name pattern is a valid regex")
});

/// Raw result of one `gh` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// A successful invocation that printed `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// A failed invocation with the given exit code and stderr.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Trait for running `gh` - allows scripting responses in tests
pub trait CommandRunner: Send + Sync {
    /// Runs `gh` with `args` and captures its output.
    ///
    /// An `Err` means the process could not be started at all; a process that
    /// ran and failed is reported through `CommandOutput::exit_code`.
    fn run(&self, args: &[String]) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Arc<R> {
    fn run(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        self.as_ref().run(args)
    }
}

/// Runs the real `gh` binary.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: PathBuf,
}

impl SystemRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new("gh")
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(&self.program)
            .args(args)
            .env("GH_PROMPT_DISABLED", "1")
            .env("NO_COLOR", "1")
            .output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // Killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Classification of a failed `gh` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Auth,
    RateLimit { retry_after: Option<u64> },
    Network,
    Generic,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::RateLimit { .. } | FailureKind::Network)
    }

    /// Server-provided wait hint in seconds, if any.
    pub fn retry_after(self) -> Option<u64> {
        match self {
            FailureKind::RateLimit { retry_after } => retry_after,
            _ => None,
        }
    }

    fn into_error(self, command: &str, output: CommandOutput) -> Error {
        let stderr = output.stderr.trim().to_string();
        match self {
            FailureKind::Auth => Error::GhAuth { stderr },
            FailureKind::RateLimit { retry_after } => Error::GhRateLimit {
                stderr,
                retry_after,
            },
            FailureKind::Network => Error::GhNetwork { stderr },
            FailureKind::Generic => Error::GhCommand {
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr,
            },
        }
    }
}

/// Classifies a failed invocation from its stderr and exit code.
///
/// An HTTP status line decides first: 401 is auth, 429 is a rate limit and
/// any other 4xx except 403 is generic. Otherwise the markers are matched
/// against stderr with URLs and quoted names removed.
pub fn classify_failure(stderr: &str, exit_code: i32) -> FailureKind {
    if exit_code == AUTH_FAILURE_EXIT_CODE {
        return FailureKind::Auth;
    }

    let status = HTTP_STATUS
        .captures(stderr)
        .and_then(|caps| caps[1].parse::<u16>().ok());
    match status {
        Some(401) => return FailureKind::Auth,
        Some(429) => {
            return FailureKind::RateLimit {
                retry_after: parse_retry_after(stderr),
            }
        }
        Some(code) if (400..500).contains(&code) && code != 403 => return FailureKind::Generic,
        _ => {}
    }

    let lower = ECHOED_NAMES.replace_all(stderr, "").to_lowercase();
    let mentions = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if mentions(AUTH_MARKERS) {
        FailureKind::Auth
    } else if mentions(RATE_LIMIT_MARKERS) {
        FailureKind::RateLimit {
            retry_after: parse_retry_after(stderr),
        }
    } else if mentions(NETWORK_MARKERS) {
        FailureKind::Network
    } else {
        FailureKind::Generic
    }
}

/// Extracts a "retry after N seconds" hint from an error message.
pub fn parse_retry_after(message: &str) -> Option<u64> {
    RETRY_AFTER
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Delay before the retry that follows attempt `attempt` (0-based).
///
/// `base_delay * 2^attempt`, raised to `retry_after_secs` when the server
/// asked for a longer wait.
pub fn backoff_delay(attempt: u32, base_delay: Duration, retry_after_secs: Option<u64>) -> Duration {
    let exponential = base_delay.saturating_mul(2u32.saturating_pow(attempt));
    match retry_after_secs {
        Some(secs) => exponential.max(Duration::from_secs(secs)),
        None => exponential,
    }
}

/// Retry settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOptions {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

/// Executes `gh` commands with classification and retries.
///
/// The client holds no mutable state and can be shared across threads.
pub struct GhClient {
    runner: Box<dyn CommandRunner>,
    options: ExecOptions,
}

impl GhClient {
    /// Creates a client that runs `program` (usually `gh`).
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_runner(Box::new(SystemRunner::new(program)))
    }

    /// Creates a client with a custom runner.
    ///
    /// This is primarily used for testing to script `gh` responses.
    pub fn with_runner(runner: Box<dyn CommandRunner>) -> Self {
        Self {
            runner,
            options: ExecOptions::default(),
        }
    }

    /// Replaces the default retry settings.
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    /// Runs `gh <args>` with the client's retry settings and returns trimmed
    /// stdout.
    pub fn execute(&self, args: &[&str]) -> Result<String> {
        self.execute_with(args, &self.options)
    }

    /// Runs `gh <args>` with explicit retry settings.
    pub fn execute_with(&self, args: &[&str], options: &ExecOptions) -> Result<String> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = args.join(" ");
        let mut attempt = 0;

        loop {
            debug!("gh {} (attempt {})", command, attempt + 1);
            let output = self.runner.run(&args).map_err(|e| Error::GhSpawn {
                command: command.clone(),
                message: e.to_string(),
            })?;

            if output.exit_code == 0 {
                return Ok(output.stdout.trim().to_string());
            }

            let kind = classify_failure(&output.stderr, output.exit_code);
            let error = kind.into_error(&command, output);
            if !kind.is_retryable() || attempt >= options.max_retries {
                return Err(error);
            }

            let delay = backoff_delay(attempt, options.base_delay, kind.retry_after());
            warn!(
                "gh {} failed ({}); retrying in {}ms [{}/{}]",
                command,
                error,
                delay.as_millis(),
                attempt + 1,
                options.max_retries
            );
            thread::sleep(delay);
            attempt += 1;
        }
    }

    /// Runs `gh <args>` and decodes stdout as JSON.
    pub fn execute_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T> {
        let output = self.execute(args)?;
        serde_json::from_str(&output).map_err(|e| Error::JsonParse {
            context: format!("gh {}", args.join(" ")),
            message: e.to_string(),
        })
    }

    /// Calls `gh api <endpoint>` and returns the parsed JSON document.
    pub fn api(&self, endpoint: &str) -> Result<serde_json::Value> {
        self.api_json(endpoint)
    }

    /// Calls `gh api <endpoint>` and decodes the response into `T`.
    pub fn api_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        self.execute_json(&["api", endpoint])
    }

    /// Runs `gh repo <subcommand> owner/repo <extra...>`.
    pub fn repo(&self, owner: &str, repo: &str, subcommand: &str, extra: &[&str]) -> Result<String> {
        let reference = format!("{}/{}", owner, repo);
        let mut args = vec!["repo", subcommand, reference.as_str()];
        args.extend_from_slice(extra);
        self.execute(&args)
    }
}
