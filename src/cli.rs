//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// App Dashboard - Collect GitHub and app-store data for the dashboard
#[derive(Parser, Debug)]
#[command(name = "app-dashboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch data for every configured repository and write apps.json
    Update(commands::update::UpdateArgs),

    /// Check the configuration file without fetching anything
    Validate(commands::validate::ValidateArgs),
}

/// Initializes `env_logger`; `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running under a test harness
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let level = match &self.command {
            Commands::Update(args) if args.verbose => "debug",
            _ => self.log_level.as_str(),
        };
        init_logging(level);

        match self.command {
            Commands::Update(args) => commands::update::execute(args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}
