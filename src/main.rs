//! # App Dashboard CLI
//!
//! This is the binary entry point for the `app-dashboard` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging.
//! - Executing the appropriate command and turning its errors into a
//!   non-zero exit status.
//!
//! The data gathering itself lives in the `app_dashboard` library; the binary
//! is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
