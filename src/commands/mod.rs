//! # CLI Command Implementations
//!
//! Each subcommand of the `app-dashboard` tool lives in its own file with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and the global
//!   `--color` value, and drives the `app_dashboard` library.

pub mod update;
pub mod validate;
