// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `deployrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "deployrun",
    version,
    about = "Run a deployment plan step by step, with a resumable execution ledger.",
    long_about = None
)]
pub struct CliArgs {
    /// Environment name (a directory under the config dir).
    #[arg(long, value_name = "NAME")]
    pub env: String,

    /// Skip steps the ledger already records as completed.
    #[arg(long)]
    pub resume: bool,

    /// Load and check the plan, but don't execute any step.
    #[arg(long, conflicts_with = "status")]
    pub validate_only: bool,

    /// Print the ledger for the environment and exit.
    #[arg(long)]
    pub status: bool,

    /// Path to the settings file (TOML).
    ///
    /// Default: `deployrun.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEPLOYRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
