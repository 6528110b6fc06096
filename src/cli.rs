// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `missiongraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "missiongraph",
    version,
    about = "Run a dependency-ordered mission plan against simulated rover targets.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the mission plan (TOML).
    #[arg(long, value_name = "PATH", default_value = "Mission.toml")]
    pub plan: String,

    /// Exit once no target has pending tasks.
    #[arg(long)]
    pub exit_when_idle: bool,

    /// Stop after this many scheduler ticks.
    #[arg(long, value_name = "N")]
    pub max_ticks: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MISSIONGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't send any commands.
    #[arg(long)]
    pub dry_run: bool,
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
