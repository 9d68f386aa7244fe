// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DefaultsSection;
use crate::types::LaunchRequest;

/// Command-line arguments for `crawlctl`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "crawlctl",
    version,
    about = "Launch and supervise the match-data crawler process.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Crawlctl.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRAWLCTL_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the crawler once and follow it until it finishes.
    Run(RunArgs),
    /// Serve the start/stop/status HTTP API.
    Serve(ServeArgs),
}

/// Flags for `crawlctl run`. Unset values fall back to `[defaults]`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Crawl mode, e.g. `betinfo` or `flashscore`.
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// First round to crawl.
    #[arg(long, value_name = "ROUND")]
    pub start_round: Option<String>,

    /// Last round to crawl.
    #[arg(long, value_name = "ROUND")]
    pub end_round: Option<String>,

    /// Show the browser instead of running headless.
    #[arg(long)]
    pub no_headless: bool,

    /// Timeout in seconds handed to the crawler.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u32>,

    /// Print the command that would run, but don't start it.
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Merge the flags over configured defaults.
    pub fn launch_request(&self, defaults: &DefaultsSection) -> LaunchRequest {
        let mut request = defaults.launch_request();
        if let Some(mode) = &self.mode {
            request.mode = mode.clone();
        }
        request.start_round = self.start_round.clone();
        request.end_round = self.end_round.clone();
        if self.no_headless {
            request.headless = false;
        }
        if let Some(timeout) = self.timeout {
            request.timeout_seconds = timeout;
        }
        request
    }
}

/// Flags for `crawlctl serve`. Unset values fall back to `[server]`.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,
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
