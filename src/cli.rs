// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `calcdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "calcdag",
    version,
    about = "Evaluate arithmetic expressions as a DAG of tasks spread over workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Calcdag.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CALCDAG_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve the HTTP API and schedule tasks.
    Orchestrator {
        /// Address to listen on; overrides `[orchestrator].bind`.
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Run a worker pool against a remote orchestrator.
    Agent {
        /// Overrides `[agent].orchestrator_url`.
        #[arg(long, value_name = "URL")]
        orchestrator_url: Option<String>,

        /// Number of workers; overrides `[agent].computing_power`.
        #[arg(long, value_name = "N")]
        computing_power: Option<NonZeroUsize>,
    },

    /// Run the orchestrator and an in-process worker pool together.
    Local {
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,

        #[arg(long, value_name = "N")]
        computing_power: Option<NonZeroUsize>,
    },

    /// Compile an expression and print its task DAG without running it.
    Check {
        expression: String,
    },
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
