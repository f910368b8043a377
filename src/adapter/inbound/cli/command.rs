//! Argument parsing for the `cluster-hybrid` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG: &str = "config.toml";

/// Cluster follow/fade trading engine
#[derive(Parser, Debug)]
#[command(name = "cluster-hybrid")]
#[command(version)]
pub struct Cli {
    /// When to color terminal output
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Print one JSON object per output line
    #[arg(long, global = true)]
    pub json: bool,

    /// Print only warnings, errors and the final status
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trading loop until Ctrl-C or a risk halt
    Run(RunArgs),

    /// Validate inputs without trading
    #[command(subcommand)]
    Check(CheckCommand),
}

#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Load the TOML config and report engines, sessions and risk limits
    Config(ConfigPathArg),
}

#[derive(clap::Args, Debug)]
pub struct ConfigPathArg {
    /// TOML config to validate
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// TOML config with engines, session and risk settings
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Route orders to an in-memory paper account instead of the bridge
    #[arg(long)]
    pub dry_run: bool,

    /// Tracing filter overriding `[logging].level`, e.g. `debug`
    #[arg(long, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Emit tracing events as JSON
    #[arg(long)]
    pub json_logs: bool,
}
