//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// kube-eventer - forwards Kubernetes events to configured sinks
#[derive(Parser, Debug)]
#[command(
    name = "kube-eventer",
    author,
    version,
    about = "Forward Kubernetes events to log, Kafka and webhook sinks",
    long_about = "Builds sinks from descriptor strings such as \n\
                  `webhook://host/path?level=Warning&namespaces=default`, reads event \n\
                  batches as NDJSON and delivers every batch to every sink."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "KUBE_EVENTER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "KUBE_EVENTER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the sinks and dispatch event batches read from the input
    Run(RunArgs),

    /// Validate configuration file without building sinks
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "KUBE_EVENTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Sink descriptor, appended after the configured ones (repeatable)
    #[arg(long = "sink", value_name = "DESCRIPTOR")]
    pub sinks: Vec<String>,

    /// Cluster name shown in notifications (overrides the config file)
    #[arg(long, env = "CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    /// NDJSON input file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub input: String,

    /// Metrics server port (overrides the config file, 0 = disabled)
    #[arg(long, env = "KUBE_EVENTER_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "eventer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
