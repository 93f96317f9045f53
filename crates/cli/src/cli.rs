//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Kinesis Output - log delivery to Kinesis Data Streams
#[derive(Parser, Debug)]
#[command(
    name = "kinesis-output",
    author,
    version,
    about = "Kinesis Data Streams log output",
    long_about = "Validates output plugin options and replays recorded host batches.\n\n\
                  Batches are msgpack files of [timestamp, record] entries, as the \n\
                  host runtime hands them to the output on flush."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "KINESIS_OUTPUT_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "KINESIS_OUTPUT_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate an options file without delivering anything
    Validate(ValidateArgs),

    /// Push recorded batches through the full flush pipeline
    Replay(ReplayArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to options file to validate (TOML or JSON)
    #[arg(short, long, default_value = "kinesis.toml", env = "KINESIS_OUTPUT_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `replay` command
#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// Path to options file (TOML or JSON)
    #[arg(short, long, default_value = "kinesis.toml", env = "KINESIS_OUTPUT_CONFIG")]
    pub config: PathBuf,

    /// Msgpack batch files, one flush each
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Tag reported with every flush
    #[arg(short, long, default_value = "replay")]
    pub tag: String,

    /// Delivery attempts per flush
    #[arg(long, default_value = "2", env = "KINESIS_OUTPUT_ATTEMPTS")]
    pub attempts: u32,

    /// Flush task timeout in seconds
    #[arg(long, default_value = "30", env = "KINESIS_OUTPUT_TIMEOUT")]
    pub timeout: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "KINESIS_OUTPUT_METRICS_PORT")]
    pub metrics_port: u16,
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
