//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "scalebridge", version, about = "Serial scale to POS bridge")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/scalebridge.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read the scale and publish settled weighings until interrupted
    Run {
        /// Use the built-in simulated scale instead of the serial port
        #[arg(long, action = ArgAction::SetTrue)]
        simulate: bool,
        /// Read the link inside the pipeline loop instead of on a reader thread
        #[arg(long, action = ArgAction::SetTrue)]
        direct: bool,
        /// Stop after this many weighings
        #[arg(long, value_name = "N")]
        max_events: Option<u64>,
        /// Do not start the WebSocket server even if enabled in the config
        #[arg(long, action = ArgAction::SetTrue)]
        no_websocket: bool,
        /// Delay between simulated frames
        #[arg(long, value_name = "MS", default_value_t = 100)]
        sim_interval_ms: u64,
    },
    /// Print the most recent audit-log entries as JSON lines
    Recent {
        /// Number of entries
        #[arg(long, default_value_t = 10)]
        count: usize,
    },
    /// Validate the config and print the effective settings
    SelfCheck,
    /// List serial ports visible to the OS
    Ports,
}
