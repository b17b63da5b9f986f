//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "heatcal", version, about = "Heater power calibration CLI")]
pub struct Cli {
    /// Path to config TOML (defaults apply when the file is absent)
    #[arg(long, value_name = "FILE", default_value = "etc/heatcal.toml")]
    pub config: PathBuf,

    /// Print results and errors as JSON and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive base power and per-heater max power from a telemetry export
    Calibrate {
        /// Telemetry CSV (_time,_measurement,_field,_value,actuator_instance)
        #[arg(long, value_name = "FILE")]
        telemetry: PathBuf,
        /// Write the filtered samples behind each estimate to this CSV
        #[arg(long, value_name = "FILE")]
        dump_samples: Option<PathBuf>,
        /// Override calibration.full_duty
        #[arg(long, value_name = "DUTY")]
        full_duty: Option<f64>,
        /// Calibrate every heater and report all shortfalls instead of stopping at the first
        #[arg(long, action = ArgAction::SetTrue)]
        collect: bool,
        /// Override device.board_id
        #[arg(long, value_name = "ID")]
        board_id: Option<String>,
    },
    /// Pack the three MCU id words into the integer identifier
    EncodeId {
        /// First (most significant) hex word, e.g. 0x001D0026
        high: String,
        /// Second hex word
        mid: String,
        /// Third (least significant) hex word
        low: String,
    },
    /// Look a board id up in the configured id table
    LookupId {
        /// Board id as listed in the table
        board_id: String,
    },
}
