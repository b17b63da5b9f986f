mod calibrate;
mod cli;
mod error_fmt;

use std::fs;
use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr};
use heatcal_config::{Config, DeviceIdTable};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::calibrate::{CalibrateArgs, render_json, render_text, run_calibrate};
use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file {path:?}"))?;
    // Parse the config TOML right here
    let cfg: Config = toml::from_str(&content)
        .map_err(|e| eyre::eyre!("invalid configuration in {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &heatcal_config::Logging) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .wrap_err("invalid --log-level")?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    // Console logs go to stderr; stdout carries results.
    if cli.json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| eyre::eyre!("logging.file has no file name: {file:?}"))?;
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
            .wrap_err("invalid logging.level")?;
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    match &cli.cmd {
        Commands::Calibrate {
            telemetry,
            dump_samples,
            full_duty,
            collect,
            board_id,
        } => {
            let args = CalibrateArgs {
                telemetry,
                dump_samples: dump_samples.as_deref(),
                full_duty: *full_duty,
                collect: *collect,
                board_id: board_id.as_deref(),
            };
            let outcome = run_calibrate(&cfg, &args)?;
            if cli.json {
                println!("{}", render_json(&outcome));
            } else {
                println!("{}", render_text(&outcome));
            }
            // Partial results are printed above; the shortfall still sets the exit code.
            outcome.report.into_result().map_err(eyre::Report::new)?;
        }
        Commands::EncodeId { high, mid, low } => {
            let id = heatcal_core::encode_mcu_uuid([high.as_str(), mid.as_str(), low.as_str()])
                .map_err(eyre::Report::new)?;
            if cli.json {
                println!("{}", serde_json::json!({ "mcu_uuid": id.to_string() }));
            } else {
                println!("MCU UUID: {id}");
            }
        }
        Commands::LookupId { board_id } => {
            let Some(table_path) = cfg.device.id_table.as_deref() else {
                eyre::bail!("device.id_table is not configured");
            };
            let table = DeviceIdTable::load(table_path)?;
            match table.lookup(board_id) {
                Some(id) => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::json!({ "board_id": board_id, "mcu_uuid": id.to_string() })
                        );
                    } else {
                        println!("{id}");
                    }
                }
                None => {
                    tracing::warn!(board_id = %board_id, "board id not found in id table");
                    eyre::bail!("board id {board_id:?} not found in {table_path:?}");
                }
            }
        }
    }
    Ok(())
}
