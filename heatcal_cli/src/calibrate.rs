//! Calibration command: device id resolution, telemetry loading, engine run and output.

use std::path::Path;

use eyre::WrapErr;
use heatcal_config::{Config, DeviceCfg, DeviceIdTable, load_telemetry_csv};
use heatcal_core::{
    CalibrationCfg, CalibrationEngine, CalibrationReport, ShortfallPolicy, telemetry_series,
};
use serde_json::json;

#[derive(Debug)]
pub struct CalibrateArgs<'a> {
    pub telemetry: &'a Path,
    pub dump_samples: Option<&'a Path>,
    pub full_duty: Option<f64>,
    pub collect: bool,
    pub board_id: Option<&'a str>,
}

/// Resolve the device identifier: table hit first, configured fallback on a miss.
pub fn resolve_device_id(dev: &DeviceCfg, board_override: Option<&str>) -> eyre::Result<Option<u128>> {
    let Some(board_id) = board_override.or(dev.board_id.as_deref()) else {
        return Ok(dev.fallback_id);
    };
    let Some(table_path) = dev.id_table.as_deref() else {
        tracing::warn!(board_id, "no device.id_table configured; using configured fallback id");
        return Ok(dev.fallback_id);
    };
    let table = DeviceIdTable::load(table_path)?;
    match table.lookup(board_id) {
        Some(id) => {
            tracing::info!(board_id, mcu_uuid = %id, "target MCU id resolved");
            Ok(Some(id))
        }
        None => {
            tracing::warn!(
                board_id,
                table = %table_path.display(),
                fallback = ?dev.fallback_id,
                "board id not found in id table; using configured fallback id"
            );
            Ok(dev.fallback_id)
        }
    }
}

pub struct Outcome {
    pub device_id: Option<u128>,
    pub report: CalibrationReport,
}

pub fn run_calibrate(cfg: &Config, args: &CalibrateArgs<'_>) -> eyre::Result<Outcome> {
    let device_id = resolve_device_id(&cfg.device, args.board_id)?;

    let log = load_telemetry_csv(args.telemetry)?;
    tracing::info!(
        power = log.power.len(),
        duty = log.duty.len(),
        path = %args.telemetry.display(),
        "telemetry loaded"
    );
    let (power, duty) = telemetry_series(&log).map_err(eyre::Report::new)?;

    let mut core_cfg: CalibrationCfg = (&cfg.calibration).into();
    if let Some(full) = args.full_duty {
        core_cfg.sentinels.full = full;
    }
    if args.collect {
        core_cfg.on_shortfall = ShortfallPolicy::Collect;
    }

    let mut engine = CalibrationEngine::new(&power, &duty, core_cfg).map_err(eyre::Report::new)?;
    let report = engine.run().map_err(eyre::Report::new)?;

    if let Some(path) = args.dump_samples {
        dump_samples(path, &report).wrap_err_with(|| format!("write sample dump {path:?}"))?;
        tracing::info!(path = %path.display(), "filtered samples written");
    }

    Ok(Outcome { device_id, report })
}

fn dump_samples(path: &Path, report: &CalibrationReport) -> eyre::Result<()> {
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(["class", "actuator", "time", "value"])?;
    for p in &report.diagnostics.base {
        w.write_record([
            "base".to_string(),
            String::new(),
            p.timestamp.to_rfc3339(),
            p.watts.to_string(),
        ])?;
    }
    for (heater, points) in &report.diagnostics.max {
        for p in points {
            w.write_record([
                "max".to_string(),
                heater.to_string(),
                p.timestamp.to_rfc3339(),
                p.watts.to_string(),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

pub fn render_text(out: &Outcome) -> String {
    let mut s = String::new();
    match out.device_id {
        Some(id) => s.push_str(&format!("Device id: {id}\n")),
        None => s.push_str("Device id: unknown\n"),
    }
    let res = &out.report.result;
    s.push_str(&format!("Base power: {:.3} W\n", res.base_power_watts));
    for (heater, watts) in &res.max_power_by_actuator {
        s.push_str(&format!("Heater {heater} max power: {watts:.3} W\n"));
    }
    for short in &out.report.shortfalls {
        s.push_str(&format!("Heater skipped: {short}\n"));
    }
    s.push_str(if out.report.is_complete() {
        "Calibration complete."
    } else {
        "Calibration incomplete."
    });
    s
}

pub fn render_json(out: &Outcome) -> String {
    let res = &out.report.result;
    let max: serde_json::Map<String, serde_json::Value> = res
        .max_power_by_actuator
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    let shortfalls: Vec<serde_json::Value> = out
        .report
        .shortfalls
        .iter()
        .map(|s| json!({ "heater": s.actuator, "found": s.found, "required": s.required }))
        .collect();
    json!({
        // u128 ids do not fit JSON numbers
        "device_id": out.device_id.map(|id| id.to_string()),
        "base_power_w": res.base_power_watts,
        "max_power_w": max,
        "shortfalls": shortfalls,
        "complete": out.report.is_complete(),
    })
    .to_string()
}
