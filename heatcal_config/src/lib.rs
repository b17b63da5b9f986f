#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema, telemetry CSV loading and device-id lookup for heater calibration.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The telemetry loader enforces the export headers and splits rows into the
//!   power stream and the per-heater duty stream.
//! - `DeviceIdTable` maps board ids to MCU identifiers.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::Deserializer;

/// Exclusive admissible range for power samples (watts). A missing bound is open.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RangeCfg {
    /// Samples must be strictly greater than this value.
    pub above: Option<f64>,
    /// Samples must be strictly less than this value.
    pub below: Option<f64>,
}

/// What to do when one heater has too few isolated full-duty samples.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallPolicy {
    /// Stop at the first heater that falls short.
    #[default]
    FailFast,
    /// Calibrate every heater, then report all shortfalls together.
    Collect,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationSchema {
    /// Duty value meaning "heater at full power" (device units).
    pub full_duty: f64,
    /// Duty value meaning "heater off".
    pub off_duty: f64,
    /// Minimum surviving idle samples; 11 reproduces the "more than 10" rule.
    pub min_base_samples: usize,
    /// Minimum surviving isolated full-duty samples per heater.
    pub min_max_samples: usize,
    /// Decimal places kept in the result; `None` disables rounding.
    pub precision: Option<u32>,
    pub on_shortfall: ShortfallPolicy,
    pub base_range: RangeCfg,
    pub max_range: RangeCfg,
}

impl Default for CalibrationSchema {
    fn default() -> Self {
        Self {
            full_duty: 950.0,
            off_duty: 0.0,
            min_base_samples: 11,
            min_max_samples: 4,
            precision: Some(3),
            on_shortfall: ShortfallPolicy::FailFast,
            base_range: RangeCfg {
                above: None,
                below: Some(1.0),
            },
            max_range: RangeCfg {
                above: Some(1.5),
                below: Some(3.0),
            },
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DeviceCfg {
    /// Board id as printed on the unit; resolved through `id_table`.
    pub board_id: Option<String>,
    /// Two-column CSV (`board_id,mcu_uuid`), `#` comments allowed.
    pub id_table: Option<PathBuf>,
    /// Identifier used when the board id is absent from the table.
    /// Accepts an integer or, for ids wider than 64 bits, a decimal string.
    #[serde(deserialize_with = "de_device_id")]
    pub fallback_id: Option<u128>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeviceIdToml {
    Int(u64),
    Text(String),
}

fn de_device_id<'de, D>(deserializer: D) -> Result<Option<u128>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<DeviceIdToml> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(DeviceIdToml::Int(v)) => Ok(Some(u128::from(v))),
        Some(DeviceIdToml::Text(s)) => s
            .trim()
            .parse::<u128>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid device id {s:?}: {e}"))),
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceCfg,
    pub calibration: CalibrationSchema,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn validate_range(name: &str, r: &RangeCfg) -> eyre::Result<()> {
    for (bound, v) in [("above", r.above), ("below", r.below)] {
        if let Some(v) = v
            && !v.is_finite()
        {
            eyre::bail!("calibration.{name}.{bound} must be finite");
        }
    }
    if let (Some(lo), Some(hi)) = (r.above, r.below)
        && lo >= hi
    {
        eyre::bail!("calibration.{name}: above ({lo}) must be < below ({hi})");
    }
    Ok(())
}

impl Config {
    #[allow(clippy::float_cmp)]
    pub fn validate(&self) -> eyre::Result<()> {
        let c = &self.calibration;
        if !c.full_duty.is_finite() || !c.off_duty.is_finite() {
            eyre::bail!("calibration.full_duty and calibration.off_duty must be finite");
        }
        if c.full_duty == c.off_duty {
            eyre::bail!("calibration.full_duty must differ from calibration.off_duty");
        }
        if c.min_base_samples == 0 {
            eyre::bail!("calibration.min_base_samples must be >= 1");
        }
        if c.min_max_samples == 0 {
            eyre::bail!("calibration.min_max_samples must be >= 1");
        }
        if let Some(p) = c.precision
            && p > 12
        {
            eyre::bail!("calibration.precision must be <= 12");
        }
        validate_range("base_range", &c.base_range)?;
        validate_range("max_range", &c.max_range)?;

        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        if self.device.board_id.is_some() && self.device.id_table.is_none() {
            eyre::bail!("device.board_id requires device.id_table");
        }

        Ok(())
    }
}

/// One row of an InfluxDB CSV export.
///
/// Expected headers:
/// _time,_measurement,_field,_value,actuator_instance
///
/// Example:
/// _time,_measurement,_field,_value,actuator_instance
/// 2025-10-19T08:00:00Z,pwr,power,0.21,
/// 2025-10-19T08:00:00Z,htr,pwm,0,1
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryRow {
    #[serde(rename = "_time")]
    pub time: DateTime<Utc>,
    #[serde(rename = "_measurement")]
    pub measurement: String,
    #[serde(rename = "_field")]
    pub field: String,
    #[serde(rename = "_value")]
    pub value: f64,
    pub actuator_instance: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerReading {
    pub time: DateTime<Utc>,
    pub watts: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutyReading {
    pub time: DateTime<Utc>,
    pub actuator: u32,
    pub duty: f64,
}

/// Power and duty readings split out of a telemetry export, each sorted by time.
#[derive(Debug, Default, Clone)]
pub struct TelemetryLog {
    pub power: Vec<PowerReading>,
    pub duty: Vec<DutyReading>,
}

pub const TELEMETRY_HEADERS: [&str; 5] = [
    "_time",
    "_measurement",
    "_field",
    "_value",
    "actuator_instance",
];

pub fn load_telemetry_csv(path: &Path) -> eyre::Result<TelemetryLog> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open telemetry CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != TELEMETRY_HEADERS {
        eyre::bail!(
            "telemetry CSV must have headers '{}', got: {}",
            TELEMETRY_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut log = TelemetryLog::default();
    for rec in rdr.records() {
        // Physical line where the record starts; quoted fields may span lines.
        let record = match rec {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, csv::Position::line);
                eyre::bail!("invalid CSV row {}: {}", line, e)
            }
        };
        let line = record.position().map_or(0, csv::Position::line);
        let row: TelemetryRow = record
            .deserialize(Some(&headers))
            .map_err(|e| eyre::eyre!("invalid CSV row {}: {}", line, e))?;
        match (row.measurement.as_str(), row.field.as_str()) {
            ("pwr", "power") => log.power.push(PowerReading {
                time: row.time,
                watts: row.value,
            }),
            ("htr", "pwm") => {
                let Some(actuator) = row.actuator_instance else {
                    eyre::bail!("invalid CSV row {}: pwm row without actuator_instance", line);
                };
                log.duty.push(DutyReading {
                    time: row.time,
                    actuator,
                    duty: row.value,
                });
            }
            _ => {}
        }
    }

    log.power.sort_by_key(|r| r.time);
    log.duty.sort_by_key(|r| (r.time, r.actuator));
    Ok(log)
}

/// Board id → MCU identifier table.
#[derive(Debug, Default, Clone)]
pub struct DeviceIdTable {
    ids: HashMap<String, u128>,
}

impl DeviceIdTable {
    /// Load a headerless `board_id,mcu_uuid` CSV. Lines starting with `#` are skipped.
    /// When a board id appears twice the first entry wins.
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| eyre::eyre!("open device id table {:?}: {}", path, e))?;

        let mut ids = HashMap::new();
        for (idx, rec) in rdr.records().enumerate() {
            let record = rec.map_err(|e| eyre::eyre!("read device id table {:?}: {}", path, e))?;
            if record.len() < 2 {
                eyre::bail!("device id table row {} needs two columns", idx + 1);
            }
            let board = record[0].to_string();
            let id = record[1].parse::<u128>().map_err(|e| {
                eyre::eyre!(
                    "device id table row {}: invalid identifier {:?}: {}",
                    idx + 1,
                    &record[1],
                    e
                )
            })?;
            ids.entry(board).or_insert(id);
        }
        Ok(Self { ids })
    }

    pub fn lookup(&self, board_id: &str) -> Option<u128> {
        self.ids.get(board_id.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = load_toml("").unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.calibration.min_base_samples, 11);
        assert_eq!(cfg.calibration.min_max_samples, 4);
        assert_eq!(cfg.calibration.base_range.below, Some(1.0));
        assert_eq!(cfg.calibration.max_range.above, Some(1.5));
        assert_eq!(cfg.calibration.on_shortfall, ShortfallPolicy::FailFast);
    }

    #[test]
    fn fallback_id_accepts_wide_strings() {
        let cfg = load_toml(
            "[device]\nfallback_id = \"36125667584709914216457778738\"\n",
        )
        .unwrap();
        assert_eq!(
            cfg.device.fallback_id,
            Some(36_125_667_584_709_914_216_457_778_738)
        );
        let cfg = load_toml("[device]\nfallback_id = 42\n").unwrap();
        assert_eq!(cfg.device.fallback_id, Some(42));
    }

    #[test]
    fn shortfall_policy_parses_snake_case() {
        let cfg = load_toml("[calibration]\non_shortfall = \"collect\"\n").unwrap();
        assert_eq!(cfg.calibration.on_shortfall, ShortfallPolicy::Collect);
    }
}
