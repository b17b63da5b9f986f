use std::fs;

use heatcal_config::{ShortfallPolicy, load_telemetry_csv, load_toml};
use heatcal_core::{
    AdmissibleRange, CalibrationCfg, CalibrationEngine, CalibrationError, telemetry_series,
};
use rstest::rstest;
use tempfile::tempdir;

#[rstest]
fn schema_maps_onto_runtime_config() {
    let cfg = load_toml(
        r#"
[calibration]
full_duty = 1000
min_base_samples = 20
precision = 2
on_shortfall = "collect"

[calibration.base_range]
above = -0.1
below = 0.8

[calibration.max_range]
above = 2.0
"#,
    )
    .unwrap();
    cfg.validate().unwrap();

    let core: CalibrationCfg = (&cfg.calibration).into();
    assert_eq!(core.sentinels.full, 1000.0);
    assert_eq!(core.sentinels.off, 0.0);
    assert_eq!(core.min_base_samples, 20);
    assert_eq!(core.min_max_samples, 4);
    assert_eq!(core.precision, Some(2));
    assert_eq!(core.on_shortfall, ShortfallPolicy::Collect);
    assert_eq!(core.base_range, AdmissibleRange::new(Some(-0.1), Some(0.8)));
    assert_eq!(core.max_range, AdmissibleRange::new(Some(2.0), None));
}

#[rstest]
fn default_schema_matches_default_runtime_config() {
    let cfg = load_toml("").unwrap();
    let from_schema: CalibrationCfg = (&cfg.calibration).into();
    let default = CalibrationCfg::default();
    assert_eq!(from_schema.base_range, default.base_range);
    assert_eq!(from_schema.max_range, default.max_range);
    assert_eq!(from_schema.sentinels, default.sentinels);
    assert_eq!(from_schema.min_base_samples, default.min_base_samples);
    assert_eq!(from_schema.min_max_samples, default.min_max_samples);
    assert_eq!(from_schema.precision, default.precision);
}

fn write_export(dir: &tempfile::TempDir, idle: usize, heater1: usize) -> std::path::PathBuf {
    let mut csv = String::from("_time,_measurement,_field,_value,actuator_instance\n");
    let mut minute = 0;
    let mut row = |watts: f64, d1: u32, d2: u32, csv: &mut String| {
        let t = format!("2025-10-19T08:{minute:02}:00Z");
        // duty rows first to check that the loader sorts
        csv.push_str(&format!("{t},htr,pwm,{d2},2\n"));
        csv.push_str(&format!("{t},htr,pwm,{d1},1\n"));
        csv.push_str(&format!("{t},pwr,power,{watts},\n"));
        csv.push_str(&format!("{t},pwr,voltage,5.01,\n"));
        minute += 1;
    };
    for i in 0..idle {
        row(0.18 + 0.004 * i as f64, 0, 0, &mut csv);
    }
    for _ in 0..heater1 {
        row(2.3, 950, 0, &mut csv);
    }
    for _ in 0..4 {
        row(2.6, 0, 950, &mut csv);
    }
    let path = dir.path().join("export.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[rstest]
fn csv_export_calibrates_end_to_end() {
    let dir = tempdir().unwrap();
    let path = write_export(&dir, 11, 4);
    let log = load_telemetry_csv(&path).unwrap();
    assert_eq!(log.power.len(), 19);
    assert_eq!(log.duty.len(), 38);

    let (power, duty) = telemetry_series(&log).unwrap();
    let report = CalibrationEngine::new(&power, &duty, CalibrationCfg::default())
        .unwrap()
        .run()
        .unwrap();
    // idle median is the 6th of 0.18, 0.184, ... 0.22
    assert!((report.result.base_power_watts - 0.2).abs() < 1e-9);
    assert!((report.result.max_power_by_actuator[&1] - 2.1).abs() < 1e-9);
    assert!((report.result.max_power_by_actuator[&2] - 2.4).abs() < 1e-9);
}

#[rstest]
fn csv_export_with_too_few_idle_rows_fails() {
    let dir = tempdir().unwrap();
    let path = write_export(&dir, 10, 4);
    let log = load_telemetry_csv(&path).unwrap();
    let (power, duty) = telemetry_series(&log).unwrap();
    let err = CalibrationEngine::new(&power, &duty, CalibrationCfg::default())
        .unwrap()
        .run()
        .unwrap_err();
    assert_eq!(err.found(), Some(10));
    assert!(matches!(err, CalibrationError::InsufficientData(_)));
}
