//! Human-readable error descriptions and structured JSON error formatting.

use heatcal_core::error::{BuildError, CalibrationError, DeviceIdError, Phase};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(ce) = err.downcast_ref::<CalibrationError>() {
        return match ce {
            CalibrationError::MissingAlignment => {
                "What happened: The power and duty streams share no timestamp.\nLikely causes: The export holds only one measurement, or power and heater rows were sampled at different instants.\nHow to fix: Export pwr/power and htr/pwm from the same query window so their timestamps coincide.".to_string()
            }
            CalibrationError::InsufficientData(d) if d.phase == Phase::BasePower => format!(
                "What happened: Not enough idle samples ({} found, {} needed).\nLikely causes: Heaters were rarely all off, or idle readings fall outside calibration.base_range.\nHow to fix: Record a longer idle period, or review calibration.base_range / min_base_samples in the config.",
                d.found, d.required
            ),
            CalibrationError::InsufficientData(d) => format!(
                "What happened: Not enough isolated full-duty samples for heater {} ({} found, {} needed).\nLikely causes: The heater never ran alone at full duty, full_duty does not match the device, or readings fall outside calibration.max_range.\nHow to fix: Run each heater alone at full duty for a while, check calibration.full_duty, or pass --collect to calibrate the other heaters.",
                d.actuator.map_or_else(|| "?".to_string(), |a| a.to_string()),
                d.found,
                d.required
            ),
            CalibrationError::ActuatorShortfall(list) => {
                let heaters: Vec<String> = list
                    .iter()
                    .map(|d| {
                        format!(
                            "{} ({}/{})",
                            d.actuator.map_or_else(|| "?".to_string(), |a| a.to_string()),
                            d.found,
                            d.required
                        )
                    })
                    .collect();
                format!(
                    "What happened: Some heaters could not be calibrated: {}.\nLikely causes: Those heaters never ran alone at full duty long enough.\nHow to fix: Record isolated full-duty runs for them; the other results above are usable.",
                    heaters.join(", ")
                )
            }
            CalibrationError::InvalidSeries(msg) => format!(
                "What happened: Telemetry is inconsistent ({msg}).\nLikely causes: Duplicate rows for the same instant and heater.\nHow to fix: De-duplicate the export and rerun."
            ),
            CalibrationError::InvalidConfig(msg) => format!(
                "What happened: Invalid calibration settings ({msg}).\nLikely causes: Out-of-range values in [calibration].\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: {be}.\nLikely causes: Internal wiring of the calibration engine.\nHow to fix: Re-run with --log-level=debug and report the output."
        );
    }

    if let Some(de) = err.downcast_ref::<DeviceIdError>() {
        return format!(
            "What happened: {de}.\nLikely causes: A word is not hexadecimal or is wider than 32 bits.\nHow to fix: Pass the three words exactly as the device reports them, e.g. 0x001D0026."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("telemetry csv must have headers") {
        return format!(
            "Invalid headers in telemetry CSV. Expected '{}'.",
            heatcal_config::TELEMETRY_HEADERS.join(",")
        );
    }

    if lower.contains("open telemetry csv") {
        return format!(
            "What happened: The telemetry file could not be opened.\nHow to fix: Check the --telemetry path. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("calibration.") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for base-power failures, 4 for heater shortfalls, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<CalibrationError>().and_then(CalibrationError::phase) {
        Some(Phase::BasePower) => 3,
        Some(Phase::MaxPower) => 4,
        None => 1,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<CalibrationError>() {
        Some(CalibrationError::MissingAlignment) => "MissingAlignment",
        Some(CalibrationError::InsufficientData(_)) => "InsufficientData",
        Some(CalibrationError::ActuatorShortfall(_)) => "ActuatorShortfall",
        Some(CalibrationError::InvalidSeries(_)) => "InvalidSeries",
        Some(CalibrationError::InvalidConfig(_)) => "InvalidConfig",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let msg = humanize(err);
    let details = match err.downcast_ref::<CalibrationError>() {
        Some(CalibrationError::InsufficientData(d)) => Some(json!({
            "phase": d.phase.to_string(),
            "heater": d.actuator,
            "found": d.found,
            "required": d.required,
        })),
        Some(CalibrationError::ActuatorShortfall(list)) => Some(json!(
            list.iter()
                .map(|d| json!({ "heater": d.actuator, "found": d.found, "required": d.required }))
                .collect::<Vec<_>>()
        )),
        Some(CalibrationError::MissingAlignment) => Some(json!({ "found": 0 })),
        _ => None,
    };

    let obj = if let Some(d) = details {
        json!({ "reason": reason_name(err), "details": d, "message": msg })
    } else {
        json!({ "reason": reason_name(err), "message": msg })
    };
    obj.to_string()
}
