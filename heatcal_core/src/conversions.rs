//! Conversions bridging `heatcal_config` types to `heatcal_core` types.

use crate::config::CalibrationCfg;
use crate::error::CalibrationError;
use crate::filter::AdmissibleRange;
use crate::series::{Measurement, TelemetrySample, TimeSeries};
use crate::steady_state::DutySentinels;

// ── AdmissibleRange ──────────────────────────────────────────────────────────

impl From<&heatcal_config::RangeCfg> for AdmissibleRange {
    fn from(c: &heatcal_config::RangeCfg) -> Self {
        Self {
            lo: c.above,
            hi: c.below,
        }
    }
}

// ── CalibrationCfg ───────────────────────────────────────────────────────────

impl From<&heatcal_config::CalibrationSchema> for CalibrationCfg {
    fn from(c: &heatcal_config::CalibrationSchema) -> Self {
        Self {
            base_range: (&c.base_range).into(),
            max_range: (&c.max_range).into(),
            sentinels: DutySentinels {
                off: c.off_duty,
                full: c.full_duty,
            },
            min_base_samples: c.min_base_samples,
            min_max_samples: c.min_max_samples,
            precision: c.precision,
            on_shortfall: c.on_shortfall,
        }
    }
}

// ── Telemetry ────────────────────────────────────────────────────────────────

impl From<&heatcal_config::PowerReading> for TelemetrySample {
    fn from(r: &heatcal_config::PowerReading) -> Self {
        TelemetrySample::power(r.time, r.watts)
    }
}

impl From<&heatcal_config::DutyReading> for TelemetrySample {
    fn from(r: &heatcal_config::DutyReading) -> Self {
        TelemetrySample::duty(r.time, r.actuator, r.duty)
    }
}

/// Split a loaded telemetry log into the `(power, duty)` series.
pub fn telemetry_series(
    log: &heatcal_config::TelemetryLog,
) -> Result<(TimeSeries, TimeSeries), CalibrationError> {
    let power = TimeSeries::from_unsorted(
        Measurement::Power,
        log.power.iter().map(TelemetrySample::from).collect(),
    )?;
    let duty = TimeSeries::from_unsorted(
        Measurement::Duty,
        log.duty.iter().map(TelemetrySample::from).collect(),
    )?;
    Ok((power, duty))
}
