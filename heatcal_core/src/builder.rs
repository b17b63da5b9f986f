//! Builder for `CalibrationEngine`.
//!
//! Missing inputs surface as typed `BuildError`s wrapped in `eyre::Report`,
//! so callers can `downcast_ref` them.

use crate::calibration::CalibrationEngine;
use crate::config::CalibrationCfg;
use crate::error::{BuildError, CalibrationError, Result};
use crate::filter::AdmissibleRange;
use crate::series::TimeSeries;

#[derive(Debug, Default)]
pub struct CalibrationEngineBuilder<'a> {
    power: Option<&'a TimeSeries>,
    duty: Option<&'a TimeSeries>,
    cfg: CalibrationCfg,
}

impl<'a> CalibrationEngine<'a> {
    /// Start building an engine with the default configuration.
    pub fn builder() -> CalibrationEngineBuilder<'a> {
        CalibrationEngineBuilder::default()
    }
}

impl<'a> CalibrationEngineBuilder<'a> {
    pub fn with_power(mut self, power: &'a TimeSeries) -> Self {
        self.power = Some(power);
        self
    }

    pub fn with_duty(mut self, duty: &'a TimeSeries) -> Self {
        self.duty = Some(duty);
        self
    }

    pub fn with_config(mut self, cfg: CalibrationCfg) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn with_base_range(mut self, range: AdmissibleRange) -> Self {
        self.cfg.base_range = range;
        self
    }

    pub fn with_max_range(mut self, range: AdmissibleRange) -> Self {
        self.cfg.max_range = range;
        self
    }

    pub fn with_full_duty(mut self, full: f64) -> Self {
        self.cfg.sentinels.full = full;
        self
    }

    pub fn try_build(self) -> Result<CalibrationEngine<'a>> {
        let power = self
            .power
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPower))?;
        let duty = self
            .duty
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDuty))?;
        CalibrationEngine::new(power, duty, self.cfg).map_err(|e| match e {
            CalibrationError::InvalidConfig(msg) => {
                eyre::Report::new(BuildError::InvalidConfig(msg))
            }
            other => eyre::Report::new(other),
        })
    }
}
