//! Two-phase heater power calibration.
//!
//! Phase 1 takes the median of idle power readings as the base power. Phase 2
//! takes, per heater, the median of readings where that heater alone runs at
//! full duty and subtracts the base power. Both phases drop readings outside
//! their admissible range before estimating.

use std::collections::BTreeMap;

use crate::config::{CalibrationCfg, ShortfallPolicy};
use crate::error::{CalibrationError, InsufficientData, Phase};
use crate::filter::{AdmissibleRange, PowerPoint, reject_outliers};
use crate::series::{ActuatorId, Measurement, TimeSeries, Timestamp, align};
use crate::stats::{median, round_to};
use crate::steady_state::{DutySentinels, SteadyStateSelector};

/// Calibration constants derived from one batch of telemetry.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationResult {
    /// Device draw with every heater off (W).
    pub base_power_watts: f64,
    /// Net draw of each heater at full duty, base power removed (W).
    pub max_power_by_actuator: BTreeMap<ActuatorId, f64>,
}

/// Filtered samples each estimate was taken from.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub base: Vec<PowerPoint>,
    pub max: BTreeMap<ActuatorId, Vec<PowerPoint>>,
}

#[derive(Debug, Clone)]
pub struct CalibrationReport {
    pub result: CalibrationResult,
    /// Heaters left out of `result` under `ShortfallPolicy::Collect`.
    pub shortfalls: Vec<InsufficientData>,
    pub diagnostics: Diagnostics,
}

impl CalibrationReport {
    /// True when every heater in the duty stream was calibrated.
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty()
    }

    /// The result if every heater was calibrated, otherwise all shortfalls.
    pub fn into_result(self) -> Result<CalibrationResult, CalibrationError> {
        if self.shortfalls.is_empty() {
            Ok(self.result)
        } else {
            Err(CalibrationError::ActuatorShortfall(self.shortfalls))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Start,
    BasePowerComputed,
    Complete,
    Failed,
}

pub struct CalibrationEngine<'a> {
    power: &'a TimeSeries,
    duty: &'a TimeSeries,
    cfg: CalibrationCfg,
    state: EngineState,
    aligned: Vec<Timestamp>,
    base_power: Option<f64>,
    failure: Option<CalibrationError>,
    diagnostics: Diagnostics,
}

impl core::fmt::Debug for CalibrationEngine<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CalibrationEngine")
            .field("power_samples", &self.power.len())
            .field("duty_samples", &self.duty.len())
            .field("state", &self.state)
            .field("base_power", &self.base_power)
            .finish()
    }
}

impl<'a> CalibrationEngine<'a> {
    pub fn new(
        power: &'a TimeSeries,
        duty: &'a TimeSeries,
        cfg: CalibrationCfg,
    ) -> Result<Self, CalibrationError> {
        if power.kind() != Measurement::Power {
            return Err(CalibrationError::InvalidSeries(
                "power series holds duty samples".to_string(),
            ));
        }
        if duty.kind() != Measurement::Duty {
            return Err(CalibrationError::InvalidSeries(
                "duty series holds power samples".to_string(),
            ));
        }
        cfg.validate()?;
        Ok(Self {
            power,
            duty,
            cfg,
            state: EngineState::Start,
            aligned: Vec::new(),
            base_power: None,
            failure: None,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &CalibrationCfg {
        &self.cfg
    }

    fn fail(&mut self, err: CalibrationError) -> CalibrationError {
        self.state = EngineState::Failed;
        self.failure = Some(err.clone());
        err
    }

    fn selector(&self) -> SteadyStateSelector<'a> {
        SteadyStateSelector::new(self.duty, self.cfg.sentinels)
    }

    fn round(&self, x: f64) -> f64 {
        self.cfg.precision.map_or(x, |p| round_to(x, p))
    }

    /// Phase 1. Computed once; later calls return the cached value, or the
    /// failure if the engine already failed.
    pub fn compute_base_power(&mut self) -> Result<f64, CalibrationError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(base) = self.base_power {
            return Ok(base);
        }

        self.aligned = align(self.power, self.duty);
        tracing::debug!(
            power = self.power.len(),
            duty = self.duty.len(),
            aligned = self.aligned.len(),
            "aligned telemetry streams"
        );
        if self.aligned.is_empty() {
            return Err(self.fail(CalibrationError::MissingAlignment));
        }

        let idle = self.selector().idle_instants(&self.aligned);
        let kept = reject_outliers(self.power, &idle, self.cfg.base_range);
        tracing::debug!(idle = idle.len(), kept = kept.len(), "base power samples");
        if kept.len() < self.cfg.min_base_samples {
            return Err(self.fail(
                InsufficientData {
                    phase: Phase::BasePower,
                    actuator: None,
                    found: kept.len(),
                    required: self.cfg.min_base_samples,
                }
                .into(),
            ));
        }

        let watts: Vec<f64> = kept.iter().map(|p| p.watts).collect();
        let Some(m) = median(&watts) else {
            return Err(self.fail(CalibrationError::InvalidConfig(
                "base power estimate needs at least one sample",
            )));
        };
        let base = self.round(m);
        tracing::info!(base_power_w = base, samples = kept.len(), "base power computed");

        self.diagnostics.base = kept;
        self.base_power = Some(base);
        self.state = EngineState::BasePowerComputed;
        Ok(base)
    }

    /// Raw (not base-corrected) median for one heater, or its shortfall.
    fn isolated_max_median(
        &self,
        actuator: ActuatorId,
    ) -> (Vec<PowerPoint>, Result<f64, InsufficientData>) {
        let instants = self
            .selector()
            .isolated_max_instants(&self.aligned, actuator);
        let kept = reject_outliers(self.power, &instants, self.cfg.max_range);
        tracing::debug!(
            heater = actuator,
            isolated = instants.len(),
            kept = kept.len(),
            "max power samples"
        );
        let shortfall = InsufficientData {
            phase: Phase::MaxPower,
            actuator: Some(actuator),
            found: kept.len(),
            required: self.cfg.min_max_samples,
        };
        if kept.len() < self.cfg.min_max_samples {
            return (kept, Err(shortfall));
        }
        let watts: Vec<f64> = kept.iter().map(|p| p.watts).collect();
        match median(&watts) {
            Some(m) => (kept, Ok(m)),
            None => (kept, Err(shortfall)),
        }
    }

    /// Runs both phases and returns the report.
    ///
    /// Under `ShortfallPolicy::FailFast` the first heater short of samples
    /// fails the run. Under `Collect` such heaters are listed in
    /// `CalibrationReport::shortfalls` and left out of the result.
    pub fn run(&mut self) -> Result<CalibrationReport, CalibrationError> {
        let base = self.compute_base_power()?;

        let mut max_power_by_actuator: BTreeMap<ActuatorId, f64> = BTreeMap::new();
        let mut shortfalls = Vec::new();
        for actuator in self.duty.actuators() {
            let (kept, estimate) = self.isolated_max_median(actuator);
            self.diagnostics.max.insert(actuator, kept);
            match estimate {
                Ok(raw) => {
                    let net = self.round(raw - base);
                    tracing::info!(heater = actuator, max_power_w = net, "max power computed");
                    max_power_by_actuator.insert(actuator, net);
                }
                Err(shortfall) => match self.cfg.on_shortfall {
                    ShortfallPolicy::FailFast => return Err(self.fail(shortfall.into())),
                    ShortfallPolicy::Collect => {
                        tracing::warn!(
                            heater = actuator,
                            found = shortfall.found,
                            required = shortfall.required,
                            "not enough isolated full-duty samples; heater skipped"
                        );
                        shortfalls.push(shortfall);
                    }
                },
            }
        }

        self.state = EngineState::Complete;
        Ok(CalibrationReport {
            result: CalibrationResult {
                base_power_watts: base,
                max_power_by_actuator,
            },
            shortfalls,
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Calibrate with default sample minimums, 3-decimal rounding and fail-fast
/// handling of per-heater shortfalls.
pub fn calibrate(
    power: &TimeSeries,
    duty: &TimeSeries,
    base_range: AdmissibleRange,
    max_range: AdmissibleRange,
    full_duty: f64,
) -> Result<CalibrationResult, CalibrationError> {
    let cfg = CalibrationCfg {
        base_range,
        max_range,
        sentinels: DutySentinels {
            full: full_duty,
            ..DutySentinels::default()
        },
        ..CalibrationCfg::default()
    };
    CalibrationEngine::new(power, duty, cfg)?
        .run()?
        .into_result()
}
