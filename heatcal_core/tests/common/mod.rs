#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use heatcal_core::{ActuatorId, Measurement, TelemetrySample, TimeSeries, Timestamp};

pub fn ts(s: i64) -> Timestamp {
    Utc.timestamp_opt(1_760_860_800 + s, 0).unwrap()
}

/// Synthetic telemetry: one power reading and one duty reading per heater
/// at each instant, instants one minute apart.
#[derive(Default)]
pub struct Telemetry {
    power: Vec<TelemetrySample>,
    duty: Vec<TelemetrySample>,
    next: i64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, watts: f64, duties: &[(ActuatorId, f64)]) -> &mut Self {
        let t = ts(self.next);
        self.next += 60;
        self.power.push(TelemetrySample::power(t, watts));
        for &(a, d) in duties {
            self.duty.push(TelemetrySample::duty(t, a, d));
        }
        self
    }

    /// Duty readings without a matching power reading.
    pub fn push_duty_only(&mut self, duties: &[(ActuatorId, f64)]) -> &mut Self {
        let t = ts(self.next);
        self.next += 60;
        for &(a, d) in duties {
            self.duty.push(TelemetrySample::duty(t, a, d));
        }
        self
    }

    /// A power reading without duty readings.
    pub fn push_power_only(&mut self, watts: f64) -> &mut Self {
        let t = ts(self.next);
        self.next += 60;
        self.power.push(TelemetrySample::power(t, watts));
        self
    }

    pub fn idle(&mut self, watts: &[f64]) -> &mut Self {
        for &w in watts {
            self.push(w, &[(1, 0.0), (2, 0.0)]);
        }
        self
    }

    pub fn heater_full(&mut self, heater: ActuatorId, watts: &[f64]) -> &mut Self {
        let other = if heater == 1 { 2 } else { 1 };
        for &w in watts {
            self.push(w, &[(heater, 950.0), (other, 0.0)]);
        }
        self
    }

    pub fn series(&self) -> (TimeSeries, TimeSeries) {
        (
            TimeSeries::from_unsorted(Measurement::Power, self.power.clone()).unwrap(),
            TimeSeries::from_unsorted(Measurement::Duty, self.duty.clone()).unwrap(),
        )
    }
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
