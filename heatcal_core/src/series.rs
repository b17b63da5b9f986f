//! Ordered telemetry series and timestamp alignment.
//!
//! A `TimeSeries` is a sorted vector of samples of one measurement kind.
//! Lookups by timestamp use binary search over that vector.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::CalibrationError;

pub type Timestamp = DateTime<Utc>;
/// Heater index as reported in the duty stream.
pub type ActuatorId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// Device-level electrical power (W).
    Power,
    /// Commanded heater duty cycle (device units).
    Duty,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub timestamp: Timestamp,
    pub measurement: Measurement,
    pub value: f64,
    pub actuator: Option<ActuatorId>,
}

impl TelemetrySample {
    pub fn power(timestamp: Timestamp, watts: f64) -> Self {
        Self {
            timestamp,
            measurement: Measurement::Power,
            value: watts,
            actuator: None,
        }
    }

    pub fn duty(timestamp: Timestamp, actuator: ActuatorId, value: f64) -> Self {
        Self {
            timestamp,
            measurement: Measurement::Duty,
            value,
            actuator: Some(actuator),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimeSeries {
    kind: Measurement,
    samples: Vec<TelemetrySample>,
}

impl TimeSeries {
    /// Build a series from samples already ordered by timestamp.
    ///
    /// Rejects samples of another kind, power samples carrying a heater id,
    /// duty samples without one, decreasing timestamps and repeated
    /// `(timestamp, heater)` pairs.
    pub fn new(kind: Measurement, samples: Vec<TelemetrySample>) -> Result<Self, CalibrationError> {
        let mut group: BTreeSet<Option<ActuatorId>> = BTreeSet::new();
        let mut prev: Option<Timestamp> = None;
        for (i, s) in samples.iter().enumerate() {
            if s.measurement != kind {
                return Err(CalibrationError::InvalidSeries(format!(
                    "sample {i} is {:?}, series is {kind:?}",
                    s.measurement
                )));
            }
            match (kind, s.actuator) {
                (Measurement::Power, Some(a)) => {
                    return Err(CalibrationError::InvalidSeries(format!(
                        "power sample {i} carries heater id {a}"
                    )));
                }
                (Measurement::Duty, None) => {
                    return Err(CalibrationError::InvalidSeries(format!(
                        "duty sample {i} has no heater id"
                    )));
                }
                _ => {}
            }
            match prev.map(|p| s.timestamp.cmp(&p)) {
                Some(Ordering::Less) => {
                    return Err(CalibrationError::InvalidSeries(format!(
                        "timestamps decrease at sample {i} ({})",
                        s.timestamp
                    )));
                }
                Some(Ordering::Equal) => {}
                _ => group.clear(),
            }
            if !group.insert(s.actuator) {
                return Err(CalibrationError::InvalidSeries(format!(
                    "duplicate sample at {} for {}",
                    s.timestamp,
                    s.actuator
                        .map_or_else(|| "device".to_string(), |a| format!("heater {a}"))
                )));
            }
            prev = Some(s.timestamp);
        }
        Ok(Self { kind, samples })
    }

    /// Like `new`, but sorts by `(timestamp, heater)` first. The sort is stable.
    pub fn from_unsorted(
        kind: Measurement,
        mut samples: Vec<TelemetrySample>,
    ) -> Result<Self, CalibrationError> {
        samples.sort_by_key(|s| (s.timestamp, s.actuator));
        Self::new(kind, samples)
    }

    pub fn kind(&self) -> Measurement {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    /// All samples recorded at exactly `t`.
    pub fn at(&self, t: Timestamp) -> &[TelemetrySample] {
        let start = self.samples.partition_point(|s| s.timestamp < t);
        let end = start + self.samples[start..].partition_point(|s| s.timestamp <= t);
        &self.samples[start..end]
    }

    /// Value at `t` for the given heater (`None` for power).
    pub fn value_at(&self, t: Timestamp, actuator: Option<ActuatorId>) -> Option<f64> {
        self.at(t)
            .iter()
            .find(|s| s.actuator == actuator)
            .map(|s| s.value)
    }

    /// Distinct timestamps in ascending order.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        let mut out: Vec<Timestamp> = self.samples.iter().map(|s| s.timestamp).collect();
        out.dedup();
        out
    }

    /// Heater ids present in the series, ascending.
    pub fn actuators(&self) -> BTreeSet<ActuatorId> {
        self.samples.iter().filter_map(|s| s.actuator).collect()
    }
}

/// Timestamps present in both series, ascending and without repeats.
pub fn align(left: &TimeSeries, right: &TimeSeries) -> Vec<Timestamp> {
    let a = left.timestamps();
    let b = right.timestamps();
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0usize, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
