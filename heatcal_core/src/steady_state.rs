//! Classification of aligned instants by heater state.

use crate::series::{ActuatorId, TimeSeries, Timestamp};

/// Duty sentinels used to recognise steady heater states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DutySentinels {
    /// Duty value of a heater that is off.
    pub off: f64,
    /// Duty value of a heater driven at full power.
    pub full: f64,
}

impl Default for DutySentinels {
    fn default() -> Self {
        Self {
            off: 0.0,
            full: 950.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteadyStateClass {
    /// Every heater off.
    Idle,
    /// One heater at full duty, every other heater off.
    IsolatedMax(ActuatorId),
}

// Sentinels are exact device values, not measurements. `-0.0` reads as off.
#[inline]
#[allow(clippy::float_cmp)]
fn is(v: f64, sentinel: f64) -> bool {
    v == sentinel
}

/// Decides which steady state, if any, an aligned instant belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SteadyStateSelector<'a> {
    duty: &'a TimeSeries,
    sentinels: DutySentinels,
}

impl<'a> SteadyStateSelector<'a> {
    pub fn new(duty: &'a TimeSeries, sentinels: DutySentinels) -> Self {
        Self { duty, sentinels }
    }

    /// True when every duty sample at `t` reads "off". An instant without
    /// duty samples is not idle.
    pub fn is_idle(&self, t: Timestamp) -> bool {
        let at = self.duty.at(t);
        !at.is_empty() && at.iter().all(|s| is(s.value, self.sentinels.off))
    }

    /// True when heater `a` reads "full" at `t` and every other heater reads "off".
    pub fn is_isolated_max(&self, t: Timestamp, a: ActuatorId) -> bool {
        let mut target_full = false;
        for s in self.duty.at(t) {
            if s.actuator == Some(a) {
                target_full = is(s.value, self.sentinels.full);
            } else if !is(s.value, self.sentinels.off) {
                return false;
            }
        }
        target_full
    }

    pub fn classify(&self, t: Timestamp) -> Option<SteadyStateClass> {
        if self.is_idle(t) {
            return Some(SteadyStateClass::Idle);
        }
        let at = self.duty.at(t);
        let mut on = at.iter().filter(|s| !is(s.value, self.sentinels.off));
        match (on.next(), on.next()) {
            (Some(s), None) if is(s.value, self.sentinels.full) => {
                s.actuator.map(SteadyStateClass::IsolatedMax)
            }
            _ => None,
        }
    }

    /// Aligned instants that are idle.
    pub fn idle_instants(&self, aligned: &[Timestamp]) -> Vec<Timestamp> {
        aligned.iter().copied().filter(|&t| self.is_idle(t)).collect()
    }

    /// Aligned instants where heater `a` runs at full duty alone.
    pub fn isolated_max_instants(&self, aligned: &[Timestamp], a: ActuatorId) -> Vec<Timestamp> {
        aligned
            .iter()
            .copied()
            .filter(|&t| self.is_isolated_max(t, a))
            .collect()
    }
}
