use std::fmt;

use thiserror::Error;

use crate::series::ActuatorId;

/// Calibration phase in which a sample shortfall was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    BasePower,
    MaxPower,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BasePower => f.write_str("base power"),
            Phase::MaxPower => f.write_str("max power"),
        }
    }
}

/// Too few samples survived classification and outlier rejection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{phase}: not enough samples{}: found {found}, need at least {required}", fmt_actuator(.actuator))]
pub struct InsufficientData {
    pub phase: Phase,
    pub actuator: Option<ActuatorId>,
    pub found: usize,
    pub required: usize,
}

fn fmt_actuator(a: &Option<ActuatorId>) -> String {
    a.map(|a| format!(" for heater {a}")).unwrap_or_default()
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("power and duty streams share no timestamp")]
    MissingAlignment,
    #[error(transparent)]
    InsufficientData(#[from] InsufficientData),
    #[error("{} heater(s) lack isolated full-duty samples", .0.len())]
    ActuatorShortfall(Vec<InsufficientData>),
    #[error("invalid series: {0}")]
    InvalidSeries(String),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

impl CalibrationError {
    /// Phase the failure belongs to, if it is a data shortfall.
    /// A missing alignment surfaces in the first phase.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            CalibrationError::MissingAlignment => Some(Phase::BasePower),
            CalibrationError::InsufficientData(d) => Some(d.phase),
            CalibrationError::ActuatorShortfall(_) => Some(Phase::MaxPower),
            _ => None,
        }
    }

    /// Number of usable samples found, when the failure is a shortfall on a single set.
    pub fn found(&self) -> Option<usize> {
        match self {
            CalibrationError::MissingAlignment => Some(0),
            CalibrationError::InsufficientData(d) => Some(d.found),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing power series")]
    MissingPower,
    #[error("missing duty series")]
    MissingDuty,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceIdError {
    #[error("invalid hex field {0:?}")]
    InvalidHex(String),
    #[error("hex field {0:?} exceeds 32 bits")]
    TooWide(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
