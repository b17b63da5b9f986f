#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Heater power calibration from telemetry (I/O-free).
//!
//! Derives a device's idle ("base") power and each heater's net power at full
//! duty from a power stream and a per-heater duty stream. Loading the streams
//! is the caller's job; see `heatcal_config` for the CSV loader.
//!
//! ## Architecture
//!
//! - **Series**: ordered `TimeSeries` with binary-search lookup and alignment (`series`)
//! - **Classification**: idle / isolated full-duty instants (`steady_state`)
//! - **Filtering**: exclusive admissible ranges (`filter`)
//! - **Estimation**: median and rounding (`stats`)
//! - **Engine**: two-phase state machine (`calibration`)
//! - **Device id**: MCU identifier packing (`device_id`)

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod device_id;
pub mod error;
pub mod filter;
pub mod series;
pub mod stats;
pub mod steady_state;

pub use builder::CalibrationEngineBuilder;
pub use calibration::{
    CalibrationEngine, CalibrationReport, CalibrationResult, Diagnostics, EngineState, calibrate,
};
pub use config::{CalibrationCfg, ShortfallPolicy};
pub use conversions::telemetry_series;
pub use device_id::encode_mcu_uuid;
pub use error::{CalibrationError, InsufficientData, Phase};
pub use filter::{AdmissibleRange, PowerPoint};
pub use series::{ActuatorId, Measurement, TelemetrySample, TimeSeries, Timestamp, align};
pub use steady_state::{DutySentinels, SteadyStateClass, SteadyStateSelector};
