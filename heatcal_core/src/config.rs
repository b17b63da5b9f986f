//! Runtime configuration for the calibration engine.
//!
//! Separate from the TOML-deserialized schema in `heatcal_config`; see
//! `conversions` for the mapping.

use crate::error::CalibrationError;
use crate::filter::AdmissibleRange;
use crate::steady_state::DutySentinels;

pub use heatcal_config::ShortfallPolicy;

#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    /// Range admitted for idle power samples. Default: `< 1.0 W`.
    pub base_range: AdmissibleRange,
    /// Range admitted for isolated full-duty samples. Default: `(1.5, 3.0) W`.
    pub max_range: AdmissibleRange,
    pub sentinels: DutySentinels,
    /// Surviving idle samples needed for phase 1. Default: 11.
    pub min_base_samples: usize,
    /// Surviving isolated full-duty samples needed per heater. Default: 4.
    pub min_max_samples: usize,
    /// Decimal places of the reported values; `None` keeps full precision.
    pub precision: Option<u32>,
    pub on_shortfall: ShortfallPolicy,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            base_range: AdmissibleRange::below(1.0),
            max_range: AdmissibleRange::between(1.5, 3.0),
            sentinels: DutySentinels::default(),
            min_base_samples: 11,
            min_max_samples: 4,
            precision: Some(3),
            on_shortfall: ShortfallPolicy::FailFast,
        }
    }
}

/// Decimal places beyond this no longer survive an `f64` round trip.
pub const MAX_PRECISION: u32 = 12;

impl CalibrationCfg {
    #[allow(clippy::float_cmp)]
    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.sentinels.full.is_finite() || !self.sentinels.off.is_finite() {
            return Err(CalibrationError::InvalidConfig("duty sentinels must be finite"));
        }
        if self.sentinels.full == self.sentinels.off {
            return Err(CalibrationError::InvalidConfig(
                "full duty sentinel must differ from off",
            ));
        }
        if self.min_base_samples == 0 || self.min_max_samples == 0 {
            return Err(CalibrationError::InvalidConfig(
                "minimum sample counts must be >= 1",
            ));
        }
        if let Some(p) = self.precision
            && p > MAX_PRECISION
        {
            return Err(CalibrationError::InvalidConfig("precision must be <= 12 decimals"));
        }
        for r in [self.base_range, self.max_range] {
            if let (Some(lo), Some(hi)) = (r.lo, r.hi)
                && lo >= hi
            {
                return Err(CalibrationError::InvalidConfig(
                    "admissible range is empty",
                ));
            }
        }
        Ok(())
    }
}
