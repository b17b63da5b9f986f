//! Outlier rejection by admissible range.

use crate::series::{TimeSeries, Timestamp};

/// Exclusive range `(lo, hi)`; a `None` bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdmissibleRange {
    pub lo: Option<f64>,
    pub hi: Option<f64>,
}

impl AdmissibleRange {
    pub const fn new(lo: Option<f64>, hi: Option<f64>) -> Self {
        Self { lo, hi }
    }

    pub const fn below(hi: f64) -> Self {
        Self::new(None, Some(hi))
    }

    pub const fn between(lo: f64, hi: f64) -> Self {
        Self::new(Some(lo), Some(hi))
    }

    /// Strictly inside both bounds. NaN is never admitted.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        !v.is_nan() && self.lo.is_none_or(|lo| v > lo) && self.hi.is_none_or(|hi| v < hi)
    }
}

/// One power reading kept for estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerPoint {
    pub timestamp: Timestamp,
    pub watts: f64,
}

/// Power readings at `instants` whose value lies inside `range`.
/// Instants without a power reading are skipped.
pub fn reject_outliers(
    power: &TimeSeries,
    instants: &[Timestamp],
    range: AdmissibleRange,
) -> Vec<PowerPoint> {
    let mut kept = Vec::with_capacity(instants.len());
    let mut rejected = 0usize;
    for &t in instants {
        let Some(watts) = power.value_at(t, None) else {
            continue;
        };
        if range.contains(watts) {
            kept.push(PowerPoint {
                timestamp: t,
                watts,
            });
        } else {
            rejected += 1;
        }
    }
    if rejected > 0 {
        tracing::debug!(rejected, kept = kept.len(), ?range, "rejected outliers");
    }
    kept
}
