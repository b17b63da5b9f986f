//! Robust statistics.

/// Median of `values`; the mean of the two middle values for an even count.
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

/// Round half away from zero to `decimals` places. Returns `x` unchanged when
/// the scale factor is not finite.
#[inline]
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let Ok(exp) = i32::try_from(decimals) else {
        return x;
    };
    let scale = 10f64.powi(exp);
    if !scale.is_finite() {
        return x;
    }
    (x * scale).round() / scale
}
