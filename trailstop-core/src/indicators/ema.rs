//! Exponentially weighted means.
//!
//! Recursive, non-adjusted form: y[0] = x[0], y[t] = alpha * x[t] + (1 - alpha) * y[t-1].
//!
//! Non-finite inputs are gaps, not values. Leading gaps stay NaN. Inside the
//! series the last mean is carried through the gap, and the weight of the old
//! mean keeps decaying by (1 - alpha) per gap bar, so the first value after a
//! gap of k bars is blended as
//! `((1-alpha)^(k+1) * y_prev + alpha * x) / ((1-alpha)^(k+1) + alpha)`.

/// Exponentially weighted mean with smoothing factor `alpha` in (0, 1].
pub fn ewm_mean(values: &[f64], alpha: f64) -> Vec<f64> {
    let decay = 1.0 - alpha;
    let mut result = Vec::with_capacity(values.len());
    let mut mean = f64::NAN;
    let mut old_weight = 1.0;

    for &v in values {
        let observed = v.is_finite();
        if mean.is_nan() {
            if observed {
                mean = v;
                old_weight = 1.0;
            }
        } else {
            old_weight *= decay;
            if observed {
                // Skip the blend on equality so a constant series stays exact.
                if mean != v {
                    mean = (old_weight * mean + alpha * v) / (old_weight + alpha);
                }
                old_weight = 1.0;
            }
        }
        result.push(mean);
    }

    result
}

/// Span-based EMA (alpha = 2 / (period + 1)) of an arbitrary series.
///
/// Period 1 (or 0) returns the input unchanged, gaps included.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period <= 1 {
        return values.to_vec();
    }
    ewm_mean(values, 2.0 / (period as f64 + 1.0))
}
