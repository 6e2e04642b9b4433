//! ATR trailing-stop recurrence.
//!
//! Inherently sequential: stop[i] depends on stop[i-1], so the series is built
//! in one forward pass into a pre-allocated buffer with the previous stop held
//! in a local accumulator.
//!
//! With p = stop[i-1], s = source[i], ps = source[i-1], m = margin[i]:
//! - s > p and ps > p: max(p, s - m)   (uptrend, ratchet up only)
//! - s < p and ps < p: min(p, s + m)   (downtrend, ratchet down only)
//! - s > p:            s - m           (flip up)
//! - otherwise:        s + m           (flip down; s == p lands here)
//!
//! A non-finite source holds the previous stop. A non-finite margin counts as
//! zero for that bar only.

use crate::config::SeedConvention;
use crate::error::SignalError;

/// Noise margin series: volatility scaled by the multiplier.
pub fn noise_margin(volatility: &[f64], multiplier: f64) -> Vec<f64> {
    volatility.iter().map(|v| v * multiplier).collect()
}

/// One step of the recurrence from a defined previous stop.
#[inline]
fn transition(prev_stop: f64, prev_src: f64, src: f64, margin: f64) -> f64 {
    if src > prev_stop && prev_src > prev_stop {
        prev_stop.max(src - margin)
    } else if src < prev_stop && prev_src < prev_stop {
        prev_stop.min(src + margin)
    } else if src > prev_stop {
        src - margin
    } else {
        src + margin
    }
}

/// Compute the trailing stop for aligned `source` and `margin` series.
///
/// Fails with `LengthMismatch` if the two series differ in length.
pub fn trailing_stop(
    source: &[f64],
    margin: &[f64],
    seed: SeedConvention,
) -> Result<Vec<f64>, SignalError> {
    SignalError::check_aligned("trailing_stop", source.len(), margin.len())?;

    let n = source.len();
    let mut stop = vec![f64::NAN; n];

    let (mut prev_stop, mut prev_src) = match (seed, source.first()) {
        (SeedConvention::Zero, Some(&first)) => (0.0, first),
        _ => (f64::NAN, f64::NAN),
    };

    for i in 0..n {
        let src = source[i];
        let m = if margin[i].is_finite() { margin[i] } else { 0.0 };

        let value = if !src.is_finite() {
            prev_stop
        } else if prev_stop.is_nan() {
            src + m
        } else {
            transition(prev_stop, prev_src, src, m)
        };

        stop[i] = value;
        prev_stop = value;
        prev_src = src;
    }

    Ok(stop)
}
