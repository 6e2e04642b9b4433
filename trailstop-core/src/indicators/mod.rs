//! Candle-derived indicator series.
//!
//! Every indicator is a pure function of the candle series: full history in,
//! same-length `Vec<f64>` out, recomputed from scratch on every call. No value
//! at bar t may depend on a candle after t.

pub mod atr;
pub mod ema;
pub mod source;

pub use atr::{true_range, volatility, wilder_smooth, Atr};
pub use ema::{ema_of_series, ewm_mean};
pub use source::{heikin_ashi, select_source, HeikinAshiCandle, SourceSelector};

use crate::domain::CandleSeries;

/// Trait for candle-derived indicators.
///
/// # Look-ahead contamination guard
/// Computing on a truncated series must reproduce the prefix of the full
/// series bit for bit.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "atr_10", "source_raw_close").
    fn name(&self) -> &str;

    /// Number of bars before the output stops depending on the seed value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `candles`.
    fn compute(&self, candles: &CandleSeries) -> Vec<f64>;
}

/// Create a synthetic series from close prices for testing.
///
/// open = prev_close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, 15-minute spacing.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> CandleSeries {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_candles(&data)
}

/// Create a series from explicit (open, high, low, close) tuples.
#[cfg(test)]
pub fn make_ohlc_candles(data: &[(f64, f64, f64, f64)]) -> CandleSeries {
    use crate::domain::Candle;
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let candles = data
        .iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            Candle::new(
                base + chrono::Duration::minutes(15 * i as i64),
                open,
                high,
                low,
                close,
            )
        })
        .collect();
    CandleSeries::new(candles).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
