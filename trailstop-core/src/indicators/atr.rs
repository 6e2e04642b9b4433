//! Average True Range (ATR): the volatility estimate behind the noise margin.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with TR[0].
//! Leading undefined values are back-filled with the first defined value,
//! and a series with no defined value at all becomes zeros.

use crate::domain::{Candle, CandleSeries};
use crate::error::SignalError;
use crate::indicators::ema::ewm_mean;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, SignalError> {
        if period < 1 {
            return Err(SignalError::invalid(
                "period",
                format!("ATR period must be >= 1, got {period}"),
            ));
        }
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
///
/// `f64::max` ignores a NaN operand, so a candidate that cannot be formed is
/// skipped; TR is NaN only when all three are.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut tr = Vec::with_capacity(candles.len());
    let mut prev_close = f64::NAN;

    for candle in candles {
        let h = candle.high;
        let l = candle.low;
        tr.push((h - l).max((h - prev_close).abs()).max((l - prev_close).abs()));
        prev_close = candle.close;
    }

    tr
}

/// Apply Wilder smoothing to a series. Alpha = 1/period; period 1 returns the input.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    ewm_mean(values, 1.0 / period.max(1) as f64)
}

/// Back-fill leading undefined values with the first defined one; all-undefined becomes 0.
pub(crate) fn backfill_leading(values: &mut [f64]) {
    match values.iter().position(|v| v.is_finite()) {
        Some(first) => {
            let fill = values[first];
            values[..first].iter_mut().for_each(|v| *v = fill);
        }
        None => values.iter_mut().for_each(|v| *v = 0.0),
    }
}

/// Volatility series for the noise margin.
///
/// Fails with `InvalidParameter` when `period < 1`. Empty input yields an empty series.
pub fn volatility(candles: &CandleSeries, period: usize) -> Result<Vec<f64>, SignalError> {
    Ok(Atr::new(period)?.compute(candles))
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &CandleSeries) -> Vec<f64> {
        let tr = true_range(candles.as_slice());
        let mut atr = wilder_smooth(&tr, self.period);
        backfill_leading(&mut atr);
        atr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_candles, DEFAULT_EPSILON};

    fn sample() -> CandleSeries {
        make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ])
    }

    #[test]
    fn true_range_basic() {
        let tr = true_range(sample().as_slice());
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
        assert_approx(tr[3], 6.0, DEFAULT_EPSILON);
        assert_approx(tr[4], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        let candles = make_ohlc_candles(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        let tr = true_range(candles.as_slice());
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_skips_missing_candidates() {
        // Previous close missing: only high-low can be formed.
        let candles = make_ohlc_candles(&[
            (98.0, 102.0, 97.0, f64::NAN),
            (100.0, 104.0, 99.0, 101.0),
        ]);
        let tr = true_range(candles.as_slice());
        assert_approx(tr[1], 5.0, DEFAULT_EPSILON);

        // High missing: |low - prev_close| still defined.
        let candles = make_ohlc_candles(&[
            (98.0, 102.0, 97.0, 100.0),
            (100.0, f64::NAN, 94.0, 101.0),
        ]);
        let tr = true_range(candles.as_slice());
        assert_approx(tr[1], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_undefined_when_no_candidate() {
        let candles = make_ohlc_candles(&[(98.0, f64::NAN, f64::NAN, 100.0)]);
        assert!(true_range(candles.as_slice())[0].is_nan());
    }

    #[test]
    fn atr_period_3() {
        // alpha = 1/3, seeded with TR[0]
        // ATR = 10, 28/3, 9.222.., 8.148.., 7.432..
        let result = Atr::new(3).unwrap().compute(&sample());
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 28.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[2], 83.0 / 9.0, DEFAULT_EPSILON);
        assert_approx(result[3], 220.0 / 27.0, DEFAULT_EPSILON);
        assert_approx(result[4], 602.0 / 81.0, DEFAULT_EPSILON);
    }

    #[test]
    fn period_one_degenerates_to_true_range() {
        let candles = sample();
        let tr = true_range(candles.as_slice());
        let vol = volatility(&candles, 1).unwrap();
        assert_eq!(tr, vol);
    }

    #[test]
    fn zero_period_is_invalid() {
        assert!(matches!(
            volatility(&sample(), 0),
            Err(SignalError::InvalidParameter { name: "period", .. })
        ));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(volatility(&CandleSeries::empty(), 14).unwrap().is_empty());
    }

    #[test]
    fn leading_undefined_is_backfilled() {
        let candles = make_ohlc_candles(&[
            (98.0, f64::NAN, f64::NAN, 100.0),
            (100.0, 104.0, 99.0, 101.0), // TR = max(5, 4, 1) = 5
            (101.0, 103.0, 100.0, 102.0), // TR = 3
        ]);
        let vol = volatility(&candles, 2).unwrap();
        assert_approx(vol[0], 5.0, DEFAULT_EPSILON);
        assert_approx(vol[1], 5.0, DEFAULT_EPSILON);
        assert_approx(vol[2], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn all_undefined_becomes_zero() {
        let candles = make_ohlc_candles(&[
            (98.0, f64::NAN, f64::NAN, 100.0),
            (98.0, f64::NAN, f64::NAN, 100.0),
        ]);
        assert_eq!(volatility(&candles, 3).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn interior_gap_is_carried() {
        let candles = make_ohlc_candles(&[
            (100.0, 105.0, 95.0, 102.0),          // TR = 10
            (102.0, f64::NAN, f64::NAN, f64::NAN), // TR undefined
            (102.0, 104.0, 100.0, 103.0),         // TR = 4 (prev close missing)
        ]);
        let vol = volatility(&candles, 2).unwrap();
        assert_approx(vol[0], 10.0, DEFAULT_EPSILON);
        assert_approx(vol[1], 10.0, DEFAULT_EPSILON);
        // old weight 0.25: (0.25 * 10 + 0.5 * 4) / 0.75 = 6
        assert_approx(vol[2], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_name_and_lookback() {
        let atr = Atr::new(14).unwrap();
        assert_eq!(atr.name(), "atr_14");
        assert_eq!(atr.lookback(), 14);
    }
}
