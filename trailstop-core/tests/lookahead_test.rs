//! Look-ahead contamination tests for every derived series.
//!
//! Invariant: no value at bar t may depend on a candle after t.
//!
//! Method: compute on a truncated series (candles 0..100) and on the full
//! series (candles 0..200). Bars 0..100 must be bit-identical between both
//! runs. Any difference means future data is leaking into past values.

use chrono::{Duration, TimeZone, Utc};
use trailstop_core::indicators::{Atr, Indicator, SourceSelector};
use trailstop_core::{
    compute_signals, Candle, CandleSeries, CrossBasis, SeedConvention, SignalConfig, SourceMode,
};

/// Generate N candles of synthetic OHLC data with realistic variation.
fn make_test_candles(n: usize) -> CandleSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    let mut candles = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05;
        price += change;
        price = price.max(10.0);

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0;
        let low = open.min(close) - 2.0;

        candles.push(Candle::new(
            base + Duration::minutes(15 * i as i64),
            open,
            high,
            low,
            close,
        ));
    }

    CandleSeries::new(candles).unwrap()
}

fn assert_prefix_identical(name: &str, truncated: &[f64], full: &[f64]) {
    for (i, (t, f)) in truncated.iter().zip(full).enumerate() {
        assert_eq!(
            t.to_bits(),
            f.to_bits(),
            "{name}: look-ahead at bar {i} (truncated={t}, full={f})"
        );
    }
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &CandleSeries, truncated_len: usize) {
    let truncated = full.truncated(truncated_len);
    let full_result = indicator.compute(full);
    let truncated_result = indicator.compute(&truncated);
    assert_eq!(truncated_result.len(), truncated_len, "{}", indicator.name());
    assert_eq!(full_result.len(), full.len(), "{}", indicator.name());
    assert_prefix_identical(indicator.name(), &truncated_result, &full_result);
}

#[test]
fn atr_has_no_lookahead() {
    let candles = make_test_candles(200);
    for period in [1, 3, 10, 14, 50] {
        assert_no_lookahead(&Atr::new(period).unwrap(), &candles, 100);
    }
}

#[test]
fn source_has_no_lookahead() {
    let candles = make_test_candles(200);
    assert_no_lookahead(&SourceSelector::new(SourceMode::RawClose), &candles, 100);
    assert_no_lookahead(&SourceSelector::new(SourceMode::SmoothedAverage), &candles, 100);
}

#[test]
fn signal_frame_has_no_lookahead() {
    let candles = make_test_candles(200);
    let truncated = candles.truncated(100);

    let configs = [
        SignalConfig::default(),
        SignalConfig::with_options(
            14,
            2.5,
            SourceMode::SmoothedAverage,
            CrossBasis::Ema { period: 5 },
            SeedConvention::Zero,
        )
        .unwrap(),
    ];

    for config in configs {
        let full = compute_signals(&candles, &config).unwrap();
        let part = compute_signals(&truncated, &config).unwrap();

        assert_prefix_identical("volatility", &part.volatility, &full.volatility);
        assert_prefix_identical("trailing_stop", &part.trailing_stop, &full.trailing_stop);
        assert_prefix_identical("basis", &part.basis, &full.basis);
        assert_eq!(part.flags.buy[..], full.flags.buy[..100]);
        assert_eq!(part.flags.sell[..], full.flags.sell[..100]);
    }
}
