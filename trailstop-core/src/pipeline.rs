//! Full signal computation: candles + config in, every derived column out.
//!
//! Stages run in a fixed order, each over the whole series:
//! source -> true range -> volatility -> noise margin -> trailing stop ->
//! basis -> crossovers -> buy/sell -> directives.
//!
//! Nothing is cached between calls. Recomputing the same input under the same
//! config yields bit-identical output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{CrossBasis, SignalConfig};
use crate::domain::CandleSeries;
use crate::engine::{crossovers, noise_margin, trailing_stop, Crossovers};
use crate::error::SignalError;
use crate::indicators::atr::{backfill_leading, true_range, wilder_smooth};
use crate::indicators::{ema_of_series, select_source};
use crate::signals::{compose, Directives, SignalEvent, SignalFlags};

/// Every derived series for one computation, aligned with the input candles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalFrame {
    pub timestamps: Vec<DateTime<Utc>>,
    pub source: Vec<f64>,
    pub true_range: Vec<f64>,
    pub volatility: Vec<f64>,
    pub noise_margin: Vec<f64>,
    pub trailing_stop: Vec<f64>,
    /// Series crossed against the stop (the source, or an EMA of it).
    pub basis: Vec<f64>,
    pub crosses: Crossovers,
    pub flags: SignalFlags,
    pub directives: Directives,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Ordered entry/exit events.
    ///
    /// Fails with `LengthMismatch` if the directive columns and timestamps
    /// are not aligned.
    pub fn events(&self) -> Result<Vec<SignalEvent>, SignalError> {
        self.directives.events(&self.timestamps)
    }

    /// Stop value on the last bar, if any.
    pub fn latest_stop(&self) -> Option<f64> {
        self.trailing_stop.last().copied()
    }
}

/// Compute all signal columns for `candles` under `config`.
///
/// An empty series is a no-op and yields an empty frame.
pub fn compute_signals(
    candles: &CandleSeries,
    config: &SignalConfig,
) -> Result<SignalFrame, SignalError> {
    let n = candles.len();
    debug!(
        bars = n,
        period = config.period(),
        multiplier = config.multiplier(),
        source_mode = ?config.source_mode(),
        "computing trailing-stop signals"
    );

    if n == 0 {
        return Ok(SignalFrame::default());
    }

    let voids = candles.void_count();
    if voids > 0 {
        warn!(voids, bars = n, "candle series contains non-finite prices");
    }

    let source = select_source(candles, config.source_mode());
    let tr = true_range(candles.as_slice());
    let mut volatility = wilder_smooth(&tr, config.period());
    backfill_leading(&mut volatility);
    let margin = noise_margin(&volatility, config.multiplier());

    let stop = trailing_stop(&source, &margin, config.seed_convention())?;

    let basis = match config.cross_basis() {
        CrossBasis::Source => source.clone(),
        CrossBasis::Ema { period } => ema_of_series(&source, period),
    };
    let crosses = crossovers(&basis, &stop)?;
    let flags = compose(&source, &stop, &crosses)?;
    let directives = Directives::from_flags(&flags);

    debug!(
        buys = flags.buy_count(),
        sells = flags.sell_count(),
        "signal computation complete"
    );

    Ok(SignalFrame {
        timestamps: candles.timestamps(),
        source,
        true_range: tr,
        volatility,
        noise_margin: margin,
        trailing_stop: stop,
        basis,
        crosses,
        flags,
        directives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SeedConvention, SourceMode};
    use crate::indicators::{make_candles, make_ohlc_candles};

    #[test]
    fn empty_series_is_empty_frame() {
        let frame = compute_signals(&CandleSeries::empty(), &SignalConfig::default()).unwrap();
        assert!(frame.is_empty());
        assert!(frame.trailing_stop.is_empty());
        assert!(frame.flags.buy.is_empty());
        assert!(frame.events().unwrap().is_empty());
        assert_eq!(frame.latest_stop(), None);
    }

    #[test]
    fn single_candle_initializes_and_never_signals() {
        let candles = make_ohlc_candles(&[(100.0, 104.0, 98.0, 101.0)]);
        let frame = compute_signals(&candles, &SignalConfig::default()).unwrap();
        // TR = 6, margin = 6 * 1.0
        assert_eq!(frame.trailing_stop, vec![107.0]);
        assert_eq!(frame.crosses.above, vec![false]);
        assert_eq!(frame.crosses.below, vec![false]);
        assert_eq!(frame.flags.buy, vec![false]);
        assert_eq!(frame.flags.sell, vec![false]);
    }

    #[test]
    fn all_columns_are_aligned() {
        let candles = make_candles(&[100.0, 101.0, 99.0, 103.0, 104.0, 98.0, 97.0]);
        let config = SignalConfig::with_options(
            3,
            1.5,
            SourceMode::SmoothedAverage,
            CrossBasis::Ema { period: 2 },
            SeedConvention::Undefined,
        )
        .unwrap();
        let frame = compute_signals(&candles, &config).unwrap();
        let n = candles.len();
        assert_eq!(frame.len(), n);
        for len in [
            frame.source.len(),
            frame.true_range.len(),
            frame.volatility.len(),
            frame.noise_margin.len(),
            frame.trailing_stop.len(),
            frame.basis.len(),
            frame.crosses.above.len(),
            frame.crosses.below.len(),
            frame.flags.buy.len(),
            frame.flags.sell.len(),
            frame.directives.len(),
        ] {
            assert_eq!(len, n);
        }
    }

    #[test]
    fn period_one_ema_basis_matches_source_basis() {
        let candles = make_candles(&[100.0, 103.0, 99.0, 105.0, 101.0, 96.0, 104.0]);
        let plain = compute_signals(&candles, &SignalConfig::default()).unwrap();
        let ema1 = compute_signals(
            &candles,
            &SignalConfig::default()
                .with_cross_basis(CrossBasis::Ema { period: 1 })
                .unwrap(),
        )
        .unwrap();
        assert_eq!(plain, ema1);
    }

    #[test]
    fn margin_is_volatility_times_multiplier() {
        let candles = make_candles(&[100.0, 102.0, 101.0]);
        let config = SignalConfig::new(2, 2.0, SourceMode::RawClose).unwrap();
        let frame = compute_signals(&candles, &config).unwrap();
        for (v, m) in frame.volatility.iter().zip(&frame.noise_margin) {
            assert_eq!(*m, v * 2.0);
        }
    }

    #[test]
    fn reversal_produces_buy_then_sell() {
        // Falling, then a sharp rally, then a sharp drop.
        let closes = [
            100.0, 98.0, 96.0, 94.0, 92.0, 100.0, 108.0, 116.0, 124.0, 110.0, 96.0, 82.0,
        ];
        let candles = make_candles(&closes);
        let frame = compute_signals(&candles, &SignalConfig::default()).unwrap();
        let events = frame.events().unwrap();
        let first_buy = events
            .iter()
            .position(|e| e.tag == "long")
            .expect("rally should produce a long entry");
        let first_sell = events
            .iter()
            .position(|e| e.tag == "short")
            .expect("drop should produce a short entry");
        assert!(first_buy < first_sell);
    }

    #[test]
    fn misaligned_frame_events_fail() {
        let candles = make_candles(&[100.0, 98.0, 96.0, 110.0, 120.0, 90.0]);
        let mut frame = compute_signals(&candles, &SignalConfig::default()).unwrap();
        assert!(frame.events().is_ok());

        frame.timestamps.pop();
        assert_eq!(
            frame.events(),
            Err(SignalError::LengthMismatch {
                context: "directive events",
                left: 6,
                right: 5,
            })
        );
    }
}
