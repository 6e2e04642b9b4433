//! Source selection: the price series that drives the trailing-stop recurrence.
//!
//! `SmoothedAverage` uses the Heikin-Ashi close, `(o + h + l + c) / 4`, of the
//! raw candle. That value does not depend on the recursive Heikin-Ashi open, so
//! no full candle reconstruction is needed for the source. [`heikin_ashi`]
//! builds the full candles for callers that want to plot or inspect them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SourceMode;
use crate::domain::CandleSeries;
use crate::indicators::Indicator;

/// Derive the source series for `mode`.
pub fn select_source(candles: &CandleSeries, mode: SourceMode) -> Vec<f64> {
    match mode {
        SourceMode::RawClose => candles.closes(),
        SourceMode::SmoothedAverage => candles.iter().map(|c| c.ohlc4()).collect(),
    }
}

/// Source selection as an [`Indicator`].
#[derive(Debug, Clone)]
pub struct SourceSelector {
    mode: SourceMode,
    name: String,
}

impl SourceSelector {
    pub fn new(mode: SourceMode) -> Self {
        let name = match mode {
            SourceMode::RawClose => "source_raw_close",
            SourceMode::SmoothedAverage => "source_smoothed_average",
        };
        Self {
            mode,
            name: name.to_string(),
        }
    }
}

impl Indicator for SourceSelector {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &CandleSeries) -> Vec<f64> {
        select_source(candles, self.mode)
    }
}

/// A reconstructed Heikin-Ashi candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeikinAshiCandle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Full Heikin-Ashi reconstruction.
///
/// ha_close = (o + h + l + c) / 4
/// ha_open[0] = (o + c) / 2, ha_open[t] = (ha_open[t-1] + ha_close[t-1]) / 2
/// ha_high = max(h, ha_open, ha_close), ha_low = min(l, ha_open, ha_close)
///
/// A NaN in one candle poisons `ha_open` from there on; the close column is
/// unaffected outside the gap.
pub fn heikin_ashi(candles: &CandleSeries) -> Vec<HeikinAshiCandle> {
    let mut out: Vec<HeikinAshiCandle> = Vec::with_capacity(candles.len());

    for candle in candles {
        let close = candle.ohlc4();
        let open = match out.last() {
            Some(prev) => (prev.open + prev.close) / 2.0,
            None => (candle.open + candle.close) / 2.0,
        };
        out.push(HeikinAshiCandle {
            timestamp: candle.timestamp,
            open,
            high: candle.high.max(open).max(close),
            low: candle.low.min(open).min(close),
            close,
        });
    }

    out
}
