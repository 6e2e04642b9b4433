//! Candles and the ordered series built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// OHLC candle for one instrument over one period.
///
/// Prices may be non-finite: real feeds deliver gaps, and every derived
/// series defines how it propagates them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if any OHLC field is NaN or infinite (gap candle).
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high is the top of the range and low the bottom.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Average of the four prices (the Heikin-Ashi close).
    pub fn ohlc4(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }
}

/// Candles for one instrument and timeframe, strictly increasing by timestamp.
///
/// The ordering invariant is checked once at construction; every derived
/// series is aligned index-for-index with this one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Build a series, rejecting duplicate or decreasing timestamps.
    pub fn new(candles: Vec<Candle>) -> Result<Self, SignalError> {
        if let Some(pos) = candles
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SignalError::UnorderedTimestamps { index: pos + 1 });
        }
        Ok(Self { candles })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    /// Number of candles with at least one non-finite price.
    pub fn void_count(&self) -> usize {
        self.candles.iter().filter(|c| c.is_void()).count()
    }

    /// The first `len` candles. Ordering is inherited, so no re-validation.
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            candles: self.candles[..len.min(self.candles.len())].to_vec(),
        }
    }
}

impl<'de> Deserialize<'de> for CandleSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let candles = Vec::<Candle>::deserialize(deserializer)?;
        CandleSeries::new(candles).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}
