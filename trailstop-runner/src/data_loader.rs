//! Candle loading for the runner.
//!
//! Reads candle CSV files with a header row containing at least
//! `timestamp,open,high,low,close` (any order, case-insensitive; extra
//! columns such as `volume` are ignored). Timestamps may be RFC 3339,
//! `YYYY-MM-DD HH:MM:SS` (taken as UTC), or Unix seconds. Empty price cells
//! load as NaN so market-data gaps survive into the engine.
//!
//! Synthetic candles are a developer-only aid for demos and tests.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};
use trailstop_core::{Candle, CandleSeries, SignalError};

const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "open", "high", "low", "close"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: unparseable timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: unparseable {column} value '{value}'")]
    Price {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("invalid candle series: {0}")]
    Series(#[from] SignalError),
}

/// Load a candle series from a CSV file.
pub fn load_candles(path: &Path) -> Result<CandleSeries, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let candles = read_candles(file)?;
    info!(
        path = %path.display(),
        bars = candles.len(),
        voids = candles.void_count(),
        "loaded candles"
    );
    Ok(candles)
}

/// Parse a candle series from any CSV reader.
pub fn read_candles<R: Read>(reader: R) -> Result<CandleSeries, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or(LoadError::MissingColumn(name))?;
    }

    let mut candles = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Data rows are 1-based after the header.
        let row = i + 1;
        let cell = |k: usize| record.get(idx[k]).unwrap_or("");

        let timestamp = parse_timestamp(cell(0)).ok_or_else(|| LoadError::Timestamp {
            row,
            value: cell(0).to_string(),
        })?;
        let mut prices = [0.0f64; 4];
        for (k, price) in prices.iter_mut().enumerate() {
            let column = REQUIRED_COLUMNS[k + 1];
            *price = parse_price(cell(k + 1)).ok_or_else(|| LoadError::Price {
                row,
                column,
                value: cell(k + 1).to_string(),
            })?;
        }
        let [open, high, low, close] = prices;
        candles.push(Candle::new(timestamp, open, high, low, close));
    }

    debug!(rows = candles.len(), "parsed candle CSV");
    Ok(CandleSeries::new(candles)?)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Empty cells and `NaN` are gaps; anything else must be a number.
fn parse_price(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok()
}

/// Options for synthetic candle generation.
#[derive(Debug, Clone)]
pub struct SyntheticOptions {
    pub bars: usize,
    pub seed: u64,
    pub start: DateTime<Utc>,
    pub interval: Duration,
    pub start_price: f64,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            bars: 500,
            seed: 42,
            start: DateTime::UNIX_EPOCH,
            interval: Duration::minutes(15),
            start_price: 100.0,
        }
    }
}

/// Generate a seeded random-walk candle series.
///
/// The same options always produce the same series.
pub fn generate_synthetic_candles(opts: &SyntheticOptions) -> Result<CandleSeries, LoadError> {
    let mut rng = StdRng::seed_from_u64(opts.seed);
    let mut candles = Vec::with_capacity(opts.bars);
    let mut price = opts.start_price;

    for i in 0..opts.bars {
        let step: f64 = rng.gen_range(-0.01..0.01);
        let open = price;
        let close = (price * (1.0 + step)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let timestamp = opts.start + opts.interval * i as i32;
        candles.push(Candle::new(timestamp, open, high, low, close));
        price = close;
    }

    Ok(CandleSeries::new(candles)?)
}
