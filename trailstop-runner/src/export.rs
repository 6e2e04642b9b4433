//! Artifact export: signal CSV, candle CSV, and JSON run manifests.
//!
//! Every manifest carries a `schema_version`; unknown versions are rejected
//! on load. Undefined values are written as empty CSV cells, matching how
//! the loader reads gaps.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use trailstop_core::fingerprint::RunFingerprint;
use trailstop_core::{CandleSeries, SignalConfig, SignalFrame};

use crate::batch::JobResult;

pub const SCHEMA_VERSION: u32 = 1;

// ─── CSV export ─────────────────────────────────────────────────────

const SIGNAL_COLUMNS: [&str; 21] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "source",
    "true_range",
    "volatility",
    "noise_margin",
    "trailing_stop",
    "basis",
    "crossed_above",
    "crossed_below",
    "buy",
    "sell",
    "enter_long",
    "enter_short",
    "exit_long",
    "exit_short",
    "enter_tag",
    "exit_tag",
];

fn cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn flag(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Every column of `frame` must have exactly `rows` entries.
fn check_frame_columns(rows: usize, frame: &SignalFrame) -> Result<()> {
    let d = &frame.directives;
    let columns = [
        ("timestamps", frame.timestamps.len()),
        ("source", frame.source.len()),
        ("true_range", frame.true_range.len()),
        ("volatility", frame.volatility.len()),
        ("noise_margin", frame.noise_margin.len()),
        ("trailing_stop", frame.trailing_stop.len()),
        ("basis", frame.basis.len()),
        ("crossed_above", frame.crosses.above.len()),
        ("crossed_below", frame.crosses.below.len()),
        ("buy", frame.flags.buy.len()),
        ("sell", frame.flags.sell.len()),
        ("enter_long", d.enter_long.len()),
        ("enter_short", d.enter_short.len()),
        ("exit_long", d.exit_long.len()),
        ("exit_short", d.exit_short.len()),
    ];
    for (name, len) in columns {
        if len != rows {
            bail!("frame column '{name}' has {len} rows but series has {rows} candles");
        }
    }
    Ok(())
}

/// One row per candle: OHLC, every derived column, directives and tags.
pub fn export_signals_csv(candles: &CandleSeries, frame: &SignalFrame) -> Result<String> {
    check_frame_columns(candles.len(), frame)?;

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(SIGNAL_COLUMNS)?;

    for (i, c) in candles.iter().enumerate() {
        let d = &frame.directives;
        wtr.write_record([
            c.timestamp.to_rfc3339(),
            cell(c.open),
            cell(c.high),
            cell(c.low),
            cell(c.close),
            cell(frame.source[i]),
            cell(frame.true_range[i]),
            cell(frame.volatility[i]),
            cell(frame.noise_margin[i]),
            cell(frame.trailing_stop[i]),
            cell(frame.basis[i]),
            flag(frame.crosses.above[i]).to_string(),
            flag(frame.crosses.below[i]).to_string(),
            flag(frame.flags.buy[i]).to_string(),
            flag(frame.flags.sell[i]).to_string(),
            flag(d.enter_long[i]).to_string(),
            flag(d.enter_short[i]).to_string(),
            flag(d.exit_long[i]).to_string(),
            flag(d.exit_short[i]).to_string(),
            d.enter_tag(i).unwrap_or_default().to_string(),
            d.exit_tag(i).unwrap_or_default().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Candles in the loader's input format.
pub fn export_candles_csv(candles: &CandleSeries) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "open", "high", "low", "close"])?;
    for c in candles {
        wtr.write_record([
            c.timestamp.to_rfc3339(),
            cell(c.open),
            cell(c.high),
            cell(c.low),
            cell(c.close),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON manifest ──────────────────────────────────────────────────

/// Signal counts for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub buys: usize,
    pub sells: usize,
    pub crossed_above: usize,
    pub crossed_below: usize,
}

impl EventCounts {
    pub fn of(frame: &SignalFrame) -> Self {
        let count = |v: &[bool]| v.iter().filter(|b| **b).count();
        Self {
            buys: frame.flags.buy_count(),
            sells: frame.flags.sell_count(),
            crossed_above: count(&frame.crosses.above),
            crossed_below: count(&frame.crosses.below),
        }
    }
}

/// Summary of one job, written next to its signal CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub symbol: String,
    pub config: SignalConfig,
    pub fingerprint: RunFingerprint,
    pub bars: usize,
    pub counts: EventCounts,
    pub latest_stop: Option<f64>,
}

impl RunManifest {
    pub fn from_result(result: &JobResult) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: result.symbol.clone(),
            config: result.config,
            fingerprint: result.fingerprint.clone(),
            bars: result.frame.len(),
            counts: EventCounts::of(&result.frame),
            latest_stop: result.frame.latest_stop().filter(|v| v.is_finite()),
        }
    }
}

pub fn export_manifest_json(manifest: &RunManifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("failed to serialize RunManifest to JSON")
}

/// Deserialize a manifest, rejecting unknown schema versions.
pub fn import_manifest_json(json: &str) -> Result<RunManifest> {
    let manifest: RunManifest =
        serde_json::from_str(json).context("failed to deserialize RunManifest from JSON")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// File-system safe, collision-free directory name for a symbol.
///
/// Symbols that are already safe are used as-is. Anything else is sanitized
/// and suffixed with a short hash of the raw symbol, so `BTC/USDT` and
/// `BTC_USDT` never share a directory.
pub fn artifact_stem(symbol: &str) -> String {
    let safe: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe == symbol {
        safe
    } else {
        let hash = blake3::hash(symbol.as_bytes()).to_hex();
        format!("{safe}-{}", &hash[..8])
    }
}

/// Write `{stem}/signals.csv` and `{stem}/manifest.json` under `output_dir`.
///
/// Returns the created directory.
pub fn save_artifacts(result: &JobResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(artifact_stem(&result.symbol));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let csv = export_signals_csv(&result.candles, &result.frame)?;
    std::fs::write(run_dir.join("signals.csv"), csv)?;

    let json = export_manifest_json(&RunManifest::from_result(result))?;
    std::fs::write(run_dir.join("manifest.json"), json)?;

    Ok(run_dir)
}

/// Load the manifest from an artifact directory.
pub fn load_manifest(dir: &Path) -> Result<RunManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_manifest_json(&json)
}
