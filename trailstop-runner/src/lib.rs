//! TrailStop Runner: batch orchestration around the signal engine.
//!
//! This crate builds on `trailstop-core` to provide:
//! - TOML run files naming instruments and signal parameters
//! - CSV candle loading and seeded synthetic candles
//! - Parallel per-instrument computation with a wall-clock budget
//! - Signal CSV and JSON manifest export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;

pub use batch::{
    jobs_from_config, run_batch, run_job, BatchOptions, BatchReport, CandleSource, JobError,
    JobOutcome, JobResult, SignalJob,
};
pub use config::{ConfigError, InstrumentConfig, OutputConfig, RunConfig};
pub use data_loader::{
    generate_synthetic_candles, load_candles, read_candles, LoadError, SyntheticOptions,
};
pub use export::{
    artifact_stem, export_candles_csv, export_signals_csv, load_manifest, save_artifacts,
    RunManifest,
};
