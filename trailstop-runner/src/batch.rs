//! Parallel per-instrument signal computation.
//!
//! Each job owns its candle series end-to-end: load, compute, fingerprint.
//! Jobs share nothing, so they run on the rayon pool without coordination.
//! A failed or over-budget job is reported on its own and never affects the
//! others.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};
use trailstop_core::fingerprint::RunFingerprint;
use trailstop_core::{compute_signals, CandleSeries, SignalConfig, SignalError, SignalFrame};

use crate::config::RunConfig;
use crate::data_loader::{load_candles, LoadError};

/// Why a job produced no output.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("signal computation failed: {0}")]
    Signal(#[from] SignalError),

    #[error("failed to load candles: {0}")]
    Load(#[from] LoadError),

    #[error("exceeded budget of {budget:?} (took {elapsed:?})")]
    BudgetExceeded { budget: Duration, elapsed: Duration },
}

/// Where a job gets its candles.
#[derive(Debug, Clone)]
pub enum CandleSource {
    Csv(PathBuf),
    InMemory(CandleSeries),
}

/// One instrument under one config.
#[derive(Debug, Clone)]
pub struct SignalJob {
    pub symbol: String,
    pub source: CandleSource,
    pub config: SignalConfig,
}

impl SignalJob {
    pub fn in_memory(symbol: impl Into<String>, candles: CandleSeries, config: SignalConfig) -> Self {
        Self {
            symbol: symbol.into(),
            source: CandleSource::InMemory(candles),
            config,
        }
    }
}

/// Batch execution options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Per-job wall-clock budget. Checked after the job's full
    /// recomputation; an over-budget result is discarded.
    pub budget: Option<Duration>,
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            budget: None,
            parallel: true,
        }
    }
}

impl BatchOptions {
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            budget: config.budget_ms.map(Duration::from_millis),
            ..Default::default()
        }
    }
}

/// A completed job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub symbol: String,
    pub config: SignalConfig,
    pub candles: CandleSeries,
    pub frame: SignalFrame,
    pub fingerprint: RunFingerprint,
    pub elapsed: Duration,
}

/// A job's symbol paired with its result or error.
#[derive(Debug)]
pub struct JobOutcome {
    pub symbol: String,
    pub result: Result<JobResult, JobError>,
}

/// Outcomes of a batch, in job order.
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &JobError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.symbol.as_str(), e)))
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    pub fn get(&self, symbol: &str) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| o.symbol == symbol)
    }
}

/// Run one job under an optional budget.
pub fn run_job(job: &SignalJob, budget: Option<Duration>) -> Result<JobResult, JobError> {
    let started = Instant::now();

    let candles = match &job.source {
        CandleSource::Csv(path) => load_candles(path)?,
        CandleSource::InMemory(candles) => candles.clone(),
    };
    let frame = compute_signals(&candles, &job.config)?;
    let fingerprint = RunFingerprint::new(&candles, &job.config, &frame);

    let elapsed = started.elapsed();
    if let Some(budget) = budget {
        if elapsed > budget {
            return Err(JobError::BudgetExceeded { budget, elapsed });
        }
    }

    info!(
        symbol = %job.symbol,
        bars = frame.len(),
        buys = frame.flags.buy_count(),
        sells = frame.flags.sell_count(),
        output = fingerprint.output_hash.short(),
        elapsed_ms = elapsed.as_millis() as u64,
        "job complete"
    );

    Ok(JobResult {
        symbol: job.symbol.clone(),
        config: job.config,
        candles,
        frame,
        fingerprint,
        elapsed,
    })
}

/// Run every job, in parallel unless disabled. Outcomes keep job order.
pub fn run_batch(jobs: &[SignalJob], opts: &BatchOptions) -> BatchReport {
    let run = |job: &SignalJob| {
        let result = run_job(job, opts.budget);
        if let Err(e) = &result {
            warn!(symbol = %job.symbol, error = %e, "job failed");
        }
        JobOutcome {
            symbol: job.symbol.clone(),
            result,
        }
    };

    let outcomes: Vec<JobOutcome> = if opts.parallel {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    };

    let report = BatchReport { outcomes };
    info!(
        jobs = jobs.len(),
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch complete"
    );
    report
}

/// Jobs for every instrument in a run file.
pub fn jobs_from_config(config: &RunConfig) -> Vec<SignalJob> {
    config
        .instruments
        .iter()
        .map(|inst| SignalJob {
            symbol: inst.symbol.clone(),
            source: CandleSource::Csv(inst.path.clone()),
            config: config.signal_for(inst),
        })
        .collect()
}
