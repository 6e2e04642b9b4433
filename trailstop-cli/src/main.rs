//! TrailStop CLI: compute trailing-stop signals from candle files.
//!
//! Commands:
//! - `compute`: signals for one candle CSV with parameters from flags
//! - `batch`: every instrument in a TOML run file, in parallel
//! - `synthetic`: write a seeded random-walk candle CSV

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use trailstop_core::{CrossBasis, SeedConvention, SignalConfig, SourceMode};
use trailstop_runner::{
    export_candles_csv, generate_synthetic_candles, jobs_from_config, run_batch, run_job,
    save_artifacts, BatchOptions, CandleSource, JobResult, RunConfig, SignalJob,
    SyntheticOptions,
};

#[derive(Parser)]
#[command(
    name = "trailstop",
    about = "TrailStop CLI: ATR trailing-stop buy/sell signals"
)]
struct Cli {
    /// Log at info level.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log at debug level.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute signals for a single candle CSV.
    Compute(ComputeArgs),
    /// Compute signals for every instrument in a TOML run file.
    Batch {
        /// Path to the run file.
        #[arg(long)]
        config: PathBuf,

        /// Run instruments one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Override the run file's output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a seeded random-walk candle CSV.
    Synthetic {
        #[arg(long, default_value_t = 500)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Bar spacing in minutes.
        #[arg(long, default_value_t = 15)]
        interval_minutes: i64,

        /// Destination CSV path.
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Close,
    Ohlc4,
}

#[derive(Args)]
struct ComputeArgs {
    /// Candle CSV with timestamp,open,high,low,close columns.
    #[arg(long)]
    input: PathBuf,

    /// Label used in logs and artifact names. Defaults to the file stem.
    #[arg(long)]
    symbol: Option<String>,

    /// Volatility smoothing period.
    #[arg(long, default_value_t = 10)]
    period: usize,

    /// Volatility multiplier (key value).
    #[arg(long, default_value_t = 1.0)]
    multiplier: f64,

    /// Price source: raw close or the OHLC average.
    #[arg(long, value_enum, default_value = "close")]
    source: SourceArg,

    /// Cross an EMA of the source against the stop instead of the source.
    #[arg(long)]
    ema_basis: Option<usize>,

    /// Start the recurrence from a zero stop instead of source + margin.
    #[arg(long, default_value_t = false)]
    zero_seed: bool,

    /// Fail if the computation takes longer than this many milliseconds.
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Write signals.csv and manifest.json under this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print signal events as JSON lines.
    #[arg(long, default_value_t = false)]
    events: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);

    match cli.command {
        Commands::Compute(args) => run_compute(args),
        Commands::Batch {
            config,
            sequential,
            output_dir,
        } => run_batch_cmd(config, sequential, output_dir),
        Commands::Synthetic {
            bars,
            seed,
            interval_minutes,
            output,
        } => run_synthetic(bars, seed, interval_minutes, output),
    }
}

/// `RUST_LOG` wins unless a level flag is given.
fn init_logging(verbose: bool, debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_compute(args: ComputeArgs) -> Result<()> {
    let source_mode = match args.source {
        SourceArg::Close => SourceMode::RawClose,
        SourceArg::Ohlc4 => SourceMode::SmoothedAverage,
    };
    let cross_basis = match args.ema_basis {
        Some(period) => CrossBasis::Ema { period },
        None => CrossBasis::Source,
    };
    let seed = if args.zero_seed {
        SeedConvention::Zero
    } else {
        SeedConvention::Undefined
    };
    let config =
        SignalConfig::with_options(args.period, args.multiplier, source_mode, cross_basis, seed)
            .context("invalid signal parameters")?;

    let symbol = args.symbol.unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "candles".into())
    });
    let job = SignalJob {
        symbol,
        source: CandleSource::Csv(args.input),
        config,
    };

    let result = run_job(&job, args.budget_ms.map(Duration::from_millis))?;
    print_summary(&result);

    if args.events {
        for event in result.frame.events()? {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    if let Some(dir) = args.output_dir {
        let run_dir = save_artifacts(&result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_batch_cmd(
    config_path: PathBuf,
    sequential: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config = RunConfig::from_file(&config_path)?;
    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());

    let opts = BatchOptions {
        parallel: !sequential,
        ..BatchOptions::from_run_config(&config)
    };
    let jobs = jobs_from_config(&config);
    info!(jobs = jobs.len(), parallel = opts.parallel, "starting batch");

    let report = run_batch(&jobs, &opts);
    for result in report.succeeded() {
        print_summary(result);
        save_artifacts(result, &output_dir)?;
    }
    for (symbol, err) in report.failed() {
        eprintln!("Error for {symbol}: {err}");
    }
    println!(
        "{} succeeded, {} failed; artifacts in {}",
        report.success_count(),
        report.failure_count(),
        output_dir.display()
    );

    if report.failure_count() > 0 {
        bail!("{} job(s) failed", report.failure_count());
    }
    Ok(())
}

fn run_synthetic(bars: usize, seed: u64, interval_minutes: i64, output: PathBuf) -> Result<()> {
    if interval_minutes <= 0 {
        bail!("--interval-minutes must be positive");
    }
    let candles = generate_synthetic_candles(&SyntheticOptions {
        bars,
        seed,
        interval: chrono::Duration::minutes(interval_minutes),
        ..Default::default()
    })?;
    std::fs::write(&output, export_candles_csv(&candles)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {} candles to {}", candles.len(), output.display());
    Ok(())
}

fn print_summary(result: &JobResult) {
    let frame = &result.frame;
    let stop = frame
        .latest_stop()
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "-".into());
    println!(
        "{:<12} bars={:<7} buys={:<5} sells={:<5} stop={:<12} output={} ({} ms)",
        result.symbol,
        frame.len(),
        frame.flags.buy_count(),
        frame.flags.sell_count(),
        stop,
        result.fingerprint.output_hash.short(),
        result.elapsed.as_millis()
    );
}
