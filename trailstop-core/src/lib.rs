//! TrailStop Core: ATR trailing-stop signal engine.
//!
//! This crate contains the pure computation:
//! - Domain types (candles, ordered candle series)
//! - True range and Wilder-smoothed volatility
//! - Source selection (raw close or OHLC average)
//! - The path-dependent trailing-stop recurrence
//! - Crossover detection and buy/sell composition
//! - Entry/exit directives for an external execution layer
//!
//! Every public entry point is a pure function of (candles, config). No state
//! survives between calls.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod pipeline;
pub mod signals;

pub use config::{CrossBasis, SeedConvention, SignalConfig, SourceMode};
pub use domain::{Candle, CandleSeries};
pub use error::SignalError;
pub use pipeline::{compute_signals, SignalFrame};
pub use signals::{Directives, SignalDirection, SignalEvent};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: all public result and config types are Send + Sync,
    /// so independent instruments can be computed on worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<CandleSeries>();
        require_sync::<CandleSeries>();
        require_send::<SignalConfig>();
        require_sync::<SignalConfig>();
        require_send::<SignalFrame>();
        require_sync::<SignalFrame>();
        require_send::<SignalEvent>();
        require_sync::<SignalEvent>();
        require_send::<SignalError>();
        require_sync::<SignalError>();
        require_send::<fingerprint::RunFingerprint>();
        require_sync::<fingerprint::RunFingerprint>();
        require_send::<indicators::Atr>();
        require_sync::<indicators::Atr>();
        require_send::<indicators::SourceSelector>();
        require_sync::<indicators::SourceSelector>();
    }

    /// Architecture contract: the engine entry point takes only candles and config.
    ///
    /// There is no position, order, or account parameter anywhere in the
    /// signature. If one is added, this stops compiling.
    #[test]
    fn compute_signals_has_no_portfolio_parameter() {
        fn _check(
            candles: &CandleSeries,
            config: &SignalConfig,
        ) -> Result<SignalFrame, SignalError> {
            compute_signals(candles, config)
        }
    }
}
