//! Path-dependent stop engine and crossover detection.
//!
//! Both stages work on plain aligned `f64` slices so the host can feed them
//! series that did not come from this crate's indicators.

pub mod crossover;
pub mod trailing_stop;

pub use crossover::{crossed_above, crossed_below, crossovers, Crossovers};
pub use trailing_stop::{noise_margin, trailing_stop};
