//! Domain types for TrailStop

pub mod candle;

pub use candle::{Candle, CandleSeries};
