//! Signal composition and directive mapping.
//!
//! Signals are portfolio-agnostic: they see only derived series, never
//! position or order state.

pub mod composer;
pub mod directive;

pub use composer::{compose, SignalFlags};
pub use directive::{Directives, SignalDirection, SignalEvent};
