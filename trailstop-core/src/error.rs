//! Structured error types for the signal engine.
//!
//! Empty input is not an error: every stage maps a zero-length series to
//! zero-length outputs. Non-finite prices are tolerated by the per-stage
//! propagation rules and never surface here.

use thiserror::Error;

/// Errors raised by the signal engine.
///
/// Any error aborts the whole computation. No partial output is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("length mismatch in {context}: {left} vs {right}")]
    LengthMismatch {
        context: &'static str,
        left: usize,
        right: usize,
    },

    #[error("candle timestamps must be strictly increasing (violated at index {index})")]
    UnorderedTimestamps { index: usize },
}

impl SignalError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Fails with `LengthMismatch` unless both lengths agree.
    pub(crate) fn check_aligned(
        context: &'static str,
        left: usize,
        right: usize,
    ) -> Result<(), Self> {
        if left == right {
            Ok(())
        } else {
            Err(Self::LengthMismatch {
                context,
                left,
                right,
            })
        }
    }
}
