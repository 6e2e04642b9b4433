//! Crossover detection between two aligned series.
//!
//! Crossed above at i: a[i] > b[i] and a[i-1] <= b[i-1].
//! Crossed below at i: a[i] < b[i] and a[i-1] >= b[i-1].
//! Bar 0 has no previous bar and never crosses. Any comparison with NaN is
//! false, so undefined operands never produce a cross.

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Per-bar crossover flags for `a` against `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossovers {
    pub above: Vec<bool>,
    pub below: Vec<bool>,
}

impl Crossovers {
    pub fn len(&self) -> usize {
        self.above.len()
    }

    pub fn is_empty(&self) -> bool {
        self.above.is_empty()
    }
}

/// Flags bars where `a` crosses above `b`.
pub fn crossed_above(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    SignalError::check_aligned("crossed_above", a.len(), b.len())?;
    Ok(scan(a, b, |now_a, now_b, prev_a, prev_b| {
        now_a > now_b && prev_a <= prev_b
    }))
}

/// Flags bars where `a` crosses below `b`.
pub fn crossed_below(a: &[f64], b: &[f64]) -> Result<Vec<bool>, SignalError> {
    SignalError::check_aligned("crossed_below", a.len(), b.len())?;
    Ok(scan(a, b, |now_a, now_b, prev_a, prev_b| {
        now_a < now_b && prev_a >= prev_b
    }))
}

/// Both directions at once.
pub fn crossovers(a: &[f64], b: &[f64]) -> Result<Crossovers, SignalError> {
    Ok(Crossovers {
        above: crossed_above(a, b)?,
        below: crossed_below(a, b)?,
    })
}

fn scan(a: &[f64], b: &[f64], cross: impl Fn(f64, f64, f64, f64) -> bool) -> Vec<bool> {
    let mut flags = vec![false; a.len()];
    for i in 1..a.len() {
        flags[i] = cross(a[i], b[i], a[i - 1], b[i - 1]);
    }
    flags
}
