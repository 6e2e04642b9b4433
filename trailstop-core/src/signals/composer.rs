//! Signal composition: position relative to the stop plus a fresh cross.
//!
//! buy[i]  = source[i] > stop[i] and crossed_above[i]
//! sell[i] = source[i] < stop[i] and crossed_below[i]

use serde::{Deserialize, Serialize};

use crate::engine::Crossovers;
use crate::error::SignalError;

/// Per-bar buy/sell flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalFlags {
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

impl SignalFlags {
    pub fn len(&self) -> usize {
        self.buy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy.is_empty()
    }

    pub fn buy_count(&self) -> usize {
        self.buy.iter().filter(|b| **b).count()
    }

    pub fn sell_count(&self) -> usize {
        self.sell.iter().filter(|s| **s).count()
    }
}

/// Combine the source/stop relation with crossover events.
///
/// `crosses` may come from a basis other than the source (e.g. an EMA of it);
/// the above/below filter always uses the source itself.
pub fn compose(
    source: &[f64],
    stop: &[f64],
    crosses: &Crossovers,
) -> Result<SignalFlags, SignalError> {
    SignalError::check_aligned("compose(source, stop)", source.len(), stop.len())?;
    SignalError::check_aligned("compose(source, crosses)", source.len(), crosses.above.len())?;
    SignalError::check_aligned("compose(source, crosses)", source.len(), crosses.below.len())?;

    let buy = source
        .iter()
        .zip(stop)
        .zip(&crosses.above)
        .map(|((s, p), crossed)| *s > *p && *crossed)
        .collect();
    let sell = source
        .iter()
        .zip(stop)
        .zip(&crosses.below)
        .map(|((s, p), crossed)| *s < *p && *crossed)
        .collect();

    Ok(SignalFlags { buy, sell })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::crossovers;

    #[test]
    fn buy_requires_source_above_stop_and_cross() {
        let source = [10.0, 12.0, 14.0];
        let stop = [11.0, 11.0, 13.0];
        let crosses = crossovers(&source, &stop).unwrap();
        let flags = compose(&source, &stop, &crosses).unwrap();
        assert_eq!(flags.buy, vec![false, true, false]);
        assert_eq!(flags.sell, vec![false, false, false]);
        assert_eq!(flags.buy_count(), 1);
    }

    #[test]
    fn cross_without_position_filter_is_suppressed() {
        // Basis crosses above, but the source itself sits below the stop.
        let source = [9.0, 9.0];
        let stop = [10.0, 10.0];
        let crosses = Crossovers {
            above: vec![false, true],
            below: vec![false, false],
        };
        let flags = compose(&source, &stop, &crosses).unwrap();
        assert_eq!(flags.buy, vec![false, false]);
    }

    #[test]
    fn sell_on_cross_below() {
        let source = [12.0, 9.0];
        let stop = [11.0, 11.0];
        let crosses = crossovers(&source, &stop).unwrap();
        let flags = compose(&source, &stop, &crosses).unwrap();
        assert_eq!(flags.sell, vec![false, true]);
        assert_eq!(flags.sell_count(), 1);
    }

    #[test]
    fn nan_stop_never_signals() {
        let source = [10.0, 12.0];
        let stop = [f64::NAN, f64::NAN];
        let crosses = Crossovers {
            above: vec![false, true],
            below: vec![false, true],
        };
        let flags = compose(&source, &stop, &crosses).unwrap();
        assert_eq!(flags.buy, vec![false, false]);
        assert_eq!(flags.sell, vec![false, false]);
    }

    #[test]
    fn misaligned_inputs_fail() {
        let crosses = Crossovers {
            above: vec![false],
            below: vec![false],
        };
        assert!(matches!(
            compose(&[1.0, 2.0], &[1.0, 2.0], &crosses),
            Err(SignalError::LengthMismatch { .. })
        ));
        assert!(matches!(
            compose(&[1.0], &[1.0, 2.0], &crosses),
            Err(SignalError::LengthMismatch { .. })
        ));
    }
}
