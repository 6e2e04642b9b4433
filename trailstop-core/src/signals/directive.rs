//! Entry/exit directives handed to the external execution layer.
//!
//! A buy enters long and exits short on the same bar; a sell enters short and
//! exits long. Directives are advisory flags only: nothing here tracks
//! positions or places orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::composer::SignalFlags;
use crate::error::SignalError;

/// Direction of a signal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalDirection {
    LongEntry,
    ShortEntry,
    LongExit,
    ShortExit,
}

impl SignalDirection {
    /// Tag string attached to the directive column.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::LongEntry => "long",
            Self::ShortEntry => "short",
            Self::LongExit => "exit_long_signal",
            Self::ShortExit => "exit_short_signal",
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, Self::LongEntry | Self::ShortEntry)
    }
}

/// One directive on one bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub direction: SignalDirection,
    pub tag: String,
}

/// Per-bar directive columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    pub enter_long: Vec<bool>,
    pub enter_short: Vec<bool>,
    pub exit_long: Vec<bool>,
    pub exit_short: Vec<bool>,
}

impl Directives {
    pub fn from_flags(flags: &SignalFlags) -> Self {
        Self {
            enter_long: flags.buy.clone(),
            enter_short: flags.sell.clone(),
            exit_long: flags.sell.clone(),
            exit_short: flags.buy.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.enter_long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enter_long.is_empty()
    }

    /// Entry tag at `index`: "long", "short", or none.
    pub fn enter_tag(&self, index: usize) -> Option<&'static str> {
        if self.enter_long.get(index).copied().unwrap_or(false) {
            Some(SignalDirection::LongEntry.tag())
        } else if self.enter_short.get(index).copied().unwrap_or(false) {
            Some(SignalDirection::ShortEntry.tag())
        } else {
            None
        }
    }

    /// Exit tag at `index`: "exit_long_signal", "exit_short_signal", or none.
    pub fn exit_tag(&self, index: usize) -> Option<&'static str> {
        if self.exit_long.get(index).copied().unwrap_or(false) {
            Some(SignalDirection::LongExit.tag())
        } else if self.exit_short.get(index).copied().unwrap_or(false) {
            Some(SignalDirection::ShortExit.tag())
        } else {
            None
        }
    }

    /// Directions active at `index`, entries before exits.
    pub fn directions_at(&self, index: usize) -> Vec<SignalDirection> {
        let columns = [
            (&self.enter_long, SignalDirection::LongEntry),
            (&self.enter_short, SignalDirection::ShortEntry),
            (&self.exit_long, SignalDirection::LongExit),
            (&self.exit_short, SignalDirection::ShortExit),
        ];
        columns
            .iter()
            .filter(|(col, _)| col.get(index).copied().unwrap_or(false))
            .map(|(_, dir)| *dir)
            .collect()
    }

    /// Flatten the columns into an ordered event list.
    ///
    /// Fails with `LengthMismatch` if `timestamps` is not aligned with the columns.
    pub fn events(&self, timestamps: &[DateTime<Utc>]) -> Result<Vec<SignalEvent>, SignalError> {
        SignalError::check_aligned("directive events", self.len(), timestamps.len())?;

        let mut events = Vec::new();
        for (index, &timestamp) in timestamps.iter().enumerate() {
            for direction in self.directions_at(index) {
                events.push(SignalEvent {
                    index,
                    timestamp,
                    direction,
                    tag: direction.tag().to_string(),
                });
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        (0..n).map(|i| base + Duration::minutes(15 * i as i64)).collect()
    }

    fn sample_flags() -> SignalFlags {
        SignalFlags {
            buy: vec![false, true, false, false],
            sell: vec![false, false, false, true],
        }
    }

    #[test]
    fn buy_maps_to_enter_long_and_exit_short() {
        let d = Directives::from_flags(&sample_flags());
        assert!(d.enter_long[1] && d.exit_short[1]);
        assert!(!d.enter_short[1] && !d.exit_long[1]);
        assert_eq!(d.enter_tag(1), Some("long"));
        assert_eq!(d.exit_tag(1), Some("exit_short_signal"));
    }

    #[test]
    fn sell_maps_to_enter_short_and_exit_long() {
        let d = Directives::from_flags(&sample_flags());
        assert!(d.enter_short[3] && d.exit_long[3]);
        assert_eq!(d.enter_tag(3), Some("short"));
        assert_eq!(d.exit_tag(3), Some("exit_long_signal"));
    }

    #[test]
    fn quiet_bar_has_no_tags() {
        let d = Directives::from_flags(&sample_flags());
        assert_eq!(d.enter_tag(0), None);
        assert_eq!(d.exit_tag(0), None);
        assert_eq!(d.enter_tag(99), None);
        assert!(d.directions_at(2).is_empty());
    }

    #[test]
    fn events_are_ordered_entries_first() {
        let d = Directives::from_flags(&sample_flags());
        let ts = timestamps(4);
        let events = d.events(&ts).unwrap();
        let summary: Vec<(usize, SignalDirection, &str)> = events
            .iter()
            .map(|e| (e.index, e.direction, e.tag.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, SignalDirection::LongEntry, "long"),
                (1, SignalDirection::ShortExit, "exit_short_signal"),
                (3, SignalDirection::ShortEntry, "short"),
                (3, SignalDirection::LongExit, "exit_long_signal"),
            ]
        );
        assert_eq!(events[0].timestamp, ts[1]);
    }

    #[test]
    fn events_require_aligned_timestamps() {
        let d = Directives::from_flags(&sample_flags());
        assert!(matches!(
            d.events(&timestamps(3)),
            Err(SignalError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn direction_serializes_snake_case() {
        let json = serde_json::to_string(&SignalDirection::LongExit).unwrap();
        assert_eq!(json, "\"long_exit\"");
        assert!(SignalDirection::ShortEntry.is_entry());
        assert!(!SignalDirection::ShortExit.is_entry());
    }
}
