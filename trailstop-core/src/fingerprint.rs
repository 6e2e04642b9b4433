//! Run fingerprinting: deterministic identification of inputs and outputs.
//!
//! - `ConfigHash`: the signal parameters.
//! - `DatasetHash`: the candle series, bit-exact (NaN payloads included).
//! - `OutputHash`: every derived column of a `SignalFrame`, bit-exact.
//!
//! Two computations over the same dataset and config must produce the same
//! `OutputHash`; that is how idempotence is checked across runs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::SignalConfig;
use crate::domain::CandleSeries;
use crate::pipeline::SignalFrame;

macro_rules! hash_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_bytes(bytes: &[u8]) -> Self {
                Self(blake3::hash(bytes).to_hex().to_string())
            }

            /// First 12 hex characters, for log lines and file names.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(12)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

hash_newtype!(
    /// Identity of a `SignalConfig`.
    ConfigHash
);
hash_newtype!(
    /// Identity of a candle series.
    DatasetHash
);
hash_newtype!(
    /// Identity of a computed `SignalFrame`.
    OutputHash
);

impl ConfigHash {
    pub fn of(config: &SignalConfig) -> Self {
        // Field order is fixed by the struct, so the JSON is canonical.
        let json = serde_json::to_string(config).unwrap_or_default();
        Self::from_bytes(json.as_bytes())
    }
}

impl DatasetHash {
    pub fn of(candles: &CandleSeries) -> Self {
        let mut hasher = blake3::Hasher::new();
        for c in candles {
            hasher.update(&c.timestamp.timestamp_micros().to_le_bytes());
            hasher.update(&c.open.to_bits().to_le_bytes());
            hasher.update(&c.high.to_bits().to_le_bytes());
            hasher.update(&c.low.to_bits().to_le_bytes());
            hasher.update(&c.close.to_bits().to_le_bytes());
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

impl OutputHash {
    pub fn of(frame: &SignalFrame) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(frame.len() as u64).to_le_bytes());
        for series in [
            &frame.source,
            &frame.true_range,
            &frame.volatility,
            &frame.noise_margin,
            &frame.trailing_stop,
            &frame.basis,
        ] {
            for v in series {
                hasher.update(&v.to_bits().to_le_bytes());
            }
        }
        for flags in [
            &frame.crosses.above,
            &frame.crosses.below,
            &frame.flags.buy,
            &frame.flags.sell,
            &frame.directives.enter_long,
            &frame.directives.enter_short,
            &frame.directives.exit_long,
            &frame.directives.exit_short,
        ] {
            let bytes: Vec<u8> = flags.iter().map(|b| u8::from(*b)).collect();
            hasher.update(&bytes);
        }
        Self(hasher.finalize().to_hex().to_string())
    }
}

/// Complete record of one computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub output_hash: OutputHash,
}

impl RunFingerprint {
    pub fn new(candles: &CandleSeries, config: &SignalConfig, frame: &SignalFrame) -> Self {
        Self {
            config_hash: ConfigHash::of(config),
            dataset_hash: DatasetHash::of(candles),
            output_hash: OutputHash::of(frame),
        }
    }
}
