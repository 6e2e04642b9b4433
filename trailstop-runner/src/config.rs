//! Serializable run configuration.
//!
//! A run file names the signal parameters once and lists the instruments to
//! compute them for:
//!
//! ```toml
//! [signal]
//! period = 10
//! multiplier = 1.0
//! source_mode = "raw_close"
//!
//! [output]
//! dir = "results"
//!
//! [[instruments]]
//! symbol = "BTC/USDT"
//! path = "data/btc_15m.csv"
//! ```
//!
//! An instrument may carry its own `[instruments.signal]` table to override
//! the shared parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trailstop_core::SignalConfig;

use crate::export::artifact_stem;

/// Errors from reading or validating a run file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One instrument to compute signals for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    /// Candle CSV path, relative to the config file's directory unless absolute.
    pub path: PathBuf,
    /// Overrides the shared `[signal]` table for this instrument only.
    #[serde(default)]
    pub signal: Option<SignalConfig>,
}

/// Output location for exported artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

/// A complete batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Wall-clock budget per instrument, in milliseconds.
    #[serde(default)]
    pub budget_ms: Option<u64>,
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

impl RunConfig {
    /// Load a run file. Relative instrument paths are resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse and validate a run file from a TOML string.
    ///
    /// Signal parameters are validated during deserialization.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[instruments]] entry is required".into(),
            ));
        }
        // Artifact directories must be distinct even on case-folding filesystems.
        let mut seen: HashMap<String, &str> = HashMap::new();
        for inst in &self.instruments {
            if inst.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("instrument symbol is empty".into()));
            }
            let stem = artifact_stem(&inst.symbol).to_ascii_lowercase();
            if let Some(prev) = seen.insert(stem, inst.symbol.as_str()) {
                let msg = if prev == inst.symbol {
                    format!("duplicate instrument symbol '{prev}'")
                } else {
                    format!(
                        "instruments '{prev}' and '{}' would share an artifact directory",
                        inst.symbol
                    )
                };
                return Err(ConfigError::Invalid(msg));
            }
        }
        if self.budget_ms == Some(0) {
            return Err(ConfigError::Invalid("budget_ms must be > 0".into()));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for inst in &mut self.instruments {
            if inst.path.is_relative() {
                inst.path = base.join(&inst.path);
            }
        }
        if self.output.dir.is_relative() {
            self.output.dir = base.join(&self.output.dir);
        }
    }

    /// Effective signal parameters for an instrument.
    pub fn signal_for(&self, instrument: &InstrumentConfig) -> SignalConfig {
        instrument.signal.unwrap_or(self.signal)
    }
}
