//! Signal configuration: the immutable parameter set passed into the engine.
//!
//! Fields are private and validated once in [`SignalConfig::new`]. Serde goes
//! through [`RawSignalConfig`] so a config loaded from TOML or JSON is held to
//! the same rules as one built in code.

use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Which price series drives the recurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    RawClose,
    /// `(open + high + low + close) / 4`, the Heikin-Ashi close.
    SmoothedAverage,
}

/// Series compared against the trailing stop by the crossover detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrossBasis {
    /// The source itself.
    #[default]
    Source,
    /// Span-EMA of the source. Period 1 is the identity.
    Ema { period: usize },
}

/// How the recurrence treats the bar before the first one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedConvention {
    /// No previous stop: bar 0 (and any bar after an undefined stop) starts
    /// at `source + margin`.
    #[default]
    Undefined,
    /// The previous stop is `0.0` and the previous source is `source[0]`;
    /// the transition rule applies from bar 0.
    Zero,
}

/// Validated engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSignalConfig", into = "RawSignalConfig")]
pub struct SignalConfig {
    period: usize,
    multiplier: f64,
    source_mode: SourceMode,
    cross_basis: CrossBasis,
    seed_convention: SeedConvention,
}

impl SignalConfig {
    /// Build a config with default crossover basis and seed convention.
    pub fn new(period: usize, multiplier: f64, source_mode: SourceMode) -> Result<Self, SignalError> {
        Self::with_options(
            period,
            multiplier,
            source_mode,
            CrossBasis::default(),
            SeedConvention::default(),
        )
    }

    pub fn with_options(
        period: usize,
        multiplier: f64,
        source_mode: SourceMode,
        cross_basis: CrossBasis,
        seed_convention: SeedConvention,
    ) -> Result<Self, SignalError> {
        if period < 1 {
            return Err(SignalError::invalid(
                "period",
                format!("must be >= 1, got {period}"),
            ));
        }
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(SignalError::invalid(
                "multiplier",
                format!("must be finite and > 0, got {multiplier}"),
            ));
        }
        if let CrossBasis::Ema { period: ema_period } = cross_basis {
            if ema_period < 1 {
                return Err(SignalError::invalid(
                    "cross_basis.period",
                    format!("must be >= 1, got {ema_period}"),
                ));
            }
        }
        Ok(Self {
            period,
            multiplier,
            source_mode,
            cross_basis,
            seed_convention,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn source_mode(&self) -> SourceMode {
        self.source_mode
    }

    pub fn cross_basis(&self) -> CrossBasis {
        self.cross_basis
    }

    pub fn seed_convention(&self) -> SeedConvention {
        self.seed_convention
    }

    /// Copy with a different crossover basis, revalidated.
    pub fn with_cross_basis(self, cross_basis: CrossBasis) -> Result<Self, SignalError> {
        Self::with_options(
            self.period,
            self.multiplier,
            self.source_mode,
            cross_basis,
            self.seed_convention,
        )
    }

    /// Copy with a different seed convention.
    pub fn with_seed_convention(self, seed_convention: SeedConvention) -> Self {
        Self {
            seed_convention,
            ..self
        }
    }
}

impl Default for SignalConfig {
    /// ATR period 10, key value 1.0, raw close.
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 1.0,
            source_mode: SourceMode::RawClose,
            cross_basis: CrossBasis::Source,
            seed_convention: SeedConvention::Undefined,
        }
    }
}

/// Unvalidated serde mirror of [`SignalConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSignalConfig {
    pub period: usize,
    pub multiplier: f64,
    #[serde(default)]
    pub source_mode: SourceMode,
    #[serde(default)]
    pub cross_basis: CrossBasis,
    #[serde(default)]
    pub seed_convention: SeedConvention,
}

impl TryFrom<RawSignalConfig> for SignalConfig {
    type Error = SignalError;

    fn try_from(raw: RawSignalConfig) -> Result<Self, Self::Error> {
        SignalConfig::with_options(
            raw.period,
            raw.multiplier,
            raw.source_mode,
            raw.cross_basis,
            raw.seed_convention,
        )
    }
}

impl From<SignalConfig> for RawSignalConfig {
    fn from(config: SignalConfig) -> Self {
        Self {
            period: config.period,
            multiplier: config.multiplier,
            source_mode: config.source_mode,
            cross_basis: config.cross_basis,
            seed_convention: config.seed_convention,
        }
    }
}
