//! Error taxonomy for configuration, profile and per-step diagnostics.

use std::fmt;

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.efficiency"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Problems with the consumption / PV input series.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile is empty")]
    Empty,

    #[error("series length mismatch: {consumption} consumption samples vs {pv} PV samples")]
    LengthMismatch { consumption: usize, pv: usize },

    #[error("{len} timestamps supplied for {steps} samples")]
    TimestampMismatch { len: usize, steps: usize },

    #[error("non-finite value in `{series}` at sample {index}")]
    NonFinite { series: &'static str, index: usize },

    #[error("profile has {len} samples, more than the limit of {max}")]
    TooLong { len: usize, max: usize },

    #[error("cannot read profile \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile CSV at row {row}: {message}")]
    Csv { row: usize, message: String },
}

/// Fatal errors raised before a simulation starts.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// PV balance identity failure at one timestep.
///
/// Attached to the affected [`FlowRecord`](super::types::FlowRecord) instead
/// of aborting the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvariantViolation {
    pub timestep: usize,
    /// Residual of `production + consumption + battery + grid + curtailment` (kW).
    pub residual_kw: f64,
    /// Absolute tolerance that was exceeded (kW).
    pub tolerance_kw: f64,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pv balance off by {:.3e} kW at t={} (tolerance {:.3e} kW)",
            self.residual_kw, self.timestep, self.tolerance_kw
        )
    }
}
