//! Error types.

use thiserror::Error;

/// Result type alias for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or running the model.
///
/// `Configuration` aborts a run before any timestep is processed. The other
/// variants are scoped to the timestep that produced them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid array or model configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// Out-of-range per-timestep input (sun position or irradiance).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Degenerate sun/row geometry that clipping cannot resolve.
    #[error("degenerate geometry: {0}")]
    Geometry(String),
    /// Singular or ill-conditioned reflection system, or a failed postcondition.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

/// Fails with `Error::Configuration` unless `cond` holds.
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::Error::Configuration(format!($($arg)+)));
        }
    };
}

/// Fails with `Error::InvalidInput` unless `cond` holds.
macro_rules! ensure_input {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::Error::InvalidInput(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_config;
pub(crate) use ensure_input;
