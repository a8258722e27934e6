//! Error taxonomy for CMMM quoting
//!
//! Every error is fatal to the single calculation that raised it. Callers
//! should treat any error as "no estimate available"; none of these are
//! transient, so nothing is retried internally.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CmmmError {
    /// Weight is below the protocol floor (or not a usable fraction)
    #[error("Invalid weight {weight}: must be at least {min}")]
    InvalidWeight { weight: f64, min: f64 },

    /// Weight leaves no room for the rest of the pool
    #[error("Invalid weight {weight}: must be below {max}")]
    WeightTooLarge { weight: f64, max: f64 },

    /// Weighted geometric mean came out non-positive
    #[error("Invariant must be positive, got {invariant}")]
    NonPositiveInvariant { invariant: f64 },

    /// Exact-out swap asks for too large a share of the output reserve
    #[error("Swap bound exceeded: amount out {amount_out} is above {max_amount_out}")]
    ExceedsSwapBound { amount_out: f64, max_amount_out: f64 },

    /// Non-proportional join/exit moves the invariant outside [min, max]
    #[error("Invariant ratio {ratio} outside allowed range [{min}, {max}]")]
    ExceedsInvariantBound { ratio: f64, min: f64, max: f64 },

    #[error("Withdraw solver did not converge after {iterations} iterations")]
    SolverDidNotConverge { iterations: usize },

    #[error("Length mismatch: expected {expected} entries, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Estimate cannot be written back as an on-chain integer (NaN, infinite, negative, too large)
    #[error("Value {value} cannot be represented as an on-chain balance")]
    UnrepresentableAmount { value: f64 },

    #[error("Pool holds {count} tokens, maximum is {max}")]
    TooManyTokens { count: usize, max: usize },

    #[error("Invalid fee {fee}: must be in [0, 1)")]
    InvalidFee { fee: f64 },

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),
}

pub type Result<T> = std::result::Result<T, CmmmError>;

/// Checks that parallel slices line up with the first one
pub(crate) fn ensure_same_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(CmmmError::LengthMismatch { expected, actual });
    }
    Ok(())
}
