//! Protocol bounds shared by the swap and liquidity math
//!
//! These mirror the limits enforced on-chain. Each bound is checked at the
//! call site that needs it, never globally.

use crate::error::{CmmmError, Result};
use tracing::debug;

/// Minimum normalized weight of a single token
pub const MIN_WEIGHT: f64 = 0.01;

/// Follows from `MIN_WEIGHT` with weights summing to 1
pub const MAX_WEIGHTED_TOKENS: usize = 100;

/// Largest exact-in amount as a share of the input balance (not enforced, see `SwapMath`)
pub const MAX_IN_RATIO: f64 = 0.3;

/// Largest exact-out amount as a share of the output balance
pub const MAX_OUT_RATIO: f64 = 0.3;

/// Smallest post-exit invariant ratio for a non-proportional exit
pub const MIN_INVARIANT_RATIO: f64 = 0.7;

/// Largest post-join invariant ratio for a non-proportional join
pub const MAX_INVARIANT_RATIO: f64 = 3.0;

pub(crate) fn check_weight(weight: f64) -> Result<()> {
    // Written so that NaN fails too
    if !(weight >= MIN_WEIGHT) {
        debug!(weight, min = MIN_WEIGHT, "weight below protocol floor");
        return Err(CmmmError::InvalidWeight {
            weight,
            min: MIN_WEIGHT,
        });
    }
    Ok(())
}

/// A token joining an existing pool must leave it some weight
pub(crate) fn check_added_weight(weight: f64) -> Result<()> {
    check_weight(weight)?;
    if !(weight < 1.0) {
        debug!(weight, "added token would take the whole pool");
        return Err(CmmmError::WeightTooLarge { weight, max: 1.0 });
    }
    Ok(())
}

pub(crate) fn check_token_count(count: usize) -> Result<()> {
    if count > MAX_WEIGHTED_TOKENS {
        return Err(CmmmError::TooManyTokens {
            count,
            max: MAX_WEIGHTED_TOKENS,
        });
    }
    Ok(())
}

pub(crate) fn check_fee(fee: f64) -> Result<()> {
    if !(0.0..1.0).contains(&fee) {
        return Err(CmmmError::InvalidFee { fee });
    }
    Ok(())
}

pub(crate) fn check_out_ratio(amount_out: f64, balance_out: f64) -> Result<()> {
    let max_amount_out = balance_out * MAX_OUT_RATIO;
    if amount_out > max_amount_out {
        debug!(amount_out, max_amount_out, "exact-out swap above reserve bound");
        return Err(CmmmError::ExceedsSwapBound {
            amount_out,
            max_amount_out,
        });
    }
    Ok(())
}

pub(crate) fn check_invariant_ratio(ratio: f64) -> Result<()> {
    if !(MIN_INVARIANT_RATIO..=MAX_INVARIANT_RATIO).contains(&ratio) {
        debug!(ratio, "invariant ratio outside non-proportional join/exit range");
        return Err(CmmmError::ExceedsInvariantBound {
            ratio,
            min: MIN_INVARIANT_RATIO,
            max: MAX_INVARIANT_RATIO,
        });
    }
    Ok(())
}
