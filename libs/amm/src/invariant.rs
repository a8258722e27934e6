//! Weighted geometric-mean invariant

use crate::bounds::check_weight;
use crate::error::{ensure_same_len, CmmmError, Result};
use crate::fixed_point::{read_balance, Balance, LocalNumber, DEFAULT_DIGITS};

/// Computes `Π balance_i ^ weight_i` over display-unit balances
///
/// Fails with `InvalidWeight` if any weight is below the protocol floor and
/// with `NonPositiveInvariant` if the product is not strictly positive (for
/// example when any balance is zero).
pub fn calc_invariant(weights: &[LocalNumber], balances: &[Balance]) -> Result<LocalNumber> {
    ensure_same_len(weights.len(), balances.len())?;

    let mut invariant = 1.0;
    for (weight, balance) in weights.iter().zip(balances) {
        check_weight(*weight)?;
        invariant *= read_balance(*balance, DEFAULT_DIGITS).powf(*weight);
    }

    if !(invariant > 0.0) {
        return Err(CmmmError::NonPositiveInvariant { invariant });
    }
    Ok(invariant)
}
