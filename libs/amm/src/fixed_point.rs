//! Conversion between on-chain fixed-point integers and local float estimates
//!
//! On-chain balances are unsigned integers scaled by `10^digits` (9 digits by
//! default). All pricing math runs on `f64` after reading a balance, and
//! results destined for transaction arguments are written back with a floor.
//!
//! Round-trips are lossy. The only rounding guarantee is the floor applied
//! by [`unread_balance`].

use crate::error::{CmmmError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decimal digits used when no explicit precision is supplied
pub const DEFAULT_DIGITS: u32 = 9;

/// Floating estimate used for every intermediate value, weight and fee
pub type LocalNumber = f64;

/// Integer, scaled on-chain amount (balances, LP supply, trade amounts)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(u128);

impl Balance {
    pub const ZERO: Balance = Balance(0);

    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Balance) -> Balance {
        Balance(self.0.saturating_sub(other.0))
    }

    /// Exact decimal rendering for display, e.g. `1500000000` at 9 digits is `1.5`
    pub fn to_decimal(self, digits: u32) -> Result<Decimal> {
        let unrepresentable = || CmmmError::UnrepresentableAmount {
            value: self.0 as f64,
        };
        let mantissa = i128::try_from(self.0).map_err(|_| unrepresentable())?;
        Decimal::try_from_i128_with_scale(mantissa, digits).map_err(|_| unrepresentable())
    }
}

impl From<u64> for Balance {
    fn from(raw: u64) -> Self {
        Self(raw as u128)
    }
}

impl From<u128> for Balance {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl From<Balance> for u128 {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn scale(digits: u32) -> f64 {
    10f64.powi(digits as i32)
}

/// `x / 10^digits`
pub fn read_balance(x: Balance, digits: u32) -> LocalNumber {
    x.0 as f64 / scale(digits)
}

/// `floor(x * 10^digits)` as an on-chain integer
pub fn unread_balance(x: LocalNumber, digits: u32) -> Result<Balance> {
    let scaled = (x * scale(digits)).floor();
    // u128::MAX rounds up to 2^128 as f64, so the bound is exclusive
    if !scaled.is_finite() || scaled < 0.0 || scaled >= u128::MAX as f64 {
        return Err(CmmmError::UnrepresentableAmount { value: x });
    }
    Ok(Balance(scaled as u128))
}

/// Reads a slice of balances with the default precision
pub(crate) fn read_all(balances: &[Balance]) -> Vec<LocalNumber> {
    balances
        .iter()
        .map(|balance| read_balance(*balance, DEFAULT_DIGITS))
        .collect()
}
