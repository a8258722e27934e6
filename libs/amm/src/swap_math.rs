//! Weighted-pool swap math (single asset in, single asset out)
//!
//! Estimates follow the weighted constant-mean formulas on `f64`. Inputs and
//! amount outputs are on-chain integers read and written with
//! [`DEFAULT_DIGITS`](crate::fixed_point::DEFAULT_DIGITS).
//!
//! Known asymmetry: [`SwapMath::calc_out_given_in`] does not apply the
//! 30%-of-balance input bound ([`MAX_IN_RATIO`](crate::bounds::MAX_IN_RATIO)),
//! while [`SwapMath::calc_in_given_out`] does enforce the output bound. UI
//! callers rely on exact-in estimates for oversized hypothetical trades, so
//! the exact-in side stays unbounded.

use crate::bounds::check_out_ratio;
use crate::error::Result;
use crate::fixed_point::{read_balance, unread_balance, Balance, LocalNumber, DEFAULT_DIGITS};

fn read(x: Balance) -> LocalNumber {
    read_balance(x, DEFAULT_DIGITS)
}

fn unread(x: LocalNumber) -> Result<Balance> {
    unread_balance(x, DEFAULT_DIGITS)
}

/// Weighted swap math functions
pub struct SwapMath;

impl SwapMath {
    /// Output amount for an exact input
    ///
    /// # Arguments
    /// * `balance_in` / `balance_out` - Pool reserves of the two coins
    /// * `weight_in` / `weight_out` - Normalized weights of the two coins
    /// * `amount_in` - Exact input amount, fee included
    /// * `swap_fee` - Fraction of the input kept by the pool
    pub fn calc_out_given_in(
        balance_in: Balance,
        weight_in: LocalNumber,
        balance_out: Balance,
        weight_out: LocalNumber,
        amount_in: Balance,
        swap_fee: LocalNumber,
    ) -> Result<Balance> {
        let balance_in = read(balance_in);
        let balance_out = read(balance_out);

        let amount_in_without_fee = read(amount_in) * (1.0 - swap_fee);
        let ratio = balance_in / (balance_in + amount_in_without_fee);
        let amount_out = balance_out * (1.0 - ratio.powf(weight_in / weight_out));

        unread(amount_out)
    }

    /// Input amount, fee included, required for an exact output
    ///
    /// Fails with `ExceedsSwapBound` when `amount_out` is more than 30% of
    /// `balance_out`.
    pub fn calc_in_given_out(
        balance_in: Balance,
        weight_in: LocalNumber,
        balance_out: Balance,
        weight_out: LocalNumber,
        amount_out: Balance,
        swap_fee: LocalNumber,
    ) -> Result<Balance> {
        let balance_in = read(balance_in);
        let balance_out = read(balance_out);
        let amount_out = read(amount_out);

        check_out_ratio(amount_out, balance_out)?;

        let base = balance_out / (balance_out - amount_out);
        let exponent = weight_out / weight_in;
        let ratio = base.powf(exponent) - 1.0;
        let amount_in = balance_in * ratio / (1.0 - swap_fee);

        unread(amount_in)
    }

    /// Marginal price in units of coin in per coin out
    pub fn calc_spot_price(
        balance_in: Balance,
        weight_in: LocalNumber,
        balance_out: Balance,
        weight_out: LocalNumber,
    ) -> LocalNumber {
        (read(balance_in) / weight_in) / (read(balance_out) / weight_out)
    }

    /// Output at the spot price after fees, i.e. with no slippage
    pub fn calc_ideal_out_given_in(
        balance_in: Balance,
        weight_in: LocalNumber,
        balance_out: Balance,
        weight_out: LocalNumber,
        amount_in: Balance,
        swap_fee: LocalNumber,
    ) -> Result<Balance> {
        let spot_price = Self::calc_spot_price(balance_in, weight_in, balance_out, weight_out);
        let amount_in_without_fee = read(amount_in) * (1.0 - swap_fee);

        unread(amount_in_without_fee / spot_price)
    }

    /// Output lost to slippage: ideal output minus actual output
    ///
    /// Never negative for valid inputs since the weighted-product curve is
    /// concave.
    pub fn calc_price_impact_fully(
        balance_in: Balance,
        weight_in: LocalNumber,
        balance_out: Balance,
        weight_out: LocalNumber,
        amount_in: Balance,
        swap_fee: LocalNumber,
    ) -> Result<Balance> {
        let ideal = Self::calc_ideal_out_given_in(
            balance_in,
            weight_in,
            balance_out,
            weight_out,
            amount_in,
            swap_fee,
        )?;
        let actual = Self::calc_out_given_in(
            balance_in,
            weight_in,
            balance_out,
            weight_out,
            amount_in,
            swap_fee,
        )?;

        Ok(ideal.saturating_sub(actual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CmmmError;

    fn display(units: u64) -> Balance {
        Balance::new(units as u128 * 1_000_000_000)
    }

    #[test]
    fn test_equal_weight_output() {
        // 100 in against 1000:1000 with 0.3% fee
        let out = SwapMath::calc_out_given_in(
            display(1000),
            0.5,
            display(1000),
            0.5,
            display(100),
            0.003,
        )
        .unwrap();

        let expected = 1000.0 * (1.0 - 1000.0 / 1099.7);
        let got = read_balance(out, DEFAULT_DIGITS);
        assert!((got - expected).abs() < 1e-8, "got {got}, expected {expected}");
    }

    #[test]
    fn test_out_given_in_ignores_in_ratio() {
        // Half the input reserve still prices
        let out = SwapMath::calc_out_given_in(
            display(1000),
            0.5,
            display(1000),
            0.5,
            display(500),
            0.0,
        )
        .unwrap();
        assert!(out > Balance::ZERO);
        assert!(out < display(1000));
    }

    #[test]
    fn test_in_given_out_enforces_out_ratio() {
        let result = SwapMath::calc_in_given_out(
            display(1000),
            0.5,
            display(1000),
            0.5,
            display(301),
            0.003,
        );
        assert!(matches!(result, Err(CmmmError::ExceedsSwapBound { .. })));
    }

    #[test]
    fn test_in_given_out_inverts_out_given_in() {
        let amount_in = display(50);
        let out =
            SwapMath::calc_out_given_in(display(2000), 0.8, display(500), 0.2, amount_in, 0.0)
                .unwrap();
        let back =
            SwapMath::calc_in_given_out(display(2000), 0.8, display(500), 0.2, out, 0.0).unwrap();

        let relative = (back.raw() as f64 - amount_in.raw() as f64).abs() / amount_in.raw() as f64;
        assert!(relative < 1e-6);
    }

    #[test]
    fn test_spot_price_uses_weights() {
        // 80/20 pool with 4:1 balances is balanced at price 1
        let price = SwapMath::calc_spot_price(display(4000), 0.8, display(1000), 0.2);
        assert!((price - 1.0).abs() < 1e-12);

        let price = SwapMath::calc_spot_price(display(2000), 0.5, display(1000), 0.5);
        assert!((price - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_price_impact_is_positive() {
        let impact = SwapMath::calc_price_impact_fully(
            display(1000),
            0.5,
            display(1000),
            0.5,
            display(100),
            0.003,
        )
        .unwrap();

        // Ideal is 99.7, actual is ~90.66
        let got = read_balance(impact, DEFAULT_DIGITS);
        assert!(got > 9.0 && got < 9.1, "impact {got}");
    }
}
