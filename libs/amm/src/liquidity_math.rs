//! Deposit and withdrawal math for weighted pools
//!
//! Converts between token amounts and LP amounts. Unbalanced joins and exits
//! are charged the pool swap fee on their "taxable" portion: the part of an
//! amount that goes beyond the proportional share and is therefore
//! economically a swap. Proportional joins and exits are fee-free.
//!
//! ## Fee model
//!
//! For a join, each token's balance ratio `(balance + amount) / balance` is
//! compared against the weighted average ratio. Tokens above the average pay
//! `swap_fee_percentage` on the excess. Exits mirror this with
//! `(balance - amount) / balance`: tokens drained below the average pay the
//! fee, grossed up so that the user still receives the requested amount.

use crate::bounds::{check_added_weight, check_invariant_ratio};
use crate::error::{ensure_same_len, CmmmError, Result};
use crate::fixed_point::{
    read_all, read_balance, unread_balance, Balance, LocalNumber, DEFAULT_DIGITS,
};

fn read(x: Balance) -> LocalNumber {
    read_balance(x, DEFAULT_DIGITS)
}

fn unread(x: LocalNumber) -> Result<Balance> {
    unread_balance(x, DEFAULT_DIGITS)
}

/// Deposit amount left after charging the fee on its taxable portion
fn net_amount_in(
    balance: LocalNumber,
    amount_in: LocalNumber,
    invariant_ratio_with_fees: LocalNumber,
    swap_fee_percentage: LocalNumber,
) -> LocalNumber {
    let balance_ratio_with_fee = (balance + amount_in) / balance;
    if balance_ratio_with_fee > invariant_ratio_with_fees {
        let non_taxable_amount = (balance * (invariant_ratio_with_fees - 1.0)).max(0.0);
        let swap_fee = (amount_in - non_taxable_amount) * swap_fee_percentage;
        amount_in - swap_fee
    } else {
        amount_in
    }
}

/// Amount that must leave the pool so the user receives `amount_out` after
/// the fee on its taxable portion
///
/// Linear in `amount_out` for a fixed `invariant_ratio_without_fees` branch,
/// which the withdraw solver relies on.
pub(crate) fn gross_amount_out(
    balance: LocalNumber,
    amount_out: LocalNumber,
    invariant_ratio_without_fees: LocalNumber,
    swap_fee_percentage: LocalNumber,
) -> LocalNumber {
    let balance_ratio_without_fee = (balance - amount_out) / balance;
    if invariant_ratio_without_fees > balance_ratio_without_fee {
        let non_taxable_amount = (balance * (1.0 - invariant_ratio_without_fees)).max(0.0);
        let taxable_amount = amount_out - non_taxable_amount;
        non_taxable_amount + taxable_amount / (1.0 - swap_fee_percentage)
    } else {
        amount_out
    }
}

fn ensure_withdrawable(balance: LocalNumber, amount_out: LocalNumber) -> Result<()> {
    if amount_out >= balance {
        return Err(CmmmError::InvalidAmount(format!(
            "withdrawal of {amount_out} (fees included) drains balance {balance}"
        )));
    }
    Ok(())
}

fn proportional(
    balances: &[Balance],
    lp_amount: Balance,
    total_lp: Balance,
) -> Result<Vec<Balance>> {
    if total_lp.is_zero() {
        return Err(CmmmError::InvalidAmount("LP total supply is zero".to_string()));
    }
    let lp_ratio = read(lp_amount) / read(total_lp);

    balances
        .iter()
        .map(|balance| unread(read(*balance) * lp_ratio))
        .collect()
}

/// Deposit and withdrawal math functions
pub struct LiquidityMath;

impl LiquidityMath {
    // ---------------------------------------------------------------------
    // Deposits
    // ---------------------------------------------------------------------

    /// LP minted for an exact multi-token deposit
    ///
    /// Zero-amount entries are skipped. Never mints a negative amount: if
    /// the post-fee invariant does not grow, the result is zero.
    pub fn calc_lp_out_given_exact_tokens_in(
        balances: &[Balance],
        weights: &[LocalNumber],
        amounts_in: &[Balance],
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        ensure_same_len(balances.len(), weights.len())?;
        ensure_same_len(balances.len(), amounts_in.len())?;

        let balances = read_all(balances);
        let amounts_in = read_all(amounts_in);

        let invariant_ratio_with_fees: LocalNumber = balances
            .iter()
            .zip(&amounts_in)
            .zip(weights)
            .map(|((balance, amount_in), weight)| weight * ((balance + amount_in) / balance))
            .sum();

        let mut invariant_ratio = 1.0;
        for ((balance, amount_in), weight) in balances.iter().zip(&amounts_in).zip(weights) {
            if *amount_in == 0.0 {
                continue;
            }
            let amount_in_without_fee = net_amount_in(
                *balance,
                *amount_in,
                invariant_ratio_with_fees,
                swap_fee_percentage,
            );
            invariant_ratio *= ((balance + amount_in_without_fee) / balance).powf(*weight);
        }

        if invariant_ratio > 1.0 {
            unread(read(lp_total_supply) * (invariant_ratio - 1.0))
        } else {
            Ok(Balance::ZERO)
        }
    }

    /// LP minted for an exact single-token deposit
    pub fn calc_lp_out_given_exact_token_in(
        balance: Balance,
        weight: LocalNumber,
        amount_in: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        if amount_in.is_zero() {
            return Ok(Balance::ZERO);
        }
        let balance = read(balance);
        let amount_in = read(amount_in);

        let balance_ratio_with_fee = (balance + amount_in) / balance;
        let invariant_ratio_with_fees = balance_ratio_with_fee * weight + (1.0 - weight);

        let amount_in_without_fee = net_amount_in(
            balance,
            amount_in,
            invariant_ratio_with_fees,
            swap_fee_percentage,
        );
        let invariant_ratio = ((balance + amount_in_without_fee) / balance).powf(weight);

        if invariant_ratio > 1.0 {
            unread(read(lp_total_supply) * (invariant_ratio - 1.0))
        } else {
            Ok(Balance::ZERO)
        }
    }

    /// Single-token amount, fee included, needed to mint exactly `lp_amount_out`
    ///
    /// Fails with `ExceedsInvariantBound` if the join would grow the invariant
    /// more than 3x.
    pub fn calc_token_in_given_exact_lp_out(
        balance: Balance,
        weight: LocalNumber,
        lp_amount_out: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        let lp_total_supply = read(lp_total_supply);
        let invariant_ratio = (lp_total_supply + read(lp_amount_out)) / lp_total_supply;
        check_invariant_ratio(invariant_ratio)?;

        let balance = read(balance);
        let balance_ratio = invariant_ratio.powf(1.0 / weight);
        let amount_in_without_fee = balance * (balance_ratio - 1.0);

        // Only the share outside the token's own weight behaves like a swap
        let taxable_amount = amount_in_without_fee * (1.0 - weight);
        let non_taxable_amount = amount_in_without_fee - taxable_amount;

        unread(non_taxable_amount + taxable_amount / (1.0 - swap_fee_percentage))
    }

    /// Proportional amounts of every token needed to mint exactly `lp_amount_out`
    pub fn calc_all_tokens_in_given_exact_lp_out(
        balances: &[Balance],
        lp_amount_out: Balance,
        total_lp: Balance,
    ) -> Result<Vec<Balance>> {
        proportional(balances, lp_amount_out, total_lp)
    }

    /// LP minted when a new token joins the pool at final weight `weight`
    pub fn calc_lp_out_add_token(total_supply: Balance, weight: LocalNumber) -> Result<Balance> {
        check_added_weight(weight)?;

        unread(read(total_supply) * (1.0 / (1.0 - weight) - 1.0))
    }

    // ---------------------------------------------------------------------
    // Withdrawals
    // ---------------------------------------------------------------------

    /// LP burned for an exact multi-token withdrawal
    pub fn calc_lp_in_given_exact_tokens_out(
        balances: &[Balance],
        weights: &[LocalNumber],
        amounts_out: &[Balance],
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        ensure_same_len(balances.len(), weights.len())?;
        ensure_same_len(balances.len(), amounts_out.len())?;

        let balances = read_all(balances);
        let amounts_out = read_all(amounts_out);

        let invariant_ratio_without_fees: LocalNumber = balances
            .iter()
            .zip(&amounts_out)
            .zip(weights)
            .map(|((balance, amount_out), weight)| weight * ((balance - amount_out) / balance))
            .sum();

        let mut invariant_ratio = 1.0;
        for ((balance, amount_out), weight) in balances.iter().zip(&amounts_out).zip(weights) {
            if *amount_out == 0.0 {
                continue;
            }
            let amount_out_with_fee = gross_amount_out(
                *balance,
                *amount_out,
                invariant_ratio_without_fees,
                swap_fee_percentage,
            );
            ensure_withdrawable(*balance, amount_out_with_fee)?;
            invariant_ratio *= ((balance - amount_out_with_fee) / balance).powf(*weight);
        }

        if invariant_ratio < 1.0 {
            unread(read(lp_total_supply) * (1.0 - invariant_ratio))
        } else {
            Ok(Balance::ZERO)
        }
    }

    /// LP burned for an exact single-token withdrawal
    pub fn calc_lp_in_given_exact_token_out(
        balance: Balance,
        weight: LocalNumber,
        amount_out: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        if amount_out.is_zero() {
            return Ok(Balance::ZERO);
        }
        let balance = read(balance);
        let amount_out = read(amount_out);

        let balance_ratio_without_fee = (balance - amount_out) / balance;
        let invariant_ratio_without_fees = balance_ratio_without_fee * weight + (1.0 - weight);

        let amount_out_with_fee = gross_amount_out(
            balance,
            amount_out,
            invariant_ratio_without_fees,
            swap_fee_percentage,
        );
        ensure_withdrawable(balance, amount_out_with_fee)?;
        let invariant_ratio = ((balance - amount_out_with_fee) / balance).powf(weight);

        if invariant_ratio < 1.0 {
            unread(read(lp_total_supply) * (1.0 - invariant_ratio))
        } else {
            Ok(Balance::ZERO)
        }
    }

    /// Single-token amount, net of fees, received for burning exactly `lp_amount_in`
    ///
    /// Fails with `ExceedsInvariantBound` if the exit would shrink the
    /// invariant below 0.7x.
    pub fn calc_token_out_given_exact_lp_in(
        balance: Balance,
        weight: LocalNumber,
        lp_amount_in: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Balance> {
        let lp_total_supply = read(lp_total_supply);
        let invariant_ratio = (lp_total_supply - read(lp_amount_in)) / lp_total_supply;
        check_invariant_ratio(invariant_ratio)?;

        let balance = read(balance);
        let balance_ratio = invariant_ratio.powf(1.0 / weight);
        let amount_out_without_fee = balance * (1.0 - balance_ratio);

        let taxable_amount = amount_out_without_fee * (1.0 - weight);
        let non_taxable_amount = amount_out_without_fee - taxable_amount;

        unread(non_taxable_amount + taxable_amount * (1.0 - swap_fee_percentage))
    }

    /// Proportional amounts of every token received for burning exactly `lp_amount_in`
    pub fn calc_tokens_out_given_exact_lp_in(
        balances: &[Balance],
        lp_amount_in: Balance,
        total_lp: Balance,
    ) -> Result<Vec<Balance>> {
        proportional(balances, lp_amount_in, total_lp)
    }
}
