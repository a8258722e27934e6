//! Pool snapshot model
//!
//! An immutable, caller-built view of a weighted pool: ordered tokens with
//! balances, weights and per-token fees, plus LP supply and the pool-level
//! swap fee used by the liquidity math. The engine never caches or mutates a
//! snapshot.

use crate::bounds::{check_fee, check_token_count, check_weight};
use crate::error::{ensure_same_len, CmmmError, Result};
use crate::fixed_point::{read_balance, unread_balance, Balance, LocalNumber, DEFAULT_DIGITS};
use crate::invariant::calc_invariant;
use crate::liquidity_math::LiquidityMath;
use crate::swap_math::SwapMath;
use crate::withdraw_solver::WithdrawSolver;
use serde::{Deserialize, Serialize};

/// One coin held by a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolToken {
    /// Opaque coin identifier
    pub coin: String,
    pub balance: Balance,
    pub weight: LocalNumber,
    #[serde(default)]
    pub swap_fee_in: LocalNumber,
    #[serde(default)]
    pub swap_fee_out: LocalNumber,
    #[serde(default)]
    pub deposit_fee: LocalNumber,
    #[serde(default)]
    pub withdraw_fee: LocalNumber,
}

/// Immutable pool state for a single quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub tokens: Vec<PoolToken>,
    pub lp_total_supply: Balance,
    /// Fee charged on the taxable part of unbalanced joins and exits
    pub swap_fee_percentage: LocalNumber,
}

fn apply_fee(amount: Balance, fee: LocalNumber) -> Result<Balance> {
    unread_balance(read_balance(amount, DEFAULT_DIGITS) * (1.0 - fee), DEFAULT_DIGITS)
}

impl PoolSnapshot {
    pub fn new(
        tokens: Vec<PoolToken>,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Self {
        Self {
            tokens,
            lp_total_supply,
            swap_fee_percentage,
        }
    }

    /// Checks token count, weight floor and fee ranges
    ///
    /// Weights summing to 1 is the caller's responsibility.
    pub fn validate(&self) -> Result<()> {
        check_token_count(self.tokens.len())?;
        check_fee(self.swap_fee_percentage)?;
        for token in &self.tokens {
            check_weight(token.weight)?;
            check_fee(token.swap_fee_in)?;
            check_fee(token.swap_fee_out)?;
            check_fee(token.deposit_fee)?;
            check_fee(token.withdraw_fee)?;
        }
        Ok(())
    }

    pub fn index_of(&self, coin: &str) -> Result<usize> {
        self.tokens
            .iter()
            .position(|token| token.coin == coin)
            .ok_or_else(|| CmmmError::UnknownCoin(coin.to_string()))
    }

    pub fn token(&self, coin: &str) -> Result<&PoolToken> {
        self.index_of(coin).map(|index| &self.tokens[index])
    }

    pub fn balances(&self) -> Vec<Balance> {
        self.tokens.iter().map(|token| token.balance).collect()
    }

    pub fn weights(&self) -> Vec<LocalNumber> {
        self.tokens.iter().map(|token| token.weight).collect()
    }

    pub fn invariant(&self) -> Result<LocalNumber> {
        calc_invariant(&self.weights(), &self.balances())
    }

    /// Combined fee for a trade: coin in pays its inbound fee, coin out its outbound fee
    pub fn trade_fee(&self, coin_in: &str, coin_out: &str) -> Result<LocalNumber> {
        let token_in = self.token(coin_in)?;
        let token_out = self.token(coin_out)?;
        Ok(1.0 - (1.0 - token_in.swap_fee_in) * (1.0 - token_out.swap_fee_out))
    }

    pub fn spot_price(&self, coin_in: &str, coin_out: &str) -> Result<LocalNumber> {
        let token_in = self.token(coin_in)?;
        let token_out = self.token(coin_out)?;
        Ok(SwapMath::calc_spot_price(
            token_in.balance,
            token_in.weight,
            token_out.balance,
            token_out.weight,
        ))
    }

    pub fn trade_amount_out(
        &self,
        coin_in: &str,
        coin_out: &str,
        amount_in: Balance,
    ) -> Result<Balance> {
        let token_in = self.token(coin_in)?;
        let token_out = self.token(coin_out)?;
        SwapMath::calc_out_given_in(
            token_in.balance,
            token_in.weight,
            token_out.balance,
            token_out.weight,
            amount_in,
            self.trade_fee(coin_in, coin_out)?,
        )
    }

    pub fn trade_amount_in(
        &self,
        coin_in: &str,
        coin_out: &str,
        amount_out: Balance,
    ) -> Result<Balance> {
        let token_in = self.token(coin_in)?;
        let token_out = self.token(coin_out)?;
        SwapMath::calc_in_given_out(
            token_in.balance,
            token_in.weight,
            token_out.balance,
            token_out.weight,
            amount_out,
            self.trade_fee(coin_in, coin_out)?,
        )
    }

    /// Output lost to slippage for an exact-in trade
    pub fn price_impact(
        &self,
        coin_in: &str,
        coin_out: &str,
        amount_in: Balance,
    ) -> Result<Balance> {
        let token_in = self.token(coin_in)?;
        let token_out = self.token(coin_out)?;
        SwapMath::calc_price_impact_fully(
            token_in.balance,
            token_in.weight,
            token_out.balance,
            token_out.weight,
            amount_in,
            self.trade_fee(coin_in, coin_out)?,
        )
    }

    /// LP minted for a deposit given in pool token order
    ///
    /// Each token's deposit fee is taken off its amount before the
    /// taxable-portion fee model runs.
    pub fn deposit_lp_out(&self, amounts_in: &[Balance]) -> Result<Balance> {
        ensure_same_len(self.tokens.len(), amounts_in.len())?;

        let amounts_after_fee = self
            .tokens
            .iter()
            .zip(amounts_in)
            .map(|(token, amount)| apply_fee(*amount, token.deposit_fee))
            .collect::<Result<Vec<_>>>()?;

        LiquidityMath::calc_lp_out_given_exact_tokens_in(
            &self.balances(),
            &self.weights(),
            &amounts_after_fee,
            self.lp_total_supply,
            self.swap_fee_percentage,
        )
    }

    /// Proportional amounts, deposit fees included, to mint exactly `lp_amount_out`
    pub fn all_coin_deposit_amounts_in(&self, lp_amount_out: Balance) -> Result<Vec<Balance>> {
        let amounts = LiquidityMath::calc_all_tokens_in_given_exact_lp_out(
            &self.balances(),
            lp_amount_out,
            self.lp_total_supply,
        )?;

        self.tokens
            .iter()
            .zip(amounts)
            .map(|(token, amount)| {
                unread_balance(
                    read_balance(amount, DEFAULT_DIGITS) / (1.0 - token.deposit_fee),
                    DEFAULT_DIGITS,
                )
            })
            .collect()
    }

    /// Amounts received, net of withdraw fees, for burning `lp_amount_in`
    /// along the direction `requested_amounts_out`
    pub fn withdraw_amounts_out(
        &self,
        requested_amounts_out: &[Balance],
        lp_amount_in: Balance,
    ) -> Result<Vec<Balance>> {
        let amounts = WithdrawSolver::calc_requested_tokens_out_given_exact_lp_in(
            &self.balances(),
            requested_amounts_out,
            &self.weights(),
            lp_amount_in,
            self.lp_total_supply,
            self.swap_fee_percentage,
        )?;

        self.tokens
            .iter()
            .zip(amounts)
            .map(|(token, amount)| apply_fee(amount, token.withdraw_fee))
            .collect()
    }

    /// Proportional amounts received, net of withdraw fees, for burning `lp_amount_in`
    pub fn all_coin_withdraw_amounts_out(&self, lp_amount_in: Balance) -> Result<Vec<Balance>> {
        let amounts = LiquidityMath::calc_tokens_out_given_exact_lp_in(
            &self.balances(),
            lp_amount_in,
            self.lp_total_supply,
        )?;

        self.tokens
            .iter()
            .zip(amounts)
            .map(|(token, amount)| apply_fee(amount, token.withdraw_fee))
            .collect()
    }
}
