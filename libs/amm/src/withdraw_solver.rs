//! Proportional withdrawal solver
//!
//! Given a withdrawal *direction* (the requested amounts per token) and an
//! exact LP amount to burn, finds the scalar `p` such that withdrawing
//! `p * requested` costs exactly `lp_amount_in` under the same fee model as
//! [`LiquidityMath::calc_lp_in_given_exact_tokens_out`](crate::LiquidityMath).
//!
//! ## Cost function
//!
//! With `S = Σ w_i a_i / b_i` the invariant ratio without fees is `1 - p S`,
//! so whether token `i` is taxable does not depend on `p` and the fee-adjusted
//! withdrawal of token `i` is linear: `p * A_i`. The LP cost is then
//!
//! ```text
//! F(p)  = L (1 - Π ((b_i - p A_i) / b_i)^w_i) - lp_amount_in
//! F'(p) = L Π(...) Σ A_i w_i / (b_i - p A_i)
//! ```
//!
//! `F` is convex and increasing on `[0, M)` with `M = min b_i / A_i`, where
//! some token would be fully drained. Newton steps that land at or past `M`
//! are pulled back to `M - offset` with a halving offset; steps that land at
//! or below zero are pulled back to half the previous iterate.
//!
//! The burned fraction `1 - Π(...)` is evaluated as
//! `-expm1(Σ w_i ln_1p(-p A_i / b_i))` so that tiny withdrawals keep full
//! relative precision instead of cancelling against 1.

use crate::error::{ensure_same_len, CmmmError, Result};
use crate::fixed_point::{
    read_all, read_balance, unread_balance, Balance, LocalNumber, DEFAULT_DIGITS,
};
use crate::liquidity_math::gross_amount_out;
use crate::settings::SolverSettings;
use tracing::{debug, trace};

/// Requested amounts are scaled down until each is below this share of its balance
const PRESCALE_BALANCE_FRACTION: f64 = 0.5;

/// Fee-adjusted withdrawal problem after pre-scaling
struct Bracket {
    balances: Vec<LocalNumber>,
    weights: Vec<LocalNumber>,
    /// Fee-adjusted withdrawal per unit of `p`
    coefficients: Vec<LocalNumber>,
    /// Singularity: smallest `p` draining some token
    limit: LocalNumber,
}

impl Bracket {
    fn new(
        balances: Vec<LocalNumber>,
        weights: &[LocalNumber],
        scaled_amounts: &[LocalNumber],
        swap_fee_percentage: LocalNumber,
    ) -> Result<Self> {
        let weighted_balance_sum: LocalNumber = balances
            .iter()
            .zip(scaled_amounts)
            .zip(weights)
            .map(|((balance, amount), weight)| weight * amount / balance)
            .sum();
        let invariant_ratio_without_fees = 1.0 - weighted_balance_sum;

        let coefficients: Vec<LocalNumber> = balances
            .iter()
            .zip(scaled_amounts)
            .map(|(balance, amount)| {
                if *amount == 0.0 {
                    0.0
                } else {
                    gross_amount_out(
                        *balance,
                        *amount,
                        invariant_ratio_without_fees,
                        swap_fee_percentage,
                    )
                }
            })
            .collect();

        let limit = balances
            .iter()
            .zip(&coefficients)
            .filter(|(_, coefficient)| **coefficient > 0.0)
            .map(|(balance, coefficient)| balance / coefficient)
            .fold(f64::INFINITY, f64::min);

        if !limit.is_finite() {
            return Err(CmmmError::InvalidAmount(
                "requested withdrawal direction is empty".to_string(),
            ));
        }

        Ok(Self {
            balances,
            weights: weights.to_vec(),
            coefficients,
            limit,
        })
    }

    /// Residual `F(p)` and slope `F'(p)`
    fn evaluate(
        &self,
        p: LocalNumber,
        lp_total_supply: LocalNumber,
        lp_amount_in: LocalNumber,
    ) -> (LocalNumber, LocalNumber) {
        let mut log_remaining: LocalNumber = 0.0;
        let mut weighted_drain: LocalNumber = 0.0;
        for ((balance, weight), coefficient) in self
            .balances
            .iter()
            .zip(&self.weights)
            .zip(&self.coefficients)
        {
            log_remaining += weight * (-p * coefficient / balance).ln_1p();
            weighted_drain += coefficient * weight / (balance - p * coefficient);
        }

        let burned_fraction = -log_remaining.exp_m1();
        let cost = lp_total_supply * burned_fraction - lp_amount_in;
        let slope = lp_total_supply * log_remaining.exp() * weighted_drain;
        trace!(p, cost, slope, "withdraw solver step");

        (cost, slope)
    }
}

/// Solver for withdrawals along a requested direction
pub struct WithdrawSolver;

impl WithdrawSolver {
    /// Token amounts along `requested_amounts_out` that burn exactly `lp_amount_in`
    ///
    /// Uses [`SolverSettings::default`]. Fails with `SolverDidNotConverge` if
    /// the Newton iteration exhausts its budget.
    pub fn calc_requested_tokens_out_given_exact_lp_in(
        balances: &[Balance],
        requested_amounts_out: &[Balance],
        weights: &[LocalNumber],
        lp_amount_in: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
    ) -> Result<Vec<Balance>> {
        Self::calc_requested_tokens_out_given_exact_lp_in_with_settings(
            balances,
            requested_amounts_out,
            weights,
            lp_amount_in,
            lp_total_supply,
            swap_fee_percentage,
            &SolverSettings::default(),
        )
    }

    pub fn calc_requested_tokens_out_given_exact_lp_in_with_settings(
        balances: &[Balance],
        requested_amounts_out: &[Balance],
        weights: &[LocalNumber],
        lp_amount_in: Balance,
        lp_total_supply: Balance,
        swap_fee_percentage: LocalNumber,
        settings: &SolverSettings,
    ) -> Result<Vec<Balance>> {
        ensure_same_len(balances.len(), requested_amounts_out.len())?;
        ensure_same_len(balances.len(), weights.len())?;

        if lp_amount_in.is_zero() {
            return Ok(vec![Balance::ZERO; balances.len()]);
        }
        if lp_amount_in >= lp_total_supply {
            return Err(CmmmError::InvalidAmount(format!(
                "LP amount {lp_amount_in} must be below total supply {lp_total_supply}"
            )));
        }
        if balances.iter().any(|balance| balance.is_zero()) {
            return Err(CmmmError::InvalidAmount("pool balance is zero".to_string()));
        }

        let balances = read_all(balances);
        let requested = read_all(requested_amounts_out);
        let lp_amount_in = read_balance(lp_amount_in, DEFAULT_DIGITS);
        let lp_total_supply = read_balance(lp_total_supply, DEFAULT_DIGITS);

        let initial_scalar = Self::prescale(&balances, &requested, settings)?;
        let scaled: Vec<LocalNumber> = requested
            .iter()
            .map(|amount| amount / initial_scalar)
            .collect();

        let bracket = Bracket::new(balances, weights, &scaled, swap_fee_percentage)?;
        let p = Self::solve(&bracket, lp_total_supply, lp_amount_in, settings)?;

        scaled
            .iter()
            .map(|amount| unread_balance(amount * p, DEFAULT_DIGITS))
            .collect()
    }

    /// Doubles a divisor until every requested amount sits safely below half its balance
    fn prescale(
        balances: &[LocalNumber],
        requested: &[LocalNumber],
        settings: &SolverSettings,
    ) -> Result<LocalNumber> {
        let mut initial_scalar = 1.0;
        let mut doublings = 0;

        let unsafe_share = |scalar: LocalNumber| {
            requested
                .iter()
                .zip(balances)
                .any(|(amount, balance)| !(amount / scalar < balance * PRESCALE_BALANCE_FRACTION))
        };

        while unsafe_share(initial_scalar) {
            if doublings == settings.max_prescale_doublings {
                return Err(CmmmError::SolverDidNotConverge { iterations: 0 });
            }
            initial_scalar *= 2.0;
            doublings += 1;
        }

        Ok(initial_scalar)
    }

    /// Bounded Newton iteration started at the middle of `[0, M)`
    fn solve(
        bracket: &Bracket,
        lp_total_supply: LocalNumber,
        lp_amount_in: LocalNumber,
        settings: &SolverSettings,
    ) -> Result<LocalNumber> {
        let limit = bracket.limit;
        let tolerance = settings.relative_tolerance;
        let mut p = limit / 2.0;
        let mut offset = limit / 4.0;
        let mut halvings = 0;

        for round in 0..settings.max_iterations {
            let (cost, slope) = bracket.evaluate(p, lp_total_supply, lp_amount_in);
            if cost.abs() <= tolerance * lp_amount_in {
                debug!(rounds = round, p, cost, "withdraw solver converged on residual");
                return Ok(p);
            }

            let previous = p;
            let mut next = p - cost / slope;

            // Also catches NaN from a degenerate step
            while !(next < limit) {
                if halvings == settings.max_backoff_halvings {
                    debug!(round, halvings, "withdraw solver back-off exhausted");
                    return Err(CmmmError::SolverDidNotConverge { iterations: round + 1 });
                }
                next = limit - offset;
                offset /= 2.0;
                halvings += 1;
            }
            if !(next > 0.0) {
                next = previous / 2.0;
            }
            p = next;

            if (p - previous).abs() <= tolerance * p {
                debug!(rounds = round + 1, p, "withdraw solver converged on step");
                return Ok(p);
            }
        }

        debug!(max_iterations = settings.max_iterations, p, "withdraw solver did not converge");
        Err(CmmmError::SolverDidNotConverge {
            iterations: settings.max_iterations,
        })
    }
}
