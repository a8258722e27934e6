//! Weighted Pool Math Property Tests
//!
//! These tests validate mathematical properties that must hold for any
//! valid pool, regardless of the specific balances, weights and fees.

use cmmm_amm::{Balance, LiquidityMath, SwapMath, WithdrawSolver};
use proptest::prelude::*;

const ONE: u128 = 1_000_000_000;

fn relative_diff(a: Balance, b: Balance) -> f64 {
    let (a, b) = (a.raw() as f64, b.raw() as f64);
    (a - b).abs() / a.abs().max(b.abs()).max(1.0)
}

// Property test strategies
prop_compose! {
    fn valid_balance()
        (units in 1_000u128..10_000_000u128) -> Balance {
        Balance::new(units * ONE)
    }
}

prop_compose! {
    fn valid_fee()
        (fee_bps in 0u32..500u32) -> f64 {
        fee_bps as f64 / 10_000.0
    }
}

prop_compose! {
    /// Two normalized weights inside [min, 1 - min]
    fn weight_pair(min: f64)
        (w in min..(1.0 - min)) -> (f64, f64) {
        (w, 1.0 - w)
    }
}

prop_compose! {
    /// Input amount between 1% and 30% of the given balance
    fn bounded_amount(balance: Balance)
        (share in 0.01f64..0.3f64) -> Balance {
        Balance::new((balance.raw() as f64 * share) as u128)
    }
}

prop_compose! {
    fn swap_case()
        (balance_in in valid_balance(), balance_out in valid_balance(), weights in weight_pair(0.1))
        (amount_in in bounded_amount(balance_in), balance_in in Just(balance_in),
         balance_out in Just(balance_out), weights in Just(weights)) -> (Balance, Balance, f64, f64, Balance) {
        (balance_in, balance_out, weights.0, weights.1, amount_in)
    }
}

proptest! {
    /// Property: exact-out inverts exact-in when no fee is charged
    #[test]
    fn swap_round_trip_without_fee(
        (balance_in, balance_out, weight_in, weight_out, amount_in) in swap_case(),
    ) {
        let amount_out = SwapMath::calc_out_given_in(
            balance_in, weight_in, balance_out, weight_out, amount_in, 0.0,
        ).unwrap();

        // Skewed weights can push the output past the exact-out bound
        let back = SwapMath::calc_in_given_out(
            balance_in, weight_in, balance_out, weight_out, amount_out, 0.0,
        );
        prop_assume!(back.is_ok());
        let back = back.unwrap();

        prop_assert!(relative_diff(back, amount_in) < 1e-6,
                    "amount_in {} came back as {}", amount_in, back);
    }

    /// Property: the curve is concave, so the ideal output is never below the actual one
    #[test]
    fn price_impact_is_non_negative(
        balance_in in valid_balance(),
        balance_out in valid_balance(),
        weight_in in 0.01f64..0.99f64,
        weight_out in 0.01f64..0.99f64,
        share in 0.0f64..0.3f64,
        fee in valid_fee(),
    ) {
        let amount_in = Balance::new((balance_in.raw() as f64 * share) as u128);

        let ideal = SwapMath::calc_ideal_out_given_in(
            balance_in, weight_in, balance_out, weight_out, amount_in, fee,
        ).unwrap();
        let actual = SwapMath::calc_out_given_in(
            balance_in, weight_in, balance_out, weight_out, amount_in, fee,
        ).unwrap();

        prop_assert!(ideal >= actual, "ideal {} below actual {}", ideal, actual);
    }

    /// Property: a multi-token deposit with one nonzero entry prices like a single-token deposit
    #[test]
    fn single_entry_deposit_matches_single_token(
        balances in prop::array::uniform2(valid_balance()),
        weights in weight_pair(0.05),
        index in 0usize..2,
        share in 0.001f64..2.0f64,
        lp_total_supply in valid_balance(),
        fee in valid_fee(),
    ) {
        let weights = [weights.0, weights.1];
        let mut amounts = [Balance::ZERO; 2];
        amounts[index] = Balance::new((balances[index].raw() as f64 * share) as u128);

        let multi = LiquidityMath::calc_lp_out_given_exact_tokens_in(
            &balances, &weights, &amounts, lp_total_supply, fee,
        ).unwrap();
        let single = LiquidityMath::calc_lp_out_given_exact_token_in(
            balances[index], weights[index], amounts[index], lp_total_supply, fee,
        ).unwrap();

        let tolerance = (multi.raw() as f64 * 1e-12).max(2.0) as u128;
        prop_assert!(multi.raw().abs_diff(single.raw()) <= tolerance,
                    "multi {} vs single {}", multi, single);
    }

    /// Property: a proportional withdrawal is charged no fee
    #[test]
    fn proportional_withdraw_is_fee_free(
        balances in prop::array::uniform3(valid_balance()),
        raw_weights in prop::array::uniform3(1u32..100u32),
        k in 0.001f64..0.5f64,
        lp_total_supply in valid_balance(),
        fee in valid_fee(),
    ) {
        let total: u32 = raw_weights.iter().sum();
        let weights: Vec<f64> = raw_weights.iter().map(|w| *w as f64 / total as f64).collect();
        let amounts: Vec<Balance> = balances
            .iter()
            .map(|balance| Balance::new((balance.raw() as f64 * k) as u128))
            .collect();

        let charged = LiquidityMath::calc_lp_in_given_exact_tokens_out(
            &balances, &weights, &amounts, lp_total_supply, fee,
        ).unwrap();
        let fee_free = LiquidityMath::calc_lp_in_given_exact_tokens_out(
            &balances, &weights, &amounts, lp_total_supply, 0.0,
        ).unwrap();
        let direct = Balance::new((lp_total_supply.raw() as f64 * k) as u128);

        prop_assert!(relative_diff(charged, fee_free) < 1e-9,
                    "charged {} vs fee-free {}", charged, fee_free);
        prop_assert!(relative_diff(fee_free, direct) < 1e-6,
                    "fee-free {} vs L*k {}", fee_free, direct);
    }

    /// Property: the solver converges and its result burns the requested LP
    ///
    /// Outputs are floored to raw units, so the burned LP is bracketed by
    /// the floored amounts and the same amounts plus one raw unit.
    #[test]
    fn withdraw_solver_reproduces_lp_in(
        balances in prop::array::uniform2(valid_balance()),
        weights in weight_pair(0.2),
        requested_exponents in prop::array::uniform2(-16.0f64..-0.005f64),
        lp_exponent in -12.0f64..-0.05f64,
        lp_total_supply in valid_balance(),
        fee in valid_fee(),
    ) {
        let weights = [weights.0, weights.1];
        let requested: Vec<Balance> = balances
            .iter()
            .zip(requested_exponents)
            .map(|(balance, exponent)| {
                let raw = (balance.raw() as f64 * 10f64.powf(exponent)) as u128;
                Balance::new(raw.max(1))
            })
            .collect();
        let lp_amount_in =
            Balance::new((lp_total_supply.raw() as f64 * 10f64.powf(lp_exponent)) as u128);

        let amounts_out = WithdrawSolver::calc_requested_tokens_out_given_exact_lp_in(
            &balances, &requested, &weights, lp_amount_in, lp_total_supply, fee,
        );
        prop_assert!(amounts_out.is_ok(), "solver failed: {:?}", amounts_out);
        let amounts_out = amounts_out.unwrap();

        let target = lp_amount_in.raw() as f64;
        let slack = 8.0 + 1e-4 * target;

        let burned = LiquidityMath::calc_lp_in_given_exact_tokens_out(
            &balances, &weights, &amounts_out, lp_total_supply, fee,
        ).unwrap();
        prop_assert!(burned.raw() as f64 <= target + slack,
                    "burned {} instead of {}", burned, lp_amount_in);

        let rounded_up: Vec<Balance> = amounts_out
            .iter()
            .map(|amount| Balance::new(amount.raw() + 1))
            .collect();
        if let Ok(upper) = LiquidityMath::calc_lp_in_given_exact_tokens_out(
            &balances, &weights, &rounded_up, lp_total_supply, fee,
        ) {
            prop_assert!(upper.raw() as f64 >= target - slack,
                        "rounded-up amounts burn {} instead of {}", upper, lp_amount_in);
        }
    }
}
