//! Pool trait definitions for a unified quoting interface

use crate::{Balance, LocalNumber, PoolSnapshot};
use anyhow::{Context, Result};

/// Unified pool interface for UI quotes
pub trait AmmPool {
    /// Calculate output amount for given input
    fn get_amount_out(&self, coin_in: &str, coin_out: &str, amount_in: Balance) -> Result<Balance>;

    /// Calculate required input for desired output
    fn get_amount_in(&self, coin_in: &str, coin_out: &str, amount_out: Balance) -> Result<Balance>;

    /// Marginal price in units of coin in per coin out
    fn get_spot_price(&self, coin_in: &str, coin_out: &str) -> Result<LocalNumber>;

    /// Output lost to slippage for an exact-in trade
    fn get_price_impact(&self, coin_in: &str, coin_out: &str, amount_in: Balance)
        -> Result<Balance>;
}

impl AmmPool for PoolSnapshot {
    fn get_amount_out(&self, coin_in: &str, coin_out: &str, amount_in: Balance) -> Result<Balance> {
        self.trade_amount_out(coin_in, coin_out, amount_in)
            .with_context(|| format!("quoting {amount_in} {coin_in} -> {coin_out}"))
    }

    fn get_amount_in(&self, coin_in: &str, coin_out: &str, amount_out: Balance) -> Result<Balance> {
        self.trade_amount_in(coin_in, coin_out, amount_out)
            .with_context(|| format!("quoting {coin_in} -> {amount_out} {coin_out}"))
    }

    fn get_spot_price(&self, coin_in: &str, coin_out: &str) -> Result<LocalNumber> {
        self.spot_price(coin_in, coin_out)
            .with_context(|| format!("spot price {coin_in}/{coin_out}"))
    }

    fn get_price_impact(
        &self,
        coin_in: &str,
        coin_out: &str,
        amount_in: Balance,
    ) -> Result<Balance> {
        self.price_impact(coin_in, coin_out, amount_in)
            .with_context(|| format!("price impact of {amount_in} {coin_in} -> {coin_out}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CmmmError, PoolToken};

    fn pool() -> PoolSnapshot {
        let token = |coin: &str| PoolToken {
            coin: coin.to_string(),
            balance: Balance::new(1_000_000_000_000),
            weight: 0.5,
            swap_fee_in: 0.003,
            swap_fee_out: 0.0,
            deposit_fee: 0.0,
            withdraw_fee: 0.0,
        };
        PoolSnapshot::new(vec![token("SUI"), token("USDC")], Balance::new(1_000_000_000_000), 0.003)
    }

    #[test]
    fn test_trait_quotes_match_pool() {
        let pool = pool();
        let amount_in = Balance::new(100_000_000_000);

        let via_trait = pool.get_amount_out("SUI", "USDC", amount_in).unwrap();
        let direct = pool.trade_amount_out("SUI", "USDC", amount_in).unwrap();
        assert_eq!(via_trait, direct);

        assert!(pool.get_price_impact("SUI", "USDC", amount_in).unwrap() > Balance::ZERO);
        assert!((pool.get_spot_price("SUI", "USDC").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_errors_carry_context() {
        let pool = pool();
        let err = pool
            .get_amount_in("SUI", "USDC", Balance::new(400_000_000_000))
            .unwrap_err();

        assert!(err.to_string().contains("quoting SUI -> 400000000000 USDC"));
        assert!(matches!(
            err.downcast_ref::<CmmmError>(),
            Some(CmmmError::ExceedsSwapBound { .. })
        ));
    }
}
