//! # CMMM Quoting Engine - Weighted Pool Mathematics
//!
//! ## Purpose
//!
//! Off-chain pricing library for generalized weighted constant-mean market
//! makers (Balancer-style pools of up to 100 coins). Estimates swap outputs
//! and inputs, multi-asset deposit and withdrawal amounts, and LP mint/burn
//! quantities so that clients can display quotes and price impact before a
//! transaction is built.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool snapshots (balances, weights, fees, LP supply) built by the fetch layer
//! - **Output Destinations**: Transaction builders and UI quote displays
//! - **Numeric Model**: On-chain amounts are [`Balance`] integers (9 decimals by default);
//!   every intermediate value is an `f64` [`LocalNumber`]
//! - **Precision**: Approximate by design, not bit-exact with on-chain fixed-point math
//!
//! ## Architecture Role
//!
//! ```text
//! fixed_point ──► invariant ──► swap_math ──────────┐
//!      │             bounds ──► liquidity_math ──┬──┴──► pool / pool_traits
//!      └──────────────────────► withdraw_solver ◄┘
//! ```
//!
//! Every function is a pure mapping from numbers to numbers (or an error);
//! there is no shared state, so any function may be called concurrently.
//!
//! ## Performance Profile
//!
//! - **Swap quotes**: a handful of float operations and one `powf`
//! - **Deposits/withdrawals**: linear in the number of pool coins
//! - **Withdraw solver**: bounded Newton iteration (255 rounds by default)

pub mod bounds;
pub mod error;
pub mod fixed_point;
pub mod invariant;
pub mod liquidity_math;
pub mod pool;
pub mod pool_traits;
pub mod settings;
pub mod swap_math;
pub mod withdraw_solver;

pub use error::{CmmmError, Result};
pub use fixed_point::{read_balance, unread_balance, Balance, LocalNumber, DEFAULT_DIGITS};
pub use invariant::calc_invariant;
pub use liquidity_math::LiquidityMath;
pub use pool::{PoolSnapshot, PoolToken};
pub use pool_traits::AmmPool;
pub use settings::{EngineSettings, SolverSettings};
pub use swap_math::SwapMath;
pub use withdraw_solver::WithdrawSolver;
