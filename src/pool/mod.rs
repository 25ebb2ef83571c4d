//! Collateral pools: yield-bearing NAV sources whose tokens back the
//! vaults' option positions

pub mod collateral_pool;

pub use collateral_pool::{CollateralPool, PoolError};
