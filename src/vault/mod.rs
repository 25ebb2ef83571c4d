//! The round accounting ledger: per-account deposit receipts,
//! unredeemed shares and queued withdrawals, priced once per round

pub mod collateral_vault;
pub mod errors;
pub mod events;

#[cfg(test)]
mod tests;

pub use collateral_vault::{CollateralVault, DepositReceipt, VaultState, Withdrawal};
pub use errors::VaultError;
