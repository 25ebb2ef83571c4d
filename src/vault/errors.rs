//! Error definitions for the collateral vault
use odra::prelude::*;

/// Custom errors for the collateral vault
#[odra::odra_error]
pub enum VaultError {
    /// Vault already initialized
    AlreadyInitialized = 100,

    /// Caller is not the owner
    NotOwner = 101,

    /// Caller is not the keeper
    NotKeeper = 102,

    /// Zero amount passed
    InvalidAmount = 103,

    /// Zero share count passed
    InvalidShareCount = 104,

    /// Deposit would leave the vault below the minimum share supply
    InsufficientBalance = 105,

    /// Redeeming more shares than are available
    ExceedsAvailable = 106,

    /// Instant withdrawal beyond the pending deposit
    ExceedAmount = 107,

    /// Deposit would push the vault over its cap
    ExceedCap = 108,

    /// A withdrawal from an earlier round is still open
    ExistingWithdraw = 109,

    /// Withdrawal round has not been closed yet
    RoundNotClosed = 110,

    /// No withdrawal has been initiated
    NotInitiated = 111,

    /// Deposit receipt is not from the current round
    InvalidRound = 112,

    /// Vault is disabled for deposits
    VaultDisabled = 113,

    /// Collateral is still locked in an open position
    LockedAmountNonZero = 114,

    /// Zero cap supplied
    InvalidCap = 115,

    /// Fee rate out of range
    InvalidFee = 116,

    /// No price fixed for the requested round
    PriceNotSet = 117,
}
