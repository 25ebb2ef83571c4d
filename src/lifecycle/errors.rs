//! Error definitions for the option lifecycle
use odra::prelude::*;

/// Custom errors for the theta vault and its strike/pricing collaborators
#[odra::odra_error]
pub enum LifecycleError {
    /// Vault already initialized
    AlreadyInitialized = 200,

    /// Caller is not the owner
    NotOwner = 201,

    /// Caller is not the keeper
    NotKeeper = 202,

    /// No option has been committed for the next round
    NoNextOption = 203,

    /// The committed option is not ready to be rolled yet
    NotReady = 204,

    /// The current option has not expired yet
    OptionNotExpired = 205,

    /// Auction duration below the allowed minimum
    InvalidAuctionDuration = 206,

    /// No collateral vaults configured
    EmptyCollateralSet = 207,

    /// Collateral vault and pool lists differ in length
    CollateralSetMismatch = 208,

    /// Computed premium is zero
    ZeroPremium = 209,

    /// Fee rate out of range
    InvalidFee = 210,

    /// Target delta out of range
    InvalidDelta = 211,

    /// Zero or unattainable strike price
    InvalidStrike = 212,

    /// No option position is currently open
    NoOpenPosition = 213,

    /// Premium discount out of range
    InvalidDiscount = 214,
}
