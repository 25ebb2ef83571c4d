//! Event definitions for the option lifecycle
use odra::prelude::*;
use odra::casper_types::U256;
use odra::prelude::Address;

/// Event emitted when collateral is locked into a new short position
#[odra::event]
pub struct OpenShort {
    /// Option the position was opened in
    pub option_id: u64,
    /// Collateral shipped per sub-vault, in pool tokens
    pub collateral_amounts: Vec<U256>,
    /// Minimum premium the auction will accept, in the bidding token
    pub premium: U256,
    /// Keeper that rolled the round
    pub keeper: Address,
}

/// Event emitted when an expired position is settled and closed
#[odra::event]
pub struct CloseShort {
    /// Option the position was closed for
    pub option_id: u64,
    /// Collateral returned per sub-vault, in pool tokens
    pub collateral_returned: Vec<U256>,
    /// Caller that closed the position
    pub caller: Address,
}

/// Event emitted when the next option is committed
#[odra::event]
pub struct NextOptionSet {
    /// Deterministic id of the committed option
    pub option_id: u64,
    /// Strike price (8 decimals)
    pub strike_price: U256,
    /// Expiry timestamp
    pub expiry: u64,
    /// Earliest time the round may be rolled
    pub ready_at: u64,
}

/// Event emitted when the owner overrides the strike price
#[odra::event]
pub struct StrikePriceSet {
    /// Round the override was recorded in
    pub round: u64,
    /// Overridden strike price
    pub strike_price: U256,
}

/// Event emitted when auction proceeds are converted into pool tokens
/// for the primary collateral vault
#[odra::event]
pub struct PremiumSwap {
    /// Proceeds in the auction bidding token
    pub premium: U256,
    /// Pool tokens credited to the primary collateral vault
    pub pool_tokens: U256,
    /// Current round
    pub round: u64,
}

/// Event emitted when a collateral set replacement is staged
#[odra::event]
pub struct CollateralUpdateQueued {
    /// Number of sub-vaults in the staged set
    pub num_vaults: u32,
}

/// Event emitted when a staged collateral set replaces the active one
#[odra::event]
pub struct CollateralUpdateApplied {
    /// Number of sub-vaults in the new set
    pub num_vaults: u32,
}

/// Event emitted when unsold options are burned to reclaim collateral
#[odra::event]
pub struct UnsoldOptionsBurned {
    /// Option the burn applies to
    pub option_id: u64,
    /// Collateral reclaimed per sub-vault, in pool tokens
    pub collateral_returned: Vec<U256>,
}
