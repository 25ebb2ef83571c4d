//! Event definitions for the collateral vault
use odra::prelude::*;
use odra::casper_types::U256;
use odra::prelude::Address;

/// Event emitted when a deposit is credited for the current round
#[odra::event]
pub struct Deposit {
    /// Depositor credited with the amount
    pub account: Address,
    /// Amount credited, in the vault's accounting unit
    pub amount: U256,
    /// Round the deposit is pending for
    pub round: u64,
}

/// Event emitted when unredeemed shares move into an account's balance
#[odra::event]
pub struct Redeem {
    /// Account redeeming
    pub account: Address,
    /// Shares redeemed
    pub shares: U256,
    /// Round of the deposit receipt being redeemed
    pub round: u64,
}

/// Event emitted when a withdrawal is scheduled for the next round
#[odra::event]
pub struct InitiateWithdraw {
    /// Account scheduling the withdrawal
    pub account: Address,
    /// Shares queued
    pub shares: U256,
    /// Round the request was made in
    pub round: u64,
}

/// Event emitted when a scheduled withdrawal is paid out
#[odra::event]
pub struct Withdraw {
    /// Account withdrawing
    pub account: Address,
    /// Amount paid out, in the vault's accounting unit
    pub amount: U256,
    /// Shares burned
    pub shares: U256,
}

/// Event emitted when a same-round deposit is taken back
#[odra::event]
pub struct InstantWithdraw {
    /// Account withdrawing
    pub account: Address,
    /// Amount withdrawn
    pub amount: U256,
    /// Current round
    pub round: u64,
}

/// Event emitted when the deposit cap changes
#[odra::event]
pub struct CapSet {
    /// Previous cap
    pub old_cap: U256,
    /// New cap
    pub new_cap: U256,
}

/// Event emitted when round fees are collected
#[odra::event]
pub struct CollectVaultFees {
    /// Performance portion of the fee
    pub performance_fee: U256,
    /// Total fee charged for the round
    pub vault_fee: U256,
    /// Round the fee was charged for
    pub round: u64,
    /// Recipient of the fee
    pub fee_recipient: Address,
}

/// Event emitted when a round is priced and rolled
#[odra::event]
pub struct RoundRolled {
    /// Round that was priced
    pub round: u64,
    /// Price per share fixed for that round
    pub price_per_share: U256,
    /// Shares minted for the round's pending deposits
    pub mint_shares: U256,
    /// Amount locked into the new position
    pub locked_amount: U256,
}
