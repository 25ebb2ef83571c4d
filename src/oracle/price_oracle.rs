//! Price Oracle - spot and settlement prices for every asset the
//! protocol touches
//!
//! Spot prices drive strike selection and premium conversion; expiry
//! prices, frozen per (asset, timestamp), drive option settlement.

use odra::prelude::*;
use odra::casper_types::U256;

/// Custom errors for the price oracle
#[odra::odra_error]
pub enum OracleError {
    /// Caller is not allowed to push prices
    Unauthorized = 400,

    /// Zero price submitted
    PriceZero = 401,

    /// No price available for the asset
    PriceNotSet = 402,

    /// No settlement price recorded for the (asset, expiry) pair
    ExpiryPriceNotSet = 403,

    /// Settlement price already recorded and locked
    ExpiryPriceLocked = 404,
}

/// Price Oracle contract
#[odra::module]
pub struct PriceOracle {
    /// Spot price per asset (8 decimals)
    prices: Mapping<Address, U256>,

    /// Assets pinned to a fixed price (stablecoins)
    stable: Mapping<Address, bool>,

    /// Pricer allowed to push prices for each asset
    pricers: Mapping<Address, Address>,

    /// Settlement price per (asset, expiry timestamp), immutable once set
    expiry_prices: Mapping<(Address, u64), U256>,

    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl PriceOracle {
    /// Initialize the price oracle
    pub fn init(&mut self) {
        let caller = self.env().caller();
        self.admin.set(caller);
    }

    /// Set the spot price for an asset (admin or the asset's pricer)
    pub fn set_price(&mut self, asset: Address, price: U256) {
        self.only_admin_or_pricer(asset);

        if price.is_zero() {
            self.env().revert(OracleError::PriceZero);
        }
        if self.stable.get(&asset).unwrap_or(false) {
            self.env().revert(OracleError::Unauthorized);
        }

        self.prices.set(&asset, price);
    }

    /// Pin an asset to a fixed price (admin only)
    pub fn set_stable_price(&mut self, asset: Address, price: U256) {
        self.only_admin();

        if price.is_zero() {
            self.env().revert(OracleError::PriceZero);
        }

        self.prices.set(&asset, price);
        self.stable.set(&asset, true);
    }

    /// Get the spot price for an asset (8 decimals)
    pub fn get_price(&self, asset: Address) -> U256 {
        self.prices
            .get(&asset)
            .unwrap_or_revert_with(&self.env(), OracleError::PriceNotSet)
    }

    /// Record the settlement price for an (asset, expiry) pair.
    ///
    /// Only the asset's pricer or the admin may push it, and the first
    /// write wins; settlement prices never move once recorded.
    pub fn set_expiry_price(&mut self, asset: Address, timestamp: u64, price: U256) {
        self.only_admin_or_pricer(asset);

        if price.is_zero() {
            self.env().revert(OracleError::PriceZero);
        }
        if self.expiry_prices.get(&(asset, timestamp)).is_some() {
            self.env().revert(OracleError::ExpiryPriceLocked);
        }

        self.expiry_prices.set(&(asset, timestamp), price);
    }

    /// Get the settlement price for an (asset, expiry) pair
    pub fn get_expiry_price(&self, asset: Address, timestamp: u64) -> U256 {
        self.expiry_prices
            .get(&(asset, timestamp))
            .unwrap_or_revert_with(&self.env(), OracleError::ExpiryPriceNotSet)
    }

    /// Whether a settlement price has been recorded
    pub fn has_expiry_price(&self, asset: Address, timestamp: u64) -> bool {
        self.expiry_prices.get(&(asset, timestamp)).is_some()
    }

    /// Appoint the pricer for an asset (admin only)
    pub fn set_asset_pricer(&mut self, asset: Address, pricer: Address) {
        self.only_admin();
        self.pricers.set(&asset, pricer);
    }

    /// Get the pricer for an asset
    pub fn get_pricer(&self, asset: Address) -> Address {
        self.pricers
            .get(&asset)
            .unwrap_or_revert_with(&self.env(), OracleError::PriceNotSet)
    }

    /// Get admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(OracleError::Unauthorized)
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(OracleError::Unauthorized);
        if caller != admin {
            self.env().revert(OracleError::Unauthorized);
        }
    }

    fn only_admin_or_pricer(&self, asset: Address) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(OracleError::Unauthorized);
        if caller == admin {
            return;
        }
        match self.pricers.get(&asset) {
            Some(pricer) if pricer == caller => (),
            _ => self.env().revert(OracleError::Unauthorized),
        }
    }
}
