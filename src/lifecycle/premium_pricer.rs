//! Options premium pricing
//!
//! A deliberately simple model: intrinsic value plus a volatility term
//! that scales with the square root of time to expiry. Deterministic
//! given (strike, expiry, is_put) and the oracle spot, which is all the
//! auction needs for a reserve price.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::LifecycleError;
use crate::math::{SafeMath, PRICE_SCALE, SECONDS_PER_YEAR};
use crate::oracle::price_oracle::PriceOracleContractRef;
use crate::token::FungibleTokenContractRef;

/// sqrt(x * 1e8) carries four extra decimals of precision
const SQRT_SCALE: u128 = 10_000;

/// Options Premium Pricer contract
#[odra::module]
pub struct OptionsPremiumPricer {
    /// Oracle supplying spot prices
    oracle: Var<Address>,
    /// Underlying asset of the priced options
    underlying: Var<Address>,
    /// Asset the strike is denominated in
    strike_asset: Var<Address>,
    /// Annualized volatility (8 decimals, 90000000 = 90%)
    annualized_vol: Var<U256>,
    /// Contract owner
    owner: Var<Address>,
}

#[odra::module]
impl OptionsPremiumPricer {
    /// Initialize the pricer
    pub fn init(
        &mut self,
        oracle: Address,
        underlying: Address,
        strike_asset: Address,
        annualized_vol: U256,
    ) {
        let caller = self.env().caller();
        self.oracle.set(oracle);
        self.underlying.set(underlying);
        self.strike_asset.set(strike_asset);
        self.annualized_vol.set(annualized_vol);
        self.owner.set(caller);
    }

    /// Premium for one option.
    ///
    /// Denominated in the strike asset for puts and in the underlying
    /// for calls, in the respective token's native decimals.
    pub fn get_premium(&self, strike_price: U256, expiry: u64, is_put: bool) -> U256 {
        let oracle_address = self.oracle.get_or_revert_with(LifecycleError::ZeroPremium);
        let underlying = self
            .underlying
            .get_or_revert_with(LifecycleError::ZeroPremium);
        let oracle = PriceOracleContractRef::new(self.env(), oracle_address);
        let spot = oracle.get_price(underlying);

        let now = self.env().get_block_time();
        let time_left = expiry.saturating_sub(now);

        // sqrt(t / year) in SQRT_SCALE fixed point
        let time_ratio = SafeMath::div(
            SafeMath::mul(U256::from(time_left), U256::from(PRICE_SCALE))
                .unwrap_or_else(|err| self.env().revert(err)),
            U256::from(SECONDS_PER_YEAR),
        )
        .unwrap_or_else(|err| self.env().revert(err));
        let sqrt_time = SafeMath::sqrt(time_ratio);

        let vol = self.annualized_vol.get_or_default();
        // spot * vol * sqrt(t/year), unwound back to 8 decimals
        let time_value = SafeMath::mul(SafeMath::mul(spot, vol).unwrap_or_else(|err| self.env().revert(err)), sqrt_time)
            .unwrap_or_else(|err| self.env().revert(err))
            / U256::from(PRICE_SCALE)
            / U256::from(SQRT_SCALE);

        let intrinsic = if is_put {
            SafeMath::sub_or_zero(strike_price, spot)
        } else {
            SafeMath::sub_or_zero(spot, strike_price)
        };

        // value of one option, 8 decimals, in the strike asset
        let value = time_value + intrinsic;

        if is_put {
            let strike_asset = self
                .strike_asset
                .get_or_revert_with(LifecycleError::ZeroPremium);
            let decimals = FungibleTokenContractRef::new(self.env(), strike_asset).decimals();
            self.rescale(value, decimals)
        } else {
            // calls quote the premium in underlying units
            let decimals = FungibleTokenContractRef::new(self.env(), underlying).decimals();
            let in_underlying = SafeMath::div(
                SafeMath::mul(value, U256::from(PRICE_SCALE))
                    .unwrap_or_else(|err| self.env().revert(err)),
                spot,
            )
            .unwrap_or_else(|err| self.env().revert(err));
            self.rescale(in_underlying, decimals)
        }
    }

    /// Set the annualized volatility (owner only)
    pub fn set_annualized_vol(&mut self, new_vol: U256) {
        self.only_owner();
        self.annualized_vol.set(new_vol);
    }

    /// Current annualized volatility (8 decimals)
    pub fn annualized_vol(&self) -> U256 {
        self.annualized_vol.get_or_default()
    }

    /// Scales an 8-decimal value into a token's native decimals
    fn rescale(&self, value: U256, decimals: u8) -> U256 {
        if decimals >= 8 {
            value * SafeMath::pow10(decimals - 8)
        } else {
            value / SafeMath::pow10(8 - decimals)
        }
    }

    fn only_owner(&self) {
        let caller = self.env().caller();
        let owner = self.owner.get_or_revert_with(LifecycleError::NotOwner);
        if caller != owner {
            self.env().revert(LifecycleError::NotOwner);
        }
    }
}
