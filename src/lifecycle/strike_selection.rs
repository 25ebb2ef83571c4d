//! Delta-targeted strike selection
//!
//! The strike is derived from the oracle spot: snapped onto the asset's
//! step grid and pushed out-of-the-money by a distance controlled by
//! the target delta. Deterministic given (expiry, is_put, delta).

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::LifecycleError;
use crate::math::SafeMath;
use crate::oracle::price_oracle::PriceOracleContractRef;

/// Delta is quoted in tenths of a basis point of 1.0 (4 decimals)
pub const DELTA_SCALE: u64 = 10_000;

/// Delta Strike Selection contract
#[odra::module]
pub struct DeltaStrikeSelection {
    /// Oracle supplying the spot price
    oracle: Var<Address>,
    /// Asset the strike is selected for
    underlying: Var<Address>,
    /// Target delta (4 decimals, 1000 = 0.1)
    delta: Var<U256>,
    /// Strike granularity (8 decimals)
    step: Var<U256>,
    /// Contract owner
    owner: Var<Address>,
}

#[odra::module]
impl DeltaStrikeSelection {
    /// Initialize the strike selector
    pub fn init(&mut self, oracle: Address, underlying: Address, delta: U256, step: U256) {
        if delta.is_zero() || delta > U256::from(DELTA_SCALE) {
            self.env().revert(LifecycleError::InvalidDelta);
        }
        if step.is_zero() {
            self.env().revert(LifecycleError::InvalidStrike);
        }

        let caller = self.env().caller();
        self.oracle.set(oracle);
        self.underlying.set(underlying);
        self.delta.set(delta);
        self.step.set(step);
        self.owner.set(caller);
    }

    /// Strike for an option at the target delta.
    ///
    /// Calls snap the spot up onto the step grid and walk further out
    /// of the money the smaller the delta; puts mirror downwards.
    /// Returns (strike_price, delta), both in their fixed-point scales.
    pub fn get_strike_price(&self, _expiry: u64, is_put: bool) -> (U256, U256) {
        let oracle_address = self.oracle.get_or_revert_with(LifecycleError::InvalidStrike);
        let underlying = self
            .underlying
            .get_or_revert_with(LifecycleError::InvalidStrike);
        let spot = PriceOracleContractRef::new(self.env(), oracle_address).get_price(underlying);

        let step = self.step.get_or_default();
        let delta = self.delta.get_or_default();

        // 0.5 delta sits one step out, 0.1 delta nine steps out
        let steps_otm = (U256::from(DELTA_SCALE) - delta) / delta;
        let distance = SafeMath::mul(step, steps_otm)
            .unwrap_or_else(|err| self.env().revert(err));

        let strike = if is_put {
            let floor = (spot / step) * step;
            let strike = SafeMath::sub_or_zero(floor, distance);
            // never select a zero strike
            if strike.is_zero() { step } else { strike }
        } else {
            let ceiling = ((spot + step - U256::one()) / step) * step;
            SafeMath::add(ceiling, distance).unwrap_or_else(|err| self.env().revert(err))
        };

        (strike, delta)
    }

    /// Set the target delta (owner only)
    pub fn set_delta(&mut self, new_delta: U256) {
        self.only_owner();
        if new_delta.is_zero() || new_delta > U256::from(DELTA_SCALE) {
            self.env().revert(LifecycleError::InvalidDelta);
        }
        self.delta.set(new_delta);
    }

    /// Current target delta
    pub fn delta(&self) -> U256 {
        self.delta.get_or_default()
    }

    /// Strike granularity for the asset
    pub fn step(&self) -> U256 {
        self.step.get_or_default()
    }

    fn only_owner(&self) {
        let caller = self.env().caller();
        let owner = self.owner.get_or_revert_with(LifecycleError::NotOwner);
        if caller != owner {
            self.env().revert(LifecycleError::NotOwner);
        }
    }
}
