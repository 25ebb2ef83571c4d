//! Theta Vault - the weekly option issuance state machine
//!
//! Coordinates the collateral vaults through the commit -> roll ->
//! close cycle: commits next week's option (strike, expiry, premium),
//! rolls every sub-vault's round and locks the collateral into one
//! auctioned position, and settles the expired position back into the
//! sub-vaults. One issuance fans out over N independently accounted
//! collateral pools, positionally.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::LifecycleError;
use super::events::*;
use super::option_registry::{target_option_id, OptionId, OptionSeries};
use super::premium_pricer::OptionsPremiumPricerContractRef;
use super::strike_selection::DeltaStrikeSelectionContractRef;
use crate::auction::settlement_house::SettlementHouseContractRef;
use crate::math::{AssetConvert, Calendar, FeeMath, FEE_DIVISOR};
use crate::oracle::price_oracle::PriceOracleContractRef;
use crate::pool::collateral_pool::CollateralPoolContractRef;
use crate::token::FungibleTokenContractRef;
use crate::vault::collateral_vault::CollateralVaultContractRef;

/// Seconds between committing an option and being allowed to roll into it
pub const OPTION_DELAY: u64 = 900;

/// Shortest auction the owner may configure, in seconds
pub const MIN_AUCTION_DURATION: u64 = 3600;

/// Premium discount is quoted in thousandths (997 = 0.3% discount)
pub const PREMIUM_DISCOUNT_SCALE: u64 = 1000;

/// Snapshot of the option state machine
#[odra::odra_type]
pub struct OptionState {
    /// Option currently backing an open position (zero when idle)
    pub current_option: u64,
    /// Option committed for the next roll (zero when none)
    pub next_option: u64,
    /// Earliest time the next option may be rolled into
    pub next_option_ready_at: u64,
}

/// Static configuration of the theta vault
#[odra::odra_type]
pub struct ThetaVaultParams {
    /// Whether the vault sells puts
    pub is_put: bool,
    /// Share decimals of the sub-vaults
    pub decimals: u8,
    /// Collateral pools, in sub-vault order
    pub collateral_assets: Vec<Address>,
    /// Underlying asset of the sold options
    pub underlying: Address,
}

/// Theta Vault contract
#[odra::module]
pub struct ThetaVault {
    /// Guard against repeated initialization
    initialized: Var<bool>,
    /// Contract owner
    owner: Var<Address>,
    /// Keeper allowed to advance rounds
    keeper: Var<Address>,
    /// Recipient of round fees
    fee_recipient: Var<Address>,
    /// Weekly management fee rate (6 decimals)
    management_fee: Var<U256>,
    /// Performance fee rate (6 decimals)
    performance_fee: Var<U256>,

    /// Discount applied to the priced premium, in thousandths
    premium_discount: Var<U256>,
    /// Auction duration in seconds
    auction_duration: Var<u64>,
    /// Token the auction is denominated in
    auction_bidding_token: Var<Address>,

    /// Whether the vault sells puts
    is_put: Var<bool>,
    /// Share decimals of the sub-vaults
    decimals: Var<u8>,
    /// Underlying asset of the sold options
    underlying: Var<Address>,
    /// Asset the strike is denominated in
    strike_asset: Var<Address>,

    /// Price oracle
    oracle: Var<Address>,
    /// Strike selection collaborator
    strike_selection: Var<Address>,
    /// Premium pricing collaborator
    options_premium_pricer: Var<Address>,
    /// Settlement venue
    settlement_house: Var<Address>,

    /// Collateral vaults in registration order (index 0 is primary)
    collateral_vaults: Mapping<u32, Address>,
    /// Collateral pools, positionally matching the vaults
    collateral_pools: Mapping<u32, Address>,
    /// Number of registered sub-vaults
    collateral_count: Var<u32>,

    /// Staged collateral vault replacement
    queued_vaults: Mapping<u32, Address>,
    /// Staged collateral pool replacement
    queued_pools: Mapping<u32, Address>,
    /// Size of the staged set
    queued_count: Var<u32>,
    /// Whether a staged set is waiting for the next commit
    has_queued_update: Var<bool>,

    /// Current round
    round: Var<u64>,
    /// Option currently backing an open position (zero when idle)
    current_option: Var<u64>,
    /// Option committed for the next roll (zero when none)
    next_option: Var<u64>,
    /// Earliest time the next option may be rolled into
    next_option_ready_at: Var<u64>,
    /// Auction selling the current option (zero when none)
    option_auction_id: Var<u64>,
    /// Reserve premium of the committed option, in the bidding token
    current_option_premium: Var<U256>,

    /// Owner-overridden strike, honored for one commit
    overridden_strike_price: Var<U256>,
    /// Round the strike override was recorded in
    last_strike_override_round: Var<u64>,

    /// Registry of pre-computed option series
    options: Mapping<u64, OptionSeries>,
}

#[odra::module]
impl ThetaVault {
    /// Initialize the vault. Callable exactly once.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        owner: Address,
        keeper: Address,
        fee_recipient: Address,
        management_fee: U256,
        performance_fee: U256,
        options_premium_pricer: Address,
        strike_selection: Address,
        premium_discount: U256,
        auction_duration: u64,
        auction_bidding_token: Address,
        is_put: bool,
        decimals: u8,
        underlying: Address,
        strike_asset: Address,
        collateral_vaults: Vec<Address>,
        collateral_pools: Vec<Address>,
        oracle: Address,
        settlement_house: Address,
    ) {
        if self.initialized.get_or_default() {
            self.env().revert(LifecycleError::AlreadyInitialized);
        }
        if collateral_vaults.is_empty() {
            self.env().revert(LifecycleError::EmptyCollateralSet);
        }
        if collateral_vaults.len() != collateral_pools.len() {
            self.env().revert(LifecycleError::CollateralSetMismatch);
        }
        if auction_duration < MIN_AUCTION_DURATION {
            self.env().revert(LifecycleError::InvalidAuctionDuration);
        }
        if premium_discount.is_zero() || premium_discount > U256::from(PREMIUM_DISCOUNT_SCALE) {
            self.env().revert(LifecycleError::InvalidDiscount);
        }
        if management_fee >= U256::from(FEE_DIVISOR) || performance_fee >= U256::from(FEE_DIVISOR) {
            self.env().revert(LifecycleError::InvalidFee);
        }

        self.initialized.set(true);
        self.owner.set(owner);
        self.keeper.set(keeper);
        self.fee_recipient.set(fee_recipient);
        self.management_fee.set(
            FeeMath::weekly_management_rate(management_fee)
                .unwrap_or_else(|err| self.env().revert(err)),
        );
        self.performance_fee.set(performance_fee);

        self.premium_discount.set(premium_discount);
        self.auction_duration.set(auction_duration);
        self.auction_bidding_token.set(auction_bidding_token);

        self.is_put.set(is_put);
        self.decimals.set(decimals);
        self.underlying.set(underlying);
        self.strike_asset.set(strike_asset);

        self.oracle.set(oracle);
        self.strike_selection.set(strike_selection);
        self.options_premium_pricer.set(options_premium_pricer);
        self.settlement_house.set(settlement_house);

        let count = collateral_vaults.len() as u32;
        for (i, vault) in collateral_vaults.iter().enumerate() {
            self.collateral_vaults.set(&(i as u32), *vault);
            self.collateral_pools.set(&(i as u32), collateral_pools[i]);
        }
        self.collateral_count.set(count);

        self.round.set(1);
        self.current_option.set(0);
        self.next_option.set(0);
        self.next_option_ready_at.set(0);
        self.option_auction_id.set(0);
        self.current_option_premium.set(U256::zero());
        self.overridden_strike_price.set(U256::zero());
        self.last_strike_override_round.set(0);
        self.has_queued_update.set(false);
    }

    // ========================================
    // Round transitions
    // ========================================

    /// Close the expired position (if any), snapshot every sub-vault's
    /// round and commit next week's option.
    ///
    /// Idempotent while idle: committing twice simply recomputes the
    /// next option.
    pub fn commit_and_close(&mut self) {
        let caller = self.env().caller();
        let now = self.env().get_block_time();

        // Settle the open position first. A live option blocks the
        // commit entirely; settlement failures propagate.
        let current = self.current_option.get_or_default();
        if current != 0 {
            let series = self.get_series(current);
            if now <= series.expiry {
                self.env().revert(LifecycleError::OptionNotExpired);
            }
            let house_address = self
                .settlement_house
                .get_or_revert_with(LifecycleError::NoOpenPosition);
            let mut house = SettlementHouseContractRef::new(self.env(), house_address);
            let returned = house.settle_expired_position(current);

            self.env().emit_event(CloseShort {
                option_id: current,
                collateral_returned: returned,
                caller,
            });

            self.current_option.set(0);
            self.option_auction_id.set(0);
        }

        self.swap_premium_to_primary();

        // Snapshot and free each sub-vault so the next roll prices
        // against the freed balance.
        let count = self.collateral_count.get_or_default();
        for i in 0..count {
            let vault_address = self.vault_at(i);
            let mut vault = CollateralVaultContractRef::new(self.env(), vault_address);
            vault.close_round();
        }

        if self.has_queued_update.get_or_default() {
            self.apply_queued_collateral_update();
        }

        self.commit_next_option(now);
    }

    /// Roll every sub-vault into the committed option and start its
    /// auction. Keeper only.
    pub fn roll_to_next_option(&mut self) {
        self.only_keeper();

        let next = self.next_option.get_or_default();
        if next == 0 {
            self.env().revert(LifecycleError::NoNextOption);
        }
        let now = self.env().get_block_time();
        if now < self.next_option_ready_at.get_or_default() {
            self.env().revert(LifecycleError::NotReady);
        }

        let series = self.get_series(next);
        let house_address = self
            .settlement_house
            .get_or_revert_with(LifecycleError::NoNextOption);

        let count = self.collateral_count.get_or_default();
        let mut vaults = Vec::new();
        let mut pools = Vec::new();
        let mut amounts = Vec::new();
        for i in 0..count {
            let vault_address = self.vault_at(i);
            let mut vault = CollateralVaultContractRef::new(self.env(), vault_address);
            let locked_tokens = vault.roll_round(house_address);
            vaults.push(vault_address);
            pools.push(self.pool_at(i));
            amounts.push(locked_tokens);
        }

        let premium = self.current_option_premium.get_or_default();
        let mut house = SettlementHouseContractRef::new(self.env(), house_address);
        let (option_id, auction_id) = house.mint_and_auction(
            series,
            vaults,
            pools,
            amounts.clone(),
            premium,
            self.auction_bidding_token
                .get_or_revert_with(LifecycleError::NoNextOption),
            self.auction_duration.get_or_default(),
        );

        self.current_option.set(option_id);
        self.next_option.set(0);
        self.option_auction_id.set(auction_id);
        self.round.set(self.round.get_or_default() + 1);

        let caller = self.env().caller();
        self.env().emit_event(OpenShort {
            option_id,
            collateral_amounts: amounts,
            premium,
            keeper: caller,
        });
    }

    /// Burn the auction's unsold options and reclaim their collateral
    /// ahead of expiry. Keeper only.
    pub fn burn_remaining_options(&mut self) {
        self.only_keeper();

        let current = self.current_option.get_or_default();
        if current == 0 {
            self.env().revert(LifecycleError::NoOpenPosition);
        }
        let house_address = self
            .settlement_house
            .get_or_revert_with(LifecycleError::NoOpenPosition);
        let mut house = SettlementHouseContractRef::new(self.env(), house_address);
        let returned = house.burn_unsold(current);

        // the reclaimed collateral is no longer locked
        let count = self.collateral_count.get_or_default();
        for i in 0..count {
            let amount = returned.get(i as usize).copied().unwrap_or_default();
            if amount.is_zero() {
                continue;
            }
            let pool = CollateralPoolContractRef::new(self.env(), self.pool_at(i));
            let value = AssetConvert::pool_tokens_to_value(amount, pool.price_per_share())
                .unwrap_or_else(|err| self.env().revert(err));
            let mut vault = CollateralVaultContractRef::new(self.env(), self.vault_at(i));
            vault.release_locked(value);
        }

        self.env().emit_event(UnsoldOptionsBurned {
            option_id: current,
            collateral_returned: returned,
        });
    }

    // ========================================
    // Owner operations
    // ========================================

    /// Override the strike for exactly one subsequent commit (owner only)
    pub fn set_strike_price(&mut self, strike_price: U256) {
        self.only_owner();
        if strike_price.is_zero() {
            self.env().revert(LifecycleError::InvalidStrike);
        }
        let round = self.round.get_or_default();
        self.overridden_strike_price.set(strike_price);
        self.last_strike_override_round.set(round);
        self.env().emit_event(StrikePriceSet {
            round,
            strike_price,
        });
    }

    /// Stage a collateral set replacement, applied at the next commit
    /// (owner only)
    pub fn queue_collateral_update(
        &mut self,
        new_collateral_vaults: Vec<Address>,
        new_collateral_pools: Vec<Address>,
    ) {
        self.only_owner();
        if new_collateral_vaults.is_empty() {
            self.env().revert(LifecycleError::EmptyCollateralSet);
        }
        if new_collateral_vaults.len() != new_collateral_pools.len() {
            self.env().revert(LifecycleError::CollateralSetMismatch);
        }

        let count = new_collateral_vaults.len() as u32;
        for (i, vault) in new_collateral_vaults.iter().enumerate() {
            self.queued_vaults.set(&(i as u32), *vault);
            self.queued_pools.set(&(i as u32), new_collateral_pools[i]);
        }
        self.queued_count.set(count);
        self.has_queued_update.set(true);

        self.env().emit_event(CollateralUpdateQueued { num_vaults: count });
    }

    /// Set a new keeper (owner only)
    pub fn set_new_keeper(&mut self, new_keeper: Address) {
        self.only_owner();
        self.keeper.set(new_keeper);
    }

    /// Set a new fee recipient (owner only)
    pub fn set_fee_recipient(&mut self, new_fee_recipient: Address) {
        self.only_owner();
        self.fee_recipient.set(new_fee_recipient);
    }

    /// Set the annual management fee rate, 6 decimals (owner only)
    pub fn set_management_fee(&mut self, new_management_fee: U256) {
        self.only_owner();
        if new_management_fee >= U256::from(FEE_DIVISOR) {
            self.env().revert(LifecycleError::InvalidFee);
        }
        self.management_fee.set(
            FeeMath::weekly_management_rate(new_management_fee)
                .unwrap_or_else(|err| self.env().revert(err)),
        );
    }

    /// Set the performance fee rate, 6 decimals (owner only)
    pub fn set_performance_fee(&mut self, new_performance_fee: U256) {
        self.only_owner();
        if new_performance_fee >= U256::from(FEE_DIVISOR) {
            self.env().revert(LifecycleError::InvalidFee);
        }
        self.performance_fee.set(new_performance_fee);
    }

    /// Set the auction duration (owner only)
    pub fn set_auction_duration(&mut self, new_duration: u64) {
        self.only_owner();
        if new_duration < MIN_AUCTION_DURATION {
            self.env().revert(LifecycleError::InvalidAuctionDuration);
        }
        self.auction_duration.set(new_duration);
    }

    /// Replace the strike selection collaborator (owner only)
    pub fn set_strike_selection(&mut self, new_strike_selection: Address) {
        self.only_owner();
        self.strike_selection.set(new_strike_selection);
    }

    /// Replace the premium pricing collaborator (owner only)
    pub fn set_options_premium_pricer(&mut self, new_pricer: Address) {
        self.only_owner();
        self.options_premium_pricer.set(new_pricer);
    }

    // ========================================
    // Accessors
    // ========================================

    /// Option state snapshot
    pub fn option_state(&self) -> OptionState {
        OptionState {
            current_option: self.current_option.get_or_default(),
            next_option: self.next_option.get_or_default(),
            next_option_ready_at: self.next_option_ready_at.get_or_default(),
        }
    }

    /// Static configuration
    pub fn vault_params(&self) -> ThetaVaultParams {
        ThetaVaultParams {
            is_put: self.is_put.get_or_default(),
            decimals: self.decimals.get_or_default(),
            collateral_assets: self.get_collateral_pools(),
            underlying: self.underlying.get_or_revert_with(LifecycleError::NoNextOption),
        }
    }

    /// Option currently backing an open position (zero when idle)
    pub fn current_option(&self) -> u64 {
        self.current_option.get_or_default()
    }

    /// Option committed for the next roll (zero when none)
    pub fn next_option(&self) -> u64 {
        self.next_option.get_or_default()
    }

    /// Earliest time the next option may be rolled into
    pub fn next_option_ready_at(&self) -> u64 {
        self.next_option_ready_at.get_or_default()
    }

    /// Auction selling the current option (zero when none)
    pub fn option_auction_id(&self) -> u64 {
        self.option_auction_id.get_or_default()
    }

    /// Reserve premium of the committed option, in the bidding token
    pub fn current_option_premium(&self) -> U256 {
        self.current_option_premium.get_or_default()
    }

    /// Registered series for an option id
    pub fn option_series(&self, option_id: OptionId) -> OptionSeries {
        self.get_series(option_id)
    }

    /// Current round
    pub fn round(&self) -> u64 {
        self.round.get_or_default()
    }

    /// Round the strike override was recorded in (zero when never set)
    pub fn last_strike_override_round(&self) -> u64 {
        self.last_strike_override_round.get_or_default()
    }

    /// Owner-overridden strike price
    pub fn overridden_strike_price(&self) -> U256 {
        self.overridden_strike_price.get_or_default()
    }

    /// Registered collateral vaults, in order
    pub fn get_collateral_vaults(&self) -> Vec<Address> {
        let count = self.collateral_count.get_or_default();
        let mut vaults = Vec::new();
        for i in 0..count {
            vaults.push(self.vault_at(i));
        }
        vaults
    }

    /// Registered collateral pools, in order
    pub fn get_collateral_pools(&self) -> Vec<Address> {
        let count = self.collateral_count.get_or_default();
        let mut pools = Vec::new();
        for i in 0..count {
            pools.push(self.pool_at(i));
        }
        pools
    }

    /// Weekly management fee rate (6 decimals)
    pub fn management_fee(&self) -> U256 {
        self.management_fee.get_or_default()
    }

    /// Performance fee rate (6 decimals)
    pub fn performance_fee(&self) -> U256 {
        self.performance_fee.get_or_default()
    }

    /// Premium discount in thousandths
    pub fn premium_discount(&self) -> U256 {
        self.premium_discount.get_or_default()
    }

    /// Auction duration in seconds
    pub fn auction_duration(&self) -> u64 {
        self.auction_duration.get_or_default()
    }

    /// Strike selection collaborator
    pub fn strike_selection(&self) -> Address {
        self.strike_selection
            .get_or_revert_with(LifecycleError::NoNextOption)
    }

    /// Premium pricing collaborator
    pub fn options_premium_pricer(&self) -> Address {
        self.options_premium_pricer
            .get_or_revert_with(LifecycleError::NoNextOption)
    }

    /// Contract owner
    pub fn owner(&self) -> Address {
        self.owner.get_or_revert_with(LifecycleError::NotOwner)
    }

    /// Keeper allowed to advance rounds
    pub fn keeper(&self) -> Address {
        self.keeper.get_or_revert_with(LifecycleError::NotKeeper)
    }

    /// Recipient of round fees
    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient.get_or_revert_with(LifecycleError::NotOwner)
    }

    // ========================================
    // Internals
    // ========================================

    /// Deposits any auction proceeds sitting in the bidding token into
    /// the primary collateral pool and credits the primary sub-vault
    fn swap_premium_to_primary(&mut self) {
        let bidding_address = self
            .auction_bidding_token
            .get_or_revert_with(LifecycleError::NoNextOption);
        let mut bidding = FungibleTokenContractRef::new(self.env(), bidding_address);
        let self_address = Address::from(self.env().self_address());
        let balance = bidding.balance_of(self_address);
        if balance.is_zero() {
            return;
        }

        let pool_address = self.pool_at(0);
        let primary_vault = self.vault_at(0);

        bidding.approve(pool_address, balance);
        let mut pool = CollateralPoolContractRef::new(self.env(), pool_address);
        let minted = pool.deposit(bidding_address, balance);
        pool.transfer(primary_vault, minted);

        self.env().emit_event(PremiumSwap {
            premium: balance,
            pool_tokens: minted,
            round: self.round.get_or_default(),
        });
    }

    /// Selects strike and expiry, registers this week's and next week's
    /// series and commits the next option
    fn commit_next_option(&mut self, now: u64) {
        let is_put = self.is_put.get_or_default();
        let round = self.round.get_or_default();
        let expiry = Calendar::next_friday_expiry(now);

        let selection_address = self
            .strike_selection
            .get_or_revert_with(LifecycleError::InvalidStrike);
        let selection = DeltaStrikeSelectionContractRef::new(self.env(), selection_address);

        let strike = if self.last_strike_override_round.get_or_default() == round {
            self.overridden_strike_price.get_or_default()
        } else {
            let (strike, _delta) = selection.get_strike_price(expiry, is_put);
            strike
        };
        if strike.is_zero() {
            self.env().revert(LifecycleError::InvalidStrike);
        }

        let underlying = self
            .underlying
            .get_or_revert_with(LifecycleError::InvalidStrike);
        let strike_asset = self
            .strike_asset
            .get_or_revert_with(LifecycleError::InvalidStrike);
        let collaterals = self.get_collateral_pools();
        let mut constraints = Vec::new();
        constraints.resize(collaterals.len(), U256::zero());

        let series = OptionSeries {
            underlying,
            strike_asset,
            collaterals: collaterals.clone(),
            constraints: constraints.clone(),
            strike_price: strike,
            expiry,
            is_put,
        };
        let option_id = target_option_id(&series);
        self.options.set(&option_id, series);

        // Pre-register the following week one step further out, purely
        // for bookkeeping; a later strike override supersedes it.
        let second_series = OptionSeries {
            underlying,
            strike_asset,
            collaterals,
            constraints,
            strike_price: strike + selection.step(),
            expiry: Calendar::following_friday_expiry(expiry),
            is_put,
        };
        let second_id = target_option_id(&second_series);
        self.options.set(&second_id, second_series);

        let ready_at = now + OPTION_DELAY;
        self.next_option.set(option_id);
        self.next_option_ready_at.set(ready_at);

        let premium = self.compute_premium(strike, expiry, is_put);
        self.current_option_premium.set(premium);

        self.env().emit_event(NextOptionSet {
            option_id,
            strike_price: strike,
            expiry,
            ready_at,
        });
    }

    /// Discounted premium for one option, converted into the auction
    /// bidding token when that differs from the pricing asset
    fn compute_premium(&self, strike: U256, expiry: u64, is_put: bool) -> U256 {
        let pricer_address = self
            .options_premium_pricer
            .get_or_revert_with(LifecycleError::ZeroPremium);
        let pricer = OptionsPremiumPricerContractRef::new(self.env(), pricer_address);

        let discount = self.premium_discount.get_or_default();
        let raw = pricer.get_premium(strike, expiry, is_put);
        let discounted = raw * discount / U256::from(PREMIUM_DISCOUNT_SCALE);

        let calc_token = if is_put {
            self.strike_asset
                .get_or_revert_with(LifecycleError::ZeroPremium)
        } else {
            self.underlying
                .get_or_revert_with(LifecycleError::ZeroPremium)
        };
        let bidding = self
            .auction_bidding_token
            .get_or_revert_with(LifecycleError::ZeroPremium);

        let premium = if bidding != calc_token {
            self.convert_price_amount(calc_token, bidding, discounted)
        } else {
            discounted
        };
        if premium.is_zero() {
            self.env().revert(LifecycleError::ZeroPremium);
        }
        premium
    }

    /// Oracle-mediated conversion between two assets' native amounts
    fn convert_price_amount(&self, token_in: Address, token_out: Address, amount: U256) -> U256 {
        let oracle_address = self.oracle.get_or_revert_with(LifecycleError::ZeroPremium);
        let oracle = PriceOracleContractRef::new(self.env(), oracle_address);
        let in_price = oracle.get_price(token_in);
        let out_price = oracle.get_price(token_out);

        let in_decimals = FungibleTokenContractRef::new(self.env(), token_in).decimals();
        let out_decimals = FungibleTokenContractRef::new(self.env(), token_out).decimals();

        AssetConvert::convert_with_prices(amount, in_price, out_price, in_decimals, out_decimals)
            .unwrap_or_else(|err| self.env().revert(err))
    }

    /// Replaces the active collateral set with the staged one
    fn apply_queued_collateral_update(&mut self) {
        let count = self.queued_count.get_or_default();
        for i in 0..count {
            let vault = self
                .queued_vaults
                .get(&i)
                .unwrap_or_revert_with(&self.env(), LifecycleError::CollateralSetMismatch);
            let pool = self
                .queued_pools
                .get(&i)
                .unwrap_or_revert_with(&self.env(), LifecycleError::CollateralSetMismatch);
            self.collateral_vaults.set(&i, vault);
            self.collateral_pools.set(&i, pool);
        }
        self.collateral_count.set(count);
        self.has_queued_update.set(false);

        self.env().emit_event(CollateralUpdateApplied { num_vaults: count });
    }

    fn get_series(&self, option_id: u64) -> OptionSeries {
        self.options
            .get(&option_id)
            .unwrap_or_revert_with(&self.env(), LifecycleError::NoNextOption)
    }

    fn vault_at(&self, index: u32) -> Address {
        self.collateral_vaults
            .get(&index)
            .unwrap_or_revert_with(&self.env(), LifecycleError::EmptyCollateralSet)
    }

    fn pool_at(&self, index: u32) -> Address {
        self.collateral_pools
            .get(&index)
            .unwrap_or_revert_with(&self.env(), LifecycleError::EmptyCollateralSet)
    }

    fn only_owner(&self) {
        let caller = self.env().caller();
        let owner = self.owner.get_or_revert_with(LifecycleError::NotOwner);
        if caller != owner {
            self.env().revert(LifecycleError::NotOwner);
        }
    }

    fn only_keeper(&self) {
        let caller = self.env().caller();
        let keeper = self.keeper.get_or_revert_with(LifecycleError::NotKeeper);
        if caller != keeper {
            self.env().revert(LifecycleError::NotKeeper);
        }
    }
}
