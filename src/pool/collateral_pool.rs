//! Collateral Pool - the NAV source backing a collateral vault
//!
//! The pool wraps a primary asset (plus optional side assets valued
//! through the oracle) into a fungible pool token. `price_per_share`
//! reports the NAV in 1e18 fixed point; the admin moves it to model
//! harvested yield or losses.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use crate::errors::TokenError;
use crate::events::{Transfer, Approval};
use crate::math::{AssetConvert, NAV_SCALE, SafeMath};
use crate::oracle::price_oracle::PriceOracleContractRef;
use crate::token::FungibleTokenContractRef;

/// Custom errors for the collateral pool
#[odra::odra_error]
pub enum PoolError {
    /// Caller is not the admin
    Unauthorized = 420,

    /// Deposited token is not supported by the pool
    UnsupportedToken = 421,

    /// Zero amount or zero price supplied
    InvalidAmount = 422,

    /// Pool does not hold enough of the primary asset
    InsufficientLiquidity = 423,

    /// No supported tokens configured
    EmptySupportedSet = 424,
}

/// Event emitted when assets enter the pool
#[odra::event]
pub struct PoolDeposit {
    /// Depositor
    pub account: Address,
    /// Token deposited
    pub token: Address,
    /// Raw token amount deposited
    pub amount: U256,
    /// Pool tokens minted
    pub minted: U256,
}

/// Event emitted when pool tokens are unwrapped
#[odra::event]
pub struct PoolWithdraw {
    /// Withdrawer
    pub account: Address,
    /// Pool tokens burned
    pub burned: U256,
    /// Primary asset paid out
    pub amount: U256,
}

/// Event emitted when the admin reprices the pool
#[odra::event]
pub struct NavUpdated {
    /// Previous price per share
    pub old_price: U256,
    /// New price per share
    pub new_price: U256,
}

/// Collateral Pool contract
#[odra::module]
pub struct CollateralPool {
    /// Pool token name
    name: Var<String>,
    /// Pool token symbol
    symbol: Var<String>,
    /// Pool token decimals
    decimals: Var<u8>,
    /// Total supply of pool tokens
    total_supply: Var<U256>,
    /// Pool token balances
    balances: Mapping<Address, U256>,
    /// Pool token allowances
    allowances: Mapping<(Address, Address), U256>,

    /// Primary asset the NAV is quoted in
    primary_token: Var<Address>,
    /// Supported deposit tokens
    supported: Mapping<Address, bool>,
    /// Supported token list (for iteration)
    supported_list: Mapping<u32, Address>,
    /// Number of supported tokens
    supported_count: Var<u32>,

    /// Price oracle used to value side-asset deposits
    oracle: Var<Address>,
    /// NAV per pool token, 1e18 fixed point
    price_per_share: Var<U256>,
    /// Admin address
    admin: Var<Address>,
}

#[odra::module]
impl CollateralPool {
    /// Initialize the pool around its primary asset
    pub fn init(
        &mut self,
        name: String,
        symbol: String,
        primary_token: Address,
        supported_tokens: Vec<Address>,
        oracle: Address,
    ) {
        if supported_tokens.is_empty() {
            self.env().revert(PoolError::EmptySupportedSet);
        }

        let caller = self.env().caller();
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(18);
        self.total_supply.set(U256::zero());
        self.primary_token.set(primary_token);
        self.oracle.set(oracle);
        self.price_per_share.set(U256::from(NAV_SCALE));
        self.admin.set(caller);

        self.supported.set(&primary_token, true);
        let mut count = 0u32;
        self.supported_list.set(&count, primary_token);
        count += 1;
        for token in supported_tokens {
            if token != primary_token {
                self.supported.set(&token, true);
                self.supported_list.set(&count, token);
                count += 1;
            }
        }
        self.supported_count.set(count);
    }

    // ========================================
    // NAV source interface
    // ========================================

    /// NAV per pool token (1e18 fixed point)
    pub fn price_per_share(&self) -> U256 {
        self.price_per_share.get_or_default()
    }

    /// The primary asset the pool unwraps into
    pub fn token(&self) -> Address {
        self.primary_token.get_or_revert_with(PoolError::UnsupportedToken)
    }

    /// All tokens the pool accepts for deposit
    pub fn get_supported_tokens(&self) -> Vec<Address> {
        let count = self.supported_count.get_or_default();
        let mut tokens = Vec::new();
        for i in 0..count {
            if let Some(token) = self.supported_list.get(&i) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Reprice the pool (admin only)
    pub fn set_price_per_share(&mut self, new_price: U256) {
        self.only_admin();
        if new_price.is_zero() {
            self.env().revert(PoolError::InvalidAmount);
        }
        let old_price = self.price_per_share.get_or_default();
        self.price_per_share.set(new_price);
        self.env().emit_event(NavUpdated { old_price, new_price });
    }

    /// Deposit a supported token and receive pool tokens at the current NAV
    pub fn deposit(&mut self, token: Address, amount: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(PoolError::InvalidAmount);
        }
        if !self.supported.get(&token).unwrap_or(false) {
            self.env().revert(PoolError::UnsupportedToken);
        }

        let caller = self.env().caller();
        let primary = self.token();
        let value = if token == primary {
            amount
        } else {
            self.value_in_primary(token, primary, amount)
        };

        let pps = self.price_per_share.get_or_default();
        let minted = AssetConvert::value_to_pool_tokens(value, pps)
            .unwrap_or_else(|err| self.env().revert(err));

        self.mint_internal(caller, minted);

        let mut asset = FungibleTokenContractRef::new(self.env(), token);
        asset.transfer_from(caller, Address::from(self.env().self_address()), amount);

        self.env().emit_event(PoolDeposit {
            account: caller,
            token,
            amount,
            minted,
        });

        minted
    }

    /// Burn pool tokens and withdraw the primary asset at the current NAV
    pub fn withdraw(&mut self, pool_tokens: U256) -> U256 {
        if pool_tokens.is_zero() {
            self.env().revert(PoolError::InvalidAmount);
        }

        let caller = self.env().caller();
        let pps = self.price_per_share.get_or_default();
        let amount = AssetConvert::pool_tokens_to_value(pool_tokens, pps)
            .unwrap_or_else(|err| self.env().revert(err));

        self.burn_internal(caller, pool_tokens);

        let primary = self.token();
        let mut asset = FungibleTokenContractRef::new(self.env(), primary);
        let liquidity = asset.balance_of(Address::from(self.env().self_address()));
        if liquidity < amount {
            self.env().revert(PoolError::InsufficientLiquidity);
        }
        asset.transfer(caller, amount);

        self.env().emit_event(PoolWithdraw {
            account: caller,
            burned: pool_tokens,
            amount,
        });

        amount
    }

    // ========================================
    // Pool token (CEP-18) surface
    // ========================================

    pub fn name(&self) -> String {
        self.name.get_or_default()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get_or_default()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get_or_default()
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or_default()
    }

    pub fn transfer(&mut self, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.transfer_internal(caller, to, amount);
        true
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        self.allowances.set(&(caller, spender), amount);
        self.env().emit_event(Approval {
            owner: caller,
            spender,
            value: amount,
        });
        true
    }

    pub fn transfer_from(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let caller = self.env().caller();
        let current_allowance = self.allowance(from, caller);
        if current_allowance < amount {
            self.env().revert(TokenError::InsufficientAllowance);
        }
        self.allowances.set(&(from, caller), current_allowance - amount);
        self.transfer_internal(from, to, amount);
        true
    }

    /// Get admin address
    pub fn get_admin(&self) -> Address {
        self.admin.get_or_revert_with(PoolError::Unauthorized)
    }

    // ========================================
    // Internals
    // ========================================

    fn value_in_primary(&self, token: Address, primary: Address, amount: U256) -> U256 {
        let oracle_address = self.oracle.get_or_revert_with(PoolError::UnsupportedToken);
        let oracle = PriceOracleContractRef::new(self.env(), oracle_address);
        let in_price = oracle.get_price(token);
        let out_price = oracle.get_price(primary);

        let in_decimals = FungibleTokenContractRef::new(self.env(), token).decimals();
        let out_decimals = FungibleTokenContractRef::new(self.env(), primary).decimals();

        AssetConvert::convert_with_prices(amount, in_price, out_price, in_decimals, out_decimals)
            .unwrap_or_else(|err| self.env().revert(err))
    }

    fn mint_internal(&mut self, to: Address, amount: U256) {
        let supply = self.total_supply.get_or_default();
        self.total_supply.set(
            SafeMath::add(supply, amount).unwrap_or_else(|err| self.env().revert(err)),
        );
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
    }

    fn burn_internal(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, balance - amount);
        let supply = self.total_supply.get_or_default();
        self.total_supply.set(supply - amount);
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balance_of(to);
        self.balances.set(&to, to_balance + amount);

        self.env().emit_event(Transfer {
            from,
            to,
            value: amount,
        });
    }

    fn only_admin(&self) {
        let caller = self.env().caller();
        let admin = self.admin.get_or_revert_with(PoolError::Unauthorized);
        if caller != admin {
            self.env().revert(PoolError::Unauthorized);
        }
    }
}
