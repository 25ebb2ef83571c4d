//! Collateral Vault - round-based share accounting over one collateral pool
//!
//! Deposits stay pending until the keeper rolls the round; at that
//! moment the round's price per share is fixed forever, pending amounts
//! become vault-held shares, queued withdrawals are carved out of the
//! balance and the remainder is locked into the next option position.
//! The vault is itself the share token.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::VaultError;
use super::events::*;
use crate::errors::TokenError;
use crate::events::{Transfer, Approval};
use crate::math::{AssetConvert, FeeMath, SafeMath, ShareMath, FEE_DIVISOR};
use crate::pool::collateral_pool::CollateralPoolContractRef;

/// A depositor's pending amount and realized-but-unredeemed shares.
///
/// At most one round is active per receipt: a deposit in a later round
/// first converts the stale amount into shares at that round's fixed
/// price, then the receipt is overwritten.
#[odra::odra_type]
pub struct DepositReceipt {
    /// Round the pending amount was deposited in
    pub round: u64,
    /// Amount pending for `round`, in the vault's accounting unit
    pub amount: U256,
    /// Shares realized from earlier rounds, still in vault custody
    pub unredeemed_shares: U256,
}

impl DepositReceipt {
    fn empty() -> Self {
        DepositReceipt {
            round: 0,
            amount: U256::zero(),
            unredeemed_shares: U256::zero(),
        }
    }
}

/// An account's scheduled withdrawal. One outstanding request per
/// account; topping up requires the same round.
#[odra::odra_type]
pub struct Withdrawal {
    /// Round the withdrawal was initiated in
    pub round: u64,
    /// Shares waiting to be paid out
    pub shares: U256,
}

impl Withdrawal {
    fn empty() -> Self {
        Withdrawal {
            round: 0,
            shares: U256::zero(),
        }
    }
}

/// Snapshot of the vault's round state
#[odra::odra_type]
pub struct VaultState {
    /// Current round, starting at 1 and incremented by every roll
    pub round: u64,
    /// Amount locked in the open option position
    pub locked_amount: U256,
    /// Amount that was locked in the previous round
    pub last_locked_amount: U256,
    /// Deposits pending for the current round
    pub total_pending: U256,
    /// Shares queued for withdrawal across all accounts
    pub queued_withdraw_shares: U256,
}

/// Static vault configuration
#[odra::odra_type]
pub struct VaultParams {
    /// Whether the parent vault sells puts
    pub is_put: bool,
    /// Share token decimals
    pub decimals: u8,
    /// Collateral pool backing the vault
    pub collateral_pool: Address,
    /// Underlying asset of the option
    pub underlying: Address,
    /// Minimum share supply the vault must keep
    pub minimum_supply: U256,
    /// Deposit cap in the accounting unit
    pub cap: U256,
}

/// Collateral Vault contract
#[odra::module]
pub struct CollateralVault {
    /// Share token name
    name: Var<String>,
    /// Share token symbol
    symbol: Var<String>,
    /// Share token decimals
    decimals: Var<u8>,
    /// Total share supply
    total_supply: Var<U256>,
    /// Share balances (the vault's own address custodies unredeemed and
    /// queued shares)
    balances: Mapping<Address, U256>,
    /// Share allowances
    allowances: Mapping<(Address, Address), U256>,

    /// Guard against repeated initialization
    initialized: Var<bool>,
    /// Contract owner
    owner: Var<Address>,
    /// Keeper allowed to price and close rounds
    keeper: Var<Address>,
    /// Recipient of round fees
    fee_recipient: Var<Address>,
    /// Weekly management fee rate (6 decimals)
    management_fee: Var<U256>,
    /// Performance fee rate (6 decimals)
    performance_fee: Var<U256>,

    /// Whether the parent vault sells puts
    is_put: Var<bool>,
    /// Collateral pool backing the vault
    collateral_pool: Var<Address>,
    /// Underlying asset of the option
    underlying: Var<Address>,
    /// Minimum share supply the vault must keep
    minimum_supply: Var<U256>,
    /// Deposit cap in the accounting unit
    cap: Var<U256>,
    /// Disabled vaults reject deposits
    disabled: Var<bool>,

    /// Current round
    round: Var<u64>,
    /// Amount locked in the open option position
    locked_amount: Var<U256>,
    /// Amount locked in the previous round
    last_locked_amount: Var<U256>,
    /// Deposits pending for the current round
    total_pending: Var<U256>,
    /// Shares queued for withdrawal
    queued_withdraw_shares: Var<U256>,
    /// Amount owed to withdrawals queued at the last roll
    last_queued_withdraw_amount: Var<U256>,

    /// Per-account deposit receipts
    deposit_receipts: Mapping<Address, DepositReceipt>,
    /// Per-account withdrawal requests
    withdrawals: Mapping<Address, Withdrawal>,
    /// Price per share fixed at each round's roll, append-only
    round_price_per_share: Mapping<u64, U256>,
}

#[odra::module]
impl CollateralVault {
    /// Initialize the vault. Callable exactly once.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        owner: Address,
        keeper: Address,
        fee_recipient: Address,
        management_fee: U256,
        performance_fee: U256,
        token_name: String,
        token_symbol: String,
        is_put: bool,
        decimals: u8,
        collateral_pool: Address,
        underlying: Address,
        minimum_supply: U256,
        cap: U256,
    ) {
        if self.initialized.get_or_default() {
            self.env().revert(VaultError::AlreadyInitialized);
        }
        if cap.is_zero() {
            self.env().revert(VaultError::InvalidCap);
        }
        if minimum_supply.is_zero() {
            self.env().revert(VaultError::InvalidAmount);
        }
        if management_fee >= U256::from(FEE_DIVISOR) || performance_fee >= U256::from(FEE_DIVISOR) {
            self.env().revert(VaultError::InvalidFee);
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

        self.name.set(token_name);
        self.symbol.set(token_symbol);
        self.decimals.set(decimals);
        self.total_supply.set(U256::zero());

        self.is_put.set(is_put);
        self.collateral_pool.set(collateral_pool);
        self.underlying.set(underlying);
        self.minimum_supply.set(minimum_supply);
        self.cap.set(cap);
        self.disabled.set(false);

        self.round.set(1);
        self.locked_amount.set(U256::zero());
        self.last_locked_amount.set(U256::zero());
        self.total_pending.set(U256::zero());
        self.queued_withdraw_shares.set(U256::zero());
        self.last_queued_withdraw_amount.set(U256::zero());
    }

    /// Pre-warm the round price map with placeholder values.
    ///
    /// Placeholders are only ever written for rounds that have not been
    /// priced yet; `roll_round` overwrites them with the real price.
    pub fn init_rounds(&mut self, num_rounds: u64) {
        let current_round = self.round.get_or_default();
        for r in current_round..current_round + num_rounds {
            if self.round_price_per_share.get(&r).is_none() {
                self.round_price_per_share.set(&r, U256::one());
            }
        }
    }

    // ========================================
    // Depositor operations
    // ========================================

    /// Deposit pool tokens; the valued amount stays pending until the
    /// round is rolled
    pub fn deposit(&mut self, amount: U256) {
        let caller = self.env().caller();
        self.deposit_internal(amount, caller, caller);
    }

    /// Deposit pool tokens and credit another account
    pub fn deposit_for(&mut self, amount: U256, creditor: Address) {
        let caller = self.env().caller();
        self.deposit_internal(amount, creditor, caller);
    }

    /// Take back a deposit made in the current round, before it is priced
    pub fn withdraw_instantly(&mut self, amount: U256) {
        if amount.is_zero() {
            self.env().revert(VaultError::InvalidAmount);
        }

        let caller = self.env().caller();
        let current_round = self.round.get_or_default();
        let mut receipt = self.get_receipt(caller);

        if receipt.round != current_round {
            self.env().revert(VaultError::InvalidRound);
        }
        if amount > receipt.amount {
            self.env().revert(VaultError::ExceedAmount);
        }

        receipt.amount = receipt.amount - amount;
        self.deposit_receipts.set(&caller, receipt);
        self.total_pending
            .set(self.total_pending.get_or_default() - amount);

        self.env().emit_event(InstantWithdraw {
            account: caller,
            amount,
            round: current_round,
        });

        self.pay_out_pool_tokens(caller, amount);
    }

    /// Move shares realized in earlier rounds from vault custody into
    /// the caller's balance
    pub fn redeem(&mut self, num_shares: U256) {
        if num_shares.is_zero() {
            self.env().revert(VaultError::InvalidShareCount);
        }
        self.redeem_internal(num_shares, false);
    }

    /// Redeem every realized share. Idempotent: a second call moves
    /// nothing and emits nothing.
    pub fn max_redeem(&mut self) {
        self.redeem_internal(U256::zero(), true);
    }

    /// Schedule shares for withdrawal at the next round's price
    pub fn initiate_withdraw(&mut self, num_shares: U256) {
        if num_shares.is_zero() {
            self.env().revert(VaultError::InvalidShareCount);
        }

        let caller = self.env().caller();

        // Realize the whole receipt first so the debit below can draw on
        // freshly redeemed shares: transfers are vault -> account, then
        // account -> vault.
        let receipt = self.get_receipt(caller);
        if !receipt.amount.is_zero() || !receipt.unredeemed_shares.is_zero() {
            self.redeem_internal(U256::zero(), true);
        }

        let current_round = self.round.get_or_default();
        let mut withdrawal = self.get_withdrawal(caller);

        if !withdrawal.shares.is_zero() && withdrawal.round != current_round {
            self.env().revert(VaultError::ExistingWithdraw);
        }

        withdrawal.round = current_round;
        withdrawal.shares = withdrawal.shares + num_shares;
        self.withdrawals.set(&caller, withdrawal);

        self.queued_withdraw_shares
            .set(self.queued_withdraw_shares.get_or_default() + num_shares);

        self.env().emit_event(InitiateWithdraw {
            account: caller,
            shares: num_shares,
            round: current_round,
        });

        let vault_address = Address::from(self.env().self_address());
        self.transfer_shares_internal(caller, vault_address, num_shares);
    }

    /// Pay out a scheduled withdrawal at its round's fixed price
    pub fn complete_withdraw(&mut self) {
        let caller = self.env().caller();
        let mut withdrawal = self.get_withdrawal(caller);

        if withdrawal.shares.is_zero() {
            self.env().revert(VaultError::NotInitiated);
        }
        let current_round = self.round.get_or_default();
        if withdrawal.round >= current_round {
            self.env().revert(VaultError::RoundNotClosed);
        }

        let price = self
            .round_price_per_share
            .get(&withdrawal.round)
            .unwrap_or_revert_with(&self.env(), VaultError::PriceNotSet);
        let decimals = self.decimals.get_or_default();
        let shares = withdrawal.shares;
        let amount = ShareMath::shares_to_asset(shares, price, decimals)
            .unwrap_or_else(|err| self.env().revert(err));

        withdrawal.shares = U256::zero();
        self.withdrawals.set(&caller, withdrawal);

        self.queued_withdraw_shares
            .set(self.queued_withdraw_shares.get_or_default() - shares);
        self.last_queued_withdraw_amount.set(SafeMath::sub_or_zero(
            self.last_queued_withdraw_amount.get_or_default(),
            amount,
        ));

        self.burn_shares_internal(Address::from(self.env().self_address()), shares);

        self.env().emit_event(Withdraw {
            account: caller,
            amount,
            shares,
        });

        self.pay_out_pool_tokens(caller, amount);
    }

    // ========================================
    // Keeper operations
    // ========================================

    /// Price the current round, mint shares for its pending deposits,
    /// collect fees and lock the remainder for the next option position.
    ///
    /// The locked collateral is shipped to `recipient` (the settlement
    /// venue) and the transferred pool-token amount is returned.
    pub fn roll_round(&mut self, recipient: Address) -> U256 {
        self.only_keeper();

        let current_round = self.round.get_or_default();
        let decimals = self.decimals.get_or_default();
        let pool_address = self
            .collateral_pool
            .get_or_revert_with(VaultError::PriceNotSet);
        let mut pool = CollateralPoolContractRef::new(self.env(), pool_address);
        let pool_price = pool.price_per_share();

        let held_tokens = pool.balance_of(Address::from(self.env().self_address()));
        let held_value = AssetConvert::pool_tokens_to_value(held_tokens, pool_price)
            .unwrap_or_else(|err| self.env().revert(err));
        let current_balance = self.locked_amount.get_or_default() + held_value;
        let pending = self.total_pending.get_or_default();

        let (management_fee, performance_fee) = FeeMath::round_fees(
            current_balance,
            self.last_queued_withdraw_amount.get_or_default(),
            pending,
            self.last_locked_amount.get_or_default(),
            self.management_fee.get_or_default(),
            self.performance_fee.get_or_default(),
        )
        .unwrap_or_else(|err| self.env().revert(err));
        let vault_fee = management_fee + performance_fee;

        let balance_after_fee = SafeMath::sub_or_zero(current_balance, vault_fee);
        let supply = self.total_supply.get_or_default();
        let new_price = ShareMath::price_per_share(supply, balance_after_fee, pending, decimals)
            .unwrap_or_else(|err| self.env().revert(err));
        self.round_price_per_share.set(&current_round, new_price);

        let mint_shares = ShareMath::asset_to_shares(pending, new_price, decimals)
            .unwrap_or_else(|err| self.env().revert(err));
        self.mint_shares_internal(Address::from(self.env().self_address()), mint_shares);

        let queued_shares = self.queued_withdraw_shares.get_or_default();
        let queued_amount = ShareMath::shares_to_asset(queued_shares, new_price, decimals)
            .unwrap_or_else(|err| self.env().revert(err));
        let new_locked = SafeMath::sub_or_zero(balance_after_fee, queued_amount);

        self.round.set(current_round + 1);
        self.total_pending.set(U256::zero());
        self.last_queued_withdraw_amount.set(queued_amount);
        self.locked_amount.set(new_locked);

        self.env().emit_event(RoundRolled {
            round: current_round,
            price_per_share: new_price,
            mint_shares,
            locked_amount: new_locked,
        });

        if !vault_fee.is_zero() {
            let fee_recipient = self
                .fee_recipient
                .get_or_revert_with(VaultError::NotOwner);
            self.env().emit_event(CollectVaultFees {
                performance_fee,
                vault_fee,
                round: current_round,
                fee_recipient,
            });
            let fee_tokens = AssetConvert::value_to_pool_tokens(vault_fee, pool_price)
                .unwrap_or_else(|err| self.env().revert(err));
            if !fee_tokens.is_zero() {
                pool.transfer(fee_recipient, fee_tokens);
            }
        }

        let locked_tokens = AssetConvert::value_to_pool_tokens(new_locked, pool_price)
            .unwrap_or_else(|err| self.env().revert(err));
        if !locked_tokens.is_zero() {
            pool.transfer(recipient, locked_tokens);
        }
        locked_tokens
    }

    /// Snapshot the locked amount and free the vault for the next roll.
    /// Called after the position's collateral has been returned.
    pub fn close_round(&mut self) {
        self.only_keeper();
        let locked = self.locked_amount.get_or_default();
        self.last_locked_amount.set(locked);
        self.locked_amount.set(U256::zero());
    }

    /// Reduce the locked amount after part of the collateral came back
    /// ahead of expiry (unsold options burned). Keeper only.
    pub fn release_locked(&mut self, amount: U256) {
        self.only_keeper();
        let locked = self.locked_amount.get_or_default();
        self.locked_amount.set(SafeMath::sub_or_zero(locked, amount));
    }

    // ========================================
    // Owner operations
    // ========================================

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
            self.env().revert(VaultError::InvalidFee);
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
            self.env().revert(VaultError::InvalidFee);
        }
        self.performance_fee.set(new_performance_fee);
    }

    /// Set the deposit cap (owner only)
    pub fn set_cap(&mut self, new_cap: U256) {
        self.only_owner();
        if new_cap.is_zero() {
            self.env().revert(VaultError::InvalidCap);
        }
        let old_cap = self.cap.get_or_default();
        self.cap.set(new_cap);
        self.env().emit_event(CapSet { old_cap, new_cap });
    }

    /// Stop accepting deposits. Requires no collateral locked in an
    /// open position.
    pub fn disable_vault(&mut self) {
        self.only_owner();
        if !self.locked_amount.get_or_default().is_zero() {
            self.env().revert(VaultError::LockedAmountNonZero);
        }
        self.disabled.set(true);
    }

    // ========================================
    // Accessors
    // ========================================

    /// Round state snapshot
    pub fn vault_state(&self) -> VaultState {
        VaultState {
            round: self.round.get_or_default(),
            locked_amount: self.locked_amount.get_or_default(),
            last_locked_amount: self.last_locked_amount.get_or_default(),
            total_pending: self.total_pending.get_or_default(),
            queued_withdraw_shares: self.queued_withdraw_shares.get_or_default(),
        }
    }

    /// Static configuration
    pub fn vault_params(&self) -> VaultParams {
        VaultParams {
            is_put: self.is_put.get_or_default(),
            decimals: self.decimals.get_or_default(),
            collateral_pool: self
                .collateral_pool
                .get_or_revert_with(VaultError::PriceNotSet),
            underlying: self.underlying.get_or_revert_with(VaultError::PriceNotSet),
            minimum_supply: self.minimum_supply.get_or_default(),
            cap: self.cap.get_or_default(),
        }
    }

    /// An account's deposit receipt
    pub fn deposit_receipts(&self, account: Address) -> DepositReceipt {
        self.get_receipt(account)
    }

    /// An account's withdrawal request
    pub fn withdrawals(&self, account: Address) -> Withdrawal {
        self.get_withdrawal(account)
    }

    /// The price per share fixed for a round (zero while unpriced)
    pub fn round_price_per_share(&self, round: u64) -> U256 {
        self.round_price_per_share.get(&round).unwrap_or_default()
    }

    /// Value of an account's total shares at the current price per share
    pub fn account_vault_balance(&self, account: Address) -> U256 {
        let decimals = self.decimals.get_or_default();
        ShareMath::shares_to_asset(self.shares(account), self.price_per_share(), decimals)
            .unwrap_or_else(|err| self.env().revert(err))
    }

    /// Current price per share, pending deposits excluded
    pub fn price_per_share(&self) -> U256 {
        ShareMath::price_per_share(
            self.total_supply.get_or_default(),
            self.total_balance(),
            self.total_pending.get_or_default(),
            self.decimals.get_or_default(),
        )
        .unwrap_or_else(|err| self.env().revert(err))
    }

    /// Locked amount plus the value of every pool token the vault holds
    pub fn total_balance(&self) -> U256 {
        let pool_address = self
            .collateral_pool
            .get_or_revert_with(VaultError::PriceNotSet);
        let pool = CollateralPoolContractRef::new(self.env(), pool_address);
        let held_tokens = pool.balance_of(Address::from(self.env().self_address()));
        let held_value =
            AssetConvert::pool_tokens_to_value(held_tokens, pool.price_per_share())
                .unwrap_or_else(|err| self.env().revert(err));
        self.locked_amount.get_or_default() + held_value
    }

    /// All shares owned by an account, redeemed or not
    pub fn shares(&self, account: Address) -> U256 {
        let receipt = self.get_receipt(account);
        let unredeemed = self.shares_from_receipt(&receipt);
        self.balance_of(account) + unredeemed
    }

    /// Split of an account's shares: (held by account, held by vault)
    pub fn share_balances(&self, account: Address) -> (U256, U256) {
        let receipt = self.get_receipt(account);
        (self.balance_of(account), self.shares_from_receipt(&receipt))
    }

    /// Deposits pending for the current round
    pub fn total_pending(&self) -> U256 {
        self.total_pending.get_or_default()
    }

    /// Amount owed to withdrawals queued at the last roll
    pub fn last_queued_withdraw_amount(&self) -> U256 {
        self.last_queued_withdraw_amount.get_or_default()
    }

    /// Deposit cap
    pub fn cap(&self) -> U256 {
        self.cap.get_or_default()
    }

    /// Weekly management fee rate (6 decimals)
    pub fn management_fee(&self) -> U256 {
        self.management_fee.get_or_default()
    }

    /// Performance fee rate (6 decimals)
    pub fn performance_fee(&self) -> U256 {
        self.performance_fee.get_or_default()
    }

    /// Contract owner
    pub fn owner(&self) -> Address {
        self.owner.get_or_revert_with(VaultError::NotOwner)
    }

    /// Keeper allowed to roll rounds
    pub fn keeper(&self) -> Address {
        self.keeper.get_or_revert_with(VaultError::NotKeeper)
    }

    /// Recipient of round fees
    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient.get_or_revert_with(VaultError::NotOwner)
    }

    /// Whether deposits are disabled
    pub fn is_disabled(&self) -> bool {
        self.disabled.get_or_default()
    }

    // ========================================
    // Share token (CEP-18) surface
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
        self.transfer_shares_internal(caller, to, amount);
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
        self.transfer_shares_internal(from, to, amount);
        true
    }

    // ========================================
    // Internals
    // ========================================

    fn deposit_internal(&mut self, amount: U256, creditor: Address, payer: Address) {
        if self.disabled.get_or_default() {
            self.env().revert(VaultError::VaultDisabled);
        }
        if amount.is_zero() {
            self.env().revert(VaultError::InvalidAmount);
        }

        let pool_address = self
            .collateral_pool
            .get_or_revert_with(VaultError::PriceNotSet);
        let mut pool = CollateralPoolContractRef::new(self.env(), pool_address);
        let value = AssetConvert::pool_tokens_to_value(amount, pool.price_per_share())
            .unwrap_or_else(|err| self.env().revert(err));
        if value.is_zero() {
            self.env().revert(VaultError::InvalidAmount);
        }

        let total_with_deposit = self.total_balance() + value;
        if total_with_deposit > self.cap.get_or_default() {
            self.env().revert(VaultError::ExceedCap);
        }
        if total_with_deposit < self.minimum_supply.get_or_default() {
            self.env().revert(VaultError::InsufficientBalance);
        }

        let current_round = self.round.get_or_default();
        let mut receipt = self.get_receipt(creditor);
        if receipt.round == current_round {
            receipt.amount = receipt.amount + value;
        } else {
            let unredeemed = self.shares_from_receipt(&receipt);
            receipt = DepositReceipt {
                round: current_round,
                amount: value,
                unredeemed_shares: unredeemed,
            };
        }
        self.deposit_receipts.set(&creditor, receipt);
        self.total_pending
            .set(self.total_pending.get_or_default() + value);

        self.env().emit_event(Deposit {
            account: creditor,
            amount: value,
            round: current_round,
        });

        pool.transfer_from(payer, Address::from(self.env().self_address()), amount);
    }

    fn redeem_internal(&mut self, num_shares: U256, is_max: bool) {
        let caller = self.env().caller();
        let current_round = self.round.get_or_default();
        let mut receipt = self.get_receipt(caller);

        let unredeemed = self.shares_from_receipt(&receipt);
        let num_shares = if is_max { unredeemed } else { num_shares };
        if is_max && num_shares.is_zero() {
            return;
        }
        if num_shares > unredeemed {
            self.env().revert(VaultError::ExceedsAvailable);
        }

        // The stale pending amount is realized now; the receipt keeps
        // its round so observers can still see where it came from.
        if receipt.round < current_round {
            receipt.amount = U256::zero();
        }
        receipt.unredeemed_shares = unredeemed - num_shares;
        let receipt_round = receipt.round;
        self.deposit_receipts.set(&caller, receipt);

        self.env().emit_event(Redeem {
            account: caller,
            shares: num_shares,
            round: receipt_round,
        });

        let vault_address = Address::from(self.env().self_address());
        self.transfer_shares_internal(vault_address, caller, num_shares);
    }

    /// Shares an account could redeem right now: realized shares plus
    /// the stale pending amount converted at its round's fixed price
    fn shares_from_receipt(&self, receipt: &DepositReceipt) -> U256 {
        let current_round = self.round.get_or_default();
        let mut unredeemed = receipt.unredeemed_shares;
        if receipt.round > 0 && receipt.round < current_round && !receipt.amount.is_zero() {
            let price = self
                .round_price_per_share
                .get(&receipt.round)
                .unwrap_or_revert_with(&self.env(), VaultError::PriceNotSet);
            let realized =
                ShareMath::asset_to_shares(receipt.amount, price, self.decimals.get_or_default())
                    .unwrap_or_else(|err| self.env().revert(err));
            unredeemed = unredeemed + realized;
        }
        unredeemed
    }

    fn pay_out_pool_tokens(&mut self, to: Address, amount: U256) {
        let pool_address = self
            .collateral_pool
            .get_or_revert_with(VaultError::PriceNotSet);
        let mut pool = CollateralPoolContractRef::new(self.env(), pool_address);
        let tokens = AssetConvert::value_to_pool_tokens(amount, pool.price_per_share())
            .unwrap_or_else(|err| self.env().revert(err));
        if !tokens.is_zero() {
            pool.transfer(to, tokens);
        }
    }

    fn mint_shares_internal(&mut self, to: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let supply = self.total_supply.get_or_default();
        self.total_supply.set(
            SafeMath::add(supply, amount).unwrap_or_else(|err| self.env().revert(err)),
        );
        let balance = self.balance_of(to);
        self.balances.set(&to, balance + amount);
    }

    fn burn_shares_internal(&mut self, from: Address, amount: U256) {
        let balance = self.balance_of(from);
        if balance < amount {
            self.env().revert(TokenError::InsufficientBalance);
        }
        self.balances.set(&from, balance - amount);
        let supply = self.total_supply.get_or_default();
        self.total_supply.set(supply - amount);
    }

    fn transfer_shares_internal(&mut self, from: Address, to: Address, amount: U256) {
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

    fn get_receipt(&self, account: Address) -> DepositReceipt {
        self.deposit_receipts
            .get(&account)
            .unwrap_or_else(DepositReceipt::empty)
    }

    fn get_withdrawal(&self, account: Address) -> Withdrawal {
        self.withdrawals
            .get(&account)
            .unwrap_or_else(Withdrawal::empty)
    }

    fn only_owner(&self) {
        let caller = self.env().caller();
        let owner = self.owner.get_or_revert_with(VaultError::NotOwner);
        if caller != owner {
            self.env().revert(VaultError::NotOwner);
        }
    }

    fn only_keeper(&self) {
        let caller = self.env().caller();
        let keeper = self.keeper.get_or_revert_with(VaultError::NotKeeper);
        if caller != keeper {
            self.env().revert(VaultError::NotKeeper);
        }
    }
}
