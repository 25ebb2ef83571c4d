//! Tests for the round accounting ledger

#[cfg(test)]
mod tests {
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
    use crate::errors::TokenError;
    use crate::math::{SafeMath, NAV_SCALE};
    use crate::oracle::price_oracle::PriceOracleHostRef;
    use crate::oracle::PriceOracle;
    use crate::pool::collateral_pool::{CollateralPoolHostRef, CollateralPoolInitArgs};
    use crate::pool::CollateralPool;
    use crate::token::{FungibleToken, FungibleTokenHostRef, FungibleTokenInitArgs};
    use crate::vault::collateral_vault::CollateralVaultHostRef;
    use crate::vault::{CollateralVault, VaultError};

    const DEPOSIT_AMOUNT: u64 = 100_000_000_000;
    const MINIMUM_SUPPLY: u64 = 1_000;
    const MANAGEMENT_FEE: u64 = 2_000_000; // 2% annual, 6 decimals
    const PERFORMANCE_FEE: u64 = 20_000_000; // 20%, 6 decimals
    const FEE_DIVISOR: u64 = 100_000_000;

    struct Fixture {
        env: HostEnv,
        token: FungibleTokenHostRef,
        pool: CollateralPoolHostRef,
        vault: CollateralVaultHostRef,
    }

    fn setup() -> Fixture {
        let env = odra_test::env();
        let owner = env.get_account(0);
        let keeper = env.get_account(1);
        let fee_recipient = env.get_account(4);

        let token = FungibleToken::deploy(
            &env,
            FungibleTokenInitArgs {
                name: String::from("Wrapped Ether"),
                symbol: String::from("WETH"),
                decimals: 18,
            },
        );
        let oracle: PriceOracleHostRef = PriceOracle::deploy(&env, NoArgs);
        let pool = CollateralPool::deploy(
            &env,
            CollateralPoolInitArgs {
                name: String::from("ETH Collateral Pool"),
                symbol: String::from("cpETH"),
                primary_token: *token.address(),
                supported_tokens: vec![*token.address()],
                oracle: *oracle.address(),
            },
        );

        let mut vault = CollateralVault::deploy(&env, NoArgs);
        vault.initialize(
            owner,
            keeper,
            fee_recipient,
            U256::from(MANAGEMENT_FEE),
            U256::from(PERFORMANCE_FEE),
            String::from("ETH Theta Vault Collateral"),
            String::from("cvETH"),
            false,
            18,
            *pool.address(),
            *token.address(),
            U256::from(MINIMUM_SUPPLY),
            SafeMath::pow10(28),
        );

        Fixture {
            env,
            token,
            pool,
            vault,
        }
    }

    fn keeper(f: &Fixture) -> odra::prelude::Address {
        f.env.get_account(1)
    }

    /// The settlement venue stand-in that locked collateral ships to
    fn sink(f: &Fixture) -> odra::prelude::Address {
        f.env.get_account(5)
    }

    /// Mints the underlying, wraps it into pool tokens and leaves the
    /// caller holding them
    fn fund_pool_tokens(f: &mut Fixture, account: odra::prelude::Address, amount: U256) {
        f.env.set_caller(f.env.get_account(0));
        f.token.mint(account, amount);
        f.env.set_caller(account);
        f.token.approve(*f.pool.address(), amount);
        f.pool.deposit(*f.token.address(), amount);
    }

    fn deposit(f: &mut Fixture, account: odra::prelude::Address, amount: U256) {
        fund_pool_tokens(f, account, amount);
        f.env.set_caller(account);
        f.pool.approve(*f.vault.address(), amount);
        f.vault.deposit(amount);
    }

    /// Prices the round and ships the locked collateral to the sink
    fn roll(f: &mut Fixture) -> U256 {
        f.env.set_caller(keeper(f));
        f.vault.roll_round(sink(f))
    }

    /// Simulates position settlement: the sink returns `amount` pool
    /// tokens and the keeper closes the round
    fn settle_round(f: &mut Fixture, returned: U256) {
        if !returned.is_zero() {
            f.env.set_caller(sink(f));
            f.pool.transfer(*f.vault.address(), returned);
        }
        f.env.set_caller(keeper(f));
        f.vault.close_round();
    }

    #[test]
    fn test_initialize_sets_params() {
        let f = setup();
        let params = f.vault.vault_params();
        assert!(!params.is_put);
        assert_eq!(params.decimals, 18);
        assert_eq!(params.collateral_pool, *f.pool.address());
        assert_eq!(params.minimum_supply, U256::from(MINIMUM_SUPPLY));
        assert_eq!(f.vault.name(), "ETH Theta Vault Collateral");
        assert_eq!(f.vault.symbol(), "cvETH");
        assert_eq!(f.vault.decimals(), 18);
        // 2% annual spread over 52.142857 weeks
        assert_eq!(f.vault.management_fee(), U256::from(38_356u64));
        assert_eq!(f.vault.performance_fee(), U256::from(PERFORMANCE_FEE));
        assert_eq!(f.vault.vault_state().round, 1);
        assert_eq!(f.vault.total_pending(), U256::zero());
    }

    #[test]
    fn test_cannot_initialize_twice() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let result = f.vault.try_initialize(
            owner,
            owner,
            owner,
            U256::from(MANAGEMENT_FEE),
            U256::from(PERFORMANCE_FEE),
            String::from("again"),
            String::from("AG"),
            false,
            18,
            *f.pool.address(),
            *f.token.address(),
            U256::from(MINIMUM_SUPPLY),
            SafeMath::pow10(28),
        );
        assert_eq!(result, Err(VaultError::AlreadyInitialized.into()));
    }

    #[test]
    fn test_deposit_creates_pending_receipt() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);

        assert_eq!(f.pool.balance_of(user), U256::zero());
        assert_eq!(f.vault.total_supply(), U256::zero());
        assert_eq!(f.vault.balance_of(user), U256::zero());
        assert_eq!(f.vault.total_pending(), amount);

        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.amount, amount);
        assert_eq!(receipt.unredeemed_shares, U256::zero());
    }

    #[test]
    fn test_deposit_tops_up_same_round() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        deposit(&mut f, user, amount);

        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.amount, amount * 2);
        assert_eq!(f.vault.total_pending(), amount * 2);
    }

    #[test]
    fn test_deposit_below_minimum_supply_reverts() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let below = U256::from(MINIMUM_SUPPLY - 1);

        fund_pool_tokens(&mut f, user, below);
        f.env.set_caller(user);
        f.pool.approve(*f.vault.address(), below);
        assert_eq!(
            f.vault.try_deposit(below),
            Err(VaultError::InsufficientBalance.into())
        );

        // exactly the minimum is accepted
        let exact = U256::from(MINIMUM_SUPPLY);
        deposit(&mut f, user, exact);
        assert_eq!(f.vault.total_pending(), exact);
    }

    #[test]
    fn test_deposit_over_cap_reverts() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);
        let cap = U256::from(MINIMUM_SUPPLY * 10);

        f.env.set_caller(owner);
        f.vault.set_cap(cap);

        let amount = cap + U256::one();
        fund_pool_tokens(&mut f, user, amount);
        f.env.set_caller(user);
        f.pool.approve(*f.vault.address(), amount);
        assert_eq!(f.vault.try_deposit(amount), Err(VaultError::ExceedCap.into()));
    }

    #[test]
    fn test_deposit_to_disabled_vault_reverts() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        f.env.set_caller(owner);
        f.vault.disable_vault();

        fund_pool_tokens(&mut f, user, amount);
        f.env.set_caller(user);
        f.pool.approve(*f.vault.address(), amount);
        assert_eq!(
            f.vault.try_deposit(amount),
            Err(VaultError::VaultDisabled.into())
        );
    }

    #[test]
    fn test_cannot_disable_with_locked_collateral() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);
        assert_eq!(locked, amount);

        f.env.set_caller(owner);
        assert_eq!(
            f.vault.try_disable_vault(),
            Err(VaultError::LockedAmountNonZero.into())
        );

        settle_round(&mut f, locked);
        f.env.set_caller(owner);
        f.vault.disable_vault();
        assert!(f.vault.is_disabled());
    }

    #[test]
    fn test_withdraw_instantly() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_withdraw_instantly(U256::zero()),
            Err(VaultError::InvalidAmount.into())
        );
        assert_eq!(
            f.vault.try_withdraw_instantly(amount + U256::one()),
            Err(VaultError::ExceedAmount.into())
        );

        f.vault.withdraw_instantly(amount);
        assert_eq!(f.pool.balance_of(user), amount);
        assert_eq!(f.vault.total_pending(), U256::zero());

        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.amount, U256::zero());
    }

    #[test]
    fn test_withdraw_instantly_rejects_priced_receipt() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_withdraw_instantly(amount),
            Err(VaultError::InvalidRound.into())
        );
    }

    #[test]
    fn test_redeem_rejects_zero_and_excess() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_redeem(U256::zero()),
            Err(VaultError::InvalidShareCount.into())
        );
        assert_eq!(
            f.vault.try_redeem(amount + U256::one()),
            Err(VaultError::ExceedsAvailable.into())
        );
    }

    #[test]
    fn test_redeem_decreases_unredeemed_shares() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.redeem(U256::one());

        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.amount, U256::zero());
        assert_eq!(receipt.unredeemed_shares, amount - U256::one());
        assert_eq!(f.vault.balance_of(user), U256::one());

        f.vault.redeem(amount - U256::one());
        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.unredeemed_shares, U256::zero());
        assert_eq!(f.vault.balance_of(user), amount);
    }

    #[test]
    fn test_max_redeem_moves_all_shares() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.max_redeem();

        assert_eq!(f.vault.balance_of(user), amount);
        assert_eq!(f.vault.balance_of(*f.vault.address()), U256::zero());

        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 1);
        assert_eq!(receipt.amount, U256::zero());
        assert_eq!(receipt.unredeemed_shares, U256::zero());
    }

    #[test]
    fn test_max_redeem_is_idempotent() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.max_redeem();
        assert_eq!(f.vault.balance_of(user), amount);

        // second call moves nothing and emits nothing
        let events_before = f.env.events_count(f.vault.address());
        f.vault.max_redeem();
        assert_eq!(f.env.events_count(f.vault.address()), events_before);
        assert_eq!(f.vault.balance_of(user), amount);
        assert_eq!(f.vault.balance_of(*f.vault.address()), U256::zero());
    }

    #[test]
    fn test_max_redeem_after_second_round_deposit() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);
        settle_round(&mut f, U256::from(DEPOSIT_AMOUNT));

        // round 2 deposit realizes the round 1 shares lazily
        deposit(&mut f, user, amount);
        let receipt = f.vault.deposit_receipts(user);
        assert_eq!(receipt.round, 2);
        assert_eq!(receipt.amount, amount);
        assert_eq!(receipt.unredeemed_shares, amount);

        f.env.set_caller(user);
        f.vault.max_redeem();
        assert_eq!(f.vault.balance_of(user), amount);
    }

    #[test]
    fn test_share_conservation() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let user2 = f.env.get_account(3);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        deposit(&mut f, user2, amount);
        let locked = roll(&mut f);

        let vault_address = *f.vault.address();
        let sum = f.vault.balance_of(user)
            + f.vault.balance_of(user2)
            + f.vault.balance_of(vault_address);
        assert_eq!(f.vault.total_supply(), sum);

        f.env.set_caller(user);
        f.vault.max_redeem();
        f.env.set_caller(user2);
        f.vault.redeem(U256::from(7u64));

        let sum = f.vault.balance_of(user)
            + f.vault.balance_of(user2)
            + f.vault.balance_of(vault_address);
        assert_eq!(f.vault.total_supply(), sum);

        settle_round(&mut f, locked);
        f.env.set_caller(user);
        f.vault.initiate_withdraw(amount / 2);

        let sum = f.vault.balance_of(user)
            + f.vault.balance_of(user2)
            + f.vault.balance_of(vault_address);
        assert_eq!(f.vault.total_supply(), sum);
    }

    #[test]
    fn test_round_monotonicity() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        assert_eq!(f.vault.vault_state().round, 1);

        let locked = roll(&mut f);
        assert_eq!(f.vault.vault_state().round, 2);

        settle_round(&mut f, locked);
        roll(&mut f);
        assert_eq!(f.vault.vault_state().round, 3);
    }

    #[test]
    fn test_roll_requires_keeper() {
        let mut f = setup();
        let user = f.env.get_account(2);
        deposit(&mut f, user, U256::from(DEPOSIT_AMOUNT));

        f.env.set_caller(user);
        let target = sink(&f);
        assert_eq!(
            f.vault.try_roll_round(target),
            Err(VaultError::NotKeeper.into())
        );
        assert_eq!(f.vault.try_close_round(), Err(VaultError::NotKeeper.into()));
    }

    #[test]
    fn test_first_roll_charges_no_fees() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let balance_before = f.vault.total_balance();

        let locked = roll(&mut f);

        assert_eq!(locked, amount);
        assert_eq!(f.vault.total_balance(), balance_before);
        assert_eq!(f.vault.round_price_per_share(1), U256::from(NAV_SCALE));
        assert_eq!(f.vault.account_vault_balance(user), amount);
    }

    #[test]
    fn test_fee_formula_on_profitable_round() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);

        // settlement returns the collateral plus a 5% premium
        let premium = amount / 20;
        f.env.set_caller(f.env.get_account(0));
        f.token.mint(sink(&f), premium);
        f.env.set_caller(sink(&f));
        f.token.approve(*f.pool.address(), premium);
        f.pool.deposit(*f.token.address(), premium);
        settle_round(&mut f, locked + premium);

        let state = f.vault.vault_state();
        let balance_before = f.vault.total_balance();
        let pending = f.vault.total_pending();
        let last_queued = f.vault.last_queued_withdraw_amount();

        roll(&mut f);

        let fee_base = balance_before - last_queued - pending;
        let expected_management = fee_base * f.vault.management_fee() / U256::from(FEE_DIVISOR);
        let expected_performance = (fee_base - state.last_locked_amount)
            * f.vault.performance_fee()
            / U256::from(FEE_DIVISOR);
        let expected_fees = expected_management + expected_performance;

        assert!(expected_performance > U256::zero());
        assert_eq!(balance_before - f.vault.total_balance(), expected_fees);
    }

    #[test]
    fn test_performance_fee_zero_on_losing_round() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);

        // settlement keeps 10% of the collateral
        settle_round(&mut f, locked - locked / 10);

        let state = f.vault.vault_state();
        let balance_before = f.vault.total_balance();
        assert!(balance_before < state.last_locked_amount);

        roll(&mut f);

        // only the management fee is charged on a loss
        let expected_management =
            balance_before * f.vault.management_fee() / U256::from(FEE_DIVISOR);
        assert_eq!(balance_before - f.vault.total_balance(), expected_management);
    }

    #[test]
    fn test_account_balance_through_loss() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let user2 = f.env.get_account(3);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);
        assert_eq!(f.vault.account_vault_balance(user), amount);

        // a later depositor does not move the first account's balance
        deposit(&mut f, user2, amount);
        assert_eq!(f.vault.account_vault_balance(user), amount);

        // the position settles in the money: collateral comes back short
        settle_round(&mut f, locked - locked / 10);
        roll(&mut f);

        assert!(f.vault.account_vault_balance(user) < amount);
        // the round 2 depositor is priced at the post-loss share price
        let pps2 = f.vault.round_price_per_share(2);
        assert!(pps2 < U256::from(NAV_SCALE));
        let expected_shares = amount * SafeMath::pow10(18) / pps2;
        assert_eq!(f.vault.shares(user2), expected_shares);
    }

    #[test]
    fn test_initiate_withdraw_rejects_zero_shares() {
        let mut f = setup();
        let user = f.env.get_account(2);
        deposit(&mut f, user, U256::from(DEPOSIT_AMOUNT));
        roll(&mut f);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_initiate_withdraw(U256::zero()),
            Err(VaultError::InvalidShareCount.into())
        );
    }

    #[test]
    fn test_initiate_withdraw_without_deposit_reverts() {
        let mut f = setup();
        let user = f.env.get_account(2);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_initiate_withdraw(U256::from(DEPOSIT_AMOUNT)),
            Err(TokenError::InsufficientBalance.into())
        );
    }

    #[test]
    fn test_initiate_withdraw_from_unredeemed_shares() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.initiate_withdraw(amount);

        let withdrawal = f.vault.withdrawals(user);
        assert_eq!(withdrawal.round, 2);
        assert_eq!(withdrawal.shares, amount);
        // the full receipt was redeemed, then the shares were debited back
        assert_eq!(f.vault.balance_of(user), U256::zero());
        assert_eq!(f.vault.balance_of(*f.vault.address()), amount);
        assert_eq!(f.vault.vault_state().queued_withdraw_shares, amount);
    }

    #[test]
    fn test_initiate_withdraw_partial_redeem_then_debit() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.redeem(amount / 2);
        f.vault.initiate_withdraw(amount);

        assert_eq!(f.vault.balance_of(user), U256::zero());
        assert_eq!(f.vault.balance_of(*f.vault.address()), amount);

        let withdrawal = f.vault.withdrawals(user);
        assert_eq!(withdrawal.round, 2);
        assert_eq!(withdrawal.shares, amount);
    }

    #[test]
    fn test_initiate_withdraw_tops_up_same_round() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        f.vault.initiate_withdraw(amount / 2);
        f.vault.initiate_withdraw(amount / 2);

        let withdrawal = f.vault.withdrawals(user);
        assert_eq!(withdrawal.round, 2);
        assert_eq!(withdrawal.shares, amount);

        assert_eq!(
            f.vault.try_initiate_withdraw(U256::one()),
            Err(TokenError::InsufficientBalance.into())
        );
    }

    #[test]
    fn test_initiate_withdraw_across_rounds_reverts() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);

        f.env.set_caller(user);
        f.vault.initiate_withdraw(amount / 2);

        settle_round(&mut f, locked);
        roll(&mut f);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_initiate_withdraw(amount / 2),
            Err(VaultError::ExistingWithdraw.into())
        );
    }

    #[test]
    fn test_complete_withdraw_lifecycle() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        deposit(&mut f, owner, amount);
        let locked = roll(&mut f);

        f.env.set_caller(user);
        f.vault.initiate_withdraw(amount);

        // the owner never initiated
        f.env.set_caller(owner);
        assert_eq!(
            f.vault.try_complete_withdraw(),
            Err(VaultError::NotInitiated.into())
        );

        // the round is still open
        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_complete_withdraw(),
            Err(VaultError::RoundNotClosed.into())
        );

        settle_round(&mut f, locked);
        roll(&mut f);

        let price = f.vault.round_price_per_share(2);
        let expected = amount * price / SafeMath::pow10(18);
        let queued_before = f.vault.vault_state().queued_withdraw_shares;
        let last_queued_before = f.vault.last_queued_withdraw_amount();
        let pool_before = f.pool.balance_of(user);

        f.env.set_caller(user);
        f.vault.complete_withdraw();

        let withdrawal = f.vault.withdrawals(user);
        assert_eq!(withdrawal.shares, U256::zero());
        assert_eq!(withdrawal.round, 2);
        assert_eq!(
            f.vault.vault_state().queued_withdraw_shares,
            queued_before - amount
        );
        assert_eq!(
            f.vault.last_queued_withdraw_amount(),
            last_queued_before - expected
        );
        assert_eq!(f.pool.balance_of(user) - pool_before, expected);

        // paying out twice is impossible
        assert_eq!(
            f.vault.try_complete_withdraw(),
            Err(VaultError::NotInitiated.into())
        );
    }

    #[test]
    fn test_share_accessors_after_partial_redeem() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        roll(&mut f);

        f.env.set_caller(user);
        assert_eq!(f.vault.shares(user), amount);

        let (held, custodied) = f.vault.share_balances(user);
        assert_eq!(held, U256::zero());
        assert_eq!(custodied, amount);

        f.vault.redeem(U256::one());
        let (held, custodied) = f.vault.share_balances(user);
        assert_eq!(held, U256::one());
        assert_eq!(custodied, amount - U256::one());

        // transfers move ownership, shares() follows the balance
        f.vault.transfer(owner, U256::one());
        assert_eq!(f.vault.shares(user), amount - U256::one());
        assert_eq!(f.vault.shares(owner), U256::one());
    }

    #[test]
    fn test_set_cap_and_fees() {
        let mut f = setup();
        let owner = f.env.get_account(0);
        let user = f.env.get_account(2);

        f.env.set_caller(user);
        assert_eq!(
            f.vault.try_set_cap(U256::from(1u64)),
            Err(VaultError::NotOwner.into())
        );
        assert_eq!(
            f.vault.try_set_management_fee(U256::from(1u64)),
            Err(VaultError::NotOwner.into())
        );

        f.env.set_caller(owner);
        f.vault.set_cap(U256::from(777u64));
        assert_eq!(f.vault.cap(), U256::from(777u64));

        f.vault.set_management_fee(U256::from(1_000_000u64));
        assert_eq!(f.vault.management_fee(), U256::from(19_178u64));

        f.vault.set_performance_fee(U256::from(10_000_000u64));
        assert_eq!(f.vault.performance_fee(), U256::from(10_000_000u64));

        assert_eq!(
            f.vault.try_set_performance_fee(U256::from(100_000_000u64)),
            Err(VaultError::InvalidFee.into())
        );
    }

    #[test]
    fn test_round_price_is_fixed_retroactively() {
        let mut f = setup();
        let user = f.env.get_account(2);
        let amount = U256::from(DEPOSIT_AMOUNT);

        deposit(&mut f, user, amount);
        let locked = roll(&mut f);
        let price_round_1 = f.vault.round_price_per_share(1);
        assert_eq!(price_round_1, U256::from(NAV_SCALE));

        // later rounds never touch an already-priced round
        settle_round(&mut f, locked - locked / 10);
        roll(&mut f);
        assert_eq!(f.vault.round_price_per_share(1), price_round_1);
        assert!(f.vault.round_price_per_share(2) < price_round_1);
    }
}
