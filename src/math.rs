//! Mathematical utilities for the theta vault contracts
//! Implements safe math, share pricing, fee accrual and the option calendar
use odra::casper_types::U256;
use crate::errors::MathError;

/// Fixed-point scale for fee rates (6 decimals)
pub const FEE_SCALING: u128 = 1_000_000;

/// Weeks per year as an integer ratio against FEE_SCALING (52.142857)
pub const WEEKS_PER_YEAR: u128 = 52_142_857;

/// Divisor applied when charging a fee rate (100% * FEE_SCALING)
pub const FEE_DIVISOR: u128 = 100 * FEE_SCALING;

/// Fixed-point scale of a collateral pool's price per share (18 decimals)
pub const NAV_SCALE: u128 = 1_000_000_000_000_000_000;

/// Fixed-point scale of oracle prices and strikes (8 decimals)
pub const PRICE_SCALE: u128 = 100_000_000;

/// Decimals of a minted option token
pub const OPTION_DECIMALS: u8 = 8;

/// Seconds in one week
pub const SECONDS_PER_WEEK: u64 = 604_800;

/// Seconds in one (non-leap) year
pub const SECONDS_PER_YEAR: u64 = 31_536_000;

/// Offset of the first Friday 08:00 UTC after the epoch (1970-01-02 08:00)
pub const FRIDAY_8AM_OFFSET: u64 = 115_200;

/// Safe math operations for U256
pub struct SafeMath;

impl SafeMath {
    /// Safe addition with overflow check
    pub fn add(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_add(b).ok_or(MathError::Overflow)
    }

    /// Safe subtraction with underflow check
    pub fn sub(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_sub(b).ok_or(MathError::Underflow)
    }

    /// Safe multiplication with overflow check
    pub fn mul(a: U256, b: U256) -> Result<U256, MathError> {
        a.checked_mul(b).ok_or(MathError::Overflow)
    }

    /// Safe division with zero check
    pub fn div(a: U256, b: U256) -> Result<U256, MathError> {
        if b.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(a / b)
    }

    /// Subtraction clamped at zero
    pub fn sub_or_zero(a: U256, b: U256) -> U256 {
        if a > b { a - b } else { U256::zero() }
    }

    /// Calculate square root using Newton's method (Babylonian method)
    pub fn sqrt(y: U256) -> U256 {
        if y > U256::from(3) {
            let mut z = y;
            let mut x = y / 2 + 1;
            while x < z {
                z = x;
                x = (y / x + x) / 2;
            }
            z
        } else if !y.is_zero() {
            U256::one()
        } else {
            U256::zero()
        }
    }

    /// Returns the minimum of two U256 values
    pub fn min(a: U256, b: U256) -> U256 {
        if a < b { a } else { b }
    }

    /// 10^decimals
    pub fn pow10(decimals: u8) -> U256 {
        U256::from(10).pow(U256::from(decimals))
    }
}

/// Share accounting: conversions between assets and vault shares at a
/// round's fixed price per share
pub struct ShareMath;

impl ShareMath {
    /// Price per share given the current supply and balance.
    ///
    /// Pending deposits have not been priced yet, so they are excluded
    /// from the balance. An empty vault prices one share at one asset
    /// unit (10^decimals / 10^decimals).
    pub fn price_per_share(
        supply: U256,
        balance: U256,
        pending: U256,
        decimals: u8,
    ) -> Result<U256, MathError> {
        let single = SafeMath::pow10(decimals);
        if supply.is_zero() {
            return Ok(single);
        }
        let priced = SafeMath::sub(balance, pending)?;
        SafeMath::div(SafeMath::mul(priced, single)?, supply)
    }

    /// shares = amount * 10^decimals / price_per_share
    pub fn asset_to_shares(
        amount: U256,
        price_per_share: U256,
        decimals: u8,
    ) -> Result<U256, MathError> {
        SafeMath::div(SafeMath::mul(amount, SafeMath::pow10(decimals))?, price_per_share)
    }

    /// amount = shares * price_per_share / 10^decimals
    pub fn shares_to_asset(
        shares: U256,
        price_per_share: U256,
        decimals: u8,
    ) -> Result<U256, MathError> {
        SafeMath::div(SafeMath::mul(shares, price_per_share)?, SafeMath::pow10(decimals))
    }
}

/// Management and performance fee accrual for one round
pub struct FeeMath;

impl FeeMath {
    /// Converts a 6-decimal annual management fee rate into the weekly
    /// rate charged at every roll: annual * FEE_SCALING / WEEKS_PER_YEAR
    pub fn weekly_management_rate(annual_rate: U256) -> Result<U256, MathError> {
        SafeMath::div(
            SafeMath::mul(annual_rate, U256::from(FEE_SCALING))?,
            U256::from(WEEKS_PER_YEAR),
        )
    }

    /// base * rate / (100 * FEE_SCALING)
    pub fn apply_rate(base: U256, rate: U256) -> Result<U256, MathError> {
        SafeMath::div(SafeMath::mul(base, rate)?, U256::from(FEE_DIVISOR))
    }

    /// Fees charged when a round is priced.
    ///
    /// The fee base excludes the amount already owed to queued
    /// withdrawals (priced in an earlier round) and the deposits still
    /// pending for the upcoming round. The performance fee only applies
    /// to growth beyond the previous round's locked amount and is zero
    /// on a losing round.
    ///
    /// Returns (management_fee, performance_fee) in asset units.
    pub fn round_fees(
        current_balance: U256,
        last_queued_withdraw_amount: U256,
        total_pending: U256,
        last_locked_amount: U256,
        management_rate: U256,
        performance_rate: U256,
    ) -> Result<(U256, U256), MathError> {
        let fee_balance = SafeMath::sub_or_zero(current_balance, last_queued_withdraw_amount);
        let locked_sans_pending = SafeMath::sub_or_zero(fee_balance, total_pending);

        let management_fee = Self::apply_rate(locked_sans_pending, management_rate)?;

        let growth = SafeMath::sub_or_zero(locked_sans_pending, last_locked_amount);
        let performance_fee = Self::apply_rate(growth, performance_rate)?;

        Ok((management_fee, performance_fee))
    }
}

/// Conversions between raw pool tokens, the vault's accounting unit and
/// foreign assets priced by the oracle
pub struct AssetConvert;

impl AssetConvert {
    /// Values pool tokens in the accounting unit at the pool's NAV
    pub fn pool_tokens_to_value(tokens: U256, price_per_share: U256) -> Result<U256, MathError> {
        SafeMath::div(SafeMath::mul(tokens, price_per_share)?, U256::from(NAV_SCALE))
    }

    /// Converts an accounting-unit value back into pool tokens
    pub fn value_to_pool_tokens(value: U256, price_per_share: U256) -> Result<U256, MathError> {
        SafeMath::div(SafeMath::mul(value, U256::from(NAV_SCALE))?, price_per_share)
    }

    /// Rescales an amount of `token_in` into `token_out` using their
    /// oracle prices and decimals.
    ///
    /// Multiplies before dividing when the source has at least as many
    /// decimals as the target, otherwise divides after scaling up, so
    /// neither precision nor headroom is lost.
    pub fn convert_with_prices(
        amount: U256,
        in_price: U256,
        out_price: U256,
        in_decimals: u8,
        out_decimals: u8,
    ) -> Result<U256, MathError> {
        let value = SafeMath::mul(amount, in_price)?;
        if in_decimals > out_decimals {
            let shift = SafeMath::pow10(in_decimals - out_decimals);
            SafeMath::div(SafeMath::div(value, out_price)?, shift)
        } else {
            let shift = SafeMath::pow10(out_decimals - in_decimals);
            SafeMath::div(SafeMath::mul(value, shift)?, out_price)
        }
    }
}

/// The option calendar: weekly expiries at Friday 08:00 UTC
pub struct Calendar;

impl Calendar {
    /// The next Friday 08:00 UTC strictly after `now`
    pub fn next_friday_expiry(now: u64) -> u64 {
        let base = (now / SECONDS_PER_WEEK) * SECONDS_PER_WEEK + FRIDAY_8AM_OFFSET;
        if base > now {
            base
        } else {
            base + SECONDS_PER_WEEK
        }
    }

    /// The Friday 08:00 UTC one week after `expiry`
    pub fn following_friday_expiry(expiry: u64) -> u64 {
        expiry + SECONDS_PER_WEEK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqrt() {
        assert_eq!(SafeMath::sqrt(U256::from(0)), U256::from(0));
        assert_eq!(SafeMath::sqrt(U256::from(1)), U256::from(1));
        assert_eq!(SafeMath::sqrt(U256::from(4)), U256::from(2));
        assert_eq!(SafeMath::sqrt(U256::from(9)), U256::from(3));
        assert_eq!(SafeMath::sqrt(U256::from(100)), U256::from(10));
    }

    #[test]
    fn test_price_per_share_empty_vault() {
        let pps = ShareMath::price_per_share(U256::zero(), U256::zero(), U256::zero(), 18).unwrap();
        assert_eq!(pps, SafeMath::pow10(18));
    }

    #[test]
    fn test_price_per_share_excludes_pending() {
        // 1000 shares backing 1100 of balance, of which 100 is pending
        let pps = ShareMath::price_per_share(
            U256::from(1000u64),
            U256::from(1100u64),
            U256::from(100u64),
            3,
        )
        .unwrap();
        assert_eq!(pps, U256::from(1000u64));
    }

    #[test]
    fn test_share_asset_round_trip_at_par() {
        let pps = SafeMath::pow10(18);
        let amount = U256::from(100_000_000_000u64);
        let shares = ShareMath::asset_to_shares(amount, pps, 18).unwrap();
        assert_eq!(shares, amount);
        assert_eq!(ShareMath::shares_to_asset(shares, pps, 18).unwrap(), amount);
    }

    #[test]
    fn test_weekly_management_rate() {
        // 2% annual (6 decimals) spread over 52.142857 weeks
        let weekly = FeeMath::weekly_management_rate(U256::from(2_000_000u64)).unwrap();
        assert_eq!(weekly, U256::from(38_356u64));
    }

    #[test]
    fn test_round_fees_on_growth() {
        // balance grew from 1_000_000 to 1_100_000, no pending, no queue
        let (management, performance) = FeeMath::round_fees(
            U256::from(1_100_000u64),
            U256::zero(),
            U256::zero(),
            U256::from(1_000_000u64),
            U256::from(38_356u64),
            U256::from(20_000_000u64),
        )
        .unwrap();
        assert_eq!(management, U256::from(1_100_000u64) * 38_356u64 / 100_000_000u64);
        assert_eq!(performance, U256::from(100_000u64) * 20_000_000u64 / 100_000_000u64);
    }

    #[test]
    fn test_performance_fee_zero_on_loss() {
        let (_, performance) = FeeMath::round_fees(
            U256::from(900_000u64),
            U256::zero(),
            U256::zero(),
            U256::from(1_000_000u64),
            U256::from(38_356u64),
            U256::from(20_000_000u64),
        )
        .unwrap();
        assert_eq!(performance, U256::zero());
    }

    #[test]
    fn test_round_fees_excludes_pending_and_queued() {
        let (management, _) = FeeMath::round_fees(
            U256::from(1_000_000u64),
            U256::from(200_000u64),
            U256::from(800_000u64),
            U256::zero(),
            U256::from(38_356u64),
            U256::from(20_000_000u64),
        )
        .unwrap();
        // fee base collapses to zero: 1_000_000 - 200_000 - 800_000
        assert_eq!(management, U256::zero());
    }

    #[test]
    fn test_convert_with_prices_shrinking_decimals() {
        // 1.0 of an 18-decimal asset at price 2000e8 into a 6-decimal
        // asset priced 1e8 -> 2000.0
        let out = AssetConvert::convert_with_prices(
            U256::from(NAV_SCALE),
            U256::from(200_000_000_000u64),
            U256::from(100_000_000u64),
            18,
            6,
        )
        .unwrap();
        assert_eq!(out, U256::from(2_000_000_000u64));
    }

    #[test]
    fn test_convert_with_prices_growing_decimals() {
        // 2000.0 of a 6-decimal asset at 1e8 into an 18-decimal asset
        // priced 2000e8 -> 1.0
        let out = AssetConvert::convert_with_prices(
            U256::from(2_000_000_000u64),
            U256::from(100_000_000u64),
            U256::from(200_000_000_000u64),
            6,
            18,
        )
        .unwrap();
        assert_eq!(out, U256::from(NAV_SCALE));
    }

    #[test]
    fn test_pool_token_valuation() {
        let pps = U256::from(NAV_SCALE) * 11u64 / 10u64; // 1.1
        let tokens = U256::from(1_000_000_000_000u64);
        let value = AssetConvert::pool_tokens_to_value(tokens, pps).unwrap();
        assert_eq!(value, U256::from(1_100_000_000_000u64));
        assert_eq!(AssetConvert::value_to_pool_tokens(value, pps).unwrap(), tokens);
    }

    #[test]
    fn test_next_friday_expiry() {
        // epoch is a Thursday; the first Friday 08:00 is 115_200
        assert_eq!(Calendar::next_friday_expiry(0), FRIDAY_8AM_OFFSET);
        // strictly after: exactly at expiry rolls to the next week
        assert_eq!(
            Calendar::next_friday_expiry(FRIDAY_8AM_OFFSET),
            FRIDAY_8AM_OFFSET + SECONDS_PER_WEEK
        );
        // any timestamp maps onto the weekly grid
        let expiry = Calendar::next_friday_expiry(1_650_000_000);
        assert_eq!((expiry - FRIDAY_8AM_OFFSET) % SECONDS_PER_WEEK, 0);
        assert!(expiry > 1_650_000_000);
        assert!(expiry - 1_650_000_000 <= SECONDS_PER_WEEK);
    }
}
