//! Content-addressed option identities
//!
//! Option series are never deployed anywhere; an option's identity is a
//! pure function of its parameters, so next week's option can be
//! pre-registered before any collateral moves.

use odra::prelude::*;
use odra::casper_types::bytesrepr::ToBytes;
use odra::casper_types::U256;

/// Identity of an option series. Never zero.
pub type OptionId = u64;

/// Parameters that define one option series
#[odra::odra_type]
pub struct OptionSeries {
    /// Underlying asset the option is written on
    pub underlying: Address,
    /// Asset the strike is denominated in
    pub strike_asset: Address,
    /// Collateral pools backing the option, in sub-vault order
    pub collaterals: Vec<Address>,
    /// Per-collateral constraints (zero = unconstrained)
    pub constraints: Vec<U256>,
    /// Strike price (8 decimals)
    pub strike_price: U256,
    /// Expiry timestamp
    pub expiry: u64,
    /// Put or call
    pub is_put: bool,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Fnv1a(FNV_OFFSET)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// Computes the deterministic identity of an option series.
///
/// The same parameters always map to the same id, so the id a series
/// was pre-registered under matches the id it is later minted under.
pub fn target_option_id(series: &OptionSeries) -> OptionId {
    let mut hasher = Fnv1a::new();
    hasher.write(&series.underlying.to_bytes().unwrap_or_default());
    hasher.write(&series.strike_asset.to_bytes().unwrap_or_default());
    for collateral in &series.collaterals {
        hasher.write(&collateral.to_bytes().unwrap_or_default());
    }
    for constraint in &series.constraints {
        hasher.write(&constraint.to_bytes().unwrap_or_default());
    }
    hasher.write(&series.strike_price.to_bytes().unwrap_or_default());
    hasher.write(&series.expiry.to_le_bytes());
    hasher.write(&[u8::from(series.is_put)]);

    // 0 is reserved as the "no option" sentinel
    if hasher.0 == 0 {
        1
    } else {
        hasher.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odra::host::HostEnv;

    fn series(env: &HostEnv, strike: u64, expiry: u64) -> OptionSeries {
        OptionSeries {
            underlying: env.get_account(1),
            strike_asset: env.get_account(2),
            collaterals: vec![env.get_account(3)],
            constraints: vec![U256::zero()],
            strike_price: U256::from(strike),
            expiry,
            is_put: false,
        }
    }

    #[test]
    fn test_identity_is_deterministic() {
        let env = odra_test::env();
        let a = series(&env, 250_000_000_000, 115_200);
        let b = series(&env, 250_000_000_000, 115_200);
        assert_eq!(target_option_id(&a), target_option_id(&b));
        assert_ne!(target_option_id(&a), 0);
    }

    #[test]
    fn test_identity_depends_on_parameters() {
        let env = odra_test::env();
        let base = series(&env, 250_000_000_000, 115_200);
        let other_strike = series(&env, 260_000_000_000, 115_200);
        let other_expiry = series(&env, 250_000_000_000, 115_200 + 604_800);
        let mut put = series(&env, 250_000_000_000, 115_200);
        put.is_put = true;

        assert_ne!(target_option_id(&base), target_option_id(&other_strike));
        assert_ne!(target_option_id(&base), target_option_id(&other_expiry));
        assert_ne!(target_option_id(&base), target_option_id(&put));
    }
}
