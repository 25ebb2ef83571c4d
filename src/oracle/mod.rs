//! Price oracle consumed for collateral valuation, premium conversion
//! and option settlement

pub mod price_oracle;

pub use price_oracle::{OracleError, PriceOracle};
