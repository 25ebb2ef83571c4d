//! Shared error definitions for the theta vault contracts
use odra::prelude::*;

/// Errors raised by the pure math helpers.
///
/// Entrypoints surface these by reverting the whole call, so a failed
/// conversion never leaves partial state behind.
#[odra::odra_error]
pub enum MathError {
    /// Arithmetic overflow
    Overflow = 1,

    /// Arithmetic underflow
    Underflow = 2,

    /// Division by zero
    DivisionByZero = 3,
}

/// Errors raised by the fungible token surface (assets, pool tokens
/// and vault shares all expose the same CEP-18 style interface).
#[odra::odra_error]
pub enum TokenError {
    /// Insufficient allowance for transfer_from
    InsufficientAllowance = 500,

    /// Insufficient balance for transfer or burn
    InsufficientBalance = 501,

    /// Caller is not allowed to mint
    NotMinter = 502,
}
