#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
extern crate alloc;

// Shared modules
pub mod errors;
pub mod events;
pub mod math;
pub mod token;

// External collaborators: spot/expiry prices and NAV
pub mod oracle;
pub mod pool;

// Round accounting ledger (one per collateral pool)
pub mod vault;

// Option lifecycle: commit/roll state machine, strike selection, pricing
pub mod lifecycle;

// Batch auction and expiry settlement
pub mod auction;
