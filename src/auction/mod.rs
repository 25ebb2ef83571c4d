//! Batch auction and option settlement: the opaque settlement provider
//! the vaults lock collateral into

pub mod errors;
pub mod events;
pub mod settlement_house;

pub use errors::AuctionError;
pub use settlement_house::SettlementHouse;
