//! Event definitions for the settlement house
use odra::prelude::*;
use odra::casper_types::U256;
use odra::prelude::Address;

/// Event emitted when options are minted and put up for auction
#[odra::event]
pub struct AuctionStarted {
    /// Auction id
    pub auction_id: u64,
    /// Option sold in the auction
    pub option_id: u64,
    /// Options minted into the auction (8 decimals)
    pub options_minted: U256,
    /// Token bids are paid in
    pub bidding_token: Address,
    /// Auction end timestamp
    pub auction_end: u64,
    /// Minimum price per whole option, in the bidding token
    pub min_price: U256,
}

/// Event emitted when a sell order is placed
#[odra::event]
pub struct OrderPlaced {
    /// Auction id
    pub auction_id: u64,
    /// Bidder escrowing the bid
    pub bidder: Address,
    /// Options requested (8 decimals)
    pub options_requested: U256,
    /// Bid escrowed, in the bidding token
    pub bid_amount: U256,
}

/// Event emitted when an auction is settled
#[odra::event]
pub struct AuctionSettled {
    /// Auction id
    pub auction_id: u64,
    /// Options sold (8 decimals)
    pub options_sold: U256,
    /// Net proceeds paid to the seller
    pub proceeds: U256,
}

/// Event emitted when an expired position is settled against the
/// oracle's expiry price
#[odra::event]
pub struct PositionSettled {
    /// Option id
    pub option_id: u64,
    /// Oracle expiry price used for settlement
    pub expiry_price: U256,
    /// Options outstanding at settlement (8 decimals)
    pub settled_supply: U256,
}

/// Event emitted when unsold options are burned before expiry
#[odra::event]
pub struct UnsoldBurned {
    /// Option id
    pub option_id: u64,
    /// Options burned (8 decimals)
    pub burned: U256,
}

/// Event emitted when an option holder redeems a settlement payout
#[odra::event]
pub struct PayoutRedeemed {
    /// Option id
    pub option_id: u64,
    /// Holder redeeming
    pub holder: Address,
    /// Options redeemed (8 decimals)
    pub options: U256,
}
