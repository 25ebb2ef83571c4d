//! Error definitions for the settlement house
use odra::prelude::*;

/// Custom errors for option minting, auctions and settlement
#[odra::odra_error]
pub enum AuctionError {
    /// Argument lists differ in length
    LengthMismatch = 300,

    /// Option series already expired when minted
    SeriesExpired = 301,

    /// No auction with that id
    UnknownAuction = 302,

    /// Auction already past its end time
    AuctionClosed = 303,

    /// Auction has not ended yet
    AuctionNotEnded = 304,

    /// Auction already settled
    AlreadySettled = 305,

    /// Bid prices an option below the auction minimum
    BidTooLow = 306,

    /// Bid below the minimum bidding amount per order
    BidBelowMinimum = 307,

    /// Caller does not own the position
    Unauthorized = 308,

    /// No position with that option id
    UnknownPosition = 309,

    /// Option has not expired yet
    OptionNotExpired = 310,

    /// Position already settled
    PositionAlreadySettled = 311,

    /// No unsold options left to burn
    NothingToBurn = 312,

    /// Caller holds no settled options to redeem
    NoPayout = 313,

    /// A position already exists for this option id
    PositionExists = 314,

    /// Fee numerator not below the denominator
    InvalidFee = 315,
}
