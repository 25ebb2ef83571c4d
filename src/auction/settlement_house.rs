//! Settlement House - mints options against locked collateral, sells
//! them through a batch auction and settles expired positions
//!
//! The vaults treat this module as an opaque settlement provider: they
//! ship collateral in, receive auction proceeds and get the surviving
//! collateral back after expiry. Bid matching is atomic at settlement.

use odra::prelude::*;
use odra::casper_types::U256;
use odra::ContractRef;
use super::errors::AuctionError;
use super::events::*;
use crate::lifecycle::option_registry::{target_option_id, OptionId, OptionSeries};
use crate::math::{AssetConvert, SafeMath, NAV_SCALE, PRICE_SCALE};
use crate::oracle::price_oracle::PriceOracleContractRef;
use crate::pool::collateral_pool::CollateralPoolContractRef;
use crate::token::FungibleTokenContractRef;

/// Denominator of the auction fee ratio
pub const FEE_DENOMINATOR: u64 = 1000;

/// Collateral difference between option decimals (8) and pool decimals (18)
const OPTION_COLLATERAL_SHIFT: u128 = 10_000_000_000;

/// One collateralized option position
#[odra::odra_type]
pub struct Position {
    /// Vault that opened the position
    pub owner: Address,
    /// The option series backing the position
    pub series: OptionSeries,
    /// Collateral vaults the collateral returns to, positionally
    pub vaults: Vec<Address>,
    /// Collateral pools, positionally
    pub pools: Vec<Address>,
    /// Collateral held per pool, in pool tokens
    pub amounts: Vec<U256>,
    /// Options minted against the collateral (8 decimals)
    pub total_minted: U256,
    /// Options still unsold (8 decimals)
    pub unsold: U256,
    /// Whether the position has been settled after expiry
    pub settled: bool,
    /// Expiry price the position settled at
    pub expiry_price: U256,
    /// Options outstanding at settlement
    pub settled_supply: U256,
    /// Collateral withheld for option holders, positionally
    pub payout_amounts: Vec<U256>,
}

/// One batch auction
#[odra::odra_type]
pub struct AuctionData {
    /// Option being sold
    pub option_id: u64,
    /// Token bids are paid in
    pub bidding_token: Address,
    /// Auction end timestamp
    pub auction_end: u64,
    /// Minimum bid per order, in the bidding token
    pub min_bid_per_order: U256,
    /// Minimum price per whole option, in the bidding token
    pub min_price_per_option: U256,
    /// Recipient of the proceeds
    pub seller: Address,
    /// Whether the auction has been settled
    pub settled: bool,
    /// Options sold at settlement
    pub sold: U256,
    /// Net proceeds at settlement
    pub proceeds: U256,
}

/// A bidder's escrowed sell order
#[odra::odra_type]
pub struct SellOrder {
    /// Bidder
    pub bidder: Address,
    /// Options requested (8 decimals)
    pub options_requested: U256,
    /// Bid escrowed, in the bidding token
    pub bid_amount: U256,
}

/// Settlement House contract
#[odra::module]
pub struct SettlementHouse {
    /// Oracle supplying expiry prices
    oracle: Var<Address>,
    /// Auction fee numerator (against FEE_DENOMINATOR)
    fee_numerator: Var<U256>,
    /// Running auction counter
    auction_counter: Var<u64>,
    /// Auctions by id
    auctions: Mapping<u64, AuctionData>,
    /// Sell orders per auction, in placement order
    orders: Mapping<(u64, u32), SellOrder>,
    /// Order count per auction
    order_counts: Mapping<u64, u32>,
    /// Positions by option id
    positions: Mapping<u64, Position>,
    /// Option token balances per (option, holder)
    option_balances: Mapping<(u64, Address), U256>,
    /// Admin collecting auction fees
    admin: Var<Address>,
}

#[odra::module]
impl SettlementHouse {
    /// Initialize the settlement house
    pub fn init(&mut self, oracle: Address, fee_numerator: U256) {
        if fee_numerator >= U256::from(FEE_DENOMINATOR) {
            self.env().revert(AuctionError::InvalidFee);
        }
        let caller = self.env().caller();
        self.oracle.set(oracle);
        self.fee_numerator.set(fee_numerator);
        self.auction_counter.set(0);
        self.admin.set(caller);
    }

    /// Mint options against collateral the caller has already shipped
    /// in and open a batch auction for them.
    ///
    /// Returns (option_id, auction_id).
    #[allow(clippy::too_many_arguments)]
    pub fn mint_and_auction(
        &mut self,
        series: OptionSeries,
        vaults: Vec<Address>,
        pools: Vec<Address>,
        amounts: Vec<U256>,
        premium: U256,
        bidding_token: Address,
        duration: u64,
    ) -> (u64, u64) {
        if vaults.len() != pools.len() || vaults.len() != amounts.len() {
            self.env().revert(AuctionError::LengthMismatch);
        }
        let now = self.env().get_block_time();
        if series.expiry <= now {
            self.env().revert(AuctionError::SeriesExpired);
        }

        let option_id = target_option_id(&series);
        if self.positions.get(&option_id).is_some() {
            self.env().revert(AuctionError::PositionExists);
        }

        // value the shipped collateral and mint 8-decimal options 1:1
        let mut total_value = U256::zero();
        for (i, pool_address) in pools.iter().enumerate() {
            let pool = CollateralPoolContractRef::new(self.env(), *pool_address);
            let value = AssetConvert::pool_tokens_to_value(amounts[i], pool.price_per_share())
                .unwrap_or_else(|err| self.env().revert(err));
            total_value = total_value + value;
        }
        let minted = total_value / U256::from(OPTION_COLLATERAL_SHIFT);

        let caller = self.env().caller();
        let position = Position {
            owner: caller,
            series,
            vaults,
            pools,
            amounts,
            total_minted: minted,
            unsold: minted,
            settled: false,
            expiry_price: U256::zero(),
            settled_supply: U256::zero(),
            payout_amounts: Vec::new(),
        };
        self.positions.set(&option_id, position);

        let auction_id = self.auction_counter.get_or_default() + 1;
        self.auction_counter.set(auction_id);
        let auction_end = now + duration;
        self.auctions.set(
            &auction_id,
            AuctionData {
                option_id,
                bidding_token,
                auction_end,
                min_bid_per_order: U256::one(),
                min_price_per_option: premium,
                seller: caller,
                settled: false,
                sold: U256::zero(),
                proceeds: U256::zero(),
            },
        );
        self.order_counts.set(&auction_id, 0);

        self.env().emit_event(AuctionStarted {
            auction_id,
            option_id,
            options_minted: minted,
            bidding_token,
            auction_end,
            min_price: premium,
        });

        (option_id, auction_id)
    }

    /// Escrow a bid for options in an open auction
    pub fn place_sell_orders(
        &mut self,
        auction_id: u64,
        options_requested: Vec<U256>,
        bid_amounts: Vec<U256>,
    ) {
        if options_requested.len() != bid_amounts.len() {
            self.env().revert(AuctionError::LengthMismatch);
        }
        let auction = self.get_auction(auction_id);
        let now = self.env().get_block_time();
        if auction.settled || now >= auction.auction_end {
            self.env().revert(AuctionError::AuctionClosed);
        }

        let caller = self.env().caller();
        let mut count = self.order_counts.get(&auction_id).unwrap_or_default();
        let mut total_bid = U256::zero();

        for (i, requested) in options_requested.iter().enumerate() {
            let bid = bid_amounts[i];
            if bid < auction.min_bid_per_order || requested.is_zero() {
                self.env().revert(AuctionError::BidBelowMinimum);
            }
            // price per whole option must clear the reserve
            let unit_price = SafeMath::div(
                SafeMath::mul(bid, U256::from(PRICE_SCALE))
                    .unwrap_or_else(|err| self.env().revert(err)),
                *requested,
            )
            .unwrap_or_else(|err| self.env().revert(err));
            if unit_price < auction.min_price_per_option {
                self.env().revert(AuctionError::BidTooLow);
            }

            self.orders.set(
                &(auction_id, count),
                SellOrder {
                    bidder: caller,
                    options_requested: *requested,
                    bid_amount: bid,
                },
            );
            count += 1;
            total_bid = total_bid + bid;

            self.env().emit_event(OrderPlaced {
                auction_id,
                bidder: caller,
                options_requested: *requested,
                bid_amount: bid,
            });
        }
        self.order_counts.set(&auction_id, count);

        let mut bidding = FungibleTokenContractRef::new(self.env(), auction.bidding_token);
        bidding.transfer_from(caller, Address::from(self.env().self_address()), total_bid);
    }

    /// Fill orders after the auction ends and pay the seller.
    ///
    /// Orders fill in placement order; a partially filled order pays
    /// pro rata and the remainder of its escrow is refunded.
    pub fn settle_auction(&mut self, auction_id: u64) -> U256 {
        let mut auction = self.get_auction(auction_id);
        let now = self.env().get_block_time();
        if now < auction.auction_end {
            self.env().revert(AuctionError::AuctionNotEnded);
        }
        if auction.settled {
            self.env().revert(AuctionError::AlreadySettled);
        }

        let mut position = self.get_position(auction.option_id);
        let mut remaining = position.unsold;
        let mut sold = U256::zero();
        let mut proceeds = U256::zero();
        let mut bidding = FungibleTokenContractRef::new(self.env(), auction.bidding_token);

        let count = self.order_counts.get(&auction_id).unwrap_or_default();
        for i in 0..count {
            let order = match self.orders.get(&(auction_id, i)) {
                Some(order) => order,
                None => continue,
            };
            if remaining.is_zero() {
                bidding.transfer(order.bidder, order.bid_amount);
                continue;
            }
            let fill = SafeMath::min(order.options_requested, remaining);
            let cost = if fill == order.options_requested {
                order.bid_amount
            } else {
                SafeMath::div(
                    SafeMath::mul(order.bid_amount, fill)
                        .unwrap_or_else(|err| self.env().revert(err)),
                    order.options_requested,
                )
                .unwrap_or_else(|err| self.env().revert(err))
            };
            let refund = order.bid_amount - cost;
            if !refund.is_zero() {
                bidding.transfer(order.bidder, refund);
            }

            let held = self
                .option_balances
                .get(&(auction.option_id, order.bidder))
                .unwrap_or_default();
            self.option_balances
                .set(&(auction.option_id, order.bidder), held + fill);

            remaining = remaining - fill;
            sold = sold + fill;
            proceeds = proceeds + cost;
        }

        position.unsold = remaining;
        self.positions.set(&auction.option_id, position);

        let fee = SafeMath::div(
            SafeMath::mul(proceeds, self.fee_numerator.get_or_default())
                .unwrap_or_else(|err| self.env().revert(err)),
            U256::from(FEE_DENOMINATOR),
        )
        .unwrap_or_else(|err| self.env().revert(err));
        let net = proceeds - fee;

        auction.settled = true;
        auction.sold = sold;
        auction.proceeds = net;
        let seller = auction.seller;
        self.auctions.set(&auction_id, auction);

        if !fee.is_zero() {
            let admin = self.admin.get_or_revert_with(AuctionError::Unauthorized);
            bidding.transfer(admin, fee);
        }
        if !net.is_zero() {
            bidding.transfer(seller, net);
        }

        self.env().emit_event(AuctionSettled {
            auction_id,
            options_sold: sold,
            proceeds: net,
        });

        net
    }

    /// Burn the position's unsold options and return the collateral
    /// fraction backing them. Position owner only, before expiry
    /// settlement.
    pub fn burn_unsold(&mut self, option_id: OptionId) -> Vec<U256> {
        let mut position = self.get_position(option_id);
        let caller = self.env().caller();
        if caller != position.owner {
            self.env().revert(AuctionError::Unauthorized);
        }
        if position.settled {
            self.env().revert(AuctionError::PositionAlreadySettled);
        }
        let unsold = position.unsold;
        if unsold.is_zero() {
            self.env().revert(AuctionError::NothingToBurn);
        }

        let total = position.total_minted;
        let mut returned = Vec::new();
        for i in 0..position.amounts.len() {
            let reclaim = SafeMath::div(
                SafeMath::mul(position.amounts[i], unsold)
                    .unwrap_or_else(|err| self.env().revert(err)),
                total,
            )
            .unwrap_or_else(|err| self.env().revert(err));
            position.amounts[i] = position.amounts[i] - reclaim;
            returned.push(reclaim);
        }
        position.total_minted = total - unsold;
        position.unsold = U256::zero();

        let vaults = position.vaults.clone();
        let pools = position.pools.clone();
        self.positions.set(&option_id, position);

        for (i, reclaim) in returned.iter().enumerate() {
            if !reclaim.is_zero() {
                let mut pool = CollateralPoolContractRef::new(self.env(), pools[i]);
                pool.transfer(vaults[i], *reclaim);
            }
        }

        self.env().emit_event(UnsoldBurned {
            option_id,
            burned: unsold,
        });

        returned
    }

    /// Settle an expired position against the oracle expiry price and
    /// return the surviving collateral to the vaults.
    ///
    /// The in-the-money fraction stays behind for option holders to
    /// redeem; everything else flows back positionally.
    pub fn settle_expired_position(&mut self, option_id: OptionId) -> Vec<U256> {
        let mut position = self.get_position(option_id);
        let now = self.env().get_block_time();
        if now <= position.series.expiry {
            self.env().revert(AuctionError::OptionNotExpired);
        }
        if position.settled {
            self.env().revert(AuctionError::PositionAlreadySettled);
        }

        let oracle_address = self.oracle.get_or_revert_with(AuctionError::Unauthorized);
        let oracle = PriceOracleContractRef::new(self.env(), oracle_address);
        let expiry_price =
            oracle.get_expiry_price(position.series.underlying, position.series.expiry);

        let strike = position.series.strike_price;
        // payout fraction of the sold collateral, 1e18 fixed point
        let fraction = if position.series.is_put {
            if expiry_price < strike {
                SafeMath::div(
                    SafeMath::mul(strike - expiry_price, U256::from(NAV_SCALE))
                        .unwrap_or_else(|err| self.env().revert(err)),
                    strike,
                )
                .unwrap_or_else(|err| self.env().revert(err))
            } else {
                U256::zero()
            }
        } else if expiry_price > strike {
            SafeMath::div(
                SafeMath::mul(expiry_price - strike, U256::from(NAV_SCALE))
                    .unwrap_or_else(|err| self.env().revert(err)),
                expiry_price,
            )
            .unwrap_or_else(|err| self.env().revert(err))
        } else {
            U256::zero()
        };

        let sold = position.total_minted - position.unsold;
        let mut returned = Vec::new();
        let mut payouts = Vec::new();
        for amount in position.amounts.iter() {
            let withheld = if sold.is_zero() || fraction.is_zero() {
                U256::zero()
            } else {
                let sold_backing = SafeMath::div(
                    SafeMath::mul(*amount, sold).unwrap_or_else(|err| self.env().revert(err)),
                    position.total_minted,
                )
                .unwrap_or_else(|err| self.env().revert(err));
                SafeMath::div(
                    SafeMath::mul(sold_backing, fraction)
                        .unwrap_or_else(|err| self.env().revert(err)),
                    U256::from(NAV_SCALE),
                )
                .unwrap_or_else(|err| self.env().revert(err))
            };
            returned.push(*amount - withheld);
            payouts.push(withheld);
        }

        position.settled = true;
        position.expiry_price = expiry_price;
        position.settled_supply = sold;
        position.payout_amounts = payouts;
        position.amounts = Vec::new();

        let vaults = position.vaults.clone();
        let pools = position.pools.clone();
        self.positions.set(&option_id, position);

        for (i, amount) in returned.iter().enumerate() {
            if !amount.is_zero() {
                let mut pool = CollateralPoolContractRef::new(self.env(), pools[i]);
                pool.transfer(vaults[i], *amount);
            }
        }

        self.env().emit_event(PositionSettled {
            option_id,
            expiry_price,
            settled_supply: sold,
        });

        returned
    }

    /// Redeem a holder's share of a settled position's payout
    pub fn redeem_payout(&mut self, option_id: OptionId) {
        let position = self.get_position(option_id);
        if !position.settled {
            self.env().revert(AuctionError::OptionNotExpired);
        }
        let caller = self.env().caller();
        let held = self
            .option_balances
            .get(&(option_id, caller))
            .unwrap_or_default();
        if held.is_zero() || position.settled_supply.is_zero() {
            self.env().revert(AuctionError::NoPayout);
        }

        self.option_balances.set(&(option_id, caller), U256::zero());

        for (i, payout) in position.payout_amounts.iter().enumerate() {
            let share = SafeMath::div(
                SafeMath::mul(*payout, held).unwrap_or_else(|err| self.env().revert(err)),
                position.settled_supply,
            )
            .unwrap_or_else(|err| self.env().revert(err));
            if !share.is_zero() {
                let mut pool = CollateralPoolContractRef::new(self.env(), position.pools[i]);
                pool.transfer(caller, share);
            }
        }

        self.env().emit_event(PayoutRedeemed {
            option_id,
            holder: caller,
            options: held,
        });
    }

    // ========================================
    // Accessors
    // ========================================

    /// Number of auctions opened so far
    pub fn auction_counter(&self) -> u64 {
        self.auction_counter.get_or_default()
    }

    /// Auction fee numerator
    pub fn fee_numerator(&self) -> U256 {
        self.fee_numerator.get_or_default()
    }

    /// Auction fee denominator
    pub fn fee_denominator(&self) -> U256 {
        U256::from(FEE_DENOMINATOR)
    }

    /// Auction state by id
    pub fn auction_data(&self, auction_id: u64) -> AuctionData {
        self.get_auction(auction_id)
    }

    /// Position state by option id
    pub fn position(&self, option_id: OptionId) -> Position {
        self.get_position(option_id)
    }

    /// A holder's option token balance
    pub fn option_balance_of(&self, option_id: OptionId, holder: Address) -> U256 {
        self.option_balances
            .get(&(option_id, holder))
            .unwrap_or_default()
    }

    // ========================================
    // Internals
    // ========================================

    fn get_auction(&self, auction_id: u64) -> AuctionData {
        self.auctions
            .get(&auction_id)
            .unwrap_or_revert_with(&self.env(), AuctionError::UnknownAuction)
    }

    fn get_position(&self, option_id: u64) -> Position {
        self.positions
            .get(&option_id)
            .unwrap_or_revert_with(&self.env(), AuctionError::UnknownPosition)
    }
}
