use serde::{Deserialize, Serialize};

use super::auctions::Auction;
use super::bids::Bid;
use super::core::{AuctionId, BidId, UserId};
use super::orders::Order;
use crate::money::Amount;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningBid {
    pub bid_id: BidId,
    pub bidder: UserId,
    pub amount: Amount,
}

impl From<&Bid> for WinningBid {
    fn from(bid: &Bid) -> Self {
        WinningBid {
            bid_id: bid.id,
            bidder: bid.bidder.clone(),
            amount: bid.amount,
        }
    }
}

/// Result of closing a single auction. Closing an ended auction is not an
/// error, it reports the auction as it already is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum CloseOutcome {
    #[serde(rename = "AuctionClosed")]
    Closed {
        auction: Auction,
        winner: Option<WinningBid>,
    },

    #[serde(rename = "AlreadyClosed")]
    AlreadyClosed { auction: Auction },
}

impl CloseOutcome {
    pub fn auction(&self) -> &Auction {
        match self {
            CloseOutcome::Closed { auction, .. } => auction,
            CloseOutcome::AlreadyClosed { auction } => auction,
        }
    }

    pub fn closed_now(&self) -> bool {
        matches!(self, CloseOutcome::Closed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedAuction {
    pub auction_id: AuctionId,
    pub winner_id: Option<UserId>,
    pub final_price: Option<Amount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub closed_count: usize,
    pub auctions: Vec<ClosedAuction>,
    /// Auctions left open because closing them failed; the next sweep retries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<AuctionId>,
}

impl SweepReport {
    pub fn record(&mut self, auction: &Auction, winner: Option<&WinningBid>) {
        self.auctions.push(ClosedAuction {
            auction_id: auction.id,
            winner_id: winner.map(|w| w.bidder.clone()),
            final_price: winner.map(|w| w.amount),
        });
        self.closed_count = self.auctions.len();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub activated_count: usize,
    pub auctions: Vec<AuctionId>,
}

impl ActivationReport {
    pub fn from_ids(auctions: Vec<AuctionId>) -> Self {
        ActivationReport {
            activated_count: auctions.len(),
            auctions,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerReport {
    pub activated: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub auction: Auction,
    pub order: Option<Order>,
}

/// An auction as seen from a user's workflow overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowListing {
    #[serde(flatten)]
    pub auction: Auction,
    pub order: Option<Order>,
    pub bid_count: usize,
}
