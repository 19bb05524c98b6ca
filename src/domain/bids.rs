use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::core::{AuctionId, BidId, UserId};
use crate::money::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder: UserId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBid {
    pub auction_id: AuctionId,
    pub bidder: UserId,
    pub amount: Amount,
    pub created_at: DateTime<Utc>,
}

impl NewBid {
    pub fn into_bid(self, id: BidId) -> Bid {
        Bid {
            id,
            auction_id: self.auction_id,
            bidder: self.bidder,
            amount: self.amount,
            created_at: self.created_at,
            payment_status: PaymentStatus::Pending,
        }
    }
}

/// Highest amount wins; on equal amounts the earliest bid, then the lowest id.
pub fn winning_bid(bids: &[Bid]) -> Option<&Bid> {
    bids.iter().max_by(|a, b| {
        a.amount
            .value()
            .cmp(&b.amount.value())
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    })
}
