use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::core::{AuctionId, Errors, UserId};
use super::states::{AuctionStatus, WorkflowState};
use crate::money::{Amount, AmountValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub title: String,
    pub description: String,
    pub starting_price: Amount,
    pub current_bid: Amount,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub status: AuctionStatus,
    pub workflow_state: WorkflowState,
    pub created_by: UserId,
    pub winner_id: Option<UserId>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    pub fn is_due_for_activation(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Scheduled
            && self.start_time.map_or(false, |start| start <= now)
    }

    pub fn has_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && self.end_time < now
    }

    pub fn is_closed(&self) -> bool {
        self.status == AuctionStatus::Ended
    }

    /// Checks a bid of `value` (in the auction's currency) against the auction
    /// as it is right now, returning the amount to record.
    pub fn validate_bid(&self, value: AmountValue, now: DateTime<Utc>) -> Result<Amount, Errors> {
        if self.status != AuctionStatus::Active {
            return Err(Errors::AuctionNotActive(self.id, self.status));
        }
        if now >= self.end_time {
            return Err(Errors::AuctionHasEnded(self.id));
        }
        if value <= self.current_bid.value() {
            return Err(Errors::MustPlaceBidOverCurrentBid(self.current_bid));
        }
        Ok(self.current_bid.with_value(value))
    }

    /// Workflow only moves forward, and fulfilment stages need a closed auction.
    pub fn check_workflow_target(&self, target: WorkflowState) -> Result<(), Errors> {
        if !self.workflow_state.can_advance_to(target) {
            return Err(Errors::WorkflowRegression {
                from: self.workflow_state,
                to: target,
            });
        }
        if target.requires_ended_auction() && !self.is_closed() {
            return Err(Errors::AuctionNotEnded(self.id));
        }
        Ok(())
    }
}

/// An auction as submitted by its seller, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuction {
    pub title: String,
    pub description: String,
    pub starting_price: Amount,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
    pub created_by: UserId,
}

impl NewAuction {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), Errors> {
        if self.title.trim().is_empty() {
            return Err(Errors::InvalidAuction("title must not be empty".to_string()));
        }
        if self.starting_price.value() < 0 {
            return Err(Errors::InvalidAuction(
                "starting price cannot be negative".to_string(),
            ));
        }
        let opens_at = self.start_time.unwrap_or(now).max(now);
        if self.end_time <= opens_at {
            return Err(Errors::InvalidAuction(
                "end time must be after the auction opens".to_string(),
            ));
        }
        Ok(())
    }

    pub fn initial_status(&self, now: DateTime<Utc>) -> AuctionStatus {
        match self.start_time {
            Some(start) if start > now => AuctionStatus::Scheduled,
            _ => AuctionStatus::Active,
        }
    }

    pub fn into_auction(self, id: AuctionId, now: DateTime<Utc>) -> Auction {
        let status = self.initial_status(now);
        Auction {
            id,
            title: self.title,
            description: self.description,
            starting_price: self.starting_price,
            current_bid: self.starting_price,
            start_time: self.start_time,
            end_time: self.end_time,
            status,
            workflow_state: WorkflowState::Active,
            created_by: self.created_by,
            winner_id: None,
            closed_at: None,
            created_at: now,
        }
    }
}

/// Precondition of a close: the auction must still look the way it did when
/// the winner was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseCondition {
    pub status: AuctionStatus,
    pub current_bid: Amount,
}

impl CloseCondition {
    pub fn observed(auction: &Auction) -> Self {
        CloseCondition {
            status: auction.status,
            current_bid: auction.current_bid,
        }
    }

    pub fn holds_for(&self, auction: &Auction) -> bool {
        auction.status == self.status && auction.current_bid == self.current_bid
    }
}

/// Everything a close writes, applied together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    pub winner_id: Option<UserId>,
    pub closed_at: DateTime<Utc>,
}

impl Closure {
    pub fn apply_to(&self, auction: &mut Auction) {
        auction.status = AuctionStatus::Ended;
        auction.winner_id = self.winner_id.clone();
        auction.closed_at = Some(self.closed_at);
        auction.workflow_state = WorkflowState::PendingSale;
    }
}
