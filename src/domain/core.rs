use thiserror::Error;

use super::states::{AuctionStatus, WorkflowState};
use crate::money::Amount;

pub type UserId = String;
pub type AuctionId = i64;
pub type BidId = i64;
pub type OrderId = i64;

/// Coarse classification of [`Errors`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Rejected,
    Forbidden,
    Conflict,
    StoreUnavailable,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Errors {
    #[error("Unknown auction: {0}")]
    UnknownAuction(AuctionId),

    #[error("Invalid workflow state '{0}'. Workflow state must be one of: active, pending_sale, shipping, complete")]
    InvalidWorkflowState(String),

    #[error("Workflow state cannot move back from {from} to {to}")]
    WorkflowRegression { from: WorkflowState, to: WorkflowState },

    #[error("Auction {0} has not ended yet")]
    AuctionNotEnded(AuctionId),

    #[error("Auction {0} is not active (status is {1})")]
    AuctionNotActive(AuctionId, AuctionStatus),

    #[error("Auction has ended: {0}")]
    AuctionHasEnded(AuctionId),

    #[error("Bid must be greater than current bid of {0}")]
    MustPlaceBidOverCurrentBid(Amount),

    #[error("Invalid auction: {0}")]
    InvalidAuction(String),

    #[error("Auction {0} has no winner")]
    NoWinner(AuctionId),

    #[error("Only the auction winner can create an order for auction {0}")]
    NotTheWinner(AuctionId),

    #[error("An order already exists for auction {0}")]
    OrderAlreadyExists(AuctionId),

    #[error("Auction {0} is under heavy contention, try again")]
    Contention(AuctionId),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl Errors {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Errors::UnknownAuction(_) => ErrorKind::NotFound,
            Errors::InvalidWorkflowState(_)
            | Errors::WorkflowRegression { .. }
            | Errors::AuctionNotEnded(_)
            | Errors::NoWinner(_) => ErrorKind::InvalidState,
            Errors::AuctionNotActive(..)
            | Errors::AuctionHasEnded(_)
            | Errors::MustPlaceBidOverCurrentBid(_)
            | Errors::InvalidAuction(_) => ErrorKind::Rejected,
            Errors::NotTheWinner(_) => ErrorKind::Forbidden,
            Errors::OrderAlreadyExists(_) | Errors::Contention(_) => ErrorKind::Conflict,
            Errors::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}
