//! Storage seam of the lifecycle manager.
//!
//! Every write that depends on a previous read is expressed as a conditional
//! update: the store applies it only if the auction still matches what the
//! caller observed, and otherwise hands back the latest auction so the caller
//! can re-validate.

pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{
    Auction, AuctionId, AuctionRole, AuctionStatus, Bid, CloseCondition, Closure, Errors,
    NewAuction, NewBid, NewOrder, Order, OrderUpdate, WorkflowListing, WorkflowState,
    WorkflowTransition,
};
use crate::money::Amount;

pub use self::memory::{MemoryStore, Snapshot};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Unavailable(String),
}

impl From<StoreError> for Errors {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(reason) => Errors::StoreUnavailable(reason),
        }
    }
}

/// Outcome of a conditional update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    /// The precondition held and the write was applied.
    Applied(T),
    /// The auction no longer matched; nothing was written.
    Stale(Auction),
    /// No such auction.
    Missing,
}

#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn insert_auction(&self, auction: NewAuction, now: DateTime<Utc>) -> Result<Auction, StoreError>;

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    /// Newest first.
    async fn list_auctions(&self, status: Option<AuctionStatus>) -> Result<Vec<Auction>, StoreError>;

    /// Auctions the user sold (`Seller`), won (`Buyer`), or either when no
    /// role is given, optionally narrowed to one workflow state. Newest first.
    async fn auctions_for_user(
        &self,
        user: &str,
        role: Option<AuctionRole>,
        workflow_state: Option<WorkflowState>,
    ) -> Result<Vec<WorkflowListing>, StoreError>;

    /// Active auctions whose end time is before `now`.
    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    /// Ordered by amount descending, then creation time ascending.
    async fn bids_for_auction(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError>;

    /// Records the bid and raises `current_bid` to its amount, provided the
    /// auction is active and its current bid still equals `expected_current`.
    async fn place_bid(
        &self,
        id: AuctionId,
        expected_current: Amount,
        bid: NewBid,
    ) -> Result<Conditional<Bid>, StoreError>;

    /// Moves every due scheduled auction to active and returns them.
    async fn activate_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    async fn close_auction(
        &self,
        id: AuctionId,
        condition: CloseCondition,
        closure: Closure,
    ) -> Result<Conditional<Auction>, StoreError>;

    /// Moves the workflow from `expected` to `target` and applies
    /// `order_update` to the auction's order, if it has one. Either both
    /// changes are written or neither is.
    async fn set_workflow_state(
        &self,
        id: AuctionId,
        expected: WorkflowState,
        target: WorkflowState,
        order_update: Option<OrderUpdate>,
    ) -> Result<Conditional<WorkflowTransition>, StoreError>;

    /// Returns `None` when the auction already has an order.
    async fn insert_order(&self, order: NewOrder) -> Result<Option<Order>, StoreError>;

    async fn order_for_auction(&self, id: AuctionId) -> Result<Option<Order>, StoreError>;
}
