use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{AuctionStore, Conditional, StoreError};
use crate::domain::{
    Auction, AuctionId, AuctionRole, AuctionStatus, Bid, BidId, CloseCondition, Closure,
    NewAuction, NewBid, NewOrder, Order, OrderId, OrderUpdate, WorkflowListing, WorkflowState,
    WorkflowTransition,
};
use crate::money::Amount;

/// Serializable copy of everything the in-memory store holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub auctions: Vec<Auction>,
    pub bids: Vec<Bid>,
    pub orders: Vec<Order>,
}

#[derive(Debug, Default)]
struct Tables {
    auctions: BTreeMap<AuctionId, Auction>,
    bids: Vec<Bid>,
    orders: Vec<Order>,
    next_auction_id: AuctionId,
    next_bid_id: BidId,
    next_order_id: OrderId,
}

impl Tables {
    fn new() -> Self {
        Tables {
            next_auction_id: 1,
            next_bid_id: 1,
            next_order_id: 1,
            ..Tables::default()
        }
    }
}

/// Store backed by a single mutex; every conditional update checks and writes
/// under the same lock, so it is atomic with respect to all other calls.
#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            tables: Mutex::new(Tables::new()),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let next_auction_id = snapshot.auctions.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        let next_bid_id = snapshot.bids.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let next_order_id = snapshot.orders.iter().map(|o| o.id).max().unwrap_or(0) + 1;
        let tables = Tables {
            auctions: snapshot.auctions.into_iter().map(|a| (a.id, a)).collect(),
            bids: snapshot.bids,
            orders: snapshot.orders,
            next_auction_id,
            next_bid_id,
            next_order_id,
        };
        MemoryStore {
            tables: Mutex::new(tables),
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let tables = self.lock()?;
        Ok(Snapshot {
            auctions: tables.auctions.values().cloned().collect(),
            bids: tables.bids.clone(),
            orders: tables.orders.clone(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn insert_auction(&self, auction: NewAuction, now: DateTime<Utc>) -> Result<Auction, StoreError> {
        let mut tables = self.lock()?;
        let id = tables.next_auction_id;
        tables.next_auction_id += 1;
        let auction = auction.into_auction(id, now);
        tables.auctions.insert(id, auction.clone());
        Ok(auction)
    }

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        Ok(self.lock()?.auctions.get(&id).cloned())
    }

    async fn list_auctions(&self, status: Option<AuctionStatus>) -> Result<Vec<Auction>, StoreError> {
        let tables = self.lock()?;
        let mut auctions: Vec<Auction> = tables
            .auctions
            .values()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(auctions)
    }

    async fn auctions_for_user(
        &self,
        user: &str,
        role: Option<AuctionRole>,
        workflow_state: Option<WorkflowState>,
    ) -> Result<Vec<WorkflowListing>, StoreError> {
        let tables = self.lock()?;
        let is_winner = |a: &Auction| a.winner_id.as_deref() == Some(user);
        let mut auctions: Vec<&Auction> = tables
            .auctions
            .values()
            .filter(|a| match role {
                Some(AuctionRole::Seller) => a.created_by == user,
                Some(AuctionRole::Buyer) => is_winner(*a),
                None => a.created_by == user || is_winner(*a),
            })
            .filter(|a| workflow_state.map_or(true, |w| a.workflow_state == w))
            .collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(auctions
            .into_iter()
            .map(|auction| WorkflowListing {
                auction: auction.clone(),
                order: tables.orders.iter().find(|o| o.auction_id == auction.id).cloned(),
                bid_count: tables.bids.iter().filter(|b| b.auction_id == auction.id).count(),
            })
            .collect())
    }

    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .auctions
            .values()
            .filter(|a| a.has_expired(now))
            .cloned()
            .collect())
    }

    async fn bids_for_auction(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        let tables = self.lock()?;
        let mut bids: Vec<Bid> = tables
            .bids
            .iter()
            .filter(|b| b.auction_id == id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| {
            b.amount
                .value()
                .cmp(&a.amount.value())
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bids)
    }

    async fn place_bid(
        &self,
        id: AuctionId,
        expected_current: Amount,
        bid: NewBid,
    ) -> Result<Conditional<Bid>, StoreError> {
        let mut tables = self.lock()?;
        let bid_id = tables.next_bid_id;
        let Some(auction) = tables.auctions.get_mut(&id) else {
            return Ok(Conditional::Missing);
        };
        if auction.status != AuctionStatus::Active || auction.current_bid != expected_current {
            return Ok(Conditional::Stale(auction.clone()));
        }
        auction.current_bid = bid.amount;
        let bid = bid.into_bid(bid_id);
        tables.next_bid_id += 1;
        tables.bids.push(bid.clone());
        Ok(Conditional::Applied(bid))
    }

    async fn activate_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let mut tables = self.lock()?;
        let mut activated = Vec::new();
        for auction in tables.auctions.values_mut() {
            if auction.is_due_for_activation(now) {
                auction.status = AuctionStatus::Active;
                auction.workflow_state = WorkflowState::Active;
                activated.push(auction.clone());
            }
        }
        Ok(activated)
    }

    async fn close_auction(
        &self,
        id: AuctionId,
        condition: CloseCondition,
        closure: Closure,
    ) -> Result<Conditional<Auction>, StoreError> {
        let mut tables = self.lock()?;
        let Some(auction) = tables.auctions.get_mut(&id) else {
            return Ok(Conditional::Missing);
        };
        if auction.is_closed() || !condition.holds_for(auction) {
            return Ok(Conditional::Stale(auction.clone()));
        }
        closure.apply_to(auction);
        Ok(Conditional::Applied(auction.clone()))
    }

    async fn set_workflow_state(
        &self,
        id: AuctionId,
        expected: WorkflowState,
        target: WorkflowState,
        order_update: Option<OrderUpdate>,
    ) -> Result<Conditional<WorkflowTransition>, StoreError> {
        let mut tables = self.lock()?;
        let Some(auction) = tables.auctions.get_mut(&id) else {
            return Ok(Conditional::Missing);
        };
        if auction.workflow_state != expected {
            return Ok(Conditional::Stale(auction.clone()));
        }
        auction.workflow_state = target;
        let auction = auction.clone();

        let order = tables.orders.iter_mut().find(|o| o.auction_id == id).map(|order| {
            if let Some(update) = &order_update {
                update.apply_to(order);
            }
            order.clone()
        });
        Ok(Conditional::Applied(WorkflowTransition { auction, order }))
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Option<Order>, StoreError> {
        let mut tables = self.lock()?;
        if tables.orders.iter().any(|o| o.auction_id == order.auction_id) {
            return Ok(None);
        }
        let order = order.into_order(tables.next_order_id);
        tables.next_order_id += 1;
        tables.orders.push(order.clone());
        Ok(Some(order))
    }

    async fn order_for_auction(&self, id: AuctionId) -> Result<Option<Order>, StoreError> {
        Ok(self.lock()?.orders.iter().find(|o| o.auction_id == id).cloned())
    }
}
