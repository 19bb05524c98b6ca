#![allow(dead_code)]

use async_trait::async_trait;
use auction_lifecycle::clock::ManualClock;
use auction_lifecycle::domain::{
    Auction, AuctionId, AuctionRole, AuctionStatus, Bid, CloseCondition, Closure, NewAuction,
    NewBid, NewOrder, Order, OrderUpdate, PaymentStatus, UserId, WorkflowListing, WorkflowState,
    WorkflowTransition,
};
use auction_lifecycle::lifecycle::LifecycleManager;
use auction_lifecycle::money::{Amount, Currency};
use auction_lifecycle::notifications::{NotificationEvent, NotificationKind, NotificationSink, NotifyError};
use auction_lifecycle::persistence::{AuctionStore, Conditional, MemoryStore, Snapshot, StoreError};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
// See https://users.rust-lang.org/t/sharing-code-and-macros-in-tests-directory/3098/7

// Sample data for tests
pub fn sample_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 1, 15, 8, 28, 0).unwrap()
}

pub fn sample_starts_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 1, 1, 8, 28, 0).unwrap()
}

pub fn sample_ends_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 2, 1, 8, 28, 0).unwrap()
}

pub fn after_end() -> DateTime<Utc> {
    sample_ends_at() + Duration::seconds(1)
}

pub fn sample_seller() -> UserId {
    "Sample_Seller".to_string()
}

pub fn buyer_1() -> UserId {
    "Buyer_1".to_string()
}

pub fn buyer_2() -> UserId {
    "Buyer_2".to_string()
}

pub fn buyer_3() -> UserId {
    "Buyer_3".to_string()
}

pub fn usd(value: i64) -> Amount {
    Amount::new(Currency::USD, value)
}

pub fn sample_new_auction() -> NewAuction {
    NewAuction {
        title: "auction".to_string(),
        description: "a sample item".to_string(),
        starting_price: usd(50),
        start_time: None,
        end_time: sample_ends_at(),
        created_by: sample_seller(),
    }
}

pub fn sample_auction(id: AuctionId, status: AuctionStatus) -> Auction {
    Auction {
        id,
        title: format!("auction {}", id),
        description: String::new(),
        starting_price: usd(50),
        current_bid: usd(50),
        start_time: Some(sample_starts_at()),
        end_time: sample_ends_at(),
        status,
        workflow_state: WorkflowState::Active,
        created_by: sample_seller(),
        winner_id: None,
        closed_at: None,
        created_at: sample_starts_at(),
    }
}

pub fn sample_bid(id: i64, auction_id: AuctionId, bidder: UserId, amount: i64, at_secs: i64) -> Bid {
    Bid {
        id,
        auction_id,
        bidder,
        amount: usd(amount),
        created_at: sample_starts_at() + Duration::seconds(at_secs),
        payment_status: PaymentStatus::Pending,
    }
}

/// Notification sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<NotificationEvent> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn publish(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Sink whose queue is always full.
pub struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn publish(&self, _event: NotificationEvent) -> Result<(), NotifyError> {
        Err(NotifyError::QueueFull)
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub manager: Arc<LifecycleManager>,
}

pub fn harness() -> Harness {
    harness_with_store(MemoryStore::new())
}

pub fn harness_with_snapshot(snapshot: Snapshot) -> Harness {
    harness_with_store(MemoryStore::from_snapshot(snapshot))
}

pub fn harness_with_store(store: MemoryStore) -> Harness {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(sample_now()));
    let manager = Arc::new(LifecycleManager::new(
        store.clone(),
        notifier.clone(),
        clock.clone(),
    ));
    Harness {
        store,
        notifier,
        clock,
        manager,
    }
}

/// Yields to the scheduler before every store call, so concurrent callers
/// interleave between their reads and their conditional writes.
pub struct YieldingStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl AuctionStore for YieldingStore {
    async fn insert_auction(&self, auction: NewAuction, now: DateTime<Utc>) -> Result<Auction, StoreError> {
        tokio::task::yield_now().await;
        self.inner.insert_auction(auction, now).await
    }

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.get_auction(id).await
    }

    async fn list_auctions(&self, status: Option<AuctionStatus>) -> Result<Vec<Auction>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.list_auctions(status).await
    }

    async fn auctions_for_user(
        &self,
        user: &str,
        role: Option<AuctionRole>,
        workflow_state: Option<WorkflowState>,
    ) -> Result<Vec<WorkflowListing>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.auctions_for_user(user, role, workflow_state).await
    }

    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.expired_auctions(now).await
    }

    async fn bids_for_auction(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.bids_for_auction(id).await
    }

    async fn place_bid(
        &self,
        id: AuctionId,
        expected_current: Amount,
        bid: NewBid,
    ) -> Result<Conditional<Bid>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.place_bid(id, expected_current, bid).await
    }

    async fn activate_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.activate_scheduled(now).await
    }

    async fn close_auction(
        &self,
        id: AuctionId,
        condition: CloseCondition,
        closure: Closure,
    ) -> Result<Conditional<Auction>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.close_auction(id, condition, closure).await
    }

    async fn set_workflow_state(
        &self,
        id: AuctionId,
        expected: WorkflowState,
        target: WorkflowState,
        order_update: Option<OrderUpdate>,
    ) -> Result<Conditional<WorkflowTransition>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.set_workflow_state(id, expected, target, order_update).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Option<Order>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.insert_order(order).await
    }

    async fn order_for_auction(&self, id: AuctionId) -> Result<Option<Order>, StoreError> {
        tokio::task::yield_now().await;
        self.inner.order_for_auction(id).await
    }
}

/// Delegates to a [`MemoryStore`] but fails the writes it is told to fail.
pub struct FaultyStore {
    pub inner: Arc<MemoryStore>,
    /// Closing this auction fails.
    pub fail_close: Option<AuctionId>,
    /// Every workflow update fails.
    pub fail_workflow: bool,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        FaultyStore {
            inner,
            fail_close: None,
            fail_workflow: false,
        }
    }

    fn unavailable(table: &str) -> StoreError {
        StoreError::Unavailable(format!("{} table down", table))
    }
}

#[async_trait]
impl AuctionStore for FaultyStore {
    async fn insert_auction(&self, auction: NewAuction, now: DateTime<Utc>) -> Result<Auction, StoreError> {
        self.inner.insert_auction(auction, now).await
    }

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        self.inner.get_auction(id).await
    }

    async fn list_auctions(&self, status: Option<AuctionStatus>) -> Result<Vec<Auction>, StoreError> {
        self.inner.list_auctions(status).await
    }

    async fn auctions_for_user(
        &self,
        user: &str,
        role: Option<AuctionRole>,
        workflow_state: Option<WorkflowState>,
    ) -> Result<Vec<WorkflowListing>, StoreError> {
        self.inner.auctions_for_user(user, role, workflow_state).await
    }

    async fn expired_auctions(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        self.inner.expired_auctions(now).await
    }

    async fn bids_for_auction(&self, id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        self.inner.bids_for_auction(id).await
    }

    async fn place_bid(
        &self,
        id: AuctionId,
        expected_current: Amount,
        bid: NewBid,
    ) -> Result<Conditional<Bid>, StoreError> {
        self.inner.place_bid(id, expected_current, bid).await
    }

    async fn activate_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        self.inner.activate_scheduled(now).await
    }

    async fn close_auction(
        &self,
        id: AuctionId,
        condition: CloseCondition,
        closure: Closure,
    ) -> Result<Conditional<Auction>, StoreError> {
        if self.fail_close == Some(id) {
            return Err(Self::unavailable("auctions"));
        }
        self.inner.close_auction(id, condition, closure).await
    }

    async fn set_workflow_state(
        &self,
        id: AuctionId,
        expected: WorkflowState,
        target: WorkflowState,
        order_update: Option<OrderUpdate>,
    ) -> Result<Conditional<WorkflowTransition>, StoreError> {
        if self.fail_workflow {
            return Err(Self::unavailable("orders"));
        }
        self.inner.set_workflow_state(id, expected, target, order_update).await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Option<Order>, StoreError> {
        self.inner.insert_order(order).await
    }

    async fn order_for_auction(&self, id: AuctionId) -> Result<Option<Order>, StoreError> {
        self.inner.order_for_auction(id).await
    }
}
