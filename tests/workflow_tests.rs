use auction_lifecycle::clock::Clock;
use auction_lifecycle::domain::{
    AuctionRole, AuctionStatus, ErrorKind, Errors, OrderStatus, OrderUpdate, ShippingStatus,
    WorkflowState,
};
use auction_lifecycle::lifecycle::LifecycleManager;
use auction_lifecycle::persistence::{AuctionStore, Conditional, Snapshot};
use chrono::Duration;
use std::str::FromStr;
use std::sync::Arc;
#[path = "utils/mod.rs"]
mod utils;
use utils::*;

/// Auction 1 ended and won by buyer 2, auction 2 still running.
async fn closed_auction_harness() -> Harness {
    let mut won = sample_auction(1, AuctionStatus::Active);
    won.current_bid = usd(120);
    let h = harness_with_snapshot(Snapshot {
        auctions: vec![won, sample_auction(2, AuctionStatus::Active)],
        bids: vec![
            sample_bid(1, 1, buyer_1(), 100, 1),
            sample_bid(2, 1, buyer_2(), 120, 2),
        ],
        orders: vec![],
    });
    h.manager.close_one(1).await.unwrap();
    h
}

#[test]
fn test_workflow_state_parsing() {
    assert_eq!(WorkflowState::from_str("pending_sale").unwrap(), WorkflowState::PendingSale);
    let err = WorkflowState::from_str("not_a_state").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let message = err.to_string();
    for state in WorkflowState::ALL {
        assert!(message.contains(state.as_str()), "{}", message);
    }
}

#[tokio::test]
async fn test_invalid_target_does_not_mutate_auction() {
    let h = closed_auction_harness().await;
    let before = h.manager.get_auction(1).await.unwrap();

    let err = h.manager.advance_workflow(1, "not_a_state").await.unwrap_err();
    assert_eq!(err, Errors::InvalidWorkflowState("not_a_state".to_string()));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    assert_eq!(h.manager.get_auction(1).await.unwrap(), before);
}

#[tokio::test]
async fn test_unknown_auction_is_not_found() {
    let h = harness();
    let err = h.manager.advance_workflow(7, "shipping").await.unwrap_err();
    assert_eq!(err, Errors::UnknownAuction(7));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_workflow_moves_forward_and_updates_order() {
    let h = closed_auction_harness().await;
    let order = h
        .manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap();
    assert_eq!(order.total_amount, usd(120));
    assert_eq!(order.winning_bid_id, 2);
    assert_eq!(order.seller_id, sample_seller());
    assert_eq!(order.status, OrderStatus::PendingPayment);

    h.clock.advance(Duration::days(1));
    let shipping = h.manager.advance_workflow(1, "shipping").await.unwrap();
    assert_eq!(shipping.auction.workflow_state, WorkflowState::Shipping);
    let order = shipping.order.unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(order.shipping_status, ShippingStatus::Shipped);
    assert_eq!(order.shipped_at, Some(h.clock.now()));

    h.clock.advance(Duration::days(3));
    let complete = h.manager.advance_workflow(1, "complete").await.unwrap();
    assert_eq!(complete.auction.workflow_state, WorkflowState::Complete);
    let order = complete.order.unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.shipping_status, ShippingStatus::Delivered);
    assert!(order.completed_at.is_some());
}

#[tokio::test]
async fn test_workflow_without_order_still_advances() {
    let h = closed_auction_harness().await;
    let transition = h.manager.advance_workflow(1, "shipping").await.unwrap();
    assert_eq!(transition.auction.workflow_state, WorkflowState::Shipping);
    assert!(transition.order.is_none());
}

#[tokio::test]
async fn test_workflow_regression_is_rejected() {
    let h = closed_auction_harness().await;
    h.manager.advance_workflow(1, "complete").await.unwrap();

    let err = h.manager.advance_workflow(1, "active").await.unwrap_err();
    assert_eq!(
        err,
        Errors::WorkflowRegression {
            from: WorkflowState::Complete,
            to: WorkflowState::Active,
        }
    );
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let auction = h.manager.get_auction(1).await.unwrap();
    assert_eq!(auction.workflow_state, WorkflowState::Complete);
}

#[tokio::test]
async fn test_fulfilment_states_need_an_ended_auction() {
    let h = closed_auction_harness().await;
    let err = h.manager.advance_workflow(2, "pending_sale").await.unwrap_err();
    assert_eq!(err, Errors::AuctionNotEnded(2));

    let auction = h.manager.get_auction(2).await.unwrap();
    assert_eq!(auction.workflow_state, WorkflowState::Active);
}

#[tokio::test]
async fn test_reapplying_current_state_is_a_no_op() {
    let h = closed_auction_harness().await;
    let before = h.manager.get_auction(1).await.unwrap();
    let transition = h.manager.advance_workflow(1, "pending_sale").await.unwrap();
    assert_eq!(transition.auction, before);
}

#[tokio::test]
async fn test_order_requires_winner() {
    let h = closed_auction_harness().await;

    let err = h
        .manager
        .create_order(1, buyer_1(), "2 Side St".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, Errors::NotTheWinner(1));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = h
        .manager
        .create_order(2, buyer_1(), "2 Side St".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, Errors::NoWinner(2));

    h.manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap();
    let err = h
        .manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, Errors::OrderAlreadyExists(1));
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_failed_workflow_write_changes_nothing() {
    let h = closed_auction_harness().await;
    h.manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap();
    let auction_before = h.manager.get_auction(1).await.unwrap();
    let order_before = h.store.order_for_auction(1).await.unwrap();

    let faulty = LifecycleManager::new(
        Arc::new(FaultyStore {
            fail_workflow: true,
            ..FaultyStore::new(h.store.clone())
        }),
        h.notifier.clone(),
        h.clock.clone(),
    );
    let err = faulty.advance_workflow(1, "shipping").await.unwrap_err();
    assert_eq!(err, Errors::StoreUnavailable("orders table down".to_string()));
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    let auction = h.manager.get_auction(1).await.unwrap();
    assert_eq!(auction.workflow_state, WorkflowState::PendingSale);
    assert_eq!(auction, auction_before);
    assert_eq!(h.store.order_for_auction(1).await.unwrap(), order_before);
}

#[tokio::test]
async fn test_stale_workflow_write_leaves_order_alone() {
    let h = closed_auction_harness().await;
    h.manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap();
    let shipped = OrderUpdate::Shipped { at: sample_now() };

    // auction 1 is at pending_sale, not active
    let stale = h
        .store
        .set_workflow_state(1, WorkflowState::Active, WorkflowState::Shipping, Some(shipped))
        .await
        .unwrap();
    assert!(matches!(stale, Conditional::Stale(_)));
    let order = h.store.order_for_auction(1).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::PendingPayment);
    assert_eq!(order.shipped_at, None);

    let applied = h
        .store
        .set_workflow_state(1, WorkflowState::PendingSale, WorkflowState::Shipping, Some(shipped))
        .await
        .unwrap();
    let transition = match applied {
        Conditional::Applied(transition) => transition,
        other => panic!("expected the workflow update to apply, got {:?}", other),
    };
    assert_eq!(transition.auction.workflow_state, WorkflowState::Shipping);
    assert_eq!(transition.order.unwrap().shipped_at, Some(sample_now()));
}

#[tokio::test]
async fn test_auctions_by_workflow_for_seller_and_buyer() {
    let h = closed_auction_harness().await;
    let mut other = sample_new_auction();
    other.created_by = buyer_2();
    let own = h.manager.create_auction(other).await.unwrap();

    let sold = h
        .manager
        .auctions_by_workflow(&sample_seller(), Some(AuctionRole::Seller), None)
        .await
        .unwrap();
    let ids: Vec<_> = sold.iter().map(|l| l.auction.id).collect();
    assert_eq!(ids, vec![2, 1]);

    let won = h
        .manager
        .auctions_by_workflow(&buyer_2(), Some(AuctionRole::Buyer), None)
        .await
        .unwrap();
    assert_eq!(won.len(), 1);
    assert_eq!(won[0].auction.id, 1);
    assert_eq!(won[0].bid_count, 2);
    assert!(won[0].order.is_none());

    // without a role both sides are listed, newest first
    let either = h.manager.auctions_by_workflow(&buyer_2(), None, None).await.unwrap();
    let ids: Vec<_> = either.iter().map(|l| l.auction.id).collect();
    assert_eq!(ids, vec![own.id, 1]);

    let pending = h
        .manager
        .auctions_by_workflow(&buyer_2(), None, Some(WorkflowState::PendingSale))
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].auction.id, 1);

    h.manager
        .create_order(1, buyer_2(), "1 Main St".to_string())
        .await
        .unwrap();
    let won = h
        .manager
        .auctions_by_workflow(&buyer_2(), Some(AuctionRole::Buyer), None)
        .await
        .unwrap();
    assert_eq!(won[0].order.as_ref().unwrap().buyer_id, buyer_2());
}
