use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bids::PaymentStatus;
use super::core::{AuctionId, BidId, OrderId, UserId};
use super::states::WorkflowState;
use crate::money::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingPayment,
    Shipped,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    Pending,
    Shipped,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub auction_id: AuctionId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub winning_bid_id: BidId,
    pub total_amount: Amount,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub shipped_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub auction_id: AuctionId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub winning_bid_id: BidId,
    pub total_amount: Amount,
    pub shipping_address: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            auction_id: self.auction_id,
            buyer_id: self.buyer_id,
            seller_id: self.seller_id,
            winning_bid_id: self.winning_bid_id,
            total_amount: self.total_amount,
            shipping_address: self.shipping_address,
            status: OrderStatus::PendingPayment,
            payment_status: PaymentStatus::Pending,
            shipping_status: ShippingStatus::Pending,
            shipped_at: None,
            completed_at: None,
            created_at: self.created_at,
        }
    }
}

/// Order side effect of a workflow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderUpdate {
    Shipped { at: DateTime<Utc> },
    Completed { at: DateTime<Utc> },
}

impl OrderUpdate {
    pub fn for_workflow(target: WorkflowState, now: DateTime<Utc>) -> Option<Self> {
        match target {
            WorkflowState::Shipping => Some(OrderUpdate::Shipped { at: now }),
            WorkflowState::Complete => Some(OrderUpdate::Completed { at: now }),
            WorkflowState::Active | WorkflowState::PendingSale => None,
        }
    }

    pub fn apply_to(&self, order: &mut Order) {
        match *self {
            OrderUpdate::Shipped { at } => {
                order.status = OrderStatus::Shipped;
                order.shipping_status = ShippingStatus::Shipped;
                order.shipped_at.get_or_insert(at);
            }
            OrderUpdate::Completed { at } => {
                order.status = OrderStatus::Completed;
                order.shipping_status = ShippingStatus::Delivered;
                order.completed_at.get_or_insert(at);
            }
        }
    }
}
