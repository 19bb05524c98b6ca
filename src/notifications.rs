//! Fire-and-forget notifications about auction lifecycle events.
//!
//! The lifecycle manager publishes into a [`NotificationSink`]. The shipped
//! sink is a bounded channel drained by a dispatcher task, which hands every
//! event to a [`NotificationHandler`]. Publishing never waits for delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::domain::{Auction, UserId, WinningBid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    AuctionStart,
    AuctionEnd,
    AuctionWon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "user_id")]
    pub recipient: UserId,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    fn new(
        kind: NotificationKind,
        recipient: UserId,
        title: &str,
        message: String,
        metadata: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Self {
        NotificationEvent {
            id: Uuid::new_v4(),
            kind,
            recipient,
            title: title.to_string(),
            message,
            metadata,
            created_at: now,
        }
    }

    pub fn auction_started(auction: &Auction, now: DateTime<Utc>) -> Self {
        NotificationEvent::new(
            NotificationKind::AuctionStart,
            auction.created_by.clone(),
            "Your auction is now live!",
            format!("\"{}\" is now accepting bids.", auction.title),
            json!({ "auction_id": auction.id }),
            now,
        )
    }

    /// Sent to the seller whether or not anybody won.
    pub fn auction_ended(auction: &Auction, winner: Option<&WinningBid>, now: DateTime<Utc>) -> Self {
        let message = match winner {
            Some(w) => format!(
                "\"{}\" has ended with a winning bid of {}.",
                auction.title,
                w.amount.display_major()
            ),
            None => format!("\"{}\" has ended with no bids.", auction.title),
        };
        NotificationEvent::new(
            NotificationKind::AuctionEnd,
            auction.created_by.clone(),
            "Your auction has ended",
            message,
            json!({
                "auction_id": auction.id,
                "winner_id": winner.map(|w| w.bidder.clone()),
                "final_price": winner.map(|w| w.amount),
            }),
            now,
        )
    }

    pub fn auction_won(auction: &Auction, winner: &WinningBid, now: DateTime<Utc>) -> Self {
        NotificationEvent::new(
            NotificationKind::AuctionWon,
            winner.bidder.clone(),
            "You won an auction!",
            format!(
                "Congratulations! You won \"{}\" with your bid of {}.",
                auction.title,
                winner.amount.display_major()
            ),
            json!({ "auction_id": auction.id, "bid_id": winner.bid_id }),
            now,
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification queue is full")]
    QueueFull,

    #[error("notification queue is closed")]
    QueueClosed,

    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub trait NotificationSink: Send + Sync {
    /// Must not block. An error means the event was dropped.
    fn publish(&self, event: NotificationEvent) -> Result<(), NotifyError>;
}

/// Sink that enqueues onto a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<NotificationEvent>,
}

impl ChannelNotifier {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotificationEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ChannelNotifier { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn publish(&self, event: NotificationEvent) -> Result<(), NotifyError> {
        self.tx.try_send(event).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::QueueClosed,
        })
    }
}

#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// Writes every event to the log. Real delivery channels plug in here.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHandler;

#[async_trait]
impl NotificationHandler for LogHandler {
    async fn deliver(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        info!(
            "notification {} ({:?}) for user {}: {} - {}",
            event.id, event.kind, event.recipient, event.title, event.message
        );
        Ok(())
    }
}

/// Drains the queue until every sender is gone. Handler failures are logged
/// and the next event is processed.
pub fn spawn_dispatcher(
    mut rx: mpsc::Receiver<NotificationEvent>,
    handler: Arc<dyn NotificationHandler>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(err) = handler.deliver(&event).await {
                warn!("failed to deliver notification {}: {}", event.id, err);
            }
        }
        info!("notification dispatcher stopped");
    })
}
