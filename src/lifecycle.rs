//! Auction lifecycle: activation, bidding, closing, fulfilment workflow.
//!
//! The manager keeps no state of its own. Each operation reads from the
//! store, decides, and ends in one conditional update; when the update comes
//! back stale the decision is redone against the fresher auction.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::{
    winning_bid, ActivationReport, Auction, AuctionId, AuctionRole, Bid, CloseCondition,
    CloseOutcome, Closure, Errors, NewAuction, NewBid, NewOrder, Order, OrderUpdate, SweepReport,
    UserId, WinningBid, WorkflowListing, WorkflowState, WorkflowTransition,
};
use crate::money::AmountValue;
use crate::notifications::{NotificationEvent, NotificationSink};
use crate::persistence::{AuctionStore, Conditional};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Attempts at the conditional bid update before giving up with a conflict.
    pub bid_retry_limit: usize,
    /// Same for closing and workflow updates.
    pub close_retry_limit: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            bid_retry_limit: 8,
            close_retry_limit: 8,
        }
    }
}

enum CloseAttempt {
    Closed(Auction, Option<WinningBid>),
    AlreadyClosed(Auction),
}

pub struct LifecycleManager {
    store: Arc<dyn AuctionStore>,
    notifier: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        LifecycleManager {
            store,
            notifier,
            clock,
            config: LifecycleConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<dyn AuctionStore> {
        &self.store
    }

    pub async fn create_auction(&self, auction: NewAuction) -> Result<Auction, Errors> {
        let now = self.clock.now();
        auction.validate(now)?;
        let auction = self.store.insert_auction(auction, now).await?;
        info!(
            "created auction {} ({}) by {}, status {}",
            auction.id, auction.title, auction.created_by, auction.status
        );
        Ok(auction)
    }

    pub async fn get_auction(&self, id: AuctionId) -> Result<Auction, Errors> {
        self.store
            .get_auction(id)
            .await?
            .ok_or(Errors::UnknownAuction(id))
    }

    pub async fn activate_scheduled(&self) -> Result<ActivationReport, Errors> {
        let now = self.clock.now();
        let activated = self.store.activate_scheduled(now).await?;
        for auction in &activated {
            info!("activated scheduled auction {}", auction.id);
            self.publish(NotificationEvent::auction_started(auction, now));
        }
        Ok(ActivationReport::from_ids(activated.iter().map(|a| a.id).collect()))
    }

    pub async fn close_expired(&self) -> Result<SweepReport, Errors> {
        let now = self.clock.now();
        let expired = self.store.expired_auctions(now).await?;
        let mut report = SweepReport::default();
        for auction in expired {
            let id = auction.id;
            match self.try_close(auction, now).await {
                Ok(CloseAttempt::Closed(closed, winner)) => report.record(&closed, winner.as_ref()),
                Ok(CloseAttempt::AlreadyClosed(_)) => {
                    debug!("auction {} was closed by a concurrent sweep", id)
                }
                Err(err) => {
                    error!("failed to close expired auction {}: {}", id, err);
                    report.failed.push(id);
                }
            }
        }
        if report.closed_count > 0 {
            info!("closed {} expired auction(s)", report.closed_count);
        }
        Ok(report)
    }

    pub async fn close_one(&self, id: AuctionId) -> Result<CloseOutcome, Errors> {
        let auction = self.get_auction(id).await?;
        let now = self.clock.now();
        Ok(match self.try_close(auction, now).await? {
            CloseAttempt::Closed(auction, winner) => CloseOutcome::Closed { auction, winner },
            CloseAttempt::AlreadyClosed(auction) => CloseOutcome::AlreadyClosed { auction },
        })
    }

    /// Winner determination plus the conditional close. The close only
    /// applies if status and current bid are what they were when the bids
    /// were read; a bid that slipped in between forces a fresh determination.
    async fn try_close(&self, mut auction: Auction, now: DateTime<Utc>) -> Result<CloseAttempt, Errors> {
        for _ in 0..self.config.close_retry_limit.max(1) {
            if auction.is_closed() {
                return Ok(CloseAttempt::AlreadyClosed(auction));
            }
            let bids = self.store.bids_for_auction(auction.id).await?;
            let winner = winning_bid(&bids).map(WinningBid::from);
            let closure = Closure {
                winner_id: winner.as_ref().map(|w| w.bidder.clone()),
                closed_at: now,
            };
            match self
                .store
                .close_auction(auction.id, CloseCondition::observed(&auction), closure)
                .await?
            {
                Conditional::Applied(closed) => {
                    info!(
                        "closed auction {}, winner: {}",
                        closed.id,
                        closed.winner_id.as_deref().unwrap_or("none")
                    );
                    self.announce_closure(&closed, winner.as_ref(), now);
                    return Ok(CloseAttempt::Closed(closed, winner));
                }
                Conditional::Stale(latest) => {
                    debug!("auction {} changed while closing, re-reading", latest.id);
                    auction = latest;
                }
                Conditional::Missing => return Err(Errors::UnknownAuction(auction.id)),
            }
        }
        if auction.is_closed() {
            return Ok(CloseAttempt::AlreadyClosed(auction));
        }
        Err(Errors::Contention(auction.id))
    }

    fn announce_closure(&self, auction: &Auction, winner: Option<&WinningBid>, now: DateTime<Utc>) {
        self.publish(NotificationEvent::auction_ended(auction, winner, now));
        if let Some(winner) = winner {
            self.publish(NotificationEvent::auction_won(auction, winner, now));
        }
    }

    /// `target` is the raw workflow state name as received from the caller.
    pub async fn advance_workflow(&self, id: AuctionId, target: &str) -> Result<WorkflowTransition, Errors> {
        let mut auction = self.get_auction(id).await?;
        let target: WorkflowState = target.parse()?;

        for _ in 0..self.config.close_retry_limit.max(1) {
            auction.check_workflow_target(target)?;
            if auction.workflow_state == target {
                let order = self.store.order_for_auction(id).await?;
                return Ok(WorkflowTransition { auction, order });
            }
            let order_update = OrderUpdate::for_workflow(target, self.clock.now());
            match self
                .store
                .set_workflow_state(id, auction.workflow_state, target, order_update)
                .await?
            {
                Conditional::Applied(transition) => {
                    info!("auction {} workflow: {} -> {}", id, auction.workflow_state, target);
                    return Ok(transition);
                }
                Conditional::Stale(latest) => auction = latest,
                Conditional::Missing => return Err(Errors::UnknownAuction(id)),
            }
        }
        Err(Errors::Contention(id))
    }

    /// Auctions the user is involved in, for a workflow overview.
    pub async fn auctions_by_workflow(
        &self,
        user: &str,
        role: Option<AuctionRole>,
        workflow_state: Option<WorkflowState>,
    ) -> Result<Vec<WorkflowListing>, Errors> {
        Ok(self
            .store
            .auctions_for_user(user, role, workflow_state)
            .await?)
    }

    /// `value` is in minor units of the auction's currency.
    pub async fn place_bid(&self, id: AuctionId, bidder: UserId, value: AmountValue) -> Result<Bid, Errors> {
        let mut auction = self.get_auction(id).await?;
        for _ in 0..self.config.bid_retry_limit.max(1) {
            let now = self.clock.now();
            let amount = auction.validate_bid(value, now)?;
            let bid = NewBid {
                auction_id: id,
                bidder: bidder.clone(),
                amount,
                created_at: now,
            };
            match self.store.place_bid(id, auction.current_bid, bid).await? {
                Conditional::Applied(bid) => {
                    info!("bid {} of {} by {} on auction {}", bid.id, bid.amount, bid.bidder, id);
                    return Ok(bid);
                }
                Conditional::Stale(latest) => {
                    debug!("auction {} current bid moved, re-validating bid of {}", id, value);
                    auction = latest;
                }
                Conditional::Missing => return Err(Errors::UnknownAuction(id)),
            }
        }
        Err(Errors::Contention(id))
    }

    pub async fn bids(&self, id: AuctionId) -> Result<Vec<Bid>, Errors> {
        self.get_auction(id).await?;
        let mut bids = self.store.bids_for_auction(id).await?;
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(bids)
    }

    pub async fn create_order(
        &self,
        id: AuctionId,
        buyer: UserId,
        shipping_address: String,
    ) -> Result<Order, Errors> {
        let auction = self.get_auction(id).await?;
        let winner_id = match (&auction.winner_id, auction.is_closed()) {
            (Some(winner_id), true) => winner_id,
            _ => return Err(Errors::NoWinner(id)),
        };
        if *winner_id != buyer {
            return Err(Errors::NotTheWinner(id));
        }

        let bids = self.store.bids_for_auction(id).await?;
        let winning = winning_bid(&bids)
            .filter(|bid| bid.bidder == *winner_id)
            .ok_or(Errors::NoWinner(id))?;

        let order = NewOrder {
            auction_id: id,
            buyer_id: buyer,
            seller_id: auction.created_by.clone(),
            winning_bid_id: winning.id,
            total_amount: winning.amount,
            shipping_address,
            created_at: self.clock.now(),
        };
        let order = self
            .store
            .insert_order(order)
            .await?
            .ok_or(Errors::OrderAlreadyExists(id))?;
        info!("created order {} for auction {}", order.id, id);
        Ok(order)
    }

    fn publish(&self, event: NotificationEvent) {
        let id = event.id;
        if let Err(err) = self.notifier.publish(event) {
            warn!("dropped notification {}: {}", id, err);
        }
    }
}
