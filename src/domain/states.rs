use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::core::Errors;

/// Bidding status of an auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionStatus {
    Scheduled,
    Active,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "scheduled",
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AuctionStatus::Scheduled),
            "active" => Ok(AuctionStatus::Active),
            "ended" => Ok(AuctionStatus::Ended),
            _ => Err(format!("Unknown auction status: {}", s)),
        }
    }
}

/// Fulfilment stage of an auction. Variants are declared in progression
/// order, so `Ord` follows the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Active,
    PendingSale,
    Shipping,
    Complete,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 4] = [
        WorkflowState::Active,
        WorkflowState::PendingSale,
        WorkflowState::Shipping,
        WorkflowState::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Active => "active",
            WorkflowState::PendingSale => "pending_sale",
            WorkflowState::Shipping => "shipping",
            WorkflowState::Complete => "complete",
        }
    }

    /// Only meaningful once bidding is over.
    pub fn requires_ended_auction(&self) -> bool {
        *self > WorkflowState::Active
    }

    pub fn can_advance_to(&self, target: WorkflowState) -> bool {
        target >= *self
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = Errors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL
            .iter()
            .find(|state| state.as_str() == s)
            .copied()
            .ok_or_else(|| Errors::InvalidWorkflowState(s.to_string()))
    }
}

/// Which side of an auction a user is on when listing by workflow stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionRole {
    /// The user created the auction.
    Seller,
    /// The user won the auction.
    Buyer,
}

impl AuctionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionRole::Seller => "seller",
            AuctionRole::Buyer => "buyer",
        }
    }
}

impl FromStr for AuctionRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(AuctionRole::Seller),
            "buyer" => Ok(AuctionRole::Buyer),
            _ => Err(format!("Unknown role: {}. Role must be seller or buyer", s)),
        }
    }
}
