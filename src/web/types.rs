use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{Auction, AuctionId, Bid, ErrorKind, Errors, NewAuction, Order, UserId};
use crate::lifecycle::LifecycleManager;
use crate::money::{Amount, AmountValue, Currency};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<LifecycleManager>,
}

impl AppState {
    pub fn new(manager: Arc<LifecycleManager>) -> Self {
        AppState { manager }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

impl ResponseError for Errors {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState | ErrorKind::Rejected => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiError {
            message: self.to_string(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddAuctionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minor units of `currency`.
    pub starting_price: AmountValue,
    pub currency: Option<Currency>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: DateTime<Utc>,
}

impl AddAuctionRequest {
    pub fn to_new_auction(&self, seller: UserId) -> NewAuction {
        NewAuction {
            title: self.title.clone(),
            description: self.description.clone(),
            starting_price: Amount::new(self.currency.unwrap_or_default(), self.starting_price),
            start_time: self.start_time,
            end_time: self.end_time,
            created_by: seller,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BidRequest {
    pub amount: AmountValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub workflow_state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub auction_id: AuctionId,
    #[serde(default)]
    pub shipping_address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListAuctionsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkflowQuery {
    pub workflow_state: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuctionDetail {
    #[serde(flatten)]
    pub auction: Auction,
    pub bids: Vec<Bid>,
    pub order: Option<Order>,
}
