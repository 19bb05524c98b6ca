use actix_web::{web, HttpRequest, HttpResponse, Result};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

use crate::domain::{AuctionId, AuctionRole, AuctionStatus, UserId, WorkflowState};
use crate::scheduler;
use super::types::{
    AddAuctionRequest, ApiError, AppState, AuctionDetail, BidRequest, CreateOrderRequest,
    ListAuctionsQuery, WorkflowQuery, WorkflowRequest,
};

// Read x-jwt-payload header (set by the gateway) and extract the user id
fn get_auth_user(req: &HttpRequest) -> Option<UserId> {
    let auth_header = req.headers().get("x-jwt-payload")?;
    let auth_str = auth_header.to_str().ok()?;

    let decoded = general_purpose::STANDARD.decode(auth_str).ok()?;
    let json: Value = serde_json::from_slice(&decoded).ok()?;

    let sub = json.get("sub")?;
    match sub {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiError {
        message: "Authentication required".to_string(),
    })
}

async fn list_auctions(
    query: web::Query<ListAuctionsQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let status = match query.status.as_deref() {
        Some(s) => match s.parse::<AuctionStatus>() {
            Ok(status) => Some(status),
            Err(message) => return Ok(HttpResponse::BadRequest().json(ApiError { message })),
        },
        None => None,
    };
    let auctions = data
        .manager
        .store()
        .list_auctions(status)
        .await
        .map_err(crate::domain::Errors::from)?;
    Ok(HttpResponse::Ok().json(auctions))
}

async fn get_auction(
    path: web::Path<AuctionId>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let auction_id = path.into_inner();
    let manager = &data.manager;

    let auction = manager.get_auction(auction_id).await?;
    let bids = manager.bids(auction_id).await?;
    let order = manager
        .store()
        .order_for_auction(auction_id)
        .await
        .map_err(crate::domain::Errors::from)?;

    Ok(HttpResponse::Ok().json(AuctionDetail { auction, bids, order }))
}

async fn create_auction(
    req: HttpRequest,
    auction_req: web::Json<AddAuctionRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(user) = get_auth_user(&req) else {
        return Ok(unauthorized());
    };
    let auction = data
        .manager
        .create_auction(auction_req.to_new_auction(user))
        .await?;
    Ok(HttpResponse::Created().json(auction))
}

async fn auctions_by_workflow(
    req: HttpRequest,
    query: web::Query<WorkflowQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(user) = get_auth_user(&req) else {
        return Ok(unauthorized());
    };
    let role = match query.role.as_deref() {
        Some(r) => match r.parse::<AuctionRole>() {
            Ok(role) => Some(role),
            Err(message) => return Ok(HttpResponse::BadRequest().json(ApiError { message })),
        },
        None => None,
    };
    let workflow_state = query
        .workflow_state
        .as_deref()
        .map(str::parse::<WorkflowState>)
        .transpose()?;

    let auctions = data
        .manager
        .auctions_by_workflow(&user, role, workflow_state)
        .await?;
    Ok(HttpResponse::Ok().json(auctions))
}

async fn close_expired(data: web::Data<AppState>) -> Result<HttpResponse> {
    let report = data.manager.close_expired().await?;
    Ok(HttpResponse::Ok().json(report))
}

async fn close_auction(
    path: web::Path<AuctionId>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let outcome = data.manager.close_one(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

async fn update_workflow(
    req: HttpRequest,
    path: web::Path<AuctionId>,
    body: web::Json<WorkflowRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    if get_auth_user(&req).is_none() {
        return Ok(unauthorized());
    }
    let target = body.workflow_state.as_deref().unwrap_or_default();
    let transition = data
        .manager
        .advance_workflow(path.into_inner(), target)
        .await?;
    Ok(HttpResponse::Ok().json(transition))
}

async fn get_bids(
    path: web::Path<AuctionId>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let bids = data.manager.bids(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(bids))
}

async fn place_bid(
    req: HttpRequest,
    path: web::Path<AuctionId>,
    bid_req: web::Json<BidRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(user) = get_auth_user(&req) else {
        return Ok(unauthorized());
    };
    let bid = data
        .manager
        .place_bid(path.into_inner(), user, bid_req.amount)
        .await?;
    Ok(HttpResponse::Created().json(bid))
}

async fn create_order(
    req: HttpRequest,
    order_req: web::Json<CreateOrderRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let Some(user) = get_auth_user(&req) else {
        return Ok(unauthorized());
    };
    let order_req = order_req.into_inner();
    let order = data
        .manager
        .create_order(order_req.auction_id, user, order_req.shipping_address)
        .await?;
    Ok(HttpResponse::Created().json(order))
}

async fn scheduler_tick(data: web::Data<AppState>) -> Result<HttpResponse> {
    let report = scheduler::run_tick(&data.manager).await?;
    Ok(HttpResponse::Ok().json(report))
}

// Configure routes
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/auctions", web::get().to(list_auctions))
            .route("/auctions", web::post().to(create_auction))
            .route("/auctions/close-expired", web::post().to(close_expired))
            .route("/auctions/workflow", web::get().to(auctions_by_workflow))
            .route("/auctions/{id}", web::get().to(get_auction))
            .route("/auctions/{id}/close", web::post().to(close_auction))
            .route("/auctions/{id}/workflow", web::put().to(update_workflow))
            .route("/auctions/{id}/bids", web::get().to(get_bids))
            .route("/auctions/{id}/bids", web::post().to(place_bid))
            .route("/orders", web::post().to(create_order))
            .route("/scheduler/tick", web::post().to(scheduler_tick)),
    );
}
