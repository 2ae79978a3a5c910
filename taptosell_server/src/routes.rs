//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current
//! thread will cause the current worker to stop processing new requests. Any long, non-cpu-bound
//! operation (database access in particular) must be awaited, never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use serde_json::json;
use taptosell_engine::{
    db_types::NewOrderRequest,
    order_objects::{OrderQueryFilter, OrderResult},
    traits::{AuthManagement, MarketplaceDatabase},
    AuthApi,
    OrderFlowApi,
    WalletApi,
};

use crate::{
    auth::Claims,
    data_objects::{
        CommissionSetting,
        DepositParams,
        FulfillmentParams,
        JsonResponse,
        NewOrderPayload,
        NewProductPayload,
        PriceChangeParams,
        RoleUpdateRequest,
        TokenIssueRequest,
        WithdrawalParams,
    },
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
/// Place a new order for the authenticated dropshipper. The buyer is always the caller; the cost
/// is derived server-side from the product price and the live commission.
pub async fn place_order<B: MarketplaceDatabase>(
    claims: Claims,
    body: web::Json<NewOrderPayload>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST order for product #{} by user #{}", body.product_id, claims.0.user_id);
    let request = NewOrderRequest { product_id: body.product_id, buyer_id: claims.0.user_id };
    let order = api.place_order(request).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Retry payment for an on-hold order. Admins may pay on behalf of any buyer.
pub async fn pay_order<B: MarketplaceDatabase>(
    claims: Claims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST pay-now for order #{order_id} by user #{}", claims.0.user_id);
    let order = api.pay_on_hold_order(order_id, claims.0.user_id, claims.0.is_admin()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn fulfill_order<B: MarketplaceDatabase>(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<FulfillmentParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST fulfilment for order #{order_id} by supplier #{}", claims.0.user_id);
    let order = api.fulfill_order(order_id, claims.0.user_id, body.into_inner().tracking_number).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub async fn release_order<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST payment release for order #{order_id}");
    let order = api.release_payment(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Search across all orders. The `/orders` resource is shared with order placement, so the
/// admin requirement for searching is enforced here rather than in the route ACL.
pub async fn search_orders<B: MarketplaceDatabase>(
    claims: Claims,
    query: web::Query<OrderQueryFilter>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    if !claims.0.is_admin() {
        return Err(ServerError::InsufficientPermissions("Only admins may search all orders".to_string()));
    }
    let filter = query.into_inner();
    debug!("💻️ GET orders. Filter: {filter}");
    let orders = api.search_orders(filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

pub async fn my_orders<B: MarketplaceDatabase>(
    claims: Claims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my orders for user #{}", claims.0.user_id);
    let filter = OrderQueryFilter::default().with_buyer_id(claims.0.user_id);
    let orders = api.search_orders(filter).await?;
    let result = OrderResult::new(claims.0.user_id, orders);
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Wallet  ----------------------------------------------------
pub async fn my_balance<B: MarketplaceDatabase>(
    claims: Claims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let balance = api.balance(claims.0.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": claims.0.user_id, "balance": balance })))
}

pub async fn balance_for_user<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ GET balance for user #{user_id}");
    let balance = api.balance(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": user_id, "balance": balance })))
}

pub async fn my_history<B: MarketplaceDatabase>(
    claims: Claims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET history for user #{}", claims.0.user_id);
    let history = api.history(claims.0.user_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

pub async fn record_deposit<B: MarketplaceDatabase>(
    body: web::Json<DepositParams>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST deposit of {} for user #{}", params.amount, params.user_id);
    let details = params.details.unwrap_or_else(|| "Manual deposit".to_string());
    let entry = api.deposit(params.user_id, params.amount, &details).await?;
    Ok(HttpResponse::Ok().json(entry))
}

//----------------------------------------------   Withdrawals  ----------------------------------------------------
pub async fn create_withdrawal<B: MarketplaceDatabase>(
    claims: Claims,
    body: web::Json<WithdrawalParams>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST withdrawal of {} for supplier #{}", body.amount, claims.0.user_id);
    let withdrawal = api.request_withdrawal(claims.0.user_id, body.amount).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

pub async fn process_withdrawal<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let withdrawal_id = path.into_inner();
    debug!("💻️ POST process withdrawal #{withdrawal_id}");
    let withdrawal = api.process_withdrawal(withdrawal_id).await?;
    Ok(HttpResponse::Ok().json(withdrawal))
}

pub async fn my_withdrawals<B: MarketplaceDatabase>(
    claims: Claims,
    api: web::Data<WalletApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let withdrawals = api.withdrawals_for_supplier(claims.0.user_id).await?;
    Ok(HttpResponse::Ok().json(withdrawals))
}

//----------------------------------------------   Products  ----------------------------------------------------
pub async fn create_product<B: MarketplaceDatabase>(
    claims: Claims,
    body: web::Json<NewProductPayload>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let payload = body.into_inner();
    debug!("💻️ POST new product '{}' by supplier #{}", payload.name, claims.0.user_id);
    let product = taptosell_engine::db_types::NewProduct {
        supplier_id: claims.0.user_id,
        name: payload.name,
        price: payload.price,
        stock: payload.stock,
        is_variable: payload.is_variable,
    };
    let product = api.create_product(product).await?;
    Ok(HttpResponse::Ok().json(product))
}

pub async fn request_price_change<B: MarketplaceDatabase>(
    claims: Claims,
    path: web::Path<i64>,
    body: web::Json<PriceChangeParams>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ POST price change for product #{product_id} to {}", body.requested_price);
    let request = api.request_price_change(product_id, claims.0.user_id, body.requested_price).await?;
    Ok(HttpResponse::Ok().json(request))
}

pub async fn approve_price_change<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = path.into_inner();
    debug!("💻️ POST approve price change #{request_id}");
    let request = api.resolve_price_change(request_id, true).await?;
    Ok(HttpResponse::Ok().json(request))
}

pub async fn reject_price_change<B: MarketplaceDatabase>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = path.into_inner();
    debug!("💻️ POST reject price change #{request_id}");
    let request = api.resolve_price_change(request_id, false).await?;
    Ok(HttpResponse::Ok().json(request))
}

//----------------------------------------------   Settings  ----------------------------------------------------
pub async fn get_commission<B: MarketplaceDatabase>(
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let bps = api.commission_bps().await?;
    Ok(HttpResponse::Ok().json(CommissionSetting { commission_bps: bps }))
}

pub async fn set_commission<B: MarketplaceDatabase>(
    body: web::Json<CommissionSetting>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ POST commission set to {} bps", body.commission_bps);
    api.set_commission_bps(body.commission_bps).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Commission set to {} bps", body.commission_bps))))
}

//----------------------------------------------   Auth admin  ----------------------------------------------------
pub async fn update_roles<B: AuthManagement>(
    body: web::Json<RoleUpdateRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    info!("💻️ POST role update for user #{}", request.user_id);
    if !request.apply.is_empty() {
        api.assign_roles(request.user_id, &request.apply).await?;
    }
    let mut revoked = 0;
    if !request.revoke.is_empty() {
        revoked = api.remove_roles(request.user_id, &request.revoke).await?;
    }
    let message = format!("Granted {} role(s), revoked {revoked}", request.apply.len());
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

pub async fn issue_token<B: AuthManagement>(
    body: web::Json<TokenIssueRequest>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    info!("💻️ POST token issue for user #{}", body.user_id);
    let token = api.issue_token(body.user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user_id": body.user_id, "token": token })))
}
