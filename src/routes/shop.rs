use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::SessionUser,
    models::{Product, RecentPurchase},
    services::order_service,
    state::AppState,
};

/// How many purchase records the public storefront shows.
const RECENT_PURCHASES_SHOWN: i64 = 5;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreatedResponse {
    pub message: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
    #[serde(rename = "totalAmount")]
    pub total_amount: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/recent-purchases", get(recent_purchases))
        .route("/order", post(create_order))
}

#[utoipa::path(
    get,
    path = "/api/shop/products",
    responses(
        (status = 200, description = "List active products", body = Vec<Product>)
    ),
    tag = "Shop"
)]
pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = state.storage.list_active_products().await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/shop/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get an active product", body = Product),
        (status = 404, description = "Product not found"),
    ),
    tag = "Shop"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let product = state
        .storage
        .active_product_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(product))
}

#[utoipa::path(
    get,
    path = "/api/shop/recent-purchases",
    responses(
        (status = 200, description = "Most recent purchases", body = Vec<RecentPurchase>)
    ),
    tag = "Shop"
)]
pub async fn recent_purchases(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RecentPurchase>>> {
    let purchases = state
        .storage
        .recent_purchases(RECENT_PURCHASES_SHOWN)
        .await?;
    Ok(Json(purchases))
}

#[utoipa::path(
    post,
    path = "/api/shop/order",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderCreatedResponse),
        (status = 400, description = "Profile incomplete or cart empty"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "Shop"
)]
pub async fn create_order(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    payload: Option<Json<CreateOrderRequest>>,
) -> AppResult<Json<OrderCreatedResponse>> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();

    let receipt = order_service::checkout(
        &*state.storage,
        &*state.notifier,
        &user,
        payload.customer_notes,
    )
    .await?;

    Ok(Json(OrderCreatedResponse {
        message: "Order created successfully".to_string(),
        order_id: receipt.order_id,
        total_amount: receipt.total_amount,
    }))
}
