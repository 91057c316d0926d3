use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::SessionUser,
    models::{CartLine, ProfileUpdate, User},
    routes::MessageResponse,
    services::cart_service,
    state::AppState,
};

// Required fields arrive as options so a missing field maps to a 400 with
// a message instead of a deserialization rejection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub roleplay_name: Option<String>,
    pub phone_number: Option<String>,
    pub bank_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/cart", get(get_cart).post(add_to_cart))
        .route("/cart/{product_id}", delete(remove_from_cart))
}

#[utoipa::path(
    get,
    path = "/api/user/profile",
    responses(
        (status = 200, description = "Current user profile", body = User),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "User"
)]
pub async fn get_profile(SessionUser(user): SessionUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    put,
    path = "/api/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Missing required fields"),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "User"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<MessageResponse>> {
    let required = |field: Option<String>| field.filter(|value| !value.trim().is_empty());
    let (Some(roleplay_name), Some(phone_number), Some(bank_number)) = (
        required(payload.roleplay_name),
        required(payload.phone_number),
        required(payload.bank_number),
    ) else {
        return Err(AppError::InvalidArgument(
            "Roleplay name, phone number, and bank number are required".into(),
        ));
    };

    let update = ProfileUpdate {
        roleplay_name,
        phone_number,
        bank_number,
        email: payload.email,
    };

    if !state
        .storage
        .update_user_profile(&user.steam_id, &update)
        .await?
    {
        return Err(AppError::not_found("User not found"));
    }

    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

#[utoipa::path(
    get,
    path = "/api/user/cart",
    responses(
        (status = 200, description = "Cart rows joined with live product data", body = Vec<CartLine>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "User"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> AppResult<Json<Vec<CartLine>>> {
    let lines = cart_service::list_cart(&*state.storage, &user).await?;
    Ok(Json(lines))
}

#[utoipa::path(
    post,
    path = "/api/user/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added or quantity replaced", body = MessageResponse),
        (status = 400, description = "Invalid product id or quantity"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = [])),
    tag = "User"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<MessageResponse>> {
    let (Some(product_id), Some(quantity)) = (payload.product_id, payload.quantity) else {
        return Err(AppError::InvalidArgument(
            "Valid product ID and quantity are required".into(),
        ));
    };

    cart_service::add_to_cart(&*state.storage, &user, product_id, quantity).await?;
    Ok(Json(MessageResponse::new("Item added to cart")))
}

#[utoipa::path(
    delete,
    path = "/api/user/cart/{product_id}",
    params(
        ("product_id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Item removed (idempotent)", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "User"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    cart_service::remove_from_cart(&*state.storage, &user, product_id).await?;
    Ok(Json(MessageResponse::new("Item removed from cart")))
}
