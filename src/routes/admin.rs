use std::path::Path as FsPath;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{OptionalUser, SessionUser},
    models::{AdminOrder, NewProduct, Product},
    routes::MessageResponse,
    services::admin_service::{self, parse_price_cents},
    state::AppState,
};

const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductCreatedResponse {
    pub message: String,
    #[serde(rename = "productId")]
    pub product_id: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminCheckResponse {
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Shape of the multipart product form, for the API docs.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateProductForm {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub category: Option<String>,
    pub stock_quantity: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/check", get(check_admin))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    responses(
        (status = 200, description = "List products (admin view)", body = Vec<Product>),
        (status = 403, description = "Admin access required"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> AppResult<Json<Vec<Product>>> {
    let products = admin_service::list_products(&*state.storage, &user).await?;
    Ok(Json(products))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body(content = CreateProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product created", body = ProductCreatedResponse),
        (status = 400, description = "Missing name or price"),
        (status = 403, description = "Admin access required"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    mut multipart: Multipart,
) -> AppResult<Json<ProductCreatedResponse>> {
    let mut name = None;
    let mut description = None;
    let mut price = None;
    let mut category = None;
    let mut stock_quantity = None;
    let mut image_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::InvalidArgument(err.to_string()))?
    {
        match field.name() {
            Some("name") => name = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            Some("price") => price = Some(read_text(field).await?),
            Some("category") => category = Some(read_text(field).await?),
            Some("stock_quantity") => stock_quantity = Some(read_text(field).await?),
            Some("image") => {
                image_url = save_image(&state.config.upload_dir, field).await?;
            }
            _ => {}
        }
    }

    let name = name.filter(|n| !n.trim().is_empty());
    let (Some(name), Some(price)) = (name, price) else {
        return Err(AppError::InvalidArgument("Name and price are required".into()));
    };
    let price =
        parse_price_cents(&price).ok_or_else(|| AppError::InvalidArgument("Invalid price".into()))?;

    let draft = NewProduct {
        name,
        description: description.unwrap_or_default(),
        price,
        image_url: image_url.clone(),
        category: category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "General".to_string()),
        stock_quantity: stock_quantity
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0),
    };

    let product = admin_service::create_product(&*state.storage, &user, draft).await?;

    Ok(Json(ProductCreatedResponse {
        message: "Product created successfully".to_string(),
        product_id: product.id,
        image_url,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product soft-deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Product not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    admin_service::delete_product(&*state.storage, &user, id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    responses(
        (status = 200, description = "All orders with purchaser profile and items", body = Vec<AdminOrder>),
        (status = 403, description = "Admin access required"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> AppResult<Json<Vec<AdminOrder>>> {
    let orders = admin_service::list_orders(&*state.storage, &user).await?;
    Ok(Json(orders))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = MessageResponse),
        (status = 400, description = "Invalid status"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order not found"),
    ),
    security(("session_cookie" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<MessageResponse>> {
    let status = payload
        .status
        .ok_or_else(|| AppError::InvalidArgument("Invalid status".into()))?;

    admin_service::update_order_status(
        &*state.storage,
        &user,
        id,
        &status,
        payload.admin_notes.as_deref(),
    )
    .await?;

    Ok(Json(MessageResponse::new("Order status updated successfully")))
}

#[utoipa::path(
    get,
    path = "/api/admin/check",
    responses(
        (status = 200, description = "Whether the caller is an admin; never fails", body = AdminCheckResponse),
    ),
    tag = "Admin"
)]
pub async fn check_admin(OptionalUser(user): OptionalUser) -> Json<AdminCheckResponse> {
    Json(AdminCheckResponse {
        is_admin: user.is_some_and(|u| u.is_admin),
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|err| AppError::InvalidArgument(err.to_string()))
}

/// Store an uploaded product image under the upload directory with a fresh
/// name, keeping only the extension. Returns the public URL path.
async fn save_image(
    upload_dir: &str,
    field: axum::extract::multipart::Field<'_>,
) -> AppResult<Option<String>> {
    let Some(original_name) = field.file_name().map(ToOwned::to_owned) else {
        return Ok(None);
    };
    if original_name.is_empty() {
        return Ok(None);
    }

    let extension = FsPath::new(&original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| AppError::InvalidArgument("Only images are allowed".into()))?;
    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::InvalidArgument("Only images are allowed".into()));
    }

    let data = field
        .bytes()
        .await
        .map_err(|err| AppError::InvalidArgument(err.to_string()))?;
    if data.is_empty() {
        return Ok(None);
    }

    let file_name = format!("{}.{extension}", Uuid::new_v4());
    let path = FsPath::new(upload_dir).join(&file_name);
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|err| AppError::Internal(err.into()))?;

    Ok(Some(format!("/uploads/{file_name}")))
}
