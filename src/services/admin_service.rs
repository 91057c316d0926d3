use std::str::FromStr;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::ensure_admin,
    models::{AdminOrder, NewProduct, OrderStatus, Product, User},
    storage::Storage,
};

pub async fn list_products(storage: &dyn Storage, user: &User) -> AppResult<Vec<Product>> {
    ensure_admin(user)?;
    Ok(storage.list_active_products().await?)
}

pub async fn create_product(
    storage: &dyn Storage,
    user: &User,
    draft: NewProduct,
) -> AppResult<Product> {
    ensure_admin(user)?;
    if draft.name.trim().is_empty() {
        return Err(AppError::InvalidArgument("Name and price are required".into()));
    }

    let product = storage.create_product(&draft).await?;
    tracing::info!(product_id = product.id, name = %product.name, "product created");
    Ok(product)
}

/// Soft delete. The row stays so historical order items keep resolving
/// their product name.
pub async fn delete_product(storage: &dyn Storage, user: &User, product_id: i64) -> AppResult<()> {
    ensure_admin(user)?;
    if !storage.deactivate_product(product_id).await? {
        return Err(AppError::not_found("Product not found"));
    }
    tracing::info!(product_id, "product deactivated");
    Ok(())
}

pub async fn list_orders(storage: &dyn Storage, user: &User) -> AppResult<Vec<AdminOrder>> {
    ensure_admin(user)?;
    Ok(storage.list_orders().await?)
}

/// Any status can be set from any status; the enum check is the only
/// constraint. Manual corrections are expected here.
pub async fn update_order_status(
    storage: &dyn Storage,
    user: &User,
    order_id: i64,
    status: &str,
    admin_notes: Option<&str>,
) -> AppResult<()> {
    ensure_admin(user)?;

    let status = OrderStatus::from_str(status)
        .map_err(|()| AppError::InvalidArgument("Invalid status".into()))?;

    if !storage.update_order_status(order_id, status, admin_notes).await? {
        return Err(AppError::not_found("Order not found"));
    }

    tracing::info!(order_id, status = %status, "order status updated");
    Ok(())
}

/// Parse a decimal price string from the product form into cents. Accepts
/// at most two fractional digits, rejects negatives and empty input.
pub fn parse_price_cents(input: &str) -> Option<i64> {
    let trimmed = input.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (trimmed, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || whole.len() > 12 {
        return None;
    }
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let dollars = if whole.is_empty() {
        0
    } else {
        whole.parse::<i64>().ok()?
    };
    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        2 => frac.parse::<i64>().ok()?,
        _ => return None,
    };

    Some(dollars * 100 + cents)
}
