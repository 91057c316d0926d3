use crate::{
    error::{AppError, AppResult},
    models::{CartLine, User},
    storage::Storage,
};

pub async fn list_cart(storage: &dyn Storage, user: &User) -> AppResult<Vec<CartLine>> {
    Ok(storage.cart_lines(user.id).await?)
}

/// Last write wins: re-adding a product replaces the stored quantity
/// instead of accumulating it.
pub async fn add_to_cart(
    storage: &dyn Storage,
    user: &User,
    product_id: i64,
    quantity: i32,
) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::InvalidArgument(
            "Valid product ID and quantity are required".into(),
        ));
    }

    // Inactive products cannot be added; they also disappear from listings.
    if storage.active_product_by_id(product_id).await?.is_none() {
        return Err(AppError::not_found("Product not found"));
    }

    storage.put_cart_item(user.id, product_id, quantity).await?;
    Ok(())
}

/// Idempotent: removing an entry that does not exist is not an error.
pub async fn remove_from_cart(storage: &dyn Storage, user: &User, product_id: i64) -> AppResult<()> {
    storage.remove_cart_item(user.id, product_id).await?;
    Ok(())
}
