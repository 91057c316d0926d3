use crate::{
    error::{AppError, AppResult},
    models::{OrderDraft, OrderLine, User},
    notify::{OrderNotification, OrderNotifier},
    storage::Storage,
};

#[derive(Debug)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub total_amount: i64,
}

/// Convert the user's cart into an order.
///
/// Preconditions are checked in order and the first failure wins: the
/// caller must already be authenticated, the profile must be complete, and
/// the cart must be non-empty. Unit prices are the product prices at
/// checkout time, snapshotted into the order items; a price change between
/// add-to-cart and checkout is honored here.
pub async fn checkout(
    storage: &dyn Storage,
    notifier: &dyn OrderNotifier,
    user: &User,
    customer_notes: Option<String>,
) -> AppResult<OrderReceipt> {
    if !user.has_complete_profile() {
        return Err(AppError::PreconditionFailed(
            "Please complete your profile before placing an order".into(),
        ));
    }

    let cart = storage.cart_lines(user.id).await?;
    if cart.is_empty() {
        return Err(AppError::PreconditionFailed("Cart is empty".into()));
    }

    let total_amount = cart
        .iter()
        .map(|line| line.price * i64::from(line.quantity))
        .sum();

    let lines: Vec<OrderLine> = cart
        .into_iter()
        .map(|line| OrderLine {
            product_id: line.product_id,
            product_name: line.name,
            quantity: line.quantity,
            unit_price: line.price,
        })
        .collect();

    let draft = OrderDraft {
        user_id: user.id,
        total_amount,
        customer_notes: customer_notes.clone(),
        buyer_name: user.buyer_name().to_string(),
        lines,
    };

    // Header, items, recent purchases and cart clear all land in one
    // storage transaction; a failure leaves no partial order behind.
    let order_id = storage.place_order(&draft).await?;

    let notification = OrderNotification {
        order_id,
        total_amount,
        customer_notes,
        buyer_name: draft.buyer_name,
        profile_url: user.profile_url.clone(),
        phone_number: user.phone_number.clone().unwrap_or_default(),
        bank_number: user.bank_number.clone().unwrap_or_default(),
        email: user.email.clone(),
        lines: draft.lines,
    };
    if let Err(err) = notifier.order_placed(&notification).await {
        tracing::warn!(error = %err, order_id, "order notification failed");
    }

    Ok(OrderReceipt {
        order_id,
        total_amount,
    })
}
