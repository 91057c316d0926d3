use std::sync::Mutex;

use async_trait::async_trait;
use ballistic_market_api::{
    error::AppError,
    models::{NewProduct, OrderDraft, OrderLine, Product, ProfileUpdate, User},
    notify::{NotifyError, OrderNotification, OrderNotifier},
    services::{cart_service, order_service},
    steam::SteamProfile,
    storage::{SqliteStorage, Storage},
};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<OrderNotification>>,
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn order_placed(&self, order: &OrderNotification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(order.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl OrderNotifier for FailingNotifier {
    async fn order_placed(&self, _order: &OrderNotification) -> Result<(), NotifyError> {
        Err(NotifyError::InvalidAddress("nobody@nowhere".into()))
    }
}

async fn storage() -> SqliteStorage {
    SqliteStorage::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite")
}

async fn login(storage: &SqliteStorage, steam_id: &str, name: &str) -> User {
    storage
        .upsert_user(&SteamProfile {
            steam_id: steam_id.into(),
            display_name: name.into(),
            avatar: None,
            profile_url: None,
        })
        .await
        .expect("upsert user")
}

async fn complete_profile(storage: &SqliteStorage, user: &User) -> User {
    storage
        .update_user_profile(
            &user.steam_id,
            &ProfileUpdate {
                roleplay_name: "John Doe".into(),
                phone_number: "555-0101".into(),
                bank_number: "1234".into(),
                email: None,
            },
        )
        .await
        .expect("update profile");
    storage
        .user_by_steam_id(&user.steam_id)
        .await
        .expect("fetch user")
        .expect("user exists")
}

async fn seed_product(storage: &SqliteStorage, name: &str, price: i64) -> Product {
    storage
        .create_product(&NewProduct {
            name: name.into(),
            description: String::new(),
            price,
            image_url: None,
            category: "General".into(),
            stock_quantity: 10,
        })
        .await
        .expect("create product")
}

#[tokio::test]
async fn re_adding_a_product_replaces_the_quantity() -> anyhow::Result<()> {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;
    let product = seed_product(&storage, "Rifle Scope", 2000).await;

    cart_service::add_to_cart(&storage, &user, product.id, 2).await?;
    cart_service::add_to_cart(&storage, &user, product.id, 5).await?;

    let cart = cart_service::list_cart(&storage, &user).await?;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].quantity, 5);
    Ok(())
}

#[tokio::test]
async fn add_to_cart_rejects_non_positive_quantity() {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;

    let zero = cart_service::add_to_cart(&storage, &user, 1, 0).await;
    assert!(matches!(zero, Err(AppError::InvalidArgument(_))));

    let negative = cart_service::add_to_cart(&storage, &user, 1, -3).await;
    assert!(matches!(negative, Err(AppError::InvalidArgument(_))));
}

#[tokio::test]
async fn add_to_cart_rejects_missing_or_inactive_product() -> anyhow::Result<()> {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;

    let missing = cart_service::add_to_cart(&storage, &user, 999, 1).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let product = seed_product(&storage, "Kevlar Vest", 4500).await;
    storage.deactivate_product(product.id).await?;
    let inactive = cart_service::add_to_cart(&storage, &user, product.id, 1).await;
    assert!(matches!(inactive, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn cart_remove_is_idempotent() -> anyhow::Result<()> {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;
    let product = seed_product(&storage, "9mm Ammo Box", 250).await;

    cart_service::remove_from_cart(&storage, &user, product.id).await?;
    cart_service::add_to_cart(&storage, &user, product.id, 1).await?;
    cart_service::remove_from_cart(&storage, &user, product.id).await?;
    cart_service::remove_from_cart(&storage, &user, product.id).await?;

    assert!(cart_service::list_cart(&storage, &user).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn checkout_with_empty_cart_creates_no_order() -> anyhow::Result<()> {
    let storage = storage().await;
    let notifier = RecordingNotifier::default();
    let user = login(&storage, "76561198000000001", "gamer").await;
    let user = complete_profile(&storage, &user).await;

    let result = order_service::checkout(&storage, &notifier, &user, None).await;
    assert!(matches!(result, Err(AppError::PreconditionFailed(_))));

    assert!(storage.list_orders().await?.is_empty());
    assert!(notifier.sent.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn checkout_with_incomplete_profile_creates_no_order() -> anyhow::Result<()> {
    let storage = storage().await;
    let notifier = RecordingNotifier::default();
    let user = login(&storage, "76561198000000001", "gamer").await;
    let product = seed_product(&storage, "AK-47", 125_000).await;
    cart_service::add_to_cart(&storage, &user, product.id, 1).await?;

    let result = order_service::checkout(&storage, &notifier, &user, None).await;
    assert!(matches!(result, Err(AppError::PreconditionFailed(_))));

    assert!(storage.list_orders().await?.is_empty());
    // The cart is untouched by a failed checkout.
    assert_eq!(cart_service::list_cart(&storage, &user).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn successful_checkout_materializes_the_order() -> anyhow::Result<()> {
    let storage = storage().await;
    let notifier = RecordingNotifier::default();
    let user = login(&storage, "76561198000000001", "gamer").await;
    let user = complete_profile(&storage, &user).await;

    let product_a = seed_product(&storage, "Rifle Scope", 1000).await;
    let product_b = seed_product(&storage, "9mm Ammo Box", 500).await;
    cart_service::add_to_cart(&storage, &user, product_a.id, 2).await?;
    cart_service::add_to_cart(&storage, &user, product_b.id, 1).await?;

    let receipt = order_service::checkout(
        &storage,
        &notifier,
        &user,
        Some("leave at the gate".into()),
    )
    .await?;
    assert_eq!(receipt.total_amount, 2500);

    let orders = storage.list_orders().await?;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, receipt.order_id);
    assert_eq!(order.total_amount, 2500);
    assert_eq!(order.status, "pending");
    assert_eq!(order.customer_notes.as_deref(), Some("leave at the gate"));
    assert_eq!(order.roleplay_name.as_deref(), Some("John Doe"));
    assert_eq!(order.items.len(), 2);
    assert!(order.items.iter().any(|item| {
        item.product_id == product_a.id && item.quantity == 2 && item.price == 1000
    }));

    assert!(cart_service::list_cart(&storage, &user).await?.is_empty());

    let purchases = storage.recent_purchases(10).await?;
    assert_eq!(purchases.len(), 2);
    assert!(purchases.iter().all(|p| p.buyer_name == "John Doe"));

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].order_id, receipt.order_id);
    assert_eq!(sent[0].total_amount, 2500);
    assert_eq!(sent[0].lines.len(), 2);
    Ok(())
}

#[tokio::test]
async fn notifier_failure_does_not_fail_checkout() -> anyhow::Result<()> {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;
    let user = complete_profile(&storage, &user).await;
    let product = seed_product(&storage, "Kevlar Vest", 4500).await;
    cart_service::add_to_cart(&storage, &user, product.id, 1).await?;

    let receipt = order_service::checkout(&storage, &FailingNotifier, &user, None).await?;
    assert_eq!(receipt.total_amount, 4500);
    assert_eq!(storage.list_orders().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deactivated_product_vanishes_from_shop_and_cart_but_not_history() -> anyhow::Result<()> {
    let storage = storage().await;
    let notifier = RecordingNotifier::default();
    let user = login(&storage, "76561198000000001", "gamer").await;
    let user = complete_profile(&storage, &user).await;

    let ordered = seed_product(&storage, "AK-47", 125_000).await;
    cart_service::add_to_cart(&storage, &user, ordered.id, 1).await?;
    order_service::checkout(&storage, &notifier, &user, None).await?;

    let lingering = seed_product(&storage, "Old Stock Helmet", 900).await;
    cart_service::add_to_cart(&storage, &user, lingering.id, 1).await?;

    storage.deactivate_product(ordered.id).await?;
    storage.deactivate_product(lingering.id).await?;

    assert!(storage.list_active_products().await?.is_empty());
    assert!(cart_service::list_cart(&storage, &user).await?.is_empty());

    // Historical order items still resolve the product name via the join.
    let orders = storage.list_orders().await?;
    assert_eq!(orders[0].items[0].product_name, "AK-47");
    Ok(())
}

#[tokio::test]
async fn place_order_rolls_back_completely_on_line_failure() -> anyhow::Result<()> {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;
    let product = seed_product(&storage, "Rifle Scope", 1000).await;

    let draft = OrderDraft {
        user_id: user.id,
        total_amount: 3000,
        customer_notes: None,
        buyer_name: "John Doe".into(),
        lines: vec![
            OrderLine {
                product_id: product.id,
                product_name: "Rifle Scope".into(),
                quantity: 1,
                unit_price: 1000,
            },
            // References no product; the foreign key fails the insert.
            OrderLine {
                product_id: 9999,
                product_name: "Ghost Item".into(),
                quantity: 2,
                unit_price: 1000,
            },
        ],
    };

    assert!(storage.place_order(&draft).await.is_err());

    assert!(storage.list_orders().await?.is_empty());
    assert!(storage.recent_purchases(10).await?.is_empty());
    Ok(())
}
