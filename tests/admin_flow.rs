use async_trait::async_trait;
use ballistic_market_api::{
    error::AppError,
    middleware::auth::OptionalUser,
    models::{NewProduct, ProfileUpdate, User},
    notify::{NotifyError, OrderNotification, OrderNotifier},
    routes::admin::check_admin,
    services::{admin_service, cart_service, order_service},
    steam::SteamProfile,
    storage::{SqliteStorage, Storage},
};

struct SilentNotifier;

#[async_trait]
impl OrderNotifier for SilentNotifier {
    async fn order_placed(&self, _order: &OrderNotification) -> Result<(), NotifyError> {
        Ok(())
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

async fn login_admin(storage: &SqliteStorage) -> User {
    let user = login(storage, "76561198000000099", "operator").await;
    storage.grant_admin(&user.steam_id).await.expect("grant admin");
    storage
        .user_by_steam_id(&user.steam_id)
        .await
        .expect("fetch user")
        .expect("user exists")
}

fn draft(name: &str, price: i64) -> NewProduct {
    NewProduct {
        name: name.into(),
        description: String::new(),
        price,
        image_url: None,
        category: "General".into(),
        stock_quantity: 0,
    }
}

/// Seed one pending order through the real checkout path.
async fn place_order(storage: &SqliteStorage, product_price: i64) -> i64 {
    let user = login(storage, "76561198000000001", "gamer").await;
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
    let user = storage
        .user_by_steam_id(&user.steam_id)
        .await
        .expect("fetch user")
        .expect("user exists");

    let product = storage
        .create_product(&draft("Kevlar Vest", product_price))
        .await
        .expect("create product");
    cart_service::add_to_cart(storage, &user, product.id, 1)
        .await
        .expect("add to cart");

    order_service::checkout(storage, &SilentNotifier, &user, None)
        .await
        .expect("checkout")
        .order_id
}

#[tokio::test]
async fn non_admins_are_rejected_from_admin_operations() {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;

    let listing = admin_service::list_products(&storage, &user).await;
    assert!(matches!(listing, Err(AppError::Forbidden)));

    let orders = admin_service::list_orders(&storage, &user).await;
    assert!(matches!(orders, Err(AppError::Forbidden)));

    let delete = admin_service::delete_product(&storage, &user, 1).await;
    assert!(matches!(delete, Err(AppError::Forbidden)));
}

#[tokio::test]
async fn admin_check_answers_false_for_anonymous_callers() {
    let response = check_admin(OptionalUser(None)).await;
    assert!(!response.0.is_admin);
}

#[tokio::test]
async fn admin_check_reflects_the_stored_flag() {
    let storage = storage().await;
    let user = login(&storage, "76561198000000001", "gamer").await;
    assert!(!check_admin(OptionalUser(Some(user))).await.0.is_admin);

    let admin = login_admin(&storage).await;
    assert!(check_admin(OptionalUser(Some(admin))).await.0.is_admin);
}

#[tokio::test]
async fn product_create_requires_a_name() {
    let storage = storage().await;
    let admin = login_admin(&storage).await;

    let result = admin_service::create_product(&storage, &admin, draft("", 1000)).await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
}

#[tokio::test]
async fn product_delete_is_a_soft_delete() -> anyhow::Result<()> {
    let storage = storage().await;
    let admin = login_admin(&storage).await;

    let product = admin_service::create_product(&storage, &admin, draft("AK-47", 125_000)).await?;
    admin_service::delete_product(&storage, &admin, product.id).await?;

    let listed = admin_service::list_products(&storage, &admin).await?;
    assert!(listed.iter().all(|p| p.id != product.id));

    let missing = admin_service::delete_product(&storage, &admin, 999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn order_listing_joins_purchaser_profile_and_items() -> anyhow::Result<()> {
    let storage = storage().await;
    let admin = login_admin(&storage).await;
    let order_id = place_order(&storage, 4500).await;

    let orders = admin_service::list_orders(&storage, &admin).await?;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.id, order_id);
    assert_eq!(order.display_name, "gamer");
    assert_eq!(order.roleplay_name.as_deref(), Some("John Doe"));
    assert_eq!(order.phone_number.as_deref(), Some("555-0101"));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].product_name, "Kevlar Vest");
    assert_eq!(order.items[0].price, 4500);
    Ok(())
}

#[tokio::test]
async fn invalid_status_is_rejected_and_the_order_is_unchanged() -> anyhow::Result<()> {
    let storage = storage().await;
    let admin = login_admin(&storage).await;
    let order_id = place_order(&storage, 1000).await;

    let result =
        admin_service::update_order_status(&storage, &admin, order_id, "shipped", None).await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    let orders = admin_service::list_orders(&storage, &admin).await?;
    assert_eq!(orders[0].status, "pending");
    assert_eq!(orders[0].admin_notes, None);
    Ok(())
}

#[tokio::test]
async fn any_valid_status_transition_is_allowed() -> anyhow::Result<()> {
    let storage = storage().await;
    let admin = login_admin(&storage).await;
    let order_id = place_order(&storage, 1000).await;

    admin_service::update_order_status(&storage, &admin, order_id, "completed", Some("paid cash"))
        .await?;
    let orders = admin_service::list_orders(&storage, &admin).await?;
    assert_eq!(orders[0].status, "completed");
    assert_eq!(orders[0].admin_notes.as_deref(), Some("paid cash"));

    // Permissive by design: completed back to pending is fine.
    admin_service::update_order_status(&storage, &admin, order_id, "pending", None).await?;
    let orders = admin_service::list_orders(&storage, &admin).await?;
    assert_eq!(orders[0].status, "pending");
    Ok(())
}

#[tokio::test]
async fn updating_a_missing_order_is_not_found() {
    let storage = storage().await;
    let admin = login_admin(&storage).await;

    let result = admin_service::update_order_status(&storage, &admin, 42, "pending", None).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
