use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    config::AppConfig,
    models::{
        AdminOrder, CartLine, NewProduct, OrderDraft, OrderStatus, Product, ProfileUpdate,
        RecentPurchase, User,
    },
    steam::SteamProfile,
};

pub mod postgres;
pub mod sqlite;

pub use postgres::PgStorage;
pub use sqlite::SqliteStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The single data-access contract both backends implement. Call sites hold
/// an `Arc<dyn Storage>` and never know which store is behind it; the two
/// implementations must agree on upsert, soft-delete, and ordering semantics.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert-or-update keyed by steam_id. Refreshes the Steam-provided
    /// fields and leaves roleplay_name/phone_number/bank_number/email alone.
    async fn upsert_user(&self, profile: &SteamProfile) -> StorageResult<User>;

    async fn user_by_steam_id(&self, steam_id: &str) -> StorageResult<Option<User>>;

    /// Returns false when no row matched the steam_id.
    async fn update_user_profile(
        &self,
        steam_id: &str,
        update: &ProfileUpdate,
    ) -> StorageResult<bool>;

    /// Flip the admin flag for an existing user. Admins are appointed out
    /// of band (see the grant-admin binary), never through the HTTP API.
    async fn grant_admin(&self, steam_id: &str) -> StorageResult<bool>;

    async fn create_product(&self, draft: &NewProduct) -> StorageResult<Product>;

    /// Active products only, newest first.
    async fn list_active_products(&self) -> StorageResult<Vec<Product>>;

    async fn active_product_by_id(&self, id: i64) -> StorageResult<Option<Product>>;

    /// Soft delete: flips is_active and keeps the row for historical joins.
    async fn deactivate_product(&self, id: i64) -> StorageResult<bool>;

    /// Upsert keyed by (user_id, product_id); re-adding replaces the
    /// quantity rather than accumulating it.
    async fn put_cart_item(&self, user_id: i64, product_id: i64, quantity: i32)
        -> StorageResult<()>;

    /// Cart rows joined with live product name/price/image. Rows whose
    /// product has been deactivated are filtered out.
    async fn cart_lines(&self, user_id: i64) -> StorageResult<Vec<CartLine>>;

    /// Returns the number of rows removed; removing nothing is not an error.
    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> StorageResult<u64>;

    /// Materialize an order in one transaction: header insert, item inserts
    /// with price snapshots, recent-purchase appends, cart-row deletes.
    /// Either everything lands or nothing does.
    async fn place_order(&self, draft: &OrderDraft) -> StorageResult<i64>;

    /// All orders joined with purchaser profile fields, newest first, each
    /// carrying its line items enriched with the product name.
    async fn list_orders(&self) -> StorageResult<Vec<AdminOrder>>;

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        admin_notes: Option<&str>,
    ) -> StorageResult<bool>;

    async fn recent_purchases(&self, limit: i64) -> StorageResult<Vec<RecentPurchase>>;
}

/// Pick the backend from configuration: a `DATABASE_URL` selects Postgres,
/// otherwise the embedded SQLite file at `DB_PATH` is used.
pub async fn connect(config: &AppConfig) -> StorageResult<Arc<dyn Storage>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("using postgres storage");
            Ok(Arc::new(PgStorage::connect(url).await?))
        }
        None => {
            tracing::info!(path = %config.db_path, "using sqlite storage");
            Ok(Arc::new(SqliteStorage::connect(&config.db_path).await?))
        }
    }
}

// Postgres prepared statements cannot contain multiple commands, so schema
// files are split and executed one statement at a time.
pub(crate) fn schema_statements(schema: &str) -> impl Iterator<Item = String> + '_ {
    schema
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(|stmt| format!("{stmt};"))
}
