use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    models::{
        AdminOrder, AdminOrderItem, CartLine, NewProduct, OrderDraft, OrderStatus, Product,
        ProfileUpdate, RecentPurchase, User,
    },
    steam::SteamProfile,
    storage::{Storage, StorageResult, schema_statements},
};

const SCHEMA: &str = include_str!("../../migrations/sqlite.sql");

/// Embedded single-file store. An in-memory database (`sqlite::memory:`)
/// must stay on a single connection or every connection sees its own empty
/// database.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(path: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(path)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if path.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        let storage = Self { pool };
        storage.bootstrap().await?;
        Ok(storage)
    }

    async fn bootstrap(&self) -> StorageResult<()> {
        for stmt in schema_statements(SCHEMA) {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn upsert_user(&self, profile: &SteamProfile) -> StorageResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (steam_id, display_name, avatar, profile_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (steam_id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar = excluded.avatar,
                profile_url = excluded.profile_url,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *
            "#,
        )
        .bind(&profile.steam_id)
        .bind(&profile.display_name)
        .bind(&profile.avatar)
        .bind(&profile.profile_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn user_by_steam_id(&self, steam_id: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE steam_id = ?")
            .bind(steam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user_profile(
        &self,
        steam_id: &str,
        update: &ProfileUpdate,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET roleplay_name = ?, phone_number = ?, bank_number = ?, email = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE steam_id = ?
            "#,
        )
        .bind(&update.roleplay_name)
        .bind(&update.phone_number)
        .bind(&update.bank_number)
        .bind(&update.email)
        .bind(steam_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn grant_admin(&self, steam_id: &str) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_admin = 1, updated_at = CURRENT_TIMESTAMP WHERE steam_id = ?",
        )
        .bind(steam_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_product(&self, draft: &NewProduct) -> StorageResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, description, price, image_url, category, stock_quantity)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(&draft.image_url)
        .bind(&draft.category)
        .bind(draft.stock_quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list_active_products(&self) -> StorageResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = 1 ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn active_product_by_id(&self, id: i64) -> StorageResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ? AND is_active = 1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn deactivate_product(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn put_cart_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cart_lines(&self, user_id: i64) -> StorageResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT ci.id, ci.user_id, ci.product_id, ci.quantity,
                   p.name, p.price, p.image_url
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = ? AND p.is_active = 1
            ORDER BY ci.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn place_order(&self, draft: &OrderDraft) -> StorageResult<i64> {
        let mut txn = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (user_id, total_amount, customer_notes) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(draft.user_id)
        .bind(draft.total_amount)
        .bind(&draft.customer_notes)
        .fetch_one(&mut *txn)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *txn)
            .await?;

            sqlx::query("INSERT INTO recent_purchases (product_name, buyer_name) VALUES (?, ?)")
                .bind(&line.product_name)
                .bind(&draft.buyer_name)
                .execute(&mut *txn)
                .await?;

            sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
                .bind(draft.user_id)
                .bind(line.product_id)
                .execute(&mut *txn)
                .await?;
        }

        txn.commit().await?;
        Ok(order_id)
    }

    async fn list_orders(&self) -> StorageResult<Vec<AdminOrder>> {
        let mut orders = sqlx::query_as::<_, AdminOrder>(
            r#"
            SELECT o.*, u.display_name, u.roleplay_name, u.phone_number, u.bank_number, u.email
            FROM orders o
            JOIN users u ON o.user_id = u.id
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        for order in &mut orders {
            order.items = sqlx::query_as::<_, AdminOrderItem>(
                r#"
                SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
                       p.name AS product_name
                FROM order_items oi
                JOIN products p ON oi.product_id = p.id
                WHERE oi.order_id = ?
                "#,
            )
            .bind(order.id)
            .fetch_all(&self.pool)
            .await?;
        }

        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        admin_notes: Option<&str>,
    ) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?, admin_notes = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(admin_notes)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn recent_purchases(&self, limit: i64) -> StorageResult<Vec<RecentPurchase>> {
        let purchases = sqlx::query_as::<_, RecentPurchase>(
            "SELECT * FROM recent_purchases ORDER BY purchase_time DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(purchases)
    }
}
