use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    models::{
        AdminOrder, AdminOrderItem, CartLine, NewProduct, OrderDraft, OrderStatus, Product,
        ProfileUpdate, RecentPurchase, User,
    },
    steam::SteamProfile,
    storage::{Storage, StorageResult, schema_statements},
};

const SCHEMA: &str = include_str!("../../migrations/postgres.sql");

/// Networked relational store. Semantics must stay in lockstep with
/// [`super::SqliteStorage`]; the differences below are placeholder syntax
/// and type spellings only.
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
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
impl Storage for PgStorage {
    async fn upsert_user(&self, profile: &SteamProfile) -> StorageResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (steam_id, display_name, avatar, profile_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (steam_id) DO UPDATE SET
                display_name = EXCLUDED.display_name,
                avatar = EXCLUDED.avatar,
                profile_url = EXCLUDED.profile_url,
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
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE steam_id = $1")
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
            SET roleplay_name = $1, phone_number = $2, bank_number = $3, email = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE steam_id = $5
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
            "UPDATE users SET is_admin = TRUE, updated_at = CURRENT_TIMESTAMP WHERE steam_id = $1",
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
            VALUES ($1, $2, $3, $4, $5, $6)
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
            "SELECT * FROM products WHERE is_active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn active_product_by_id(&self, id: i64) -> StorageResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn deactivate_product(&self, id: i64) -> StorageResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
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
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
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
            WHERE ci.user_id = $1 AND p.is_active = TRUE
            ORDER BY ci.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn place_order(&self, draft: &OrderDraft) -> StorageResult<i64> {
        let mut txn = self.pool.begin().await?;

        let order_id: i64 = sqlx::query_scalar(
            "INSERT INTO orders (user_id, total_amount, customer_notes) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(draft.user_id)
        .bind(draft.total_amount)
        .bind(&draft.customer_notes)
        .fetch_one(&mut *txn)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *txn)
            .await?;

            sqlx::query("INSERT INTO recent_purchases (product_name, buyer_name) VALUES ($1, $2)")
                .bind(&line.product_name)
                .bind(&draft.buyer_name)
                .execute(&mut *txn)
                .await?;

            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
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
                WHERE oi.order_id = $1
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
            "UPDATE orders SET status = $1, admin_notes = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
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
            "SELECT * FROM recent_purchases ORDER BY purchase_time DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(purchases)
    }
}
