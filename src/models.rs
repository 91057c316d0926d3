use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Prices are stored as integer cents; decimal strings are parsed at the
/// admin boundary and formatted back only for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub steam_id: String,
    pub display_name: String,
    pub avatar: Option<String>,
    pub profile_url: Option<String>,
    pub roleplay_name: Option<String>,
    pub phone_number: Option<String>,
    pub bank_number: Option<String>,
    pub email: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Checkout requires these three profile fields to be filled in.
    pub fn has_complete_profile(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
        filled(&self.roleplay_name) && filled(&self.phone_number) && filled(&self.bank_number)
    }

    pub fn buyer_name(&self) -> &str {
        self.roleplay_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.display_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub stock_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart row joined with the live product it points at. The price here is
/// the current product price, not a snapshot; snapshots happen at checkout.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub name: String,
    pub price: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct RecentPurchase {
    pub id: i64,
    pub product_name: String,
    pub buyer_name: String,
    pub purchase_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order header joined with the purchaser's profile, as the admin panel
/// consumes it. `items` is filled in by a second query.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminOrder {
    pub id: i64,
    pub user_id: i64,
    pub total_amount: i64,
    pub status: String,
    pub customer_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub display_name: String,
    pub roleplay_name: Option<String>,
    pub phone_number: Option<String>,
    pub bank_number: Option<String>,
    pub email: Option<String>,
    #[sqlx(skip)]
    pub items: Vec<AdminOrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
pub struct AdminOrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    pub price: i64,
    pub product_name: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub category: String,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub roleplay_name: String,
    pub phone_number: String,
    pub bank_number: String,
    pub email: Option<String>,
}

/// Everything `place_order` persists in one transaction: the order header,
/// one item row per line (price snapshotted), one recent-purchase entry per
/// line, and the removal of the corresponding cart rows.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: i64,
    pub total_amount: i64,
    pub customer_notes: Option<String>,
    pub buyer_name: String,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(roleplay: Option<&str>, phone: Option<&str>, bank: Option<&str>) -> User {
        User {
            id: 1,
            steam_id: "76561198000000001".into(),
            display_name: "gamer".into(),
            avatar: None,
            profile_url: None,
            roleplay_name: roleplay.map(Into::into),
            phone_number: phone.map(Into::into),
            bank_number: bank.map(Into::into),
            email: None,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn profile_complete_requires_all_three_fields() {
        assert!(user_with(Some("John Doe"), Some("555"), Some("123")).has_complete_profile());
        assert!(!user_with(None, Some("555"), Some("123")).has_complete_profile());
        assert!(!user_with(Some("John Doe"), Some(""), Some("123")).has_complete_profile());
    }

    #[test]
    fn buyer_name_falls_back_to_display_name() {
        assert_eq!(user_with(Some("John Doe"), None, None).buyer_name(), "John Doe");
        assert_eq!(user_with(None, None, None).buyer_name(), "gamer");
        assert_eq!(user_with(Some(""), None, None).buyer_name(), "gamer");
    }

    #[test]
    fn order_status_round_trips_known_values() {
        for s in ["pending", "processing", "completed", "cancelled"] {
            assert_eq!(OrderStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(OrderStatus::from_str("shipped").is_err());
        assert!(OrderStatus::from_str("").is_err());
    }
}
