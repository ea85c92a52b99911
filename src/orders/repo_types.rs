use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Purchase record; immutable once written.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: Uuid,
    pub phone: String,
    pub quantity: i32,
    pub product_id: Option<i64>, // NULL once the product is deleted
    pub product_name: String,
    pub price: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The columns of a locked product row the order workflow needs.
#[derive(Debug, Clone, FromRow)]
pub struct StockRow {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub discount: Decimal,
    pub stock: i32,
}
