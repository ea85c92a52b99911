use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Order, StockRow};

const ORDER_COLUMNS: &str =
    "id, user_id, phone, quantity, product_id, product_name, price, created_at";

/// Row-locks the product until the transaction ends.
pub async fn lock_product_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
) -> Result<Option<StockRow>, sqlx::Error> {
    sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, name, price, discount, stock
          FROM products
         WHERE id = $1
           FOR UPDATE
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn decrement_stock_tx(
    tx: &mut Transaction<'_, Postgres>,
    product_id: i64,
    quantity: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock - $1, updated_at = now() WHERE id = $2")
        .bind(quantity)
        .bind(product_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn insert_order_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    product: &StockRow,
    phone: &str,
    quantity: i32,
    price: Decimal,
) -> Result<Order, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (user_id, phone, quantity, product_id, product_name, price)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(phone)
    .bind(quantity)
    .bind(product.id)
    .bind(&product.name)
    .bind(price)
    .fetch_one(&mut **tx)
    .await
}

// ---- Queries ----

pub async fn list_all(db: &PgPool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(db)
    .await
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn user_has_ordered(db: &PgPool, user_id: Uuid, product_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM orders WHERE user_id = $1 AND product_id = $2)",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(db)
    .await
}
