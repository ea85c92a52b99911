use anyhow::Context;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::dto::{OrderInput, OrderRequest};
use super::repo;
use super::repo_types::Order;
use crate::auth::services::{is_valid_phone, PHONE_FORMAT_MESSAGE};
use crate::catalog::services::discounted_unit_price;
use crate::error::{AppError, AppResult, FieldErrors};

impl OrderRequest {
    /// `quantity` must be a positive whole number, given as a JSON number or numeric string.
    pub fn validate(self) -> AppResult<OrderInput> {
        let mut errors = FieldErrors::new();

        let quantity = match &self.quantity {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let quantity = match quantity.map(i32::try_from) {
            Some(Ok(q)) if q > 0 => q,
            Some(Ok(_)) => {
                errors.add("quantity", "Quantity must be at least 1.");
                0
            }
            _ => {
                errors.add("quantity", "Enter a whole number.");
                0
            }
        };

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if let Some(p) = &phone {
            if !is_valid_phone(p) {
                errors.add("phone", PHONE_FORMAT_MESSAGE);
            }
        }

        errors.into_result()?;
        Ok(OrderInput { quantity, phone })
    }
}

/// Largest total `orders.price NUMERIC(22, 2)` can hold.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(2_990_538_751, 434_162_106, 542, false, 2);

/// Total for `quantity` units, or the stock shortfall.
pub fn quote(
    price: Decimal,
    discount_percent: Decimal,
    stock: i32,
    quantity: i32,
) -> AppResult<Decimal> {
    if quantity > stock {
        return Err(AppError::InsufficientStock {
            requested: quantity,
            available: stock,
        });
    }
    let total = discounted_unit_price(price, discount_percent)
        .checked_mul(Decimal::from(quantity))
        .filter(|total| *total <= MAX_ORDER_TOTAL);
    total.ok_or_else(|| {
        AppError::Validation(FieldErrors::single(
            "quantity",
            "Order total is too large; order fewer items.",
        ))
    })
}

/// Checks stock, decrements it and records the order in one transaction.
/// The product row stays locked from the check until commit, so concurrent
/// orders for the same product are serialised and cannot oversell.
pub async fn place_order(
    db: &PgPool,
    user_id: Uuid,
    product_id: i64,
    phone: &str,
    quantity: i32,
) -> AppResult<Order> {
    let mut tx = db.begin().await.context("begin tx")?;

    let product = repo::lock_product_tx(&mut tx, product_id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    // Returning early drops `tx`, which rolls back and releases the lock.
    let price = match quote(product.price, product.discount, product.stock, quantity) {
        Ok(price) => price,
        Err(e) => {
            warn!(product_id, quantity, stock = product.stock, "insufficient stock");
            return Err(e);
        }
    };

    repo::decrement_stock_tx(&mut tx, product_id, quantity).await?;
    let order = repo::insert_order_tx(&mut tx, user_id, &product, phone, quantity, price).await?;
    tx.commit().await.context("commit tx")?;

    info!(
        order_id = order.id,
        product_id,
        quantity,
        price = %order.price,
        remaining = product.stock - quantity,
        "order placed"
    );
    Ok(order)
}
