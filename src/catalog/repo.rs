use sqlx::PgPool;
use time::OffsetDateTime;

use super::dto::ProductFilter;
use super::repo_types::{Category, Product, ProductInput};
use super::services::product_query;

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, price, description, stock, discount, image_key, \
     category_id, created_at, updated_at";

// ---- Categories ----

pub async fn list_categories(db: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, title FROM categories ORDER BY id")
        .fetch_all(db)
        .await
}

pub async fn find_category(db: &PgPool, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT id, title FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn create_category(db: &PgPool, title: &str) -> Result<Category, sqlx::Error> {
    sqlx::query_as::<_, Category>("INSERT INTO categories (title) VALUES ($1) RETURNING id, title")
        .bind(title)
        .fetch_one(db)
        .await
}

/// Fails with a foreign-key violation while products still use the category.
pub async fn delete_category(db: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}

// ---- Products ----

pub async fn list_products(db: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
    let mut qb = product_query(filter);
    qb.build_query_as::<Product>().fetch_all(db).await
}

pub async fn find_product(db: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn create_product(
    db: &PgPool,
    input: &ProductInput,
    image_key: Option<&str>,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (name, price, description, stock, discount, image_key, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(input.stock)
    .bind(input.discount)
    .bind(image_key)
    .bind(input.category_id)
    .fetch_one(db)
    .await
}

/// Replaces every editable field; `image_key` of `None` keeps the stored image.
/// Matches nothing unless the row still carries `expected_updated_at`, so an
/// order committed after the form was loaded is never overwritten.
pub async fn update_product(
    db: &PgPool,
    id: i64,
    input: &ProductInput,
    image_key: Option<&str>,
    expected_updated_at: OffsetDateTime,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
           SET name = $2, price = $3, description = $4, stock = $5, discount = $6,
               image_key = COALESCE($7, image_key), category_id = $8, updated_at = now()
         WHERE id = $1 AND updated_at = $9
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&input.name)
    .bind(input.price)
    .bind(&input.description)
    .bind(input.stock)
    .bind(input.discount)
    .bind(image_key)
    .bind(input.category_id)
    .bind(expected_updated_at)
    .fetch_optional(db)
    .await
}

/// Returns the deleted row so its image can be cleaned up.
pub async fn delete_product(db: &PgPool, id: i64) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "DELETE FROM products WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
}
