use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{CommentInput, ProductComment};

/// Comments of a product, newest first, with the author's phone joined in.
pub async fn list_for_product(db: &PgPool, product_id: i64) -> Result<Vec<ProductComment>, sqlx::Error> {
    sqlx::query_as::<_, ProductComment>(
        r#"
        SELECT c.id, c.product_id, c.user_id, u.phone_number AS author_phone,
               c.comment, c.rating, c.file_key, c.created_at
          FROM product_comments c
          JOIN users u ON u.id = c.user_id
         WHERE c.product_id = $1
         ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(db)
    .await
}

pub async fn insert(
    db: &PgPool,
    product_id: i64,
    user_id: Uuid,
    input: &CommentInput,
    file_key: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO product_comments (product_id, user_id, comment, rating, file_key)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .bind(&input.comment)
    .bind(input.rating)
    .bind(file_key)
    .fetch_one(db)
    .await
}
