use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct ProductComment {
    pub id: i64,
    pub product_id: i64,
    pub user_id: Uuid,
    pub author_phone: String,
    pub comment: String,
    pub rating: i16,
    pub file_key: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInput {
    pub comment: String,
    pub rating: i16,
}
