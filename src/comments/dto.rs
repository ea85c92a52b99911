use serde::Serialize;
use time::OffsetDateTime;

use super::repo_types::ProductComment;
use crate::catalog::dto::ProductView;

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub author: String,
    pub comment: String,
    pub rating: i16,
    pub file_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl CommentView {
    pub fn new(c: ProductComment, file_url: Option<String>) -> Self {
        Self {
            id: c.id,
            author: mask_phone(&c.author_phone),
            comment: c.comment,
            rating: c.rating,
            file_url,
            created_at: c.created_at,
        }
    }
}

/// Product detail page: product, its comments and their mean rating.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub product: ProductView,
    pub comments: Vec<CommentView>,
    pub average_rating: f64,
    pub can_comment: bool,
}

/// Shows only the last four digits of a reviewer's phone.
fn mask_phone(phone: &str) -> String {
    let digits = phone.chars().count();
    if digits <= 4 {
        return phone.to_string();
    }
    let tail: String = phone.chars().skip(digits - 4).collect();
    format!("{}{}", "*".repeat(digits - 4), tail)
}
