use crate::error::{AppResult, FieldErrors};
use crate::images::services::MultipartForm;

use super::repo_types::CommentInput;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Arithmetic mean of the ratings; 0 when there are none.
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    sum as f64 / ratings.len() as f64
}

pub fn validate_comment(form: &MultipartForm) -> AppResult<CommentInput> {
    let mut errors = FieldErrors::new();

    let comment = form.text("comment").trim().to_string();
    if comment.is_empty() {
        errors.add("comment", "This field is required.");
    }

    let rating = match form.text("rating").trim().parse::<i16>() {
        Ok(r) if (MIN_RATING..=MAX_RATING).contains(&r) => r,
        _ => {
            errors.add(
                "rating",
                format!("Select a rating from {MIN_RATING} to {MAX_RATING}."),
            );
            0
        }
    };

    errors.into_result()?;
    Ok(CommentInput { comment, rating })
}
