use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{CommentView, ProductPage};
use super::repo;
use super::services::{average_rating, validate_comment};
use crate::{
    auth::{AuthUser, MaybeAuthUser},
    catalog::{handlers::product_view, repo as catalog_repo},
    error::{AppError, AppResult},
    images::services::{check_image, discard_on_err, presign_optional, read_multipart, upload_image},
    orders::repo::user_has_ordered,
    state::AppState,
};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/product/:id/", get(product_detail).post(submit_comment))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

#[instrument(skip(state))]
pub async fn product_detail(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductPage>> {
    let product = catalog_repo::find_product(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let comments = repo::list_for_product(&state.db, id).await?;
    let ratings: Vec<i16> = comments.iter().map(|c| c.rating).collect();

    let mut views = Vec::with_capacity(comments.len());
    for c in comments {
        let url = presign_optional(&state, c.file_key.as_deref()).await?;
        views.push(CommentView::new(c, url));
    }

    let can_comment = match user {
        Some(u) => user_has_ordered(&state.db, u.id, id).await?,
        None => false,
    };

    Ok(Json(ProductPage {
        product: product_view(&state, product).await?,
        comments: views,
        average_rating: average_rating(&ratings),
        can_comment,
    }))
}

/// Only buyers of the product may comment; the check runs before the form is read.
#[instrument(skip(state, mp))]
pub async fn submit_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    mp: Multipart,
) -> AppResult<Redirect> {
    catalog_repo::find_product(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    if !user_has_ordered(&state.db, user.id, id).await? {
        warn!(user_id = %user.id, product_id = id, "comment rejected: no prior order");
        return Err(AppError::Forbidden(
            "You can only review products you have purchased.".into(),
        ));
    }

    let form = read_multipart(mp, "file").await?;
    let input = validate_comment(&form)?;
    if let Some(file) = &form.file {
        check_image(file, "file")?;
    }

    let file_key = match form.file {
        Some(file) => Some(upload_image(&state, "comments", file).await?),
        None => None,
    };
    let inserted = repo::insert(&state.db, id, user.id, &input, file_key.as_deref()).await;
    let comment_id = discard_on_err(&state, file_key.as_deref(), inserted).await?;

    info!(comment_id, product_id = id, rating = input.rating, "comment added");
    Ok(Redirect::to(&format!("/product/{}/", id)))
}
