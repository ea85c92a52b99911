use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::OrderRequest;
use super::repo;
use super::repo_types::Order;
use super::services::place_order;
use crate::{
    auth::{services::is_admin_now, AuthUser, User},
    error::{AppError, AppResult, FieldErrors},
    state::AppState,
};

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/products/:id/order", post(create_order))
        .route("/orders", get(list_orders))
}

#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<i64>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> AppResult<Redirect> {
    let Json(payload) = payload.map_err(|e| {
        AppError::Validation(FieldErrors::single("quantity", e.body_text()))
    })?;
    let input = payload.validate()?;

    let phone = match input.phone {
        Some(phone) => phone,
        None => {
            User::find_by_id(&state.db, user.id)
                .await?
                .ok_or(AppError::Unauthorized)?
                .phone_number
        }
    };

    place_order(&state.db, user.id, product_id, &phone, input.quantity).await?;
    Ok(Redirect::to("/"))
}

/// Admins see every order; everyone else only their own.
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = if is_admin_now(&state.db, &user).await? {
        repo::list_all(&state.db).await?
    } else {
        repo::list_by_user(&state.db, user.id).await?
    };
    Ok(Json(orders))
}
