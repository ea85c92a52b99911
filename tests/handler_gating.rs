//! Handlers called directly with a real pool and in-memory storage;
//! skipped unless `DATABASE_URL` is set.

mod common;

use axum::extract::{Path, State};
use storefront::{
    auth::{services::require_admin, Role},
    catalog::{handlers::edit_product, repo as catalog_repo},
    comments::{handlers::submit_comment, repo as comments_repo},
    error::AppError,
    orders::services::place_order,
};
use time::format_description::well_known::Rfc3339;

use common::{admin, as_caller, customer, multipart, pool, product, state, stock_of};

#[tokio::test]
async fn non_buyer_cannot_comment_through_the_handler() {
    let Some(db) = pool().await else { return };
    let (state, storage) = state(db.clone());
    let stranger = customer(&db).await;
    let product_id = product(&db, "10.00", "0", 10).await;

    let mp = multipart(&state, &[("comment", "Great"), ("rating", "5")], Some("file")).await;
    let res = submit_comment(State(state.clone()), as_caller(&stranger), Path(product_id), mp).await;

    assert!(matches!(res, Err(AppError::Forbidden(_))));
    assert!(comments_repo::list_for_product(&db, product_id)
        .await
        .unwrap()
        .is_empty());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn buyer_comment_is_stored_with_its_attachment() {
    let Some(db) = pool().await else { return };
    let (state, storage) = state(db.clone());
    let buyer = customer(&db).await;
    let product_id = product(&db, "10.00", "0", 10).await;
    place_order(&db, buyer.id, product_id, &buyer.phone_number, 1)
        .await
        .unwrap();

    let mp = multipart(&state, &[("comment", "Great"), ("rating", "4")], Some("file")).await;
    submit_comment(State(state.clone()), as_caller(&buyer), Path(product_id), mp)
        .await
        .unwrap();

    let comments = comments_repo::list_for_product(&db, product_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].rating, 4);
    let key = comments[0].file_key.as_deref().unwrap();
    assert!(storage.contains(key));
}

#[tokio::test]
async fn demoted_admin_loses_rights_before_token_expiry() {
    let Some(db) = pool().await else { return };
    let user = admin(&db).await;
    let token_claims = as_caller(&user);
    assert_eq!(token_claims.role, Role::Admin);

    require_admin(&db, &token_claims, "create products").await.unwrap();

    sqlx::query("UPDATE users SET role = 'customer' WHERE id = $1")
        .bind(user.id)
        .execute(&db)
        .await
        .unwrap();

    assert!(matches!(
        require_admin(&db, &token_claims, "create products").await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn stale_edit_is_refused_and_its_upload_discarded() {
    let Some(db) = pool().await else { return };
    let (state, storage) = state(db.clone());
    let editor = admin(&db).await;
    let buyer = customer(&db).await;
    let product_id = product(&db, "10.00", "0", 5).await;
    let loaded = catalog_repo::find_product(&db, product_id)
        .await
        .unwrap()
        .unwrap();
    let version = loaded.updated_at.format(&Rfc3339).unwrap();
    let category = loaded.category_id.to_string();
    let form = [
        ("name", "Phone X"),
        ("price", "10.00"),
        ("stock", "5"),
        ("discount", "0"),
        ("category", category.as_str()),
        ("updated_at", version.as_str()),
    ];

    place_order(&db, buyer.id, product_id, &buyer.phone_number, 2)
        .await
        .unwrap();

    let mp = multipart(&state, &form, Some("image")).await;
    let res = edit_product(State(state.clone()), as_caller(&editor), Path(product_id), mp).await;

    assert!(matches!(res, Err(AppError::Conflict(_))));
    assert_eq!(stock_of(&db, product_id).await, 3);
    assert!(storage.is_empty());
}
