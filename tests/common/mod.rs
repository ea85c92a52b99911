//! Helpers shared by the Postgres-backed tests.
#![allow(dead_code)]

use std::{str::FromStr, sync::Arc};

use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{header, Request},
};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use storefront::{
    auth::{repo_types::NewUser, AuthUser, User},
    catalog::{repo as catalog_repo, repo_types::ProductInput},
    contact::mailer::MemoryMailer,
    state::AppState,
    storage::MemoryStorage,
};

/// `None` unless `DATABASE_URL` is set; migrations are applied on connect.
pub async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("migrations");
    Some(db)
}

/// Real pool with in-memory storage; the storage handle is returned for inspection.
pub fn state(db: PgPool) -> (AppState, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::default());
    let state = AppState::from_parts(
        db,
        Arc::new(AppState::fake_config()),
        storage.clone(),
        Arc::new(MemoryMailer::default()),
    );
    (state, storage)
}

pub async fn customer(db: &PgPool) -> User {
    let phone = format!("+9989{:08}", rand::random::<u32>() % 100_000_000);
    User::create(
        db,
        &NewUser {
            phone_number: phone,
            email: None,
            password_hash: "not-a-real-hash".into(),
        },
    )
    .await
    .expect("create user")
}

pub async fn admin(db: &PgPool) -> User {
    let user = customer(db).await;
    assert!(User::promote_to_admin(db, &user.phone_number).await.unwrap());
    User::find_by_id(db, user.id).await.unwrap().unwrap()
}

pub fn as_caller(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        role: user.role,
    }
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub async fn category(db: &PgPool, title: &str) -> i64 {
    catalog_repo::create_category(db, title).await.unwrap().id
}

pub async fn product_in(
    db: &PgPool,
    category_id: i64,
    name: &str,
    description: &str,
    price: &str,
) -> i64 {
    catalog_repo::create_product(
        db,
        &ProductInput {
            name: name.into(),
            price: dec(price),
            description: description.into(),
            stock: 10,
            discount: Decimal::ZERO,
            category_id,
        },
        None,
    )
    .await
    .unwrap()
    .id
}

/// A "Phone X" in a fresh "Phones" category.
pub async fn product(db: &PgPool, price: &str, discount: &str, stock: i32) -> i64 {
    let category_id = category(db, "Phones").await;
    catalog_repo::create_product(
        db,
        &ProductInput {
            name: "Phone X".into(),
            price: dec(price),
            description: "A phone".into(),
            stock,
            discount: dec(discount),
            category_id,
        },
        None,
    )
    .await
    .unwrap()
    .id
}

pub async fn stock_of(db: &PgPool, id: i64) -> i32 {
    catalog_repo::find_product(db, id).await.unwrap().unwrap().stock
}

/// Builds a multipart form with text fields and an optional PNG under `file_field`.
pub async fn multipart(
    state: &AppState,
    fields: &[(&str, &str)],
    file_field: Option<&str>,
) -> Multipart {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--X\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    if let Some(name) = file_field {
        body.extend_from_slice(
            format!(
                "--X\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"a.png\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"\x89PNG\r\n");
    }
    body.extend_from_slice(b"--X--\r\n");

    let req = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
        .body(Body::from(body))
        .unwrap();
    Multipart::from_request(req, state).await.unwrap()
}
