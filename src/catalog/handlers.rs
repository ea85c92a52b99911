use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{
    CatalogPage, CatalogQuery, CategoryFormPage, CategoryRequest, ProductFormPage, ProductView,
};
use super::repo;
use super::repo_types::Product;
use super::services::{parse_version, validate_product, validate_title};
use crate::{
    auth::{services::require_admin, AuthUser},
    error::{AppError, AppResult, FieldErrors},
    images::services::{
        check_image, discard_image, discard_on_err, presign_optional, read_multipart, upload_image,
    },
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories/add", get(add_category_form).post(add_category))
        .route("/categories/:id/delete", post(delete_category))
        .route("/products/add", get(add_product_form).post(add_product))
        .route("/products/:id/edit", get(edit_product_form).post(edit_product))
        .route("/products/:id/delete", get(delete_product_form).post(delete_product))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB
}

pub(crate) async fn product_view(st: &AppState, p: Product) -> AppResult<ProductView> {
    let image_url = presign_optional(st, p.image_key.as_deref()).await?;
    Ok(ProductView::new(p, image_url))
}

async fn product_views(st: &AppState, products: Vec<Product>) -> AppResult<Vec<ProductView>> {
    let mut out = Vec::with_capacity(products.len());
    for p in products {
        out.push(product_view(st, p).await?);
    }
    Ok(out)
}

async fn load_product(st: &AppState, id: i64) -> AppResult<Product> {
    repo::find_product(&st.db, id)
        .await?
        .ok_or(AppError::NotFound("Product"))
}

// --- catalog ---

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<CatalogPage>> {
    let filter = query.into_filter()?;
    if let Some(category_id) = filter.category_id {
        repo::find_category(&state.db, category_id)
            .await?
            .ok_or(AppError::NotFound("Category"))?;
    }

    let categories = repo::list_categories(&state.db).await?;
    let products = repo::list_products(&state.db, &filter).await?;
    Ok(Json(CatalogPage {
        categories,
        products: product_views(&state, products).await?,
        q: filter.search,
        filter_type: filter.sort,
        category: filter.category_id,
    }))
}

// --- categories ---

#[instrument(skip(state))]
pub async fn add_category_form(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<CategoryFormPage>> {
    require_admin(&state.db, &user, "create categories").await?;
    Ok(Json(CategoryFormPage { fields: &["title"] }))
}

#[instrument(skip(state, payload))]
pub async fn add_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CategoryRequest>,
) -> AppResult<Redirect> {
    require_admin(&state.db, &user, "create categories").await?;
    let title = validate_title(&payload.title)?;
    let category = repo::create_category(&state.db, &title).await?;
    info!(category_id = category.id, title = %category.title, "category created");
    Ok(Redirect::to("/"))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    require_admin(&state.db, &user, "delete categories").await?;
    match repo::delete_category(&state.db, id).await {
        Ok(true) => {
            info!(category_id = id, "category deleted");
            Ok(Redirect::to("/"))
        }
        Ok(false) => Err(AppError::NotFound("Category")),
        Err(e) => match AppError::from(e) {
            AppError::Conflict(_) => Err(AppError::Conflict(
                "Category still has products; move or delete them first.".into(),
            )),
            other => Err(other),
        },
    }
}

// --- products ---

#[instrument(skip(state))]
pub async fn add_product_form(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ProductFormPage>> {
    require_admin(&state.db, &user, "create products").await?;
    Ok(Json(ProductFormPage {
        product: None,
        categories: repo::list_categories(&state.db).await?,
    }))
}

async fn ensure_category(st: &AppState, category_id: i64) -> AppResult<()> {
    if repo::find_category(&st.db, category_id).await?.is_none() {
        return Err(AppError::Validation(FieldErrors::single(
            "category",
            "Select a valid category.",
        )));
    }
    Ok(())
}

#[instrument(skip(state, mp))]
pub async fn add_product(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Multipart,
) -> AppResult<Redirect> {
    require_admin(&state.db, &user, "create products").await?;
    let form = read_multipart(mp, "image").await?;
    let input = validate_product(&form)?;
    if let Some(img) = &form.file {
        check_image(img, "image")?;
    }
    ensure_category(&state, input.category_id).await?;

    let image_key = match form.file {
        Some(img) => Some(upload_image(&state, "products", img).await?),
        None => None,
    };
    let created = repo::create_product(&state.db, &input, image_key.as_deref()).await;
    let product = discard_on_err(&state, image_key.as_deref(), created).await?;
    info!(product_id = product.id, name = %product.name, "product created");
    Ok(Redirect::to(&format!("/product/{}/", product.id)))
}

#[instrument(skip(state))]
pub async fn edit_product_form(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductFormPage>> {
    require_admin(&state.db, &user, "edit products").await?;
    let product = load_product(&state, id).await?;
    Ok(Json(ProductFormPage {
        product: Some(product_view(&state, product).await?),
        categories: repo::list_categories(&state.db).await?,
    }))
}

#[instrument(skip(state, mp))]
pub async fn edit_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    mp: Multipart,
) -> AppResult<Redirect> {
    require_admin(&state.db, &user, "edit products").await?;
    let existing = load_product(&state, id).await?;
    let form = read_multipart(mp, "image").await?;
    let input = validate_product(&form)?;
    let version = parse_version(&form)?;
    if let Some(img) = &form.file {
        check_image(img, "image")?;
    }
    ensure_category(&state, input.category_id).await?;

    let new_key = match form.file {
        Some(img) => Some(upload_image(&state, "products", img).await?),
        None => None,
    };
    let saved = repo::update_product(&state.db, id, &input, new_key.as_deref(), version).await;
    let updated = match saved {
        Ok(Some(p)) => Ok(p),
        Ok(None) => Err(stale_edit(&state, id).await),
        Err(e) => Err(AppError::from(e)),
    };
    let updated = discard_on_err(&state, new_key.as_deref(), updated).await?;

    if let (Some(_), Some(old)) = (&new_key, &existing.image_key) {
        discard_image(&state, old).await;
    }
    info!(product_id = updated.id, stock = updated.stock, "product updated");
    Ok(Redirect::to(&format!("/product/{}/", updated.id)))
}

/// Why an edit carrying `updated_at` matched no row.
async fn stale_edit(st: &AppState, id: i64) -> AppError {
    match repo::find_product(&st.db, id).await {
        Ok(Some(current)) => {
            warn!(
                product_id = id,
                stock = current.stock,
                "edit rejected: product changed since form was loaded"
            );
            AppError::Conflict(
                "This product changed after the form was opened (for example an order was placed). \
                 Reload the form and try again."
                    .into(),
            )
        }
        Ok(None) => AppError::NotFound("Product"),
        Err(e) => e.into(),
    }
}

#[instrument(skip(state))]
pub async fn delete_product_form(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductView>> {
    require_admin(&state.db, &user, "delete products").await?;
    let product = load_product(&state, id).await?;
    Ok(Json(product_view(&state, product).await?))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    require_admin(&state.db, &user, "delete products").await?;
    let deleted = repo::delete_product(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;
    if let Some(key) = &deleted.image_key {
        discard_image(&state, key).await;
    }
    info!(product_id = id, "product deleted");
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use axum::{
        body::Body,
        extract::FromRequest,
        http::{header, Request},
    };
    use uuid::Uuid;

    fn customer() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role: Role::Customer,
        }
    }

    #[tokio::test]
    async fn customers_cannot_open_admin_forms() {
        let state = AppState::fake();
        assert!(matches!(
            add_product_form(State(state.clone()), customer()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            add_category_form(State(state.clone()), customer()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            edit_product_form(State(state.clone()), customer(), Path(1)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            delete_product_form(State(state), customer(), Path(1)).await,
            Err(AppError::Forbidden(_))
        ));
    }

    fn multipart_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/products/add")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=X")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn customers_cannot_create_products() {
        let state = AppState::fake();
        let body = "--X\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nPhone\r\n--X--\r\n";
        for _ in 0..5 {
            let mp = Multipart::from_request(multipart_request(body), &state)
                .await
                .unwrap();
            let res = add_product(State(state.clone()), customer(), mp).await;
            assert!(matches!(res, Err(AppError::Forbidden(_))));
        }
    }

    #[tokio::test]
    async fn customers_cannot_mutate_catalog() {
        let state = AppState::fake();
        for _ in 0..5 {
            let res = add_category(
                State(state.clone()),
                customer(),
                Json(CategoryRequest {
                    title: "Phones".into(),
                }),
            )
            .await;
            assert!(matches!(res, Err(AppError::Forbidden(_))));
        }
        assert!(matches!(
            delete_product(State(state.clone()), customer(), Path(1)).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            delete_category(State(state), customer(), Path(1)).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
