//! Catalog queries and edits against a real Postgres; skipped unless `DATABASE_URL` is set.

mod common;

use storefront::{
    catalog::{
        dto::ProductFilter,
        repo as catalog_repo,
        repo_types::{Product, ProductInput},
        services::SortMode,
    },
    orders::services::place_order,
};

use common::{category, customer, dec, pool, product, product_in};

fn names(products: &[Product]) -> Vec<&str> {
    products.iter().map(|p| p.name.as_str()).collect()
}

/// Three products in a category of their own, so other tests' rows never match.
async fn seeded_category(db: &sqlx::PgPool) -> i64 {
    let category_id = category(db, "Accessories").await;
    product_in(db, category_id, "iPHONE case", "Silicone", "5.00").await;
    product_in(db, category_id, "Charger", "Fits any PhOnE", "3.00").await;
    product_in(db, category_id, "Laptop stand", "Aluminium", "40.00").await;
    category_id
}

#[tokio::test]
async fn search_matches_name_or_description_ignoring_case() {
    let Some(db) = pool().await else { return };
    let category_id = seeded_category(&db).await;

    let found = catalog_repo::list_products(
        &db,
        &ProductFilter {
            search: Some("phone".into()),
            category_id: Some(category_id),
            sort: SortMode::Default,
        },
    )
    .await
    .unwrap();
    assert_eq!(names(&found), ["iPHONE case", "Charger"]);

    let none = catalog_repo::list_products(
        &db,
        &ProductFilter {
            search: Some("tablet".into()),
            category_id: Some(category_id),
            sort: SortMode::Default,
        },
    )
    .await
    .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn cheap_and_expensive_order_by_price() {
    let Some(db) = pool().await else { return };
    let category_id = seeded_category(&db).await;
    let listed = |sort: SortMode| {
        let db = db.clone();
        async move {
            catalog_repo::list_products(
                &db,
                &ProductFilter {
                    search: None,
                    category_id: Some(category_id),
                    sort,
                },
            )
            .await
            .unwrap()
        }
    };

    let cheap = listed(SortMode::Cheap).await;
    assert_eq!(names(&cheap), ["Charger", "iPHONE case", "Laptop stand"]);
    assert!(cheap.windows(2).all(|w| w[0].price <= w[1].price));

    let expensive = listed(SortMode::Expensive).await;
    assert_eq!(names(&expensive), ["Laptop stand", "iPHONE case", "Charger"]);
    assert!(expensive.windows(2).all(|w| w[0].price >= w[1].price));

    let searched = catalog_repo::list_products(
        &db,
        &ProductFilter {
            search: Some("PHONE".into()),
            category_id: Some(category_id),
            sort: SortMode::Cheap,
        },
    )
    .await
    .unwrap();
    assert_eq!(names(&searched), ["Charger", "iPHONE case"]);
    assert_eq!(searched[0].price, dec("3.00"));
}

#[tokio::test]
async fn edit_from_a_stale_form_keeps_the_ordered_stock() {
    let Some(db) = pool().await else { return };
    let buyer = customer(&db).await;
    let product_id = product(&db, "10.00", "0", 5).await;
    let loaded = catalog_repo::find_product(&db, product_id)
        .await
        .unwrap()
        .unwrap();

    place_order(&db, buyer.id, product_id, &buyer.phone_number, 2)
        .await
        .unwrap();

    let edit = ProductInput {
        name: loaded.name.clone(),
        price: loaded.price,
        description: loaded.description.clone(),
        stock: loaded.stock,
        discount: loaded.discount,
        category_id: loaded.category_id,
    };
    let stale = catalog_repo::update_product(&db, product_id, &edit, None, loaded.updated_at)
        .await
        .unwrap();
    assert!(stale.is_none());
    assert_eq!(common::stock_of(&db, product_id).await, 3);

    let current = catalog_repo::find_product(&db, product_id)
        .await
        .unwrap()
        .unwrap();
    let saved = catalog_repo::update_product(&db, product_id, &edit, None, current.updated_at)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.stock, 5);
    assert!(saved.updated_at > current.updated_at);
}
