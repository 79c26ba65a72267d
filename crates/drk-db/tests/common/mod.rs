//! Shared setup for the DB-backed scenarios.
//!
//! Every scenario skips (returns Ok) when DRK_DATABASE_URL is not set.

#![allow(dead_code)]

use drk_schemas::{NewItem, Product, Store};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn pool_or_skip() -> anyhow::Result<Option<PgPool>> {
    let url = match std::env::var(drk_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: DRK_DATABASE_URL not set");
            return Ok(None);
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await?;
    drk_db::migrate(&pool).await?;
    Ok(Some(pool))
}

/// Random id far above anything a seed file would use.
pub fn fresh_id() -> i32 {
    1_000_000 + (Uuid::new_v4().as_u128() % 1_000_000_000) as i32
}

/// A 10-digit phone that no other test will pick.
pub fn fresh_phone() -> String {
    format!("09{:08}", Uuid::new_v4().as_u128() % 100_000_000)
}

pub async fn fresh_product(pool: &PgPool, price: i32) -> anyhow::Result<Product> {
    let p = Product {
        product_id: fresh_id(),
        name: format!("test-drink-{price}"),
        photo_url: "static/product_images/test.jpg".to_string(),
        price,
    };
    drk_db::seed_catalog(
        pool,
        &drk_db::Catalog {
            stores: vec![],
            products: vec![p.clone()],
        },
    )
    .await?;
    Ok(p)
}

pub async fn fresh_store(pool: &PgPool) -> anyhow::Result<Store> {
    let s = Store {
        store_id: fresh_id(),
        name: "測試門市".to_string(),
    };
    drk_db::seed_catalog(
        pool,
        &drk_db::Catalog {
            stores: vec![s.clone()],
            products: vec![],
        },
    )
    .await?;
    Ok(s)
}

pub fn item(order_id: i32, product_id: i32, quantity: i32) -> NewItem {
    NewItem {
        order_id,
        product_id,
        size: "大杯".to_string(),
        ice: "少冰".to_string(),
        sweet: "半糖".to_string(),
        topping: "珍珠".to_string(),
        quantity,
        note: None,
    }
}
