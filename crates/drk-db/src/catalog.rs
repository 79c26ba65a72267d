//! Stores and products: static reference data.

use anyhow::{Context, Result};
use drk_schemas::{Product, Store};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};

pub async fn list_products(pool: &PgPool) -> Result<Vec<Product>> {
    let rows = sqlx::query(
        r#"
        select product_id, name, photo_url, price
        from product
        order by product_id
        "#,
    )
    .fetch_all(pool)
    .await
    .context("list_products failed")?;

    rows.iter().map(product_from_row).collect()
}

pub async fn fetch_product(pool: &PgPool, product_id: i32) -> Result<Option<Product>> {
    let row = sqlx::query(
        r#"
        select product_id, name, photo_url, price
        from product
        where product_id = $1
        "#,
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await
    .context("fetch_product failed")?;

    row.as_ref().map(product_from_row).transpose()
}

pub async fn list_stores(pool: &PgPool) -> Result<Vec<Store>> {
    let rows = sqlx::query("select store_id, name from store order by store_id")
        .fetch_all(pool)
        .await
        .context("list_stores failed")?;

    rows.iter()
        .map(|r| {
            Ok(Store {
                store_id: r.try_get("store_id")?,
                name: r.try_get("name")?,
            })
        })
        .collect()
}

pub async fn fetch_store(pool: &PgPool, store_id: i32) -> Result<Option<Store>> {
    let row = sqlx::query("select store_id, name from store where store_id = $1")
        .bind(store_id)
        .fetch_optional(pool)
        .await
        .context("fetch_store failed")?;

    match row {
        Some(r) => Ok(Some(Store {
            store_id: r.try_get("store_id")?,
            name: r.try_get("name")?,
        })),
        None => Ok(None),
    }
}

fn product_from_row(r: &sqlx::postgres::PgRow) -> Result<Product> {
    Ok(Product {
        product_id: r.try_get("product_id")?,
        name: r.try_get("name")?,
        photo_url: r.try_get("photo_url")?,
        price: r.try_get("price")?,
    })
}

/// Reference data loaded by `drk db seed`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub stores: Vec<Store>,
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub stores: usize,
    pub products: usize,
}

/// Upsert every store and product in one transaction.
pub async fn seed_catalog(pool: &PgPool, catalog: &Catalog) -> Result<SeedReport> {
    let mut tx = pool.begin().await.context("seed_catalog begin failed")?;

    for s in &catalog.stores {
        sqlx::query(
            r#"
            insert into store (store_id, name) values ($1, $2)
            on conflict (store_id) do update set name = excluded.name
            "#,
        )
        .bind(s.store_id)
        .bind(&s.name)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("seed store {} failed", s.store_id))?;
    }

    for p in &catalog.products {
        sqlx::query(
            r#"
            insert into product (product_id, name, photo_url, price) values ($1, $2, $3, $4)
            on conflict (product_id) do update
              set name = excluded.name,
                  photo_url = excluded.photo_url,
                  price = excluded.price
            "#,
        )
        .bind(p.product_id)
        .bind(&p.name)
        .bind(&p.photo_url)
        .bind(p.price)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("seed product {} failed", p.product_id))?;
    }

    tx.commit().await.context("seed_catalog commit failed")?;

    Ok(SeedReport {
        stores: catalog.stores.len(),
        products: catalog.products.len(),
    })
}
