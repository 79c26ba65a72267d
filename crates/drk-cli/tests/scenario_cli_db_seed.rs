//! `drk db migrate` and `drk db seed` against a real database.
//!
//! DB-backed test, skipped if DRK_DATABASE_URL is not set.

use predicates::prelude::*;
use std::fs;

#[allow(deprecated)]
#[tokio::test]
async fn cli_migrate_then_seed_catalog() -> anyhow::Result<()> {
    let url = match std::env::var(drk_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: DRK_DATABASE_URL not set");
            return Ok(());
        }
    };

    // Run from an empty dir so no config/base.yaml is picked up.
    let dir = tempfile::tempdir()?;

    assert_cmd::Command::cargo_bin("drk")?
        .current_dir(dir.path())
        .env(drk_db::ENV_DB_URL, &url)
        .env_remove(drk_config::ENV_CONFIG_PATHS)
        .args(["db", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrations_applied=true"));

    let product_id = 1_900_000_000 + (std::process::id() as i32 % 1_000_000);
    let catalog = dir.path().join("catalog.yaml");
    fs::write(
        &catalog,
        format!(
            "stores:\n  - store_id: {product_id}\n    name: CLI 測試門市\nproducts:\n  - product_id: {product_id}\n    name: CLI 測試綠茶\n    photo_url: static/product_images/green_tea.jpg\n    price: 35\n"
        ),
    )?;

    assert_cmd::Command::cargo_bin("drk")?
        .current_dir(dir.path())
        .env(drk_db::ENV_DB_URL, &url)
        .env_remove(drk_config::ENV_CONFIG_PATHS)
        .args(["db", "seed", "--catalog"])
        .arg(&catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("seeded_stores=1 seeded_products=1"));

    let pool = drk_db::connect(&url, 2).await?;
    let product = drk_db::fetch_product(&pool, product_id)
        .await?
        .expect("seeded product");
    assert_eq!(product.price, 35);
    assert!(drk_db::fetch_store(&pool, product_id).await?.is_some());

    assert_cmd::Command::cargo_bin("drk")?
        .current_dir(dir.path())
        .env(drk_db::ENV_DB_URL, &url)
        .env_remove(drk_config::ENV_CONFIG_PATHS)
        .args(["db", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("db_ok=true has_order_table=true"))
        .stdout(predicate::str::contains("has_status=true"))
        .stdout(predicate::str::contains("item_sweetness=sweet item_has_note=true"));

    Ok(())
}
