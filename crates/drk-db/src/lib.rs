//! Postgres access for the drink shop.
//!
//! Every function borrows the shared [`PgPool`]; multi-statement sequences
//! (id allocation + insert, checkout) run in a single transaction. Queries
//! touching optional `order` or `item` columns consult the
//! [`SchemaCapabilities`] probed once at startup.

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub mod capabilities;
pub mod catalog;
pub mod customer;
pub mod orders;

pub use capabilities::{probe_capabilities, SchemaCapabilities, SweetnessColumn};
pub use catalog::{
    fetch_product, fetch_store, list_products, list_stores, seed_catalog, Catalog, SeedReport,
};
pub use customer::{resolve_customer, ResolvedCustomer};
pub use orders::{
    add_item, checkout, complete_order, create_order, delete_item, fetch_line_items, fetch_order,
    fetch_order_summary, list_store_orders, persist_total, recompute_total, set_order_store,
    update_item_quantity, CheckoutOutcome, ItemEdit, OrderFilter,
};

/// Default name of the env var carrying the connection URL.
pub const ENV_DB_URL: &str = "DRK_DATABASE_URL";

/// Connect to Postgres at `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

/// Run embedded SQLx migrations.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("db migrate failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_order_table: bool,
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = current_schema() and table_name = 'order'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    Ok(DbStatus {
        ok: one == 1,
        has_order_table: exists,
    })
}

/// Allocate `max(id) + 1` for `table`. Callers must hold the table lock
/// taken by [`lock_exclusive`] in the same transaction.
pub(crate) async fn next_id(
    conn: &mut sqlx::PgConnection,
    table: &str,
    id_column: &str,
) -> Result<i32> {
    let sql = format!("select coalesce(max({id_column}), 0) + 1 from {table}");
    let (next,): (i32,) = sqlx::query_as::<_, (i32,)>(&sql)
        .fetch_one(conn)
        .await
        .with_context(|| format!("next_id({table}) failed"))?;
    Ok(next)
}

/// Serialize writers on `table` for the rest of the transaction. Readers are
/// not blocked.
pub(crate) async fn lock_exclusive(conn: &mut sqlx::PgConnection, table: &str) -> Result<()> {
    sqlx::query(&format!("lock table {table} in exclusive mode"))
        .execute(conn)
        .await
        .with_context(|| format!("lock {table} failed"))?;
    Ok(())
}
