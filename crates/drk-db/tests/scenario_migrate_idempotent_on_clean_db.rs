//! Migrating twice must be idempotent, and the canonical schema must probe
//! as fully capable.

mod common;

#[tokio::test]
async fn migrate_twice_and_probe_full_capabilities() -> anyhow::Result<()> {
    let Some(pool) = common::pool_or_skip().await? else {
        return Ok(());
    };

    drk_db::migrate(&pool).await?;

    let st = drk_db::status(&pool).await?;
    assert!(st.ok);
    assert!(st.has_order_table);

    let caps = drk_db::probe_capabilities(&pool).await?;
    assert_eq!(caps, drk_db::SchemaCapabilities::full());

    Ok(())
}
