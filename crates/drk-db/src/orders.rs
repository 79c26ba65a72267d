//! Order headers and line items.
//!
//! # Totals
//! `recompute_total` always returns the freshly computed Σ quantity × price.
//! Persisting it to `order.total_amount` is best-effort: a failed write is
//! logged and dropped, so the stored column may lag.
//!
//! # Status
//! Only two writers touch `order.status`: `checkout` (unfinished label, and
//! only when the current value is not already finished) and
//! `complete_order` (finished label). Total recompute never writes it.
//!
//! # Codes
//! `checkout` assigns a 3-digit code while holding an exclusive lock on
//! `"order"`, checking candidates against the codes of every other open
//! order.

use std::collections::HashSet;

use anyhow::{bail, ensure, Context, Result};
use drk_order::{
    compute_totals, generate_code, CodeSource, OrderCode, OrderStatus, QuantityChange,
    StatusMatchRule,
};
use drk_schemas::{LineItem, NewItem, OrderListRow, OrderRow, OrderTotals};
use sqlx::{postgres::PgRow, PgConnection, PgPool, Row};
use tracing::{info, warn};

use crate::{lock_exclusive, next_id, SchemaCapabilities};

const ORDER_TABLE: &str = "\"order\"";

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Create an empty order for `customer_id`. `store_id` is ignored when the
/// schema does not track stores.
pub async fn create_order(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    customer_id: i32,
    store_id: Option<i32>,
) -> Result<OrderRow> {
    let mut tx = pool.begin().await.context("create_order begin failed")?;

    lock_exclusive(&mut *tx, ORDER_TABLE).await?;
    let order_id = next_id(&mut *tx, ORDER_TABLE, "order_id").await?;

    let store_id = store_id.filter(|_| caps.has_store_id);
    if caps.has_store_id {
        sqlx::query(r#"insert into "order" (order_id, customer_id, store_id) values ($1, $2, $3)"#)
            .bind(order_id)
            .bind(customer_id)
            .bind(store_id)
            .execute(&mut *tx)
            .await
            .context("create_order insert failed")?;
    } else {
        sqlx::query(r#"insert into "order" (order_id, customer_id) values ($1, $2)"#)
            .bind(order_id)
            .bind(customer_id)
            .execute(&mut *tx)
            .await
            .context("create_order insert failed")?;
    }

    tx.commit().await.context("create_order commit failed")?;

    info!(order_id, customer_id, ?store_id, "order created");
    Ok(OrderRow {
        order_id,
        customer_id,
        store_id,
        order_code: None,
        total_amount: None,
        status: None,
    })
}

pub async fn fetch_order(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
) -> Result<Option<OrderRow>> {
    let mut conn = pool.acquire().await.context("fetch_order acquire failed")?;
    fetch_order_in(&mut *conn, caps, order_id, false).await
}

async fn fetch_order_in(
    conn: &mut PgConnection,
    caps: &SchemaCapabilities,
    order_id: i32,
    for_update: bool,
) -> Result<Option<OrderRow>> {
    let sql = format!(
        r#"select {} from "order" o where o.order_id = $1{}"#,
        caps.order_select_list(),
        if for_update { " for update" } else { "" }
    );
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(conn)
        .await
        .context("fetch_order failed")?;

    row.as_ref().map(order_from_row).transpose()
}

/// Order header joined with customer phone and store name.
pub async fn fetch_order_summary(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
) -> Result<Option<OrderListRow>> {
    let sql = format!(
        r#"{} where o.order_id = $1"#,
        list_select(caps)
    );
    let row = sqlx::query(&sql)
        .bind(order_id)
        .fetch_optional(pool)
        .await
        .context("fetch_order_summary failed")?;

    row.as_ref().map(list_row_from_row).transpose()
}

/// Point an order at a store. No-op when the schema does not track stores.
pub async fn set_order_store(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
    store_id: i32,
) -> Result<()> {
    if !caps.has_store_id {
        return Ok(());
    }
    sqlx::query(r#"update "order" set store_id = $2 where order_id = $1"#)
        .bind(order_id)
        .bind(store_id)
        .execute(pool)
        .await
        .context("set_order_store failed")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Line items
// ---------------------------------------------------------------------------

/// Append one item. Returns the new `item_id`. Options the schema has no
/// column for are dropped.
pub async fn add_item(pool: &PgPool, caps: &SchemaCapabilities, item: &NewItem) -> Result<i32> {
    ensure!(
        item.quantity > 0,
        "add_item requires a positive quantity (got {})",
        item.quantity
    );

    let cols = caps.item_insert_columns();
    let placeholders: Vec<String> = (4..4 + cols.len()).map(|n| format!("${n}")).collect();
    let sql = format!(
        "insert into item (item_id, order_id, product_id, {}) values ($1, $2, $3, {})",
        cols.join(", "),
        placeholders.join(", ")
    );

    let mut tx = pool.begin().await.context("add_item begin failed")?;

    lock_exclusive(&mut *tx, "item").await?;
    let item_id = next_id(&mut *tx, "item", "item_id").await?;

    let mut q = sqlx::query(&sql)
        .bind(item_id)
        .bind(item.order_id)
        .bind(item.product_id);
    for col in &cols {
        q = match *col {
            "size" => q.bind(&item.size),
            "ice" => q.bind(&item.ice),
            "sweet" | "sugar" => q.bind(&item.sweet),
            "topping" => q.bind(&item.topping),
            "quantity" => q.bind(item.quantity),
            "note" => q.bind(&item.note),
            other => bail!("add_item: unexpected column {other}"),
        };
    }
    q.execute(&mut *tx)
        .await
        .context("add_item insert failed")?;

    tx.commit().await.context("add_item commit failed")?;

    info!(order_id = item.order_id, item_id, product_id = item.product_id, "item added");
    Ok(item_id)
}

/// Outcome of an item edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEdit {
    Updated,
    Deleted,
    /// No item with that id belongs to that order.
    NotFound,
}

/// Set an item's quantity in place; a quantity ≤ 0 deletes the item.
pub async fn update_item_quantity(
    pool: &PgPool,
    order_id: i32,
    item_id: i32,
    quantity: i32,
) -> Result<ItemEdit> {
    match QuantityChange::from_quantity(quantity) {
        QuantityChange::Delete => delete_item(pool, order_id, item_id).await,
        QuantityChange::Set(q) => {
            let res = sqlx::query("update item set quantity = $3 where item_id = $1 and order_id = $2")
                .bind(item_id)
                .bind(order_id)
                .bind(q)
                .execute(pool)
                .await
                .context("update_item_quantity failed")?;
            Ok(if res.rows_affected() == 0 {
                ItemEdit::NotFound
            } else {
                ItemEdit::Updated
            })
        }
    }
}

pub async fn delete_item(pool: &PgPool, order_id: i32, item_id: i32) -> Result<ItemEdit> {
    let res = sqlx::query("delete from item where item_id = $1 and order_id = $2")
        .bind(item_id)
        .bind(order_id)
        .execute(pool)
        .await
        .context("delete_item failed")?;

    if res.rows_affected() == 0 {
        return Ok(ItemEdit::NotFound);
    }
    info!(order_id, item_id, "item deleted");
    Ok(ItemEdit::Deleted)
}

/// Items of an order joined with product name and unit price, in insertion order.
pub async fn fetch_line_items(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
) -> Result<Vec<LineItem>> {
    let mut conn = pool.acquire().await.context("fetch_line_items acquire failed")?;
    line_items_in(&mut *conn, caps, order_id).await
}

async fn line_items_in(
    conn: &mut PgConnection,
    caps: &SchemaCapabilities,
    order_id: i32,
) -> Result<Vec<LineItem>> {
    let sql = format!(
        r#"
        select
          i.item_id,
          i.order_id,
          i.product_id,
          p.name as product_name,
          p.price,
          i.quantity,
          {}
        from item as i
        join product as p on i.product_id = p.product_id
        where i.order_id = $1
        order by i.item_id
        "#,
        caps.item_select_list()
    );
    let rows = sqlx::query(&sql)
        .bind(order_id)
        .fetch_all(conn)
        .await
        .context("fetch_line_items failed")?;

    rows.iter()
        .map(|r| {
            Ok(LineItem {
                item_id: r.try_get("item_id")?,
                order_id: r.try_get("order_id")?,
                product_id: r.try_get("product_id")?,
                product_name: r.try_get("product_name")?,
                price: r.try_get("price")?,
                size: r.try_get("size")?,
                ice: r.try_get("ice")?,
                sweet: r.try_get("sweet")?,
                topping: r.try_get("topping")?,
                quantity: r.try_get("quantity")?,
                note: r.try_get("note")?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Recompute totals from the current items and try to persist the price.
///
/// The returned totals are authoritative whether or not the write-back
/// succeeded.
pub async fn recompute_total(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
) -> Result<OrderTotals> {
    let items = fetch_line_items(pool, caps, order_id).await?;
    let totals = compute_totals(&items);
    persist_total(pool, caps, order_id, &totals).await;
    Ok(totals)
}

/// Best-effort write of `totals` to `order.total_amount`, for callers that
/// already hold the items. Failures are logged, never returned.
pub async fn persist_total(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    order_id: i32,
    totals: &OrderTotals,
) {
    if !caps.has_total_amount {
        return;
    }
    let res = sqlx::query(r#"update "order" set total_amount = $2 where order_id = $1"#)
        .bind(order_id)
        .bind(totals.total_price)
        .execute(pool)
        .await;
    if let Err(e) = res {
        warn!(order_id, error = %e, "total_amount write-back failed; stored total is stale");
    }
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOutcome {
    pub order_id: i32,
    pub store_id: Option<i32>,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    /// `None` when the schema has no `order_code` column.
    pub order_code: Option<OrderCode>,
}

/// Finalize an order: optional store assignment, persisted total, unfinished
/// status (unless already finished) and an order code if it has none.
///
/// Returns `None` if the order does not exist.
pub async fn checkout<S>(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    rule: StatusMatchRule,
    order_id: i32,
    store_id: Option<i32>,
    codes: &mut S,
) -> Result<Option<CheckoutOutcome>>
where
    S: CodeSource + Send + ?Sized,
{
    let mut tx = pool.begin().await.context("checkout begin failed")?;

    lock_exclusive(&mut *tx, ORDER_TABLE).await?;

    let Some(order) = fetch_order_in(&mut *tx, caps, order_id, true).await? else {
        return Ok(None);
    };

    let mut effective_store = order.store_id;
    if let (true, Some(sid)) = (caps.has_store_id, store_id) {
        sqlx::query(r#"update "order" set store_id = $2 where order_id = $1"#)
            .bind(order_id)
            .bind(sid)
            .execute(&mut *tx)
            .await
            .context("checkout store update failed")?;
        effective_store = Some(sid);
    }

    let items = line_items_in(&mut *tx, caps, order_id).await?;
    let totals = compute_totals(&items);

    if caps.has_total_amount {
        sqlx::query(r#"update "order" set total_amount = $2 where order_id = $1"#)
            .bind(order_id)
            .bind(totals.total_price)
            .execute(&mut *tx)
            .await
            .context("checkout total update failed")?;
    }

    let mut status = OrderStatus::classify(order.status.as_deref(), rule);
    if caps.has_status {
        if let Some(label) = OrderStatus::checkout_write(order.status.as_deref(), rule) {
            sqlx::query(r#"update "order" set status = $2 where order_id = $1"#)
                .bind(order_id)
                .bind(label)
                .execute(&mut *tx)
                .await
                .context("checkout status update failed")?;
            status = OrderStatus::Unfinished;
        }
    }

    let order_code = if caps.has_order_code {
        match order.order_code.as_deref().map(OrderCode::parse) {
            Some(Ok(existing)) => Some(existing),
            _ => {
                let taken = open_codes_in(&mut *tx, caps, rule, order_id).await?;
                let code = generate_code(codes, |c| taken.contains(&c))?;
                sqlx::query(r#"update "order" set order_code = $2 where order_id = $1"#)
                    .bind(order_id)
                    .bind(code.to_string())
                    .execute(&mut *tx)
                    .await
                    .context("checkout order_code update failed")?;
                Some(code)
            }
        }
    } else {
        None
    };

    tx.commit().await.context("checkout commit failed")?;

    info!(
        order_id,
        total = totals.total_price,
        cups = totals.total_cups,
        code = ?order_code.map(|c| c.to_string()),
        "order checked out"
    );

    Ok(Some(CheckoutOutcome {
        order_id,
        store_id: effective_store,
        totals,
        status,
        order_code,
    }))
}

/// Same predicate as the `uq_order_code_open` partial index in the migration.
const INDEX_HOLDS_CODE: &str = r#"coalesce(status, '') !~ '^[[:space:]　]*已'"#;

/// Codes currently held by open orders other than `exclude_order_id`.
///
/// A code is held when the status rule says the order is unfinished or the
/// partial unique index still covers the row. They differ only on odd legacy
/// status values.
async fn open_codes_in(
    conn: &mut PgConnection,
    caps: &SchemaCapabilities,
    rule: StatusMatchRule,
    exclude_order_id: i32,
) -> Result<HashSet<OrderCode>> {
    let (status_col, index_holds) = if caps.has_status {
        ("status", INDEX_HOLDS_CODE)
    } else {
        ("null::text as status", "true")
    };
    let sql = format!(
        r#"select order_code, {status_col}, ({index_holds}) as index_holds from "order" where order_code is not null and order_id <> $1"#
    );
    let rows = sqlx::query(&sql)
        .bind(exclude_order_id)
        .fetch_all(conn)
        .await
        .context("open_codes query failed")?;

    let mut taken = HashSet::new();
    for r in &rows {
        let code: String = r.try_get("order_code")?;
        let status: Option<String> = r.try_get("status")?;
        let index_holds: bool = r.try_get("index_holds")?;
        if !index_holds && OrderStatus::classify(status.as_deref(), rule).is_finished() {
            continue;
        }
        // Legacy free-text codes outside the 3-digit space cannot collide.
        if let Ok(c) = OrderCode::parse(&code) {
            taken.insert(c);
        }
    }
    Ok(taken)
}

// ---------------------------------------------------------------------------
// Staff views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderFilter {
    /// Checked-out orders that are not finished yet.
    #[default]
    Open,
    /// Every checked-out order.
    All,
}

/// Checked-out orders for a store, newest first.
///
/// "Checked out" means a non-empty status; when the schema has no status
/// column every order is listed. `store_id` is ignored when the schema does
/// not track stores.
pub async fn list_store_orders(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    rule: StatusMatchRule,
    store_id: Option<i32>,
    filter: OrderFilter,
) -> Result<Vec<OrderListRow>> {
    let mut sql = format!("{} where true", list_select(caps));
    let store_id = store_id.filter(|_| caps.has_store_id);
    if store_id.is_some() {
        sql.push_str(" and o.store_id = $1");
    }
    if caps.has_status {
        sql.push_str(" and coalesce(o.status, '') <> ''");
    }
    sql.push_str(" order by o.order_id desc");

    let mut q = sqlx::query(&sql);
    if let Some(sid) = store_id {
        q = q.bind(sid);
    }
    let rows = q.fetch_all(pool).await.context("list_store_orders failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for r in &rows {
        let row = list_row_from_row(r)?;
        if filter == OrderFilter::Open
            && OrderStatus::classify(row.status.as_deref(), rule).is_finished()
        {
            continue;
        }
        out.push(row);
    }
    Ok(out)
}

/// Staff "mark complete". Returns `false` if no such order exists (within
/// `store_id` when given and tracked). Completing a finished order is a no-op.
pub async fn complete_order(
    pool: &PgPool,
    caps: &SchemaCapabilities,
    rule: StatusMatchRule,
    order_id: i32,
    store_id: Option<i32>,
) -> Result<bool> {
    if !caps.has_status {
        bail!("complete_order: schema has no order.status column");
    }

    let mut tx = pool.begin().await.context("complete_order begin failed")?;

    let Some(order) = fetch_order_in(&mut *tx, caps, order_id, true).await? else {
        return Ok(false);
    };
    if let (true, Some(sid)) = (caps.has_store_id, store_id) {
        if order.store_id != Some(sid) {
            return Ok(false);
        }
    }

    let current = OrderStatus::classify(order.status.as_deref(), rule);
    if !current.is_finished() {
        sqlx::query(r#"update "order" set status = $2 where order_id = $1"#)
            .bind(order_id)
            .bind(current.complete().label())
            .execute(&mut *tx)
            .await
            .context("complete_order update failed")?;
    }

    tx.commit().await.context("complete_order commit failed")?;

    info!(order_id, ?store_id, "order completed");
    Ok(true)
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

fn list_select(caps: &SchemaCapabilities) -> String {
    let (store_name, store_join) = if caps.has_store_id {
        ("s.name as store_name", "left join store as s on s.store_id = o.store_id")
    } else {
        ("null::text as store_name", "")
    };
    format!(
        r#"
        select {}, c.phone as customer_phone, {store_name}
        from "order" as o
        join customer as c on c.customer_id = o.customer_id
        {store_join}
        "#,
        caps.order_select_list()
    )
}

fn order_from_row(r: &PgRow) -> Result<OrderRow> {
    Ok(OrderRow {
        order_id: r.try_get("order_id")?,
        customer_id: r.try_get("customer_id")?,
        store_id: r.try_get("store_id")?,
        order_code: r.try_get("order_code")?,
        total_amount: r.try_get("total_amount")?,
        status: r.try_get("status")?,
    })
}

fn list_row_from_row(r: &PgRow) -> Result<OrderListRow> {
    Ok(OrderListRow {
        order_id: r.try_get("order_id")?,
        customer_id: r.try_get("customer_id")?,
        customer_phone: r.try_get("customer_phone")?,
        store_id: r.try_get("store_id")?,
        store_name: r.try_get("store_name")?,
        order_code: r.try_get("order_code")?,
        total_amount: r.try_get("total_amount")?,
        status: r.try_get("status")?,
    })
}
