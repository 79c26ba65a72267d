//! Customer identity: look up by phone, create on first visit.

use anyhow::{Context, Result};
use drk_schemas::Customer;
use sqlx::PgPool;

use crate::{lock_exclusive, next_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCustomer {
    pub customer: Customer,
    /// True when this call inserted the row.
    pub created: bool,
}

/// Find the customer with exactly `phone`, inserting one with id
/// `max + 1` if none exists.
///
/// Lookup, id allocation and insert share one transaction holding an
/// exclusive lock on `customer`, so two concurrent first visits with the
/// same phone resolve to a single row. `phone` must already be validated.
pub async fn resolve_customer(pool: &PgPool, phone: &str) -> Result<ResolvedCustomer> {
    let mut tx = pool.begin().await.context("resolve_customer begin failed")?;

    lock_exclusive(&mut *tx, "customer").await?;

    let existing: Option<(i32,)> =
        sqlx::query_as::<_, (i32,)>("select customer_id from customer where phone = $1")
            .bind(phone)
            .fetch_optional(&mut *tx)
            .await
            .context("resolve_customer lookup failed")?;

    let (customer_id, created) = match existing {
        Some((id,)) => (id, false),
        None => {
            let id = next_id(&mut *tx, "customer", "customer_id").await?;
            sqlx::query("insert into customer (customer_id, phone) values ($1, $2)")
                .bind(id)
                .bind(phone)
                .execute(&mut *tx)
                .await
                .context("resolve_customer insert failed")?;
            (id, true)
        }
    };

    tx.commit().await.context("resolve_customer commit failed")?;

    Ok(ResolvedCustomer {
        customer: Customer {
            customer_id,
            phone: phone.to_string(),
        },
        created,
    })
}
