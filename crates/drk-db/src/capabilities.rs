//! Which optional columns the connected database carries.
//!
//! Older deployments created `order` without some of `store_id`,
//! `order_code`, `total_amount`, `status`, and `item` with `sugar` in place
//! of `sweet` and no `note`. The probe runs once at startup and the result
//! travels with the pool; queries are shaped from it instead of trying a
//! write and swallowing the failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Name of the item column holding the sweetness label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweetnessColumn {
    Sweet,
    Sugar,
}

impl SweetnessColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            SweetnessColumn::Sweet => "sweet",
            SweetnessColumn::Sugar => "sugar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCapabilities {
    pub has_store_id: bool,
    pub has_order_code: bool,
    pub has_total_amount: bool,
    pub has_status: bool,
    /// `None` when `item` has neither `sweet` nor `sugar`.
    pub item_sweetness: Option<SweetnessColumn>,
    pub item_has_note: bool,
}

impl SchemaCapabilities {
    /// The canonical schema shipped in `migrations/`.
    pub const fn full() -> Self {
        Self {
            has_store_id: true,
            has_order_code: true,
            has_total_amount: true,
            has_status: true,
            item_sweetness: Some(SweetnessColumn::Sweet),
            item_has_note: true,
        }
    }

    /// Build from the column names of `order` and `item`. `sweet` wins when
    /// both sweetness columns exist.
    pub fn from_columns<'a>(
        order_columns: impl IntoIterator<Item = &'a str>,
        item_columns: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut caps = Self {
            has_store_id: false,
            has_order_code: false,
            has_total_amount: false,
            has_status: false,
            item_sweetness: None,
            item_has_note: false,
        };
        for c in order_columns {
            match c {
                "store_id" => caps.has_store_id = true,
                "order_code" => caps.has_order_code = true,
                "total_amount" => caps.has_total_amount = true,
                "status" => caps.has_status = true,
                _ => {}
            }
        }
        for c in item_columns {
            match c {
                "sweet" => caps.item_sweetness = Some(SweetnessColumn::Sweet),
                "sugar" if caps.item_sweetness.is_none() => {
                    caps.item_sweetness = Some(SweetnessColumn::Sugar)
                }
                "note" => caps.item_has_note = true,
                _ => {}
            }
        }
        caps
    }

    /// `o.<col>` when present, a typed NULL under the same name otherwise, so
    /// every order query decodes the same row shape.
    pub(crate) fn order_select_list(&self) -> String {
        let col = |present: bool, name: &str, ty: &str| {
            if present {
                format!("o.{name}")
            } else {
                format!("null::{ty} as {name}")
            }
        };
        [
            "o.order_id".to_string(),
            "o.customer_id".to_string(),
            col(self.has_store_id, "store_id", "integer"),
            col(self.has_order_code, "order_code", "text"),
            col(self.has_total_amount, "total_amount", "bigint"),
            col(self.has_status, "status", "text"),
        ]
        .join(", ")
    }

    /// Item option columns, always decoded as `sweet` and `note`.
    pub(crate) fn item_select_list(&self) -> String {
        let sweet = match self.item_sweetness {
            Some(SweetnessColumn::Sweet) => "i.sweet".to_string(),
            Some(SweetnessColumn::Sugar) => "i.sugar as sweet".to_string(),
            None => "''::text as sweet".to_string(),
        };
        let note = if self.item_has_note {
            "i.note"
        } else {
            "null::text as note"
        };
        format!("i.size, i.ice, {sweet}, i.topping, {note}")
    }

    /// Writable item columns after the fixed `item_id, order_id, product_id`.
    pub(crate) fn item_insert_columns(&self) -> Vec<&'static str> {
        let mut cols = vec!["size", "ice"];
        if let Some(s) = self.item_sweetness {
            cols.push(s.as_str());
        }
        cols.extend(["topping", "quantity"]);
        if self.item_has_note {
            cols.push("note");
        }
        cols
    }
}

impl Default for SchemaCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

async fn table_columns(pool: &PgPool, table: &str) -> Result<Vec<String>> {
    let cols: Vec<(String,)> = sqlx::query_as::<_, (String,)>(
        r#"
        select column_name::text
        from information_schema.columns
        where table_schema = current_schema()
          and table_name = $1
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .with_context(|| format!("probe_capabilities({table}) query failed"))?;

    Ok(cols.into_iter().map(|(c,)| c).collect())
}

/// Read the `order` and `item` columns from `information_schema`.
pub async fn probe_capabilities(pool: &PgPool) -> Result<SchemaCapabilities> {
    let order_cols = table_columns(pool, "order").await?;
    let item_cols = table_columns(pool, "item").await?;

    Ok(SchemaCapabilities::from_columns(
        order_cols.iter().map(String::as_str),
        item_cols.iter().map(String::as_str),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_columns_picks_only_known_optional_columns() {
        let caps = SchemaCapabilities::from_columns(["order_id", "customer_id", "status"], []);
        assert!(caps.has_status);
        assert!(!caps.has_store_id);
        assert!(!caps.has_order_code);
        assert!(!caps.has_total_amount);
        assert_eq!(caps.item_sweetness, None);
        assert!(!caps.item_has_note);
    }

    #[test]
    fn select_list_substitutes_typed_nulls() {
        let caps = SchemaCapabilities::from_columns(["status"], []);
        let s = caps.order_select_list();
        assert!(s.contains("null::integer as store_id"));
        assert!(s.contains("null::text as order_code"));
        assert!(s.contains("o.status"));
    }

    #[test]
    fn legacy_item_reads_sugar_as_sweet_and_drops_note() {
        let caps = SchemaCapabilities::from_columns(
            [],
            ["item_id", "order_id", "product_id", "size", "ice", "sugar", "topping", "quantity"],
        );
        assert_eq!(caps.item_sweetness, Some(SweetnessColumn::Sugar));
        assert!(!caps.item_has_note);

        let s = caps.item_select_list();
        assert!(s.contains("i.sugar as sweet"));
        assert!(s.contains("null::text as note"));
        assert_eq!(
            caps.item_insert_columns(),
            vec!["size", "ice", "sugar", "topping", "quantity"]
        );
    }

    #[test]
    fn sweet_column_wins_over_sugar() {
        let caps = SchemaCapabilities::from_columns([], ["sugar", "sweet", "note"]);
        assert_eq!(caps.item_sweetness, Some(SweetnessColumn::Sweet));
        assert_eq!(caps, SchemaCapabilities {
            has_store_id: false,
            has_order_code: false,
            has_total_amount: false,
            has_status: false,
            item_sweetness: Some(SweetnessColumn::Sweet),
            item_has_note: true,
        });
    }

    #[test]
    fn item_without_sweetness_column_selects_blank_and_skips_insert() {
        let caps = SchemaCapabilities::from_columns([], ["size", "ice", "topping", "quantity"]);
        assert!(caps.item_select_list().contains("''::text as sweet"));
        assert!(!caps.item_insert_columns().contains(&"sweet"));
    }
}
