//! Row and record types shared across the drink-shop crates.
//!
//! These mirror the relational schema one-to-one (plus the joined shapes the
//! pages need). No business logic lives here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i32,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i32,
    pub name: String,
    /// Stored as written by the catalog loader, e.g. `static/product_images/x.jpg`.
    pub photo_url: String,
    /// Unit price in whole currency units.
    pub price: i32,
}

/// One `order` row. Optional columns are `None` both when NULL and when the
/// connected schema does not carry the column at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_id: i32,
    pub customer_id: i32,
    pub store_id: Option<i32>,
    pub order_code: Option<String>,
    pub total_amount: Option<i64>,
    pub status: Option<String>,
}

/// Order header joined with the owning customer's phone and store name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderListRow {
    pub order_id: i32,
    pub customer_id: i32,
    pub customer_phone: String,
    pub store_id: Option<i32>,
    pub store_name: Option<String>,
    pub order_code: Option<String>,
    pub total_amount: Option<i64>,
    pub status: Option<String>,
}

/// Payload for appending one customized product to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub order_id: i32,
    pub product_id: i32,
    pub size: String,
    pub ice: String,
    pub sweet: String,
    pub topping: String,
    pub quantity: i32,
    pub note: Option<String>,
}

/// An `item` row joined with its product (name + unit price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub price: i32,
    pub size: String,
    pub ice: String,
    pub sweet: String,
    pub topping: String,
    pub quantity: i32,
    pub note: Option<String>,
}

impl LineItem {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * i64::from(self.price)
    }
}

/// Aggregates recomputed from an order's current line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Σ quantity × unit price.
    pub total_price: i64,
    /// Σ quantity (number of cups).
    pub total_cups: i64,
}
