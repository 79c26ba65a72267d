//! Scenario: an order total is Σ quantity × unit price over its line items.

use drk_order::compute_totals;
use drk_schemas::{LineItem, OrderTotals};

fn line(item_id: i32, price: i32, quantity: i32) -> LineItem {
    LineItem {
        item_id,
        order_id: 1,
        product_id: item_id,
        product_name: format!("drink-{item_id}"),
        price,
        size: "中杯".to_string(),
        ice: "正常冰".to_string(),
        sweet: "正常糖".to_string(),
        topping: "無".to_string(),
        quantity,
        note: None,
    }
}

#[test]
fn empty_order_totals_zero() {
    assert_eq!(compute_totals(&[]), OrderTotals::default());
}

#[test]
fn three_cups_of_fifty_is_one_fifty() {
    let t = compute_totals(&[line(1, 50, 3)]);
    assert_eq!(t.total_price, 150);
    assert_eq!(t.total_cups, 3);
}

#[test]
fn mixed_lines_sum() {
    let items = [line(1, 50, 3), line(2, 65, 1), line(3, 40, 2)];
    let t = compute_totals(&items);
    assert_eq!(t.total_price, 50 * 3 + 65 + 40 * 2);
    assert_eq!(t.total_cups, 6);
}

#[test]
fn non_positive_quantities_are_ignored() {
    let items = [line(1, 50, 2), line(2, 999, 0), line(3, 999, -4)];
    let t = compute_totals(&items);
    assert_eq!(t.total_price, 100);
    assert_eq!(t.total_cups, 2);
}
