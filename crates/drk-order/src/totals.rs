use drk_schemas::{LineItem, OrderTotals};

/// Recompute an order's totals from its joined line items.
///
/// Lines with a non-positive quantity contribute nothing; such items are
/// deleted on write, so they only appear here if a stale row slipped through.
pub fn compute_totals(items: &[LineItem]) -> OrderTotals {
    items
        .iter()
        .filter(|it| it.quantity > 0)
        .fold(OrderTotals::default(), |acc, it| OrderTotals {
            total_price: acc.total_price + it.subtotal(),
            total_cups: acc.total_cups + i64::from(it.quantity),
        })
}
