use bizniweb_core::DateRange;

use crate::types::Order;

/// Keeps orders whose purchase date falls inside `range`. Orders with an
/// unparseable `pur_date` are dropped and logged.
#[must_use]
pub fn filter_by_date_range(orders: Vec<Order>, range: DateRange) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|order| match order.purchase_date() {
            Some(day) => range.contains(day),
            None => {
                tracing::warn!(
                    order_id = %order.id,
                    pur_date = %order.pur_date,
                    "dropping order with unparseable purchase date"
                );
                false
            }
        })
        .collect()
}

/// Splits off orders whose status matches `is_excluded`. Returns the kept
/// orders and how many were removed.
pub fn split_excluded_statuses<F>(orders: Vec<Order>, is_excluded: F) -> (Vec<Order>, usize)
where
    F: Fn(&str) -> bool,
{
    let before = orders.len();
    let kept: Vec<Order> = orders
        .into_iter()
        .filter(|o| !o.status_name().is_some_and(&is_excluded))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Stable sort by the raw `pur_date` string, which is lexically ordered.
pub fn sort_by_purchase_time(orders: &mut [Order]) {
    orders.sort_by(|a, b| a.pur_date.cmp(&b.pur_date));
}
