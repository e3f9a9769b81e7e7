//! Cache-aware order fetch.

use std::collections::BTreeMap;

use bizniweb_core::DateRange;
use chrono::NaiveDate;

use crate::cache::OrderCache;
use crate::client::OrderClient;
use crate::error::OrderApiError;
use crate::filter::sort_by_purchase_time;
use crate::types::Order;

/// Returns all orders purchased within `range`, serving cacheable days from
/// `cache` and fetching the rest in a single paginated pass.
///
/// The API is queried once for the smallest contiguous range covering every
/// missed day. Fetched orders for days that were cache hits are discarded.
/// Every missed cacheable day is then written back, including days with no
/// orders. With `use_cache = false` nothing is read from the cache but
/// cacheable days are still refreshed. Cache write failures are logged and
/// do not fail the fetch.
///
/// The result is sorted by purchase time and is not status-filtered.
///
/// # Errors
///
/// Propagates any [`OrderApiError`] from [`OrderClient::fetch_orders`].
pub async fn fetch_orders_cached(
    client: &OrderClient,
    cache: &OrderCache,
    range: DateRange,
    today: NaiveDate,
    use_cache: bool,
) -> Result<Vec<Order>, OrderApiError> {
    let mut orders: Vec<Order> = Vec::new();
    let mut missed: Vec<NaiveDate> = Vec::new();

    for day in range.days() {
        let cached = (use_cache && cache.is_cacheable(day, today))
            .then(|| cache.load_day(day))
            .flatten();
        match cached {
            Some(day_orders) => orders.extend(day_orders),
            None => missed.push(day),
        }
    }

    let hits = range.num_days() - i64::try_from(missed.len()).unwrap_or(i64::MAX);
    tracing::info!(%range, cached_days = hits, missed_days = missed.len(), "order cache lookup");

    if let (Some(&first), Some(&last)) = (missed.first(), missed.last()) {
        let fetch_range = DateRange { from: first, to: last };
        let fetched = client.fetch_orders(fetch_range).await?;

        let mut by_day: BTreeMap<NaiveDate, Vec<Order>> =
            missed.iter().map(|&d| (d, Vec::new())).collect();
        for order in fetched {
            if let Some(bucket) = order.purchase_date().and_then(|d| by_day.get_mut(&d)) {
                bucket.push(order);
            }
        }

        for (day, day_orders) in by_day {
            if cache.is_cacheable(day, today) {
                if let Err(e) = cache.store_day(day, &day_orders) {
                    tracing::warn!(%day, error = %e, "failed to write order cache");
                }
            }
            orders.extend(day_orders);
        }
    }

    sort_by_purchase_time(&mut orders);
    Ok(orders)
}
