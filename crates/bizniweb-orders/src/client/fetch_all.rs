//! Multi-page order fetch loop for `OrderClient`.

use std::time::Duration;

use bizniweb_core::DateRange;

use crate::error::OrderApiError;
use crate::filter::filter_by_date_range;
use crate::pagination::{CursorTracker, NextPage};
use crate::types::Order;

use super::OrderClient;
use super::MAX_PAGES;

impl OrderClient {
    /// Fetches every order purchased within `range`, following cursors until
    /// the last page.
    ///
    /// All-or-nothing: if any page fails, orders from earlier pages are
    /// discarded and the error is returned, so a report is never built from
    /// a silently truncated set.
    ///
    /// The result is always filtered to `range` on the client, whether or
    /// not the server applied the date filter.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_page`], plus
    /// [`OrderApiError::PaginationLimit`] after [`MAX_PAGES`] pages and
    /// [`OrderApiError::CursorCycle`] when a cursor repeats.
    pub async fn fetch_orders(&self, range: DateRange) -> Result<Vec<Order>, OrderApiError> {
        let mut all_orders: Vec<Order> = Vec::new();
        let mut tracker = CursorTracker::new();
        let mut cursor: Option<serde_json::Value> = None;
        let mut page_count = 0usize;
        let mut skipped = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(OrderApiError::PaginationLimit {
                    max_pages: MAX_PAGES,
                });
            }

            if page_count > 1 && self.settings.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.settings.inter_request_delay_ms))
                    .await;
            }

            let page = self.fetch_page(range, cursor.as_ref()).await?;
            skipped += page.skipped;
            let past_range_end = !self.settings.server_date_filter
                && page
                    .orders
                    .last()
                    .and_then(Order::purchase_date)
                    .is_some_and(|d| d > range.to);

            tracing::debug!(
                page = page_count,
                orders = page.orders.len(),
                total = all_orders.len() + page.orders.len(),
                "fetched order page"
            );
            all_orders.extend(page.orders);

            if past_range_end {
                tracing::debug!(%range, "passed end of range, stopping pagination");
                break;
            }

            match tracker.advance(&page.page_info)? {
                NextPage::Fetch(next) => cursor = Some(next),
                NextPage::Done => break,
                NextPage::MissingCursor => {
                    tracing::warn!(
                        page = page_count,
                        "order API reported more pages but no cursor; stopping"
                    );
                    break;
                }
            }
        }

        let fetched = all_orders.len();
        let orders = filter_by_date_range(all_orders, range);
        tracing::info!(
            %range,
            pages = page_count,
            fetched,
            in_range = orders.len(),
            skipped,
            "fetched orders"
        );
        Ok(orders)
    }
}
