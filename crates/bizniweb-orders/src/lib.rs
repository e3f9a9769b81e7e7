//! Client for the BizniWeb GraphQL order API.
//!
//! Fetches orders page by page with fixed-backoff retries, keeps a per-day
//! JSON cache of past days, and provides the status/date filters applied
//! before reporting.

pub mod cache;
pub mod client;
mod de;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod query;
mod retry;
pub mod sync;
pub mod types;

pub use cache::OrderCache;
pub use client::{OrderClient, OrderClientSettings, OrderPage};
pub use error::{OrderApiError, OrderCacheError};
pub use filter::{filter_by_date_range, sort_by_purchase_time, split_excluded_statuses};
pub use sync::fetch_orders_cached;
pub use types::{Address, Customer, Order, OrderItem, OrderStatus, PageInfo, Price};
