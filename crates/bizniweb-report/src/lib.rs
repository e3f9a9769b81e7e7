//! Turns fetched orders and ad spend into the profitability report: one
//! flat row per order item, daily/weekly/monthly/product/customer rollups,
//! CSV files and a standalone HTML page.

pub mod aggregate;
pub mod csv_out;
pub mod error;
pub mod flatten;
pub mod html;

pub use aggregate::{
    build_report, CustomerSummary, DailySummary, DateProductSummary, PeriodKind, PeriodSummary,
    ProductSummary, Report, ReportTotals,
};
pub use csv_out::{write_csv_reports, CsvFiles};
pub use error::ReportError;
pub use flatten::{customer_key, flatten_orders, FlatRow, Flattened};
pub use html::{render_html, write_html_report};
