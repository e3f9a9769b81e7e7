//! `export` command: orders -> flat rows -> rollups -> CSV + HTML.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use bizniweb_ads::DailySpend;
use bizniweb_core::{AppConfig, CostTable, DateRange};
use bizniweb_orders::{fetch_orders_cached, split_excluded_statuses, OrderCache, OrderClient};
use bizniweb_report::{
    build_report, customer_key, flatten_orders, write_csv_reports, write_html_report,
};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;

/// Days covered when `--from-date` is omitted.
const DEFAULT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// First day to export (YYYY-MM-DD); defaults to 30 days before --to-date
    #[arg(long)]
    pub from_date: Option<NaiveDate>,
    /// Last day to export (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub to_date: Option<NaiveDate>,
    /// Ignore cached orders and ad spend (fresh data is still cached)
    #[arg(long)]
    pub no_cache: bool,
    /// Skip Facebook and Google Ads; ad spend counts as zero
    #[arg(long)]
    pub no_ads: bool,
    /// Skip the HTML report
    #[arg(long)]
    pub no_html: bool,
    /// Look this many days before --from-date to tell new customers from returning ones
    #[arg(long)]
    pub history_days: Option<u32>,
    /// Directory for report files; defaults to DATA_DIR
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Resolves the CLI date flags against `today`.
///
/// # Errors
///
/// Returns an error when the resulting `from` is after `to`.
pub(crate) fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> anyhow::Result<DateRange> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to - Duration::days(DEFAULT_WINDOW_DAYS));
    DateRange::new(from, to).context("--from-date must not be after --to-date")
}

/// # Errors
///
/// Returns an error if the cost table cannot be loaded, orders cannot be
/// fetched, an order uses an unknown currency, or a report file cannot be
/// written. Ad platform failures are logged and count as zero spend.
pub(crate) async fn run_export(config: &AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let range = resolve_range(args.from_date, args.to_date, today)?;
    let use_cache = !args.no_cache;

    let costs = bizniweb_core::load_costs(&config.costs_path)
        .with_context(|| format!("loading cost table {}", config.costs_path.display()))?;
    let client = OrderClient::from_app_config(config).context("building order API client")?;
    let cache = OrderCache::new(config.orders_cache_dir(), config.order_cache_fresh_days);

    tracing::info!(%range, use_cache, "exporting orders");
    let orders = fetch_orders_cached(&client, &cache, range, today, use_cache)
        .await
        .context("fetching orders")?;
    let fetched = orders.len();
    let (orders, excluded) = split_excluded_statuses(orders, |s| costs.is_excluded_status(s));
    if excluded > 0 {
        tracing::info!(excluded, kept = orders.len(), "dropped orders with excluded statuses");
    }
    if orders.is_empty() {
        tracing::info!(%range, fetched, "no orders in range; nothing to write");
        println!("no orders found for {range}");
        return Ok(());
    }

    let known_customers = match args.history_days.filter(|d| *d > 0) {
        Some(days) => {
            history_customers(&client, &cache, &costs, range, today, days, use_cache).await
        }
        None => HashSet::new(),
    };

    let (facebook, google) = if args.no_ads {
        (DailySpend::new(), DailySpend::new())
    } else {
        crate::ads::fetch_ad_spend(config, range, today, use_cache).await
    };

    let flat = flatten_orders(&orders, &costs).context("flattening orders")?;
    let report = build_report(&flat.rows, &facebook, &google, &costs, range, &known_customers);

    let out_dir = args.output_dir.unwrap_or_else(|| config.data_dir.clone());
    let files = write_csv_reports(&out_dir, &flat.rows, &report)?;
    for path in files.all() {
        tracing::info!(path = %path.display(), "wrote CSV");
    }
    if !args.no_html {
        let path = write_html_report(&out_dir, &report, Local::now().naive_local())?;
        tracing::info!(path = %path.display(), "wrote HTML report");
    }

    let t = &report.totals;
    let cur = &report.currency;
    println!("Export {range}: {} orders, {} rows", t.unique_orders, flat.rows.len());
    println!("  revenue (excl. VAT) {} {cur}", t.total_revenue);
    println!("  product costs       {} {cur}", t.product_expense);
    println!("  ad spend            {} {cur}", t.total_ads_spend);
    println!("  total costs         {} {cur}", t.total_cost);
    println!("  net profit          {} {cur}", t.net_profit);
    println!("  reports in          {}", out_dir.display());
    Ok(())
}

/// Customer keys seen in the `days` before `range`. A failed history fetch
/// is logged and yields an empty set, so every customer counts as new.
async fn history_customers(
    client: &OrderClient,
    cache: &OrderCache,
    costs: &CostTable,
    range: DateRange,
    today: NaiveDate,
    days: u32,
    use_cache: bool,
) -> HashSet<String> {
    let to = range.from - Duration::days(1);
    let from = range.from - Duration::days(i64::from(days));
    let Ok(history) = DateRange::new(from, to) else {
        return HashSet::new();
    };

    match fetch_orders_cached(client, cache, history, today, use_cache).await {
        Ok(orders) => {
            let (orders, _) = split_excluded_statuses(orders, |s| costs.is_excluded_status(s));
            let known: HashSet<String> = orders.iter().map(customer_key).collect();
            tracing::info!(%history, customers = known.len(), "loaded customer history");
            known
        }
        Err(e) => {
            tracing::warn!(%history, error = %e, "failed to fetch customer history; treating all customers as new");
            HashSet::new()
        }
    }
}
