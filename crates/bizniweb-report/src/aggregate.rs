//! Rollups over flattened rows.
//!
//! Every day of the range gets a [`DailySummary`], including days without
//! orders, since fixed costs and ad spend accrue regardless. Weekly and
//! monthly rollups sum the daily money figures but recount customers over
//! the whole period.

use std::collections::{BTreeMap, HashMap, HashSet};

use bizniweb_ads::DailySpend;
use bizniweb_core::{percent, ratio, round_money, CostTable, DateRange};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::flatten::FlatRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub unique_orders: usize,
    pub total_items: usize,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
    pub product_expense: Decimal,
    pub packaging_cost: Decimal,
    pub fixed_cost: Decimal,
    pub facebook_ads_spend: Decimal,
    pub google_ads_spend: Decimal,
    pub total_ads_spend: Decimal,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Option<Decimal>,
    pub average_order_value: Option<Decimal>,
    pub unique_customers: usize,
    pub new_customers: usize,
    pub returning_customers: usize,
    pub returning_customer_percent: Option<Decimal>,
    pub cac: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    /// ISO week, Monday to Sunday.
    Week,
    Month,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    /// `2024-W18` or `2024-05`.
    pub period: String,
    /// First and last day of the period that fall inside the report range.
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: usize,
    pub unique_orders: usize,
    pub total_items: usize,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
    pub product_expense: Decimal,
    pub packaging_cost: Decimal,
    pub fixed_cost: Decimal,
    pub facebook_ads_spend: Decimal,
    pub google_ads_spend: Decimal,
    pub total_ads_spend: Decimal,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Option<Decimal>,
    pub average_order_value: Option<Decimal>,
    pub unique_customers: usize,
    pub new_customers: usize,
    pub returning_customers: usize,
    pub returning_customer_percent: Option<Decimal>,
    pub cac: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateProductSummary {
    pub date: NaiveDate,
    pub product_name: String,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
    pub product_expense: Decimal,
    pub profit: Decimal,
    /// Item rows, not distinct orders.
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product_name: String,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
    pub product_expense: Decimal,
    pub profit: Decimal,
    /// Profit over product cost only.
    pub roi_percent: Option<Decimal>,
    pub order_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub customer_key: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub first_order_date: NaiveDate,
    pub last_order_date: NaiveDate,
    pub order_count: usize,
    /// Lifetime value within the report window.
    pub total_revenue: Decimal,
    pub average_order_value: Option<Decimal>,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTotals {
    pub unique_orders: usize,
    pub total_items: usize,
    pub total_quantity: Decimal,
    pub total_revenue: Decimal,
    pub product_expense: Decimal,
    pub packaging_cost: Decimal,
    pub fixed_cost: Decimal,
    pub facebook_ads_spend: Decimal,
    pub google_ads_spend: Decimal,
    pub total_ads_spend: Decimal,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Option<Decimal>,
    pub average_order_value: Option<Decimal>,
    pub facebook_cost_per_order: Option<Decimal>,
    pub unique_customers: usize,
    pub new_customers: usize,
    pub returning_customers: usize,
    pub cac: Option<Decimal>,
    pub average_clv: Option<Decimal>,
    pub ltv_cac_ratio: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub range: DateRange,
    pub currency: String,
    pub daily: Vec<DailySummary>,
    pub date_product: Vec<DateProductSummary>,
    pub products: Vec<ProductSummary>,
    pub weekly: Vec<PeriodSummary>,
    pub monthly: Vec<PeriodSummary>,
    pub customers: Vec<CustomerSummary>,
    pub totals: ReportTotals,
}

/// Row-level sums for one day or period.
#[derive(Default)]
struct Bucket<'a> {
    orders: HashSet<&'a str>,
    customers: HashSet<&'a str>,
    items: usize,
    quantity: Decimal,
    revenue: Decimal,
    product_expense: Decimal,
}

impl<'a> Bucket<'a> {
    fn add(&mut self, row: &'a FlatRow) {
        self.orders.insert(&row.order_id);
        self.customers.insert(&row.customer_key);
        if row.has_item() {
            self.items += 1;
        }
        self.quantity += row.quantity();
        self.revenue += row.revenue();
        self.product_expense += row.item_product_cost;
    }
}

/// Cost side of a day or period.
#[derive(Default, Clone, Copy)]
struct Costs {
    packaging: Decimal,
    fixed: Decimal,
    facebook: Decimal,
    google: Decimal,
}

struct Metrics {
    unique_orders: usize,
    total_items: usize,
    total_quantity: Decimal,
    total_revenue: Decimal,
    product_expense: Decimal,
    packaging_cost: Decimal,
    fixed_cost: Decimal,
    facebook_ads_spend: Decimal,
    google_ads_spend: Decimal,
    total_ads_spend: Decimal,
    total_cost: Decimal,
    net_profit: Decimal,
    roi_percent: Option<Decimal>,
    average_order_value: Option<Decimal>,
    unique_customers: usize,
    new_customers: usize,
    returning_customers: usize,
    returning_customer_percent: Option<Decimal>,
    cac: Option<Decimal>,
}

fn metrics(bucket: &Bucket<'_>, costs: Costs, new_customers: usize) -> Metrics {
    let revenue = round_money(bucket.revenue);
    let product_expense = round_money(bucket.product_expense);
    let facebook = round_money(costs.facebook);
    let google = round_money(costs.google);
    let ads = facebook + google;
    let total_cost =
        product_expense + round_money(costs.packaging) + round_money(costs.fixed) + ads;
    let net_profit = revenue - total_cost;
    let unique_customers = bucket.customers.len();
    let returning = unique_customers.saturating_sub(new_customers);

    Metrics {
        unique_orders: bucket.orders.len(),
        total_items: bucket.items,
        total_quantity: bucket.quantity,
        total_revenue: revenue,
        product_expense,
        packaging_cost: round_money(costs.packaging),
        fixed_cost: round_money(costs.fixed),
        facebook_ads_spend: facebook,
        google_ads_spend: google,
        total_ads_spend: ads,
        total_cost,
        net_profit,
        roi_percent: percent(net_profit, total_cost),
        average_order_value: ratio(revenue, Decimal::from(bucket.orders.len())),
        unique_customers,
        new_customers,
        returning_customers: returning,
        returning_customer_percent: percent(
            Decimal::from(returning),
            Decimal::from(unique_customers),
        ),
        cac: ratio(ads, Decimal::from(new_customers)),
    }
}

/// Builds every rollup of the report.
///
/// `known_customers` holds customer keys seen before the range; they never
/// count as new.
#[must_use]
pub fn build_report(
    rows: &[FlatRow],
    facebook_spend: &DailySpend,
    google_spend: &DailySpend,
    costs: &CostTable,
    range: DateRange,
    known_customers: &HashSet<String>,
) -> Report {
    let rows: Vec<&FlatRow> = rows.iter().filter(|r| range.contains(r.date)).collect();

    let mut first_seen: HashMap<&str, NaiveDate> = HashMap::new();
    for &row in &rows {
        first_seen
            .entry(row.customer_key.as_str())
            .and_modify(|d| *d = (*d).min(row.date))
            .or_insert(row.date);
    }
    let is_new_in = |key: &str, from: NaiveDate, to: NaiveDate| {
        !known_customers.contains(key)
            && first_seen
                .get(key)
                .is_some_and(|first| from <= *first && *first <= to)
    };

    let mut by_day: BTreeMap<NaiveDate, Vec<&FlatRow>> = BTreeMap::new();
    for &row in &rows {
        by_day.entry(row.date).or_default().push(row);
    }

    let day_costs = |day: NaiveDate, orders: usize| Costs {
        packaging: costs.packaging_cost_per_order() * Decimal::from(orders),
        fixed: costs.fixed_daily_cost(),
        facebook: facebook_spend.get(&day).copied().unwrap_or_default(),
        google: google_spend.get(&day).copied().unwrap_or_default(),
    };

    let mut daily = Vec::new();
    for day in range.days() {
        let mut bucket = Bucket::default();
        for &row in by_day.get(&day).into_iter().flatten() {
            bucket.add(row);
        }
        let new = bucket
            .customers
            .iter()
            .filter(|c| is_new_in(**c, day, day))
            .count();
        let m = metrics(&bucket, day_costs(day, bucket.orders.len()), new);
        daily.push(DailySummary {
            date: day,
            unique_orders: m.unique_orders,
            total_items: m.total_items,
            total_quantity: m.total_quantity,
            total_revenue: m.total_revenue,
            product_expense: m.product_expense,
            packaging_cost: m.packaging_cost,
            fixed_cost: m.fixed_cost,
            facebook_ads_spend: m.facebook_ads_spend,
            google_ads_spend: m.google_ads_spend,
            total_ads_spend: m.total_ads_spend,
            total_cost: m.total_cost,
            net_profit: m.net_profit,
            roi_percent: m.roi_percent,
            average_order_value: m.average_order_value,
            unique_customers: m.unique_customers,
            new_customers: m.new_customers,
            returning_customers: m.returning_customers,
            returning_customer_percent: m.returning_customer_percent,
            cac: m.cac,
        });
    }

    let period_rollup = |kind: PeriodKind| {
        let mut groups: BTreeMap<(NaiveDate, String), Vec<&DailySummary>> = BTreeMap::new();
        for day in &daily {
            groups.entry(period_key(kind, day.date)).or_default().push(day);
        }
        groups
            .into_iter()
            .filter_map(|((_, label), days)| {
                let start = days.first()?.date;
                let end = days.last()?.date;
                let mut bucket = Bucket::default();
                let mut period_costs = Costs::default();
                for day in &days {
                    for &row in by_day.get(&day.date).into_iter().flatten() {
                        bucket.add(row);
                    }
                    period_costs.packaging += day.packaging_cost;
                    period_costs.fixed += day.fixed_cost;
                    period_costs.facebook += day.facebook_ads_spend;
                    period_costs.google += day.google_ads_spend;
                }
                let new = bucket
                    .customers
                    .iter()
                    .filter(|c| is_new_in(**c, start, end))
                    .count();
                let m = metrics(&bucket, period_costs, new);
                Some(PeriodSummary {
                    period: label,
                    start,
                    end,
                    days: days.len(),
                    unique_orders: m.unique_orders,
                    total_items: m.total_items,
                    total_quantity: m.total_quantity,
                    total_revenue: m.total_revenue,
                    product_expense: m.product_expense,
                    packaging_cost: m.packaging_cost,
                    fixed_cost: m.fixed_cost,
                    facebook_ads_spend: m.facebook_ads_spend,
                    google_ads_spend: m.google_ads_spend,
                    total_ads_spend: m.total_ads_spend,
                    total_cost: m.total_cost,
                    net_profit: m.net_profit,
                    roi_percent: m.roi_percent,
                    average_order_value: m.average_order_value,
                    unique_customers: m.unique_customers,
                    new_customers: m.new_customers,
                    returning_customers: m.returning_customers,
                    returning_customer_percent: m.returning_customer_percent,
                    cac: m.cac,
                })
            })
            .collect::<Vec<_>>()
    };
    let weekly = period_rollup(PeriodKind::Week);
    let monthly = period_rollup(PeriodKind::Month);

    let mut all = Bucket::default();
    let mut all_costs = Costs::default();
    for &row in &rows {
        all.add(row);
    }
    for day in &daily {
        all_costs.packaging += day.packaging_cost;
        all_costs.fixed += day.fixed_cost;
        all_costs.facebook += day.facebook_ads_spend;
        all_costs.google += day.google_ads_spend;
    }
    let new_total = all
        .customers
        .iter()
        .filter(|c| is_new_in(**c, range.from, range.to))
        .count();
    let m = metrics(&all, all_costs, new_total);
    let average_clv = ratio(m.total_revenue, Decimal::from(m.unique_customers));
    let totals = ReportTotals {
        unique_orders: m.unique_orders,
        total_items: m.total_items,
        total_quantity: m.total_quantity,
        total_revenue: m.total_revenue,
        product_expense: m.product_expense,
        packaging_cost: m.packaging_cost,
        fixed_cost: m.fixed_cost,
        facebook_ads_spend: m.facebook_ads_spend,
        google_ads_spend: m.google_ads_spend,
        total_ads_spend: m.total_ads_spend,
        total_cost: m.total_cost,
        net_profit: m.net_profit,
        roi_percent: m.roi_percent,
        average_order_value: m.average_order_value,
        facebook_cost_per_order: ratio(m.facebook_ads_spend, Decimal::from(m.unique_orders)),
        unique_customers: m.unique_customers,
        new_customers: m.new_customers,
        returning_customers: m.returning_customers,
        cac: m.cac,
        average_clv,
        ltv_cac_ratio: average_clv.zip(m.cac).and_then(|(clv, cac)| ratio(clv, cac)),
    };

    Report {
        range,
        currency: costs.reporting_currency().to_owned(),
        date_product: date_product_rollup(&rows),
        products: product_rollup(&rows),
        customers: customer_rollup(&rows, known_customers),
        daily,
        weekly,
        monthly,
        totals,
    }
}

/// Sort key and label of the period containing `day`.
fn period_key(kind: PeriodKind, day: NaiveDate) -> (NaiveDate, String) {
    match kind {
        PeriodKind::Week => {
            let week = day.iso_week();
            let monday =
                day - chrono::Duration::days(i64::from(day.weekday().num_days_from_monday()));
            (monday, format!("{}-W{:02}", week.year(), week.week()))
        }
        PeriodKind::Month => {
            let first = day.with_day(1).unwrap_or(day);
            (first, day.format("%Y-%m").to_string())
        }
    }
}

fn date_product_rollup(rows: &[&FlatRow]) -> Vec<DateProductSummary> {
    let mut groups: BTreeMap<(NaiveDate, &str), DateProductSummary> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.has_item()) {
        let entry = groups
            .entry((row.date, row.product_name()))
            .or_insert_with(|| DateProductSummary {
                date: row.date,
                product_name: row.product_name().to_owned(),
                total_quantity: Decimal::ZERO,
                total_revenue: Decimal::ZERO,
                product_expense: Decimal::ZERO,
                profit: Decimal::ZERO,
                order_count: 0,
            });
        entry.total_quantity += row.quantity();
        entry.total_revenue += row.revenue();
        entry.product_expense += row.item_product_cost;
        entry.profit += row.item_profit;
        entry.order_count += 1;
    }
    groups.into_values().collect()
}

fn product_rollup(rows: &[&FlatRow]) -> Vec<ProductSummary> {
    let mut groups: HashMap<&str, (ProductSummary, HashSet<&str>)> = HashMap::new();
    for row in rows.iter().filter(|r| r.has_item()) {
        let (entry, orders) = groups.entry(row.product_name()).or_insert_with(|| {
            (
                ProductSummary {
                    product_name: row.product_name().to_owned(),
                    total_quantity: Decimal::ZERO,
                    total_revenue: Decimal::ZERO,
                    product_expense: Decimal::ZERO,
                    profit: Decimal::ZERO,
                    roi_percent: None,
                    order_count: 0,
                },
                HashSet::new(),
            )
        });
        entry.total_quantity += row.quantity();
        entry.total_revenue += row.revenue();
        entry.product_expense += row.item_product_cost;
        entry.profit += row.item_profit;
        orders.insert(&row.order_id);
    }

    let mut products: Vec<ProductSummary> = groups
        .into_values()
        .map(|(mut p, orders)| {
            p.order_count = orders.len();
            p.roi_percent = percent(p.profit, p.product_expense);
            p
        })
        .collect();
    products.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    products
}

fn customer_rollup(rows: &[&FlatRow], known: &HashSet<String>) -> Vec<CustomerSummary> {
    let mut groups: HashMap<&str, (CustomerSummary, HashSet<&str>)> = HashMap::new();
    for &row in rows {
        let (entry, orders) = groups.entry(row.customer_key.as_str()).or_insert_with(|| {
            (
                CustomerSummary {
                    customer_key: row.customer_key.clone(),
                    customer_name: row.customer_name.clone(),
                    customer_email: row.customer_email.clone(),
                    first_order_date: row.date,
                    last_order_date: row.date,
                    order_count: 0,
                    total_revenue: Decimal::ZERO,
                    average_order_value: None,
                    is_new: !known.contains(&row.customer_key),
                },
                HashSet::new(),
            )
        });
        entry.first_order_date = entry.first_order_date.min(row.date);
        entry.last_order_date = entry.last_order_date.max(row.date);
        entry.total_revenue += row.revenue();
        orders.insert(&row.order_id);
    }

    let mut customers: Vec<CustomerSummary> = groups
        .into_values()
        .map(|(mut c, orders)| {
            c.order_count = orders.len();
            c.average_order_value = ratio(c.total_revenue, Decimal::from(c.order_count));
            c
        })
        .collect();
    customers.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.customer_key.cmp(&b.customer_key))
    });
    customers
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
