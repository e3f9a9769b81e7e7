//! One [`FlatRow`] per order item with order fields denormalised onto it.
//!
//! Item money columns are converted into the cost table's reporting
//! currency and rounded to cents. `order_total` and `order_currency` are
//! left as the shop reported them.

use std::collections::BTreeSet;

use bizniweb_core::{round_money, CostTable};
use bizniweb_orders::{Address, Order, OrderItem};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ReportError;

/// A row of `export_<range>.csv`. Field order is column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRow {
    #[serde(skip)]
    pub date: NaiveDate,
    #[serde(skip)]
    pub customer_key: String,

    pub order_num: Option<String>,
    pub order_id: String,
    pub external_ref: Option<String>,
    pub purchase_date: String,
    pub status_name: Option<String>,
    pub total_items_in_order: usize,
    pub item_number: Option<usize>,
    pub item_label: Option<String>,
    pub item_ean: Option<String>,
    pub item_quantity: Option<Decimal>,
    pub item_unit_price: Option<Decimal>,
    pub item_total_without_tax: Decimal,
    pub item_tax_rate: Option<Decimal>,
    pub item_tax_amount: Decimal,
    pub item_total_with_tax: Decimal,
    pub item_product_cost: Decimal,
    pub item_profit: Decimal,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_company_id: Option<String>,
    pub customer_vat_id: Option<String>,
    pub order_total: Option<Decimal>,
    pub order_currency: Option<String>,
    pub invoice_street: Option<String>,
    pub invoice_city: Option<String>,
    pub invoice_zip: Option<String>,
    pub invoice_country: Option<String>,
    pub delivery_street: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_zip: Option<String>,
    pub delivery_country: Option<String>,
    pub var_symbol: Option<String>,
    pub last_change: Option<String>,
    pub oss: Option<String>,
    pub oss_country: Option<String>,
    pub status_id: Option<String>,
    pub customer_phone: Option<String>,
    pub invoice_descriptive_num: Option<String>,
    pub invoice_orientation_num: Option<String>,
    pub delivery_descriptive_num: Option<String>,
    pub delivery_orientation_num: Option<String>,
    pub order_total_formatted: Option<String>,
    pub item_import_code: Option<String>,
    pub item_warehouse_number: Option<String>,
    pub item_weight: Option<Decimal>,
    pub item_weight_unit: Option<String>,
    pub item_recycle_fee: Option<Decimal>,
}

impl FlatRow {
    /// Revenue attributed to this row (net of tax, reporting currency).
    #[must_use]
    pub fn revenue(&self) -> Decimal {
        self.item_total_without_tax
    }

    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.item_quantity.unwrap_or_default()
    }

    #[must_use]
    pub fn has_item(&self) -> bool {
        self.item_number.is_some()
    }

    /// Label used to group rows by product.
    #[must_use]
    pub fn product_name(&self) -> &str {
        self.item_label
            .as_deref()
            .or(self.item_ean.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Default)]
pub struct Flattened {
    pub rows: Vec<FlatRow>,
    /// Product labels with no entry in the cost table.
    pub uncosted_products: BTreeSet<String>,
}

/// Flattens `orders` into rows. Missing product costs count as zero and are
/// reported once in a single warning.
///
/// # Errors
///
/// - [`ReportError::UnknownCurrency`] if an item is priced in a currency the
///   cost table has no rate for.
/// - [`ReportError::InvalidPurchaseDate`] if an order's `pur_date` does not
///   start with a calendar date.
pub fn flatten_orders(orders: &[Order], costs: &CostTable) -> Result<Flattened, ReportError> {
    let mut out = Flattened::default();
    for order in orders {
        flatten_order(order, costs, &mut out)?;
    }
    if !out.uncosted_products.is_empty() {
        let names: Vec<&str> = out.uncosted_products.iter().map(String::as_str).collect();
        tracing::warn!(
            count = names.len(),
            products = %names.join(", "),
            "products missing from cost table; their cost counts as zero"
        );
    }
    Ok(out)
}

/// Stable identity of the ordering customer: email, else name, else the
/// order itself.
#[must_use]
pub fn customer_key(order: &Order) -> String {
    let customer = order.customer.as_ref();
    if let Some(email) = customer
        .and_then(|c| c.email.as_deref())
        .map(str::trim)
        .filter(|e| !e.is_empty())
    {
        return email.to_lowercase();
    }
    let name = order.customer_name();
    if !name.is_empty() {
        return name.to_lowercase();
    }
    format!(
        "order:{}",
        order.order_num.as_deref().unwrap_or(order.id.as_str())
    )
}

fn flatten_order(order: &Order, costs: &CostTable, out: &mut Flattened) -> Result<(), ReportError> {
    let date = order
        .purchase_date()
        .ok_or_else(|| ReportError::InvalidPurchaseDate {
            order_id: order.id.clone(),
            value: order.pur_date.clone(),
        })?;
    let base = base_row(order, date);

    if order.items.is_empty() {
        out.rows.push(base);
        return Ok(());
    }

    for (idx, item) in order.items.iter().enumerate() {
        let mut row = base.clone();
        row.total_items_in_order = order.items.len();
        row.item_number = Some(idx + 1);
        fill_item(&mut row, order, item, costs, &mut out.uncosted_products)?;
        out.rows.push(row);
    }
    Ok(())
}

fn fill_item(
    row: &mut FlatRow,
    order: &Order,
    item: &OrderItem,
    costs: &CostTable,
    uncosted: &mut BTreeSet<String>,
) -> Result<(), ReportError> {
    let currency = item
        .price
        .as_ref()
        .and_then(|p| p.currency_code())
        .or_else(|| order.currency_code())
        .unwrap_or(costs.reporting_currency());
    let rate = costs
        .rate(currency)
        .ok_or_else(|| ReportError::UnknownCurrency {
            order_id: order.id.clone(),
            currency: currency.to_owned(),
        })?;

    let quantity = item.quantity.unwrap_or(Decimal::ONE);
    let tax_rate = item.tax_rate.unwrap_or_default();
    let unit_price = item
        .price
        .as_ref()
        .and_then(|p| p.value)
        .unwrap_or_default()
        * rate;
    let is_net = item
        .price
        .as_ref()
        .and_then(|p| p.is_net_price)
        .unwrap_or(false);

    let tax_factor = Decimal::ONE + tax_rate / Decimal::ONE_HUNDRED;
    let (with_tax, without_tax) = if is_net {
        let without = unit_price * quantity;
        (without * tax_factor, without)
    } else {
        let with = unit_price * quantity;
        let without = if tax_rate > Decimal::ZERO {
            with.checked_div(tax_factor).unwrap_or(with)
        } else {
            with
        };
        (with, without)
    };

    let unit_cost = costs.product_cost(item.item_label.as_deref(), item.ean.as_deref());
    if unit_cost.is_none() {
        let name = item
            .item_label
            .as_deref()
            .or(item.ean.as_deref())
            .unwrap_or("<unlabelled item>");
        uncosted.insert(name.to_owned());
    }
    let product_cost = unit_cost.unwrap_or_default() * quantity;

    let without_tax = round_money(without_tax);
    let product_cost = round_money(product_cost);

    row.item_label.clone_from(&item.item_label);
    row.item_ean.clone_from(&item.ean);
    row.item_import_code.clone_from(&item.import_code);
    row.item_warehouse_number.clone_from(&item.warehouse_number);
    row.item_quantity = Some(quantity);
    row.item_tax_rate = Some(tax_rate);
    row.item_unit_price = Some(round_money(unit_price));
    row.item_total_with_tax = round_money(with_tax);
    row.item_total_without_tax = without_tax;
    row.item_tax_amount = round_money(with_tax - without_tax);
    row.item_product_cost = product_cost;
    row.item_profit = without_tax - product_cost;
    row.item_weight = item.weight.as_ref().and_then(|w| w.value);
    row.item_weight_unit = item.weight.as_ref().and_then(|w| w.unit.clone());
    row.item_recycle_fee = item.recycle_fee.as_ref().and_then(|f| f.value);
    Ok(())
}

fn base_row(order: &Order, date: NaiveDate) -> FlatRow {
    let customer = order.customer.clone().unwrap_or_default();
    let invoice = order.invoice_address.clone().unwrap_or_default();
    let delivery: Address = order.delivery_address.clone().unwrap_or_default();
    let status = order.status.clone().unwrap_or_default();
    let sum = order.sum.as_ref();

    FlatRow {
        date,
        customer_key: customer_key(order),
        order_num: order.order_num.clone(),
        order_id: order.id.clone(),
        external_ref: order.external_ref.clone(),
        purchase_date: order.pur_date.clone(),
        status_name: status.name,
        total_items_in_order: 0,
        item_number: None,
        item_label: None,
        item_ean: None,
        item_quantity: None,
        item_unit_price: None,
        item_total_without_tax: Decimal::ZERO,
        item_tax_rate: None,
        item_tax_amount: Decimal::ZERO,
        item_total_with_tax: Decimal::ZERO,
        item_product_cost: Decimal::ZERO,
        item_profit: Decimal::ZERO,
        customer_name: order.customer_name(),
        customer_email: customer.email,
        customer_company_id: customer.company_id,
        customer_vat_id: customer.vat_id,
        order_total: sum.and_then(|s| s.value),
        order_currency: order.currency_code().map(str::to_owned),
        invoice_street: invoice.street,
        invoice_city: invoice.city,
        invoice_zip: invoice.zip,
        invoice_country: invoice.country,
        delivery_street: delivery.street,
        delivery_city: delivery.city,
        delivery_zip: delivery.zip,
        delivery_country: delivery.country,
        var_symbol: order.var_symb.clone(),
        last_change: order.last_change.clone(),
        oss: order.oss.clone(),
        oss_country: order.oss_country.clone(),
        status_id: status.id,
        customer_phone: customer.phone,
        invoice_descriptive_num: invoice.descriptive_number,
        invoice_orientation_num: invoice.orientation_number,
        delivery_descriptive_num: delivery.descriptive_number,
        delivery_orientation_num: delivery.orientation_number,
        order_total_formatted: sum.and_then(|s| s.formatted.clone()),
        item_import_code: None,
        item_warehouse_number: None,
        item_weight: None,
        item_weight_unit: None,
        item_recycle_fee: None,
    }
}

#[cfg(test)]
#[path = "flatten_test.rs"]
mod tests;
