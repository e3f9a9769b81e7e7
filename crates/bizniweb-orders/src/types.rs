//! Response types for the `getOrderList` GraphQL query.
//!
//! ## Observed shape
//!
//! ### `customer`
//! A union of `Company`, `Person` and `UnauthenticatedEmail`. The query
//! selects fields from every branch, so the JSON is a flat object where
//! company fields are simply absent for private customers.
//!
//! ### Money
//! Every amount is `{value, formatted, is_net_price, currency {symbol, code}}`.
//! Item prices are unit prices; `is_net_price` tells whether tax is
//! included.
//!
//! ### `pur_date`
//! `"YYYY-MM-DD HH:MM:SS"` in shop-local time. Only the date part is used
//! for bucketing.
//!
//! ### `data`
//! Entries may be `null` when the API fails to resolve one order; those are
//! skipped and counted by the client.
//!
//! All types also serialize so days can be cached as JSON.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::de;

/// Standard GraphQL envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderListData {
    #[serde(rename = "getOrderList", default)]
    pub get_order_list: Option<OrderList>,
}

#[derive(Debug, Deserialize)]
pub struct OrderList {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub data: Vec<Option<Order>>,
    #[serde(rename = "pageInfo", default, deserialize_with = "de::null_as_default")]
    pub page_info: PageInfo,
}

/// Cursor pagination metadata. The cursor is kept as raw JSON so it is
/// sent back with the same type the API produced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub next_cursor: Option<serde_json::Value>,
    #[serde(default)]
    pub previous_cursor: Option<serde_json::Value>,
    #[serde(default)]
    pub page_index: Option<i64>,
    #[serde(default)]
    pub total_pages: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "de::string_or_scalar")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub order_num: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub pur_date: String,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub var_symb: Option<String>,
    #[serde(default)]
    pub last_change: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub oss: Option<String>,
    #[serde(default)]
    pub oss_country: Option<String>,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub invoice_address: Option<Address>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub sum: Option<Price>,
}

impl Order {
    /// Calendar day of purchase, taken from the leading `YYYY-MM-DD` of
    /// `pur_date`.
    #[must_use]
    pub fn purchase_date(&self) -> Option<NaiveDate> {
        self.pur_date
            .get(..10)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }

    #[must_use]
    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Currency of the order total.
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.sum.as_ref().and_then(Price::currency_code)
    }

    /// Company name for business customers, otherwise `"name surname"`.
    #[must_use]
    pub fn customer_name(&self) -> String {
        let Some(customer) = &self.customer else {
            return String::new();
        };
        if let Some(company) = customer.company_name.as_deref().filter(|c| !c.trim().is_empty()) {
            return company.trim().to_string();
        }
        format!(
            "{} {}",
            customer.name.as_deref().unwrap_or_default(),
            customer.surname.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub company_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub vat_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub vat_id2: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub descriptive_number: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub orientation_number: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub item_label: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub ean: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub import_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_scalar")]
    pub warehouse_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Percent, e.g. `20` for 20 % VAT.
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default)]
    pub recycle_fee: Option<Price>,
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub formatted: Option<String>,
    #[serde(default)]
    pub is_net_price: Option<bool>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

impl Price {
    #[must_use]
    pub fn currency_code(&self) -> Option<&str> {
        self.currency.as_ref().and_then(|c| c.code.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "id": 991,
            "order_num": "2024000123",
            "external_ref": null,
            "pur_date": "2024-05-01 14:22:10",
            "var_symb": 2_024_000_123,
            "status": {"id": 3, "name": "Odoslaná", "color": "#00ff00"},
            "customer": {"name": "Jana", "surname": "Nováková", "email": "Jana@Example.sk"},
            "invoice_address": {"street": "Hlavná", "descriptive_number": 12, "city": "Bratislava", "zip": "81101", "country": "SK"},
            "delivery_address": null,
            "items": [{
                "item_label": "Vevo Shampoo 250ml",
                "ean": "8588000000001",
                "quantity": 2,
                "tax_rate": 20,
                "weight": {"value": 0.25, "unit": "kg"},
                "recycle_fee": null,
                "price": {"value": 12.5, "formatted": "12,50 €", "is_net_price": false,
                          "currency": {"symbol": "€", "code": "EUR"}}
            }],
            "sum": {"value": 25.0, "formatted": "25,00 €", "is_net_price": false,
                    "currency": {"symbol": "€", "code": "EUR"}}
        })
    }

    #[test]
    fn parses_order_with_mixed_scalar_types() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.id, "991");
        assert_eq!(order.var_symb.as_deref(), Some("2024000123"));
        assert_eq!(order.status_name(), Some("Odoslaná"));
        assert_eq!(order.currency_code(), Some("EUR"));
        assert_eq!(
            order.invoice_address.as_ref().and_then(|a| a.descriptive_number.as_deref()),
            Some("12")
        );
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, Some(Decimal::from(2)));
        assert_eq!(
            order.items[0].price.as_ref().and_then(|p| p.value),
            Some("12.5".parse().unwrap())
        );
    }

    #[test]
    fn purchase_date_uses_leading_date() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.purchase_date(), "2024-05-01".parse().ok());
    }

    #[test]
    fn purchase_date_handles_iso_timestamps_and_garbage() {
        let mut order: Order = serde_json::from_value(order_json()).unwrap();
        order.pur_date = "2024-05-01T23:59:59+02:00".to_string();
        assert_eq!(order.purchase_date(), "2024-05-01".parse().ok());
        order.pur_date = "yesterday".to_string();
        assert_eq!(order.purchase_date(), None);
        order.pur_date = String::new();
        assert_eq!(order.purchase_date(), None);
    }

    #[test]
    fn customer_name_prefers_company() {
        let mut order: Order = serde_json::from_value(order_json()).unwrap();
        assert_eq!(order.customer_name(), "Jana Nováková");
        if let Some(customer) = order.customer.as_mut() {
            customer.company_name = Some("Vevo s.r.o.".to_string());
        }
        assert_eq!(order.customer_name(), "Vevo s.r.o.");
    }

    #[test]
    fn cached_form_round_trips() {
        let order: Order = serde_json::from_value(order_json()).unwrap();
        let encoded = serde_json::to_string(&order).unwrap();
        let decoded: Order = serde_json::from_str(&encoded).unwrap();
        assert_eq!(order, decoded);
    }

    #[test]
    fn null_items_become_empty() {
        let order: Order =
            serde_json::from_value(serde_json::json!({"id": "1", "pur_date": "2024-05-01", "items": null}))
                .unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.customer_name(), "");
    }
}
