//! The `getOrderList` query document and its variables.

use chrono::NaiveDate;
use serde::Serialize;

/// Order list query. `price_elements` is deliberately not selected: the API
/// fails the whole page when it is requested for some orders.
pub const ORDER_LIST_QUERY: &str = r"
query GetOrders($filter: OrderFilter, $params: OrderParams) {
  getOrderList(filter: $filter, params: $params) {
    data {
      id
      order_num
      external_ref
      pur_date
      var_symb
      last_change
      oss
      oss_country
      status { id name color }
      customer {
        ... on Company { company_name company_id vat_id vat_id2 name surname phone email }
        ... on Person { name surname phone email }
        ... on UnauthenticatedEmail { name surname phone email }
      }
      invoice_address { street descriptive_number orientation_number city zip country }
      delivery_address { street descriptive_number orientation_number city zip country }
      items {
        item_label
        ean
        import_code
        warehouse_number
        quantity
        tax_rate
        weight { value unit }
        recycle_fee { value formatted is_net_price currency { symbol code } }
        price { value formatted is_net_price currency { symbol code } }
      }
      sum { value formatted is_net_price currency { symbol code } }
    }
    pageInfo {
      hasNextPage
      hasPreviousPage
      nextCursor
      previousCursor
      pageIndex
      totalPages
    }
  }
}
";

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'static str,
    pub variables: OrderListVariables<'a>,
}

#[derive(Debug, Serialize)]
pub struct OrderListVariables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<OrderFilter>,
    pub params: OrderParams<'a>,
}

/// Server-side purchase date window, both ends inclusive.
#[derive(Debug, Serialize)]
pub struct OrderFilter {
    pub pur_date_from: String,
    pub pur_date_to: String,
}

impl OrderFilter {
    #[must_use]
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            pur_date_from: from.format("%Y-%m-%d").to_string(),
            pur_date_to: to.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderParams<'a> {
    pub limit: u32,
    pub order_by: &'static str,
    pub sort: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a serde_json::Value>,
}

impl<'a> OrderParams<'a> {
    /// Oldest first, so callers can stop once they pass the end of a range.
    #[must_use]
    pub fn ascending_by_purchase_date(limit: u32, cursor: Option<&'a serde_json::Value>) -> Self {
        Self {
            limit,
            order_by: "pur_date",
            sort: "ASC",
            cursor,
        }
    }
}
