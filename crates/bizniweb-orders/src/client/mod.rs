//! HTTP client for the BizniWeb GraphQL order API.

mod fetch_all;

use std::time::Duration;

use bizniweb_core::{AppConfig, DateRange};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;

use crate::error::OrderApiError;
use crate::query::{GraphqlRequest, OrderFilter, OrderListVariables, OrderParams, ORDER_LIST_QUERY};
use crate::retry::retry_fixed;
use crate::types::{GraphqlResponse, Order, OrderListData, PageInfo};

/// Maximum number of pages followed in one pagination run.
///
/// Each page may be retried up to `max_retries` times, so the worst-case
/// request count is `MAX_PAGES * (1 + max_retries)`.
pub(super) const MAX_PAGES: usize = 5000;

const AUTH_HEADER: &str = "BW-API-Key";

/// Connection and paging knobs for [`OrderClient`].
#[derive(Debug, Clone)]
pub struct OrderClientSettings {
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub max_retries: u32,
    pub backoff_secs: u64,
    pub inter_request_delay_ms: u64,
    /// Send `pur_date_from/to` to the server. When false the client pages
    /// through ascending results and stops once it passes the range end.
    pub server_date_filter: bool,
}

impl OrderClientSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout_secs: config.request_timeout_secs,
            page_size: config.page_size,
            max_retries: config.max_retries,
            backoff_secs: config.retry_backoff_secs,
            inter_request_delay_ms: config.inter_request_delay_ms,
            server_date_filter: config.server_date_filter,
        }
    }
}

/// One decoded page of orders.
#[derive(Debug)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// `null` entries the API returned in place of orders.
    pub skipped: usize,
    pub page_info: PageInfo,
}

/// Client for `getOrderList`.
///
/// Transient failures (network errors, 429, 5xx) are retried with a fixed
/// delay; everything else surfaces as a typed [`OrderApiError`].
pub struct OrderClient {
    pub(super) client: Client,
    pub(super) settings: OrderClientSettings,
}

impl OrderClient {
    /// Builds the HTTP client with timeouts, user agent and the API token
    /// header.
    ///
    /// # Errors
    ///
    /// - [`OrderApiError::InvalidApiUrl`] if `settings.api_url` does not parse.
    /// - [`OrderApiError::InvalidToken`] if the token is not a valid header value.
    /// - [`OrderApiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(settings: OrderClientSettings, api_token: &str) -> Result<Self, OrderApiError> {
        reqwest::Url::parse(&settings.api_url).map_err(|e| OrderApiError::InvalidApiUrl {
            url: settings.api_url.clone(),
            reason: e.to_string(),
        })?;

        let mut auth = HeaderValue::from_str(&format!("Token {api_token}"))
            .map_err(|_| OrderApiError::InvalidToken)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTH_HEADER, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()?;
        Ok(Self { client, settings })
    }

    /// # Errors
    ///
    /// [`OrderApiError::MissingToken`] when no API token is configured,
    /// otherwise see [`Self::new`].
    pub fn from_app_config(config: &AppConfig) -> Result<Self, OrderApiError> {
        let token = config
            .api_token
            .as_deref()
            .ok_or(OrderApiError::MissingToken)?;
        Self::new(OrderClientSettings::from_app_config(config), token)
    }

    #[must_use]
    pub fn settings(&self) -> &OrderClientSettings {
        &self.settings
    }

    /// Fetches one page of orders, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`OrderApiError::Unauthorized`] on 401/403 (not retried).
    /// - [`OrderApiError::RateLimited`] on 429 after retries are exhausted.
    /// - [`OrderApiError::UnexpectedStatus`] on other non-2xx statuses (5xx retried).
    /// - [`OrderApiError::Http`] on network failure after retries are exhausted.
    /// - [`OrderApiError::GraphQl`] when the response has errors and no data.
    /// - [`OrderApiError::Deserialize`] when the body is not a valid response.
    pub async fn fetch_page(
        &self,
        range: DateRange,
        cursor: Option<&serde_json::Value>,
    ) -> Result<OrderPage, OrderApiError> {
        let request = GraphqlRequest {
            query: ORDER_LIST_QUERY,
            variables: OrderListVariables {
                filter: self
                    .settings
                    .server_date_filter
                    .then(|| OrderFilter::new(range.from, range.to)),
                params: OrderParams::ascending_by_purchase_date(self.settings.page_size, cursor),
            },
        };
        let url = self.settings.api_url.as_str();

        retry_fixed(self.settings.max_retries, self.settings.backoff_secs, || {
            let request = &request;
            async move {
                let response = self.client.post(url).json(request).send().await?;
                let status = response.status();

                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(OrderApiError::Unauthorized {
                        status: status.as_u16(),
                    });
                }

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(OrderApiError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    return Err(OrderApiError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_owned(),
                    });
                }

                let body = response.text().await?;
                let envelope = serde_json::from_str::<GraphqlResponse<OrderListData>>(&body)
                    .map_err(|e| OrderApiError::Deserialize {
                        context: "getOrderList response".to_owned(),
                        source: e,
                    })?;
                into_page(envelope)
            }
        })
        .await
    }
}

/// Unwraps a GraphQL envelope. Errors alongside data are logged and the
/// data is used.
fn into_page(envelope: GraphqlResponse<OrderListData>) -> Result<OrderPage, OrderApiError> {
    let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
    let list = envelope.data.and_then(|d| d.get_order_list);

    let Some(list) = list else {
        if messages.is_empty() {
            return Err(OrderApiError::MissingData);
        }
        return Err(OrderApiError::GraphQl { messages });
    };

    if !messages.is_empty() {
        tracing::warn!(
            errors = %messages.join("; "),
            "order API returned partial data with GraphQL errors"
        );
    }

    let total = list.data.len();
    let orders: Vec<Order> = list.data.into_iter().flatten().collect();
    let skipped = total - orders.len();
    if skipped > 0 {
        tracing::warn!(skipped, "order API returned null orders; skipping them");
    }

    Ok(OrderPage {
        orders,
        skipped,
        page_info: list.page_info,
    })
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
