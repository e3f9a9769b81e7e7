//! Google Ads REST client.
//!
//! Exchanges the long-lived refresh token for an access token at the
//! OAuth endpoint, then runs GAQL queries through
//! `customers/{id}/googleAds:search`, following `nextPageToken`.

use std::time::{Duration, Instant};

use bizniweb_core::{DateRange, GoogleAdsConfig};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;

use crate::error::AdsError;
use crate::http::{build_client, decode_response, parse_base_url, AdsHttpSettings};
use crate::retry::retry_fixed;
use crate::types::{
    AccountInfo, AdPlatform, CampaignSpend, DailySpend, GoogleErrorEnvelope, GoogleRow,
    OAuthError, OAuthToken, SearchRequest, SearchResponse,
};

const DEFAULT_API_BASE: &str = "https://googleads.googleapis.com/";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const PLATFORM: AdPlatform = AdPlatform::Google;
const MAX_PAGES: usize = 100;
/// Refresh this long before the access token actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct GoogleAdsClient {
    client: Client,
    config: GoogleAdsConfig,
    api_base: Url,
    token_url: Url,
    settings: AdsHttpSettings,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleAdsClient {
    /// # Errors
    ///
    /// Returns [`AdsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: GoogleAdsConfig, settings: AdsHttpSettings) -> Result<Self, AdsError> {
        Self::with_endpoints(config, settings, DEFAULT_API_BASE, DEFAULT_TOKEN_URL)
    }

    /// Overrides the API host and OAuth token URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidBaseUrl`] if either URL does not parse.
    pub fn with_endpoints(
        config: GoogleAdsConfig,
        settings: AdsHttpSettings,
        api_base: &str,
        token_url: &str,
    ) -> Result<Self, AdsError> {
        let token_url = Url::parse(token_url).map_err(|e| AdsError::InvalidBaseUrl {
            platform: PLATFORM,
            url: token_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: build_client(&settings)?,
            api_base: parse_base_url(PLATFORM, api_base)?,
            token_url,
            config,
            settings,
            token: Mutex::new(None),
        })
    }

    /// Spend per day for the customer account. Several rows for one date
    /// are summed.
    ///
    /// # Errors
    ///
    /// - [`AdsError::Auth`] when the refresh or access token is rejected.
    /// - [`AdsError::Api`] for a Google Ads error payload (bad GAQL, missing
    ///   developer token approval).
    /// - [`AdsError::Http`], [`AdsError::RateLimited`] or
    ///   [`AdsError::UnexpectedStatus`] once retries are exhausted.
    pub async fn daily_spend(&self, range: DateRange) -> Result<DailySpend, AdsError> {
        let query = format!(
            "SELECT segments.date, metrics.cost_micros, metrics.impressions, metrics.clicks \
             FROM customer \
             WHERE segments.date BETWEEN '{}' AND '{}' \
             ORDER BY segments.date",
            range.from.format("%Y-%m-%d"),
            range.to.format("%Y-%m-%d"),
        );

        let mut spend = DailySpend::new();
        for row in self.search(&query).await? {
            let Some(segments) = row.segments else {
                continue;
            };
            *spend.entry(segments.date).or_default() += row.metrics.cost();
        }
        tracing::info!(%range, days = spend.len(), "fetched Google Ads spend");
        Ok(spend)
    }

    /// Spend per campaign over the whole range.
    ///
    /// # Errors
    ///
    /// See [`Self::daily_spend`].
    pub async fn campaign_spend(&self, range: DateRange) -> Result<Vec<CampaignSpend>, AdsError> {
        let query = format!(
            "SELECT campaign.id, campaign.name, campaign.status, metrics.cost_micros, \
             metrics.impressions, metrics.clicks, metrics.conversions \
             FROM campaign \
             WHERE segments.date BETWEEN '{}' AND '{}'",
            range.from.format("%Y-%m-%d"),
            range.to.format("%Y-%m-%d"),
        );

        Ok(self
            .search(&query)
            .await?
            .into_iter()
            .filter_map(|row| {
                let campaign = row.campaign?;
                Some(CampaignSpend {
                    campaign_id: campaign.id.to_string(),
                    campaign_name: campaign.name,
                    status: campaign.status,
                    spend: row.metrics.cost(),
                    impressions: row.metrics.impressions,
                    clicks: row.metrics.clicks,
                    reach: None,
                    conversions: row.metrics.conversions,
                })
            })
            .collect())
    }

    /// Fetches the customer's descriptive name and currency. Used as a
    /// connection test.
    ///
    /// # Errors
    ///
    /// See [`Self::daily_spend`]; [`AdsError::Api`] if no customer row comes
    /// back.
    pub async fn account_info(&self) -> Result<AccountInfo, AdsError> {
        let rows = self
            .search(
                "SELECT customer.id, customer.descriptive_name, customer.currency_code \
                 FROM customer LIMIT 1",
            )
            .await?;
        let customer = rows
            .into_iter()
            .find_map(|row| row.customer)
            .ok_or_else(|| AdsError::Api {
                platform: PLATFORM,
                message: format!("no customer row for {}", self.config.customer_id),
            })?;
        Ok(AccountInfo {
            platform: PLATFORM,
            id: customer.id.to_string(),
            name: customer.descriptive_name.unwrap_or_default(),
            currency: customer.currency_code,
            status: None,
        })
    }

    /// Runs a GAQL query and collects every result row across pages.
    async fn search(&self, query: &str) -> Result<Vec<GoogleRow>, AdsError> {
        let url = self
            .api_base
            .join(&format!(
                "{}/customers/{}/googleAds:search",
                self.config.api_version, self.config.customer_id
            ))
            .map_err(|e| AdsError::InvalidBaseUrl {
                platform: PLATFORM,
                url: self.api_base.to_string(),
                reason: e.to_string(),
            })?;

        let mut rows = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(AdsError::PaginationLimit {
                    platform: PLATFORM,
                    max_pages: MAX_PAGES,
                });
            }

            let result = self.search_page(&url, query, page_token.as_deref()).await;
            if matches!(result, Err(AdsError::Auth { .. })) {
                *self.token.lock().await = None;
            }
            let page = result?;
            rows.extend(page.results);

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
        }
        Ok(rows)
    }

    async fn search_page(
        &self,
        url: &Url,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchResponse, AdsError> {
        let body = SearchRequest { query, page_token };
        retry_fixed(self.settings.max_retries, self.settings.backoff_secs, || {
            let body = &body;
            async move {
                let access_token = self.access_token().await?;
                let mut request = self
                    .client
                    .post(url.clone())
                    .bearer_auth(access_token)
                    .header("developer-token", &self.config.developer_token)
                    .json(body);
                if let Some(login) = &self.config.login_customer_id {
                    request = request.header("login-customer-id", login);
                }
                let response = request.send().await?;
                decode_response(PLATFORM, response, "Google Ads search", google_error).await
            }
        })
        .await
    }

    /// Returns a cached access token, refreshing it when missing or close to
    /// expiry.
    async fn access_token(&self) -> Result<String, AdsError> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", self.config.refresh_token.as_str()),
        ];
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&form)
            .send()
            .await?;
        let token: OAuthToken =
            decode_response(PLATFORM, response, "OAuth token response", oauth_error).await?;
        tracing::debug!(expires_in = token.expires_in, "refreshed Google Ads access token");

        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(access_token)
    }
}

fn oauth_error(status: StatusCode, body: &str) -> AdsError {
    match serde_json::from_str::<OAuthError>(body) {
        Ok(err) => AdsError::Auth {
            platform: PLATFORM,
            message: match err.error_description {
                Some(desc) => format!("{}: {desc}", err.error),
                None => err.error,
            },
        },
        Err(_) => AdsError::UnexpectedStatus {
            platform: PLATFORM,
            status: status.as_u16(),
        },
    }
}

fn google_error(status: StatusCode, body: &str) -> AdsError {
    let Ok(envelope) = serde_json::from_str::<GoogleErrorEnvelope>(body) else {
        return AdsError::UnexpectedStatus {
            platform: PLATFORM,
            status: status.as_u16(),
        };
    };
    let err = envelope.error;
    if status == StatusCode::UNAUTHORIZED || err.status.as_deref() == Some("UNAUTHENTICATED") {
        return AdsError::Auth {
            platform: PLATFORM,
            message: err.message,
        };
    }
    AdsError::Api {
        platform: PLATFORM,
        message: match err.status {
            Some(code) => format!("{} ({code})", err.message),
            None => err.message,
        },
    }
}
