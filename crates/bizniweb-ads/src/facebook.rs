//! Facebook Marketing API client (Graph REST).
//!
//! All requests are `GET`s authenticated with an `access_token` query
//! parameter. List endpoints page through `paging.next`, an absolute URL
//! that already carries every parameter.

use bizniweb_core::{DateRange, FacebookConfig};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::AdsError;
use crate::http::{build_client, decode_response, parse_base_url, AdsHttpSettings};
use crate::retry::retry_fixed;
use crate::types::{
    AccountInfo, AdPlatform, CampaignSpend, DailyInsight, DailySpend, FbAccount, FbCampaign,
    FbInsightRow, GraphErrorEnvelope, GraphList,
};

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/";
const PLATFORM: AdPlatform = AdPlatform::Facebook;
const MAX_PAGES: usize = 100;
const PAGE_LIMIT: &str = "500";
/// Graph error code for an invalid or expired access token.
const INVALID_TOKEN_CODE: i64 = 190;

pub struct FacebookAdsClient {
    client: Client,
    config: FacebookConfig,
    base_url: Url,
    settings: AdsHttpSettings,
}

impl FacebookAdsClient {
    /// # Errors
    ///
    /// Returns [`AdsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(config: FacebookConfig, settings: AdsHttpSettings) -> Result<Self, AdsError> {
        Self::with_base_url(config, settings, DEFAULT_BASE_URL)
    }

    /// Points the client at another Graph host (a mock server in tests).
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::InvalidBaseUrl`] if `base_url` does not parse, or
    /// [`AdsError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        config: FacebookConfig,
        settings: AdsHttpSettings,
        base_url: &str,
    ) -> Result<Self, AdsError> {
        Ok(Self {
            client: build_client(&settings)?,
            base_url: parse_base_url(PLATFORM, base_url)?,
            config,
            settings,
        })
    }

    /// Spend per day for the ad account.
    ///
    /// # Errors
    ///
    /// See [`Self::daily_insights`].
    pub async fn daily_spend(&self, range: DateRange) -> Result<DailySpend, AdsError> {
        let mut spend = DailySpend::new();
        for insight in self.daily_insights(range).await? {
            *spend.entry(insight.date).or_default() += insight.spend;
        }
        tracing::info!(%range, days = spend.len(), "fetched Facebook Ads spend");
        Ok(spend)
    }

    /// Account-level delivery metrics, one entry per day with activity.
    ///
    /// # Errors
    ///
    /// - [`AdsError::Auth`] when the access token is rejected.
    /// - [`AdsError::Api`] for any other Graph error payload.
    /// - [`AdsError::Http`], [`AdsError::RateLimited`] or
    ///   [`AdsError::UnexpectedStatus`] once retries are exhausted.
    /// - [`AdsError::Deserialize`] if a page does not match the expected shape.
    pub async fn daily_insights(&self, range: DateRange) -> Result<Vec<DailyInsight>, AdsError> {
        let time_range = time_range_param(range);
        let url = self.endpoint(
            &format!("{}/insights", self.config.ad_account_id),
            &[
                ("fields", "spend,impressions,clicks,cpc,cpm,ctr"),
                ("time_range", &time_range),
                ("time_increment", "1"),
                ("level", "account"),
                ("limit", PAGE_LIMIT),
            ],
        )?;
        let rows: Vec<FbInsightRow> = self.get_all(url, "Facebook account insights").await?;

        Ok(rows
            .into_iter()
            .map(|row| DailyInsight {
                date: row.date_start,
                spend: row.spend.unwrap_or_default(),
                impressions: row.impressions,
                clicks: row.clicks,
                cpc: row.cpc,
                cpm: row.cpm,
                ctr: row.ctr,
            })
            .collect())
    }

    /// Spend per campaign over the whole range. Campaigns without delivery
    /// in the range are omitted; a campaign whose insights request fails is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns the error from listing campaigns; see [`Self::daily_insights`].
    pub async fn campaign_spend(&self, range: DateRange) -> Result<Vec<CampaignSpend>, AdsError> {
        let url = self.endpoint(
            &format!("{}/campaigns", self.config.ad_account_id),
            &[("fields", "id,name,status"), ("limit", PAGE_LIMIT)],
        )?;
        let campaigns: Vec<FbCampaign> = self.get_all(url, "Facebook campaigns").await?;
        let time_range = time_range_param(range);

        let mut result = Vec::new();
        for campaign in campaigns {
            let url = self.endpoint(
                &format!("{}/insights", campaign.id),
                &[
                    ("fields", "spend,impressions,clicks,reach"),
                    ("time_range", &time_range),
                    ("level", "campaign"),
                ],
            )?;
            let rows: Vec<FbInsightRow> =
                match self.get_all(url, "Facebook campaign insights").await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!(campaign_id = %campaign.id, error = %e, "skipping campaign insights");
                        continue;
                    }
                };
            let Some(row) = rows.into_iter().next() else {
                continue;
            };
            result.push(CampaignSpend {
                campaign_id: campaign.id,
                campaign_name: campaign.name,
                status: campaign.status,
                spend: row.spend.unwrap_or_default(),
                impressions: row.impressions,
                clicks: row.clicks,
                reach: Some(row.reach),
                conversions: None,
            });
        }
        Ok(result)
    }

    /// Fetches the account name, currency and status. Used as a connection
    /// test.
    ///
    /// # Errors
    ///
    /// See [`Self::daily_insights`].
    pub async fn account_info(&self) -> Result<AccountInfo, AdsError> {
        let url = self.endpoint(
            &self.config.ad_account_id,
            &[("fields", "id,name,currency,account_status")],
        )?;
        let account: FbAccount = self.get_json(url, "Facebook ad account").await?;
        Ok(AccountInfo {
            platform: PLATFORM,
            id: account
                .id
                .unwrap_or_else(|| self.config.ad_account_id.clone()),
            name: account.name.unwrap_or_default(),
            currency: account.currency,
            status: account.account_status.map(account_status_label),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, AdsError> {
        let mut url = self
            .base_url
            .join(&format!("{}/{path}", self.config.api_version))
            .map_err(|e| AdsError::InvalidBaseUrl {
                platform: PLATFORM,
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", &self.config.access_token);
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Follows `paging.next` until exhausted.
    async fn get_all<T: DeserializeOwned>(
        &self,
        first: Url,
        context: &str,
    ) -> Result<Vec<T>, AdsError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0usize;

        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(AdsError::PaginationLimit {
                    platform: PLATFORM,
                    max_pages: MAX_PAGES,
                });
            }
            let page: GraphList<T> = self.get_json(url, context).await?;
            items.extend(page.data);
            // An unparseable next link is an error, not the last page.
            next = match page.paging.and_then(|p| p.next) {
                Some(link) => Some(Url::parse(&link).map_err(|e| AdsError::Api {
                    platform: PLATFORM,
                    message: format!("{context}: paging.next is not a valid URL: {e}"),
                })?),
                None => None,
            };
        }
        Ok(items)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, AdsError> {
        retry_fixed(self.settings.max_retries, self.settings.backoff_secs, || {
            let url = url.clone();
            async move {
                // Strip the URL from transport errors; it carries the token.
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(reqwest::Error::without_url)?;
                decode_response(PLATFORM, response, context, graph_error).await
            }
        })
        .await
    }
}

fn time_range_param(range: DateRange) -> String {
    serde_json::json!({
        "since": range.from.format("%Y-%m-%d").to_string(),
        "until": range.to.format("%Y-%m-%d").to_string(),
    })
    .to_string()
}

fn graph_error(status: StatusCode, body: &str) -> AdsError {
    let Ok(envelope) = serde_json::from_str::<GraphErrorEnvelope>(body) else {
        return AdsError::UnexpectedStatus {
            platform: PLATFORM,
            status: status.as_u16(),
        };
    };
    let err = envelope.error;
    if status == StatusCode::UNAUTHORIZED || err.code == Some(INVALID_TOKEN_CODE) {
        return AdsError::Auth {
            platform: PLATFORM,
            message: err.message,
        };
    }
    let message = match (err.kind, err.code) {
        (Some(kind), Some(code)) => format!("{} ({kind}, code {code})", err.message),
        (None, Some(code)) => format!("{} (code {code})", err.message),
        _ => err.message,
    };
    AdsError::Api {
        platform: PLATFORM,
        message,
    }
}

fn account_status_label(code: i64) -> String {
    match code {
        1 => "ACTIVE".to_owned(),
        2 => "DISABLED".to_owned(),
        3 => "UNSETTLED".to_owned(),
        7 => "PENDING_RISK_REVIEW".to_owned(),
        8 => "PENDING_SETTLEMENT".to_owned(),
        9 => "IN_GRACE_PERIOD".to_owned(),
        100 => "PENDING_CLOSURE".to_owned(),
        101 => "CLOSED".to_owned(),
        other => format!("STATUS_{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> FacebookAdsClient {
        FacebookAdsClient::with_base_url(
            FacebookConfig {
                access_token: "fb-token".to_owned(),
                ad_account_id: "act_123".to_owned(),
                api_version: "v21.0".to_owned(),
            },
            AdsHttpSettings {
                timeout_secs: 5,
                user_agent: "bizniweb-test/0.1".to_owned(),
                max_retries: 0,
                backoff_secs: 0,
            },
            base_url,
        )
        .unwrap()
    }

    #[test]
    fn endpoint_includes_version_account_and_token() {
        let url = client("https://graph.facebook.com")
            .endpoint("act_123/insights", &[("level", "account")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://graph.facebook.com/v21.0/act_123/insights?access_token=fb-token&level=account"
        );
    }

    #[test]
    fn time_range_is_json() {
        let range = DateRange::new(
            "2024-05-01".parse().unwrap(),
            "2024-05-07".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(
            time_range_param(range),
            r#"{"since":"2024-05-01","until":"2024-05-07"}"#
        );
    }

    #[test]
    fn expired_token_maps_to_auth() {
        let body = r#"{"error":{"message":"Error validating access token","type":"OAuthException","code":190}}"#;
        assert!(matches!(
            graph_error(StatusCode::BAD_REQUEST, body),
            AdsError::Auth { .. }
        ));
    }

    #[test]
    fn other_graph_errors_keep_type_and_code() {
        let body = r#"{"error":{"message":"Invalid parameter","type":"OAuthException","code":100}}"#;
        let err = graph_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            err.to_string(),
            "Facebook Ads API error: Invalid parameter (OAuthException, code 100)"
        );
    }

    #[test]
    fn non_json_error_body_is_unexpected_status() {
        assert!(matches!(
            graph_error(StatusCode::NOT_FOUND, "<html/>"),
            AdsError::UnexpectedStatus { status: 404, .. }
        ));
    }
}
