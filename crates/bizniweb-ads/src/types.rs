//! Platform-neutral ad spend types plus the raw response shapes of both
//! APIs.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::de;

/// Spend per calendar day, in the ad account's currency.
pub type DailySpend = BTreeMap<NaiveDate, Decimal>;

#[must_use]
pub fn total_spend(spend: &DailySpend) -> Decimal {
    spend.values().copied().sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdPlatform {
    Facebook,
    Google,
}

impl AdPlatform {
    /// Prefix of this platform's spend cache files.
    #[must_use]
    pub fn cache_prefix(self) -> &'static str {
        match self {
            Self::Facebook => "facebook_ads",
            Self::Google => "google_ads",
        }
    }
}

impl std::fmt::Display for AdPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Facebook => "Facebook Ads",
            Self::Google => "Google Ads",
        })
    }
}

/// One day of account-level delivery metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyInsight {
    pub date: NaiveDate,
    pub spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    pub cpc: Option<Decimal>,
    pub cpm: Option<Decimal>,
    pub ctr: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSpend {
    pub campaign_id: String,
    pub campaign_name: String,
    pub status: Option<String>,
    pub spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    /// Facebook only.
    pub reach: Option<u64>,
    /// Google only.
    pub conversions: Option<Decimal>,
}

/// Result of a connection test.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub platform: AdPlatform,
    pub id: String,
    pub name: String,
    pub currency: Option<String>,
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Facebook Graph API
// ---------------------------------------------------------------------------

/// `{data: [...], paging: {next}}` list envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub paging: Option<GraphPaging>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphPaging {
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorEnvelope {
    pub error: GraphError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Insights row. Graph returns every metric as a string.
#[derive(Debug, Deserialize)]
pub(crate) struct FbInsightRow {
    pub date_start: NaiveDate,
    #[serde(default)]
    pub spend: Option<Decimal>,
    #[serde(default, deserialize_with = "de::count")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub reach: u64,
    #[serde(default)]
    pub cpc: Option<Decimal>,
    #[serde(default)]
    pub cpm: Option<Decimal>,
    #[serde(default)]
    pub ctr: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FbCampaign {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FbAccount {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub account_status: Option<i64>,
}

// ---------------------------------------------------------------------------
// Google Ads REST
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct OAuthToken {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
pub(crate) struct OAuthError {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<GoogleRow>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleRow {
    #[serde(default)]
    pub segments: Option<GoogleSegments>,
    #[serde(default)]
    pub metrics: GoogleMetrics,
    #[serde(default)]
    pub campaign: Option<GoogleCampaign>,
    #[serde(default)]
    pub customer: Option<GoogleCustomer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleSegments {
    pub date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleMetrics {
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub cost_micros: i64,
    #[serde(default, deserialize_with = "de::count")]
    pub impressions: u64,
    #[serde(default, deserialize_with = "de::count")]
    pub clicks: u64,
    #[serde(default)]
    pub conversions: Option<Decimal>,
}

impl GoogleMetrics {
    /// `costMicros` in currency units.
    pub fn cost(&self) -> Decimal {
        Decimal::new(self.cost_micros, 6)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleCampaign {
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GoogleCustomer {
    #[serde(default, deserialize_with = "de::int_or_zero")]
    pub id: i64,
    #[serde(default)]
    pub descriptive_name: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// `{error: {code, message, status}}` returned on failed Google API calls.
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorEnvelope {
    pub error: GoogleError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facebook_insight_row_parses_string_metrics() {
        let row: FbInsightRow = serde_json::from_value(serde_json::json!({
            "date_start": "2024-05-01",
            "date_stop": "2024-05-01",
            "spend": "23.45",
            "impressions": "1520",
            "clicks": "31",
            "cpc": "0.756452",
            "ctr": "2.039474"
        }))
        .unwrap();
        assert_eq!(row.spend, Some("23.45".parse().unwrap()));
        assert_eq!(row.impressions, 1520);
        assert_eq!(row.clicks, 31);
        assert!(row.cpm.is_none());
    }

    #[test]
    fn google_cost_micros_converts_exactly() {
        let metrics: GoogleMetrics =
            serde_json::from_value(serde_json::json!({"costMicros": "12345678"})).unwrap();
        assert_eq!(metrics.cost(), "12.345678".parse::<Decimal>().unwrap());
        assert_eq!(GoogleMetrics::default().cost(), Decimal::ZERO);
    }

    #[test]
    fn total_spend_sums_days() {
        let mut spend = DailySpend::new();
        spend.insert("2024-05-01".parse().unwrap(), "10.50".parse().unwrap());
        spend.insert("2024-05-02".parse().unwrap(), "4.25".parse().unwrap());
        assert_eq!(total_spend(&spend), "14.75".parse::<Decimal>().unwrap());
        assert_eq!(total_spend(&DailySpend::new()), Decimal::ZERO);
    }

    #[test]
    fn platform_display_and_prefix() {
        assert_eq!(AdPlatform::Facebook.to_string(), "Facebook Ads");
        assert_eq!(AdPlatform::Google.cache_prefix(), "google_ads");
    }
}
