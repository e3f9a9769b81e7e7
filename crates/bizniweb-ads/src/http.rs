//! HTTP plumbing shared by both ad clients.

use std::time::Duration;

use bizniweb_core::AppConfig;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::AdsError;
use crate::types::AdPlatform;

/// Timeout, user agent and retry policy for the ad clients.
#[derive(Debug, Clone)]
pub struct AdsHttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub backoff_secs: u64,
}

impl AdsHttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            backoff_secs: config.retry_backoff_secs,
        }
    }
}

pub(crate) fn build_client(settings: &AdsHttpSettings) -> Result<Client, AdsError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(settings.user_agent.as_str())
        .build()?)
}

/// Parses `raw` with exactly one trailing slash so `Url::join` appends
/// rather than replacing the last path segment.
pub(crate) fn parse_base_url(platform: AdPlatform, raw: &str) -> Result<Url, AdsError> {
    let normalised = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| AdsError::InvalidBaseUrl {
        platform,
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

/// Decodes a 2xx body as `T`. 429 and 5xx map to the retriable variants;
/// any other status is handed to `api_error` with the raw body.
pub(crate) async fn decode_response<T, F>(
    platform: AdPlatform,
    response: Response,
    context: &str,
    api_error: F,
) -> Result<T, AdsError>
where
    T: DeserializeOwned,
    F: FnOnce(StatusCode, &str) -> AdsError,
{
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(60);
        return Err(AdsError::RateLimited {
            platform,
            retry_after_secs,
        });
    }

    if status.is_server_error() {
        return Err(AdsError::UnexpectedStatus {
            platform,
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| AdsError::Deserialize {
        context: context.to_owned(),
        source: e,
    })
}
