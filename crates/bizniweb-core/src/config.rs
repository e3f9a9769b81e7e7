use std::path::PathBuf;

use crate::app_config::{AppConfig, FacebookConfig, GoogleAdsConfig};
use crate::ConfigError;

const DEFAULT_API_URL: &str = "https://vevo.flox.sk/api/graphql";

/// The order API rejects page sizes above this.
pub const MAX_PAGE_SIZE: u32 = 30;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup. Blank values are treated the same as unset ones.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_days = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let days = or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if days < 0 {
            return Err(invalid(var, "must not be negative".to_string()));
        }
        Ok(days)
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                invalid(var, format!("expected true/false, got \"{raw}\""))
            }),
        }
    };

    // Only `export` talks to the order API; it checks for the token itself.
    let api_token = optional("BIZNISWEB_API_TOKEN");
    let api_url = or_default("BIZNISWEB_API_URL", DEFAULT_API_URL);

    let default_level = if optional("DEBUG").is_some() {
        "debug"
    } else {
        "info"
    };
    let log_level = or_default("BIZNISWEB_LOG_LEVEL", default_level);

    let data_dir = PathBuf::from(or_default("BIZNISWEB_DATA_DIR", "./data"));
    let cache_dir = optional("BIZNISWEB_CACHE_DIR")
        .map_or_else(|| data_dir.join("cache"), PathBuf::from);
    let costs_path = PathBuf::from(or_default("BIZNISWEB_COSTS_PATH", "./config/costs.yaml"));
    let user_agent = or_default("BIZNISWEB_USER_AGENT", "bizniweb-reports/0.1");

    let request_timeout_secs = parse_u64("BIZNISWEB_REQUEST_TIMEOUT_SECS", "30")?;
    let page_size = parse_u32("BIZNISWEB_PAGE_SIZE", "30")?;
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(invalid(
            "BIZNISWEB_PAGE_SIZE",
            format!("must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    let max_retries = parse_u32("BIZNISWEB_MAX_RETRIES", "3")?;
    let retry_backoff_secs = parse_u64("BIZNISWEB_RETRY_BACKOFF_SECS", "5")?;
    let inter_request_delay_ms = parse_u64("BIZNISWEB_INTER_REQUEST_DELAY_MS", "0")?;
    let order_cache_fresh_days = parse_days("BIZNISWEB_ORDER_CACHE_FRESH_DAYS", "3")?;
    let server_date_filter = parse_bool("BIZNISWEB_SERVER_DATE_FILTER", true)?;

    let ads_cache_fresh_days = parse_days("ADS_CACHE_FRESH_DAYS", "3")?;
    let ads_cache_max_age_days = parse_days("ADS_CACHE_MAX_AGE_DAYS", "30")?;

    let facebook = match (
        optional("FACEBOOK_ACCESS_TOKEN"),
        optional("FACEBOOK_AD_ACCOUNT_ID"),
    ) {
        (Some(access_token), Some(account)) => Some(FacebookConfig {
            access_token,
            ad_account_id: normalize_ad_account_id(&account),
            api_version: or_default("FACEBOOK_API_VERSION", "v21.0"),
        }),
        _ => None,
    };

    let google_ads = match (
        optional("GOOGLE_ADS_DEVELOPER_TOKEN"),
        optional("GOOGLE_ADS_CLIENT_ID"),
        optional("GOOGLE_ADS_CLIENT_SECRET"),
        optional("GOOGLE_ADS_REFRESH_TOKEN"),
        optional("GOOGLE_ADS_CUSTOMER_ID"),
    ) {
        (
            Some(developer_token),
            Some(client_id),
            Some(client_secret),
            Some(refresh_token),
            Some(customer_id),
        ) => Some(GoogleAdsConfig {
            developer_token,
            client_id,
            client_secret,
            refresh_token,
            customer_id: strip_customer_id(&customer_id),
            login_customer_id: optional("GOOGLE_ADS_LOGIN_CUSTOMER_ID")
                .map(|id| strip_customer_id(&id)),
            api_version: or_default("GOOGLE_ADS_API_VERSION", "v17"),
        }),
        _ => None,
    };

    Ok(AppConfig {
        api_url,
        api_token,
        log_level,
        data_dir,
        cache_dir,
        costs_path,
        user_agent,
        request_timeout_secs,
        page_size,
        max_retries,
        retry_backoff_secs,
        inter_request_delay_ms,
        order_cache_fresh_days,
        server_date_filter,
        ads_cache_fresh_days,
        ads_cache_max_age_days,
        facebook,
        google_ads,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Facebook ad account IDs are addressed as `act_<id>` in the Graph API.
fn normalize_ad_account_id(raw: &str) -> String {
    if raw.starts_with("act_") {
        raw.to_string()
    } else {
        format!("act_{raw}")
    }
}

/// Google Ads customer IDs are displayed as `123-456-7890` but sent as digits.
fn strip_customer_id(raw: &str) -> String {
    raw.chars().filter(|c| *c != '-').collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
