use std::path::PathBuf;

/// Credentials for the Facebook Marketing (Graph) API.
#[derive(Clone)]
pub struct FacebookConfig {
    pub access_token: String,
    /// Always carries the `act_` prefix.
    pub ad_account_id: String,
    pub api_version: String,
}

impl std::fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("access_token", &"[redacted]")
            .field("ad_account_id", &self.ad_account_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Credentials for the Google Ads REST API.
#[derive(Clone)]
pub struct GoogleAdsConfig {
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Digits only, hyphens stripped.
    pub customer_id: String,
    pub login_customer_id: Option<String>,
    pub api_version: String,
}

impl std::fmt::Debug for GoogleAdsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleAdsConfig")
            .field("developer_token", &"[redacted]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("customer_id", &self.customer_id)
            .field("login_customer_id", &self.login_customer_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub log_level: String,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub costs_path: PathBuf,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    pub max_retries: u32,
    pub retry_backoff_secs: u64,
    pub inter_request_delay_ms: u64,
    pub order_cache_fresh_days: i64,
    pub server_date_filter: bool,
    pub ads_cache_fresh_days: i64,
    pub ads_cache_max_age_days: i64,
    pub facebook: Option<FacebookConfig>,
    pub google_ads: Option<GoogleAdsConfig>,
}

impl AppConfig {
    #[must_use]
    pub fn orders_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("orders")
    }

    #[must_use]
    pub fn facebook_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("facebook_ads")
    }

    #[must_use]
    pub fn google_ads_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("google_ads")
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"[redacted]")
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("cache_dir", &self.cache_dir)
            .field("costs_path", &self.costs_path)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("page_size", &self.page_size)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_secs", &self.retry_backoff_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("order_cache_fresh_days", &self.order_cache_fresh_days)
            .field("server_date_filter", &self.server_date_filter)
            .field("ads_cache_fresh_days", &self.ads_cache_fresh_days)
            .field("ads_cache_max_age_days", &self.ads_cache_max_age_days)
            .field("facebook", &self.facebook)
            .field("google_ads", &self.google_ads)
            .finish()
    }
}
