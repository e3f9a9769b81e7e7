//! `ads` commands and the ad-spend fetch used by `export`.

use bizniweb_ads::{
    total_spend, AdPlatform, AdsError, AdsHttpSettings, DailySpend, FacebookAdsClient,
    GoogleAdsClient, SpendCache,
};
use bizniweb_core::{AppConfig, DateRange};
use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::export::resolve_range;

/// Sub-commands available under `ads`.
#[derive(Debug, Subcommand)]
pub enum AdsCommands {
    /// Check credentials for every configured ad platform
    Test,
    /// Print daily ad spend per platform
    Spend {
        /// First day (YYYY-MM-DD); defaults to 30 days before --to-date
        #[arg(long)]
        from_date: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to_date: Option<NaiveDate>,
        /// Ignore cached spend
        #[arg(long)]
        no_cache: bool,
        /// Also print spend per campaign
        #[arg(long)]
        campaigns: bool,
    },
}

fn facebook_client(config: &AppConfig) -> Option<Result<FacebookAdsClient, AdsError>> {
    let fb = config.facebook.clone()?;
    Some(FacebookAdsClient::new(
        fb,
        AdsHttpSettings::from_app_config(config),
    ))
}

fn google_client(config: &AppConfig) -> Option<Result<GoogleAdsClient, AdsError>> {
    let google = config.google_ads.clone()?;
    Some(GoogleAdsClient::new(
        google,
        AdsHttpSettings::from_app_config(config),
    ))
}

fn spend_cache(config: &AppConfig, platform: AdPlatform) -> SpendCache {
    let dir = match platform {
        AdPlatform::Facebook => config.facebook_cache_dir(),
        AdPlatform::Google => config.google_ads_cache_dir(),
    };
    SpendCache::new(
        dir,
        platform,
        config.ads_cache_fresh_days,
        config.ads_cache_max_age_days,
    )
}

async fn facebook_spend(
    config: &AppConfig,
    range: DateRange,
    today: NaiveDate,
    use_cache: bool,
) -> Option<Result<DailySpend, AdsError>> {
    let client = match facebook_client(config)? {
        Ok(client) => client,
        Err(e) => return Some(Err(e)),
    };
    let cache = spend_cache(config, AdPlatform::Facebook);
    Some(
        cache
            .get_or_fetch(range, today, use_cache, || client.daily_spend(range))
            .await,
    )
}

async fn google_spend(
    config: &AppConfig,
    range: DateRange,
    today: NaiveDate,
    use_cache: bool,
) -> Option<Result<DailySpend, AdsError>> {
    let client = match google_client(config)? {
        Ok(client) => client,
        Err(e) => return Some(Err(e)),
    };
    let cache = spend_cache(config, AdPlatform::Google);
    Some(
        cache
            .get_or_fetch(range, today, use_cache, || client.daily_spend(range))
            .await,
    )
}

/// Unconfigured or failing platforms contribute no spend.
pub(crate) fn spend_or_zero(
    platform: AdPlatform,
    result: Option<Result<DailySpend, AdsError>>,
) -> DailySpend {
    match result {
        None => {
            tracing::info!(%platform, "not configured; ad spend counts as zero");
            DailySpend::new()
        }
        Some(Ok(spend)) => {
            tracing::info!(%platform, total = %total_spend(&spend), "ad spend loaded");
            spend
        }
        Some(Err(e)) => {
            tracing::warn!(%platform, error = %e, "failed to fetch ad spend; counting it as zero");
            DailySpend::new()
        }
    }
}

/// Fetches Facebook and Google daily spend concurrently.
pub(crate) async fn fetch_ad_spend(
    config: &AppConfig,
    range: DateRange,
    today: NaiveDate,
    use_cache: bool,
) -> (DailySpend, DailySpend) {
    let (facebook, google) = tokio::join!(
        facebook_spend(config, range, today, use_cache),
        google_spend(config, range, today, use_cache),
    );
    (
        spend_or_zero(AdPlatform::Facebook, facebook),
        spend_or_zero(AdPlatform::Google, google),
    )
}

/// Run the connection test for every configured platform.
///
/// # Errors
///
/// Returns an error if no platform is configured or any configured platform
/// fails its test.
pub(crate) async fn run_ads_test(config: &AppConfig) -> anyhow::Result<()> {
    let mut tested = 0usize;
    let mut failed = 0usize;

    if let Some(client) = facebook_client(config) {
        tested += 1;
        let result = match client {
            Ok(client) => client.account_info().await,
            Err(e) => Err(e),
        };
        failed += usize::from(!report_account(AdPlatform::Facebook, result));
    } else {
        println!("{}: not configured", AdPlatform::Facebook);
    }

    if let Some(client) = google_client(config) {
        tested += 1;
        let result = match client {
            Ok(client) => client.account_info().await,
            Err(e) => Err(e),
        };
        failed += usize::from(!report_account(AdPlatform::Google, result));
    } else {
        println!("{}: not configured", AdPlatform::Google);
    }

    if tested == 0 {
        anyhow::bail!("no ad platform is configured; set FACEBOOK_* or GOOGLE_ADS_* variables");
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {tested} ad platform connection tests failed");
    }
    Ok(())
}

fn report_account(
    platform: AdPlatform,
    result: Result<bizniweb_ads::AccountInfo, AdsError>,
) -> bool {
    match result {
        Ok(info) => {
            println!(
                "{platform}: OK  {} ({}) currency={} status={}",
                info.name,
                info.id,
                info.currency.as_deref().unwrap_or("\u{2013}"),
                info.status.as_deref().unwrap_or("\u{2013}"),
            );
            true
        }
        Err(e) => {
            println!("{platform}: FAILED  {e}");
            false
        }
    }
}

/// Print daily spend per platform for a date range.
///
/// # Errors
///
/// Returns an error for an invalid date range or when every configured
/// platform fails.
pub(crate) async fn run_ads_spend(
    config: &AppConfig,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    no_cache: bool,
    campaigns: bool,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let range = resolve_range(from, to, today)?;
    let use_cache = !no_cache;

    let (facebook, google) = tokio::join!(
        facebook_spend(config, range, today, use_cache),
        google_spend(config, range, today, use_cache),
    );

    let mut errors = Vec::new();
    for (platform, result) in [(AdPlatform::Facebook, facebook), (AdPlatform::Google, google)] {
        match result {
            None => println!("{platform}: not configured\n"),
            Some(Err(e)) => {
                println!("{platform}: FAILED  {e}\n");
                errors.push(platform);
            }
            Some(Ok(spend)) => print_spend(platform, range, &spend),
        }
    }

    if campaigns {
        print_campaigns(config, range).await;
    }

    if !errors.is_empty() && errors.len() == configured_count(config) {
        anyhow::bail!("all configured ad platforms failed");
    }
    Ok(())
}

fn configured_count(config: &AppConfig) -> usize {
    usize::from(config.facebook.is_some()) + usize::from(config.google_ads.is_some())
}

fn print_spend(platform: AdPlatform, range: DateRange, spend: &DailySpend) {
    println!("{platform} ({range})");
    println!("{:<12}{:>12}", "DATE", "SPEND");
    for (date, amount) in spend {
        println!("{:<12}{:>12}", date.to_string(), amount.round_dp(2).to_string());
    }
    println!("{:<12}{:>12}\n", "TOTAL", total_spend(spend).round_dp(2).to_string());
}

async fn print_campaigns(config: &AppConfig, range: DateRange) {
    let facebook = match facebook_client(config) {
        Some(Ok(client)) => Some(client.campaign_spend(range).await),
        Some(Err(e)) => Some(Err(e)),
        None => None,
    };
    let google = match google_client(config) {
        Some(Ok(client)) => Some(client.campaign_spend(range).await),
        Some(Err(e)) => Some(Err(e)),
        None => None,
    };

    for (platform, result) in [(AdPlatform::Facebook, facebook), (AdPlatform::Google, google)] {
        match result {
            None => {}
            Some(Err(e)) => println!("{platform} campaigns: FAILED  {e}\n"),
            Some(Ok(mut rows)) => {
                rows.sort_by(|a, b| b.spend.cmp(&a.spend));
                println!("{platform} campaigns");
                println!("{:<40}{:>12}{:>12}{:>10}", "CAMPAIGN", "SPEND", "IMPRESSIONS", "CLICKS");
                for c in &rows {
                    let name = if c.campaign_name.chars().count() > 38 {
                        format!("{}...", c.campaign_name.chars().take(35).collect::<String>())
                    } else {
                        c.campaign_name.clone()
                    };
                    println!(
                        "{:<40}{:>12}{:>12}{:>10}",
                        name,
                        c.spend.round_dp(2).to_string(),
                        c.impressions,
                        c.clicks
                    );
                }
                println!();
            }
        }
    }
}
