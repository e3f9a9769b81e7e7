use bizniweb_ads::{AdPlatform, SpendCache};
use bizniweb_core::AppConfig;
use bizniweb_orders::OrderCache;
use clap::Subcommand;

/// Sub-commands available under `cache`.
#[derive(Debug, Subcommand)]
pub enum CacheCommands {
    /// Delete cached files (orders and ad spend unless narrowed by a flag)
    Clear {
        /// Only clear the per-day order cache
        #[arg(long)]
        orders: bool,
        /// Only clear the ad-spend caches
        #[arg(long)]
        ads: bool,
    },
}

/// # Errors
///
/// Returns an error if a cache directory cannot be listed or a file cannot
/// be removed.
pub(crate) fn run_cache_clear(config: &AppConfig, orders: bool, ads: bool) -> anyhow::Result<()> {
    let (orders, ads) = if orders || ads { (orders, ads) } else { (true, true) };

    if orders {
        let cache = OrderCache::new(config.orders_cache_dir(), config.order_cache_fresh_days);
        let removed = cache.clear()?;
        println!("removed {removed} order cache files from {}", cache.dir().display());
    }
    if ads {
        for (platform, dir) in [
            (AdPlatform::Facebook, config.facebook_cache_dir()),
            (AdPlatform::Google, config.google_ads_cache_dir()),
        ] {
            let cache = SpendCache::new(
                dir,
                platform,
                config.ads_cache_fresh_days,
                config.ads_cache_max_age_days,
            );
            let removed = cache.clear()?;
            println!("removed {removed} {platform} cache files from {}", cache.dir().display());
        }
    }
    Ok(())
}
