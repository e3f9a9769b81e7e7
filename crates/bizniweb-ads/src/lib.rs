//! Daily marketing spend from Facebook Ads and Google Ads.
//!
//! Both platforms are queried over plain REST with `reqwest`. Past date
//! ranges are cached per platform as JSON so repeated report runs do not
//! hit the APIs again.

pub mod cache;
mod de;
pub mod error;
pub mod facebook;
pub mod google;
mod http;
mod retry;
pub mod types;

pub use cache::SpendCache;
pub use error::AdsError;
pub use facebook::FacebookAdsClient;
pub use google::GoogleAdsClient;
pub use http::AdsHttpSettings;
pub use types::{total_spend, AccountInfo, AdPlatform, CampaignSpend, DailyInsight, DailySpend};
