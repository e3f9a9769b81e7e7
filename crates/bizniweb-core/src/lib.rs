pub mod app_config;
pub mod config;
pub mod costs;
pub mod dates;
pub mod money;

use thiserror::Error;

pub use app_config::{AppConfig, FacebookConfig, GoogleAdsConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use costs::{load_costs, CostTable, ProductCost};
pub use dates::DateRange;
pub use money::{percent, ratio, round_money};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read cost table {path}: {source}")]
    CostsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse cost table: {0}")]
    CostsFileParse(#[source] serde_yaml::Error),

    #[error("cost table validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },
}
