mod ads;
mod cache;
mod export;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::ads::AdsCommands;
use crate::cache::CacheCommands;
use crate::export::ExportArgs;

#[derive(Debug, Parser)]
#[command(name = "bizniweb")]
#[command(about = "BizniWeb order export and profitability reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Export orders for a date range and write CSV and HTML reports
    Export(ExportArgs),
    /// Facebook and Google Ads utilities
    Ads {
        #[command(subcommand)]
        command: AdsCommands,
    },
    /// Manage the local order and ad-spend caches
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = bizniweb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Export(args) => export::run_export(&config, args).await,
        Commands::Ads { command } => match command {
            AdsCommands::Test => ads::run_ads_test(&config).await,
            AdsCommands::Spend {
                from_date,
                to_date,
                no_cache,
                campaigns,
            } => ads::run_ads_spend(&config, from_date, to_date, no_cache, campaigns).await,
        },
        Commands::Cache { command } => match command {
            CacheCommands::Clear { orders, ads } => cache::run_cache_clear(&config, orders, ads),
        },
    }
}
