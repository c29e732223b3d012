pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::providers::bb_provider::BbProvider;
use crate::providers::client::{CachedValue, CachingHttpClient};
use crate::store::MemoryCache;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Prices,
    Watch { every: Duration },
}

/// Builds the BB provider over a fresh process-wide cache.
pub fn build_provider(config: &AppConfig) -> Result<BbProvider> {
    let cache = Arc::new(MemoryCache::<String, CachedValue>::new());
    let client = CachingHttpClient::new(cache, config.request_timeout())
        .context("Failed to build HTTP client")?;
    Ok(BbProvider::new(config.bb_base_url(), client))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinbani starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = build_provider(&config)?;

    match command {
        AppCommand::Prices => cli::prices::run(&provider).await,
        AppCommand::Watch { every } => cli::prices::watch(&provider, every).await,
    }
}
