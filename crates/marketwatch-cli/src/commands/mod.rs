mod dashboard;
mod export;
mod view;
mod watchlist;

use std::sync::Arc;

use marketwatch_core::{
    DashboardConfig, FetchOrchestrator, MarketView, QuoteProvider, Range, Symbol,
    SyntheticProvider, ViewCache, WatchlistStore, YahooProvider,
};
use tracing::warn;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.config()?;

    match &cli.command {
        Command::Watchlist(args) => watchlist::run(args, &config, cli.format),
        Command::View(args) => view::run(args, &config, provider(cli, &config), cli.format).await,
        Command::Export(args) => {
            export::run(args, &config, provider(cli, &config), cli.format).await
        }
        Command::Dashboard => dashboard::run(&config, provider(cli, &config), cli.format).await,
    }
}

fn provider(cli: &Cli, config: &DashboardConfig) -> Arc<dyn QuoteProvider> {
    if cli.mock {
        Arc::new(SyntheticProvider::default())
    } else {
        Arc::new(YahooProvider::default().with_timeout(config.request_timeout))
    }
}

fn store(config: &DashboardConfig) -> WatchlistStore {
    WatchlistStore::new(&config.watchlist_path).with_default_symbol(config.default_symbol.clone())
}

fn orchestrator(config: &DashboardConfig, provider: Arc<dyn QuoteProvider>) -> FetchOrchestrator {
    FetchOrchestrator::new(provider)
        .with_timeout(config.request_timeout)
        .with_cache(ViewCache::new(config.view_ttl))
}

/// One-shot fetch that degrades instead of failing.
async fn fetch_or_degrade(
    config: &DashboardConfig,
    provider: Arc<dyn QuoteProvider>,
    symbol: &Symbol,
    range: Range,
) -> MarketView {
    match orchestrator(config, provider).fetch_view(symbol, range).await {
        Ok(view) => view,
        Err(error) => {
            warn!(error = %error, "showing view without market data");
            eprintln!("warning: {error}");
            FetchOrchestrator::degraded_view(symbol.clone(), range)
        }
    }
}
