use std::sync::Arc;

use marketwatch_core::{DashboardConfig, QuoteProvider};

use crate::cli::{OutputFormat, ViewArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &ViewArgs,
    config: &DashboardConfig,
    provider: Arc<dyn QuoteProvider>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let range = args.range()?;
    let watchlist = super::store(config).load();
    let symbol = match args.symbol()? {
        Some(symbol) => symbol,
        None => watchlist
            .first()
            .cloned()
            .unwrap_or_else(|| config.default_symbol.clone()),
    };

    let view = super::fetch_or_degrade(config, provider, &symbol, range).await;
    output::render_view(&view, &watchlist, &symbol, format)
}
