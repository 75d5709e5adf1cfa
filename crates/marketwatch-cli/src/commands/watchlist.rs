use marketwatch_core::{DashboardConfig, Symbol};

use crate::cli::{OutputFormat, WatchlistArgs, WatchlistCommand};
use crate::error::CliError;
use crate::output;

pub fn run(
    args: &WatchlistArgs,
    config: &DashboardConfig,
    format: OutputFormat,
) -> Result<(), CliError> {
    let store = super::store(config);
    let mut watchlist = store.load();

    match &args.command {
        WatchlistCommand::List => {}
        WatchlistCommand::Add(symbols) => {
            for symbol in parse_all(&symbols.symbols)? {
                watchlist.add(symbol);
            }
            store.save(&watchlist)?;
        }
        WatchlistCommand::Remove(symbols) => {
            for symbol in parse_all(&symbols.symbols)? {
                watchlist.remove(&symbol);
            }
            store.save(&watchlist)?;
        }
    }

    output::render_watchlist(&watchlist, format)
}

fn parse_all(raw: &[String]) -> Result<Vec<Symbol>, CliError> {
    raw.iter()
        .map(|value| Symbol::parse(value).map_err(CliError::from))
        .collect()
}
