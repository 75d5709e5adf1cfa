//! CLI argument definitions for marketwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watchlist` | List, add or remove watchlist symbols |
//! | `view` | Fetch and render the dashboard for one symbol |
//! | `export` | Fetch one symbol and write a CSV snapshot |
//! | `dashboard` | Interactive session driven from stdin |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--watchlist` | `watchlist.csv` | Watchlist file |
//! | `--export-dir` | `.` | Directory for CSV exports |
//! | `--format` | `table` | Output format (table, json) |
//! | `--mock` | `false` | Use the offline synthetic provider |
//! | `--timeout-ms` | `10000` | Fetch timeout budget in ms |
//! | `--cache-ttl-secs` | `0` | View cache lifetime, 0 disables |
//! | `--no-autosave` | `false` | Only save the watchlist on `save` |
//!
//! Flags override the `MARKETWATCH_*` environment variables.
//!
//! # Examples
//!
//! ```bash
//! marketwatch watchlist add MSFT NVDA
//! marketwatch view MSFT --range 1w
//! marketwatch export --export-dir ./snapshots
//! marketwatch --mock dashboard
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use marketwatch_core::{DashboardConfig, Range, Symbol};

use crate::error::CliError;

/// Personal market-watch dashboard.
///
/// Keeps a watchlist of ticker symbols, shows price history and key metrics
/// for the selected one, and exports snapshots to CSV.
#[derive(Debug, Parser)]
#[command(name = "marketwatch", author, version, about = "Personal market-watch dashboard")]
pub struct Cli {
    /// Watchlist CSV file.
    #[arg(long, global = true)]
    pub watchlist: Option<PathBuf>,

    /// Directory receiving CSV exports.
    #[arg(long, global = true)]
    pub export_dir: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Use deterministic synthetic data instead of Yahoo Finance.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Fetch timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Keep fetched views for this many seconds (0 disables caching).
    #[arg(long, global = true)]
    pub cache_ttl_secs: Option<u64>,

    /// Do not save the watchlist after every add or remove.
    #[arg(long, global = true, default_value_t = false)]
    pub no_autosave: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Environment configuration with command-line flags layered on top.
    pub fn config(&self) -> Result<DashboardConfig, CliError> {
        let config = DashboardConfig::from_env()?;
        Ok(self.overlay(config))
    }

    fn overlay(&self, mut config: DashboardConfig) -> DashboardConfig {
        if let Some(path) = &self.watchlist {
            config.watchlist_path = path.clone();
        }
        if let Some(dir) = &self.export_dir {
            config.export_dir = dir.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.request_timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(ttl) = self.cache_ttl_secs {
            config.view_ttl = Duration::from_secs(ttl);
        }
        if self.no_autosave {
            config.autosave = false;
        }
        config
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text dashboard for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the persisted watchlist.
    Watchlist(WatchlistArgs),

    /// Fetch and render the dashboard for one symbol.
    ///
    /// # Examples
    ///
    ///   marketwatch view
    ///   marketwatch view MSFT --range 1m
    View(ViewArgs),

    /// Fetch one symbol and write a timestamped CSV snapshot.
    ///
    /// Each run writes a new file; existing exports are never overwritten.
    Export(ViewArgs),

    /// Interactive dashboard reading commands from stdin.
    ///
    /// Type `help` inside the session for the command list.
    Dashboard,
}

#[derive(Debug, Args)]
pub struct WatchlistArgs {
    #[command(subcommand)]
    pub command: WatchlistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchlistCommand {
    /// Show the watchlist.
    List,
    /// Add one or more symbols.
    Add(SymbolsArgs),
    /// Remove one or more symbols.
    Remove(SymbolsArgs),
}

#[derive(Debug, Args)]
pub struct SymbolsArgs {
    /// Ticker symbols (e.g., AAPL, MSFT, ^GSPC).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

/// Arguments shared by `view` and `export`.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Symbol to show. Defaults to the first watchlist entry.
    pub symbol: Option<String>,

    /// Display range.
    ///
    /// - 1d: intraday, 5 minute samples (default)
    /// - 1w: five days, 15 minute samples
    /// - 1m: one month, daily samples
    #[arg(long, default_value = "1d")]
    pub range: String,
}

impl ViewArgs {
    pub fn symbol(&self) -> Result<Option<Symbol>, CliError> {
        self.symbol
            .as_deref()
            .map(Symbol::parse)
            .transpose()
            .map_err(CliError::from)
    }

    pub fn range(&self) -> Result<Range, CliError> {
        self.range.parse::<Range>().map_err(CliError::from)
    }
}
