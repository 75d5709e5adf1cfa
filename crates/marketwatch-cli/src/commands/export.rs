//! Fetch one view and write it as a CSV snapshot.

use std::sync::Arc;

use marketwatch_core::{DashboardConfig, Exporter, QuoteProvider};

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
    let symbol = match args.symbol()? {
        Some(symbol) => symbol,
        None => super::store(config)
            .load()
            .first()
            .cloned()
            .unwrap_or_else(|| config.default_symbol.clone()),
    };

    // Fetch failures abort the export; no placeholder row is written.
    let view = super::orchestrator(config, provider)
        .fetch_view(&symbol, range)
        .await?;
    let path = Exporter::new(&config.export_dir).export(&view)?;

    output::render_export(&path, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketwatch_core::{
        HistoryRequest, PriceHistory, ProviderFuture, QuoteSnapshot, SourceError, Symbol,
        SyntheticProvider,
    };

    struct OfflineProvider;

    impl QuoteProvider for OfflineProvider {
        fn name(&self) -> &'static str {
            "offline"
        }

        fn history<'a>(&'a self, _req: HistoryRequest) -> ProviderFuture<'a, PriceHistory> {
            Box::pin(async { Err::<PriceHistory, _>(SourceError::unavailable("offline")) })
        }

        fn quote<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a, QuoteSnapshot> {
            Box::pin(async { Err::<QuoteSnapshot, _>(SourceError::unavailable("offline")) })
        }
    }

    fn args() -> ViewArgs {
        ViewArgs {
            symbol: Some(String::from("MSFT")),
            range: String::from("1m"),
        }
    }

    #[tokio::test]
    async fn export_writes_file_into_export_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            watchlist_path: dir.path().join("watchlist.csv"),
            export_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };

        run(&args(), &config, Arc::new(SyntheticProvider::default()), OutputFormat::Json)
            .await
            .unwrap();

        let exports: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("export_"))
            .collect();
        assert_eq!(exports.len(), 1);
        let body = std::fs::read_to_string(exports[0].path()).unwrap();
        assert!(body.lines().nth(1).unwrap().starts_with("MSFT,"));
    }

    #[tokio::test]
    async fn export_to_missing_directory_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            watchlist_path: dir.path().join("watchlist.csv"),
            export_dir: dir.path().join("missing"),
            ..DashboardConfig::default()
        };

        let error = run(&args(), &config, Arc::new(SyntheticProvider::default()), OutputFormat::Json)
            .await
            .unwrap_err();
        assert_eq!(error.exit_code(), 7);
    }

    #[tokio::test]
    async fn failed_fetch_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            watchlist_path: dir.path().join("watchlist.csv"),
            export_dir: dir.path().to_path_buf(),
            ..DashboardConfig::default()
        };

        let error = run(&args(), &config, Arc::new(OfflineProvider), OutputFormat::Json)
            .await
            .unwrap_err();

        assert!(matches!(error, CliError::Fetch(_)));
        assert_eq!(error.exit_code(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
