//! # Marketwatch Core
//!
//! Core state, contracts and domain types for the marketwatch dashboard.
//!
//! ## Overview
//!
//! This crate provides everything behind the dashboard's user interface:
//!
//! - **Domain models** for symbols, ranges, price history and quote snapshots
//! - **Quote provider trait** with a Yahoo Finance adapter and a synthetic one
//! - **Fetch orchestrator** that assembles a [`MarketView`] with a timeout
//! - **Watchlist store** with fail-soft loading and atomic saves
//! - **Session reducer** that drives watchlist edits, selection and export
//! - **CSV export** of the currently displayed view
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo, synthetic) |
//! | [`cache`] | Optional TTL cache of market views |
//! | [`config`] | Dashboard configuration and environment overlay |
//! | [`data_source`] | Quote provider trait and request/error types |
//! | [`domain`] | Domain models (Symbol, Range, PriceHistory, QuoteSnapshot) |
//! | [`error`] | Validation and configuration errors |
//! | [`export`] | CSV snapshot export |
//! | [`http_client`] | HTTP client abstraction |
//! | [`orchestrator`] | Fetch orchestration |
//! | [`session`] | Session state, actions and effects |
//! | [`watchlist`] | Watchlist model and CSV persistence |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketwatch_core::{Action, DashboardConfig, Range, Session, YahooProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DashboardConfig::from_env()?;
//!     let mut session = Session::from_config(&config, Arc::new(YahooProvider::default())).await;
//!
//!     session.dispatch(Action::SelectRange(Range::OneWeek)).await?;
//!     if let Some(view) = session.state().view() {
//!         println!("{} {:.2}", view.symbol, view.quote.price());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │ Action
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Session        │────▶│ Watchlist Store  │
//! │  (reducer)      │────▶│ Exporter         │
//! └────────┬────────┘     └──────────────────┘
//!          │ Fetch
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Orchestrator    │────▶│ Quote Provider   │
//! │ (timeout/cache) │     │ (Yahoo/synthetic)│
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never reach the user as errors. They degrade to a view
//! with no chart data and `N/A` metrics:
//!
//! ```rust
//! use marketwatch_core::{Chart, FetchOrchestrator, Range, Symbol};
//!
//! let symbol = Symbol::parse("AAPL").unwrap();
//! let view = FetchOrchestrator::degraded_view(symbol, Range::OneDay);
//! assert!(matches!(view.chart(), Chart::NoData));
//! assert_eq!(view.quote.bid().to_string(), "N/A");
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod export;
pub mod http_client;
pub mod orchestrator;
pub mod session;
pub mod watchlist;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{SyntheticProvider, YahooProvider, YahooSession};

// Caching
pub use cache::ViewCache;

// Configuration
pub use config::DashboardConfig;

// Provider trait and types
pub use data_source::{HistoryRequest, ProviderFuture, QuoteProvider, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    Chart, Granularity, MarketView, Metric, PriceHistory, PricePoint, QuoteSnapshot, Range,
    Symbol, UtcDateTime, NOT_AVAILABLE,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Export
pub use export::{ExportError, ExportRecord, Exporter};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient};

// Orchestration
pub use orchestrator::{FetchError, FetchOrchestrator};

// Session
pub use session::{Action, Effect, Notice, Session, SessionState, Transition};

// Watchlist
pub use watchlist::{PersistenceError, Watchlist, WatchlistStore};
