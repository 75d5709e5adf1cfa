//! Dashboard session: explicit state, a pure reducer and an effect runner.
//!
//! [`SessionState::apply`] maps `(state, action)` to a new state plus the
//! side effects it needs. It performs no I/O, so every transition is testable
//! without a provider or a filesystem. [`Session`] owns the collaborators and
//! executes those effects.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::cache::ViewCache;
use crate::config::DashboardConfig;
use crate::data_source::QuoteProvider;
use crate::export::{ExportError, Exporter};
use crate::orchestrator::{FetchError, FetchOrchestrator};
use crate::watchlist::{Watchlist, WatchlistStore};
use crate::{MarketView, Range, Symbol};

/// User interaction delivered by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddSymbol(String),
    RemoveSymbol(String),
    SelectSymbol(String),
    SelectRange(Range),
    Export,
    ReloadWatchlist,
    SaveWatchlist,
    Refresh,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    SaveWatchlist,
    LoadWatchlist,
    Export,
    Fetch,
    /// Fetch bypassing any cached view.
    Refetch,
}

/// Feedback for the user about the last interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Added(Symbol),
    AlreadyTracked(Symbol),
    Removed(Symbol),
    NotTracked(Symbol),
    InvalidSymbol { input: String, reason: String },
    Saved { count: usize },
    SaveFailed(String),
    Reloaded { count: usize },
    Exported(PathBuf),
    FetchFailed(String),
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added(symbol) => write!(f, "added {symbol}"),
            Self::AlreadyTracked(symbol) => write!(f, "{symbol} is already on the watchlist"),
            Self::Removed(symbol) => write!(f, "removed {symbol}"),
            Self::NotTracked(symbol) => write!(f, "{symbol} is not on the watchlist"),
            Self::InvalidSymbol { input, reason } => {
                write!(f, "ignored '{input}': {reason}")
            }
            Self::Saved { count } => write!(f, "watchlist saved ({count} symbols)"),
            Self::SaveFailed(reason) => write!(f, "watchlist not saved: {reason}"),
            Self::Reloaded { count } => write!(f, "watchlist reloaded ({count} symbols)"),
            Self::Exported(path) => write!(f, "exported to {}", path.display()),
            Self::FetchFailed(reason) => write!(f, "no market data: {reason}"),
        }
    }
}

/// Result of applying one action.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

/// Everything the dashboard shows, held in memory for one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    watchlist: Watchlist,
    selected: Symbol,
    range: Range,
    view: Option<MarketView>,
    last_error: Option<FetchError>,
    autosave: bool,
    notices: Vec<Notice>,
}

impl SessionState {
    /// Fresh state: first watchlist entry selected (or `fallback` when the
    /// list is empty), one-day range, no view yet.
    pub fn new(watchlist: Watchlist, fallback: Symbol, autosave: bool) -> Self {
        let selected = watchlist.first().cloned().unwrap_or(fallback);
        Self {
            watchlist,
            selected,
            range: Range::default(),
            view: None,
            last_error: None,
            autosave,
            notices: Vec::new(),
        }
    }

    pub fn watchlist(&self) -> &Watchlist {
        &self.watchlist
    }

    pub fn selected(&self) -> &Symbol {
        &self.selected
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn view(&self) -> Option<&MarketView> {
        self.view.as_ref()
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Whether the displayed view is missing, failed, or belongs to another
    /// (symbol, range) pair than the current selection.
    pub fn needs_fetch(&self) -> bool {
        match &self.view {
            Some(view) => {
                view.key() != (&self.selected, self.range) || self.last_error.is_some()
            }
            None => true,
        }
    }

    /// Pure transition function.
    pub fn apply(mut self, action: Action) -> Transition {
        let mut effects = Vec::new();

        match action {
            Action::AddSymbol(raw) => {
                if let Some(symbol) = self.parse_input(&raw) {
                    if self.watchlist.add(symbol.clone()) {
                        self.notices.push(Notice::Added(symbol));
                        if self.autosave {
                            effects.push(Effect::SaveWatchlist);
                        }
                    } else {
                        self.notices.push(Notice::AlreadyTracked(symbol));
                    }
                }
            }
            Action::RemoveSymbol(raw) => {
                if let Some(symbol) = self.parse_input(&raw) {
                    if self.watchlist.remove(&symbol) {
                        self.notices.push(Notice::Removed(symbol));
                        if self.autosave {
                            effects.push(Effect::SaveWatchlist);
                        }
                    } else {
                        self.notices.push(Notice::NotTracked(symbol));
                    }
                }
            }
            Action::SelectSymbol(raw) => {
                if let Some(symbol) = self.parse_input(&raw) {
                    if !self.watchlist.contains(&symbol) {
                        self.notices.push(Notice::NotTracked(symbol));
                    } else {
                        self.selected = symbol;
                        self.invalidate_stale_view();
                        if self.needs_fetch() {
                            effects.push(Effect::Fetch);
                        }
                    }
                }
            }
            Action::SelectRange(range) => {
                self.range = range;
                self.invalidate_stale_view();
                if self.needs_fetch() {
                    effects.push(Effect::Fetch);
                }
            }
            Action::Export => effects.push(Effect::Export),
            Action::ReloadWatchlist => effects.push(Effect::LoadWatchlist),
            Action::SaveWatchlist => effects.push(Effect::SaveWatchlist),
            Action::Refresh => effects.push(Effect::Refetch),
        }

        Transition {
            state: self,
            effects,
        }
    }

    /// Install the outcome of a fetch for the current selection.
    ///
    /// A failure installs the no-data view so the chart area and metrics
    /// still render.
    pub fn install_view(&mut self, outcome: Result<MarketView, FetchError>) {
        match outcome {
            Ok(view) => {
                self.view = Some(view);
                self.last_error = None;
            }
            Err(error) => {
                self.notices.push(Notice::FetchFailed(error.to_string()));
                self.view = Some(FetchOrchestrator::degraded_view(
                    self.selected.clone(),
                    self.range,
                ));
                self.last_error = Some(error);
            }
        }
    }

    pub fn replace_watchlist(&mut self, watchlist: Watchlist) {
        self.notices.push(Notice::Reloaded {
            count: watchlist.len(),
        });
        self.watchlist = watchlist;
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn parse_input(&mut self, raw: &str) -> Option<Symbol> {
        match Symbol::parse(raw) {
            Ok(symbol) => Some(symbol),
            Err(error) => {
                self.notices.push(Notice::InvalidSymbol {
                    input: raw.to_owned(),
                    reason: error.to_string(),
                });
                None
            }
        }
    }

    fn invalidate_stale_view(&mut self) {
        let stale = self
            .view
            .as_ref()
            .is_some_and(|view| view.key() != (&self.selected, self.range));
        if stale {
            self.view = None;
            self.last_error = None;
        }
    }
}

/// Runtime driver: owns the state and the collaborators effects need.
pub struct Session {
    state: SessionState,
    store: WatchlistStore,
    orchestrator: FetchOrchestrator,
    exporter: Exporter,
}

impl Session {
    /// Load the watchlist, select its first symbol and fetch the initial view.
    pub async fn start(
        store: WatchlistStore,
        orchestrator: FetchOrchestrator,
        exporter: Exporter,
        autosave: bool,
    ) -> Self {
        let watchlist = store.load();
        let state = SessionState::new(watchlist, store.default_symbol().clone(), autosave);
        let mut session = Self {
            state,
            store,
            orchestrator,
            exporter,
        };
        session.fetch().await;
        session
    }

    /// Wire a session from configuration and a provider.
    pub async fn from_config(config: &DashboardConfig, provider: Arc<dyn QuoteProvider>) -> Self {
        let store = WatchlistStore::new(&config.watchlist_path)
            .with_default_symbol(config.default_symbol.clone());
        let orchestrator = FetchOrchestrator::new(provider)
            .with_timeout(config.request_timeout)
            .with_cache(ViewCache::new(config.view_ttl));
        let exporter = Exporter::new(&config.export_dir);

        Self::start(store, orchestrator, exporter, config.autosave).await
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// Apply one action and run its effects to completion.
    ///
    /// Only export failures are returned; every other failure is folded
    /// into the state as a notice or a degraded view.
    pub async fn dispatch(&mut self, action: Action) -> Result<&SessionState, ExportError> {
        debug!(action = ?action, "dispatching session action");
        let placeholder = SessionState::new(Watchlist::new(), self.state.selected.clone(), false);
        let Transition { state, effects } =
            std::mem::replace(&mut self.state, placeholder).apply(action);
        self.state = state;

        for effect in effects {
            self.run(effect).await?;
        }

        Ok(&self.state)
    }

    async fn run(&mut self, effect: Effect) -> Result<(), ExportError> {
        match effect {
            Effect::SaveWatchlist => match self.store.save(&self.state.watchlist) {
                Ok(()) => self.state.push_notice(Notice::Saved {
                    count: self.state.watchlist.len(),
                }),
                Err(error) => self.state.push_notice(Notice::SaveFailed(error.to_string())),
            },
            Effect::LoadWatchlist => {
                let watchlist = self.store.load();
                self.state.replace_watchlist(watchlist);
            }
            Effect::Export => {
                let view = self.state.view.as_ref().ok_or(ExportError::NoView)?;
                if let Some(error) = &self.state.last_error {
                    return Err(ExportError::NoData {
                        symbol: error.symbol().clone(),
                    });
                }
                let path = self.exporter.export(view)?;
                self.state.push_notice(Notice::Exported(path));
            }
            Effect::Fetch => self.fetch().await,
            Effect::Refetch => {
                self.orchestrator
                    .invalidate(&self.state.selected, self.state.range)
                    .await;
                self.fetch().await;
            }
        }
        Ok(())
    }

    async fn fetch(&mut self) {
        let outcome = self
            .orchestrator
            .fetch_view(&self.state.selected, self.state.range)
            .await;
        self.state.install_view(outcome);
    }
}
