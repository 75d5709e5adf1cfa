//! Fetch orchestration: turns a (symbol, range) selection into a [`MarketView`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::ViewCache;
use crate::data_source::{HistoryRequest, QuoteProvider, SourceError};
use crate::http_client::DEFAULT_REQUEST_TIMEOUT;
use crate::{MarketView, Range, Symbol, UtcDateTime};

/// Failure to produce a market view.
///
/// Provider errors, malformed responses and timeouts all land here. Callers
/// render [`MarketView::degraded`] instead of propagating it further.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("market data for {symbol} unavailable: {source}")]
    Unavailable { symbol: Symbol, source: SourceError },
}

impl FetchError {
    pub fn symbol(&self) -> &Symbol {
        match self {
            Self::Unavailable { symbol, .. } => symbol,
        }
    }
}

/// Mediates between session state and the quote provider.
#[derive(Clone)]
pub struct FetchOrchestrator {
    provider: Arc<dyn QuoteProvider>,
    timeout: Duration,
    cache: ViewCache,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            cache: ViewCache::disabled(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: ViewCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Fetch history and quote for one selection and stamp the result.
    ///
    /// An empty history is a valid view (`has_data() == false`), not an error.
    pub async fn fetch_view(&self, symbol: &Symbol, range: Range) -> Result<MarketView, FetchError> {
        if let Some(view) = self.cache.get(symbol, range).await {
            debug!(symbol = %symbol, range = %range, "serving market view from cache");
            return Ok(view);
        }

        let request = HistoryRequest::for_range(symbol.clone(), range);
        debug!(
            symbol = %symbol,
            range = %range,
            granularity = %request.granularity,
            provider = self.provider.name(),
            "fetching market view"
        );

        let fetch = async {
            tokio::join!(self.provider.history(request), self.provider.quote(symbol))
        };

        let (history, quote) = match tokio::time::timeout(self.timeout, fetch).await {
            Ok((Ok(history), Ok(quote))) => (history, quote),
            Ok((Err(source), _)) | Ok((_, Err(source))) => {
                return Err(self.unavailable(symbol, source));
            }
            Err(_) => {
                let source = SourceError::unavailable(format!(
                    "no response within {}ms",
                    self.timeout.as_millis()
                ));
                return Err(self.unavailable(symbol, source));
            }
        };

        let view = MarketView::new(symbol.clone(), range, history, quote, UtcDateTime::now());
        debug!(
            symbol = %symbol,
            range = %range,
            points = view.history.len(),
            has_data = view.has_data(),
            "market view ready"
        );

        self.cache.put(view.clone()).await;
        Ok(view)
    }

    /// Drop any memoized view so the next fetch reaches the provider.
    pub async fn invalidate(&self, symbol: &Symbol, range: Range) {
        self.cache.invalidate(symbol, range).await;
    }

    /// View rendered in place of a failed fetch.
    pub fn degraded_view(symbol: Symbol, range: Range) -> MarketView {
        MarketView::degraded(symbol, range)
    }

    fn unavailable(&self, symbol: &Symbol, source: SourceError) -> FetchError {
        warn!(
            symbol = %symbol,
            provider = self.provider.name(),
            code = source.code(),
            error = source.message(),
            "market data fetch failed"
        );
        FetchError::Unavailable {
            symbol: symbol.clone(),
            source,
        }
    }
}
