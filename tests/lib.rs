//! Shared fixtures for the marketwatch behavior tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use marketwatch_core::{
    HistoryRequest, PriceHistory, PricePoint, ProviderFuture, QuoteProvider, QuoteSnapshot,
    Range, SourceError, Symbol, UtcDateTime,
};

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("test symbol is valid")
}

pub fn series(closes: &[f64]) -> PriceHistory {
    PriceHistory::from_points(closes.iter().enumerate().map(|(index, close)| {
        let ts = UtcDateTime::from_unix_timestamp(1_700_000_000 + index as i64 * 300)
            .expect("valid timestamp");
        PricePoint::new(ts, *close)
    }))
}

pub fn full_quote(price: f64) -> QuoteSnapshot {
    QuoteSnapshot {
        name: Some(String::from("Test Corp")),
        price: Some(price),
        change: Some(1.5),
        change_percent: Some(0.75),
        currency: Some(String::from("USD")),
        bid: Some(price - 0.25),
        ask: Some(price + 0.25),
        previous_close: Some(price - 1.5),
    }
}

/// Provider returning canned data and recording every request.
pub struct StubProvider {
    history: PriceHistory,
    quote: Mutex<QuoteSnapshot>,
    failure: Option<SourceError>,
    fetches: AtomicUsize,
    requests: Mutex<Vec<(Symbol, Range)>>,
}

impl StubProvider {
    pub fn with_data(history: PriceHistory, quote: QuoteSnapshot) -> Self {
        Self {
            history,
            quote: Mutex::new(quote),
            failure: None,
            fetches: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider that knows nothing about any symbol.
    pub fn empty() -> Self {
        Self::with_data(PriceHistory::empty(), QuoteSnapshot::default())
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::empty()
        }
    }

    pub fn set_price(&self, price: f64) {
        *self.quote.lock().expect("quote lock") = full_quote(price);
    }

    /// Number of history fetches served.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(Symbol, Range)> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl QuoteProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> ProviderFuture<'a, PriceHistory> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push((req.symbol.clone(), req.range));
        let result = match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.history.clone()),
        };
        Box::pin(async move { result })
    }

    fn quote<'a>(&'a self, _symbol: &'a Symbol) -> ProviderFuture<'a, QuoteSnapshot> {
        let result = match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.quote.lock().expect("quote lock").clone()),
        };
        Box::pin(async move { result })
    }
}
