
use crate::data_source::{HistoryRequest, ProviderFuture, QuoteProvider};
use crate::{PriceHistory, PricePoint, QuoteSnapshot, Range, Symbol, UtcDateTime};

/// Deterministic offline provider.
///
/// Prices are derived from a hash of the ticker so repeated runs render the
/// same dashboard. Used by `--mock` and by tests that need plausible data.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    anchor: UtcDateTime,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::anchored_at(UtcDateTime::now())
    }
}

impl SyntheticProvider {
    /// Generate series that end at `anchor`.
    pub fn anchored_at(anchor: UtcDateTime) -> Self {
        Self { anchor }
    }

    fn series(&self, req: &HistoryRequest) -> PriceHistory {
        let count = req.range.expected_points();
        let step = req.granularity.step();
        let seed = symbol_seed(&req.symbol);
        let base = base_price(seed);

        let points = (0..count).map(|index| {
            let offset = step * (count - index - 1) as i32;
            let ts = self.anchor.saturating_sub(offset);
            PricePoint::new(ts, round_cents(base + wave(seed, index)))
        });

        PriceHistory::from_points(points)
    }

    fn snapshot(&self, symbol: &Symbol) -> QuoteSnapshot {
        let seed = symbol_seed(symbol);
        let price = round_cents(base_price(seed) + wave(seed, Range::OneDay.expected_points() - 1));
        let previous_close = round_cents(base_price(seed) + wave(seed, 0) - 0.45);
        let change = round_cents(price - previous_close);

        QuoteSnapshot {
            name: Some(format!("{symbol} (synthetic)")),
            price: Some(price),
            change: Some(change),
            change_percent: Some(change / previous_close * 100.0),
            currency: Some(String::from("USD")),
            bid: Some(round_cents(price - 0.01)),
            ask: Some(round_cents(price + 0.01)),
            previous_close: Some(previous_close),
        }
    }
}

impl QuoteProvider for SyntheticProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> ProviderFuture<'a, PriceHistory> {
        Box::pin(async move { Ok(self.series(&req)) })
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, QuoteSnapshot> {
        Box::pin(async move { Ok(self.snapshot(symbol)) })
    }
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

fn base_price(seed: u64) -> f64 {
    40.0 + (seed % 4_000) as f64 / 10.0
}

fn wave(seed: u64, index: usize) -> f64 {
    let phase = (seed % 17) as f64;
    ((index as f64 + phase) / 6.0).sin() * 1.5 + index as f64 * 0.02
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::anchored_at(
            UtcDateTime::parse("2024-06-03T20:00:00Z").expect("timestamp"),
        )
    }

    #[tokio::test]
    async fn series_is_deterministic_and_spaced_by_granularity() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let request = HistoryRequest::for_range(symbol, Range::OneDay);

        let first = provider().history(request.clone()).await.expect("history");
        let second = provider().history(request).await.expect("history");
        assert_eq!(first, second);
        assert_eq!(first.len(), Range::OneDay.expected_points());

        let points = first.points();
        let gap = points[1].ts.unix_timestamp() - points[0].ts.unix_timestamp();
        assert_eq!(gap, 300);
    }

    #[tokio::test]
    async fn snapshot_populates_every_field() {
        let symbol = Symbol::parse("MSFT").expect("valid");
        let quote = provider().quote(&symbol).await.expect("quote");
        assert!(quote.bid.is_some() && quote.ask.is_some() && quote.previous_close.is_some());
        assert!(quote.price() > 0.0);
    }
}
