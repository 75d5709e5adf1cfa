use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Range, Symbol, UtcDateTime};

/// Marker rendered for quote fields the provider did not supply.
pub const NOT_AVAILABLE: &str = "N/A";

/// One closing price sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub ts: UtcDateTime,
    pub close: f64,
}

impl PricePoint {
    pub const fn new(ts: UtcDateTime, close: f64) -> Self {
        Self { ts, close }
    }
}

/// Close prices ordered by timestamp, ascending, without duplicate timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory(Vec<PricePoint>);

impl PriceHistory {
    /// Normalize raw provider samples.
    ///
    /// Non-finite closes are dropped. When two samples share a timestamp the
    /// later one in the input wins.
    pub fn from_points(points: impl IntoIterator<Item = PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points
            .into_iter()
            .filter(|point| point.close.is_finite())
            .collect();
        // stable sort keeps input order among equal timestamps
        points.sort_by_key(|point| point.ts);

        let mut normalized: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match normalized.last_mut() {
                Some(last) if last.ts == point.ts => *last = point,
                _ => normalized.push(point),
            }
        }

        Self(normalized)
    }

    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    /// Lowest and highest close, if any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.0.iter().map(|point| point.close);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(low, high), close| {
            (low.min(close), high.max(close))
        }))
    }
}

/// A quote field that is either a value or explicitly unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Unavailable,
}

impl Metric {
    pub fn from_option(value: Option<f64>) -> Self {
        value.map_or(Self::Unavailable, Self::Value)
    }

    pub const fn is_available(self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

/// Two decimals unless the caller asks for another precision.
impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => {
                let precision = f.precision().unwrap_or(2);
                write!(f, "{value:.precision$}")
            }
            Self::Unavailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::Unavailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Number(value)) => Ok(Self::Value(value)),
            Some(Raw::Text(text)) if text == NOT_AVAILABLE => Ok(Self::Unavailable),
            Some(Raw::Text(text)) => Err(D::Error::custom(format!(
                "expected a number or '{NOT_AVAILABLE}', got '{text}'"
            ))),
            None => Ok(Self::Unavailable),
        }
    }
}

/// Quote fields as supplied by the provider; any of them may be missing.
///
/// Resolution is asymmetric on purpose: price, change and percent change
/// resolve to `0.0` when absent, while bid, ask and previous close resolve
/// to [`Metric::Unavailable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub currency: Option<String>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub previous_close: Option<f64>,
}

impl QuoteSnapshot {
    pub fn price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn change(&self) -> f64 {
        self.change.unwrap_or(0.0)
    }

    pub fn change_percent(&self) -> f64 {
        self.change_percent.unwrap_or(0.0)
    }

    pub fn bid(&self) -> Metric {
        Metric::from_option(self.bid)
    }

    pub fn ask(&self) -> Metric {
        Metric::from_option(self.ask)
    }

    pub fn previous_close(&self) -> Metric {
        Metric::from_option(self.previous_close)
    }

    /// Display name, falling back to the ticker.
    pub fn display_name<'a>(&'a self, symbol: &'a Symbol) -> &'a str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| symbol.as_str())
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What the chart area should draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Chart<'a> {
    Series(&'a [PricePoint]),
    NoData,
}

/// Render-ready result of one (symbol, range) fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketView {
    pub symbol: Symbol,
    pub range: Range,
    pub history: PriceHistory,
    pub quote: QuoteSnapshot,
    pub fetched_at: UtcDateTime,
}

impl MarketView {
    pub fn new(
        symbol: Symbol,
        range: Range,
        history: PriceHistory,
        quote: QuoteSnapshot,
        fetched_at: UtcDateTime,
    ) -> Self {
        Self {
            symbol,
            range,
            history,
            quote,
            fetched_at,
        }
    }

    /// No-data view shown after a failed fetch.
    pub fn degraded(symbol: Symbol, range: Range) -> Self {
        Self::new(
            symbol,
            range,
            PriceHistory::empty(),
            QuoteSnapshot::default(),
            UtcDateTime::now(),
        )
    }

    pub fn has_data(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn chart(&self) -> Chart<'_> {
        if self.history.is_empty() {
            Chart::NoData
        } else {
            Chart::Series(self.history.points())
        }
    }

    pub fn key(&self) -> (&Symbol, Range) {
        (&self.symbol, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(seconds: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(seconds).expect("valid timestamp")
    }

    #[test]
    fn history_sorts_and_collapses_duplicate_timestamps() {
        let history = PriceHistory::from_points([
            PricePoint::new(ts(300), 3.0),
            PricePoint::new(ts(100), 1.0),
            PricePoint::new(ts(300), 3.5),
            PricePoint::new(ts(200), f64::NAN),
        ]);

        let closes: Vec<_> = history.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![1.0, 3.5]);
        assert_eq!(history.bounds(), Some((1.0, 3.5)));
    }

    #[test]
    fn empty_quote_resolves_numbers_to_zero_and_metrics_to_not_available() {
        let quote = QuoteSnapshot::default();
        assert_eq!(quote.price(), 0.0);
        assert_eq!(quote.change(), 0.0);
        assert_eq!(quote.change_percent(), 0.0);
        assert_eq!(quote.bid(), Metric::Unavailable);
        assert_eq!(quote.ask().to_string(), NOT_AVAILABLE);
        assert_ne!(quote.previous_close(), Metric::Value(0.0));
    }

    #[test]
    fn metric_displays_fixed_precision() {
        assert_eq!(Metric::Value(0.1 + 0.2).to_string(), "0.30");
        assert_eq!(Metric::Value(189.4).to_string(), "189.40");
        assert_eq!(format!("{:.3}", Metric::Value(1.23456)), "1.235");
        assert_eq!(format!("{:.3}", Metric::Unavailable), NOT_AVAILABLE);
    }

    #[test]
    fn metric_serializes_marker_for_missing_value() {
        let json = serde_json::to_string(&[Metric::Value(1.5), Metric::Unavailable])
            .expect("serializes");
        assert_eq!(json, r#"[1.5,"N/A"]"#);
    }

    #[test]
    fn empty_history_charts_as_no_data() {
        let view = MarketView::degraded(Symbol::parse("ZZZZ").expect("symbol"), Range::OneDay);
        assert!(!view.has_data());
        assert_eq!(view.chart(), Chart::NoData);
        assert_eq!(view.quote.display_name(&view.symbol), "ZZZZ");
    }
}
