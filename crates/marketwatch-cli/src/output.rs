//! Rendering of views, watchlists and export results.

use std::fmt::Write as _;
use std::path::Path;

use marketwatch_core::{
    Chart, MarketView, Metric, PricePoint, Range, Symbol, UtcDateTime, Watchlist,
};
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::error::CliError;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const SPARK_WIDTH: usize = 64;
const NO_CHART_DATA: &str = "No chart data available.";

#[derive(Debug, Serialize)]
struct ViewPayload<'a> {
    symbol: &'a Symbol,
    name: &'a str,
    range: &'static str,
    granularity: &'static str,
    currency: &'a str,
    price: f64,
    change: f64,
    change_percent: f64,
    bid: Metric,
    ask: Metric,
    previous_close: Metric,
    fetched_at: UtcDateTime,
    has_data: bool,
    history: &'a [PricePoint],
    watchlist: &'a [Symbol],
}

impl<'a> ViewPayload<'a> {
    fn new(view: &'a MarketView, watchlist: &'a Watchlist) -> Self {
        Self {
            symbol: &view.symbol,
            name: view.quote.display_name(&view.symbol),
            range: view.range.label(),
            granularity: view.range.granularity().as_str(),
            currency: view.quote.currency(),
            price: view.quote.price(),
            change: view.quote.change(),
            change_percent: view.quote.change_percent(),
            bid: view.quote.bid(),
            ask: view.quote.ask(),
            previous_close: view.quote.previous_close(),
            fetched_at: view.fetched_at,
            has_data: view.has_data(),
            history: view.history.points(),
            watchlist: watchlist.as_slice(),
        }
    }
}

pub fn render_view(
    view: &MarketView,
    watchlist: &Watchlist,
    selected: &Symbol,
    format: OutputFormat,
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = serde_json::to_string_pretty(&ViewPayload::new(view, watchlist))?;
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", dashboard_text(view, watchlist, selected)),
    }
    Ok(())
}

pub fn render_watchlist(watchlist: &Watchlist, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(watchlist)?),
        OutputFormat::Table => {
            for symbol in watchlist {
                println!("{symbol}");
            }
        }
    }
    Ok(())
}

pub fn render_export(path: &Path, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = json!({ "exported": true, "path": path.display().to_string() });
            println!("{payload}");
        }
        OutputFormat::Table => println!("Exported to {}", path.display()),
    }
    Ok(())
}

/// Full text dashboard for one view.
pub fn dashboard_text(view: &MarketView, watchlist: &Watchlist, selected: &Symbol) -> String {
    let quote = &view.quote;
    let mut out = String::new();

    let _ = writeln!(out, "{} ({})", quote.display_name(&view.symbol), view.symbol);
    let currency = quote.currency();
    let price_line = if currency.is_empty() {
        format!("{:.2}", quote.price())
    } else {
        format!("{:.2} {currency}", quote.price())
    };
    let _ = writeln!(
        out,
        "{price_line} {:+.2} ({:+.2}%)",
        quote.change(),
        quote.change_percent()
    );
    let _ = writeln!(out, "As of {} UTC", view.fetched_at.clock());
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", range_tabs(view.range));

    match view.chart() {
        Chart::Series(points) => {
            let _ = writeln!(out, "{}", sparkline(points, SPARK_WIDTH));
            if let Some((low, high)) = view.history.bounds() {
                let _ = writeln!(out, "low {low:.2}  high {high:.2}");
            }
        }
        Chart::NoData => {
            let _ = writeln!(out, "{NO_CHART_DATA}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{:<11} {}", "Bid", quote.bid());
    let _ = writeln!(out, "{:<11} {}", "Ask", quote.ask());
    let _ = writeln!(out, "{:<11} {}", "Last Close", quote.previous_close());

    let _ = writeln!(out);
    let _ = writeln!(out, "Watchlist");
    for symbol in watchlist {
        let marker = if symbol == selected { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} {symbol}");
    }

    out
}

fn range_tabs(active: Range) -> String {
    Range::ALL
        .iter()
        .map(|range| {
            if *range == active {
                format!("[{}]", range.label())
            } else {
                format!(" {} ", range.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Closing prices scaled onto eight block levels, downsampled to `width`.
pub fn sparkline(points: &[PricePoint], width: usize) -> String {
    if points.is_empty() || width == 0 {
        return String::new();
    }

    let sampled: Vec<f64> = if points.len() <= width {
        points.iter().map(|point| point.close).collect()
    } else {
        (0..width)
            .map(|index| points[index * (points.len() - 1) / (width - 1).max(1)].close)
            .collect()
    };

    let (low, high) = sampled
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), value| {
            (low.min(*value), high.max(*value))
        });
    let span = high - low;
    let top = SPARK_LEVELS.len() - 1;

    sampled
        .iter()
        .map(|value| {
            if span <= f64::EPSILON {
                SPARK_LEVELS[top / 2]
            } else {
                let level = ((value - low) / span * top as f64).round() as usize;
                SPARK_LEVELS[level.min(top)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketwatch_core::{PriceHistory, QuoteSnapshot};

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    fn point(seconds: i64, close: f64) -> PricePoint {
        PricePoint {
            ts: UtcDateTime::from_unix_timestamp(seconds).unwrap(),
            close,
        }
    }

    #[test]
    fn sparkline_spans_lowest_to_highest_block() {
        let points = [point(0, 1.0), point(60, 2.0), point(120, 3.0)];
        assert_eq!(sparkline(&points, 64), "▁▅█");
    }

    #[test]
    fn sparkline_downsamples_to_width() {
        let points: Vec<_> = (0..200).map(|i| point(i * 60, i as f64)).collect();
        let line = sparkline(&points, 10);
        assert_eq!(line.chars().count(), 10);
        assert!(line.starts_with('▁'));
        assert!(line.ends_with('█'));
    }

    #[test]
    fn flat_series_renders_middle_level() {
        let points = [point(0, 5.0), point(60, 5.0)];
        assert_eq!(sparkline(&points, 64), "▄▄");
    }

    #[test]
    fn degraded_view_shows_no_data_and_na_metrics() {
        let view = MarketView::degraded(symbol("ZZZZ"), Range::OneDay);
        let watchlist = Watchlist::with_default(symbol("ZZZZ"));
        let text = dashboard_text(&view, &watchlist, &symbol("ZZZZ"));

        assert!(text.starts_with("ZZZZ (ZZZZ)\n0.00 +0.00 (+0.00%)\n"));
        assert!(text.contains(NO_CHART_DATA));
        assert!(text.contains("Bid         N/A"));
        assert!(text.contains("Last Close  N/A"));
        assert!(text.contains("[1D]  1W   1M "));
        assert!(text.contains("> ZZZZ"));
    }

    #[test]
    fn populated_view_shows_header_and_chart() {
        let quote = QuoteSnapshot {
            name: Some(String::from("Apple Inc.")),
            price: Some(190.5),
            change: Some(-1.25),
            change_percent: Some(-0.65),
            currency: Some(String::from("USD")),
            bid: Some(190.4),
            ask: Some(190.6),
            previous_close: Some(191.75),
        };
        let history = PriceHistory::from_points([point(0, 190.0), point(300, 191.0)]);
        let view = MarketView::new(
            symbol("AAPL"),
            Range::OneWeek,
            history,
            quote,
            UtcDateTime::from_unix_timestamp(3_600 * 14 + 62).unwrap(),
        );
        let watchlist: Watchlist = [symbol("AAPL"), symbol("MSFT")].into_iter().collect();
        let text = dashboard_text(&view, &watchlist, &symbol("AAPL"));

        assert!(text.starts_with("Apple Inc. (AAPL)\n190.50 USD -1.25 (-0.65%)\nAs of 14:01:02 UTC\n"));
        assert!(text.contains(" 1D  [1W]  1M "));
        assert!(text.contains("▁█"));
        assert!(text.contains("Bid         190.40"));
        assert!(text.contains("  MSFT"));
    }
}
