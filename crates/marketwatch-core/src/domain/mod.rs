//! # Domain Models
//!
//! Strongly-typed values shared by the watchlist, the fetch orchestrator and
//! the presentation layer.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-case ticker |
//! | [`Range`] | Lookback window (1D, 1W, 1M) |
//! | [`Granularity`] | Sampling interval derived from a range |
//! | [`PricePoint`] | Timestamped close |
//! | [`PriceHistory`] | Ordered, de-duplicated closes |
//! | [`QuoteSnapshot`] | Optional quote fields with resolution policy |
//! | [`Metric`] | Value or explicit `N/A` |
//! | [`MarketView`] | Render-ready output of one fetch |
//! | [`UtcDateTime`] | UTC timestamp |

mod models;
mod range;
mod symbol;
mod timestamp;

pub use models::{
    Chart, MarketView, Metric, PriceHistory, PricePoint, QuoteSnapshot, NOT_AVAILABLE,
};
pub use range::{Granularity, Range};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
