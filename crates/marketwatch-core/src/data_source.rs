//! Quote provider contract.
//!
//! The orchestrator only ever talks to a [`QuoteProvider`]. Which market-data
//! service sits behind it, and over which wire protocol, is an adapter
//! concern (see [`crate::adapters`]).
//!
//! | Call | Request | Response |
//! |------|---------|----------|
//! | History | [`HistoryRequest`] | [`PriceHistory`] |
//! | Quote | [`Symbol`] | [`QuoteSnapshot`] |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Granularity, PriceHistory, QuoteSnapshot, Range, Symbol};

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Internal,
}

/// Structured error reported by a provider adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// History request for one symbol over one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub range: Range,
    pub granularity: Granularity,
}

impl HistoryRequest {
    /// Build a request using the fixed range to granularity table.
    pub fn for_range(symbol: Symbol, range: Range) -> Self {
        Self {
            symbol,
            range,
            granularity: range.granularity(),
        }
    }
}

/// Market data provider contract.
///
/// Implementations must be `Send + Sync`; the orchestrator shares them
/// behind an `Arc`.
pub trait QuoteProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch close prices for the requested window.
    ///
    /// An instrument with no trades in the window yields an empty history,
    /// not an error.
    fn history<'a>(&'a self, req: HistoryRequest) -> ProviderFuture<'a, PriceHistory>;

    /// Fetch the current quote fields. Fields the provider does not know are
    /// left as `None`.
    fn quote<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, QuoteSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_request_uses_range_granularity() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let request = HistoryRequest::for_range(symbol, Range::OneWeek);
        assert_eq!(request.granularity, Granularity::FifteenMinutes);
    }

    #[test]
    fn error_display_includes_code() {
        let error = SourceError::rate_limited("slow down");
        assert_eq!(error.to_string(), "slow down (source.rate_limited)");
        assert!(error.retryable());
        assert!(!SourceError::internal("bad payload").retryable());
    }
}
