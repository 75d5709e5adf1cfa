use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::data_source::{HistoryRequest, ProviderFuture, QuoteProvider, SourceError};
use crate::http_client::{
    HttpClient, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::{PriceHistory, PricePoint, QuoteSnapshot, Symbol, UtcDateTime};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_ENDPOINT: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const COOKIE_ENDPOINT: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";
const QUOTE_FIELDS: &str = "shortName,longName,regularMarketPrice,regularMarketChange,\
regularMarketChangePercent,currency,bid,ask,regularMarketPreviousClose";

// ============================================================================
// Session: cookie + crumb
// ============================================================================

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    obtained_at: Instant,
}

/// Caches the crumb token the quote endpoint requires.
///
/// The session cookie itself lives in the transport's cookie store; only the
/// crumb has to travel in the query string.
#[derive(Debug)]
pub struct YahooSession {
    crumb: Mutex<Option<Crumb>>,
    ttl: Duration,
}

impl Default for YahooSession {
    fn default() -> Self {
        Self {
            crumb: Mutex::new(None),
            ttl: Duration::from_secs(3600),
        }
    }
}

impl YahooSession {
    /// Return a cached crumb, refreshing it when missing or stale.
    pub async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        timeout: Duration,
    ) -> Result<String, SourceError> {
        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            if crumb.obtained_at.elapsed() < self.ttl {
                return Ok(crumb.value.clone());
            }
        }

        let value = fetch_crumb(http_client, timeout).await?;
        *guard = Some(Crumb {
            value: value.clone(),
            obtained_at: Instant::now(),
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }
}

async fn fetch_crumb(http_client: &dyn HttpClient, timeout: Duration) -> Result<String, SourceError> {
    // fc.yahoo.com answers 404 but sets the session cookie; the status is irrelevant.
    let cookie_request = HttpRequest::get(COOKIE_ENDPOINT)
        .with_header("referer", REFERER)
        .with_timeout(timeout);
    http_client
        .execute(cookie_request)
        .await
        .map_err(|error| transport_error("cookie", error.kind(), error.message()))?;

    for endpoint in CRUMB_ENDPOINTS {
        let request = HttpRequest::get(endpoint)
            .with_header("referer", REFERER)
            .with_timeout(timeout);

        let response = match http_client.execute(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(endpoint, status = response.status, "crumb endpoint rejected request");
                continue;
            }
            Err(error) => {
                debug!(endpoint, error = %error, "crumb endpoint unreachable");
                continue;
            }
        };

        let body = response.body.trim();
        if body.to_ascii_lowercase().contains("too many requests") {
            return Err(SourceError::rate_limited(
                "yahoo rate limited while fetching crumb",
            ));
        }
        if is_plausible_crumb(body) {
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

fn is_plausible_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
}

// ============================================================================
// Provider
// ============================================================================

/// Yahoo Finance quote provider.
///
/// History comes from the chart endpoint, the snapshot from the quote
/// endpoint. A 401/429 answer invalidates the crumb and retries once.
#[derive(Clone)]
pub struct YahooProvider {
    http_client: Arc<dyn HttpClient>,
    session: Arc<YahooSession>,
    timeout: Duration,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooProvider {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            session: Arc::new(YahooSession::default()),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout(self.timeout);

        self.http_client
            .execute(request)
            .await
            .map_err(|error| transport_error("request", error.kind(), error.message()))
    }

    async fn fetch_history(&self, req: &HistoryRequest) -> Result<PriceHistory, SourceError> {
        let url = format!(
            "{CHART_ENDPOINT}/{}?range={}&interval={}",
            urlencoding::encode(req.symbol.as_str()),
            req.range.period(),
            req.granularity.as_str()
        );

        let response = self.get(&url).await?;
        // The chart endpoint answers 404 with a JSON error body for unknown tickers.
        if !response.is_success() && response.status != 404 {
            return Err(status_error(response.status));
        }

        parse_chart_response(&response.body)
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<QuoteSnapshot, SourceError> {
        let http_client = self.http_client.as_ref();
        let crumb = self.session.crumb(http_client, self.timeout).await?;
        let response = self.get(&self.quote_url(symbol, &crumb)).await?;

        let response = if response.is_auth_rejection() {
            warn!(symbol = %symbol, status = response.status, "yahoo rejected crumb, refreshing session");
            self.session.invalidate().await;
            let crumb = self.session.crumb(http_client, self.timeout).await?;
            let retry = self.get(&self.quote_url(symbol, &crumb)).await?;
            if !retry.is_success() {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {} after session refresh",
                    retry.status
                )));
            }
            retry
        } else if !response.is_success() {
            return Err(status_error(response.status));
        } else {
            response
        };

        parse_quote_response(&response.body, symbol)
    }

    fn quote_url(&self, symbol: &Symbol, crumb: &str) -> String {
        format!(
            "{QUOTE_ENDPOINT}?symbols={}&fields={}&crumb={}",
            urlencoding::encode(symbol.as_str()),
            QUOTE_FIELDS,
            urlencoding::encode(crumb)
        )
    }
}

impl QuoteProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> ProviderFuture<'a, PriceHistory> {
        Box::pin(async move { self.fetch_history(&req).await })
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> ProviderFuture<'a, QuoteSnapshot> {
        Box::pin(async move { self.fetch_quote(symbol).await })
    }
}

fn transport_error(stage: &str, kind: HttpErrorKind, message: &str) -> SourceError {
    match kind {
        HttpErrorKind::Timeout => SourceError::unavailable(format!("yahoo {stage} timed out: {message}")),
        _ => SourceError::unavailable(format!("yahoo {stage} transport error: {message}")),
    }
}

fn status_error(status: u16) -> SourceError {
    if status == 429 {
        SourceError::rate_limited("yahoo returned status 429")
    } else {
        SourceError::unavailable(format!("yahoo returned status {status}"))
    }
}

// ============================================================================
// Response parsing
// ============================================================================

fn parse_chart_response(body: &str) -> Result<PriceHistory, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse yahoo chart: {error}")))?;

    if let Some(error) = response.chart.error {
        // Unknown or delisted tickers have no history; that is a no-data view, not a failure.
        if error.code.eq_ignore_ascii_case("not found") {
            return Ok(PriceHistory::empty());
        }
        return Err(SourceError::unavailable(format!(
            "yahoo chart API error: {} ({})",
            error.description, error.code
        )));
    }

    let Some(result) = response.chart.result.and_then(|results| results.into_iter().next())
    else {
        return Ok(PriceHistory::empty());
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let points = timestamps
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            let close = close?;
            let ts = UtcDateTime::from_unix_timestamp(ts).ok()?;
            Some(PricePoint::new(ts, close))
        });

    Ok(PriceHistory::from_points(points))
}

fn parse_quote_response(body: &str, symbol: &Symbol) -> Result<QuoteSnapshot, SourceError> {
    let response: YahooQuoteResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::internal(format!("failed to parse yahoo quote: {error}")))?;

    if let Some(error) = response.quote_response.error {
        return Err(SourceError::unavailable(format!(
            "yahoo quote API error: {} ({})",
            error.description, error.code
        )));
    }

    let quote = response
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .find(|quote| quote.symbol.eq_ignore_ascii_case(symbol.as_str()));

    Ok(quote.map(YahooQuote::into_snapshot).unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct YahooErrorBody {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
    error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: YahooIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResponseData,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteResponseData {
    result: Option<Vec<YahooQuote>>,
    error: Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    currency: Option<String>,
    bid: Option<f64>,
    ask: Option<f64>,
    regular_market_previous_close: Option<f64>,
}

impl YahooQuote {
    fn into_snapshot(self) -> QuoteSnapshot {
        QuoteSnapshot {
            name: self.short_name.or(self.long_name),
            price: self.regular_market_price,
            change: self.regular_market_change,
            change_percent: self.regular_market_change_percent,
            currency: self.currency,
            bid: self.bid,
            ask: self.ask,
            previous_close: self.regular_market_previous_close,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::HttpError;
    use crate::Range;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;

    /// Replays canned responses in order and records every URL requested.
    #[derive(Default)]
    struct ScriptedHttpClient {
        responses: StdMutex<VecDeque<Result<HttpResponse, HttpError>>>,
        urls: StdMutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: StdMutex::new(responses.into()),
                urls: StdMutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("url log poisoned").clone()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.urls.lock().expect("url log poisoned").push(request.url);
            let next = self
                .responses
                .lock()
                .expect("script poisoned")
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new(HttpErrorKind::Other, "script exhausted")));
            Box::pin(async move { next })
        }
    }

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    const CHART_BODY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "AAPL"},
                "timestamp": [1704205800, 1704206100, 1704206400],
                "indicators": {"quote": [{"close": [185.1, null, 185.7]}]}
            }],
            "error": null
        }
    }"#;

    const QUOTE_BODY: &str = r#"{
        "quoteResponse": {
            "result": [{
                "symbol": "AAPL",
                "shortName": "Apple Inc.",
                "regularMarketPrice": 189.5,
                "regularMarketChange": 1.25,
                "regularMarketChangePercent": 0.664,
                "currency": "USD",
                "bid": 189.4,
                "ask": 189.6,
                "regularMarketPreviousClose": 188.25
            }],
            "error": null
        }
    }"#;

    #[test]
    fn chart_parsing_skips_null_closes() {
        let history = parse_chart_response(CHART_BODY).expect("chart parses");
        let closes: Vec<_> = history.points().iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![185.1, 185.7]);
    }

    #[test]
    fn chart_without_timestamps_is_empty_history() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let history = parse_chart_response(body).expect("chart parses");
        assert!(history.is_empty());
    }

    #[test]
    fn unknown_ticker_chart_is_empty_history() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let history = parse_chart_response(body).expect("not found is no data");
        assert!(history.is_empty());
    }

    #[test]
    fn other_chart_errors_are_unavailable() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let error = parse_chart_response(body).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    }

    #[test]
    fn quote_parsing_maps_fields() {
        let quote = parse_quote_response(QUOTE_BODY, &symbol("AAPL")).expect("quote parses");
        assert_eq!(quote.name.as_deref(), Some("Apple Inc."));
        assert_eq!(quote.price, Some(189.5));
        assert_eq!(quote.previous_close, Some(188.25));
        assert_eq!(quote.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn quote_for_unknown_symbol_is_empty_snapshot() {
        let body = r#"{"quoteResponse":{"result":[],"error":null}}"#;
        let quote = parse_quote_response(body, &symbol("ZZZZ")).expect("quote parses");
        assert!(quote.is_empty());
    }

    #[test]
    fn malformed_quote_body_is_internal_error() {
        let error = parse_quote_response("<html>", &symbol("AAPL")).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Internal);
    }

    #[tokio::test]
    async fn history_request_encodes_period_and_interval() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(
            CHART_BODY,
        ))]));
        let provider = YahooProvider::with_http_client(client.clone());

        let history = provider
            .history(HistoryRequest::for_range(symbol("AAPL"), Range::OneWeek))
            .await
            .expect("history succeeds");

        assert_eq!(history.len(), 2);
        let urls = client.urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].ends_with("/AAPL?range=5d&interval=15m"), "{}", urls[0]);
    }

    #[tokio::test]
    async fn quote_refreshes_crumb_once_after_rejection() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok_json("crumb-1")),
            Ok(HttpResponse::new(401, "")),
            Ok(HttpResponse::new(404, "")),
            Ok(HttpResponse::ok_json("crumb-2")),
            Ok(HttpResponse::ok_json(QUOTE_BODY)),
        ]));
        let provider = YahooProvider::with_http_client(client.clone());

        let quote = provider.quote(&symbol("AAPL")).await.expect("quote succeeds");
        assert_eq!(quote.bid, Some(189.4));

        let urls = client.urls();
        assert_eq!(urls.len(), 6);
        assert!(urls[2].contains("crumb=crumb-1"));
        assert!(urls[5].contains("crumb=crumb-2"));
    }

    #[tokio::test]
    async fn transport_timeout_surfaces_as_unavailable() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Err(HttpError::timeout(
            "deadline elapsed",
        ))]));
        let provider = YahooProvider::with_http_client(client);

        let error = provider
            .history(HistoryRequest::for_range(symbol("MSFT"), Range::OneDay))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert!(error.message().contains("timed out"));
    }
}
