//! Yahoo Finance chart API adapter.
//!
//! Uses the public `/v8/finance/chart/{symbol}` endpoint, which needs no
//! crumb. The last price comes from `meta.regularMarketPrice`; the previous
//! close from `meta.previousClose`, falling back to `chartPreviousClose`.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use urlencoding::encode;

use crate::domain::error::FolioError;
use crate::domain::quote::Quote;
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) folio";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

fn quote_error(symbol: &str, reason: impl Into<String>) -> FolioError {
    FolioError::Quote {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}

fn parse_chart(symbol: &str, body: &str) -> Result<ChartResult, FolioError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|e| quote_error(symbol, format!("invalid chart response: {}", e)))?;
    if let Some(err) = response.chart.error {
        return Err(quote_error(
            symbol,
            format!("{}: {}", err.code, err.description),
        ));
    }
    response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| quote_error(symbol, "empty chart result"))
}

/// Extract last price and previous close from a chart response body.
pub fn parse_quote(symbol: &str, body: &str) -> Result<Quote, FolioError> {
    let result = parse_chart(symbol, body)?;
    let last = result
        .meta
        .regular_market_price
        .ok_or_else(|| quote_error(symbol, "no regularMarketPrice"))?;
    let previous_close = result
        .meta
        .previous_close
        .or(result.meta.chart_previous_close)
        .unwrap_or(0.0);
    Ok(Quote::live(symbol, last, previous_close))
}

/// Extract daily closes, oldest first, skipping null bars.
pub fn parse_closes(symbol: &str, body: &str) -> Result<Vec<f64>, FolioError> {
    let result = parse_chart(symbol, body)?;
    Ok(result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .map(|q| q.close.into_iter().flatten().collect())
        .unwrap_or_default())
}

/// Symbols such as `^TA125.TA` or `ILS=X` are percent-encoded into the path.
fn chart_url(base_url: &str, symbol: &str, query: &str) -> String {
    format!("{}/v8/finance/chart/{}?{}", base_url, encode(symbol), query)
}

pub struct YahooAdapter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooAdapter {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FolioError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| quote_error("*", format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FolioError> {
        let base_url = config
            .get_string("quotes", "base_url")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = config.get_int("quotes", "timeout_secs", 10).max(1) as u64;
        Self::new(&base_url, Duration::from_secs(timeout))
    }

    fn get_chart(&self, symbol: &str, query: &str) -> Result<String, FolioError> {
        let url = chart_url(&self.base_url, symbol, query);
        log::debug!("GET {}", url);
        self.client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| quote_error(symbol, e.to_string()))
    }
}

impl QuotePort for YahooAdapter {
    fn fetch_quote(&self, symbol: &str) -> Result<Quote, FolioError> {
        let body = self.get_chart(symbol, "range=1d&interval=1d")?;
        parse_quote(symbol, &body)
    }

    fn fetch_fx_rate(&self, pair: &str) -> Result<f64, FolioError> {
        self.fetch_quote(pair).map(|q| q.last)
    }

    fn fetch_closes(&self, symbol: &str, days: u32) -> Result<Vec<f64>, FolioError> {
        let end = Utc::now().timestamp();
        let start = end - i64::from(days) * 86_400;
        let body = self.get_chart(
            symbol,
            &format!("period1={}&period2={}&interval=1d", start, end),
        )?;
        parse_closes(symbol, &body)
    }
}
