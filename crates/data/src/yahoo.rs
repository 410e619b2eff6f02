//! Daily bars from the Yahoo Finance chart API.
//!
//! `GET {base_url}/v8/finance/chart/{symbol}?range=2d&interval=1d`

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client, StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use stockanalyser_core::{FetchError, Lookback, PricePoint, PriceProvider, PriceSeries};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Connection settings for [`YahooProvider`].
#[derive(Debug, Clone)]
pub struct YahooConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!("stockanalyser/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(config: YahooConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| FetchError::Network(format!("Invalid user agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<PriceSeries, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            symbol
        );
        debug!(%symbol, %lookback, %url, "Requesting chart");

        let response = self
            .client
            .get(url)
            .query(&[("range", lookback.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        interpret_response(symbol, status, &body)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

/// Decide the outcome of a chart request from its status and body.
///
/// Error responses usually still carry a chart JSON body; only fall back
/// to the status when they don't.
fn interpret_response(
    symbol: &str,
    status: StatusCode,
    body: &str,
) -> Result<PriceSeries, FetchError> {
    match parse_chart(symbol, body) {
        Err(FetchError::Parse(_)) if !status.is_success() => Err(FetchError::Network(format!(
            "HTTP {} for {}",
            status, symbol
        ))),
        other => other,
    }
}

/// Turn a chart API response body into a validated series.
///
/// Sessions with a null close (halts, holidays) are dropped.
pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, FetchError> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if let Some(err) = response.chart.error {
        return match err.code.as_str() {
            "Not Found" => Err(FetchError::NoData(format!("{}: {}", symbol, err.description))),
            _ => Err(FetchError::Network(format!("{}: {}", err.code, err.description))),
        };
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;

    let mut points = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = at(&quote.close, i) else {
            continue;
        };
        let timestamp = DateTime::from_timestamp(*ts, 0)
            .ok_or_else(|| FetchError::Parse(format!("Bad timestamp {}", ts)))?;

        points.push(PricePoint {
            timestamp,
            open: at(&quote.open, i),
            high: at(&quote.high, i),
            low: at(&quote.low, i),
            close,
            volume: at(&quote.volume, i),
        });
    }

    if points.is_empty() {
        return Err(FetchError::NoData(symbol.to_string()));
    }

    Ok(PriceSeries::new(symbol, points)?)
}

fn at(column: &[Option<f64>], i: usize) -> Option<Decimal> {
    column
        .get(i)
        .copied()
        .flatten()
        .and_then(|v| Decimal::try_from(v).ok())
}

//
// Match Yahoo chart API JSON
//
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
