//! Yahoo Finance chart API client.
//!
//! `GET {base_url}/v8/finance/chart/{symbol}?range=5d&interval=5m` returns
//! parallel arrays of timestamps (seconds) and OHLCV values. Any value may be
//! null for a minute without trades; such rows are skipped.

use crate::source::{BarRequest, BarSource, SourceError};
use async_trait::async_trait;
use keylevel_core::config::SourceConfig;
use keylevel_core::Bar;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) keylevel-tracker/0.1";

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
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteArrays {
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

/// Decode a chart response body into bars, oldest first.
///
/// Rows with a null price are dropped. When two consecutive rows share a
/// timestamp (the API repeats the live bar) the later one wins.
pub fn decode_chart(symbol: &str, body: &str) -> Result<Vec<Bar>, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(api_error(symbol, err));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let n = result.timestamp.len();
    if [&quote.open, &quote.high, &quote.low, &quote.close]
        .iter()
        .any(|a| !a.is_empty() && a.len() != n)
    {
        return Err(SourceError::InvalidResponse(format!(
            "{n} timestamps but quote arrays of lengths {}/{}/{}/{}",
            quote.open.len(),
            quote.high.len(),
            quote.low.len(),
            quote.close.len()
        )));
    }

    let mut bars: Vec<Bar> = Vec::with_capacity(n);
    let mut skipped = 0usize;

    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |a: &Vec<Option<f64>>| a.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        ) else {
            skipped += 1;
            continue;
        };

        let ts_ms = ts.checked_mul(1000).ok_or_else(|| {
            SourceError::InvalidResponse(format!("timestamp {ts} out of range at row {i}"))
        })?;
        let bar = Bar {
            ts_ms,
            open,
            high,
            low,
            close,
            volume: field(&quote.volume),
        };

        match bars.last_mut() {
            Some(prev) if prev.ts_ms == bar.ts_ms => *prev = bar,
            _ => bars.push(bar),
        }
    }

    debug!(symbol, rows = n, bars = bars.len(), skipped, "decoded chart response");
    Ok(bars)
}

fn api_error(symbol: &str, err: ChartError) -> SourceError {
    if err.code.eq_ignore_ascii_case("Not Found") {
        SourceError::UnknownSymbol(symbol.to_string())
    } else {
        SourceError::Api {
            code: err.code,
            description: err.description,
        }
    }
}

/// Bar source backed by the Yahoo Finance chart API.
#[derive(Debug, Clone)]
pub struct YahooChartSource {
    base_url: String,
    client: Client,
}

impl YahooChartSource {
    /// Create a source from configuration.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Chart endpoint URL for `symbol`.
    pub fn chart_url(&self, symbol: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, symbol)
    }
}

#[async_trait]
impl BarSource for YahooChartSource {
    async fn fetch_bars(&self, request: &BarRequest) -> Result<Vec<Bar>, SourceError> {
        let url = self.chart_url(&request.symbol);
        debug!(%request, %url, "fetching bars");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("range", request.period.as_str()),
                ("interval", request.interval.as_str()),
                ("includePrePost", "false"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Error responses usually still carry a chart.error object.
            return match decode_chart(&request.symbol, &body) {
                Err(SourceError::Decode(_)) | Ok(_) => Err(SourceError::Status {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                }),
                Err(e) => Err(e),
            };
        }

        decode_chart(&request.symbol, &body)
    }
}
