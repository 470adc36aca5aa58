//! Bar source abstraction.
//!
//! A [`BarSource`] turns a request (symbol, lookback, interval) into a
//! time-ordered batch of bars. Sources do not validate bars; that happens in
//! [`crate::validation`].

use async_trait::async_trait;
use keylevel_core::{Bar, Config, LookbackPeriod, SampleInterval};
use std::fmt;
use thiserror::Error;

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarRequest {
    pub symbol: String,
    pub period: LookbackPeriod,
    pub interval: SampleInterval,
}

impl BarRequest {
    pub fn new(symbol: impl Into<String>, period: LookbackPeriod, interval: SampleInterval) -> Self {
        Self {
            symbol: symbol.into(),
            period,
            interval,
        }
    }

    /// Request for the configured instrument.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.instrument.symbol.clone(),
            config.instrument.lookback,
            config.instrument.interval,
        )
    }
}

impl fmt::Display for BarRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.symbol, self.period, self.interval)
    }
}

/// Errors that can occur within a `BarSource` implementation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network failure, timeout or TLS error.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status without a structured error body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The API reported an error.
    #[error("API error {code}: {description}")]
    Api { code: String, description: String },

    /// The API does not know the symbol.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded but its shape is inconsistent.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<SourceError> for keylevel_core::Error {
    fn from(e: SourceError) -> Self {
        keylevel_core::Error::source(e.to_string())
    }
}

/// Trait for fetching bars from a market data provider.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch bars for `request`, oldest first.
    async fn fetch_bars(&self, request: &BarRequest) -> Result<Vec<Bar>, SourceError>;
}
