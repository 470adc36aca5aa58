//! Error types for the keylevel-tracker system.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Metric computed by the engine that depends on a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Average true range.
    Volatility,
    /// Rolling mean of close, and the bias derived from it.
    Bias,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Volatility => write!(f, "volatility"),
            Metric::Bias => write!(f, "bias"),
        }
    }
}

/// A metric could not be computed because the sequence is shorter than its window.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("insufficient data for {metric}: need >= {required} bars, have {available}")]
pub struct InsufficientHistory {
    /// Metric that was not computed.
    pub metric: Metric,
    /// Bars required by the window.
    pub required: usize,
    /// Bars actually available.
    pub available: usize,
}

/// Main error type for the keylevel-tracker system.
#[derive(Error, Debug)]
pub enum Error {
    /// Retrieval produced no bars.
    #[error("No data: the bar sequence is empty")]
    DataUnavailable,

    /// Sequence shorter than the window a metric needs.
    #[error(transparent)]
    InsufficientHistory(#[from] InsufficientHistory),

    /// A bar violates the OHLC or ordering invariants; the whole batch is rejected.
    #[error("Malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Market data retrieval failed.
    #[error("Data source error: {0}")]
    Source(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML decoding error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a malformed bar error.
    pub fn malformed_bar(index: usize, reason: impl Into<String>) -> Self {
        Error::MalformedBar {
            index,
            reason: reason.into(),
        }
    }

    /// Create a data source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Is this a "no data" condition rather than a failure?
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Error::DataUnavailable)
    }
}
