//! Core data types for the keylevel-tracker system.

use crate::error::{Error, InsufficientHistory, Metric, Result};
use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Price type with ordering support.
pub type Price = OrderedFloat<f64>;

/// Convert a millisecond timestamp to a UTC datetime.
#[inline]
pub fn ts_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}

/// How far back to request history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[default]
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
}

impl LookbackPeriod {
    /// All periods in selector order.
    pub const ALL: [LookbackPeriod; 4] = [
        LookbackPeriod::OneDay,
        LookbackPeriod::FiveDays,
        LookbackPeriod::OneMonth,
        LookbackPeriod::ThreeMonths,
    ];

    /// Wire string, as used by the data source and the config file.
    pub fn as_str(self) -> &'static str {
        match self {
            LookbackPeriod::OneDay => "1d",
            LookbackPeriod::FiveDays => "5d",
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::ThreeMonths => "3mo",
        }
    }

    /// Next period in selector order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookbackPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| Error::config(format!("unknown lookback period '{s}' (expected 1d, 5d, 1mo or 3mo)")))
    }
}

/// Spacing between consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SampleInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[default]
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
}

impl SampleInterval {
    /// All intervals in selector order.
    pub const ALL: [SampleInterval; 3] = [
        SampleInterval::OneMinute,
        SampleInterval::FiveMinutes,
        SampleInterval::FifteenMinutes,
    ];

    /// Wire string, as used by the data source and the config file.
    pub fn as_str(self) -> &'static str {
        match self {
            SampleInterval::OneMinute => "1m",
            SampleInterval::FiveMinutes => "5m",
            SampleInterval::FifteenMinutes => "15m",
        }
    }

    /// Interval length in milliseconds.
    pub fn duration_ms(self) -> i64 {
        match self {
            SampleInterval::OneMinute => 60_000,
            SampleInterval::FiveMinutes => 5 * 60_000,
            SampleInterval::FifteenMinutes => 15 * 60_000,
        }
    }

    /// Next interval in selector order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|i| *i == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for SampleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s.trim())
            .ok_or_else(|| Error::config(format!("unknown sample interval '{s}' (expected 1m, 5m or 15m)")))
    }
}

/// A single OHLC bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open timestamp (ms).
    pub ts_ms: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume, when the source reports it.
    pub volume: Option<f64>,
}

impl Bar {
    /// Create a bar without volume.
    pub fn new(ts_ms: TimestampMs, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            ts_ms,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// High minus low.
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check the OHLC invariants of a single bar.
    ///
    /// Returns a human readable reason on failure.
    pub fn check(&self) -> std::result::Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(format!(
                "non-finite price (o={}, h={}, l={}, c={})",
                self.open, self.high, self.low, self.close
            ));
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} below open/close ({} / {})",
                self.high, self.open, self.close
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} above open/close ({} / {})",
                self.low, self.open, self.close
            ));
        }
        Ok(())
    }
}

/// A non-empty, strictly time-ordered, validated sequence of bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSequence {
    bars: Vec<Bar>,
}

impl BarSequence {
    /// Validate and wrap a batch of bars.
    ///
    /// An empty batch is [`Error::DataUnavailable`]. Any bar that breaks the
    /// OHLC invariants, or whose timestamp does not strictly increase, rejects
    /// the whole batch with [`Error::MalformedBar`].
    pub fn new(bars: Vec<Bar>) -> Result<Self> {
        if bars.is_empty() {
            return Err(Error::DataUnavailable);
        }

        for (index, bar) in bars.iter().enumerate() {
            bar.check().map_err(|reason| Error::malformed_bar(index, reason))?;
        }

        for (index, pair) in bars.windows(2).enumerate() {
            if pair[1].ts_ms <= pair[0].ts_ms {
                return Err(Error::malformed_bar(
                    index + 1,
                    format!(
                        "timestamp {} does not follow previous timestamp {}",
                        pair[1].ts_ms, pair[0].ts_ms
                    ),
                ));
            }
        }

        Ok(Self { bars })
    }

    /// The bars, oldest first.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Number of bars (always at least one).
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Always false; kept for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar.
    pub fn last(&self) -> &Bar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    /// Close of the most recent bar.
    pub fn last_price(&self) -> f64 {
        self.last().close
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.bars.iter().map(|b| b.close)
    }

    /// Check that the sequence covers a trailing window for `metric`.
    pub fn require(&self, metric: Metric, window: usize) -> std::result::Result<(), InsufficientHistory> {
        if self.bars.len() < window {
            Err(InsufficientHistory {
                metric,
                required: window,
                available: self.bars.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// Directional bias relative to the rolling mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    /// Last price strictly above the rolling mean.
    Bullish,
    /// Last price at or below the rolling mean.
    Bearish,
}

impl Bias {
    /// Classify a price against a reference mean.
    ///
    /// Equality is Bearish: only a price strictly above the mean is Bullish.
    pub fn classify(last_price: f64, mean: f64) -> Self {
        if last_price > mean {
            Bias::Bullish
        } else {
            Bias::Bearish
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
        }
    }

    pub fn is_bullish(self) -> bool {
        self == Bias::Bullish
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Two reference levels placed symmetrically around the last price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub upper: f64,
    pub lower: f64,
}

impl KeyLevels {
    /// Levels at `price ± distance`.
    pub fn around(price: f64, distance: f64) -> Self {
        Self {
            upper: price + distance,
            lower: price - distance,
        }
    }

    /// Distance from `price` to the nearer level.
    pub fn proximity(&self, price: f64) -> f64 {
        (price - self.upper).abs().min((price - self.lower).abs())
    }

    /// Display rows, upper first, prices formatted to two decimals.
    pub fn rows(&self) -> [KeyLevelRow; 2] {
        [
            KeyLevelRow {
                label: "Upper",
                price: format!("{:.2}", self.upper),
            },
            KeyLevelRow {
                label: "Lower",
                price: format!("{:.2}", self.lower),
            },
        ]
    }
}

/// One row of the key-level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyLevelRow {
    pub label: &'static str,
    pub price: String,
}

/// Volatility output of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct VolatilityReading {
    /// Average true range at the last bar.
    pub atr: f64,
    /// ATR window length.
    pub window: usize,
    /// Levels at last price ± ATR.
    pub key_levels: KeyLevels,
    /// Distance to the nearer key level.
    pub proximity: f64,
}

/// Bias output of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct BiasReading {
    /// Rolling mean of close at the last bar.
    pub rolling_mean: f64,
    /// Rolling mean window length.
    pub window: usize,
    pub bias: Bias,
    /// Placeholder confidence score in percent; carries no predictive meaning.
    pub confidence: f64,
}

/// Everything the engine derives from one bar sequence.
///
/// Each metric is kept separately so a short sequence can still show the
/// metrics it does support.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Timestamp of the last bar.
    pub ts_ms: TimestampMs,
    /// Close of the last bar.
    pub last_price: f64,
    /// Number of bars analysed.
    pub bar_count: usize,
    pub volatility: std::result::Result<VolatilityReading, InsufficientHistory>,
    pub bias: std::result::Result<BiasReading, InsufficientHistory>,
}

impl Analysis {
    /// Collapse into the strict output bundle.
    ///
    /// Fails with the first metric that lacked history.
    pub fn bundle(&self) -> Result<OutputBundle> {
        let volatility = self.volatility.as_ref().map_err(|e| Error::from(*e))?;
        let bias = self.bias.as_ref().map_err(|e| Error::from(*e))?;

        Ok(OutputBundle {
            last_price: self.last_price,
            smoothed_volatility: volatility.atr,
            key_levels: volatility.key_levels,
            proximity: volatility.proximity,
            bias: bias.bias,
            confidence: bias.confidence,
        })
    }
}

/// Final per-run output handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputBundle {
    pub last_price: f64,
    pub smoothed_volatility: f64,
    pub key_levels: KeyLevels,
    pub proximity: f64,
    pub bias: Bias,
    pub confidence: f64,
}

impl OutputBundle {
    /// Key-level table rows.
    pub fn key_level_rows(&self) -> [KeyLevelRow; 2] {
        self.key_levels.rows()
    }

    /// Status line describing the distance to the nearest key level.
    pub fn proximity_message(&self, instrument: &str) -> String {
        proximity_message(instrument, self.proximity)
    }
}

/// Format the proximity status line.
pub fn proximity_message(instrument: &str, proximity: f64) -> String {
    format!("{instrument} is {proximity:.2} pts away from nearest key level")
}
