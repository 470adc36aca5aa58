//! Configuration structures for the keylevel-tracker system.

use crate::error::{Error, Result};
use crate::types::{LookbackPeriod, SampleInterval};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instrument and history selection.
    pub instrument: InstrumentConfig,
    /// ATR configuration.
    pub volatility: VolatilityConfig,
    /// Rolling mean configuration.
    pub bias: BiasConfig,
    /// Confidence score configuration.
    pub confidence: ConfidenceConfig,
    /// Market data source configuration.
    pub source: SourceConfig,
    /// Dashboard configuration.
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Parse a TOML document. Missing sections and fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.instrument.symbol.trim().is_empty() {
            return Err(Error::config("instrument.symbol must not be empty"));
        }
        if self.volatility.atr_window == 0 {
            return Err(Error::config("volatility.atr_window must be at least 1"));
        }
        if self.bias.mean_window == 0 {
            return Err(Error::config("bias.mean_window must be at least 1"));
        }
        self.confidence.bullish_band.validate("confidence.bullish_band")?;
        self.confidence.bearish_band.validate("confidence.bearish_band")?;
        if self.source.timeout_secs == 0 {
            return Err(Error::config("source.timeout_secs must be at least 1"));
        }
        if self.dashboard.refresh_secs == 0 {
            return Err(Error::config("dashboard.refresh_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Data source symbol (e.g., "NQ=F").
    pub symbol: String,
    /// Short name used in messages (e.g., "NQ").
    pub display_name: String,
    /// History to request.
    pub lookback: LookbackPeriod,
    /// Bar spacing.
    pub interval: SampleInterval,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "NQ=F".to_string(),
            display_name: "NQ".to_string(),
            lookback: LookbackPeriod::OneDay,
            interval: SampleInterval::FiveMinutes,
        }
    }
}

/// Average true range configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// ATR window in bars.
    pub atr_window: usize,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self { atr_window: 14 }
    }
}

/// Rolling mean configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasConfig {
    /// Rolling mean window in bars.
    pub mean_window: usize,
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self { mean_window: 20 }
    }
}

/// Which confidence strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceStrategyKind {
    /// Uniform draw inside the band for the bias.
    #[default]
    Uniform,
    /// Deterministic: distance from the mean in ATR units mapped onto the band.
    DistanceScaled,
}

/// Closed percentage interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceBand {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Is `value` inside the band (inclusive)?
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.low.is_finite() && self.high.is_finite()) {
            return Err(Error::config(format!("{name} must be finite")));
        }
        if self.low > self.high {
            return Err(Error::config(format!(
                "{name}: low {} exceeds high {}",
                self.low, self.high
            )));
        }
        if self.low < 0.0 || self.high > 100.0 {
            return Err(Error::config(format!("{name} must lie within [0, 100]")));
        }
        Ok(())
    }
}

/// Confidence score configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub strategy: ConfidenceStrategyKind,
    /// Fixed seed for reproducible uniform draws.
    pub seed: Option<u64>,
    pub bullish_band: ConfidenceBand,
    pub bearish_band: ConfidenceBand,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            strategy: ConfidenceStrategyKind::Uniform,
            seed: None,
            bullish_band: ConfidenceBand::new(55.0, 70.0),
            bearish_band: ConfidenceBand::new(30.0, 45.0),
        }
    }
}

/// Market data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Chart API base URL.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Cache time-to-live in seconds (0 disables the cache).
    pub cache_ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            cache_ttl_secs: 30,
        }
    }
}

/// Dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub subtitle: String,
    pub footer: String,
    /// Auto-refresh interval in seconds.
    pub refresh_secs: u64,
    /// Log file used while the terminal dashboard owns the screen.
    pub log_file: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Virtuflore Investments".to_string(),
            subtitle: "NASDAQ Futures Key Level Probability Tracker".to_string(),
            footer: "Virtuflore Investments © 2025".to_string(),
            refresh_secs: 60,
            log_file: "keylevel.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.instrument.symbol, "NQ=F");
        assert_eq!(config.instrument.lookback, LookbackPeriod::OneDay);
        assert_eq!(config.instrument.interval, SampleInterval::FiveMinutes);
        assert_eq!(config.volatility.atr_window, 14);
        assert_eq!(config.bias.mean_window, 20);
        assert_eq!(config.confidence.bullish_band, ConfidenceBand::new(55.0, 70.0));
        assert_eq!(config.confidence.bearish_band, ConfidenceBand::new(30.0, 45.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [instrument]
            lookback = "5d"
            interval = "15m"

            [confidence]
            strategy = "distance_scaled"
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.instrument.symbol, "NQ=F");
        assert_eq!(config.instrument.lookback, LookbackPeriod::FiveDays);
        assert_eq!(config.instrument.interval, SampleInterval::FifteenMinutes);
        assert_eq!(config.confidence.strategy, ConfidenceStrategyKind::DistanceScaled);
        assert_eq!(config.confidence.seed, Some(7));
        assert_eq!(config.volatility.atr_window, 14);
    }

    #[test]
    fn test_rejects_unknown_period() {
        let err = Config::from_toml_str("[instrument]\nlookback = \"1y\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_rejects_inverted_band() {
        let err = Config::from_toml_str(
            "[confidence]\nbullish_band = { low = 70.0, high = 55.0 }\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_window() {
        let mut config = Config::default();
        config.volatility.atr_window = 0;
        assert!(config.validate().is_err());
    }
}
