//! Display model.
//!
//! [`DashboardView`] is built from the outcome of one refresh and holds every
//! string either renderer shows. Renderers only pick colours and layout.

use keylevel_core::{
    ts_to_datetime, Analysis, Config, Error, InsufficientHistory, KeyLevelRow, LookbackPeriod,
    Result, SampleInterval,
};
use serde::Serialize;

pub const LAST_PRICE: &str = "Last Price";
pub const MARKET_BIAS: &str = "Market Bias";
pub const BIAS_CONFIDENCE: &str = "Bias Confidence (%)";

/// Semantic colour of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
    Warning,
    Error,
}

/// What the last refresh produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum ViewState {
    /// No refresh has completed yet.
    Loading,
    /// Every metric computed.
    Ready,
    /// Some metric lacked history.
    Partial,
    /// The source returned no bars.
    NoData,
    /// Fetch, validation or configuration failed.
    Failed(String),
}

/// One labelled value in the metric row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl MetricCard {
    fn new(label: impl Into<String>, value: impl Into<String>, tone: Tone) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone,
        }
    }

    fn insufficient(label: impl Into<String>, missing: &InsufficientHistory) -> Self {
        Self::new(label, insufficient_text(missing), Tone::Warning)
    }
}

/// A line of text with its tone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: Tone,
}

/// Everything shown on one screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub title: String,
    pub subtitle: String,
    pub footer: String,
    pub symbol: String,
    pub period: LookbackPeriod,
    pub interval: SampleInterval,
    pub state: ViewState,
    pub metrics: Vec<MetricCard>,
    pub key_levels: Vec<KeyLevelRow>,
    pub status: StatusLine,
    /// Time of the last bar, formatted.
    pub as_of: Option<String>,
    pub bar_count: usize,
}

fn insufficient_text(missing: &InsufficientHistory) -> String {
    format!(
        "insufficient data, need >= {} bars (have {})",
        missing.required, missing.available
    )
}

fn atr_label(window: usize) -> String {
    format!("Average True Range ({window})")
}

impl DashboardView {
    fn empty(config: &Config, state: ViewState, status: StatusLine) -> Self {
        let dashboard = &config.dashboard;
        Self {
            title: dashboard.title.clone(),
            subtitle: dashboard.subtitle.clone(),
            footer: dashboard.footer.clone(),
            symbol: config.instrument.symbol.clone(),
            period: config.instrument.lookback,
            interval: config.instrument.interval,
            state,
            metrics: Vec::new(),
            key_levels: Vec::new(),
            status,
            as_of: None,
            bar_count: 0,
        }
    }

    /// View shown before the first refresh completes.
    pub fn loading(config: &Config) -> Self {
        Self::empty(
            config,
            ViewState::Loading,
            StatusLine {
                text: format!("Fetching {}...", config.instrument.symbol),
                tone: Tone::Neutral,
            },
        )
    }

    /// Build the view for one refresh outcome.
    pub fn build(config: &Config, outcome: &Result<Analysis>) -> Self {
        match outcome {
            Ok(analysis) => Self::from_analysis(config, analysis),
            Err(Error::DataUnavailable) => Self::empty(
                config,
                ViewState::NoData,
                StatusLine {
                    text: format!(
                        "No data for {} ({}/{})",
                        config.instrument.symbol,
                        config.instrument.lookback,
                        config.instrument.interval
                    ),
                    tone: Tone::Warning,
                },
            ),
            Err(e) => Self::empty(
                config,
                ViewState::Failed(e.to_string()),
                StatusLine {
                    text: e.to_string(),
                    tone: Tone::Error,
                },
            ),
        }
    }

    fn from_analysis(config: &Config, analysis: &Analysis) -> Self {
        let display_name = &config.instrument.display_name;
        let mut metrics = vec![MetricCard::new(
            LAST_PRICE,
            format!("{:.2}", analysis.last_price),
            Tone::Neutral,
        )];
        let mut key_levels = Vec::new();

        let status = match &analysis.volatility {
            Ok(vol) => {
                metrics.push(MetricCard::new(atr_label(vol.window), format!("{:.2}", vol.atr), Tone::Neutral));
                key_levels.extend(vol.key_levels.rows());
                StatusLine {
                    text: keylevel_core::proximity_message(display_name, vol.proximity),
                    tone: Tone::Positive,
                }
            }
            Err(missing) => {
                metrics.push(MetricCard::insufficient(atr_label(missing.required), missing));
                StatusLine {
                    text: format!("No key levels for {display_name}: {}", insufficient_text(missing)),
                    tone: Tone::Warning,
                }
            }
        };

        match &analysis.bias {
            Ok(reading) => {
                let tone = if reading.bias.is_bullish() {
                    Tone::Positive
                } else {
                    Tone::Negative
                };
                metrics.push(MetricCard::new(MARKET_BIAS, reading.bias.label(), tone));
                metrics.push(MetricCard::new(
                    BIAS_CONFIDENCE,
                    format!("{:.2}%", reading.confidence),
                    Tone::Neutral,
                ));
            }
            Err(missing) => {
                metrics.push(MetricCard::insufficient(MARKET_BIAS, missing));
                metrics.push(MetricCard::new(BIAS_CONFIDENCE, "-", Tone::Neutral));
            }
        }

        let state = if analysis.volatility.is_ok() && analysis.bias.is_ok() {
            ViewState::Ready
        } else {
            ViewState::Partial
        };

        Self {
            state,
            metrics,
            key_levels,
            as_of: ts_to_datetime(analysis.ts_ms).map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string()),
            bar_count: analysis.bar_count,
            ..Self::empty(config, ViewState::Loading, status)
        }
    }

    /// Header line naming the instrument and selection.
    pub fn selection(&self) -> String {
        format!("{}  period {}  interval {}", self.symbol, self.period, self.interval)
    }

    /// Card with the given label, if present.
    pub fn metric(&self, label: &str) -> Option<&MetricCard> {
        self.metrics.iter().find(|m| m.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylevel_core::Bar;
    use keylevel_features::confidence::rng_from_seed;
    use keylevel_features::VolatilityBiasEngine;

    const START_MS: i64 = 1_700_000_000_000;

    fn analysis(closes: impl IntoIterator<Item = f64>) -> Result<Analysis> {
        let bars = closes
            .into_iter()
            .enumerate()
            .map(|(i, c)| Bar::new(START_MS + i as i64 * 300_000, c, c + 0.5, c - 0.5, c))
            .collect();
        let engine = VolatilityBiasEngine::from_config(&Config::default())?;
        engine.run(bars, &mut rng_from_seed(Some(3)))
    }

    #[test]
    fn test_ready_view() {
        let config = Config::default();
        let view = DashboardView::build(&config, &analysis((100..120).map(f64::from)));

        assert_eq!(view.state, ViewState::Ready);
        assert_eq!(view.bar_count, 20);
        assert_eq!(view.metric(LAST_PRICE).unwrap().value, "119.00");

        let atr = view.metric("Average True Range (14)").unwrap();
        assert_eq!(atr.value, "1.50");

        let bias = view.metric(MARKET_BIAS).unwrap();
        assert_eq!(bias.value, "Bullish");
        assert_eq!(bias.tone, Tone::Positive);

        let confidence = view.metric(BIAS_CONFIDENCE).unwrap();
        assert!(confidence.value.ends_with('%'));

        assert_eq!(view.key_levels.len(), 2);
        assert_eq!(view.key_levels[0].price, "120.50");
        assert_eq!(view.key_levels[1].price, "117.50");
        assert_eq!(view.status.text, "NQ is 1.50 pts away from nearest key level");
        assert_eq!(view.as_of.as_deref(), Some("2023-11-14 23:48 UTC"));
    }

    #[test]
    fn test_partial_view() {
        let config = Config::default();
        let view = DashboardView::build(&config, &analysis((0..15).map(|_| 100.0)));

        assert_eq!(view.state, ViewState::Partial);
        assert_eq!(view.metric("Average True Range (14)").unwrap().value, "1.00");
        assert_eq!(view.key_levels.len(), 2);

        let bias = view.metric(MARKET_BIAS).unwrap();
        assert_eq!(bias.tone, Tone::Warning);
        assert_eq!(bias.value, "insufficient data, need >= 20 bars (have 15)");
        assert_eq!(view.metric(BIAS_CONFIDENCE).unwrap().value, "-");
    }

    #[test]
    fn test_short_history_has_no_key_levels() {
        let config = Config::default();
        let view = DashboardView::build(&config, &analysis((0..10).map(|_| 100.0)));

        assert_eq!(view.state, ViewState::Partial);
        assert!(view.key_levels.is_empty());
        assert_eq!(view.status.tone, Tone::Warning);
        assert!(view.status.text.contains("need >= 14 bars"));
    }

    #[test]
    fn test_no_data_view() {
        let config = Config::default();
        let view = DashboardView::build(&config, &Err(Error::DataUnavailable));

        assert_eq!(view.state, ViewState::NoData);
        assert!(view.metrics.is_empty());
        assert_eq!(view.status.text, "No data for NQ=F (1d/5m)");
    }

    #[test]
    fn test_failed_view() {
        let config = Config::default();
        let view = DashboardView::build(&config, &Err(Error::source("unknown symbol 'ZZ=F'")));

        assert!(matches!(view.state, ViewState::Failed(_)));
        assert_eq!(view.status.tone, Tone::Error);
        assert_eq!(view.status.text, "Data source error: unknown symbol 'ZZ=F'");
    }

    #[test]
    fn test_loading_view() {
        let view = DashboardView::loading(&Config::default());
        assert_eq!(view.state, ViewState::Loading);
        assert_eq!(view.selection(), "NQ=F  period 1d  interval 5m");
        assert_eq!(view.title, "Virtuflore Investments");
    }
}
