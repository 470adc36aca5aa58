//! Volatility & bias engine.
//!
//! Combines ATR, rolling mean, confidence and key levels into one
//! [`Analysis`] per bar sequence. The engine holds configuration only; every
//! call is a pure function of its inputs and the supplied random source.

use crate::{
    atr::AverageTrueRange,
    confidence::{ConfidenceInput, ConfidenceModel, ConfidenceStrategy},
    levels::key_levels,
    rolling_mean::RollingMean,
};
use keylevel_core::{
    Analysis, Bar, BarSequence, Bias, BiasReading, Config, Error, InsufficientHistory, Metric,
    Result, VolatilityReading,
};
use rand::Rng;
use tracing::debug;

/// Volatility & bias engine.
#[derive(Debug, Clone)]
pub struct VolatilityBiasEngine {
    /// ATR window in bars.
    atr_window: usize,
    /// Rolling mean window in bars.
    mean_window: usize,
    /// Confidence strategy.
    confidence: ConfidenceModel,
}

impl VolatilityBiasEngine {
    /// Create an engine with explicit windows.
    pub fn new(atr_window: usize, mean_window: usize, confidence: ConfidenceModel) -> Result<Self> {
        if atr_window == 0 || mean_window == 0 {
            return Err(Error::config(format!(
                "windows must be at least 1 (atr_window={atr_window}, mean_window={mean_window})"
            )));
        }
        Ok(Self {
            atr_window,
            mean_window,
            confidence,
        })
    }

    /// Create an engine from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.volatility.atr_window,
            config.bias.mean_window,
            ConfidenceModel::from_config(&config.confidence),
        )
    }

    /// Validate a raw batch and analyse it.
    ///
    /// An empty batch yields [`Error::DataUnavailable`] and a batch with any
    /// malformed bar yields [`Error::MalformedBar`]; nothing is computed then.
    pub fn run<R: Rng + ?Sized>(&self, bars: Vec<Bar>, rng: &mut R) -> Result<Analysis> {
        let sequence = BarSequence::new(bars)?;
        Ok(self.analyze(&sequence, rng))
    }

    /// Analyse a validated bar sequence.
    pub fn analyze<R: Rng + ?Sized>(&self, bars: &BarSequence, rng: &mut R) -> Analysis {
        let last_price = bars.last_price();
        let volatility = self.volatility(bars);
        let atr = volatility.as_ref().ok().map(|v| v.atr);
        let bias = self.bias(bars, atr, rng);

        debug!(
            bars = bars.len(),
            last_price,
            atr = ?atr,
            bias = ?bias.as_ref().ok().map(|b| b.bias),
            "analysis complete"
        );

        Analysis {
            ts_ms: bars.last().ts_ms,
            last_price,
            bar_count: bars.len(),
            volatility,
            bias,
        }
    }

    /// ATR at the last bar, with key levels and proximity.
    pub fn volatility(
        &self,
        bars: &BarSequence,
    ) -> std::result::Result<VolatilityReading, InsufficientHistory> {
        bars.require(Metric::Volatility, self.atr_window)?;

        // At least `atr_window` bars, so the last update fills the window.
        let mut calc = AverageTrueRange::new(self.atr_window);
        let atr = bars
            .bars()
            .iter()
            .fold(0.0, |atr, bar| calc.add_bar(bar).unwrap_or(atr));

        let (levels, proximity) = key_levels(bars.last_price(), atr);

        Ok(VolatilityReading {
            atr,
            window: self.atr_window,
            key_levels: levels,
            proximity,
        })
    }

    /// Rolling mean at the last bar, the bias against it and its confidence.
    pub fn bias<R: Rng + ?Sized>(
        &self,
        bars: &BarSequence,
        atr: Option<f64>,
        rng: &mut R,
    ) -> std::result::Result<BiasReading, InsufficientHistory> {
        bars.require(Metric::Bias, self.mean_window)?;

        let mut mean = RollingMean::new(self.mean_window);
        let rolling_mean = bars
            .closes()
            .fold(0.0, |current, close| mean.add(close).unwrap_or(current));

        let last_price = bars.last_price();
        let bias = Bias::classify(last_price, rolling_mean);
        let confidence = self.confidence.score(
            &ConfidenceInput {
                bias,
                last_price,
                rolling_mean,
                atr,
            },
            rng,
        );

        Ok(BiasReading {
            rolling_mean,
            window: self.mean_window,
            bias,
            confidence,
        })
    }

    pub fn atr_window(&self) -> usize {
        self.atr_window
    }

    pub fn mean_window(&self) -> usize {
        self.mean_window
    }

    pub fn confidence_model(&self) -> &ConfidenceModel {
        &self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::rng_from_seed;

    fn default_engine() -> VolatilityBiasEngine {
        VolatilityBiasEngine::from_config(&Config::default()).unwrap()
    }

    fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::new(i as i64 * 300_000, *c, c + 0.5, c - 0.5, *c))
            .collect()
    }

    #[test]
    fn test_engine_creation() {
        let engine = default_engine();
        assert_eq!(engine.atr_window(), 14);
        assert_eq!(engine.mean_window(), 20);
        assert!(VolatilityBiasEngine::new(0, 20, ConfidenceModel::default()).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let mut rng = rng_from_seed(Some(1));
        let err = default_engine().run(Vec::new(), &mut rng).unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_volatility_only() {
        // 15 bars: enough for ATR(14), not for the 20-bar mean
        let closes: Vec<f64> = (0..15).map(|_| 100.0).collect();
        let mut rng = rng_from_seed(Some(1));
        let analysis = default_engine().run(make_bars(&closes), &mut rng).unwrap();

        let vol = analysis.volatility.as_ref().unwrap();
        assert_eq!(vol.atr, 1.0);
        assert_eq!(vol.proximity, 1.0);

        let missing = analysis.bias.as_ref().unwrap_err();
        assert_eq!(missing.metric, Metric::Bias);
        assert_eq!(missing.required, 20);
        assert_eq!(missing.available, 15);

        assert!(analysis.bundle().is_err());
    }

    #[test]
    fn test_flat_sequence_is_bearish() {
        let closes: Vec<f64> = (0..25).map(|_| 100.0).collect();
        let mut rng = rng_from_seed(Some(3));
        let analysis = default_engine().run(make_bars(&closes), &mut rng).unwrap();

        let bias = analysis.bias.as_ref().unwrap();
        assert_eq!(bias.rolling_mean, 100.0);
        assert_eq!(bias.bias, Bias::Bearish);
        assert!((30.0..=45.0).contains(&bias.confidence));
    }

    #[test]
    fn test_window_boundaries() {
        let engine = default_engine();
        let exact = BarSequence::new(make_bars(&[100.0; 14])).unwrap();
        assert_eq!(engine.volatility(&exact).unwrap().atr, 1.0);

        let short = BarSequence::new(make_bars(&[100.0; 13])).unwrap();
        let missing = engine.volatility(&short).unwrap_err();
        assert_eq!((missing.metric, missing.required, missing.available), (Metric::Volatility, 14, 13));

        let mut rng = rng_from_seed(Some(1));
        let exact = BarSequence::new(make_bars(&[100.0; 20])).unwrap();
        assert_eq!(engine.bias(&exact, Some(1.0), &mut rng).unwrap().rolling_mean, 100.0);

        let short = BarSequence::new(make_bars(&[100.0; 19])).unwrap();
        let missing = engine.bias(&short, None, &mut rng).unwrap_err();
        assert_eq!((missing.metric, missing.required, missing.available), (Metric::Bias, 20, 19));
    }
}
