//! Bias confidence scoring.
//!
//! The score is a display placeholder: it carries no predictive meaning. Two
//! strategies are available. `UniformBand` draws uniformly inside the band
//! for the bias (the random source is injected, so a seeded generator gives
//! reproducible output). `DistanceScaled` is deterministic and maps how far
//! price sits from its rolling mean onto the same band.

use keylevel_core::config::{ConfidenceBand, ConfidenceConfig, ConfidenceStrategyKind};
use keylevel_core::Bias;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inputs available to a confidence strategy.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInput {
    pub bias: Bias,
    pub last_price: f64,
    pub rolling_mean: f64,
    /// ATR at the last bar, when enough history exists.
    pub atr: Option<f64>,
}

/// Produces a confidence percentage for a classified bias.
pub trait ConfidenceStrategy {
    /// Score in percent; always within the band for `input.bias`.
    fn score<R: Rng + ?Sized>(&self, input: &ConfidenceInput, rng: &mut R) -> f64;
}

/// Band lookup shared by both strategies.
#[derive(Debug, Clone, Copy)]
pub struct Bands {
    pub bullish: ConfidenceBand,
    pub bearish: ConfidenceBand,
}

impl Bands {
    pub fn for_bias(&self, bias: Bias) -> ConfidenceBand {
        match bias {
            Bias::Bullish => self.bullish,
            Bias::Bearish => self.bearish,
        }
    }
}

impl Default for Bands {
    fn default() -> Self {
        let config = ConfidenceConfig::default();
        Self {
            bullish: config.bullish_band,
            bearish: config.bearish_band,
        }
    }
}

/// Round to two decimals, kept inside the band.
fn round_in_band(value: f64, band: ConfidenceBand) -> f64 {
    ((value * 100.0).round() / 100.0).clamp(band.low, band.high)
}

/// Uniform draw inside the band for the bias.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformBand {
    pub bands: Bands,
}

impl ConfidenceStrategy for UniformBand {
    fn score<R: Rng + ?Sized>(&self, input: &ConfidenceInput, rng: &mut R) -> f64 {
        let band = self.bands.for_bias(input.bias);
        let value = rng.random_range(band.low..=band.high);
        round_in_band(value, band)
    }
}

/// Deterministic score from the distance between price and rolling mean.
///
/// The distance is measured in ATR units, or in percent of the mean when no
/// ATR is available, and clamped to [0, 1]. Bullish scores rise from the low
/// end of their band with distance; bearish scores fall from the high end.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceScaled {
    pub bands: Bands,
}

impl DistanceScaled {
    /// Normalised distance in [0, 1].
    pub fn distance(input: &ConfidenceInput) -> f64 {
        let gap = (input.last_price - input.rolling_mean).abs();
        let unit = match input.atr {
            Some(atr) if atr > 0.0 => atr,
            _ => input.rolling_mean.abs() * 0.01,
        };
        if unit > 0.0 && unit.is_finite() {
            (gap / unit).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl ConfidenceStrategy for DistanceScaled {
    fn score<R: Rng + ?Sized>(&self, input: &ConfidenceInput, _rng: &mut R) -> f64 {
        let band = self.bands.for_bias(input.bias);
        let d = Self::distance(input);
        let width = band.high - band.low;
        let value = match input.bias {
            Bias::Bullish => band.low + width * d,
            Bias::Bearish => band.high - width * d,
        };
        round_in_band(value, band)
    }
}

/// Strategy selected from configuration.
#[derive(Debug, Clone, Copy)]
pub enum ConfidenceModel {
    Uniform(UniformBand),
    DistanceScaled(DistanceScaled),
}

impl ConfidenceModel {
    /// Build the configured strategy.
    pub fn from_config(config: &ConfidenceConfig) -> Self {
        let bands = Bands {
            bullish: config.bullish_band,
            bearish: config.bearish_band,
        };
        match config.strategy {
            ConfidenceStrategyKind::Uniform => ConfidenceModel::Uniform(UniformBand { bands }),
            ConfidenceStrategyKind::DistanceScaled => {
                ConfidenceModel::DistanceScaled(DistanceScaled { bands })
            }
        }
    }

    pub fn bands(&self) -> Bands {
        match self {
            ConfidenceModel::Uniform(s) => s.bands,
            ConfidenceModel::DistanceScaled(s) => s.bands,
        }
    }
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        ConfidenceModel::Uniform(UniformBand::default())
    }
}

impl ConfidenceStrategy for ConfidenceModel {
    fn score<R: Rng + ?Sized>(&self, input: &ConfidenceInput, rng: &mut R) -> f64 {
        match self {
            ConfidenceModel::Uniform(s) => s.score(input, rng),
            ConfidenceModel::DistanceScaled(s) => s.score(input, rng),
        }
    }
}

/// Random source for confidence draws: seeded when a seed is configured.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn input(bias: Bias, last_price: f64, rolling_mean: f64, atr: Option<f64>) -> ConfidenceInput {
        ConfidenceInput {
            bias,
            last_price,
            rolling_mean,
            atr,
        }
    }

    #[test]
    fn test_uniform_within_bands() {
        let strategy = UniformBand::default();
        let mut rng = rng_from_seed(Some(42));

        for _ in 0..1000 {
            let bull = strategy.score(&input(Bias::Bullish, 101.0, 100.0, None), &mut rng);
            assert!((55.0..=70.0).contains(&bull), "bullish {bull}");

            let bear = strategy.score(&input(Bias::Bearish, 99.0, 100.0, None), &mut rng);
            assert!((30.0..=45.0).contains(&bear), "bearish {bear}");
        }
    }

    #[test]
    fn test_uniform_two_decimals() {
        let strategy = UniformBand::default();
        let mut rng = rng_from_seed(Some(1));
        let score = strategy.score(&input(Bias::Bullish, 101.0, 100.0, None), &mut rng);
        assert_relative_eq!(score * 100.0, (score * 100.0).round(), epsilon = 1e-6);
    }

    #[test]
    fn test_uniform_seed_reproducible() {
        let strategy = ConfidenceModel::default();
        let i = input(Bias::Bullish, 101.0, 100.0, Some(1.0));

        let a: Vec<f64> = {
            let mut rng = rng_from_seed(Some(7));
            (0..5).map(|_| strategy.score(&i, &mut rng)).collect()
        };
        let b: Vec<f64> = {
            let mut rng = rng_from_seed(Some(7));
            (0..5).map(|_| strategy.score(&i, &mut rng)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_distance_scaled() {
        let strategy = DistanceScaled::default();
        let mut rng = rng_from_seed(Some(0));

        // Half an ATR above the mean
        let bull = strategy.score(&input(Bias::Bullish, 101.0, 100.0, Some(2.0)), &mut rng);
        assert_relative_eq!(bull, 62.5);

        // Far below the mean saturates at the low end of the bearish band
        let bear = strategy.score(&input(Bias::Bearish, 90.0, 100.0, Some(2.0)), &mut rng);
        assert_relative_eq!(bear, 30.0);

        // At the mean: bearish tie scores the top of its band
        let tie = strategy.score(&input(Bias::Bearish, 100.0, 100.0, Some(2.0)), &mut rng);
        assert_relative_eq!(tie, 45.0);
    }

    #[test]
    fn test_distance_without_atr() {
        // 0.5% of the mean away from it, with 1% saturating
        let d = DistanceScaled::distance(&input(Bias::Bullish, 100.5, 100.0, None));
        assert_relative_eq!(d, 0.5, epsilon = 1e-9);

        let d = DistanceScaled::distance(&input(Bias::Bullish, 1.0, 0.0, Some(0.0)));
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_from_config() {
        let mut config = ConfidenceConfig::default();
        config.strategy = ConfidenceStrategyKind::DistanceScaled;
        config.bullish_band = ConfidenceBand::new(60.0, 80.0);

        let model = ConfidenceModel::from_config(&config);
        assert!(matches!(model, ConfidenceModel::DistanceScaled(_)));
        assert_eq!(model.bands().bullish, ConfidenceBand::new(60.0, 80.0));

        let mut rng = rng_from_seed(None);
        let score = model.score(&input(Bias::Bullish, 200.0, 100.0, Some(1.0)), &mut rng);
        assert_relative_eq!(score, 80.0);
    }
}
