//! End-to-end: raw bars -> validated sequence -> engine -> output bundle.

use approx::assert_relative_eq;
use keylevel_core::config::ConfidenceStrategyKind;
use keylevel_core::{Bar, BarSequence, Bias, Config, Error, Metric};
use keylevel_features::atr::atr_series;
use keylevel_features::confidence::rng_from_seed;
use keylevel_features::rolling_mean::rolling_mean_series;
use keylevel_features::VolatilityBiasEngine;

const FIVE_MIN_MS: i64 = 300_000;

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| Bar::new(1_700_000_000_000 + i as i64 * FIVE_MIN_MS, *c, c + 0.5, c - 0.5, *c))
        .collect()
}

fn engine() -> VolatilityBiasEngine {
    VolatilityBiasEngine::from_config(&Config::default()).unwrap()
}

#[test]
fn rising_closes_are_bullish() {
    let closes: Vec<f64> = (100..120).map(f64::from).collect();
    let mut rng = rng_from_seed(Some(11));
    let analysis = engine().run(bars_from_closes(&closes), &mut rng).unwrap();
    let bundle = analysis.bundle().unwrap();

    assert_eq!(bundle.last_price, 119.0);
    assert_eq!(bundle.bias, Bias::Bullish);
    assert!((55.0..=70.0).contains(&bundle.confidence));

    let bias = analysis.bias.as_ref().unwrap();
    assert_relative_eq!(bias.rolling_mean, 109.5, epsilon = 1e-9);

    // Every bar gaps up by 1 from the prior close, so the true range is 1.5.
    assert_relative_eq!(bundle.smoothed_volatility, 1.5, epsilon = 1e-12);
}

#[test]
fn atr_defined_and_non_negative_after_warmup() {
    let closes = [
        100.0, 101.5, 99.0, 102.25, 98.5, 100.0, 103.0, 97.75, 101.0, 99.5, 104.0, 96.5, 100.25,
        102.0, 98.0, 101.0, 99.25, 100.75,
    ];
    let bars = bars_from_closes(&closes);
    let series = atr_series(&bars, 14);

    assert!(series[..13].iter().all(Option::is_none));
    for atr in &series[13..] {
        assert!(atr.unwrap() >= 0.0);
    }
}

#[test]
fn key_levels_identity_holds() {
    let closes: Vec<f64> = (100..130).map(f64::from).collect();
    let mut rng = rng_from_seed(Some(5));
    let bundle = engine().run(bars_from_closes(&closes), &mut rng).unwrap().bundle().unwrap();

    assert_eq!(bundle.key_levels.upper - bundle.last_price, bundle.smoothed_volatility);
    assert_eq!(bundle.last_price - bundle.key_levels.lower, bundle.smoothed_volatility);
    assert_eq!(bundle.proximity, bundle.smoothed_volatility);
}

#[test]
fn proximity_equals_atr_at_futures_prices() {
    let bars: Vec<Bar> = (0..20)
        .map(|i| {
            let close = 21_347.37 + (i % 5) as f64 * 0.37 - (i % 3) as f64 * 0.61;
            Bar::new(1_700_000_000_000 + i as i64 * FIVE_MIN_MS, close, close + 1.13, close - 0.87, close)
        })
        .collect();
    let mut rng = rng_from_seed(Some(1));
    let bundle = engine().run(bars, &mut rng).unwrap().bundle().unwrap();

    assert_eq!(bundle.proximity, bundle.smoothed_volatility);
    assert_relative_eq!(bundle.key_levels.upper - bundle.last_price, bundle.smoothed_volatility, epsilon = 1e-9);
    assert_relative_eq!(bundle.last_price - bundle.key_levels.lower, bundle.smoothed_volatility, epsilon = 1e-9);
}

#[test]
fn price_equal_to_mean_is_bearish() {
    let closes: Vec<f64> = (0..20).map(|_| 250.0).collect();
    let mut rng = rng_from_seed(Some(2));
    let bundle = engine().run(bars_from_closes(&closes), &mut rng).unwrap().bundle().unwrap();

    let means = rolling_mean_series(closes.iter().copied(), 20);
    assert_eq!(means[19], Some(bundle.last_price));
    assert_eq!(bundle.bias, Bias::Bearish);
    assert!((30.0..=45.0).contains(&bundle.confidence));
}

#[test]
fn price_strictly_above_mean_is_bullish() {
    let mut closes: Vec<f64> = (0..19).map(|_| 250.0).collect();
    closes.push(250.25);
    let mut rng = rng_from_seed(Some(2));
    let bundle = engine().run(bars_from_closes(&closes), &mut rng).unwrap().bundle().unwrap();
    assert_eq!(bundle.bias, Bias::Bullish);
}

#[test]
fn confidence_bands_hold_across_runs() {
    let rising: Vec<f64> = (100..125).map(f64::from).collect();
    let falling: Vec<f64> = (100..125).rev().map(f64::from).collect();
    let engine = engine();
    let mut rng = rng_from_seed(Some(99));

    for _ in 0..200 {
        let bull = engine.run(bars_from_closes(&rising), &mut rng).unwrap().bundle().unwrap();
        assert_eq!(bull.bias, Bias::Bullish);
        assert!((55.0..=70.0).contains(&bull.confidence));

        let bear = engine.run(bars_from_closes(&falling), &mut rng).unwrap().bundle().unwrap();
        assert_eq!(bear.bias, Bias::Bearish);
        assert!((30.0..=45.0).contains(&bear.confidence));
    }
}

#[test]
fn fixed_seed_is_reproducible() {
    let closes: Vec<f64> = (100..125).map(f64::from).collect();
    let engine = engine();

    let first = engine
        .run(bars_from_closes(&closes), &mut rng_from_seed(Some(1234)))
        .unwrap()
        .bundle()
        .unwrap();
    let second = engine
        .run(bars_from_closes(&closes), &mut rng_from_seed(Some(1234)))
        .unwrap()
        .bundle()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn distance_scaled_strategy_is_deterministic() {
    let mut config = Config::default();
    config.confidence.strategy = ConfidenceStrategyKind::DistanceScaled;
    let engine = VolatilityBiasEngine::from_config(&config).unwrap();

    let closes: Vec<f64> = (100..125).map(f64::from).collect();
    let a = engine.run(bars_from_closes(&closes), &mut rng_from_seed(Some(1))).unwrap();
    let b = engine.run(bars_from_closes(&closes), &mut rng_from_seed(Some(2))).unwrap();

    let a = a.bundle().unwrap();
    let b = b.bundle().unwrap();
    assert_eq!(a.confidence, b.confidence);
    // Last close sits far more than one ATR above the mean.
    assert_eq!(a.confidence, 70.0);
}

#[test]
fn empty_sequence_reports_no_data() {
    let mut rng = rng_from_seed(Some(1));
    let err = engine().run(Vec::new(), &mut rng).unwrap_err();
    assert!(matches!(err, Error::DataUnavailable));
}

#[test]
fn ten_bars_report_insufficient_history_for_both_metrics() {
    let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
    let mut rng = rng_from_seed(Some(1));
    let analysis = engine().run(bars_from_closes(&closes), &mut rng).unwrap();

    let vol = analysis.volatility.as_ref().unwrap_err();
    assert_eq!(vol.metric, Metric::Volatility);
    assert_eq!((vol.required, vol.available), (14, 10));

    let bias = analysis.bias.as_ref().unwrap_err();
    assert_eq!(bias.metric, Metric::Bias);
    assert_eq!((bias.required, bias.available), (20, 10));

    assert!(matches!(analysis.bundle(), Err(Error::InsufficientHistory(_))));
}

#[test]
fn malformed_bar_rejects_batch() {
    let mut bars = bars_from_closes(&(0..20).map(|_| 100.0).collect::<Vec<_>>());
    bars[7].high = bars[7].low - 1.0;

    let mut rng = rng_from_seed(Some(1));
    match engine().run(bars, &mut rng).unwrap_err() {
        Error::MalformedBar { index, .. } => assert_eq!(index, 7),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn analyze_validated_sequence() {
    let closes: Vec<f64> = (100..120).map(f64::from).collect();
    let sequence = BarSequence::new(bars_from_closes(&closes)).unwrap();
    let analysis = engine().analyze(&sequence, &mut rng_from_seed(Some(8)));

    assert_eq!(analysis.bar_count, 20);
    assert_eq!(analysis.ts_ms, sequence.last().ts_ms);
}
