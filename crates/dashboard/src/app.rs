//! Dashboard session state.
//!
//! One [`App`] owns the config, the engine, the cached source and the random
//! source for the confidence draw. Each refresh fetches, validates, analyses
//! and rebuilds the [`DashboardView`].

use crate::view::DashboardView;
use chrono::{DateTime, Utc};
use keylevel_core::{Analysis, Config, Result};
use keylevel_features::confidence::rng_from_seed;
use keylevel_features::VolatilityBiasEngine;
use keylevel_ingestion::{fetch_sequence, BarRequest, BarSource, CachedSource};
use rand::rngs::StdRng;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct App<S> {
    config: Config,
    engine: VolatilityBiasEngine,
    source: CachedSource<S>,
    rng: StdRng,
    view: DashboardView,
    last_refresh: Option<DateTime<Utc>>,
}

impl<S: BarSource> App<S> {
    /// Create a session over `source`, wrapped in the configured cache.
    pub fn new(config: Config, source: S) -> Result<Self> {
        config.validate()?;
        let engine = VolatilityBiasEngine::from_config(&config)?;
        let source = CachedSource::new(source, Duration::from_secs(config.source.cache_ttl_secs));
        let rng = rng_from_seed(config.confidence.seed);
        let view = DashboardView::loading(&config);

        info!(
            symbol = %config.instrument.symbol,
            period = %config.instrument.lookback,
            interval = %config.instrument.interval,
            seeded = config.confidence.seed.is_some(),
            "dashboard session created"
        );

        Ok(Self {
            config,
            engine,
            source,
            rng,
            view,
            last_refresh: None,
        })
    }

    /// Request for the current selection.
    pub fn request(&self) -> BarRequest {
        BarRequest::from_config(&self.config)
    }

    /// Fetch and analyse the current selection.
    pub async fn analyze(&mut self) -> Result<Analysis> {
        let request = self.request();
        let sequence = fetch_sequence(&self.source, &request).await?;
        Ok(self.engine.analyze(&sequence, &mut self.rng))
    }

    /// Refresh the view. Errors end up in the view, never in the caller.
    pub async fn refresh(&mut self) -> &DashboardView {
        let outcome = self.analyze().await;
        match &outcome {
            Ok(analysis) => debug!(bars = analysis.bar_count, last_price = analysis.last_price, "refreshed"),
            Err(e) => warn!(request = %self.request(), error = %e, "refresh failed"),
        }
        self.view = DashboardView::build(&self.config, &outcome);
        self.last_refresh = Some(Utc::now());
        &self.view
    }

    /// Drop the cached bars for the current selection, then refresh.
    pub async fn force_refresh(&mut self) -> &DashboardView {
        self.source.invalidate(&self.request()).await;
        self.refresh().await
    }

    /// Move to the next lookback period. Takes effect on the next refresh.
    pub fn cycle_period(&mut self) {
        self.config.instrument.lookback = self.config.instrument.lookback.next();
        self.view = DashboardView::loading(&self.config);
    }

    /// Move to the next bar interval. Takes effect on the next refresh.
    pub fn cycle_interval(&mut self) {
        self.config.instrument.interval = self.config.instrument.interval.next();
        self.view = DashboardView::loading(&self.config);
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    /// Auto-refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.config.dashboard.refresh_secs)
    }
}
