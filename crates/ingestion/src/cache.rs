//! Time-to-live cache in front of a bar source.
//!
//! Entries are keyed by the full request (symbol, lookback, interval) and
//! expire `ttl` after they were fetched. A zero TTL disables caching. Failed
//! fetches are never cached.

use crate::source::{BarRequest, BarSource, SourceError};
use async_trait::async_trait;
use keylevel_core::Bar;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    fetched_at: Instant,
    bars: Vec<Bar>,
}

/// Caching wrapper around any [`BarSource`].
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: Mutex<HashMap<BarRequest, CacheEntry>>,
}

impl<S: BarSource> CachedSource<S> {
    /// Wrap `inner` with a cache of the given time-to-live.
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop the cached entry for `request`, forcing the next fetch through.
    pub async fn invalidate(&self, request: &BarRequest) {
        self.entries.lock().await.remove(request);
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of live (unexpired) entries.
    pub async fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| now.duration_since(e.fetched_at) < self.ttl)
            .count()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BarSource> BarSource for CachedSource<S> {
    async fn fetch_bars(&self, request: &BarRequest) -> Result<Vec<Bar>, SourceError> {
        if self.ttl.is_zero() {
            return self.inner.fetch_bars(request).await;
        }

        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(request) {
                let age = entry.fetched_at.elapsed();
                if age < self.ttl {
                    debug!(%request, age_ms = age.as_millis() as u64, "cache hit");
                    return Ok(entry.bars.clone());
                }
            }
        }

        let bars = self.inner.fetch_bars(request).await?;
        self.entries.lock().await.insert(
            request.clone(),
            CacheEntry {
                fetched_at: Instant::now(),
                bars: bars.clone(),
            },
        );
        Ok(bars)
    }
}
