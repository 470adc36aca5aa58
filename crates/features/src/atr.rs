//! True range and average true range.
//!
//! True range measures a bar's excursion including any gap from the prior
//! close; ATR is its simple moving average over a trailing window.

use crate::rolling_mean::RollingMean;
use keylevel_core::{Bar, Price};

/// True range of `bar` given the previous close.
///
/// `max(high - low, |high - prev_close|, |low - prev_close|)`
#[inline]
pub fn true_range(bar: &Bar, prev_close: f64) -> f64 {
    [
        bar.range(),
        (bar.high - prev_close).abs(),
        (bar.low - prev_close).abs(),
    ]
    .into_iter()
    .map(Price::from)
    .max()
    .map_or(bar.range(), Price::into_inner)
}

/// Streaming true range calculator.
#[derive(Debug, Default)]
pub struct TrueRange {
    /// Close of the previous bar.
    prev_close: Option<f64>,
}

impl TrueRange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bar and return its true range.
    ///
    /// The first bar has no prior close and falls back to high - low.
    pub fn add_bar(&mut self, bar: &Bar) -> f64 {
        let tr = match self.prev_close {
            Some(prev) => true_range(bar, prev),
            None => bar.range(),
        };
        self.prev_close = Some(bar.close);
        tr
    }

    pub fn clear(&mut self) {
        self.prev_close = None;
    }
}

/// Rolling average true range calculator.
pub struct AverageTrueRange {
    true_range: TrueRange,
    mean: RollingMean,
    /// Most recent true range.
    last_tr: Option<f64>,
}

impl AverageTrueRange {
    /// Create a new ATR calculator over `window` bars.
    pub fn new(window: usize) -> Self {
        Self {
            true_range: TrueRange::new(),
            mean: RollingMean::new(window),
            last_tr: None,
        }
    }

    /// Add a bar.
    ///
    /// Returns the current ATR once `window` true ranges are available.
    pub fn add_bar(&mut self, bar: &Bar) -> Option<f64> {
        let tr = self.true_range.add_bar(bar);
        self.last_tr = Some(tr);
        self.mean.add(tr)
    }

    /// Current ATR.
    pub fn atr(&self) -> Option<f64> {
        self.mean.mean()
    }

    /// Most recent true range.
    pub fn last_true_range(&self) -> Option<f64> {
        self.last_tr
    }

    /// Check if the window is full.
    pub fn is_ready(&self) -> bool {
        self.mean.is_ready()
    }

    /// Window size.
    pub fn window(&self) -> usize {
        self.mean.window()
    }

    /// Clear all data.
    pub fn clear(&mut self) {
        self.true_range.clear();
        self.mean.clear();
        self.last_tr = None;
    }
}

/// True range for every bar; index 0 uses high - low.
pub fn true_range_series(bars: &[Bar]) -> Vec<f64> {
    let mut tr = TrueRange::new();
    bars.iter().map(|b| tr.add_bar(b)).collect()
}

/// ATR aligned per bar; `None` for the first `window - 1` bars.
pub fn atr_series(bars: &[Bar], window: usize) -> Vec<Option<f64>> {
    let mut atr = AverageTrueRange::new(window);
    bars.iter().map(|b| atr.add_bar(b)).collect()
}
