//! Validation of fetched bar batches.
//!
//! A batch either becomes a [`BarSequence`] as a whole or is rejected as a
//! whole: an empty batch is "no data", and a single bad bar (broken OHLC
//! ordering, non-finite price, non-increasing timestamp) rejects the batch.

use crate::source::{BarRequest, BarSource};
use keylevel_core::{Bar, BarSequence, Error, Result};
use tracing::{debug, warn};

/// Validate a fetched batch into a sequence.
pub fn validate_bars(bars: Vec<Bar>) -> Result<BarSequence> {
    let count = bars.len();
    match BarSequence::new(bars) {
        Ok(sequence) => {
            debug!(bars = count, "batch validated");
            Ok(sequence)
        }
        Err(Error::MalformedBar { index, reason }) => {
            warn!(index, %reason, bars = count, "rejecting batch with malformed bar");
            Err(Error::MalformedBar { index, reason })
        }
        Err(e) => Err(e),
    }
}

/// Fetch from `source` and validate the result.
pub async fn fetch_sequence<S: BarSource + ?Sized>(
    source: &S,
    request: &BarRequest,
) -> Result<BarSequence> {
    let bars = source.fetch_bars(request).await?;
    if bars.is_empty() {
        warn!(%request, "source returned no bars");
    }
    validate_bars(bars)
}
