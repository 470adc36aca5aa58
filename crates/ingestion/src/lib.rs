//! Market data retrieval for the keylevel-tracker system.
//!
//! This crate handles:
//! - The `BarSource` abstraction over bar providers
//! - A Yahoo Finance chart API client
//! - A time-to-live cache in front of any source
//! - Validation of fetched batches into a `BarSequence`

pub mod source;
pub mod yahoo;
pub mod cache;
pub mod validation;

pub use source::{BarRequest, BarSource, SourceError};
pub use yahoo::YahooChartSource;
pub use cache::CachedSource;
pub use validation::{fetch_sequence, validate_bars};
