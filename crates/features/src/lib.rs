//! Feature computation for the keylevel-tracker system.
//!
//! This crate handles:
//! - True range and rolling average true range (ATR)
//! - Rolling mean of close and the bias derived from it
//! - Bias confidence scoring
//! - Key levels and proximity
//! - The engine tying them into one `Analysis` per bar sequence

pub mod atr;
pub mod rolling_mean;
pub mod confidence;
pub mod levels;
pub mod engine;

pub use atr::{AverageTrueRange, TrueRange};
pub use rolling_mean::RollingMean;
pub use confidence::{ConfidenceModel, ConfidenceStrategy};
pub use engine::VolatilityBiasEngine;
