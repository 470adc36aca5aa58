//! Core types and configuration for the keylevel-tracker system.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (bars, validated bar sequences, lookback/interval selectors)
//! - Engine output types (volatility and bias readings, the output bundle)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, InsufficientHistory, Metric, Result};
pub use types::*;
