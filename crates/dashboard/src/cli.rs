//! Command-line interface.

use clap::Parser;
use keylevel_core::{Config, LookbackPeriod, SampleInterval};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML config file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lookback period: 1d, 5d, 1mo or 3mo
    #[arg(short, long)]
    pub period: Option<LookbackPeriod>,

    /// Bar interval: 1m, 5m or 15m
    #[arg(short, long)]
    pub interval: Option<SampleInterval>,

    /// Data source symbol (e.g. "NQ=F")
    #[arg(long)]
    pub symbol: Option<String>,

    /// Seed for the confidence draw
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print one report to stdout and exit instead of opening the dashboard
    #[arg(long)]
    pub once: bool,

    /// With --once, print the report as JSON
    #[arg(long, requires = "once")]
    pub json: bool,
}

impl Cli {
    /// Load the config file (or defaults) and apply command-line overrides.
    pub fn load_config(&self) -> keylevel_core::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(period) = self.period {
            config.instrument.lookback = period;
        }
        if let Some(interval) = self.interval {
            config.instrument.interval = interval;
        }
        if let Some(symbol) = &self.symbol {
            config.instrument.symbol = symbol.clone();
        }
        if let Some(seed) = self.seed {
            config.confidence.seed = Some(seed);
        }
    }
}
