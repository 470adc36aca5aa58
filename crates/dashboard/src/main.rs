//! `keylevel`: ATR key levels and rolling-mean bias for a futures contract.
//!
//! Usage:
//!   keylevel                       # terminal dashboard with defaults (NQ=F, 1d, 5m)
//!   keylevel --period 5d -i 15m    # different selection
//!   keylevel --once                # one plain-text report on stdout
//!   keylevel --once --json         # one JSON report on stdout

use anyhow::Context;
use clap::Parser;
use keylevel_dashboard::logging::{init_logging, LogTarget};
use keylevel_dashboard::{report, tui, App, Cli, DashboardView};
use keylevel_ingestion::YahooChartSource;
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("loading configuration")?;

    let target = if cli.once {
        LogTarget::Stderr
    } else {
        LogTarget::File(Path::new(&config.dashboard.log_file))
    };
    init_logging(target)?;
    info!(version = env!("CARGO_PKG_VERSION"), once = cli.once, "keylevel starting");

    let source = YahooChartSource::new(&config.source).context("building HTTP client")?;
    let mut app = App::new(config, source).context("creating dashboard session")?;

    if cli.once {
        let outcome = app.analyze().await;
        if cli.json {
            let report = report::render_json(app.config(), &outcome);
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", report::render_text(&DashboardView::build(app.config(), &outcome)));
        }
        // Report the failure through the exit code as well.
        outcome.context("analysis failed")?;
        return Ok(());
    }

    tui::run(&mut app).await
}
