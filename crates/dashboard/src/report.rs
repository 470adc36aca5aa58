//! One-shot report for `--once`.

use crate::view::{DashboardView, ViewState};
use keylevel_core::{Analysis, Config, Result};
use serde_json::{json, Value};
use std::fmt::Write;

/// Render the view as plain text.
pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_text(&mut out, view);
    out
}

fn write_text(out: &mut String, view: &DashboardView) -> std::fmt::Result {
    writeln!(out, "{}", view.title)?;
    writeln!(out, "{}", view.subtitle)?;
    writeln!(out, "{}", view.selection())?;
    if let Some(as_of) = &view.as_of {
        writeln!(out, "As of {as_of} ({} bars)", view.bar_count)?;
    }
    writeln!(out)?;

    if !view.metrics.is_empty() {
        let width = view.metrics.iter().map(|m| m.label.len()).max().unwrap_or(0);
        for metric in &view.metrics {
            writeln!(out, "{:<width$}  {}", metric.label, metric.value)?;
        }
        writeln!(out)?;
    }

    if !view.key_levels.is_empty() {
        writeln!(out, "Key Levels (ATR-based)")?;
        writeln!(out, "{:<10}{:>12}", "Key Level", "Price")?;
        for row in &view.key_levels {
            writeln!(out, "{:<10}{:>12}", row.label, row.price)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", view.status.text)?;
    writeln!(out, "---")?;
    writeln!(out, "{}", view.footer)
}

/// Numeric report for machine consumers.
pub fn render_json(config: &Config, outcome: &Result<Analysis>) -> Value {
    let view = DashboardView::build(config, outcome);
    let state = match &view.state {
        ViewState::Ready => "ready",
        ViewState::Partial => "partial",
        ViewState::NoData => "no_data",
        ViewState::Failed(_) => "failed",
        ViewState::Loading => "loading",
    };

    let mut report = json!({
        "symbol": config.instrument.symbol,
        "period": config.instrument.lookback,
        "interval": config.instrument.interval,
        "state": state,
        "status": view.status.text,
    });

    if let Ok(analysis) = outcome {
        let volatility = match &analysis.volatility {
            Ok(v) => json!(v),
            Err(e) => json!({ "error": e.to_string() }),
        };
        let bias = match &analysis.bias {
            Ok(b) => json!(b),
            Err(e) => json!({ "error": e.to_string() }),
        };
        report["analysis"] = json!({
            "ts_ms": analysis.ts_ms,
            "last_price": analysis.last_price,
            "bar_count": analysis.bar_count,
            "volatility": volatility,
            "bias": bias,
        });
        if let Ok(bundle) = analysis.bundle() {
            report["bundle"] = json!(bundle);
        }
    }

    report
}
