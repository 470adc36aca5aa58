//! Dashboard for the keylevel-tracker system.
//!
//! The library holds everything the `keylevel` binary needs so it can be
//! tested without a terminal:
//! - CLI parsing and config overrides
//! - Logging initialisation
//! - The `App` driving fetch -> engine -> view on each refresh
//! - A pure `DashboardView` model consumed by both renderers
//! - The plain-text / JSON report and the terminal dashboard

pub mod app;
pub mod cli;
pub mod logging;
pub mod report;
pub mod tui;
pub mod view;

pub use app::App;
pub use cli::Cli;
pub use view::DashboardView;
