//! GPU monitor command handler.

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::{DisplayConfig, EngineConfig};
use crate::ui::monitor_tui::run_monitor_app;

/// Execute the monitor with the parsed command line
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let display = display_config_from_matches(matches);
    log::debug!("Display options: {:?}", display);

    run_monitor_app(display, EngineConfig::default()).context("Failed to run GPU monitor")
}

pub fn display_config_from_matches(matches: &ArgMatches) -> DisplayConfig {
    let gpus = matches
        .get_many::<u32>("gpus")
        .map(|ids| ids.copied().collect::<Vec<_>>())
        .unwrap_or_default();

    DisplayConfig::new(matches.get_flag("compact"), gpus)
}
