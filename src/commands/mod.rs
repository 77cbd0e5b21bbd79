// Command-line interface

pub mod monitor;

use clap::{Arg, ArgAction, Command};

use crate::ui::formatters::pad_to_width;
use crate::ui::monitor_tui::COLOR_LEGEND;

/// Build the `gpumon` command-line definition
pub fn build_cli() -> Command {
    Command::new("gpumon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live terminal monitor for NVIDIA GPUs and the processes using them")
        .after_help(legend_help())
        .arg(
            Arg::new("compact")
                .short('c')
                .long("compact")
                .help("Hide the trend graphs")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("gpus")
                .short('g')
                .long("gpus")
                .value_name("IDS")
                .help("Only show these GPUs, comma-separated (e.g. -g=0,2)")
                .value_delimiter(',')
                .value_parser(clap::value_parser!(u32))
                .action(ArgAction::Append),
        )
}

fn legend_help() -> String {
    let mut help = String::from("Colors:\n");
    for (key, meaning) in COLOR_LEGEND {
        help.push_str(&format!("  {} {}\n", pad_to_width(key, 14), meaning));
    }
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_help_contains_legend() {
        let help = build_cli().render_long_help().to_string();
        assert!(help.contains("usage at or above 80%"));
        assert!(help.contains("--compact"));
    }
}
