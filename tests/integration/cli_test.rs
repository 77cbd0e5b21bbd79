use gpumon::commands::{build_cli, monitor::display_config_from_matches};
use gpumon::core::DisplayConfig;

fn parse(args: &[&str]) -> Result<DisplayConfig, clap::Error> {
    let mut argv = vec!["gpumon"];
    argv.extend_from_slice(args);
    build_cli()
        .try_get_matches_from(argv)
        .map(|matches| display_config_from_matches(&matches))
}

#[test]
fn test_gpu_filter_forms() {
    let expected = DisplayConfig::new(false, [0, 2]);
    assert_eq!(parse(&["-g=0,2"]).unwrap(), expected);
    assert_eq!(parse(&["--gpus=0,2"]).unwrap(), expected);
    assert_eq!(parse(&["--gpus", "2", "--gpus", "0"]).unwrap(), expected);
}

#[test]
fn test_compact_flag() {
    assert!(parse(&["-c"]).unwrap().compact);
    assert!(parse(&["--compact"]).unwrap().compact);
    assert!(!parse(&[]).unwrap().compact);
}

#[test]
fn test_invalid_arguments() {
    assert!(parse(&["-g=abc"]).is_err());
    assert!(parse(&["--unknown"]).is_err());
}

#[test]
fn test_help_and_version_exit_cleanly() {
    let help = parse(&["--help"]).unwrap_err();
    assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    assert_eq!(help.exit_code(), 0);

    let version = parse(&["-V"]).unwrap_err();
    assert_eq!(version.kind(), clap::error::ErrorKind::DisplayVersion);
}
