use colored::*;

use gpumon::commands::{build_cli, monitor};
use gpumon::GpumonError;

fn main() {
    let matches = build_cli().get_matches();

    gpumon::init_logging();
    log::info!("gpumon {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = monitor::execute(&matches) {
        log::error!("{:#}", e);
        eprintln!("{} {:#}", "error:".red().bold(), e);

        if e.downcast_ref::<GpumonError>().is_some_and(GpumonError::is_fatal) {
            eprintln!(
                "{}",
                "Check that the NVIDIA driver is installed and nvidia-smi works.".dimmed()
            );
        }
        std::process::exit(1);
    }
}
