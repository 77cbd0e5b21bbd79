// gpumon Library - Public API

use std::fs::{self, File};

use env_logger::{Env, Target};

// Re-export error types
pub mod error;
pub use error::{GpumonError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use crate::core::{DisplayConfig, EngineConfig};

/// Initialize logging.
///
/// The TUI owns the terminal, so records go to `gpumon.log` in the user
/// cache directory. Falls back to stderr if that file cannot be opened.
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_logging() {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));

    if let Some(file) = open_log_file() {
        builder.target(Target::Pipe(Box::new(file)));
    }

    // A second call (tests) keeps the first logger
    let _ = builder.try_init();
}

fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("gpumon");
    fs::create_dir_all(&dir).ok()?;
    File::options()
        .create(true)
        .append(true)
        .open(dir.join("gpumon.log"))
        .ok()
}
