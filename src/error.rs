use std::io;
use thiserror::Error;

use crate::core::gpu_monitor::{AdapterError, ParseError};

/// Custom error type for gpumon
#[derive(Error, Debug)]
pub enum GpumonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Data source error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Startup failed: {0}")]
    FatalStartup(String),

}

/// Result type alias for gpumon
pub type Result<T> = std::result::Result<T, GpumonError>;

impl GpumonError {
    /// Create a fatal startup error
    pub fn fatal_startup<S: Into<String>>(msg: S) -> Self {
        GpumonError::FatalStartup(msg.into())
    }

    /// True for errors that must stop the program before the render loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GpumonError::FatalStartup(_))
    }
}
