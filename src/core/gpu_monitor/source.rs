use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Raw text of one GPU-diagnostic query: the GPU rows and the compute
/// processes running on them.
///
/// The GPU rows are required. When only the compute-process query fails,
/// `compute_apps` is empty and the failure is kept in `compute_apps_error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub gpus: String,
    pub compute_apps: String,
    pub compute_apps_error: Option<AdapterError>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("failed to run {command}: {message}")]
    Spawn { command: String, message: String },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("{command} produced non-UTF-8 output")]
    InvalidUtf8 { command: String },
}

/// Trait for the external data sources polled every cycle
///
/// The engine only sees raw text; implementations run the actual commands.
/// Both queries must give up with [`AdapterError::Timeout`] once `timeout`
/// has elapsed, and must not leave child processes behind when the returned
/// future is dropped.
pub trait SourceAdapter {
    /// Run the GPU-diagnostic command
    fn query_gpus(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<DiagnosticReport, AdapterError>>;

    /// Run the process-listing command
    fn query_processes(&self, timeout: Duration) -> impl Future<Output = Result<String, AdapterError>>;

    /// Name of the OS user running the monitor
    fn current_user(&self) -> String;
}
