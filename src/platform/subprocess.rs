//! Subprocess execution with timeout support.
//!
//! Children are spawned with `kill_on_drop`, so a query that times out, or
//! whose future is dropped because the user quit, does not leave the
//! command running.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::gpu_monitor::AdapterError;

/// Run `program args...` and return its stdout.
///
/// Fails if the command is missing, exits non-zero, prints non-UTF-8, or
/// does not finish within `timeout`.
pub async fn run_with_timeout(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, AdapterError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => {
            return Err(AdapterError::Timeout {
                command: program.to_string(),
                timeout,
            })
        }
        Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Err(AdapterError::NotFound(program.to_string()))
        }
        Ok(Err(e)) => {
            return Err(AdapterError::Spawn {
                command: program.to_string(),
                message: e.to_string(),
            })
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(AdapterError::Failed {
            command: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout).map_err(|_| AdapterError::InvalidUtf8 {
        command: program.to_string(),
    })
}
