use std::time::Duration;

use crate::core::gpu_monitor::{
    AdapterError, DiagnosticReport, SourceAdapter, COMPUTE_APP_QUERY_FIELDS, GPU_QUERY_FIELDS,
    PROCESS_TABLE_COLUMNS,
};
use crate::error::{GpumonError, Result};

use super::subprocess::run_with_timeout;
use super::user::current_username;

const CSV_FORMAT: &str = "--format=csv,noheader,nounits";

/// Data source backed by `nvidia-smi` and `ps`
pub struct NvidiaSmiSource {
    nvidia_smi: String,
    ps: String,
    user: String,
}

impl NvidiaSmiSource {
    /// Locate both commands in `PATH`.
    ///
    /// A missing command is reported as a fatal startup error.
    pub fn new() -> Result<Self> {
        let nvidia_smi = which::which("nvidia-smi").map_err(|e| {
            GpumonError::fatal_startup(format!("nvidia-smi not found in PATH: {}", e))
        })?;
        let ps = which::which("ps")
            .map_err(|e| GpumonError::fatal_startup(format!("ps not found in PATH: {}", e)))?;

        log::debug!("Using {:?} and {:?}", nvidia_smi, ps);

        Ok(Self {
            nvidia_smi: nvidia_smi.to_string_lossy().into_owned(),
            ps: ps.to_string_lossy().into_owned(),
            user: current_username(),
        })
    }
}

fn gpu_query_arg() -> String {
    format!("--query-gpu={}", GPU_QUERY_FIELDS.join(","))
}

fn compute_apps_query_arg() -> String {
    format!("--query-compute-apps={}", COMPUTE_APP_QUERY_FIELDS.join(","))
}

/// Combine both query results; only the GPU rows are mandatory.
fn diagnostic_report(
    gpus: String,
    compute_apps: std::result::Result<String, AdapterError>,
) -> DiagnosticReport {
    match compute_apps {
        Ok(text) => DiagnosticReport {
            gpus,
            compute_apps: text,
            compute_apps_error: None,
        },
        Err(e) => DiagnosticReport {
            gpus,
            compute_apps: String::new(),
            compute_apps_error: Some(e),
        },
    }
}

impl SourceAdapter for NvidiaSmiSource {
    async fn query_gpus(
        &self,
        timeout: Duration,
    ) -> std::result::Result<DiagnosticReport, AdapterError> {
        let gpu_query = gpu_query_arg();
        let apps_query = compute_apps_query_arg();

        let gpu_args = [gpu_query.as_str(), CSV_FORMAT];
        let apps_args = [apps_query.as_str(), CSV_FORMAT];

        let (gpus, compute_apps) = tokio::join!(
            run_with_timeout(&self.nvidia_smi, &gpu_args, timeout),
            run_with_timeout(&self.nvidia_smi, &apps_args, timeout)
        );

        Ok(diagnostic_report(gpus?, compute_apps))
    }

    async fn query_processes(
        &self,
        timeout: Duration,
    ) -> std::result::Result<String, AdapterError> {
        let columns = PROCESS_TABLE_COLUMNS.join(",");
        run_with_timeout(&self.ps, &["-e", "--no-headers", "-o", &columns], timeout).await
    }

    fn current_user(&self) -> String {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_arguments() {
        assert_eq!(
            gpu_query_arg(),
            "--query-gpu=index,uuid,name,utilization.gpu,memory.used,memory.total,\
             temperature.gpu,fan.speed,power.draw,power.limit,pstate"
        );
        assert_eq!(
            compute_apps_query_arg(),
            "--query-compute-apps=gpu_uuid,pid,used_memory,process_name"
        );
    }

    #[test]
    fn test_compute_apps_failure_keeps_gpu_rows() {
        let failure = AdapterError::Failed {
            command: "nvidia-smi".to_string(),
            status: "exit status: 3".to_string(),
            stderr: "Failed to query compute apps".to_string(),
        };
        let report = diagnostic_report("0, GPU-a, T4".to_string(), Err(failure.clone()));

        assert_eq!(report.gpus, "0, GPU-a, T4");
        assert!(report.compute_apps.is_empty());
        assert_eq!(report.compute_apps_error, Some(failure));

        let ok = diagnostic_report(String::new(), Ok("GPU-a, 1, 2, x".to_string()));
        assert_eq!(ok.compute_apps_error, None);
    }
}
