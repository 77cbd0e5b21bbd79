use std::collections::BTreeSet;
use std::time::Duration;

use crate::core::gpu_monitor::GpuId;

/// Engine constants. None of these are exposed as command-line flags.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock time between two cycles
    pub interval: Duration,
    /// Upper bound for each external query
    pub query_timeout: Duration,
    /// Samples kept per trend graph
    pub history_capacity: usize,
    /// Consecutive failed cycles before staleness is flagged as persistent
    pub stale_escalation: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            query_timeout: Duration::from_secs(2),
            history_capacity: 60,
            stale_escalation: 3,
        }
    }
}

/// Display options resolved from the command line, fixed for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayConfig {
    pub compact: bool,
    /// GPUs to show; empty means all
    pub gpu_filter: BTreeSet<GpuId>,
}

impl DisplayConfig {
    pub fn new<I>(compact: bool, gpus: I) -> Self
    where
        I: IntoIterator<Item = GpuId>,
    {
        Self {
            compact,
            gpu_filter: gpus.into_iter().collect(),
        }
    }
}
