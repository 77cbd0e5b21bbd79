//! Per-cycle data model: GPU and process snapshots and the per-GPU view model.

/// GPU identifier as reported by the diagnostic source.
pub type GpuId = u32;

/// One GPU row from the diagnostic source.
///
/// Every numeric reading is optional: `None` means the source reported the
/// field as unavailable (`[N/A]`, `[Not Supported]`) or it failed to parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuSnapshot {
    pub id: GpuId,
    pub uuid: String,
    pub name: String,
    pub utilization: Option<u8>,
    pub memory_used_bytes: Option<u64>,
    pub memory_total_bytes: Option<u64>,
    pub temperature_celsius: Option<u32>,
    pub fan_speed_percent: Option<u8>,
    pub power_draw_watts: Option<f32>,
    pub power_limit_watts: Option<f32>,
    pub perf_state: Option<String>,
}

impl GpuSnapshot {
    /// Memory usage in percent, when both used and total are known.
    pub fn memory_percent(&self) -> Option<u8> {
        match (self.memory_used_bytes, self.memory_total_bytes) {
            (Some(used), Some(total)) if total > 0 => {
                Some(((used as f64 / total as f64) * 100.0).round().min(100.0) as u8)
            }
            _ => None,
        }
    }
}

/// GPU side of a process: one compute-app row from the diagnostic source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuProcessRecord {
    pub gpu_uuid: String,
    pub pid: u32,
    pub used_memory_bytes: Option<u64>,
    pub process_name: String,
}

/// OS side of a process: one row of the process listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostProcess {
    pub pid: u32,
    pub user: String,
    pub cpu_percent: Option<f32>,
    pub mem_percent: Option<f32>,
    pub command: String,
}

/// A process running on a GPU, joined with its OS-level details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub gpu_id: GpuId,
    pub gpu_memory_bytes: Option<u64>,
    pub command: String,
    pub user: String,
    pub cpu_percent: Option<f32>,
    pub mem_percent: Option<f32>,
}

/// Whether a process belongs to the user running the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessTag {
    Own,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedProcess {
    pub process: ProcessSnapshot,
    pub tag: ProcessTag,
}

/// Everything the renderer needs about one GPU for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub gpu: GpuSnapshot,
    pub utilization_history: Vec<Option<u8>>,
    pub memory_history: Vec<Option<u8>>,
    pub processes: Vec<TaggedProcess>,
}

impl ViewModel {
    pub fn new(gpu: GpuSnapshot, processes: Vec<TaggedProcess>) -> Self {
        Self {
            gpu,
            utilization_history: Vec::new(),
            memory_history: Vec::new(),
            processes,
        }
    }

    pub fn gpu_id(&self) -> GpuId {
        self.gpu.id
    }
}
