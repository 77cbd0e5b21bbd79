//! Joins the two process listings and groups processes under their GPU.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::metrics::{
    GpuId, GpuProcessRecord, GpuSnapshot, HostProcess, ProcessSnapshot, ProcessTag,
    TaggedProcess, ViewModel,
};
use super::policy::is_visible;

/// User shown for a GPU process the process listing did not report.
pub const UNKNOWN_USER: &str = "?";

/// Join GPU-side process records with the OS process listing by PID.
///
/// Records whose GPU UUID does not match any GPU of this cycle are dropped.
pub fn join_processes(
    gpus: &[GpuSnapshot],
    apps: &[GpuProcessRecord],
    host: &[HostProcess],
) -> Vec<ProcessSnapshot> {
    let gpu_by_uuid: HashMap<&str, GpuId> =
        gpus.iter().map(|gpu| (gpu.uuid.as_str(), gpu.id)).collect();
    let host_by_pid: HashMap<u32, &HostProcess> = host.iter().map(|p| (p.pid, p)).collect();

    apps.iter()
        .filter_map(|app| {
            let Some(&gpu_id) = gpu_by_uuid.get(app.gpu_uuid.as_str()) else {
                log::debug!("Dropping PID {}: unknown GPU {}", app.pid, app.gpu_uuid);
                return None;
            };

            let snapshot = match host_by_pid.get(&app.pid) {
                Some(host) => ProcessSnapshot {
                    pid: app.pid,
                    gpu_id,
                    gpu_memory_bytes: app.used_memory_bytes,
                    command: host.command.clone(),
                    user: host.user.clone(),
                    cpu_percent: host.cpu_percent,
                    mem_percent: host.mem_percent,
                },
                None => ProcessSnapshot {
                    pid: app.pid,
                    gpu_id,
                    gpu_memory_bytes: app.used_memory_bytes,
                    command: app.process_name.clone(),
                    user: UNKNOWN_USER.to_string(),
                    cpu_percent: None,
                    mem_percent: None,
                },
            };
            Some(snapshot)
        })
        .collect()
}

/// Build one view model per visible GPU, in ascending id order.
///
/// Processes keep the order of the process source; those whose GPU is not
/// part of `gpus` are dropped.
pub fn build_view_models(
    gpus: &[GpuSnapshot],
    processes: &[ProcessSnapshot],
    current_user: &str,
    filter: &BTreeSet<GpuId>,
) -> Vec<ViewModel> {
    let mut by_id: BTreeMap<GpuId, ViewModel> = gpus
        .iter()
        .map(|gpu| (gpu.id, ViewModel::new(gpu.clone(), Vec::new())))
        .collect();

    for process in processes {
        let Some(view) = by_id.get_mut(&process.gpu_id) else {
            continue;
        };
        let tag = if process.user == current_user {
            ProcessTag::Own
        } else {
            ProcessTag::Other
        };
        view.processes.push(TaggedProcess {
            process: process.clone(),
            tag,
        });
    }

    by_id
        .into_values()
        .filter(|view| is_visible(view.gpu_id(), filter))
        .collect()
}
