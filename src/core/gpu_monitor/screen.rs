//! Frame composition.
//!
//! Turns a cycle's view models into a [`Screen`]: the ordered sections,
//! rows and colors the terminal painter draws. Composition is pure; it does
//! no polling, parsing or terminal I/O.

use crate::core::config::DisplayConfig;

use super::metrics::{GpuId, GpuSnapshot, ProcessSnapshot, ViewModel};
use super::policy::{
    annotate_command, color_for_tag, color_for_usage, is_visible, status_level, CommandSegment,
    ProcessColor, StatusLevel, UsageColor,
};
use super::status::CycleStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub sections: Vec<GpuSection>,
    pub status: Option<StatusIndicator>,
    pub compact: bool,
}

impl Screen {
    pub fn visible_gpus(&self) -> Vec<GpuId> {
        self.sections.iter().map(|s| s.gpu.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusIndicator {
    pub level: StatusLevel,
    pub message: String,
}

/// Table section for one GPU, optionally followed by its trend graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuSection {
    pub gpu: GpuSnapshot,
    pub utilization_color: UsageColor,
    pub memory_percent: Option<u8>,
    pub memory_color: UsageColor,
    pub processes: Vec<ProcessRow>,
    pub graph: Option<TrendGraph>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub process: ProcessSnapshot,
    pub command: Vec<CommandSegment>,
    pub color: ProcessColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendGraph {
    pub utilization: Vec<GraphBar>,
    pub memory: Vec<GraphBar>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphBar {
    pub value: Option<u8>,
    pub color: UsageColor,
}

/// Compose the frame for one cycle.
pub fn compose_screen(
    view_models: &[ViewModel],
    display: &DisplayConfig,
    status: &CycleStatus,
    stale_escalation: u32,
) -> Screen {
    let sections = view_models
        .iter()
        .filter(|view| is_visible(view.gpu_id(), &display.gpu_filter))
        .map(|view| compose_section(view, display.compact))
        .collect();

    Screen {
        sections,
        status: status_indicator(status, stale_escalation),
        compact: display.compact,
    }
}

fn compose_section(view: &ViewModel, compact: bool) -> GpuSection {
    let memory_percent = view.gpu.memory_percent();

    let processes = view
        .processes
        .iter()
        .map(|tagged| ProcessRow {
            process: tagged.process.clone(),
            command: annotate_command(&tagged.process.command),
            color: color_for_tag(tagged.tag),
        })
        .collect();

    let graph = (!compact).then(|| TrendGraph {
        utilization: bars(&view.utilization_history),
        memory: bars(&view.memory_history),
    });

    GpuSection {
        gpu: view.gpu.clone(),
        utilization_color: color_for_usage(view.gpu.utilization),
        memory_percent,
        memory_color: color_for_usage(memory_percent),
        processes,
        graph,
    }
}

fn bars(samples: &[Option<u8>]) -> Vec<GraphBar> {
    samples
        .iter()
        .map(|&value| GraphBar {
            value,
            color: color_for_usage(value),
        })
        .collect()
}

fn status_indicator(status: &CycleStatus, stale_escalation: u32) -> Option<StatusIndicator> {
    let level = status_level(status, stale_escalation);
    let reasons = || {
        status
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.source, f.reason))
            .collect::<Vec<_>>()
            .join("; ")
    };

    let message = match level {
        StatusLevel::Ok => return None,
        StatusLevel::Warning => format!(
            "{} malformed record(s) skipped",
            status.skipped_records
        ),
        StatusLevel::Stale => format!("stale data ({})", reasons()),
        StatusLevel::PersistentStale => format!(
            "DATA STALE for {} cycles ({})",
            status.consecutive_failures,
            reasons()
        ),
    };

    Some(StatusIndicator { level, message })
}
