//! GPU monitoring engine.
//!
//! Polls the data sources, parses and merges their output, keeps trend
//! history and composes the frame drawn by the TUI.

mod history;
mod merge;
mod metrics;
mod parser;
mod policy;
mod scheduler;
mod screen;
mod source;
mod status;

pub use history::{HistorySeries, HistoryStore, Metric, Sample};
pub use merge::{build_view_models, join_processes, UNKNOWN_USER};
pub use metrics::{
    GpuId, GpuProcessRecord, GpuSnapshot, HostProcess, ProcessSnapshot, ProcessTag,
    TaggedProcess, ViewModel,
};
pub use parser::{
    parse_compute_apps, parse_gpus, parse_process_table, ParseError, Parsed,
    COMPUTE_APP_QUERY_FIELDS, GPU_QUERY_FIELDS, PROCESS_TABLE_COLUMNS,
};
pub use policy::{
    annotate_command, color_for_tag, color_for_usage, is_visible, status_level, CommandSegment,
    CommentLevel, ProcessColor, StatusLevel, UsageColor, HIGH_USAGE_THRESHOLD,
};
pub use scheduler::{CycleReport, CycleState, Scheduler};
pub use screen::{compose_screen, GpuSection, GraphBar, ProcessRow, Screen, StatusIndicator, TrendGraph};
pub use source::{AdapterError, DiagnosticReport, SourceAdapter};
pub use status::{CycleStatus, SourceFailure, SourceKind};
