//! Cycle driver.
//!
//! One cycle runs `Sampling → Parsing → Merging → Recording → Rendering`
//! and returns to `Idle`. Both sources are queried concurrently and the
//! cycle waits for both (or their timeouts) before parsing. A source that
//! fails keeps serving its previous good data and the cycle is marked stale.

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::core::config::{DisplayConfig, EngineConfig};
use crate::error::{GpumonError, Result};

use super::history::{HistoryStore, Metric};
use super::merge::{build_view_models, join_processes};
use super::metrics::{GpuId, GpuProcessRecord, GpuSnapshot, HostProcess, ViewModel};
use super::parser::{parse_compute_apps, parse_gpus, parse_process_table, ParseError};
use super::screen::{compose_screen, Screen};
use super::source::{DiagnosticReport, SourceAdapter};
use super::status::{CycleStatus, SourceFailure, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Sampling,
    Parsing,
    Merging,
    Recording,
    Rendering,
    Stopped,
}

/// Output of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub sampled_at: DateTime<Local>,
    pub view_models: Vec<ViewModel>,
    pub status: CycleStatus,
    pub screen: Screen,
}

/// Last successfully parsed output of the GPU-diagnostic source.
#[derive(Debug, Clone, Default)]
struct GpuData {
    gpus: Vec<GpuSnapshot>,
    apps: Vec<GpuProcessRecord>,
}

pub struct Scheduler<A: SourceAdapter> {
    adapter: A,
    engine: EngineConfig,
    display: DisplayConfig,
    history: HistoryStore,
    current_user: String,
    state: CycleState,
    cycle: u64,
    last_gpu_data: Option<GpuData>,
    last_host: Vec<HostProcess>,
    consecutive_failures: u32,
}

impl<A: SourceAdapter> Scheduler<A> {
    pub fn new(adapter: A, engine: EngineConfig, display: DisplayConfig) -> Self {
        let current_user = adapter.current_user();
        let history = HistoryStore::new(engine.history_capacity);

        Self {
            adapter,
            engine,
            display,
            history,
            current_user,
            state: CycleState::Idle,
            cycle: 0,
            last_gpu_data: None,
            last_host: Vec::new(),
            consecutive_failures: 0,
        }
    }

    /// Create the scheduler and run the first cycle.
    ///
    /// Fails with [`GpumonError::FatalStartup`] when the GPU source cannot
    /// be read at all, since there is no earlier data to fall back to.
    pub async fn start(
        adapter: A,
        engine: EngineConfig,
        display: DisplayConfig,
    ) -> Result<(Self, CycleReport)> {
        let mut scheduler = Self::new(adapter, engine, display);
        let report = scheduler.run_cycle().await;

        if scheduler.last_gpu_data.is_none() {
            let reason = report
                .status
                .failures
                .iter()
                .find(|f| f.source == SourceKind::Gpu)
                .map(|f| f.reason.clone())
                .unwrap_or_else(|| "no data".to_string());
            scheduler.stop();
            return Err(GpumonError::fatal_startup(format!(
                "cannot read GPU data: {}",
                reason
            )));
        }

        let unknown = scheduler.unknown_filter_ids();
        if !unknown.is_empty() {
            log::warn!("GPU filter names ids that were not reported: {:?}", unknown);
        }

        log::info!(
            "Monitoring {} GPU(s) as user {}",
            report.view_models.len(),
            scheduler.current_user
        );
        Ok((scheduler, report))
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn display(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn interval(&self) -> Duration {
        self.engine.interval
    }

    /// Filter ids that the GPU source did not report in the last good sample.
    pub fn unknown_filter_ids(&self) -> Vec<GpuId> {
        let reported: Vec<GpuId> = self
            .last_gpu_data
            .as_ref()
            .map(|data| data.gpus.iter().map(|g| g.id).collect())
            .unwrap_or_default();

        self.display
            .gpu_filter
            .iter()
            .copied()
            .filter(|id| !reported.contains(id))
            .collect()
    }

    fn previous_apps(&self) -> &[GpuProcessRecord] {
        self.last_gpu_data
            .as_ref()
            .map(|data| data.apps.as_slice())
            .unwrap_or(&[])
    }

    pub fn stop(&mut self) {
        if self.state != CycleState::Stopped {
            log::info!("Stopping after {} cycle(s)", self.cycle);
        }
        self.state = CycleState::Stopped;
    }

    /// Run one full cycle and return what should be drawn.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        let timeout = self.engine.query_timeout;

        self.state = CycleState::Sampling;
        let (gpu_result, host_result) = tokio::join!(
            self.adapter.query_gpus(timeout),
            self.adapter.query_processes(timeout)
        );

        self.state = CycleState::Parsing;
        let mut status = CycleStatus::default();

        let gpu_fresh = match gpu_result {
            Ok(report) => match parse_diagnostic(&report, self.previous_apps(), &mut status) {
                Ok(data) => {
                    self.last_gpu_data = Some(data);
                    true
                }
                Err(e) => {
                    fail(&mut status, SourceKind::Gpu, e.to_string());
                    false
                }
            },
            Err(e) => {
                fail(&mut status, SourceKind::Gpu, e.to_string());
                false
            }
        };

        let host_parsed = host_result
            .map_err(|e| e.to_string())
            .and_then(|text| parse_process_table(&text).map_err(|e| e.to_string()));
        match host_parsed {
            Ok(parsed) => {
                status.skipped_records += parsed.issues.len();
                self.last_host = parsed.records;
            }
            Err(reason) => fail(&mut status, SourceKind::Processes, reason),
        }

        if status.is_stale() {
            self.consecutive_failures += 1;
        } else {
            self.consecutive_failures = 0;
        }
        status.consecutive_failures = self.consecutive_failures;

        self.state = CycleState::Merging;
        let (gpus, apps) = match &self.last_gpu_data {
            Some(data) => (data.gpus.as_slice(), data.apps.as_slice()),
            None => (&[][..], &[][..]),
        };
        let processes = join_processes(gpus, apps, &self.last_host);
        let mut view_models = build_view_models(
            gpus,
            &processes,
            &self.current_user,
            &self.display.gpu_filter,
        );

        self.state = CycleState::Recording;
        if gpu_fresh {
            for view in &view_models {
                self.history.record(view.gpu_id(), view.gpu.utilization);
                self.history
                    .record_metric(view.gpu_id(), Metric::MemoryPercent, view.gpu.memory_percent());
            }
        }
        for view in &mut view_models {
            view.utilization_history = self.history.series_for(view.gpu_id());
            view.memory_history = self
                .history
                .metric_series(view.gpu_id(), Metric::MemoryPercent);
        }

        self.state = CycleState::Rendering;
        let screen = compose_screen(
            &view_models,
            &self.display,
            &status,
            self.engine.stale_escalation,
        );

        log::debug!(
            "Cycle {}: {} GPU(s), {} process(es), stale={}",
            self.cycle,
            view_models.len(),
            processes.len(),
            status.is_stale()
        );

        self.state = CycleState::Idle;
        CycleReport {
            cycle: self.cycle,
            sampled_at: Local::now(),
            view_models,
            status,
            screen,
        }
    }
}

/// Parse both parts of a diagnostic report.
///
/// Only the GPU rows are required. A failed compute-apps query reuses
/// `previous_apps` and is reported as a failure of its own; compute-app rows
/// that cannot be parsed at all are counted as skipped and leave the GPUs
/// without processes.
fn parse_diagnostic(
    report: &DiagnosticReport,
    previous_apps: &[GpuProcessRecord],
    status: &mut CycleStatus,
) -> std::result::Result<GpuData, ParseError> {
    let gpus = parse_gpus(&report.gpus)?;
    status.skipped_records += gpus.issues.len();

    if let Some(e) = &report.compute_apps_error {
        fail(status, SourceKind::ComputeApps, e.to_string());
        return Ok(GpuData {
            gpus: gpus.records,
            apps: previous_apps.to_vec(),
        });
    }

    let apps = match parse_compute_apps(&report.compute_apps) {
        Ok(apps) => {
            status.skipped_records += apps.issues.len();
            apps.records
        }
        Err(ParseError::NoRecords { lines, .. }) => {
            status.skipped_records += lines;
            Vec::new()
        }
        Err(e) => {
            log::warn!("Ignoring compute-apps output: {}", e);
            Vec::new()
        }
    };

    Ok(GpuData {
        gpus: gpus.records,
        apps,
    })
}

fn fail(status: &mut CycleStatus, source: SourceKind, reason: String) {
    log::warn!("{} failed, reusing previous data: {}", source, reason);
    status.failures.push(SourceFailure { source, reason });
}
