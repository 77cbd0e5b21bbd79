use std::sync::Mutex;
use std::time::Duration;

use gpumon::core::gpu_monitor::{
    AdapterError, DiagnosticReport, Metric, ProcessColor, Scheduler, SourceAdapter, StatusLevel,
    UsageColor,
};
use gpumon::core::{DisplayConfig, EngineConfig};

type GpuResponse = Result<DiagnosticReport, AdapterError>;

/// Replays queued responses; the last one repeats forever.
struct ScriptedSource {
    gpus: Mutex<Vec<GpuResponse>>,
    processes: Mutex<Vec<Result<String, AdapterError>>>,
    user: String,
}

impl ScriptedSource {
    fn new(gpus: Vec<GpuResponse>, processes: Vec<Result<String, AdapterError>>) -> Self {
        Self {
            gpus: Mutex::new(gpus),
            processes: Mutex::new(processes),
            user: "alice".to_string(),
        }
    }
}

fn next<T: Clone>(queue: &Mutex<Vec<T>>) -> T {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.remove(0)
    } else {
        queue[0].clone()
    }
}

impl SourceAdapter for ScriptedSource {
    async fn query_gpus(&self, _timeout: Duration) -> GpuResponse {
        next(&self.gpus)
    }

    async fn query_processes(&self, _timeout: Duration) -> Result<String, AdapterError> {
        next(&self.processes)
    }

    fn current_user(&self) -> String {
        self.user.clone()
    }
}

fn two_gpus(util0: u8, util1: u8) -> DiagnosticReport {
    DiagnosticReport {
        gpus: format!(
            "0, GPU-aaaa, NVIDIA A100, {}, 1024, 40960, 35, 30, 60.5, 250.0, P0\n\
             1, GPU-bbbb, NVIDIA A100, {}, 30000, 40960, 71, 80, 240.1, 250.0, P0\n",
            util0, util1
        ),
        compute_apps: "GPU-bbbb, 4242, 29000, python\n".to_string(),
        compute_apps_error: None,
    }
}

const PROCESS_LISTING: &str = "\
    1 root                               0.0  0.1 /sbin/init
 4242 alice                             98.0  3.2 python train.py --epochs 10
";

fn timeout() -> AdapterError {
    AdapterError::Timeout {
        command: "nvidia-smi".to_string(),
        timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_two_gpus_with_own_process() {
    let source = ScriptedSource::new(
        vec![Ok(two_gpus(10, 95))],
        vec![Ok(PROCESS_LISTING.to_string())],
    );
    let (_scheduler, report) =
        Scheduler::start(source, EngineConfig::default(), DisplayConfig::default())
            .await
            .unwrap();

    let screen = &report.screen;
    assert_eq!(screen.visible_gpus(), vec![0, 1]);
    assert!(screen.status.is_none());

    let gpu0 = &screen.sections[0];
    let gpu1 = &screen.sections[1];
    assert!(gpu0.processes.is_empty());
    assert_eq!(gpu0.graph.as_ref().unwrap().utilization[0].color, UsageColor::Low);
    assert_eq!(gpu1.graph.as_ref().unwrap().utilization[0].color, UsageColor::High);

    assert_eq!(gpu1.processes.len(), 1);
    let row = &gpu1.processes[0];
    assert_eq!(row.color, ProcessColor::Own);
    assert_eq!(row.process.pid, 4242);
    assert_eq!(row.process.user, "alice");
    assert_eq!(row.process.command, "python train.py --epochs 10");
    assert_eq!(row.process.gpu_memory_bytes, Some(29000 * 1024 * 1024));
}

#[tokio::test]
async fn test_gpu_filter_hides_other_gpus_and_their_processes() {
    let source = ScriptedSource::new(
        vec![Ok(two_gpus(10, 95))],
        vec![Ok(PROCESS_LISTING.to_string())],
    );
    let display = DisplayConfig::new(false, [0]);
    let (_scheduler, report) = Scheduler::start(source, EngineConfig::default(), display)
        .await
        .unwrap();

    assert_eq!(report.screen.visible_gpus(), vec![0]);
    assert!(report
        .screen
        .sections
        .iter()
        .all(|section| section.processes.is_empty()));
    assert!(report.view_models.iter().all(|view| view.gpu.id == 0));
}

#[tokio::test]
async fn test_timeout_reuses_previous_cycle() {
    let source = ScriptedSource::new(
        vec![
            Ok(two_gpus(10, 95)),
            Ok(two_gpus(20, 90)),
            Err(timeout()),
            Ok(two_gpus(30, 85)),
        ],
        vec![Ok(PROCESS_LISTING.to_string())],
    );
    let mut scheduler = Scheduler::new(source, EngineConfig::default(), DisplayConfig::default());

    scheduler.run_cycle().await;
    let second = scheduler.run_cycle().await;
    let third = scheduler.run_cycle().await;

    assert_eq!(third.view_models, second.view_models);
    assert_eq!(third.screen.sections, second.screen.sections);
    let indicator = third.screen.status.as_ref().unwrap();
    assert_eq!(indicator.level, StatusLevel::Stale);
    assert_eq!(third.status.consecutive_failures, 1);

    // History skipped the stale cycle
    assert_eq!(scheduler.history().series_for(0), vec![Some(10), Some(20)]);

    let fourth = scheduler.run_cycle().await;
    assert_eq!(fourth.cycle, 4);
    assert!(fourth.screen.status.is_none());
    assert_eq!(
        scheduler.history().series_for(0),
        vec![Some(10), Some(20), Some(30)]
    );
}

#[tokio::test]
async fn test_persistent_staleness_escalates() {
    let source = ScriptedSource::new(
        vec![Ok(two_gpus(10, 95)), Err(timeout())],
        vec![Ok(PROCESS_LISTING.to_string())],
    );
    let engine = EngineConfig {
        stale_escalation: 2,
        ..EngineConfig::default()
    };
    let mut scheduler = Scheduler::new(source, engine, DisplayConfig::default());

    scheduler.run_cycle().await;
    let first_failure = scheduler.run_cycle().await;
    let second_failure = scheduler.run_cycle().await;

    assert_eq!(first_failure.screen.status.unwrap().level, StatusLevel::Stale);
    let indicator = second_failure.screen.status.unwrap();
    assert_eq!(indicator.level, StatusLevel::PersistentStale);
    assert!(indicator.message.contains("2 cycles"));
}

#[tokio::test]
async fn test_process_listing_failure_at_startup_only_degrades() {
    let source = ScriptedSource::new(
        vec![Ok(two_gpus(10, 95))],
        vec![Err(AdapterError::NotFound("ps".to_string()))],
    );
    let (_scheduler, report) =
        Scheduler::start(source, EngineConfig::default(), DisplayConfig::default())
            .await
            .unwrap();

    assert_eq!(report.screen.visible_gpus(), vec![0, 1]);
    let indicator = report.screen.status.unwrap();
    assert!(indicator.message.contains("process listing"));

    // The GPU side still names the process
    let row = &report.screen.sections[1].processes[0];
    assert_eq!(row.process.command, "python");
    assert_eq!(row.color, ProcessColor::Other);
}

#[tokio::test]
async fn test_compute_apps_failure_at_startup_keeps_gpu_rows() {
    let report = DiagnosticReport {
        compute_apps: String::new(),
        compute_apps_error: Some(AdapterError::Failed {
            command: "nvidia-smi".to_string(),
            status: "exit status: 15".to_string(),
            stderr: "Unable to query compute processes".to_string(),
        }),
        ..two_gpus(10, 95)
    };
    let source = ScriptedSource::new(vec![Ok(report)], vec![Ok(PROCESS_LISTING.to_string())]);
    let (scheduler, report) =
        Scheduler::start(source, EngineConfig::default(), DisplayConfig::default())
            .await
            .unwrap();

    assert_eq!(report.screen.visible_gpus(), vec![0, 1]);
    assert!(report.screen.sections[1].processes.is_empty());
    assert_eq!(scheduler.history().series_for(1), vec![Some(95)]);

    let indicator = report.screen.status.unwrap();
    assert_eq!(indicator.level, StatusLevel::Stale);
    assert!(indicator.message.contains("compute-apps query"));
}

#[tokio::test]
async fn test_history_keeps_most_recent_samples() {
    let responses = (1..=5).map(|u| Ok(two_gpus(u, 50))).collect();
    let source = ScriptedSource::new(responses, vec![Ok(String::new())]);
    let engine = EngineConfig {
        history_capacity: 3,
        ..EngineConfig::default()
    };
    let mut scheduler = Scheduler::new(source, engine, DisplayConfig::default());

    let mut last = None;
    for _ in 0..5 {
        last = Some(scheduler.run_cycle().await);
    }

    assert_eq!(
        scheduler.history().series_for(0),
        vec![Some(3), Some(4), Some(5)]
    );
    assert_eq!(
        scheduler.history().metric_series(1, Metric::MemoryPercent).len(),
        3
    );
    assert_eq!(
        last.unwrap().view_models[0].utilization_history,
        vec![Some(3), Some(4), Some(5)]
    );
}
