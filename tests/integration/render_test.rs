use std::time::Duration;

use chrono::Local;
use gpumon::core::gpu_monitor::{
    compose_screen, CycleReport, CycleStatus, GpuSnapshot, ProcessSnapshot, ProcessTag,
    SourceFailure, SourceKind, TaggedProcess, ViewModel,
};
use gpumon::core::DisplayConfig;
use gpumon::ui::monitor_tui::{render_screen, render_ui, MonitorApp};
use ratatui::{backend::TestBackend, buffer::Buffer, style::Color, Terminal};

const GIB: u64 = 1024 * 1024 * 1024;

fn view(id: u32, utilization: u8, processes: Vec<TaggedProcess>) -> ViewModel {
    let mut view = ViewModel::new(
        GpuSnapshot {
            id,
            uuid: format!("GPU-{}", id),
            name: "NVIDIA A100".to_string(),
            utilization: Some(utilization),
            memory_used_bytes: Some(4 * GIB),
            memory_total_bytes: Some(40 * GIB),
            temperature_celsius: Some(45),
            perf_state: Some("P0".to_string()),
            ..Default::default()
        },
        processes,
    );
    view.utilization_history = vec![Some(utilization); 8];
    view.memory_history = vec![Some(10); 8];
    view
}

fn own_process(gpu_id: u32) -> TaggedProcess {
    TaggedProcess {
        process: ProcessSnapshot {
            pid: 4242,
            gpu_id,
            gpu_memory_bytes: Some(2 * GIB),
            command: "python train.py".to_string(),
            user: "alice".to_string(),
            cpu_percent: Some(98.0),
            mem_percent: Some(3.2),
        },
        tag: ProcessTag::Own,
    }
}

fn buffer_text(buffer: &Buffer) -> String {
    let width = buffer.area.width as usize;
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn find(buffer: &Buffer, needle: &str) -> Option<(u16, u16)> {
    let text = buffer_text(buffer);
    text.lines().enumerate().find_map(|(y, line)| {
        line.find(needle)
            .map(|byte| (line[..byte].chars().count() as u16, y as u16))
    })
}

fn draw_views(views: &[ViewModel], display: &DisplayConfig, status: &CycleStatus) -> Buffer {
    let screen = compose_screen(views, display, status, 3);
    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            render_screen(frame, area, &screen);
        })
        .unwrap();
    terminal.backend().buffer().clone()
}

#[test]
fn test_sections_are_drawn_in_id_order() {
    let views = [view(0, 10, vec![]), view(1, 95, vec![own_process(1)])];
    let buffer = draw_views(&views, &DisplayConfig::default(), &CycleStatus::default());

    let (_, gpu0) = find(&buffer, "GPU 0 │ NVIDIA A100 │ P0").unwrap();
    let (_, gpu1) = find(&buffer, "GPU 1 │ NVIDIA A100 │ P0").unwrap();
    assert!(gpu0 < gpu1);

    assert!(find(&buffer, "No processes").is_some());
    assert!(find(&buffer, "Utilization").is_some());
}

#[test]
fn test_usage_and_owner_colors() {
    let views = [view(0, 10, vec![]), view(1, 95, vec![own_process(1)])];
    let buffer = draw_views(&views, &DisplayConfig::default(), &CycleStatus::default());

    let (x, y) = find(&buffer, "10%").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Green);
    let (x, y) = find(&buffer, "95%").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Red);

    let (x, y) = find(&buffer, "python train.py").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Blue);
}

#[test]
fn test_compact_mode_has_no_graphs() {
    let views = [view(0, 10, vec![])];
    let buffer = draw_views(&views, &DisplayConfig::new(true, []), &CycleStatus::default());

    assert!(find(&buffer, "GPU 0").is_some());
    assert!(find(&buffer, "Utilization").is_none());
    assert!(find(&buffer, "█").is_none());
}

#[test]
fn test_command_comments_are_colored() {
    let mut process = own_process(0);
    process.process.command = "train.py <!!checkpoint late!!>".to_string();
    let views = [view(0, 10, vec![process])];
    let buffer = draw_views(&views, &DisplayConfig::default(), &CycleStatus::default());

    let (x, y) = find(&buffer, "checkpoint late").unwrap();
    assert_eq!(buffer[(x, y)].fg, Color::Yellow);
}

#[test]
fn test_render_ui_shows_header_and_stale_footer() {
    let status = CycleStatus {
        failures: vec![SourceFailure {
            source: SourceKind::Gpu,
            reason: "nvidia-smi timed out after 2s".to_string(),
        }],
        consecutive_failures: 1,
        skipped_records: 0,
    };
    let views = vec![view(0, 10, vec![])];
    let screen = compose_screen(&views, &DisplayConfig::default(), &status, 3);
    let report = CycleReport {
        cycle: 3,
        sampled_at: Local::now(),
        view_models: views,
        status,
        screen,
    };
    let app = MonitorApp::new(report, Duration::from_secs(1));

    let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
    terminal.draw(|frame| render_ui(frame, &app)).unwrap();
    let buffer = terminal.backend().buffer();

    assert!(find(buffer, "gpumon").is_some());
    assert!(find(buffer, "cycle 3").is_some());
    let (_, y) = find(buffer, "stale data (GPU query").unwrap();
    assert_eq!(y, 39);
}
