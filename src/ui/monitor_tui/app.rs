use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::core::gpu_monitor::{CycleReport, GpuId, Scheduler, SourceAdapter};
use crate::core::{DisplayConfig, EngineConfig};
use crate::platform::NvidiaSmiSource;

use super::event_handler::{translate, MonitorEvent};
use super::render::render_ui;

type CrosstermTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Monitor application state
pub struct MonitorApp {
    /// Latest cycle, redrawn until the next one completes
    pub report: CycleReport,
    pub interval: Duration,
    pub should_quit: bool,
    pub show_help: bool,
    /// Set by a resize event, applied at the next tick
    pub resize_pending: bool,
}

impl MonitorApp {
    pub fn new(report: CycleReport, interval: Duration) -> Self {
        Self {
            report,
            interval,
            should_quit: false,
            show_help: false,
            resize_pending: false,
        }
    }

    /// Handle keyboard/terminal events
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::ToggleHelp => self.show_help = !self.show_help,
            MonitorEvent::Resize(cols, rows) => {
                log::debug!("Terminal resized to {}x{}", cols, rows);
                self.resize_pending = true;
            }
            MonitorEvent::None => {}
        }
    }

    pub fn update(&mut self, report: CycleReport) {
        self.report = report;
    }
}

/// Run the monitor TUI application
///
/// Builds the async runtime, runs the first cycle before touching the
/// terminal and then polls on a fixed interval until the user quits.
pub fn run_monitor_app(display: DisplayConfig, engine: EngineConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("gpumon-worker")
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(run(display, engine))
}

async fn run(display: DisplayConfig, engine: EngineConfig) -> Result<()> {
    let source = NvidiaSmiSource::new()?;

    // A GPU source that fails here ends the program before the TUI starts
    let (mut scheduler, report) = Scheduler::start(source, engine, display).await?;

    let (quit_tx, quit_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = quit_tx.send(true);
    })
    .context("Failed to install Ctrl-C handler")?;

    // The alternate screen would hide this, so it is printed first
    if let Some(warning) = unknown_filter_warning(&scheduler.unknown_filter_ids()) {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    let mut terminal = setup_terminal()?;
    let mut app = MonitorApp::new(report, scheduler.interval());

    let result = event_loop(&mut terminal, &mut app, &mut scheduler, quit_rx).await;

    scheduler.stop();
    restore_terminal(&mut terminal)?;
    result
}

fn unknown_filter_warning(ids: &[GpuId]) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    let ids = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("GPU filter names unknown id(s): {}", ids))
}

fn setup_terminal() -> Result<CrosstermTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut CrosstermTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

async fn event_loop<A: SourceAdapter>(
    terminal: &mut CrosstermTerminal,
    app: &mut MonitorApp,
    scheduler: &mut Scheduler<A>,
    mut quit_rx: watch::Receiver<bool>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(app.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires at once and the first cycle already ran
    ticker.tick().await;

    terminal
        .draw(|frame| render_ui(frame, app))
        .context("Failed to draw frame")?;

    while !app.should_quit {
        tokio::select! {
            _ = quit_rx.changed() => app.should_quit = true,
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => {
                    let event = translate(&event);
                    app.handle_event(event);
                    if event == MonitorEvent::ToggleHelp {
                        terminal
                            .draw(|frame| render_ui(frame, app))
                            .context("Failed to draw frame")?;
                    }
                }
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                None => app.should_quit = true,
            },
            _ = ticker.tick() => {
                let cycle = scheduler.run_cycle();
                tokio::pin!(cycle);

                // Input stays live while the queries run; quitting drops the
                // cycle, which kills its subprocesses
                let report = loop {
                    tokio::select! {
                        report = &mut cycle => break Some(report),
                        _ = quit_rx.changed() => break None,
                        Some(Ok(event)) = events.next() => {
                            app.handle_event(translate(&event));
                            if app.should_quit {
                                break None;
                            }
                        }
                    }
                };

                let Some(report) = report else {
                    app.should_quit = true;
                    continue;
                };
                app.update(report);

                if app.resize_pending {
                    terminal.clear().context("Failed to clear terminal")?;
                    app.resize_pending = false;
                }
                terminal
                    .draw(|frame| render_ui(frame, app))
                    .context("Failed to draw frame")?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gpu_monitor::{CycleStatus, Screen};
    use chrono::Local;

    fn app() -> MonitorApp {
        let report = CycleReport {
            cycle: 1,
            sampled_at: Local::now(),
            view_models: Vec::new(),
            status: CycleStatus::default(),
            screen: Screen {
                sections: Vec::new(),
                status: None,
                compact: false,
            },
        };
        MonitorApp::new(report, Duration::from_secs(1))
    }

    #[test]
    fn test_handle_event() {
        let mut app = app();

        app.handle_event(MonitorEvent::ToggleHelp);
        assert!(app.show_help);
        app.handle_event(MonitorEvent::ToggleHelp);
        assert!(!app.show_help);

        app.handle_event(MonitorEvent::Resize(80, 24));
        assert!(app.resize_pending);
        assert!(!app.should_quit);

        app.handle_event(MonitorEvent::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_unknown_filter_warning() {
        assert_eq!(unknown_filter_warning(&[]), None);
        assert_eq!(
            unknown_filter_warning(&[4, 7]).as_deref(),
            Some("GPU filter names unknown id(s): 4, 7")
        );
    }
}
