//! Terminal User Interface for GPU monitoring.
//!
//! Draws each cycle's composed screen with ratatui and drives the polling
//! loop from keyboard input and a fixed tick.

mod app;
mod event_handler;
mod render;
mod widgets;

pub use app::{run_monitor_app, MonitorApp};
pub use event_handler::{translate, MonitorEvent};
pub use render::{render_screen, render_ui, COLOR_LEGEND};
pub use widgets::TrendChart;
