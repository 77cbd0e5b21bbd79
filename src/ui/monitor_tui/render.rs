use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

use crate::core::gpu_monitor::{
    CommandSegment, GpuSection, GraphBar, ProcessRow, Screen, StatusIndicator,
};
use crate::ui::formatters::{
    format_float_percent, format_memory, format_optional_size, format_percent, format_power,
    format_temperature, pad_to_width, truncate_to_width,
};

use super::app::MonitorApp;
use super::widgets::{comment_color, process_style, status_style, usage_color, TrendChart};

/// Rows used by the two trend charts of a section, label included
const GRAPH_HEIGHT: u16 = 5;

/// Longest GPU name shown in a section title
const MAX_NAME_WIDTH: usize = 40;

/// Color legend, shared by the help overlay and `--help`
pub const COLOR_LEGEND: &[(&str, &str)] = &[
    ("green", "usage below 80%"),
    ("red", "usage at or above 80%"),
    ("gray ·", "reading unavailable"),
    ("blue", "process owned by you"),
    ("<! .. !>", "note in a command line (green)"),
    ("<!! .. !!>", "warning in a command line (yellow)"),
    ("<!!! .. !!!>", "alert in a command line (red)"),
];

/// Main render function
pub fn render_ui(frame: &mut Frame, app: &MonitorApp) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // GPU sections
            Constraint::Length(1), // Footer / status
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_screen(frame, chunks[1], &app.report.screen);
    render_footer(frame, chunks[2], app.report.screen.status.as_ref());

    if app.show_help {
        render_help_overlay(frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &MonitorApp) {
    let report = &app.report;
    let line = Line::from(vec![
        Span::styled(
            " gpumon ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " {} │ cycle {} │ every {:.1}s",
            report.sampled_at.format("%H:%M:%S"),
            report.cycle,
            app.interval.as_secs_f32()
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Paint a composed screen into `area`.
pub fn render_screen(frame: &mut Frame, area: Rect, screen: &Screen) {
    if screen.sections.is_empty() {
        let para = Paragraph::new("No GPUs to display")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(para, area);
        return;
    }

    let mut constraints: Vec<Constraint> = screen
        .sections
        .iter()
        .map(|section| Constraint::Length(section_height(section)))
        .collect();
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (section, chunk) in screen.sections.iter().zip(chunks.iter()) {
        render_gpu_section(frame, *chunk, section);
    }
}

fn section_height(section: &GpuSection) -> u16 {
    // Borders, stats line, table header and at least one row
    let table = section.processes.len().max(1) as u16 + 1;
    let graph = if section.graph.is_some() { GRAPH_HEIGHT } else { 0 };
    2 + 1 + table + graph
}

fn render_gpu_section(frame: &mut Frame, area: Rect, section: &GpuSection) {
    let gpu = &section.gpu;
    let mut title = format!(
        " GPU {} │ {} ",
        gpu.id,
        truncate_to_width(&gpu.name, MAX_NAME_WIDTH)
    );
    if let Some(pstate) = &gpu.perf_state {
        title.push_str(&format!("│ {} ", pstate));
    }

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(usage_color(section.utilization_color)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 {
        return;
    }

    let graph_height = if section.graph.is_some() { GRAPH_HEIGHT } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(graph_height),
        ])
        .split(inner);

    render_stats_line(frame, chunks[0], section);
    render_process_table(frame, chunks[1], &section.processes);

    if let Some(graph) = &section.graph {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        render_trend(frame, halves[0], "Utilization", &graph.utilization);
        render_trend(frame, halves[1], "Memory", &graph.memory);
    }
}

fn render_stats_line(frame: &mut Frame, area: Rect, section: &GpuSection) {
    let gpu = &section.gpu;
    let label = Style::default().fg(Color::DarkGray);

    let line = Line::from(vec![
        Span::styled("Util ", label),
        Span::styled(
            format_percent(gpu.utilization),
            Style::default()
                .fg(usage_color(section.utilization_color))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Mem ", label),
        Span::styled(
            format!(
                "{} ({})",
                format_memory(gpu.memory_used_bytes, gpu.memory_total_bytes),
                format_percent(section.memory_percent)
            ),
            Style::default().fg(usage_color(section.memory_color)),
        ),
        Span::styled("  Temp ", label),
        Span::raw(format_temperature(gpu.temperature_celsius)),
        Span::styled("  Fan ", label),
        Span::raw(format_percent(gpu.fan_speed_percent)),
        Span::styled("  Power ", label),
        Span::raw(format_power(gpu.power_draw_watts, gpu.power_limit_watts)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_process_table(frame: &mut Frame, area: Rect, processes: &[ProcessRow]) {
    if area.height == 0 {
        return;
    }

    if processes.is_empty() {
        let para = Paragraph::new("No processes").style(Style::default().fg(Color::Magenta));
        frame.render_widget(para, area);
        return;
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(vec![
        Cell::from("User").style(bold),
        Cell::from("PID").style(bold),
        Cell::from("%CPU").style(bold),
        Cell::from("%RAM").style(bold),
        Cell::from("GPU Mem").style(bold),
        Cell::from("Command").style(bold),
    ])
    .height(1);

    let rows: Vec<Row> = processes
        .iter()
        .map(|row| {
            let proc = &row.process;
            Row::new(vec![
                Cell::from(proc.user.clone()),
                Cell::from(proc.pid.to_string()),
                Cell::from(format_float_percent(proc.cpu_percent)),
                Cell::from(format_float_percent(proc.mem_percent)),
                Cell::from(format_optional_size(proc.gpu_memory_bytes)),
                Cell::from(command_line(&row.command)),
            ])
            .style(process_style(row.color))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Min(10),
        ],
    )
    .header(header);

    frame.render_widget(table, area);
}

fn command_line(segments: &[CommandSegment]) -> Line<'static> {
    let spans: Vec<Span> = segments
        .iter()
        .map(|segment| match segment.comment {
            Some(level) => Span::styled(
                segment.text.clone(),
                Style::default()
                    .fg(comment_color(level))
                    .add_modifier(Modifier::ITALIC),
            ),
            None => Span::raw(segment.text.clone()),
        })
        .collect();
    Line::from(spans)
}

fn render_trend(frame: &mut Frame, area: Rect, label: &str, bars: &[GraphBar]) {
    let block = Block::default()
        .title(format!(" {} ", label))
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(TrendChart::new(bars), inner);
}

fn render_footer(frame: &mut Frame, area: Rect, status: Option<&StatusIndicator>) {
    let para = match status {
        Some(indicator) => Paragraph::new(format!(" {} ", indicator.message))
            .style(status_style(indicator.level)),
        None => Paragraph::new(" q: Quit │ ?: Help ")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(para, area);
}

fn help_text() -> String {
    let mut text = String::from(
        "\n    gpumon - Help\n\n    Keyboard Shortcuts:\n    ─────────────────────────────────────\n    q / Esc     Quit the application\n    Ctrl-C      Quit the application\n    ? / h       Toggle this help screen\n\n    Colors:\n    ─────────────────────────────────────\n",
    );
    for (key, meaning) in COLOR_LEGEND {
        text.push_str(&format!("    {} {}\n", pad_to_width(key, 14), meaning));
    }
    text
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::DarkGray));

    let paragraph = Paragraph::new(help_text())
        .block(block)
        .alignment(Alignment::Left);

    // Center the help popup
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(paragraph, popup_area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
