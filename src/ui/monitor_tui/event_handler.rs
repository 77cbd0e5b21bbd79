use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events that can occur in the monitor TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    /// Quit the application
    Quit,
    /// Toggle help overlay
    ToggleHelp,
    /// Terminal was resized to (columns, rows)
    Resize(u16, u16),
    /// No action
    None,
}

/// Map a terminal event to a monitor event.
pub fn translate(event: &Event) -> MonitorEvent {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => translate_key(key),
        Event::Resize(cols, rows) => MonitorEvent::Resize(*cols, *rows),
        _ => MonitorEvent::None,
    }
}

fn translate_key(key: &KeyEvent) -> MonitorEvent {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => MonitorEvent::Quit,
        KeyCode::Char('q') | KeyCode::Esc => MonitorEvent::Quit,
        KeyCode::Char('?') | KeyCode::Char('h') => MonitorEvent::ToggleHelp,
        _ => MonitorEvent::None,
    }
}
