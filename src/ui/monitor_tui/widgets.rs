use ratatui::{buffer::Buffer, prelude::*};

use crate::core::gpu_monitor::{CommentLevel, GraphBar, ProcessColor, StatusLevel, UsageColor};

const BAR_SYMBOLS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];
const UNAVAILABLE_SYMBOL: &str = "·";

pub fn usage_color(color: UsageColor) -> Color {
    match color {
        UsageColor::Low => Color::Green,
        UsageColor::High => Color::Red,
        UsageColor::Unavailable => Color::DarkGray,
    }
}

pub fn process_style(color: ProcessColor) -> Style {
    match color {
        ProcessColor::Own => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::BOLD),
        ProcessColor::Other => Style::default(),
    }
}

pub fn comment_color(level: CommentLevel) -> Color {
    match level {
        CommentLevel::Note => Color::Green,
        CommentLevel::Warning => Color::Yellow,
        CommentLevel::Alert => Color::Red,
    }
}

pub fn status_style(level: StatusLevel) -> Style {
    match level {
        StatusLevel::Ok => Style::default().fg(Color::DarkGray),
        StatusLevel::Warning => Style::default().fg(Color::Yellow),
        StatusLevel::Stale => Style::default().fg(Color::LightRed),
        StatusLevel::PersistentStale => Style::default()
            .fg(Color::White)
            .bg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

/// Bar chart of a usage history, one column per sample.
///
/// The newest sample sits at the right edge; older samples that do not fit
/// the area are cut on the left.
pub struct TrendChart<'a> {
    bars: &'a [GraphBar],
}

impl<'a> TrendChart<'a> {
    pub fn new(bars: &'a [GraphBar]) -> Self {
        Self { bars }
    }
}

impl Widget for TrendChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible = self.bars.len().min(area.width as usize);
        let bars = &self.bars[self.bars.len() - visible..];
        let left = area.right() - visible as u16;
        let levels = area.height as u32 * 8;

        for (i, bar) in bars.iter().enumerate() {
            let x = left + i as u16;
            let fg = usage_color(bar.color);

            let Some(value) = bar.value else {
                if let Some(cell) = buf.cell_mut((x, area.bottom() - 1)) {
                    cell.set_symbol(UNAVAILABLE_SYMBOL).set_fg(fg);
                }
                continue;
            };

            // Any non-zero reading shows at least one eighth
            let mut filled = (value.min(100) as u32 * levels).div_ceil(100);
            for row in (area.top()..area.bottom()).rev() {
                let eighths = filled.min(8);
                filled -= eighths;
                if eighths == 0 {
                    break;
                }
                if let Some(cell) = buf.cell_mut((x, row)) {
                    cell.set_symbol(BAR_SYMBOLS[eighths as usize]).set_fg(fg);
                }
            }
        }
    }
}
