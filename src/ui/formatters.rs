use humansize::{format_size as human_format_size, BINARY};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Shown wherever a reading is unavailable
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a byte count in binary units (KiB, MiB, GiB)
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY)
}

pub fn format_optional_size(size: Option<u64>) -> String {
    size.map(format_size)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// `used / total`, with either side shown as N/A when unknown
pub fn format_memory(used: Option<u64>, total: Option<u64>) -> String {
    format!(
        "{} / {}",
        format_optional_size(used),
        format_optional_size(total)
    )
}

pub fn format_percent(value: Option<u8>) -> String {
    match value {
        Some(v) => format!("{}%", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_float_percent(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => NOT_AVAILABLE.to_string(),
    }
}

pub fn format_temperature(celsius: Option<u32>) -> String {
    match celsius {
        Some(t) => format!("{}°C", t),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// `draw / limit W`. The limit is omitted when unknown.
pub fn format_power(draw: Option<f32>, limit: Option<f32>) -> String {
    match (draw, limit) {
        (Some(d), Some(l)) => format!("{:.0} / {:.0} W", d, l),
        (Some(d), None) => format!("{:.0} W", d),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}

/// Cut `text` to at most `width` terminal columns, ending with `…` when cut
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Pad `text` with spaces to `width` terminal columns
pub fn pad_to_width(text: &str, width: usize) -> String {
    let current = text.width();
    if current >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - current))
    }
}
