//! Display policy.
//!
//! Pure decisions taken on already-computed data: usage colors, process
//! colors, GPU visibility, status severity and command annotations.

use std::collections::BTreeSet;

use super::metrics::{GpuId, ProcessTag};
use super::status::CycleStatus;

/// Usage at or above this percentage is drawn as high load.
pub const HIGH_USAGE_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageColor {
    Low,
    High,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessColor {
    Own,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusLevel {
    Ok,
    Warning,
    Stale,
    PersistentStale,
}

/// Severity of an inline `<! ... !>` comment inside a process command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentLevel {
    Note,
    Warning,
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    pub text: String,
    pub comment: Option<CommentLevel>,
}

/// Color for a usage percentage (`None` = unavailable).
pub fn color_for_usage(percent: Option<u8>) -> UsageColor {
    match percent {
        None => UsageColor::Unavailable,
        Some(p) if p >= HIGH_USAGE_THRESHOLD => UsageColor::High,
        Some(_) => UsageColor::Low,
    }
}

pub fn color_for_tag(tag: ProcessTag) -> ProcessColor {
    match tag {
        ProcessTag::Own => ProcessColor::Own,
        ProcessTag::Other => ProcessColor::Other,
    }
}

/// An empty filter shows every GPU. Ids that never appear simply never match.
pub fn is_visible(gpu_id: GpuId, filter: &BTreeSet<GpuId>) -> bool {
    filter.is_empty() || filter.contains(&gpu_id)
}

/// Severity of a cycle's status. Staleness escalates once it has lasted
/// `escalate_after` consecutive cycles.
pub fn status_level(status: &CycleStatus, escalate_after: u32) -> StatusLevel {
    if status.is_stale() {
        if status.consecutive_failures >= escalate_after.max(1) {
            StatusLevel::PersistentStale
        } else {
            StatusLevel::Stale
        }
    } else if status.skipped_records > 0 {
        StatusLevel::Warning
    } else {
        StatusLevel::Ok
    }
}

/// Split a command line into plain text and commented segments.
///
/// `<!`, `<!!` and `<!!!` open a note, warning or alert comment; `!>`,
/// `!!>` or `!!!>` close it. Markers are removed from the output.
pub fn annotate_command(command: &str) -> Vec<CommandSegment> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut comment = None;
    let mut rest = command;

    while let Some(ch) = rest.chars().next() {
        if let Some((len, level)) = opening_marker(rest) {
            flush(&mut segments, &mut current, comment);
            comment = Some(level);
            rest = &rest[len..];
            continue;
        }
        if comment.is_some() {
            if let Some(len) = closing_marker(rest) {
                flush(&mut segments, &mut current, comment);
                comment = None;
                rest = &rest[len..];
                continue;
            }
        }
        current.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush(&mut segments, &mut current, comment);

    segments
}

fn opening_marker(s: &str) -> Option<(usize, CommentLevel)> {
    if s.starts_with("<!!!") {
        Some((4, CommentLevel::Alert))
    } else if s.starts_with("<!!") {
        Some((3, CommentLevel::Warning))
    } else if s.starts_with("<!") {
        Some((2, CommentLevel::Note))
    } else {
        None
    }
}

fn closing_marker(s: &str) -> Option<usize> {
    ["!!!>", "!!>", "!>"]
        .iter()
        .find(|marker| s.starts_with(**marker))
        .map(|marker| marker.len())
}

fn flush(segments: &mut Vec<CommandSegment>, current: &mut String, comment: Option<CommentLevel>) {
    if !current.is_empty() {
        segments.push(CommandSegment {
            text: std::mem::take(current),
            comment,
        });
    }
}
