//! Tolerant parsers for the raw text produced by the data sources.
//!
//! Each parser works line by line. A line missing one of the fixed fields,
//! or whose key field (GPU index, PID) is not a number, is skipped and
//! reported as an issue; a bad value in any other numeric field only turns
//! that field into `None`.

use std::str::FromStr;

use thiserror::Error;

use super::metrics::{GpuProcessRecord, GpuSnapshot, HostProcess};

/// Fields requested from `nvidia-smi --query-gpu`, in order.
pub const GPU_QUERY_FIELDS: &[&str] = &[
    "index",
    "uuid",
    "name",
    "utilization.gpu",
    "memory.used",
    "memory.total",
    "temperature.gpu",
    "fan.speed",
    "power.draw",
    "power.limit",
    "pstate",
];

/// Fields requested from `nvidia-smi --query-compute-apps`, in order.
pub const COMPUTE_APP_QUERY_FIELDS: &[&str] = &["gpu_uuid", "pid", "used_memory", "process_name"];

/// Columns requested from `ps -o`; the command is always last.
pub const PROCESS_TABLE_COLUMNS: &[&str] = &["pid", "user:32", "pcpu", "pmem", "args"];

const BYTES_PER_MIB: u64 = 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("{origin} line {line}: {reason}")]
    Malformed {
        origin: &'static str,
        line: usize,
        reason: String,
    },

    #[error("{origin}: no well-formed records in {lines} line(s)")]
    NoRecords { origin: &'static str, lines: usize },
}

/// Records recovered from one source plus the lines that had to be skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub issues: Vec<ParseError>,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
        }
    }
}

/// Values too large to express in bytes are treated as unavailable.
fn mib_to_bytes(mib: u64) -> Option<u64> {
    mib.checked_mul(BYTES_PER_MIB)
}

/// Parse `nvidia-smi --query-gpu=<GPU_QUERY_FIELDS> --format=csv,noheader,nounits`.
pub fn parse_gpus(text: &str) -> Result<Parsed<GpuSnapshot>, ParseError> {
    parse_lines(text, "gpu query", |line| {
        let fields = csv_fields(line);
        if fields.len() < GPU_QUERY_FIELDS.len() {
            return Err(format!(
                "expected {} fields, found {}",
                GPU_QUERY_FIELDS.len(),
                fields.len()
            ));
        }

        let id = fields[0]
            .parse::<u32>()
            .map_err(|_| format!("invalid GPU index {:?}", fields[0]))?;

        let memory_total = number::<u64>(fields[5]).and_then(mib_to_bytes);
        let memory_used = number::<u64>(fields[4]).and_then(mib_to_bytes).map(|used| {
            // A driver can briefly report used > total while memory is being released
            memory_total.map_or(used, |total| used.min(total))
        });

        Ok(Some(GpuSnapshot {
            id,
            uuid: fields[1].to_string(),
            name: fields[2].to_string(),
            utilization: percent(fields[3]),
            memory_used_bytes: memory_used,
            memory_total_bytes: memory_total,
            temperature_celsius: number(fields[6]),
            fan_speed_percent: percent(fields[7]),
            power_draw_watts: number::<f32>(fields[8]).filter(|w| w.is_finite() && *w >= 0.0),
            power_limit_watts: number::<f32>(fields[9]).filter(|w| w.is_finite() && *w > 0.0),
            perf_state: text_value(fields[10]),
        }))
    })
}

/// Parse `nvidia-smi --query-compute-apps=<COMPUTE_APP_QUERY_FIELDS> --format=csv,noheader,nounits`.
pub fn parse_compute_apps(text: &str) -> Result<Parsed<GpuProcessRecord>, ParseError> {
    parse_lines(text, "compute-apps query", |line| {
        if line.starts_with("No running") {
            return Ok(None);
        }

        let fields = csv_fields(line);
        if fields.len() < COMPUTE_APP_QUERY_FIELDS.len() {
            return Err(format!(
                "expected {} fields, found {}",
                COMPUTE_APP_QUERY_FIELDS.len(),
                fields.len()
            ));
        }

        let pid = parse_pid(fields[1])?;

        Ok(Some(GpuProcessRecord {
            gpu_uuid: fields[0].to_string(),
            pid,
            used_memory_bytes: number::<u64>(fields[2]).and_then(mib_to_bytes),
            process_name: fields[3].to_string(),
        }))
    })
}

/// Parse `ps -e --no-headers -o <PROCESS_TABLE_COLUMNS>`.
///
/// The command column keeps its inner spacing. A `PID ...` header line is
/// accepted and skipped in case the listing was produced with headers.
pub fn parse_process_table(text: &str) -> Result<Parsed<HostProcess>, ParseError> {
    let fixed = PROCESS_TABLE_COLUMNS.len() - 1;

    parse_lines(text, "process listing", |line| {
        let Some((fields, command)) = split_leading_fields(line, fixed) else {
            return Err(format!("expected at least {} columns", PROCESS_TABLE_COLUMNS.len()));
        };

        if fields[0] == "PID" {
            return Ok(None);
        }

        let pid = parse_pid(fields[0])?;

        Ok(Some(HostProcess {
            pid,
            user: fields[1].to_string(),
            cpu_percent: number::<f32>(fields[2]).filter(|v| v.is_finite()),
            mem_percent: number::<f32>(fields[3]).filter(|v| v.is_finite()),
            command: command.to_string(),
        }))
    })
}

/// Shared line driver.
///
/// `parse_line` returns `Ok(Some(record))` for a record, `Ok(None)` for a
/// line that carries no record (header, informational message) and
/// `Err(reason)` for a malformed line.
fn parse_lines<T>(
    text: &str,
    origin: &'static str,
    mut parse_line: impl FnMut(&str) -> std::result::Result<Option<T>, String>,
) -> Result<Parsed<T>, ParseError> {
    let mut parsed = Parsed::default();
    let mut candidates = 0;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(Some(record)) => {
                candidates += 1;
                parsed.records.push(record);
            }
            Ok(None) => {}
            Err(reason) => {
                candidates += 1;
                log::debug!("Skipping malformed {} line {}: {}", origin, index + 1, reason);
                parsed.issues.push(ParseError::Malformed {
                    origin,
                    line: index + 1,
                    reason,
                });
            }
        }
    }

    if candidates > 0 && parsed.records.is_empty() {
        return Err(ParseError::NoRecords {
            origin,
            lines: candidates,
        });
    }

    Ok(parsed)
}

fn csv_fields(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Split off `count` whitespace-separated fields and return them together
/// with the untouched remainder, which must be non-empty.
fn split_leading_fields(line: &str, count: usize) -> Option<(Vec<&str>, &str)> {
    let mut fields = Vec::with_capacity(count);
    let mut rest = line.trim_start();

    for _ in 0..count {
        let end = rest.find(char::is_whitespace)?;
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }

    let rest = rest.trim_end();
    if rest.is_empty() {
        None
    } else {
        Some((fields, rest))
    }
}

fn parse_pid(field: &str) -> std::result::Result<u32, String> {
    match field.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(format!("invalid PID {:?}", field)),
    }
}

fn number<T: FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

fn percent(field: &str) -> Option<u8> {
    number::<u32>(field)
        .filter(|v| *v <= 100)
        .map(|v| v as u8)
}

fn text_value(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() || field.starts_with('[') || field.starts_with("N/A") {
        None
    } else {
        Some(field.to_string())
    }
}
