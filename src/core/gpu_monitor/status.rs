use std::fmt;

/// The two external data sources polled every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Gpu,
    /// Compute processes reported by the GPU-diagnostic command
    ComputeApps,
    Processes,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Gpu => write!(f, "GPU query"),
            SourceKind::ComputeApps => write!(f, "compute-apps query"),
            SourceKind::Processes => write!(f, "process listing"),
        }
    }
}

/// A source whose data could not be refreshed this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
}

/// Health of one cycle, as shown by the status line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleStatus {
    /// Sources that failed this cycle; their previous data was reused.
    pub failures: Vec<SourceFailure>,
    /// Cycles in a row, including this one, with at least one failure.
    pub consecutive_failures: u32,
    /// Malformed lines skipped while parsing this cycle's fresh data.
    pub skipped_records: usize,
}

impl CycleStatus {
    pub fn is_stale(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn is_fresh(&self, source: SourceKind) -> bool {
        !self.failures.iter().any(|f| f.source == source)
    }
}
