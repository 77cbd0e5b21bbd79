use std::collections::{HashMap, VecDeque};

use super::metrics::GpuId;

/// Metrics that keep a trend series per GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Utilization,
    MemoryPercent,
}

/// A sample is `None` when the source reported the value as unavailable.
pub type Sample = Option<u8>;

/// Circular buffer of recent samples for one (GPU, metric) pair
#[derive(Debug, Clone)]
pub struct HistorySeries {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl HistorySeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: Sample) {
        if self.capacity == 0 {
            return;
        }
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Oldest first
    pub fn to_vec(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}

/// Per-GPU trend history, owned by the scheduler for the whole run.
///
/// Series are created the first time a GPU is recorded. A GPU that is not
/// recorded in a cycle simply gets no new point.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    capacity: usize,
    series: HashMap<(GpuId, Metric), HistorySeries>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: HashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a utilization sample for `gpu_id`.
    pub fn record(&mut self, gpu_id: GpuId, sample: Sample) {
        self.record_metric(gpu_id, Metric::Utilization, sample);
    }

    pub fn record_metric(&mut self, gpu_id: GpuId, metric: Metric, sample: Sample) {
        let capacity = self.capacity;
        self.series
            .entry((gpu_id, metric))
            .or_insert_with(|| HistorySeries::with_capacity(capacity))
            .push(sample);
    }

    /// Retained utilization samples for `gpu_id`, oldest first.
    pub fn series_for(&self, gpu_id: GpuId) -> Vec<Sample> {
        self.metric_series(gpu_id, Metric::Utilization)
    }

    pub fn metric_series(&self, gpu_id: GpuId, metric: Metric) -> Vec<Sample> {
        self.series
            .get(&(gpu_id, metric))
            .map(HistorySeries::to_vec)
            .unwrap_or_default()
    }
}
