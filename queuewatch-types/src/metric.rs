//! Per-queue counters and the closed set of metric names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Counters reported for a single work queue at one point in time.
///
/// Values are whatever the backend reported. They are not guaranteed to be
/// monotonic: a queue can be deleted and recreated, and counters can reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QueueStat {
    /// Jobs created but not yet handed to the queue.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub pending: u64,

    /// Jobs waiting in the queue for a worker.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub queued: u64,

    /// Jobs currently executing.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub running: u64,

    /// Jobs that finished successfully.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub success: u64,

    /// Jobs that failed permanently.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub failed: u64,

    /// Jobs waiting for another attempt.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub retrying: u64,

    /// Concurrency the backend recommends for this queue.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::counter"))]
    pub recommended_concurrency: u64,
}

impl QueueStat {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for queue counters.
    pub fn builder() -> QueueStatBuilder {
        QueueStatBuilder::new()
    }

    /// Read a single counter.
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Pending => self.pending,
            Metric::Queued => self.queued,
            Metric::Running => self.running,
            Metric::Success => self.success,
            Metric::Failed => self.failed,
            Metric::Retrying => self.retrying,
            Metric::RecommendedConcurrency => self.recommended_concurrency,
        }
    }

    /// Work that is waiting on or occupying workers: `queued + running + retrying`.
    pub fn backlog(&self) -> u64 {
        self.queued.saturating_add(self.running).saturating_add(self.retrying)
    }

    /// True when nothing is pending, queued, running or retrying.
    pub fn is_idle(&self) -> bool {
        self.backlog() == 0 && self.pending == 0
    }
}

/// Builder for [`QueueStat`].
#[derive(Debug, Default)]
pub struct QueueStatBuilder {
    stat: QueueStat,
}

impl QueueStatBuilder {
    /// Create a builder with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(mut self, value: u64) -> Self {
        self.stat.pending = value;
        self
    }

    pub fn queued(mut self, value: u64) -> Self {
        self.stat.queued = value;
        self
    }

    pub fn running(mut self, value: u64) -> Self {
        self.stat.running = value;
        self
    }

    pub fn success(mut self, value: u64) -> Self {
        self.stat.success = value;
        self
    }

    pub fn failed(mut self, value: u64) -> Self {
        self.stat.failed = value;
        self
    }

    pub fn retrying(mut self, value: u64) -> Self {
        self.stat.retrying = value;
        self
    }

    pub fn recommended_concurrency(mut self, value: u64) -> Self {
        self.stat.recommended_concurrency = value;
        self
    }

    /// Set a counter by metric name.
    pub fn set(mut self, metric: Metric, value: u64) -> Self {
        match metric {
            Metric::Pending => self.stat.pending = value,
            Metric::Queued => self.stat.queued = value,
            Metric::Running => self.stat.running = value,
            Metric::Success => self.stat.success = value,
            Metric::Failed => self.stat.failed = value,
            Metric::Retrying => self.stat.retrying = value,
            Metric::RecommendedConcurrency => self.stat.recommended_concurrency = value,
        }
        self
    }

    pub fn build(self) -> QueueStat {
        self.stat
    }
}

/// One of the counters carried by [`QueueStat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    Pending,
    Queued,
    Running,
    Success,
    Failed,
    Retrying,
    RecommendedConcurrency,
}

impl Metric {
    /// Every metric, in display order.
    pub const ALL: [Metric; 7] = [
        Metric::Pending,
        Metric::Queued,
        Metric::Running,
        Metric::Success,
        Metric::Failed,
        Metric::Retrying,
        Metric::RecommendedConcurrency,
    ];

    /// Wire name of the metric (matches the JSON field name).
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Pending => "pending",
            Metric::Queued => "queued",
            Metric::Running => "running",
            Metric::Success => "success",
            Metric::Failed => "failed",
            Metric::Retrying => "retrying",
            Metric::RecommendedConcurrency => "recommended_concurrency",
        }
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Pending => "Pending",
            Metric::Queued => "Queued",
            Metric::Running => "Running",
            Metric::Success => "Success",
            Metric::Failed => "Failed",
            Metric::Retrying => "Retrying",
            Metric::RecommendedConcurrency => "Concurrency",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a metric name is not one of the known counters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown metric `{0}` (expected one of pending, queued, running, success, failed, retrying, recommended_concurrency)")]
pub struct ParseMetricError(pub String);

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ParseMetricError(s.to_string()))
    }
}
