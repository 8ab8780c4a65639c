//! Queue overview and health computation.
//!
//! This module turns a [`Window`] of samples into per-queue rows with
//! window deltas, a backlog sparkline and a health status computed from
//! configurable thresholds.

use queuewatch_types::{Metric, QueueStat};
use serde::{Deserialize, Serialize};

use super::aggregate;
use super::downsample::reduce;
use super::window::Window;

/// Thresholds for health status computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Failures within the window that trigger a warning.
    pub failed_warning: u64,
    /// Failures within the window that trigger critical status.
    pub failed_critical: u64,
    /// Backlog as a multiple of recommended concurrency that triggers a warning.
    pub backlog_ratio_warning: f64,
    /// Backlog as a multiple of recommended concurrency that triggers critical status.
    pub backlog_ratio_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            failed_warning: 1,
            failed_critical: 10,
            backlog_ratio_warning: 2.0,
            backlog_ratio_critical: 5.0,
        }
    }
}

impl Thresholds {
    fn failed_status(&self, failed: u64) -> HealthStatus {
        if failed >= self.failed_critical {
            HealthStatus::Critical
        } else if failed >= self.failed_warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }

    fn backlog_status(&self, backlog: u64, concurrency: u64) -> HealthStatus {
        if concurrency == 0 {
            return HealthStatus::Healthy;
        }
        let ratio = backlog as f64 / concurrency as f64;
        if ratio >= self.backlog_ratio_critical {
            HealthStatus::Critical
        } else if ratio >= self.backlog_ratio_warning {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Health status for a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "OK",
            HealthStatus::Warning => "WARN",
            HealthStatus::Critical => "CRIT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Warning => "Warning",
            HealthStatus::Critical => "Critical",
        }
    }
}

/// One queue's state over a window.
#[derive(Debug, Clone, Serialize)]
pub struct QueueSummary {
    pub key: String,
    /// Counters at the newest sample.
    pub current: QueueStat,
    /// Successes completed within the window.
    pub success_delta: u64,
    /// Failures within the window.
    pub failed_delta: u64,
    /// Mean running jobs over the window.
    pub avg_running: u64,
    /// Highest backlog seen in the window.
    pub peak_backlog: u64,
    /// Backlog per sample, downsampled for a sparkline.
    pub backlog_trend: Vec<u64>,
    pub health: HealthStatus,
}

impl QueueSummary {
    /// Summarise one queue over the window.
    pub fn from_window(
        window: &Window<'_>,
        key: &str,
        thresholds: &Thresholds,
        max_points: usize,
    ) -> Self {
        let current = window.last().and_then(|s| s.stat(key)).copied().unwrap_or_default();
        let backlog = aggregate::backlog_series(window, key);
        let failed_delta = aggregate::delta(window, key, Metric::Failed);

        let health = thresholds
            .failed_status(failed_delta)
            .max(thresholds.backlog_status(current.backlog(), current.recommended_concurrency));

        Self {
            key: key.to_string(),
            current,
            success_delta: aggregate::delta(window, key, Metric::Success),
            failed_delta,
            avg_running: aggregate::average(window, key, Metric::Running),
            peak_backlog: backlog.iter().copied().max().unwrap_or(0),
            backlog_trend: reduce(&backlog, max_points),
            health,
        }
    }

    /// Current backlog (`queued + running + retrying`).
    pub fn backlog(&self) -> u64 {
        self.current.backlog()
    }
}

/// Every queue in a window, worst health first.
#[derive(Debug, Clone, Serialize)]
pub struct QueueOverview {
    pub queues: Vec<QueueSummary>,
    /// Number of samples the window held.
    pub sample_count: usize,
    /// Milliseconds between the oldest and newest sample.
    pub span_ms: u64,
    /// Timestamp of the newest sample, if any.
    pub latest_ms: Option<u64>,
}

impl QueueOverview {
    /// Summarise every queue seen anywhere in the window.
    pub fn build(window: &Window<'_>, thresholds: &Thresholds, max_points: usize) -> Self {
        let mut queues: Vec<QueueSummary> = window
            .keys()
            .into_iter()
            .map(|key| QueueSummary::from_window(window, key, thresholds, max_points))
            .collect();

        // Sort by health status (critical first), then by key
        queues.sort_by(|a, b| b.health.cmp(&a.health).then_with(|| a.key.cmp(&b.key)));

        Self {
            queues,
            sample_count: window.len(),
            span_ms: window.span_ms(),
            latest_ms: window.last().map(|s| s.timestamp_ms),
        }
    }

    /// Queues that are not healthy.
    pub fn unhealthy(&self) -> impl Iterator<Item = &QueueSummary> {
        self.queues.iter().filter(|q| q.health != HealthStatus::Healthy)
    }

    /// Count of queues at the given status.
    pub fn count(&self, status: HealthStatus) -> usize {
        self.queues.iter().filter(|q| q.health == status).count()
    }

    /// Sum of one current counter across all queues.
    pub fn total(&self, metric: Metric) -> u64 {
        self.queues.iter().map(|q| q.current.get(metric)).sum()
    }

    /// True if any queue has work waiting or in flight.
    pub fn is_active(&self) -> bool {
        self.queues.iter().any(|q| !q.current.is_idle())
    }
}
