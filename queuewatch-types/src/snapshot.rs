//! Snapshot - one polled reading of every queue's counters.

use std::collections::BTreeMap;

use crate::{Metric, QueueStat, QueueStatBuilder};

/// Identifier for a logical work queue (for example a provider/model pairing).
pub type QueueKey = String;

/// A point-in-time reading of all queue counters.
///
/// Snapshots are produced once per poll tick and never mutated after they
/// have been handed to a sample buffer.
///
/// # Example
///
/// ```rust
/// use queuewatch_types::Snapshot;
///
/// let snapshot = Snapshot::builder()
///     .timestamp_ms(60_000)
///     .queue("gpu", |q| q.queued(15))
///     .build();
///
/// assert_eq!(snapshot.timestamp_ms, 60_000);
/// assert_eq!(snapshot.stat("gpu").map(|s| s.queued), Some(15));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Snapshot {
    /// Unix timestamp in milliseconds when the reading was taken.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "timestamp", deserialize_with = "crate::lenient::counter")
    )]
    pub timestamp_ms: u64,

    /// Counters for each queue, keyed by queue key.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "crate::lenient::queues"))]
    pub queues: BTreeMap<QueueKey, QueueStat>,
}

impl Snapshot {
    /// Create an empty snapshot taken at the given time.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            queues: BTreeMap::new(),
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Check if the snapshot has no queues.
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Number of queues in the snapshot.
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    /// Counters for one queue, if it was reported.
    pub fn stat(&self, key: &str) -> Option<&QueueStat> {
        self.queues.get(key)
    }

    /// One counter for one queue. An unreported queue reads as zero.
    pub fn value(&self, key: &str, metric: Metric) -> u64 {
        self.stat(key).map_or(0, |s| s.get(metric))
    }

    /// Queue keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    /// Iterate over all queues.
    pub fn iter(&self) -> impl Iterator<Item = (&QueueKey, &QueueStat)> {
        self.queues.iter()
    }

    /// Sum of one counter across every queue.
    pub fn total(&self, metric: Metric) -> u64 {
        self.queues.values().map(|s| s.get(metric)).sum()
    }
}

/// Builder for constructing [`Snapshot`] instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    timestamp_ms: Option<u64>,
    queues: BTreeMap<QueueKey, QueueStat>,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Add a queue with counters built using a closure.
    pub fn queue<F>(mut self, key: impl Into<QueueKey>, f: F) -> Self
    where
        F: FnOnce(QueueStatBuilder) -> QueueStatBuilder,
    {
        let stat = f(QueueStatBuilder::new()).build();
        self.queues.insert(key.into(), stat);
        self
    }

    /// Add a queue with pre-built counters.
    pub fn queue_stat(mut self, key: impl Into<QueueKey>, stat: QueueStat) -> Self {
        self.queues.insert(key.into(), stat);
        self
    }

    /// Build the snapshot, stamping it with the current time if no timestamp was set.
    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            queues: self.queues,
        }
    }
}

/// Current time in milliseconds since the Unix epoch (0 if the clock is before it).
pub fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
