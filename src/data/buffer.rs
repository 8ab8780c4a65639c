//! Capped, de-duplicated history of polled snapshots.

use std::collections::vec_deque::{self, VecDeque};

use queuewatch_types::Snapshot;
use tracing::{debug, warn};

/// Maximum number of snapshots kept in a buffer.
pub const MAX_SAMPLES: usize = 720;

/// Snapshots closer than this to the last stored sample are dropped.
pub const MIN_SAMPLE_INTERVAL_MS: u64 = 10_000;

/// What [`SampleBuffer::append`] did with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Stored. `evicted` oldest samples were dropped to stay under the cap.
    Appended { evicted: usize },
    /// Dropped: taken less than the minimum interval after the last sample.
    Duplicate,
    /// Dropped: taken before the last stored sample.
    OutOfOrder,
}

impl AppendOutcome {
    /// True if the snapshot was stored.
    pub fn is_appended(&self) -> bool {
        matches!(self, AppendOutcome::Appended { .. })
    }
}

/// Ordered ring buffer of snapshots.
///
/// Timestamps are non-decreasing from front to back and the length never
/// exceeds the configured capacity. Once the cap is reached every append
/// evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Snapshot>,
    max_samples: usize,
    min_interval_ms: u64,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    /// Create an empty buffer with the default limits.
    pub fn new() -> Self {
        Self::with_limits(MAX_SAMPLES, MIN_SAMPLE_INTERVAL_MS)
    }

    /// Create an empty buffer with custom limits. A capacity of zero is raised to one.
    pub fn with_limits(max_samples: usize, min_interval_ms: u64) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            min_interval_ms,
        }
    }

    /// Record a snapshot.
    ///
    /// The snapshot is dropped if it was taken before the last stored sample or
    /// within the minimum interval after it. Otherwise it is pushed to the back
    /// and the oldest samples are evicted until the buffer is back at capacity.
    pub fn append(&mut self, snapshot: Snapshot) -> AppendOutcome {
        if let Some(last) = self.samples.back() {
            if snapshot.timestamp_ms < last.timestamp_ms {
                warn!(
                    timestamp_ms = snapshot.timestamp_ms,
                    last_ms = last.timestamp_ms,
                    "dropping out-of-order snapshot"
                );
                return AppendOutcome::OutOfOrder;
            }
            if snapshot.timestamp_ms - last.timestamp_ms < self.min_interval_ms {
                debug!(
                    timestamp_ms = snapshot.timestamp_ms,
                    last_ms = last.timestamp_ms,
                    "dropping snapshot inside minimum sample interval"
                );
                return AppendOutcome::Duplicate;
            }
        }

        self.samples.push_back(snapshot);

        let mut evicted = 0;
        while self.samples.len() > self.max_samples {
            self.samples.pop_front();
            evicted += 1;
        }
        AppendOutcome::Appended { evicted }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples kept.
    pub fn capacity(&self) -> usize {
        self.max_samples
    }

    /// Minimum spacing between stored samples, in milliseconds.
    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.samples.back()
    }

    /// Oldest sample still held.
    pub fn oldest(&self) -> Option<&Snapshot> {
        self.samples.front()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, Snapshot> {
        self.samples.iter()
    }

    /// Index of the first sample taken at or after `cutoff_ms`.
    pub(crate) fn first_index_at_or_after(&self, cutoff_ms: u64) -> usize {
        self.samples.partition_point(|s| s.timestamp_ms < cutoff_ms)
    }

    /// Samples from `start` to the newest.
    pub(crate) fn range_from(&self, start: usize) -> vec_deque::Iter<'_, Snapshot> {
        self.samples.range(start..)
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl<'a> IntoIterator for &'a SampleBuffer {
    type Item = &'a Snapshot;
    type IntoIter = vec_deque::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
