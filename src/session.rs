//! Owned sampling state for one monitoring view.
//!
//! A [`Session`] owns the sample buffer and the status of whatever is feeding
//! it. The poller is the single writer; the dashboard and exporters read
//! through short-lived locks. Dropping the last handle frees the history.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use queuewatch_types::{current_timestamp_ms, Snapshot};
use tracing::{debug, info};

use crate::config::SamplingSettings;
use crate::data::{select, AppendOutcome, QueueOverview, SampleBuffer, Thresholds, WindowRange};

/// What the poller last saw from its source.
#[derive(Debug, Clone, Default)]
pub struct PollStatus {
    /// Human-readable description of the source.
    pub source: String,
    /// Error reported by the source on the last poll, if any.
    pub last_error: Option<String>,
    /// Wall-clock time of the last poll.
    pub last_poll_ms: Option<u64>,
    /// Interval until the next poll.
    pub interval: Duration,
    /// What happened to the last snapshot the source produced.
    pub last_outcome: Option<AppendOutcome>,
}

/// Sample history plus source status, shared between the poller and readers.
#[derive(Debug, Default)]
pub struct Session {
    buffer: RwLock<SampleBuffer>,
    status: RwLock<PollStatus>,
}

impl Session {
    /// Create a session with an empty buffer.
    pub fn init(sampling: &SamplingSettings) -> Arc<Self> {
        info!(
            max_samples = sampling.max_samples,
            min_interval_ms = sampling.min_interval_ms,
            "sampling session started"
        );
        Arc::new(Self {
            buffer: RwLock::new(SampleBuffer::with_limits(
                sampling.max_samples,
                sampling.min_interval_ms,
            )),
            status: RwLock::new(PollStatus::default()),
        })
    }

    /// Append a snapshot to the history.
    ///
    /// Snapshots without a timestamp are stamped with the wall clock first.
    pub fn record(&self, mut snapshot: Snapshot) -> AppendOutcome {
        if snapshot.timestamp_ms == 0 {
            snapshot.timestamp_ms = current_timestamp_ms();
        }
        let queues = snapshot.len();
        let outcome = self.buffer.write().append(snapshot);
        debug!(queues, ?outcome, "recorded snapshot");
        self.status.write().last_outcome = Some(outcome);
        outcome
    }

    /// Run `f` with read access to the buffer.
    pub fn with_buffer<R>(&self, f: impl FnOnce(&SampleBuffer) -> R) -> R {
        f(&self.buffer.read())
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.buffer.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.read().is_empty()
    }

    /// Summarise every queue over `range` ending at `now_ms`.
    pub fn overview(
        &self,
        range: WindowRange,
        thresholds: &Thresholds,
        max_points: usize,
        now_ms: u64,
    ) -> QueueOverview {
        self.with_buffer(|buffer| {
            let window = select(buffer, range.as_millis(), now_ms);
            QueueOverview::build(&window, thresholds, max_points)
        })
    }

    /// Snapshot of the source status.
    pub fn status(&self) -> PollStatus {
        self.status.read().clone()
    }

    /// Modify the source status.
    pub fn update_status(&self, f: impl FnOnce(&mut PollStatus)) {
        f(&mut self.status.write());
    }

    /// Drop all history and status.
    pub fn dispose(&self) {
        let dropped = {
            let mut buffer = self.buffer.write();
            let n = buffer.len();
            buffer.clear();
            n
        };
        *self.status.write() = PollStatus::default();
        info!(dropped, "sampling session disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Arc<Session> {
        Session::init(&SamplingSettings::default())
    }

    #[test]
    fn record_appends_and_tracks_outcome() {
        let s = session();
        let outcome = s.record(Snapshot::builder().timestamp_ms(1_000).queue("a", |q| q.queued(5)).build());
        assert_eq!(outcome, AppendOutcome::Appended { evicted: 0 });
        assert_eq!(s.len(), 1);
        assert_eq!(s.status().last_outcome, Some(outcome));

        let outcome = s.record(Snapshot::builder().timestamp_ms(6_000).queue("a", |q| q.queued(5)).build());
        assert_eq!(outcome, AppendOutcome::Duplicate);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn record_stamps_missing_timestamp() {
        let s = session();
        let before = current_timestamp_ms();
        s.record(Snapshot::with_timestamp(0));
        let stamped = s.with_buffer(|b| b.latest().map(|l| l.timestamp_ms));
        assert!(stamped.unwrap() >= before);
    }

    #[test]
    fn overview_uses_window() {
        let s = session();
        s.record(Snapshot::builder().timestamp_ms(1_000).queue("gpu", |q| q.success(10)).build());
        s.record(Snapshot::builder().timestamp_ms(61_000).queue("gpu", |q| q.success(15)).build());

        let overview = s.overview(WindowRange::FifteenMinutes, &Thresholds::default(), 60, 61_000);
        assert_eq!(overview.queues.len(), 1);
        assert_eq!(overview.queues[0].success_delta, 5);
        assert_eq!(overview.sample_count, 2);
    }

    #[test]
    fn dispose_clears_history_and_status() {
        let s = session();
        s.update_status(|st| st.source = "file: q.json".to_string());
        s.record(Snapshot::builder().timestamp_ms(1).build());
        s.dispose();
        assert!(s.is_empty());
        assert!(s.status().source.is_empty());
    }
}
