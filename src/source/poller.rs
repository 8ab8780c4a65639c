//! Repeating, cancellable poll task.

use std::sync::Arc;
use std::time::Duration;

use queuewatch_types::current_timestamp_ms;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::DataSource;
use crate::session::Session;

/// Adaptive poll interval.
///
/// While queues are busy the poller runs at `min`; each quiet poll doubles
/// the interval up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    min: Duration,
    max: Duration,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(90),
        }
    }
}

impl Cadence {
    /// Create a cadence. `max` is raised to `min` and `min` to 1ms if needed.
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.max(Duration::from_millis(1));
        Self { min, max: max.max(min) }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// The interval to wait after a poll that found `active` queues.
    pub fn next(&self, current: Duration, active: bool) -> Duration {
        if active {
            self.min
        } else {
            current.saturating_mul(2).clamp(self.min, self.max)
        }
    }
}

/// Handle to a background task polling one source into a [`Session`].
///
/// The task is aborted when the handle is cancelled or dropped.
#[derive(Debug)]
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling `source` on the current tokio runtime.
    pub fn spawn(mut source: Box<dyn DataSource>, session: Arc<Session>, cadence: Cadence) -> Self {
        let handle = tokio::spawn(async move {
            let description = source.description().to_string();
            info!(source = %description, "poller started");
            session.update_status(|status| status.source = description.clone());

            let mut interval = cadence.min();
            loop {
                let mut active = false;
                let mut polled = 0usize;
                // Drain everything queued since the last tick
                while let Some(snapshot) = source.poll() {
                    active |= snapshot.queues.values().any(|q| !q.is_idle());
                    session.record(snapshot);
                    polled += 1;
                }

                let error = source.error();
                if let Some(e) = &error {
                    warn!(source = %description, error = %e, "poll failed");
                }

                interval = cadence.next(interval, active);
                let next_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
                debug!(polled, active, next_ms, "poll complete");
                session.update_status(|status| {
                    status.last_error = error;
                    status.last_poll_ms = Some(current_timestamp_ms());
                    status.interval = interval;
                });

                tokio::time::sleep(interval).await;
            }
        });

        Self { handle }
    }

    /// Stop polling.
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingSettings;
    use crate::source::ChannelSource;
    use queuewatch_types::Snapshot;

    #[test]
    fn cadence_resets_when_active() {
        let cadence = Cadence::default();
        assert_eq!(cadence.next(Duration::from_secs(40), true), Duration::from_secs(5));
    }

    #[test]
    fn cadence_backs_off_to_max() {
        let cadence = Cadence::default();
        let mut interval = cadence.min();
        let mut seen = vec![];
        for _ in 0..6 {
            interval = cadence.next(interval, false);
            seen.push(interval.as_secs());
        }
        assert_eq!(seen, vec![10, 20, 40, 80, 90, 90]);
    }

    #[test]
    fn cadence_normalises_bounds() {
        let cadence = Cadence::new(Duration::from_secs(30), Duration::from_secs(10));
        assert_eq!(cadence.max(), Duration::from_secs(30));
        let cadence = Cadence::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(cadence.min(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn poller_records_snapshots() {
        let session = Session::init(&SamplingSettings::default());
        let (tx, source) = ChannelSource::create("test");
        tx.send(Snapshot::builder().timestamp_ms(1_000).queue("gpu", |q| q.queued(3)).build())
            .unwrap();

        let poller = Poller::spawn(Box::new(source), session.clone(), Cadence::default());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(session.len(), 1);
        let status = session.status();
        assert_eq!(status.source, "channel: test");
        assert_eq!(status.interval, Duration::from_secs(5));
        assert!(status.last_poll_ms.is_some());

        tx.send(Snapshot::builder().timestamp_ms(20_000).queue("gpu", |q| q.queued(4)).build())
            .unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(session.len(), 2);

        poller.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_poller_stops_recording() {
        let session = Session::init(&SamplingSettings::default());
        let (tx, source) = ChannelSource::create("test");
        tx.send(Snapshot::builder().timestamp_ms(1_000).build()).unwrap();

        let poller = Poller::spawn(Box::new(source), session.clone(), Cadence::default());
        tokio::time::sleep(Duration::from_millis(10)).await;
        poller.cancel();

        tx.send(Snapshot::builder().timestamp_ms(60_000).build()).unwrap();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(session.len(), 1);
    }
}
