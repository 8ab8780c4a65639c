//! Channel-based data source.
//!
//! Receives queue snapshots via a tokio watch channel. Useful when snapshots
//! are pushed by another task (an HTTP poller, a test harness) rather than
//! read from a file.

use queuewatch_types::Snapshot;
use tokio::sync::watch;

use super::DataSource;

/// A data source that receives queue snapshots via a channel.
///
/// # Example
///
/// ```
/// use queuewatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("backend poller");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<Snapshot>,
    description: String,
    /// Track if we've returned the initial value yet
    initial_returned: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// The value already in the channel is returned by the first poll unless
    /// it is the empty placeholder (no queues, no timestamp).
    pub fn new(receiver: watch::Receiver<Snapshot>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
            initial_returned: false,
        }
    }

    /// Create a channel pair for sending snapshots to a ChannelSource.
    pub fn create(source_description: &str) -> (watch::Sender<Snapshot>, Self) {
        let (tx, rx) = watch::channel(Snapshot::default());
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Snapshot> {
        if !self.initial_returned {
            self.initial_returned = true;
            self.receiver.mark_changed();
        }

        if !self.receiver.has_changed().unwrap_or(false) {
            return None;
        }

        let snapshot = self.receiver.borrow_and_update().clone();
        if snapshot.is_empty() && snapshot.timestamp_ms == 0 {
            return None;
        }
        Some(snapshot)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        // Transport errors belong to whoever feeds the channel
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");

        // The placeholder is not reported
        assert!(source.poll().is_none());
        assert!(source.poll().is_none());

        tx.send(Snapshot::builder().timestamp_ms(10).queue("gpu", |q| q.queued(1)).build())
            .unwrap();

        let snapshot = source.poll().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_channel_source_returns_existing_value_first() {
        let (_tx, rx) = watch::channel(Snapshot::builder().timestamp_ms(5).build());
        let mut source = ChannelSource::new(rx, "existing");
        assert_eq!(source.poll().unwrap().timestamp_ms, 5);
        assert_eq!(source.description(), "channel: existing");
    }
}
