//! Snapshot sources and the poller that feeds them into a session.
//!
//! This module provides a trait-based abstraction for receiving queue
//! snapshots from various sources (files, network streams, in-memory
//! channels), and a cancellable repeating task ([`Poller`]) that polls a
//! source on an adaptive cadence and records what it gets.

mod channel;
mod file;
mod poller;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use poller::{Cadence, Poller};
pub use stream::StreamSource;

use std::fmt::Debug;

use queuewatch_types::Snapshot;

/// Trait for receiving queue snapshots from various sources.
///
/// # Example
///
/// ```
/// use queuewatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("queues.json");
/// if let Some(snapshot) = source.poll() {
///     println!("Got {} queues", snapshot.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for the latest snapshot.
    ///
    /// Returns `Some(snapshot)` if new data is available, `None` otherwise.
    /// This method must not block.
    fn poll(&mut self) -> Option<Snapshot>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The error from the last poll, if one occurred.
    fn error(&self) -> Option<String>;
}
