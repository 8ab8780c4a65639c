//! # queuewatch
//!
//! A terminal dashboard and library that turns point-in-time job queue
//! counters into windowed trends.
//!
//! A backend reports per-queue counters (pending, queued, running, success,
//! failed, retrying, recommended concurrency) as a single snapshot. This crate
//! keeps a bounded, de-duplicated history of those snapshots and answers
//! questions about a recent window of it: series, averages, deltas, derived
//! trends and downsampled sparklines.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  source ──▶ Poller ──▶ Session ──▶ data::select ──▶ aggregate │
//! │  (File |    (tokio     (SampleBuffer   (Window)      downsample│
//! │   Stream |   task)      + status)                   queues    │
//! │   Channel)                     │                       │      │
//! │                                ▼                       ▼      │
//! │                               app ──────────────────▶ ui      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`data`]**: The sampling engine: [`SampleBuffer`], window selection,
//!   aggregation, downsampling and the per-queue health overview
//! - **[`session`]**: Owned sampling state shared by the poller and readers
//! - **[`source`]**: The [`DataSource`] trait, its file/stream/channel
//!   implementations, and the cancellable [`Poller`]
//! - **[`config`]**: Layered settings (defaults, TOML file, environment)
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a JSON file that an exporter keeps overwriting
//! queuewatch --file queues.json
//!
//! # Read newline-delimited snapshots from a TCP endpoint
//! queuewatch --connect localhost:9090 --window 6h
//! ```
//!
//! ### As a library
//!
//! ```
//! use queuewatch::data::{aggregate, downsample, select};
//! use queuewatch::{Metric, SampleBuffer, Snapshot};
//!
//! let mut buffer = SampleBuffer::new();
//! buffer.append(Snapshot::builder().timestamp_ms(1_000).queue("gpu", |q| q.success(10)).build());
//! buffer.append(Snapshot::builder().timestamp_ms(61_000).queue("gpu", |q| q.success(25)).build());
//!
//! let window = select(&buffer, 15 * 60 * 1000, 61_000);
//! assert_eq!(aggregate::delta(&window, "gpu", Metric::Success), 15);
//!
//! let points = downsample::reduce(&aggregate::series(&window, "gpu", Metric::Success), 60);
//! assert_eq!(points, vec![10, 25]);
//! ```
//!
//! ### Polling a source into a session
//!
//! ```no_run
//! use queuewatch::config::SamplingSettings;
//! use queuewatch::{Cadence, FileSource, Poller, Session};
//!
//! # tokio_test::block_on(async {
//! let session = Session::init(&SamplingSettings::default());
//! let poller = Poller::spawn(
//!     Box::new(FileSource::new("queues.json")),
//!     session.clone(),
//!     Cadence::default(),
//! );
//! // ... read session.overview(..) from the UI ...
//! poller.cancel();
//! session.dispose();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod session;
pub mod source;
pub mod telemetry;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, ViewOptions};
pub use config::Settings;
pub use data::{
    AppendOutcome, HealthStatus, QueueOverview, QueueSummary, SampleBuffer, Thresholds, Window,
    WindowRange,
};
pub use queuewatch_types::{Metric, QueueStat, Snapshot};
pub use session::{PollStatus, Session};
pub use source::{Cadence, ChannelSource, DataSource, FileSource, Poller, StreamSource};
