//! Sampling, windowing and aggregation of queue snapshots.
//!
//! The backend only reports current counters, so trends are built here from
//! repeated polls.
//!
//! ## Submodules
//!
//! - [`buffer`]: capped, de-duplicated ring buffer of snapshots ([`SampleBuffer`])
//! - [`window`]: time-window selection over the buffer ([`Window`], [`WindowRange`])
//! - [`aggregate`]: per-queue series, averages, deltas and composite trends
//! - [`downsample`]: stride decimation and bar levels for sparklines
//! - [`duration`]: parsing and formatting of window strings ("15m", "1h")
//! - [`queues`]: per-queue summaries with health status ([`QueueOverview`])
//!
//! ## Data Flow
//!
//! ```text
//! Snapshot (per poll tick)
//!        │
//!        ▼
//! SampleBuffer::append()
//!        │
//!        ▼
//! window::select(range)
//!        │
//!        ├──▶ aggregate::{series, average, delta, trend}
//!        │
//!        └──▶ downsample::reduce() ──▶ sparkline
//! ```

pub mod aggregate;
pub mod buffer;
pub mod downsample;
pub mod duration;
pub mod queues;
pub mod window;

pub use buffer::{AppendOutcome, SampleBuffer, MAX_SAMPLES, MIN_SAMPLE_INTERVAL_MS};
pub use downsample::DEFAULT_MAX_POINTS;
pub use queues::{HealthStatus, QueueOverview, QueueSummary, Thresholds};
pub use window::{select, select_now, Window, WindowRange};
