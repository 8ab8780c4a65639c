//! # queuewatch-types
//!
//! Snapshot schema for job queue monitoring. A job-execution backend reports
//! only *current* counters per work queue; this crate defines the shape of one
//! such reading so that producers (pollers, exporters, tests) and consumers
//! (the queuewatch sampling engine and dashboard) agree on it.
//!
//! ## Features
//!
//! - `serde`: JSON (or any serde format) support. Deserialisation is lenient:
//!   missing, `null`, negative or non-numeric counters read as `0` and never
//!   fail the whole snapshot.
//!
//! ## Example
//!
//! ```rust
//! use queuewatch_types::{Metric, Snapshot};
//!
//! let snapshot = Snapshot::builder()
//!     .timestamp_ms(1_700_000_000_000)
//!     .queue("openai/gpt-4o", |q| q.queued(12).running(4).recommended_concurrency(8))
//!     .queue("anthropic/claude", |q| q.pending(3))
//!     .build();
//!
//! assert_eq!(snapshot.len(), 2);
//! assert_eq!(snapshot.value("openai/gpt-4o", Metric::Queued), 12);
//! assert_eq!(snapshot.value("missing", Metric::Queued), 0);
//! ```

mod metric;
mod snapshot;

#[cfg(feature = "serde")]
mod lenient;

pub use metric::*;
pub use snapshot::*;
