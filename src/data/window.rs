//! Time-window selection over a [`SampleBuffer`].

use std::collections::vec_deque;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use queuewatch_types::{current_timestamp_ms, Snapshot};

use super::buffer::SampleBuffer;
use super::duration::{format_duration, parse_duration};

/// How far back a window reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowRange {
    FifteenMinutes,
    #[default]
    OneHour,
    SixHours,
    OneDay,
    SevenDays,
    /// Any other span.
    Custom(Duration),
}

impl WindowRange {
    /// The preset ranges, shortest first.
    pub const PRESETS: [WindowRange; 5] = [
        WindowRange::FifteenMinutes,
        WindowRange::OneHour,
        WindowRange::SixHours,
        WindowRange::OneDay,
        WindowRange::SevenDays,
    ];

    pub fn as_duration(&self) -> Duration {
        const MINUTE: u64 = 60;
        const HOUR: u64 = 60 * MINUTE;
        match self {
            WindowRange::FifteenMinutes => Duration::from_secs(15 * MINUTE),
            WindowRange::OneHour => Duration::from_secs(HOUR),
            WindowRange::SixHours => Duration::from_secs(6 * HOUR),
            WindowRange::OneDay => Duration::from_secs(24 * HOUR),
            WindowRange::SevenDays => Duration::from_secs(7 * 24 * HOUR),
            WindowRange::Custom(d) => *d,
        }
    }

    /// Length in milliseconds, saturating at `u64::MAX`.
    pub fn as_millis(&self) -> u64 {
        u64::try_from(self.as_duration().as_millis()).unwrap_or(u64::MAX)
    }

    /// Short label ("15m", "1h", ...).
    pub fn label(&self) -> String {
        match self {
            WindowRange::FifteenMinutes => "15m".to_string(),
            WindowRange::OneHour => "1h".to_string(),
            WindowRange::SixHours => "6h".to_string(),
            WindowRange::OneDay => "24h".to_string(),
            WindowRange::SevenDays => "7d".to_string(),
            WindowRange::Custom(d) => format_duration(*d),
        }
    }

    /// Cycle to the next longer preset. Custom ranges jump to the first preset above them.
    pub fn next(self) -> Self {
        let ms = self.as_millis();
        Self::PRESETS
            .into_iter()
            .find(|p| p.as_millis() > ms)
            .unwrap_or(Self::PRESETS[0])
    }

    /// Cycle to the next shorter preset. Custom ranges jump to the first preset below them.
    pub fn prev(self) -> Self {
        let ms = self.as_millis();
        Self::PRESETS
            .into_iter()
            .rev()
            .find(|p| p.as_millis() < ms)
            .unwrap_or(Self::PRESETS[Self::PRESETS.len() - 1])
    }
}

impl From<Duration> for WindowRange {
    fn from(d: Duration) -> Self {
        Self::PRESETS
            .into_iter()
            .find(|p| p.as_duration() == d)
            .unwrap_or(WindowRange::Custom(d))
    }
}

impl FromStr for WindowRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(WindowRange::from)
    }
}

impl fmt::Display for WindowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A borrowed, contiguous suffix of a [`SampleBuffer`].
///
/// Holds at least one sample whenever the buffer it came from is non-empty.
#[derive(Debug, Clone)]
pub struct Window<'a> {
    samples: vec_deque::Iter<'a, Snapshot>,
}

impl<'a> Window<'a> {
    /// Samples from oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'a, Snapshot> {
        self.samples.clone()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Oldest sample in the window.
    pub fn first(&self) -> Option<&'a Snapshot> {
        self.iter().next()
    }

    /// Newest sample in the window.
    pub fn last(&self) -> Option<&'a Snapshot> {
        self.iter().next_back()
    }

    /// Time covered by the samples, in milliseconds (0 for a single sample).
    pub fn span_ms(&self) -> u64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
            _ => 0,
        }
    }

    /// Every queue key seen in any sample, sorted and de-duplicated.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&'a str> = self.iter().flat_map(|s| s.keys()).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

impl<'a> IntoIterator for &Window<'a> {
    type Item = &'a Snapshot;
    type IntoIter = vec_deque::Iter<'a, Snapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Select the samples taken within `range_ms` of `now_ms`.
///
/// Returns every sample with `timestamp >= now - range`, in order. If none
/// qualify but the buffer is not empty, the newest sample is returned on its
/// own so callers always have the current state to show.
pub fn select(buffer: &SampleBuffer, range_ms: u64, now_ms: u64) -> Window<'_> {
    let cutoff = now_ms.saturating_sub(range_ms);
    let mut start = buffer.first_index_at_or_after(cutoff);
    if start == buffer.len() {
        start = buffer.len().saturating_sub(1);
    }
    Window {
        samples: buffer.range_from(start),
    }
}

/// [`select`] relative to the wall clock.
pub fn select_now(buffer: &SampleBuffer, range_ms: u64) -> Window<'_> {
    select(buffer, range_ms, current_timestamp_ms())
}
