//! Per-queue, per-metric aggregation over a [`Window`].
//!
//! Every function here is pure. A queue missing from a sample contributes a
//! zero for that sample; nothing here fails.

use queuewatch_types::{Metric, QueueStat};

use super::window::Window;

/// The metric's value at each sample, oldest first.
pub fn series(window: &Window<'_>, key: &str, metric: Metric) -> Vec<u64> {
    window.iter().map(|s| s.value(key, metric)).collect()
}

/// Mean of [`series`], rounded to the nearest integer. Zero for an empty window.
pub fn average(window: &Window<'_>, key: &str, metric: Metric) -> u64 {
    let n = window.len();
    if n == 0 {
        return 0;
    }
    let sum: u128 = window.iter().map(|s| u128::from(s.value(key, metric))).sum();
    (sum as f64 / n as f64).round() as u64
}

/// Increase of the metric from the first to the last sample, clamped at zero.
///
/// Counters can reset, so a decrease reads as no new work rather than a
/// negative change.
pub fn delta(window: &Window<'_>, key: &str, metric: Metric) -> u64 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) => last.value(key, metric).saturating_sub(first.value(key, metric)),
        _ => 0,
    }
}

/// One value per sample computed by `combiner` from the queue's counters.
///
/// Lets callers chart composite indicators (for example a backlog curve)
/// without adding a metric for each one.
pub fn trend<F>(window: &Window<'_>, key: &str, combiner: F) -> Vec<u64>
where
    F: Fn(&QueueStat) -> u64,
{
    let missing = QueueStat::default();
    window.iter().map(|s| combiner(s.stat(key).unwrap_or(&missing))).collect()
}

/// `queued + running + retrying` at each sample.
pub fn backlog_series(window: &Window<'_>, key: &str) -> Vec<u64> {
    trend(window, key, QueueStat::backlog)
}

/// The metric's value at the newest sample.
pub fn latest(window: &Window<'_>, key: &str, metric: Metric) -> u64 {
    window.last().map_or(0, |s| s.value(key, metric))
}

/// Highest value of the metric in the window.
pub fn peak(window: &Window<'_>, key: &str, metric: Metric) -> u64 {
    window.iter().map(|s| s.value(key, metric)).max().unwrap_or(0)
}

/// [`delta`] scaled to a per-minute rate over the window's span.
///
/// Returns `None` when the window covers no time (zero or one sample).
pub fn rate_per_minute(window: &Window<'_>, key: &str, metric: Metric) -> Option<f64> {
    let span = window.span_ms();
    if span == 0 {
        return None;
    }
    Some(delta(window, key, metric) as f64 * 60_000.0 / span as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::buffer::SampleBuffer;
    use crate::data::window::select;
    use queuewatch_types::Snapshot;

    fn buffer_of(points: &[(u64, Option<u64>)]) -> SampleBuffer {
        let mut b = SampleBuffer::with_limits(100, 0);
        for &(t, queued) in points {
            let builder = Snapshot::builder().timestamp_ms(t);
            let snapshot = match queued {
                Some(q) => builder.queue("gpu", |s| s.queued(q).running(1)).build(),
                None => builder.queue("cpu", |s| s.queued(99)).build(),
            };
            b.append(snapshot);
        }
        b
    }

    #[test]
    fn delta_of_growing_counter() {
        let b = buffer_of(&[(0, Some(10)), (60_000, Some(15))]);
        let w = select(&b, 120_000, 60_000);
        assert_eq!(delta(&w, "gpu", Metric::Queued), 5);
    }

    #[test]
    fn delta_after_reset_is_zero() {
        let b = buffer_of(&[(0, Some(10)), (60_000, Some(3))]);
        let w = select(&b, 120_000, 60_000);
        assert_eq!(delta(&w, "gpu", Metric::Queued), 0);
    }

    #[test]
    fn delta_single_sample_is_zero() {
        let b = buffer_of(&[(0, Some(10))]);
        let w = select(&b, 1, 0);
        assert_eq!(delta(&w, "gpu", Metric::Queued), 0);
    }

    #[test]
    fn series_treats_missing_queue_as_zero() {
        let b = buffer_of(&[(0, Some(4)), (10, None), (20, Some(6))]);
        let w = select(&b, 100, 20);
        assert_eq!(series(&w, "gpu", Metric::Queued), vec![4, 0, 6]);
        assert_eq!(series(&w, "gpu", Metric::Pending), vec![0, 0, 0]);
        assert_eq!(series(&w, "nowhere", Metric::Queued), vec![0, 0, 0]);
    }

    #[test]
    fn average_rounds_to_nearest() {
        let b = buffer_of(&[(0, Some(1)), (10, Some(2))]);
        let w = select(&b, 100, 10);
        // 1.5 rounds up
        assert_eq!(average(&w, "gpu", Metric::Queued), 2);

        let b = buffer_of(&[(0, Some(1)), (10, Some(1)), (20, Some(2))]);
        let w = select(&b, 100, 20);
        assert_eq!(average(&w, "gpu", Metric::Queued), 1);
    }

    #[test]
    fn aggregates_on_empty_window_are_zero() {
        let b = SampleBuffer::new();
        let w = select(&b, 100, 0);
        assert!(series(&w, "gpu", Metric::Queued).is_empty());
        assert_eq!(average(&w, "gpu", Metric::Queued), 0);
        assert_eq!(delta(&w, "gpu", Metric::Queued), 0);
        assert_eq!(latest(&w, "gpu", Metric::Queued), 0);
        assert_eq!(peak(&w, "gpu", Metric::Queued), 0);
        assert!(rate_per_minute(&w, "gpu", Metric::Queued).is_none());
    }

    #[test]
    fn trend_combines_metrics_per_sample() {
        let b = buffer_of(&[(0, Some(4)), (10, None), (20, Some(6))]);
        let w = select(&b, 100, 20);
        let combined = trend(&w, "gpu", |s| s.queued + s.running);
        assert_eq!(combined, vec![5, 0, 7]);
        assert_eq!(backlog_series(&w, "gpu"), vec![5, 0, 7]);
    }

    #[test]
    fn latest_and_peak() {
        let b = buffer_of(&[(0, Some(4)), (10, Some(9)), (20, Some(6))]);
        let w = select(&b, 100, 20);
        assert_eq!(latest(&w, "gpu", Metric::Queued), 6);
        assert_eq!(peak(&w, "gpu", Metric::Queued), 9);
    }

    #[test]
    fn rate_scales_delta_to_minutes() {
        let b = buffer_of(&[(0, Some(0)), (30_000, Some(10))]);
        let w = select(&b, 60_000, 30_000);
        let rate = rate_per_minute(&w, "gpu", Metric::Queued).unwrap();
        assert!((rate - 20.0).abs() < f64::EPSILON);
    }
}
