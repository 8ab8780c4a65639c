//! Reduce long series to a fixed number of points for sparklines.

/// Default number of points a sparkline is reduced to.
pub const DEFAULT_MAX_POINTS: usize = 60;

/// Number of distinct bar heights in a character sparkline.
pub const SPARKLINE_LEVELS: u8 = 8;

/// Keep every `stride`-th value so that at most `max_points` remain.
///
/// Series already within the limit are returned unchanged. Otherwise
/// `stride = ceil(len / max_points)` and the result starts at index 0.
/// This is plain decimation: a short spike between kept indices can be lost.
/// A `max_points` of zero is treated as one.
pub fn reduce<T: Clone>(series: &[T], max_points: usize) -> Vec<T> {
    let max_points = max_points.max(1);
    if series.len() <= max_points {
        return series.to_vec();
    }

    let stride = series.len().div_ceil(max_points);
    series.iter().step_by(stride).cloned().collect()
}

/// Scale values onto `0..SPARKLINE_LEVELS` bar heights.
///
/// The lowest value maps to 0 and the highest to the top level. A flat
/// series maps entirely to 0.
pub fn sparkline_levels(values: &[u64]) -> Vec<u8> {
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Vec::new();
    };

    let range = max - min;
    if range == 0 {
        return vec![0; values.len()];
    }

    let top = f64::from(SPARKLINE_LEVELS - 1);
    values
        .iter()
        .map(|&v| {
            let normalized = ((v - min) as f64 / range as f64 * top).round() as u8;
            normalized.min(SPARKLINE_LEVELS - 1)
        })
        .collect()
}
