//! Application state and navigation logic.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use queuewatch_types::{current_timestamp_ms, Metric};
use serde::Serialize;
use tracing::info;

use crate::data::downsample::reduce;
use crate::data::{aggregate, select, HealthStatus, QueueOverview, QueueSummary, Thresholds, WindowRange};
use crate::session::Session;
use crate::ui::summary::{sort_queues_by, SortColumn};
use crate::ui::Theme;

/// Per-metric trend for the detail overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDetail {
    pub metric: Metric,
    pub latest: u64,
    pub delta: u64,
    pub average: u64,
    pub peak: u64,
    /// Change per minute across the window, when it spans any time.
    pub rate_per_minute: Option<f64>,
    /// Downsampled series for a sparkline.
    pub points: Vec<u64>,
}

/// View options that do not come from the session.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub range: WindowRange,
    pub thresholds: Thresholds,
    pub max_points: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            range: WindowRange::default(),
            thresholds: Thresholds::default(),
            max_points: crate::data::DEFAULT_MAX_POINTS,
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    session: Arc<Session>,
    pub overview: Option<QueueOverview>,
    pub load_error: Option<String>,
    pub last_refresh: Option<Instant>,
    /// Wall clock the current overview was computed for.
    pub now_ms: u64,

    pub range: WindowRange,
    pub thresholds: Thresholds,
    pub max_points: usize,

    // Navigation state
    pub selected_index: usize,

    // Sorting
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from the given session.
    pub fn new(session: Arc<Session>, options: ViewOptions, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            show_detail_overlay: false,
            session,
            overview: None,
            load_error: None,
            last_refresh: None,
            now_ms: 0,
            range: options.range,
            thresholds: options.thresholds,
            max_points: options.max_points,
            selected_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            filter_text: String::new(),
            filter_active: false,
            theme,
            status_message: None,
        }
    }

    /// The session this app reads from.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> String {
        self.session.status().source
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Recompute the overview from the session at the current time.
    pub fn refresh(&mut self) {
        self.refresh_at(current_timestamp_ms());
    }

    /// Recompute the overview for a window ending at `now_ms`.
    pub fn refresh_at(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        self.load_error = self.session.status().last_error;

        if self.session.is_empty() {
            self.overview = None;
        } else {
            self.overview =
                Some(self.session.overview(self.range, &self.thresholds, self.max_points, now_ms));
        }
        self.last_refresh = Some(Instant::now());

        let max = self.visible_count().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Switch to the next wider window range.
    pub fn next_range(&mut self) {
        self.set_range(self.range.next());
    }

    /// Switch to the next narrower window range.
    pub fn prev_range(&mut self) {
        self.set_range(self.range.prev());
    }

    fn set_range(&mut self, range: WindowRange) {
        self.range = range;
        self.set_status_message(format!("Window: {}", range));
        self.refresh();
    }

    /// Queues after filtering and sorting, in display order.
    pub fn visible_queues(&self) -> Vec<&QueueSummary> {
        let Some(ref overview) = self.overview else {
            return Vec::new();
        };
        let mut queues: Vec<&QueueSummary> =
            overview.queues.iter().filter(|q| self.matches_filter(&q.key)).collect();
        sort_queues_by(&mut queues, self.sort_column, self.sort_ascending);
        queues
    }

    fn visible_count(&self) -> usize {
        let Some(ref overview) = self.overview else {
            return 0;
        };
        overview.queues.iter().filter(|q| self.matches_filter(&q.key)).count()
    }

    /// The queue under the cursor.
    pub fn selected_queue(&self) -> Option<&QueueSummary> {
        self.visible_queues().get(self.selected_index).copied()
    }

    /// Per-metric trends for one queue over the current window.
    pub fn metric_details(&self, key: &str) -> Vec<MetricDetail> {
        self.session.with_buffer(|buffer| {
            let window = select(buffer, self.range.as_millis(), self.now_ms);
            Metric::ALL
                .iter()
                .map(|&metric| MetricDetail {
                    metric,
                    latest: aggregate::latest(&window, key, metric),
                    delta: aggregate::delta(&window, key, metric),
                    average: aggregate::average(&window, key, metric),
                    peak: aggregate::peak(&window, key, metric),
                    rate_per_minute: aggregate::rate_per_minute(&window, key, metric),
                    points: reduce(&aggregate::series(&window, key, metric), self.max_points),
                })
                .collect()
        })
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        self.selected_index = self.visible_count().saturating_sub(1);
    }

    /// Open the detail overlay for the currently selected queue.
    pub fn enter_detail(&mut self) {
        if self.selected_queue().is_some() {
            self.show_detail_overlay = true;
        }
    }

    /// Close the detail overlay, or clear the filter if no overlay is open.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
        } else if !self.filter_text.is_empty() {
            self.clear_filter();
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column.
    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.selected_index = 0;
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a queue key matches the current filter.
    pub fn matches_filter(&self, key: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        key.to_lowercase().contains(&self.filter_text.to_lowercase())
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the current overview to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let Some(ref overview) = self.overview else {
            anyhow::bail!("No data to export");
        };
        Export::new(self.range, &self.source_description(), overview).write(path)
    }
}

/// Counts by health for an export.
#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub total_queues: usize,
    pub healthy: usize,
    pub warning: usize,
    pub critical: usize,
    pub total_backlog: u64,
}

/// JSON document written by `e` in the dashboard and by `--export`.
#[derive(Debug, Serialize)]
pub struct Export<'a> {
    pub window: String,
    pub source: &'a str,
    pub generated_at_ms: u64,
    pub summary: ExportSummary,
    #[serde(flatten)]
    pub overview: &'a QueueOverview,
}

impl<'a> Export<'a> {
    pub fn new(range: WindowRange, source: &'a str, overview: &'a QueueOverview) -> Self {
        let summary = ExportSummary {
            total_queues: overview.queues.len(),
            healthy: overview.count(HealthStatus::Healthy),
            warning: overview.count(HealthStatus::Warning),
            critical: overview.count(HealthStatus::Critical),
            total_backlog: overview.queues.iter().map(QueueSummary::backlog).sum(),
        };
        Self {
            window: range.label(),
            source,
            generated_at_ms: current_timestamp_ms(),
            summary,
            overview,
        }
    }

    /// Write as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write export to {}", path.display()))?;
        info!(path = %path.display(), queues = self.summary.total_queues, "exported overview");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingSettings;
    use queuewatch_types::Snapshot;

    fn app_with_samples() -> App {
        let session = Session::init(&SamplingSettings::default());
        session.record(
            Snapshot::builder()
                .timestamp_ms(1_000)
                .queue("openai/gpt-4o", |q| q.queued(2).success(10))
                .queue("anthropic/claude", |q| q.queued(1).failed(0))
                .queue("local/llama", |q| q.running(1))
                .build(),
        );
        session.record(
            Snapshot::builder()
                .timestamp_ms(61_000)
                .queue("openai/gpt-4o", |q| q.queued(4).success(25))
                .queue("anthropic/claude", |q| q.queued(1).failed(12))
                .queue("local/llama", |q| q.running(3))
                .build(),
        );
        let mut app = App::new(session, ViewOptions::default(), Theme::dark());
        app.refresh_at(61_000);
        app
    }

    #[test]
    fn refresh_builds_overview() {
        let app = app_with_samples();
        let overview = app.overview.as_ref().unwrap();
        assert_eq!(overview.queues.len(), 3);
        assert_eq!(overview.sample_count, 2);
    }

    #[test]
    fn empty_session_has_no_overview() {
        let session = Session::init(&SamplingSettings::default());
        let mut app = App::new(session, ViewOptions::default(), Theme::dark());
        app.refresh_at(1_000);
        assert!(app.overview.is_none());
        assert!(app.visible_queues().is_empty());
        assert!(app.export_state(Path::new("/tmp/never-written.json")).is_err());
    }

    #[test]
    fn filter_and_sort_change_visible_order() {
        let mut app = app_with_samples();
        let keys: Vec<&str> = app.visible_queues().iter().map(|q| q.key.as_str()).collect();
        assert_eq!(keys, vec!["anthropic/claude", "local/llama", "openai/gpt-4o"]);

        app.filter_push('o');
        app.filter_push('p');
        let keys: Vec<&str> = app.visible_queues().iter().map(|q| q.key.as_str()).collect();
        assert_eq!(keys, vec!["openai/gpt-4o"]);

        app.clear_filter();
        app.sort_column = SortColumn::Backlog;
        app.sort_ascending = false;
        assert_eq!(app.visible_queues()[0].key, "openai/gpt-4o");
    }

    #[test]
    fn selection_is_clamped() {
        let mut app = app_with_samples();
        app.select_next_n(10);
        assert_eq!(app.selected_index, 2);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
        app.select_last();
        assert_eq!(app.selected_queue().unwrap().key, "openai/gpt-4o");
    }

    #[test]
    fn detail_overlay_needs_a_selection() {
        let mut app = app_with_samples();
        app.enter_detail();
        assert!(app.show_detail_overlay);
        app.go_back();
        assert!(!app.show_detail_overlay);

        app.filter_text = "nothing matches".to_string();
        app.selected_index = 0;
        app.enter_detail();
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn range_cycling_sets_status() {
        let mut app = app_with_samples();
        app.next_range();
        assert_eq!(app.range, WindowRange::SixHours);
        assert_eq!(app.get_status_message(), Some("Window: 6h"));
        app.prev_range();
        app.prev_range();
        assert_eq!(app.range, WindowRange::FifteenMinutes);
    }

    #[test]
    fn metric_details_cover_every_metric() {
        let app = app_with_samples();
        let details = app.metric_details("openai/gpt-4o");
        assert_eq!(details.len(), Metric::ALL.len());

        let success = details.iter().find(|d| d.metric == Metric::Success).unwrap();
        assert_eq!(success.latest, 25);
        assert_eq!(success.delta, 15);
        assert_eq!(success.points, vec![10, 25]);
        assert_eq!(success.rate_per_minute, Some(15.0));
    }

    #[test]
    fn export_writes_overview_json() {
        let app = app_with_samples();
        let file = tempfile::NamedTempFile::new().unwrap();
        app.export_state(file.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(json["window"], "1h");
        assert_eq!(json["summary"]["total_queues"], 3);
        assert_eq!(json["summary"]["critical"], 1);
        assert_eq!(json["sample_count"], 2);
        assert_eq!(json["queues"].as_array().unwrap().len(), 3);
    }
}
