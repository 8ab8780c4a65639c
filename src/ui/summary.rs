//! Summary view rendering.
//!
//! Displays a table of all queues with current counters, window deltas,
//! a backlog sparkline and health status.

use std::cmp::Ordering;

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::downsample::{reduce, sparkline_levels};
use crate::data::QueueSummary;

/// Sparkline characters (8 levels of height).
pub const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Column to sort by in the Summary view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Sort by queue key alphabetically.
    #[default]
    Key,
    /// Sort by current backlog.
    Backlog,
    /// Sort by successes in the window.
    Success,
    /// Sort by failures in the window.
    Failed,
    /// Sort by average running jobs.
    Running,
    /// Sort by health status.
    Status,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Key => SortColumn::Backlog,
            SortColumn::Backlog => SortColumn::Success,
            SortColumn::Success => SortColumn::Failed,
            SortColumn::Failed => SortColumn::Running,
            SortColumn::Running => SortColumn::Status,
            SortColumn::Status => SortColumn::Key,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Key => "queue",
            SortColumn::Backlog => "backlog",
            SortColumn::Success => "success",
            SortColumn::Failed => "failed",
            SortColumn::Running => "running",
            SortColumn::Status => "status",
        }
    }
}

/// Render the Summary view showing all queues in a sortable table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref overview) = app.overview else {
        return;
    };

    let queues = app.visible_queues();

    let header = Row::new(vec![
        Cell::from(format_header("Queue", SortColumn::Key, app)),
        Cell::from(format_header("Backlog", SortColumn::Backlog, app)),
        Cell::from("Queued"),
        Cell::from(format_header("Running", SortColumn::Running, app)),
        Cell::from(format_header("Success", SortColumn::Success, app)),
        Cell::from(format_header("Failed", SortColumn::Failed, app)),
        Cell::from("Trend"),
        Cell::from(format_header("Status", SortColumn::Status, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = queues
        .iter()
        .map(|q| {
            let status_style = app.theme.status_style(q.health);
            let failed_style = if q.failed_delta > 0 {
                app.theme.status_style(q.health)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(q.key.clone()),
                Cell::from(format_count(q.backlog())),
                Cell::from(format_count(q.current.queued)),
                Cell::from(format!("{} (~{})", format_count(q.current.running), q.avg_running)),
                Cell::from(format!("+{}", format_count(q.success_delta))),
                Cell::from(format!("+{}", format_count(q.failed_delta))).style(failed_style),
                Cell::from(render_sparkline(&q.backlog_trend, 12)),
                Cell::from(q.health.symbol()).style(status_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3), // Queue key
        Constraint::Fill(1), // Backlog
        Constraint::Fill(1), // Queued
        Constraint::Fill(1), // Running
        Constraint::Fill(1), // Success
        Constraint::Fill(1), // Failed
        Constraint::Min(12), // Trend
        Constraint::Min(6),  // Status
    ];

    let selected_visual_index = app.selected_index.min(queues.len().saturating_sub(1));
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !queues.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, queues.len())
    } else {
        String::new()
    };

    let title = format!(
        " Queues ({}/{}) [{}] [s:sort {}{}]{}{} ",
        queues.len(),
        overview.queues.len(),
        app.range,
        app.sort_column.label(),
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let visible_rows = usize::from(area.height.saturating_sub(TABLE_CHROME_ROWS));
    let mut state = TableState::default();
    *state.offset_mut() = table_offset(selected_visual_index, visible_rows);
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Rows of the table area not used by queues: two borders and the header.
pub const TABLE_CHROME_ROWS: u16 = 3;

/// First queue shown when `selected` must be visible in `visible_rows` rows.
///
/// The table scrolls only as far as needed to keep the selection on the
/// last visible row.
pub fn table_offset(selected: usize, visible_rows: usize) -> usize {
    selected.saturating_sub(visible_rows.saturating_sub(1))
}

/// Sort queues by the given column and direction.
pub fn sort_queues_by(queues: &mut [&QueueSummary], column: SortColumn, ascending: bool) {
    queues.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Key => a.key.cmp(&b.key),
            SortColumn::Backlog => a.backlog().cmp(&b.backlog()),
            SortColumn::Success => a.success_delta.cmp(&b.success_delta),
            SortColumn::Failed => a.failed_delta.cmp(&b.failed_delta),
            SortColumn::Running => a.avg_running.cmp(&b.avg_running),
            SortColumn::Status => a.health.cmp(&b.health),
        };

        let primary = if ascending { primary } else { primary.reverse() };

        // Secondary sort by key for stability when primary values are equal
        if primary == Ordering::Equal {
            a.key.cmp(&b.key)
        } else {
            primary
        }
    });
}

/// Render a series as at most `width` bar characters.
///
/// Longer series are decimated so the chart covers the whole window.
pub fn render_sparkline(values: &[u64], width: usize) -> String {
    if values.is_empty() {
        return " ".repeat(width);
    }

    sparkline_levels(&reduce(values, width))
        .into_iter()
        .map(|level| SPARKLINE_CHARS[usize::from(level.min(7))])
        .collect()
}

/// Format large numbers with K/M suffixes
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
