//! Detail overlay rendering.
//!
//! Displays a modal overlay with per-metric trends for the selected queue.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::summary::{format_count, render_sparkline};
use crate::app::App;
use crate::data::duration::format_duration;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the queue detail as a modal overlay.
///
/// Shows the queue's health and one row per counter: latest value, window
/// delta, average, peak, rate and a downsampled sparkline.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(queue) = app.selected_queue() else {
        return;
    };
    let details = app.metric_details(&queue.key);

    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 120);
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 20);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(5), // Header with queue info
        Constraint::Min(9),    // Metric table
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let span = app
        .overview
        .as_ref()
        .map(|o| format_duration(std::time::Duration::from_millis(o.span_ms)))
        .unwrap_or_else(|| "-".to_string());

    let header_lines = vec![
        Line::from(vec![Span::styled(
            format!(" {} ", queue.key),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Backlog: "),
            Span::styled(
                format_count(queue.backlog()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  (peak {})", format_count(queue.peak_backlog))),
            Span::raw("    Window: "),
            Span::styled(format!("{} ({} covered)", app.range, span), Style::default()),
            Span::raw("    Status: "),
            Span::styled(
                format!("{} {}", queue.health.symbol(), queue.health.label()),
                app.theme.status_style(queue.health).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];

    let header_block = Block::default()
        .title(" Queue Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Paragraph::new(header_lines).block(header_block), chunks[0]);

    // ===== METRIC TABLE =====
    let spark_width = usize::from(chunks[1].width / 3).max(8);

    let header = Row::new(vec![
        Cell::from("Metric"),
        Cell::from("Latest"),
        Cell::from("Δ"),
        Cell::from("Avg"),
        Cell::from("Peak"),
        Cell::from("/min"),
        Cell::from("Trend"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = details
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.metric.label()),
                Cell::from(format_count(d.latest)),
                Cell::from(format_count(d.delta)),
                Cell::from(format_count(d.average)),
                Cell::from(format_count(d.peak)),
                Cell::from(d.rate_per_minute.map_or_else(|| "-".to_string(), |r| format!("{:.1}", r))),
                Cell::from(render_sparkline(&d.points, spark_width)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Counters ({} points max) ", app.max_points))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, chunks[1]);

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close | ↑↓ next queue | w/W window ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}
