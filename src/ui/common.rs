//! Common UI components: header bar, status bar and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use queuewatch_types::current_timestamp_ms;

use super::summary::format_count;
use crate::app::App;
use crate::data::duration::format_duration;
use crate::data::HealthStatus;

/// Render the header bar with overall queue health.
///
/// Displays: status indicator, queue counts by health, total backlog, window.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref overview) = app.overview else {
        let line = Line::from(vec![
            Span::styled(" QUEUEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Waiting for first sample..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let healthy = overview.count(HealthStatus::Healthy);
    let warning = overview.count(HealthStatus::Warning);
    let critical = overview.count(HealthStatus::Critical);
    let backlog: u64 = overview.queues.iter().map(|q| q.backlog()).sum();

    let status_style = if critical > 0 {
        app.theme.status_style(HealthStatus::Critical)
    } else if warning > 0 {
        app.theme.status_style(HealthStatus::Warning)
    } else {
        app.theme.status_style(HealthStatus::Healthy)
    };

    let dim_or = |n: usize, style: Style| {
        if n > 0 {
            Span::styled(n.to_string(), style)
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("QUEUEWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(healthy.to_string(), Style::default().fg(app.theme.healthy)),
        Span::raw(" ok "),
        dim_or(warning, Style::default().fg(app.theme.warning)),
        Span::raw(" warn "),
        dim_or(
            critical,
            Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" crit │ "),
        Span::styled(
            overview.queues.len().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" queues │ backlog "),
        Span::styled(format_count(backlog), Style::default().fg(app.theme.highlight)),
        Span::raw(format!(
            " │ {} window, {} samples",
            app.range, overview.sample_count
        )),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since last poll, next poll interval, controls.
/// Temporary status messages and source errors take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let poll = app.session().status();

    let status = if let Some(ref err) = app.load_error {
        format!(" {} | Error: {} | q:quit", poll.source, err)
    } else if app.filter_active {
        " Type to search | Enter:apply Esc:cancel".to_string()
    } else {
        let last_poll = poll
            .last_poll_ms
            .map(|t| {
                let ago = current_timestamp_ms().saturating_sub(t);
                format!("polled {} ago", format_duration(std::time::Duration::from_millis(ago)))
            })
            .unwrap_or_else(|| "not polled yet".to_string());

        format!(
            " {} | {} | next in {} | /:search s:sort w:window Enter:detail ?:help q:quit",
            poll.source,
            last_poll,
            format_duration(poll.interval),
        )
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Queue detail"),
        Line::from("  Esc         Close / clear filter"),
        Line::from(""),
        section(" Window"),
        Line::from("  w         Wider window"),
        Line::from("  W         Narrower window"),
        Line::from(""),
        section(" Table"),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Refresh now"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 28u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
