use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;
use crate::ui::summary::table_offset;

/// File written by the `e` key.
pub const EXPORT_FILE: &str = "queuewatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            // Allow scrolling through queues while overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Char('w') => app.next_range(),
            KeyCode::Char('W') => app.prev_range(),
            _ => {}
        }
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Enter => app.enter_detail(),
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Window range
        KeyCode::Char('w') | KeyCode::Right => app.next_range(),
        KeyCode::Char('W') | KeyCode::Left => app.prev_range(),

        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),

        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Keep text but exit input mode
        KeyCode::Esc => {
            app.cancel_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
///
/// `first_row` is the terminal row of the first visible queue and
/// `visible_rows` the number of queue rows the table shows.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, first_row: u16, visible_rows: usize) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            if mouse.row >= first_row {
                let item_row = usize::from(mouse.row - first_row);
                let len = app.visible_queues().len();
                let selected = app.selected_index.min(len.saturating_sub(1));
                let index = table_offset(selected, visible_rows) + item_row;
                if item_row < visible_rows && index < len {
                    app.selected_index = index;
                }
            }
        }

        MouseEventKind::Down(MouseButton::Right) => app.go_back(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewOptions;
    use crate::config::SamplingSettings;
    use crate::data::WindowRange;
    use crate::session::Session;
    use crate::ui::Theme;
    use queuewatch_types::Snapshot;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> App {
        let session = Session::init(&SamplingSettings::default());
        session.record(
            Snapshot::builder()
                .timestamp_ms(1_000)
                .queue("a", |q| q.queued(1))
                .queue("b", |q| q.queued(2))
                .build(),
        );
        let mut app = App::new(session, ViewOptions::default(), Theme::dark());
        app.refresh_at(1_000);
        app
    }

    #[test]
    fn quit_keys() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);

        let mut app = test_app();
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn filter_mode_captures_typing() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('/')));
        assert!(app.filter_active);

        // 'q' is text while filtering
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(app.running);
        assert_eq!(app.filter_text, "q");

        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert!(!app.filter_active);
        assert!(app.filter_text.is_empty());
    }

    #[test]
    fn window_keys_cycle_range() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('W')));
        assert_eq!(app.range, WindowRange::FifteenMinutes);
        handle_key_event(&mut app, key(KeyCode::Char('w')));
        assert_eq!(app.range, WindowRange::OneHour);
    }

    #[test]
    fn help_swallows_next_key() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn detail_overlay_navigation() {
        let mut app = test_app();
        handle_key_event(&mut app, key(KeyCode::Enter));
        assert!(app.show_detail_overlay);
        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_index, 1);
        handle_key_event(&mut app, key(KeyCode::Esc));
        assert!(!app.show_detail_overlay);
    }

    #[test]
    fn click_selects_row() {
        let mut app = test_app();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 4,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click, 3, 10);
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn click_accounts_for_scrolled_table() {
        let session = Session::init(&SamplingSettings::default());
        let mut builder = Snapshot::builder().timestamp_ms(1_000);
        for i in 0..20 {
            builder = builder.queue(format!("q{:02}", i), |q| q.queued(1));
        }
        session.record(builder.build());
        let mut app = App::new(session, ViewOptions::default(), Theme::dark());
        app.refresh_at(1_000);

        // Five rows visible, selection on q15 scrolls the table to q11..q15
        app.selected_index = 15;
        let click = |row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click(3), 3, 5);
        assert_eq!(app.selected_index, 11);
        assert_eq!(app.selected_queue().map(|q| q.key.as_str()), Some("q11"));

        // Below the last visible row
        handle_mouse_event(&mut app, click(9), 3, 5);
        assert_eq!(app.selected_index, 11);
    }
}
