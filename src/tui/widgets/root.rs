//! Root layout widget - orchestrates main layout structure

use crate::app::state::AppState;
use crate::pagination::PaginationEngine;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Clear,
};

use super::{detail, help, now_playing, song_list, toolbar};

/// Main layout structure:
/// ┌──────────────────────────────────────────────────────┐
/// │ Language │ Seed │ Likes                              │
/// ├─────────────────────────────┬────────────────────────┤
/// │  Songs                      │  Detail                │
/// │  (paginated list)           │  (info + lyrics)       │
/// ├─────────────────────────────┴────────────────────────┤
/// │ Player                                               │
/// └──────────────────────────────────────────────────────┘
pub fn render(frame: &mut Frame, state: &mut AppState, pager: &PaginationEngine) {
    let root = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Toolbar
            Constraint::Min(8),    // List + detail
            Constraint::Length(5), // Player bar
        ])
        .split(root);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(rows[1]);

    toolbar::render(frame, state, rows[0]);
    song_list::render(frame, state, pager, cols[0]);
    detail::render(frame, state, pager, cols[1]);
    now_playing::render(frame, state, rows[2]);

    if state.show_help {
        let area = centered_rect(70, 70, root);
        frame.render_widget(Clear, area);
        help::render(frame, area);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
