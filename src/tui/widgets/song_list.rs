//! Song list widget - paginated rows with a status footer
//!
//! The footer row doubles as the infinite-scroll sentinel: once the viewport
//! reaches the last song the app asks the pagination engine for the next page.

use crate::app::state::AppState;
use crate::catalog::Song;
use crate::pagination::PaginationEngine;
use crate::tui::theme::{LoadingSpinner, Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::fit;

const INDEX_WIDTH: usize = 5;
const LIKES_WIDTH: usize = 5;

pub fn render(frame: &mut Frame, state: &mut AppState, pager: &PaginationEngine, area: Rect) {
    let theme = get_theme();
    let items = pager.items();

    let title = format!(
        " Songs · {} · {} loaded · page {} ",
        pager.key().label(),
        items.len(),
        pager.cursor()
    );
    let block = theme.panel(title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Rows
            Constraint::Length(1), // Footer
        ])
        .split(inner);

    let visible_height = rows[1].height as usize;
    state.list.set_visible_height(visible_height);

    let widths = ColumnWidths::for_width(rows[1].width as usize);
    frame.render_widget(
        Paragraph::new(header_line(&widths, &theme)),
        rows[0],
    );

    let offset = state.list.scroll_offset;
    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible_height)
        .map(|(i, song)| {
            song_line(
                song,
                &widths,
                i == state.list.selected,
                state.coordinator.is_expanded(song.id),
                state.playback.is_active(&song.cover_seed),
                &theme,
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), rows[1]);

    frame.render_widget(
        Paragraph::new(footer_line(pager, state.tick, &theme)),
        rows[2],
    );
}

struct ColumnWidths {
    title: usize,
    artist: usize,
    album: usize,
    genre: usize,
}

impl ColumnWidths {
    fn for_width(width: usize) -> Self {
        // Marker, index and likes are fixed; the rest is shared 3:3:2:2.
        let flexible = width.saturating_sub(2 + INDEX_WIDTH + LIKES_WIDTH + 5);
        Self {
            title: flexible * 3 / 10,
            artist: flexible * 3 / 10,
            album: flexible * 2 / 10,
            genre: flexible * 2 / 10,
        }
    }
}

fn header_line<'a>(w: &ColumnWidths, theme: &Theme) -> Line<'a> {
    let text = format!(
        "  {} {} {} {} {} {:>LIKES_WIDTH$}",
        fit("#", INDEX_WIDTH),
        fit("Title", w.title),
        fit("Artist", w.artist),
        fit("Album", w.album),
        fit("Genre", w.genre),
        "Likes",
    );
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(theme.palette.text_dim)
            .add_modifier(Modifier::BOLD),
    ))
}

fn song_line<'a>(
    song: &Song,
    w: &ColumnWidths,
    selected: bool,
    expanded: bool,
    playing: bool,
    theme: &Theme,
) -> Line<'a> {
    let icons = &theme.icons;
    let marker = if playing {
        icons.music
    } else if expanded {
        icons.expanded
    } else if selected {
        icons.collapsed
    } else {
        " "
    };

    let style = theme.palette.song_row(selected, playing);

    let text = format!(
        "{marker} {} {} {} {} {} {:>LIKES_WIDTH$.1}",
        fit(&song.id.to_string(), INDEX_WIDTH),
        fit(&song.title, w.title),
        fit(&song.artist, w.artist),
        fit(&song.album, w.album),
        fit(&song.genre, w.genre),
        song.like_score,
    );
    Line::from(Span::styled(text, style))
}

fn footer_line<'a>(pager: &PaginationEngine, tick: u64, theme: &Theme) -> Line<'a> {
    let muted = Style::default().fg(theme.palette.text_dim);
    let text = footer_text(pager);
    match text {
        Footer::Loading(msg) => Line::from(vec![
            Span::styled(format!("{} ", LoadingSpinner::frame(tick)), muted),
            Span::styled(msg, muted),
        ]),
        Footer::Error(msg) => Line::from(vec![
            Span::styled(
                format!("{} ", theme.icons.error),
                Style::default().fg(theme.palette.error),
            ),
            Span::styled(msg, Style::default().fg(theme.palette.error)),
        ]),
        Footer::Info(msg) => Line::from(Span::styled(msg, muted)),
    }
}

#[derive(Debug, PartialEq)]
enum Footer {
    Loading(String),
    Error(String),
    Info(String),
}

fn footer_text(pager: &PaginationEngine) -> Footer {
    if let Some(err) = pager.last_error() {
        return Footer::Error(format!("Failed to load data: {err} (r to retry)"));
    }
    let empty = pager.items().is_empty();
    match (pager.is_loading(), pager.has_more(), empty) {
        (true, _, true) => Footer::Loading("Loading songs...".into()),
        (true, _, false) => Footer::Loading("Loading more songs...".into()),
        (false, false, true) => Footer::Info("No songs found.".into()),
        (false, false, false) => Footer::Info("You have reached the end!".into()),
        (false, true, _) => Footer::Info("↓ Scroll for more".into()),
    }
}
