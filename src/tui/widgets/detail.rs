//! Detail panel for the expanded song: metadata, review and synced lyrics

use crate::app::state::AppState;
use crate::catalog::Song;
use crate::lyrics::LyricsView;
use crate::pagination::PaginationEngine;
use crate::tui::theme::{Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::truncate_str;

pub fn render(frame: &mut Frame, state: &AppState, pager: &PaginationEngine, area: Rect) {
    let theme = get_theme();

    let expanded = state
        .coordinator
        .expanded()
        .and_then(|id| pager.items().iter().find(|s| s.id == id));

    let Some(song) = expanded else {
        let block = theme.panel(" Details ".to_string(), false);
        let hint = Paragraph::new(Line::from(Span::styled(
            "Press Enter on a song to open it",
            Style::default().fg(theme.palette.text_dim),
        )))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(hint, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(area);

    render_info(frame, state, song, &theme, rows[0]);
    render_lyrics(frame, &state.lyrics, &theme, rows[1]);
}

fn render_info(frame: &mut Frame, state: &AppState, song: &Song, theme: &Theme, area: Rect) {
    let icons = &theme.icons;
    let block = theme.panel(format!(" {} {} ", icons.music, song.title), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let label = Style::default().fg(theme.palette.text_dim);
    let value = Style::default().fg(theme.palette.text);

    let status = if state.playback.is_active(&song.cover_seed) {
        format!("{:?}", state.playback.status)
    } else {
        "press p to preview".to_string()
    };

    let mut lines = vec![
        field("Artist", &song.artist, width, label, value),
        field("Album", &song.album, width, label, value),
        field("Genre", &song.genre, width, label, value),
        field("Likes", &format!("{:.1}", song.like_score), width, label, value),
        field("Cover", &song.cover_seed, width, label, value),
        field("Audio", &status, width, label, value),
    ];
    if let Some(review) = song.review.as_deref().filter(|r| !r.trim().is_empty()) {
        lines.push(Line::from(Span::styled(
            review.to_string(),
            Style::default()
                .fg(theme.palette.accent_soft)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn field<'a>(name: &str, text: &str, width: usize, label: Style, value: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{name:<8}"), label),
        Span::styled(truncate_str(text, width.saturating_sub(8)), value),
    ])
}

fn render_lyrics(frame: &mut Frame, lyrics: &LyricsView, theme: &Theme, area: Rect) {
    let block = theme.panel(format!(" {} Lyrics ", theme.icons.lyrics), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if lyrics.lines().is_empty() {
        let text = if lyrics.has_source() {
            "No timed lyrics"
        } else {
            "No lyrics available"
        };
        let msg = Paragraph::new(Line::from(Span::styled(
            text,
            Style::default().fg(theme.palette.text_dim),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(msg, inner);
        return;
    }

    let height = inner.height as usize;
    let width = inner.width.saturating_sub(2) as usize;
    let offset = lyrics.scroll_offset(height);
    let active = lyrics.active();

    let lines: Vec<Line> = lyrics
        .lines()
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(i, line)| {
            let style = theme.palette.lyric_line(active.map(|a| a.abs_diff(i)));
            Line::from(Span::styled(truncate_str(&line.text, width), style))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}
