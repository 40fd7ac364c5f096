//! Now Playing widget - compact player bar at the bottom

use crate::app::state::{AppState, ToastKind};
use crate::player::PlaybackStatus;
use crate::tui::theme::{Icons, LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{format_clock, truncate_str};

/// Length of a catalog preview clip, used to scale the progress bar.
const PREVIEW_SECONDS: f64 = 30.0;

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = theme.panel(format!(" {} Player ", icons.music), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1), // Left padding
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Right padding
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title + status
            Constraint::Length(1), // Progress + volume
            Constraint::Min(0),    // Toast or status line
        ])
        .split(padded);

    let content_width = padded.width.saturating_sub(1) as usize;
    let pb = &state.playback;

    let (status_icon, status_text) = match pb.status {
        PlaybackStatus::Idle => (icons.stop, "Idle".to_string()),
        PlaybackStatus::Loading => (LoadingSpinner::frame(state.tick), "Loading".to_string()),
        PlaybackStatus::Playing => (icons.play, "Playing".to_string()),
        PlaybackStatus::Paused => (icons.pause, "Paused".to_string()),
        PlaybackStatus::Error => (
            icons.error,
            pb.error.clone().unwrap_or_else(|| "Error".to_string()),
        ),
    };

    let title = state.now_playing.as_deref().unwrap_or("Not playing");
    let title_line = Line::from(vec![
        Span::styled(
            format!("{status_icon} "),
            Style::default().fg(theme.palette.playing),
        ),
        Span::styled(
            truncate_str(title, content_width / 2),
            Style::default()
                .fg(theme.palette.text)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            truncate_str(&status_text, content_width / 2),
            Style::default().fg(theme.palette.text_dim),
        ),
    ]);
    frame.render_widget(Paragraph::new(title_line), rows[0]);

    let vol_icon = volume_icon(state.volume, icons);
    let clock = format_clock(pb.elapsed_seconds);
    let tail = format!(" {clock}  {vol_icon} {}%", state.volume);
    let bar_width = content_width.saturating_sub(tail.chars().count());
    let ratio = match pb.status {
        PlaybackStatus::Playing | PlaybackStatus::Paused => {
            (pb.elapsed_seconds / PREVIEW_SECONDS).clamp(0.0, 1.0)
        }
        _ => 0.0,
    };
    let progress = Line::from(vec![
        Span::styled(
            progress_bar(bar_width, ratio, icons),
            Style::default().fg(theme.palette.accent),
        ),
        Span::styled(tail, Style::default().fg(theme.palette.text_dim)),
    ]);
    frame.render_widget(Paragraph::new(progress), rows[1]);

    let bottom = if let Some(toast) = state.toast.as_ref().filter(|t| !t.is_expired()) {
        let (prefix, color) = match toast.kind {
            ToastKind::Success => (icons.success, theme.palette.playing),
            ToastKind::Error => (icons.error, theme.palette.error),
        };
        Line::from(vec![
            Span::styled(format!("{prefix} "), Style::default().fg(color)),
            Span::styled(
                truncate_str(&toast.message, content_width.saturating_sub(3)),
                Style::default().fg(color),
            ),
        ])
    } else {
        let mut status = state.status.clone();
        if !state.output_available {
            status.push_str("  [audio disabled]");
        }
        Line::from(Span::styled(
            truncate_str(&status, content_width),
            Style::default().fg(theme.palette.text_dim),
        ))
    };
    frame.render_widget(Paragraph::new(bottom), rows[2]);
}

fn volume_icon(volume: u8, icons: &Icons) -> &'static str {
    if volume == 0 {
        icons.volume_mute
    } else if volume < 50 {
        icons.volume_low
    } else {
        icons.volume_high
    }
}

fn progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }

    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    for _ in 0..filled {
        bar.push_str(icons.progress_full);
    }
    bar.push_str(icons.progress_head);
    for _ in 0..empty {
        bar.push_str(icons.progress_empty);
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_width() {
        let icons = Icons::nerd();
        assert_eq!(progress_bar(2, 0.5, &icons), "");
        assert_eq!(progress_bar(5, 0.0, &icons), "●────");
        assert_eq!(progress_bar(5, 1.0, &icons), "━━━━●");
        assert_eq!(progress_bar(10, 0.5, &icons).chars().count(), 10);
    }
}
