//! Query toolbar: language, seed and like-score filter

use crate::app::state::{AppState, Focus};
use crate::catalog::models::MAX_LIKE_SCORE;
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const LIKE_BAR_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;
    let editing = state.focus == Focus::SeedInput;

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Min(20),
            Constraint::Length(LIKE_BAR_WIDTH as u16 + 12),
        ])
        .split(area);

    let lang = Paragraph::new(Line::from(Span::styled(
        state.query.lang.to_uppercase(),
        Style::default()
            .fg(theme.palette.text)
            .add_modifier(Modifier::BOLD),
    )))
    .block(theme.panel(format!(" {} Lang ", icons.language), false));
    frame.render_widget(lang, cols[0]);

    let seed_text = if editing {
        format!("{}▏", state.seed_input)
    } else {
        state.query.seed.clone()
    };
    let seed = Paragraph::new(Line::from(Span::styled(
        seed_text,
        Style::default().fg(theme.palette.text),
    )))
    .block(theme.panel(format!(" {} Seed ", icons.seed), editing));
    frame.render_widget(seed, cols[1]);

    let likes = Paragraph::new(Line::from(vec![
        Span::styled(
            like_bar(state.query.like_score, LIKE_BAR_WIDTH),
            Style::default().fg(theme.palette.accent_soft),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:.1}", state.query.like_score),
            Style::default()
                .fg(theme.palette.text)
                .add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(theme.panel(format!(" {} Likes ", icons.favorite), false));
    frame.render_widget(likes, cols[2]);
}

fn like_bar(score: f64, width: usize) -> String {
    let filled = ((score / MAX_LIKE_SCORE).clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_bar_fill() {
        assert_eq!(like_bar(0.0, 4), "░░░░");
        assert_eq!(like_bar(5.0, 4), "██░░");
        assert_eq!(like_bar(10.0, 4), "████");
        assert_eq!(like_bar(42.0, 4), "████");
    }
}
