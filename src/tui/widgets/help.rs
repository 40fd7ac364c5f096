//! Help overlay showing keybindings

use crate::tui::theme::{Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

pub fn render(frame: &mut Frame, area: Rect) {
    let theme = get_theme();

    let block = theme.panel(format!(" {} Keybinds ", theme.icons.help), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let left = vec![
        section_header("Navigation", &theme),
        keybind("j / Down", "Move down", &theme),
        keybind("k / Up", "Move up", &theme),
        keybind("g / G", "Top / bottom", &theme),
        keybind("Ctrl+d/u", "Page down / up", &theme),
        keybind("Enter", "Open / close details", &theme),
        Line::default(),
        section_header("Playback", &theme),
        keybind("p", "Preview selected song", &theme),
        keybind("Space", "Pause / resume", &theme),
        keybind("s", "Stop", &theme),
        keybind("+ / -", "Volume up / down", &theme),
    ];
    frame.render_widget(Paragraph::new(left).wrap(Wrap { trim: false }), cols[0]);

    let right = vec![
        section_header("Query", &theme),
        keybind("L", "Next language", &theme),
        keybind("e or /", "Edit seed", &theme),
        keybind("R", "Random seed", &theme),
        keybind(". / ,", "Likes +0.1 / -0.1", &theme),
        keybind("r / F5", "Reload from page 1", &theme),
        Line::default(),
        section_header("General", &theme),
        keybind("?", "Toggle this help", &theme),
        keybind("q / Esc", "Quit", &theme),
    ];
    frame.render_widget(Paragraph::new(right).wrap(Wrap { trim: false }), cols[1]);
}

fn section_header(title: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![Span::styled(
        format!("━━ {} ━━", title),
        Style::default()
            .fg(theme.palette.accent)
            .add_modifier(Modifier::BOLD),
    )])
}

fn keybind(key: &str, desc: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled("  ", Style::default()),
        Span::styled(
            format!("{:12}", key),
            Style::default()
                .fg(theme.palette.accent_soft)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(theme.palette.text)),
    ])
}
