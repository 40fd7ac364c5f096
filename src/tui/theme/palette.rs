//! Color roles for the catalog browser (monochrome)

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub text_dim: Color,
    /// Lyric lines two or more rows away from the active one
    pub text_faint: Color,
    pub accent: Color,
    pub accent_soft: Color,
    pub border: Color,
    pub selection_fg: Color,
    pub selection_bg: Color,
    pub lyric_focus_bg: Color,
    pub playing: Color,
    pub error: Color,
}

impl Palette {
    pub const MONO: Self = Self {
        text: Color::Rgb(255, 255, 255),
        text_dim: Color::Rgb(136, 136, 136),
        text_faint: Color::Rgb(88, 88, 88),
        accent: Color::Rgb(255, 255, 255),
        accent_soft: Color::Rgb(200, 200, 200),
        border: Color::Rgb(64, 64, 64),
        selection_fg: Color::Rgb(0, 0, 0),
        selection_bg: Color::Rgb(255, 255, 255),
        lyric_focus_bg: Color::Rgb(48, 48, 48),
        playing: Color::Rgb(255, 255, 255),
        // Errors stay readable through the icon rather than color.
        error: Color::Rgb(255, 255, 255),
    };

    /// Style of a song row. Selection wins over the playing highlight.
    pub fn song_row(&self, selected: bool, playing: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.selection_fg)
                .bg(self.selection_bg)
                .add_modifier(Modifier::BOLD)
        } else if playing {
            Style::default().fg(self.playing).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.text)
        }
    }

    /// Style of a lyric line `distance` rows from the active line, or of any
    /// line when nothing is active yet.
    pub fn lyric_line(&self, distance: Option<usize>) -> Style {
        match distance {
            Some(0) => Style::default()
                .fg(self.accent)
                .bg(self.lyric_focus_bg)
                .add_modifier(Modifier::BOLD),
            Some(1) => Style::default().fg(self.text_dim),
            _ => Style::default().fg(self.text_faint),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::MONO
    }
}
