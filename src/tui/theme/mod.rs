//! Monochrome theme shared by all widgets

pub mod icons;
pub mod palette;

pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

use ratatui::style::Style;
use ratatui::symbols::border;
use ratatui::widgets::{Block, Borders};

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
}

impl Theme {
    pub const fn new() -> Self {
        Self {
            palette: Palette::MONO,
            icons: Icons::nerd(),
        }
    }

    /// Rounded panel with a title, highlighted when `focused`.
    pub fn panel<'a>(&self, title: String, focused: bool) -> Block<'a> {
        let border = if focused {
            self.palette.accent
        } else {
            self.palette.border
        };
        Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(border))
            .title(title)
            .title_style(Style::default().fg(self.palette.accent))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

pub fn get_theme() -> Theme {
    Theme::new()
}
