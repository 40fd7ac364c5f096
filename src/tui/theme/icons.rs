//! Nerd Font icons for TUI display
//! Requires a Nerd Font to be installed (https://www.nerdfonts.com)

#[derive(Debug, Clone)]
pub struct Icons {
    pub play: &'static str,
    pub pause: &'static str,
    pub stop: &'static str,

    pub volume_mute: &'static str,
    pub volume_low: &'static str,
    pub volume_high: &'static str,

    pub success: &'static str,
    pub error: &'static str,
    pub help: &'static str,

    pub music: &'static str,
    pub lyrics: &'static str,
    pub favorite: &'static str,
    pub language: &'static str,
    pub seed: &'static str,

    pub expanded: &'static str,
    pub collapsed: &'static str,

    pub progress_full: &'static str,
    pub progress_empty: &'static str,
    pub progress_head: &'static str,
}

impl Icons {
    pub const fn nerd() -> Self {
        Self {
            play: "\u{f04b}",        // nf-fa-play
            pause: "\u{f04c}",       // nf-fa-pause
            stop: "\u{f04d}",        // nf-fa-stop

            volume_mute: "\u{f026}", // nf-fa-volume_off
            volume_low: "\u{f027}",  // nf-fa-volume_down
            volume_high: "\u{f028}", // nf-fa-volume_up

            success: "\u{f00c}",     // nf-fa-check
            error: "\u{f00d}",       // nf-fa-times
            help: "\u{f059}",        // nf-fa-question_circle

            music: "\u{f001}",       // nf-fa-music
            lyrics: "\u{f15c}",      // nf-fa-file_text_o
            favorite: "\u{f004}",    // nf-fa-heart
            language: "\u{f1ab}",    // nf-fa-language
            seed: "\u{f074}",        // nf-fa-random

            expanded: "\u{f078}",    // nf-fa-chevron_down
            collapsed: "\u{f054}",   // nf-fa-chevron_right

            progress_full: "━",
            progress_empty: "─",
            progress_head: "●",
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self::nerd()
    }
}

pub struct LoadingSpinner;

impl LoadingSpinner {
    pub const BRAILLE: [&'static str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

    pub fn frame(tick: u64) -> &'static str {
        let idx = (tick / 4) as usize % Self::BRAILLE.len();
        Self::BRAILLE[idx]
    }
}
