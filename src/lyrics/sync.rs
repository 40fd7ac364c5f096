//! Maps the playback clock onto the active lyric line.

use super::parser::LyricLine;

/// Index of the last line whose start time is at or before `current_time`.
///
/// `None` until the first stamp is reached. Scans from the end: during normal
/// playback the clock sits near the lines just passed, so the hit is close.
pub fn active_index(lines: &[LyricLine], current_time: f64) -> Option<usize> {
    lines.iter().rposition(|l| l.time_seconds <= current_time)
}

/// Request to bring a line into the middle of the lyric viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTo {
    pub index: usize,
}

/// Tracks the active line across clock ticks and emits a scroll request only
/// when the active index actually changes.
#[derive(Debug, Clone, Default)]
pub struct LyricsSynchronizer {
    active: Option<usize>,
}

impl LyricsSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn update(&mut self, lines: &[LyricLine], current_time: f64) -> Option<ScrollTo> {
        let next = active_index(lines, current_time);
        if next == self.active {
            return None;
        }
        self.active = next;
        next.map(|index| ScrollTo { index })
    }

    /// Forget the current line, e.g. when the lyric source changes.
    pub fn reset(&mut self) {
        self.active = None;
    }
}

/// First visible row so that `active` sits in the middle of `height` rows.
pub fn centered_offset(active: usize, total: usize, height: usize) -> usize {
    if height == 0 || total <= height {
        return 0;
    }
    active
        .saturating_sub(height / 2)
        .min(total - height)
}
