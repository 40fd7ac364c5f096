use crate::catalog::{QueryKey, SongId};
use crate::lyrics::LyricsView;
use crate::player::PlaybackState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    SeedInput,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

/// Selection and viewport over the song list.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub selected: usize,
    pub scroll_offset: usize,
    /// Rows available to the list on the last draw
    pub visible_height: usize,
}

impl ListView {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.update_scroll();
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
        self.update_scroll();
    }

    pub fn go_top(&mut self) {
        self.selected = 0;
        self.update_scroll();
    }

    pub fn go_bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
        self.update_scroll();
    }

    pub fn page_up(&mut self) {
        let step = self.visible_height.max(1);
        self.selected = self.selected.saturating_sub(step);
        self.update_scroll();
    }

    pub fn page_down(&mut self, len: usize) {
        let step = self.visible_height.max(1);
        self.selected = (self.selected + step).min(len.saturating_sub(1));
        self.update_scroll();
    }

    pub fn set_visible_height(&mut self, height: usize) {
        self.visible_height = height;
        self.update_scroll();
    }

    fn update_scroll(&mut self) {
        if self.visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.visible_height {
            self.scroll_offset = self.selected - self.visible_height + 1;
        }
    }

    /// Whether the last of `len` items is inside the viewport.
    pub fn sentinel_visible(&self, len: usize) -> bool {
        len > 0 && self.visible_height > 0 && self.scroll_offset + self.visible_height >= len
    }

    pub fn clear(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }
}

/// Which song, if any, has its detail panel open.
///
/// Expansion is purely a view concern: opening another song does not touch
/// playback, which stays single-flight on its own.
#[derive(Debug, Clone, Default)]
pub struct ViewCoordinator {
    expanded: Option<SongId>,
}

impl ViewCoordinator {
    pub fn expanded(&self) -> Option<SongId> {
        self.expanded
    }

    /// Open `id`, or close it if it is already open.
    pub fn toggle(&mut self, id: SongId) {
        self.expanded = match self.expanded {
            Some(open) if open == id => None,
            _ => Some(id),
        };
    }

    pub fn is_expanded(&self, id: SongId) -> bool {
        self.expanded == Some(id)
    }

    /// The item list was replaced by a new query.
    pub fn on_reset(&mut self) {
        self.expanded = None;
    }
}

pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,

    pub query: QueryKey,
    pub focus: Focus,
    pub seed_input: String,
    pub show_help: bool,

    pub list: ListView,
    pub coordinator: ViewCoordinator,
    pub lyrics: LyricsView,

    // Playback snapshot, refreshed from the controller's watch channel
    pub playback: PlaybackState,
    pub now_playing: Option<String>,
    pub volume: u8,
    pub output_available: bool,

    pub toast: Option<Toast>,
    pub status: String,
}

impl AppState {
    pub fn new(query: QueryKey, volume: u8) -> Self {
        Self {
            should_quit: false,
            tick: 0,
            seed_input: query.seed.clone(),
            query,
            focus: Focus::List,
            show_help: false,
            list: ListView::default(),
            coordinator: ViewCoordinator::default(),
            lyrics: LyricsView::new(),
            playback: PlaybackState::default(),
            now_playing: None,
            volume,
            output_available: false,
            toast: None,
            status: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_single_expansion() {
        let mut c = ViewCoordinator::default();
        c.toggle(1);
        assert!(c.is_expanded(1));
        c.toggle(2);
        assert!(!c.is_expanded(1));
        assert_eq!(c.expanded(), Some(2));
        c.toggle(2);
        assert_eq!(c.expanded(), None);
    }

    #[test]
    fn test_coordinator_clears_on_reset() {
        let mut c = ViewCoordinator::default();
        c.toggle(5);
        c.on_reset();
        assert_eq!(c.expanded(), None);
    }

    #[test]
    fn test_list_scrolls_with_selection() {
        let mut list = ListView::default();
        list.set_visible_height(3);
        for _ in 0..4 {
            list.select_next(10);
        }
        assert_eq!(list.selected, 4);
        assert_eq!(list.scroll_offset, 2);
        list.go_top();
        assert_eq!(list.scroll_offset, 0);
        list.go_bottom(10);
        assert_eq!(list.selected, 9);
        assert_eq!(list.scroll_offset, 7);
        list.page_up();
        assert_eq!(list.selected, 6);
        list.page_down(8);
        assert_eq!(list.selected, 7);
    }

    #[test]
    fn test_sentinel_visibility() {
        let mut list = ListView::default();
        assert!(!list.sentinel_visible(5));
        list.set_visible_height(10);
        assert!(list.sentinel_visible(5));
        assert!(!list.sentinel_visible(0));
        assert!(!list.sentinel_visible(20));
        list.go_bottom(20);
        assert!(list.sentinel_visible(20));
    }
}
