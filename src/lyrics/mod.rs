//! Time-synchronised lyrics
//!
//! This module provides:
//! - a parser for `[mm:ss.cc]` timed lyric text
//! - the active-line lookup driven by the playback clock
//! - `LyricsView`, which memoises parsing and tracks the scroll position

pub mod parser;
pub mod sync;

use crate::catalog::SongId;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub use parser::{LyricLine, parse};
pub use sync::{LyricsSynchronizer, ScrollTo, active_index, centered_offset};

const PARSE_CACHE_SIZE: usize = 32;

/// Lyric state for the song whose detail is open.
#[derive(Debug)]
pub struct LyricsView {
    cache: LruCache<String, Arc<[LyricLine]>>,
    source: Option<SongId>,
    lines: Arc<[LyricLine]>,
    sync: LyricsSynchronizer,
    scroll_target: Option<usize>,
}

impl Default for LyricsView {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsView {
    pub fn new() -> Self {
        let cap = NonZeroUsize::new(PARSE_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            source: None,
            lines: Arc::from(Vec::new()),
            sync: LyricsSynchronizer::new(),
            scroll_target: None,
        }
    }

    /// Show the lyrics `raw` of song `id`. Returns `false` if that song is
    /// already shown. Call [`LyricsView::clear`] when the song list is
    /// replaced, since ids are only unique within one result set.
    pub fn set_source(&mut self, id: SongId, raw: &str) -> bool {
        if self.source == Some(id) {
            return false;
        }
        let cached = self.cache.get(raw).cloned();
        let lines = match cached {
            Some(lines) => lines,
            None => {
                let lines: Arc<[LyricLine]> = Arc::from(parse(raw));
                self.cache.put(raw.to_string(), lines.clone());
                lines
            }
        };
        tracing::debug!(lines = lines.len(), "lyrics source changed");
        self.lines = lines;
        self.source = Some(id);
        self.sync.reset();
        self.scroll_target = None;
        true
    }

    pub fn clear(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.source = None;
        self.lines = Arc::from(Vec::new());
        self.sync.reset();
        self.scroll_target = None;
    }

    /// Advance to `current_time`; returns the scroll request if the active line moved.
    pub fn tick(&mut self, current_time: f64) -> Option<ScrollTo> {
        let scroll = self.sync.update(&self.lines, current_time);
        match scroll {
            Some(ScrollTo { index }) => self.scroll_target = Some(index),
            // Clock moved back before the first stamp, e.g. playback stopped.
            None if self.sync.active().is_none() => self.scroll_target = None,
            None => {}
        }
        scroll
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn active(&self) -> Option<usize> {
        self.sync.active()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// First row to draw in a viewport of `height` rows.
    pub fn scroll_offset(&self, height: usize) -> usize {
        self.scroll_target
            .map(|t| centered_offset(t, self.lines.len(), height))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "[00:01.00]a\n[00:02.00]b\n[00:03.00]c";

    #[test]
    fn test_set_source_is_idempotent() {
        let mut view = LyricsView::new();
        assert!(view.set_source(1, RAW));
        view.tick(2.5);
        assert_eq!(view.active(), Some(1));

        assert!(!view.set_source(1, RAW));
        assert_eq!(view.active(), Some(1));
        assert_eq!(view.lines().len(), 3);
    }

    #[test]
    fn test_switching_source_resets_position() {
        let mut view = LyricsView::new();
        view.set_source(1, RAW);
        view.tick(3.0);
        assert!(view.set_source(2, "[00:05.00]x"));
        assert_eq!(view.active(), None);
        assert_eq!(view.tick(1.0), None);
        assert_eq!(view.tick(5.0), Some(ScrollTo { index: 0 }));
    }

    #[test]
    fn test_reparse_is_served_from_cache() {
        let mut view = LyricsView::new();
        view.set_source(1, RAW);
        let first = view.lines.clone();
        view.set_source(2, "[00:05.00]x");
        view.set_source(1, RAW);
        assert!(Arc::ptr_eq(&first, &view.lines));
    }

    #[test]
    fn test_same_text_under_new_id_reuses_parse() {
        let mut view = LyricsView::new();
        view.set_source(1, RAW);
        let first = view.lines.clone();
        view.clear();
        assert!(view.set_source(9, RAW));
        assert!(Arc::ptr_eq(&first, &view.lines));
        assert!(!view.set_source(9, RAW));
    }

    #[test]
    fn test_scroll_offset_follows_last_scroll() {
        let raw: String = (0..20).map(|i| format!("[00:{i:02}.00]line {i}\n")).collect();
        let mut view = LyricsView::new();
        view.set_source(3, &raw);
        assert_eq!(view.scroll_offset(5), 0);
        view.tick(10.0);
        assert_eq!(view.scroll_offset(5), 8);
        view.tick(f64::NEG_INFINITY);
        assert_eq!(view.scroll_offset(5), 0);
        view.tick(10.0);
        view.clear();
        assert!(!view.has_source());
        assert_eq!(view.scroll_offset(5), 0);
    }
}
