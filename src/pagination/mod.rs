//! Incremental loading of catalog pages.
//!
//! The engine never performs I/O itself. `reset` and `load_next` hand back a
//! [`PageRequest`] describing the fetch to issue; the caller runs it and feeds
//! the completion to [`PaginationEngine::apply`] together with that same
//! request. Every request carries the generation and query key it was issued
//! under, so completions that arrive after a reset are recognised and dropped.

use crate::catalog::{QueryKey, Song, SongId, SongPage};
use crate::error::CatalogError;
use std::collections::HashSet;

/// A page fetch the caller must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub generation: u64,
    pub key: QueryKey,
    pub page: u32,
    pub per_page: u32,
}

/// What `apply` did with a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Items were merged; `added` counts the ones that were not duplicates.
    Appended { added: usize },
    /// The whole list was dropped because the fetch failed.
    Failed,
    /// The completion belongs to a superseded query or cursor.
    Stale,
}

#[derive(Debug)]
pub struct PaginationEngine {
    key: QueryKey,
    per_page: u32,
    generation: u64,
    items: Vec<Song>,
    seen_ids: HashSet<SongId>,
    cursor: u32,
    in_flight: Option<u32>,
    has_more: bool,
    last_error: Option<String>,
}

impl PaginationEngine {
    pub fn new(key: QueryKey, per_page: u32) -> Self {
        Self {
            key,
            per_page: per_page.max(1),
            generation: 0,
            items: Vec::new(),
            seen_ids: HashSet::new(),
            cursor: 0,
            in_flight: None,
            has_more: true,
            last_error: None,
        }
    }

    pub fn items(&self) -> &[Song] {
        &self.items
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Page number of the most recent request (0 before the first one).
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Discard everything for the old query and request page 1 of `key`.
    ///
    /// The state is cleared before the request is returned, so nothing issued
    /// under the previous key can be applied afterwards.
    pub fn reset(&mut self, key: QueryKey) -> PageRequest {
        self.generation += 1;
        self.key = key;
        self.items.clear();
        self.seen_ids.clear();
        self.cursor = 0;
        self.in_flight = None;
        self.has_more = true;
        self.last_error = None;
        tracing::debug!(generation = self.generation, query = %self.key.label(), "pagination reset");
        self.issue(1)
    }

    /// Re-run page 1 of the current query, e.g. after a failure.
    pub fn retry(&mut self) -> PageRequest {
        let key = self.key.clone();
        self.reset(key)
    }

    /// Request the page after the cursor, unless a fetch is already running
    /// or the result set is exhausted.
    pub fn load_next(&mut self) -> Option<PageRequest> {
        if self.is_loading() || !self.has_more {
            return None;
        }
        Some(self.issue(self.cursor + 1))
    }

    /// Entry point for the "last rendered item became visible" signal.
    pub fn on_sentinel_visible(&mut self) -> Option<PageRequest> {
        self.load_next()
    }

    fn issue(&mut self, page: u32) -> PageRequest {
        self.cursor = page;
        self.in_flight = Some(page);
        PageRequest {
            generation: self.generation,
            key: self.key.clone(),
            page,
            per_page: self.per_page,
        }
    }

    fn is_current(&self, request: &PageRequest) -> bool {
        request.generation == self.generation
            && request.key == self.key
            && self.in_flight == Some(request.page)
    }

    /// Merge the completion of `request` into the list.
    pub fn apply(
        &mut self,
        request: &PageRequest,
        result: Result<SongPage, CatalogError>,
    ) -> PageOutcome {
        if !self.is_current(request) {
            tracing::debug!(
                generation = request.generation,
                page = request.page,
                current = self.generation,
                "discarding stale page response"
            );
            return PageOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(page) => {
                let exhausted = page.songs.is_empty() || request.page >= page.total_pages;
                let added = self.append(page.songs);
                if exhausted {
                    self.has_more = false;
                }
                tracing::debug!(
                    page = request.page,
                    total_pages = page.total_pages,
                    added,
                    has_more = self.has_more,
                    "page applied"
                );
                PageOutcome::Appended { added }
            }
            Err(e) => {
                tracing::warn!(page = request.page, error = %e, "page fetch failed");
                self.items.clear();
                self.seen_ids.clear();
                self.has_more = false;
                self.last_error = Some(e.to_string());
                PageOutcome::Failed
            }
        }
    }

    fn append(&mut self, songs: Vec<Song>) -> usize {
        let before = self.items.len();
        for song in songs {
            if self.seen_ids.insert(song.id) {
                self.items.push(song);
            }
        }
        self.items.len() - before
    }
}
