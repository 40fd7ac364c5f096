pub mod actions;
pub mod events;
pub mod state;

use crate::catalog::{CatalogClient, QueryKey, Song, models::random_seed};
use crate::config::Config;
use crate::input;
use crate::pagination::{PageOutcome, PageRequest, PaginationEngine};
use crate::player::mpv::MpvOutput;
use crate::player::{Completion, FetchTicket, PlaybackController, PlaybackState, PlaybackStatus};
use crate::tui::{self, TuiTerminal};
use actions::Action;
use events::{Event, NetworkEvent};
use state::{AppState, Focus, Toast};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

pub struct App {
    cfg: Config,
    config_path: std::path::PathBuf,
    state: AppState,
    catalog: CatalogClient,
    pager: PaginationEngine,
    player: Option<PlaybackController<MpvOutput>>,
    playback_rx: Option<watch::Receiver<PlaybackState>>,
}

impl App {
    pub fn new(cfg: Config, config_path: std::path::PathBuf) -> anyhow::Result<Self> {
        let catalog = CatalogClient::new(
            &cfg.catalog.base_url,
            Duration::from_secs(cfg.catalog.timeout_secs),
        )?;
        let query = cfg.initial_query();
        let pager = PaginationEngine::new(query.clone(), cfg.catalog.per_page);
        let state = AppState::new(query, cfg.player.volume);

        Ok(Self {
            cfg,
            config_path,
            state,
            catalog,
            pager,
            player: None,
            playback_rx: None,
        })
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone(), self.cfg.input.mouse);

        // Audio is best-effort: without mpv, play requests end in an error status.
        let preview_dir = self.cfg.preview_dir();
        let output = match MpvOutput::spawn(
            tx.clone(),
            self.cfg.player.audio_device.as_deref(),
            &preview_dir,
        )
        .await
        {
            Ok(out) => {
                out.set_volume(self.state.volume);
                out
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "mpv unavailable");
                self.state.toast = Some(Toast::error(format!("audio disabled: {e:#}")));
                MpvOutput::disabled(&preview_dir)
            }
        };
        self.state.output_available = output.is_available();
        let player = PlaybackController::new(output);
        self.playback_rx = Some(player.subscribe());
        self.player = Some(player);

        let request = self.pager.reset(self.state.query.clone());
        self.spawn_page(request, &tx);

        tui::draw(terminal, &mut self.state, &self.pager)?;

        while let Some(ev) = rx.recv().await {
            self.state.tick = self.state.tick.wrapping_add(1);
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                        self.handle_action(action, &tx);
                    }
                }
                Event::Output(signal) => {
                    if let Some(player) = &mut self.player {
                        player.on_output(signal);
                    }
                }
                Event::Network(ne) => self.handle_network(ne),
            }

            if self.state.should_quit {
                break;
            }

            self.refresh_playback();
            tui::draw(terminal, &mut self.state, &self.pager)?;
            self.maybe_load_more(&tx);
        }

        if let Some(player) = &mut self.player {
            player.stop();
        }
        self.save_state_on_quit();
        Ok(())
    }

    fn save_state_on_quit(&mut self) {
        self.cfg.player.volume = self.state.volume;
        self.cfg.ui.last_query = Some(self.state.query.clone());
        if let Err(e) = crate::config::save(&self.cfg, Some(&self.config_path)) {
            tracing::warn!(error = %format!("{e:#}"), "save config");
        }
    }

    fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::Resize => {}
            Action::ListUp => self.state.list.select_prev(),
            Action::ListDown => self.state.list.select_next(self.pager.items().len()),
            Action::GoTop => self.state.list.go_top(),
            Action::GoBottom => self.state.list.go_bottom(self.pager.items().len()),
            Action::PageUp => self.state.list.page_up(),
            Action::PageDown => self.state.list.page_down(self.pager.items().len()),
            Action::ToggleExpand => {
                if let Some(song) = self.selected_song() {
                    let id = song.id;
                    self.state.coordinator.toggle(id);
                }
            }
            Action::PlaySelected => {
                if let Some(song) = self.selected_song().cloned() {
                    self.request_preview(&song, tx);
                }
            }
            Action::TogglePause => {
                if let Some(player) = &mut self.player
                    && let Some(key) = player.state().active_key.clone()
                    && matches!(
                        player.state().status,
                        PlaybackStatus::Playing | PlaybackStatus::Paused
                    )
                {
                    // Same key: the controller flips between playing and paused.
                    player.request(&key);
                }
            }
            Action::Stop => {
                if let Some(player) = &mut self.player {
                    player.stop();
                }
                self.state.now_playing = None;
            }
            Action::VolumeUp => self.set_volume(self.state.volume.saturating_add(5).min(100)),
            Action::VolumeDown => self.set_volume(self.state.volume.saturating_sub(5)),
            Action::NextLanguage => self.change_query(self.state.query.with_next_lang(), tx),
            Action::LikesUp => self.change_query(self.state.query.with_like_delta(0.1), tx),
            Action::LikesDown => self.change_query(self.state.query.with_like_delta(-0.1), tx),
            Action::RandomSeed => {
                let key = self.state.query.with_seed(random_seed());
                self.state.toast = Some(Toast::success(format!("seed {}", key.seed)));
                self.change_query(key, tx);
            }
            Action::EditSeed => {
                self.state.seed_input = self.state.query.seed.clone();
                self.state.focus = Focus::SeedInput;
            }
            Action::InputChar(c) => self.state.seed_input.push(c),
            Action::Backspace => {
                self.state.seed_input.pop();
            }
            Action::CommitSeed => {
                self.state.focus = Focus::List;
                let seed = self.state.seed_input.trim().to_string();
                if seed.is_empty() {
                    self.state.seed_input = self.state.query.seed.clone();
                } else {
                    self.change_query(self.state.query.with_seed(seed), tx);
                }
            }
            Action::CancelSeed => {
                self.state.focus = Focus::List;
                self.state.seed_input = self.state.query.seed.clone();
            }
            Action::Retry => {
                let request = self.pager.retry();
                self.state.list.clear();
                self.state.coordinator.on_reset();
                self.state.lyrics.clear();
                self.state.status = "Reloading...".into();
                self.spawn_page(request, tx);
            }
            Action::ToggleHelp => self.state.show_help = !self.state.show_help,
        }
    }

    fn selected_song(&self) -> Option<&Song> {
        self.pager.items().get(self.state.list.selected)
    }

    fn change_query(&mut self, key: QueryKey, tx: &mpsc::Sender<Event>) {
        if key == self.state.query {
            return;
        }
        tracing::info!(query = %key.label(), "query changed");
        self.state.query = key.clone();
        self.state.seed_input = key.seed.clone();
        self.state.list.clear();
        self.state.coordinator.on_reset();
        self.state.lyrics.clear();
        self.state.status = format!("Loading {}", key.label());
        // Reset before the fetch is issued so nothing from the old key lands.
        let request = self.pager.reset(key);
        self.spawn_page(request, tx);
    }

    fn maybe_load_more(&mut self, tx: &mpsc::Sender<Event>) {
        if !self.state.list.sentinel_visible(self.pager.items().len()) {
            return;
        }
        if let Some(request) = self.pager.on_sentinel_visible() {
            self.state.status = format!("Loading page {}...", request.page);
            self.spawn_page(request, tx);
        }
    }

    fn request_preview(&mut self, song: &Song, tx: &mpsc::Sender<Event>) {
        let Some(player) = &mut self.player else {
            return;
        };
        if let Some(ticket) = player.request(&song.cover_seed) {
            self.state.now_playing = Some(format!("{} - {}", song.title, song.artist));
            self.spawn_preview(ticket, tx);
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.state.volume = volume;
        if let Some(player) = &self.player {
            player.output().set_volume(volume);
        }
    }

    fn spawn_page(&self, request: PageRequest, tx: &mpsc::Sender<Event>) {
        let catalog = self.catalog.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = catalog
                .fetch_page(&request.key, request.page, request.per_page)
                .await;
            let _ = tx
                .send(Event::Network(NetworkEvent::PageLoaded { request, result }))
                .await;
        });
    }

    fn spawn_preview(&self, ticket: FetchTicket, tx: &mpsc::Sender<Event>) {
        let catalog = self.catalog.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = catalog.fetch_preview(&ticket.key).await;
            let _ = tx
                .send(Event::Network(NetworkEvent::PreviewLoaded { ticket, result }))
                .await;
        });
    }

    fn handle_network(&mut self, ne: NetworkEvent) {
        match ne {
            NetworkEvent::PageLoaded { request, result } => {
                match self.pager.apply(&request, result) {
                    PageOutcome::Appended { added } => {
                        self.state.status = format!(
                            "{} songs (+{added}){}",
                            self.pager.items().len(),
                            if self.pager.has_more() { "" } else { ", end of list" }
                        );
                    }
                    PageOutcome::Failed => {
                        self.state.list.clear();
                        self.state.coordinator.on_reset();
                        self.state.lyrics.clear();
                        let msg = self.pager.last_error().unwrap_or("load failed").to_string();
                        self.state.toast = Some(Toast::error(msg));
                        self.state.status = "Failed to load data (press r to retry)".into();
                    }
                    PageOutcome::Stale => {}
                }
            }
            NetworkEvent::PreviewLoaded { ticket, result } => {
                if let Some(player) = &mut self.player
                    && player.on_fetch_complete(&ticket, result) == Completion::Stale
                {
                    tracing::debug!(key = %ticket.key, "preview superseded");
                }
            }
        }
    }

    /// Pull the latest playback snapshot and move the lyrics clock.
    fn refresh_playback(&mut self) {
        if let Some(rx) = &mut self.playback_rx
            && rx.has_changed().unwrap_or(false)
        {
            let snapshot = rx.borrow_and_update().clone();
            if snapshot.status == PlaybackStatus::Error
                && self.state.playback.status != PlaybackStatus::Error
            {
                let msg = snapshot.error.clone().unwrap_or_else(|| "playback failed".into());
                self.state.toast = Some(Toast::error(msg));
            }
            if snapshot.active_key.is_none() {
                self.state.now_playing = None;
            }
            self.state.playback = snapshot;
        }
        self.sync_lyrics();
    }

    /// Point the lyrics view at the expanded song and advance its clock.
    fn sync_lyrics(&mut self) {
        let expanded = self.state.coordinator.expanded();
        let song = expanded.and_then(|id| self.pager.items().iter().find(|s| s.id == id));
        let lyrics = &mut self.state.lyrics;
        let Some(song) = song.filter(|s| !s.lyrics_raw.trim().is_empty()) else {
            lyrics.clear();
            return;
        };
        let clock = playback_clock(&self.state.playback, &song.cover_seed);
        lyrics.set_source(song.id, &song.lyrics_raw);
        lyrics.tick(clock.unwrap_or(f64::NEG_INFINITY));
    }
}

/// Playback position of `cover_seed`, if its audio is the one loaded.
fn playback_clock(playback: &PlaybackState, cover_seed: &str) -> Option<f64> {
    match playback.status {
        PlaybackStatus::Playing | PlaybackStatus::Paused if playback.is_active(cover_seed) => {
            Some(playback.elapsed_seconds)
        }
        _ => None,
    }
}
