//! Single-flight preview playback.
//!
//! `PlaybackController` owns the one audio resource the process may hold. It
//! does no I/O of its own: `request` hands back a [`FetchTicket`] that the
//! caller resolves with the catalog client, and the audio backend reports
//! back through [`OutputSignal`]s tagged with the resource they belong to.
//! Completions for anything but the newest ticket or the held resource are
//! dropped, so the most recent request always wins.

pub mod mpv;

use crate::error::{CatalogError, PlaybackError};
use tokio::sync::watch;

/// Identifies one acquired output resource.
pub type ResourceId = u64;

/// Backend that actually produces sound.
///
/// The controller guarantees `release` is called exactly once for every
/// successful `acquire`, and that at most one resource is held at a time.
pub trait AudioOutput {
    /// Take ownership of `audio` as resource `id` and start playing it.
    fn acquire(&mut self, id: ResourceId, key: &str, audio: Vec<u8>) -> Result<(), PlaybackError>;
    fn pause(&mut self, id: ResourceId);
    fn resume(&mut self, id: ResourceId);
    /// Stop output and free everything tied to `id`.
    fn release(&mut self, id: ResourceId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackState {
    /// Cover seed of the song whose audio is loaded or loading
    pub active_key: Option<String>,
    pub status: PlaybackStatus,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
}

impl PlaybackState {
    pub fn is_active(&self, key: &str) -> bool {
        self.active_key.as_deref() == Some(key)
    }
}

/// Audio fetch the caller must perform for a `request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Started,
    Position(f64),
    Ended,
    Failed(String),
}

/// Event from the audio backend about one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSignal {
    pub resource: ResourceId,
    pub event: OutputEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

pub struct PlaybackController<O: AudioOutput> {
    output: O,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    next_ticket: u64,
    pending: Option<u64>,
    held: Option<ResourceId>,
    next_resource: ResourceId,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(output: O) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::default());
        Self {
            output,
            state: PlaybackState::default(),
            state_tx,
            next_ticket: 0,
            pending: None,
            held: None,
            next_resource: 1,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Stream of state snapshots: every status change and elapsed-time tick.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Play, pause or resume `key`, depending on what is currently active.
    ///
    /// Returns a ticket when the preview bytes have to be fetched.
    pub fn request(&mut self, key: &str) -> Option<FetchTicket> {
        let same = self.state.is_active(key);
        match self.state.status {
            PlaybackStatus::Playing if same => {
                if let Some(id) = self.held {
                    self.output.pause(id);
                }
                self.transition(PlaybackStatus::Paused);
                None
            }
            PlaybackStatus::Paused if same => {
                if let Some(id) = self.held {
                    self.output.resume(id);
                }
                self.transition(PlaybackStatus::Playing);
                None
            }
            PlaybackStatus::Loading if same => None,
            _ => {
                self.release_held();
                self.next_ticket += 1;
                self.pending = Some(self.next_ticket);
                self.state = PlaybackState {
                    active_key: Some(key.to_string()),
                    status: PlaybackStatus::Loading,
                    elapsed_seconds: 0.0,
                    error: None,
                };
                self.publish();
                tracing::debug!(key, ticket = self.next_ticket, "preview requested");
                Some(FetchTicket {
                    id: self.next_ticket,
                    key: key.to_string(),
                })
            }
        }
    }

    /// Apply the result of the fetch issued for `ticket`.
    pub fn on_fetch_complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<u8>, CatalogError>,
    ) -> Completion {
        if self.pending != Some(ticket.id) {
            tracing::debug!(key = %ticket.key, ticket = ticket.id, "discarding stale preview fetch");
            return Completion::Stale;
        }
        self.pending = None;

        let audio = match result {
            Ok(audio) => audio,
            Err(e) => {
                self.fail(PlaybackError::Fetch(e));
                return Completion::Applied;
            }
        };

        self.release_held();
        let id = self.next_resource;
        self.next_resource += 1;
        match self.output.acquire(id, &ticket.key, audio) {
            Ok(()) => {
                tracing::debug!(key = %ticket.key, resource = id, "output acquired");
                self.held = Some(id);
            }
            Err(e) => self.fail(e),
        }
        Completion::Applied
    }

    /// Apply an event reported by the audio backend.
    pub fn on_output(&mut self, signal: OutputSignal) -> Completion {
        if self.held != Some(signal.resource) {
            return Completion::Stale;
        }
        match signal.event {
            OutputEvent::Started => {
                if self.state.status == PlaybackStatus::Loading {
                    self.transition(PlaybackStatus::Playing);
                }
            }
            OutputEvent::Position(seconds) => {
                if self.state.status == PlaybackStatus::Playing {
                    self.state.elapsed_seconds = seconds.max(0.0);
                    self.publish();
                }
            }
            OutputEvent::Ended => {
                tracing::debug!(key = ?self.state.active_key, "preview finished");
                self.release_held();
                self.state = PlaybackState::default();
                self.publish();
            }
            OutputEvent::Failed(msg) => self.fail(PlaybackError::Output(msg)),
        }
        Completion::Applied
    }

    /// Release whatever is held and return to idle.
    pub fn stop(&mut self) {
        self.pending = None;
        self.release_held();
        if self.state != PlaybackState::default() {
            self.state = PlaybackState::default();
            self.publish();
        }
    }

    fn fail(&mut self, error: PlaybackError) {
        tracing::warn!(key = ?self.state.active_key, %error, "playback failed");
        self.release_held();
        self.state.status = PlaybackStatus::Error;
        self.state.elapsed_seconds = 0.0;
        self.state.error = Some(error.to_string());
        self.publish();
    }

    fn release_held(&mut self) {
        if let Some(id) = self.held.take() {
            tracing::debug!(resource = id, "output released");
            self.output.release(id);
        }
    }

    fn transition(&mut self, status: PlaybackStatus) {
        tracing::debug!(key = ?self.state.active_key, from = ?self.state.status, to = ?status, "playback transition");
        self.state.status = status;
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

impl<O: AudioOutput> Drop for PlaybackController<O> {
    fn drop(&mut self) {
        self.release_held();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FakeOutput {
        acquired: Vec<(ResourceId, String)>,
        released: Vec<ResourceId>,
        paused: Vec<ResourceId>,
        resumed: Vec<ResourceId>,
        reject: bool,
    }

    impl FakeOutput {
        fn held(&self) -> usize {
            self.acquired.len() - self.released.len()
        }
    }

    impl AudioOutput for FakeOutput {
        fn acquire(&mut self, id: ResourceId, key: &str, _audio: Vec<u8>) -> Result<(), PlaybackError> {
            if self.reject {
                return Err(PlaybackError::Output("device busy".into()));
            }
            self.acquired.push((id, key.to_string()));
            Ok(())
        }
        fn pause(&mut self, id: ResourceId) {
            self.paused.push(id);
        }
        fn resume(&mut self, id: ResourceId) {
            self.resumed.push(id);
        }
        fn release(&mut self, id: ResourceId) {
            assert!(!self.released.contains(&id), "double release of {id}");
            self.released.push(id);
        }
    }

    fn start(c: &mut PlaybackController<FakeOutput>, key: &str) -> ResourceId {
        let ticket = c.request(key).unwrap();
        assert_eq!(c.on_fetch_complete(&ticket, Ok(vec![1, 2, 3])), Completion::Applied);
        let id = c.output().acquired.last().unwrap().0;
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Started });
        id
    }

    #[test]
    fn test_play_pause_resume_scenario() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket = c.request("seedA").unwrap();
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        assert_eq!(c.state().active_key.as_deref(), Some("seedA"));

        c.on_fetch_complete(&ticket, Ok(vec![0; 4]));
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        let id = c.output().acquired[0].0;
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Started });
        assert_eq!(c.state().status, PlaybackStatus::Playing);

        assert!(c.request("seedA").is_none());
        assert_eq!(c.state().status, PlaybackStatus::Paused);
        assert_eq!(c.output().paused, vec![id]);

        assert!(c.request("seedA").is_none());
        assert_eq!(c.state().status, PlaybackStatus::Playing);
        assert_eq!(c.output().resumed, vec![id]);
        assert_eq!(c.output().acquired.len(), 1);
    }

    #[test]
    fn test_newer_request_wins_over_stale_fetch() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket_a = c.request("A").unwrap();
        let ticket_b = c.request("B").unwrap();

        assert_eq!(c.on_fetch_complete(&ticket_b, Ok(vec![2])), Completion::Applied);
        assert_eq!(c.on_fetch_complete(&ticket_a, Ok(vec![1])), Completion::Stale);

        assert_eq!(c.output().held(), 1);
        assert_eq!(c.output().acquired[0].1, "B");
        assert_eq!(c.state().active_key.as_deref(), Some("B"));
    }

    #[test]
    fn test_stale_fetch_arriving_first_is_ignored() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket_a = c.request("A").unwrap();
        let ticket_b = c.request("B").unwrap();
        assert_eq!(c.on_fetch_complete(&ticket_a, Ok(vec![1])), Completion::Stale);
        assert!(c.output().acquired.is_empty());
        assert_eq!(c.state().status, PlaybackStatus::Loading);

        c.on_fetch_complete(&ticket_b, Ok(vec![2]));
        assert_eq!(c.output().held(), 1);
    }

    #[test]
    fn test_switching_keys_releases_previous_resource() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let a = start(&mut c, "A");
        let b = start(&mut c, "B");
        assert_ne!(a, b);
        assert_eq!(c.output().released, vec![a]);
        assert_eq!(c.output().held(), 1);
        assert_eq!(c.state().status, PlaybackStatus::Playing);

        start(&mut c, "C");
        start(&mut c, "A");
        assert_eq!(c.output().acquired.len(), 4);
        assert_eq!(c.output().released.len(), 3);
    }

    #[test]
    fn test_switching_from_paused_releases_previous_resource() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let a = start(&mut c, "A");
        assert!(c.request("A").is_none());
        assert_eq!(c.state().status, PlaybackStatus::Paused);

        let ticket = c.request("B").unwrap();
        assert_eq!(c.output().released, vec![a]);
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        assert_eq!(c.state().active_key.as_deref(), Some("B"));

        c.on_fetch_complete(&ticket, Ok(vec![2]));
        assert_eq!(c.output().released, vec![a]);
        assert_eq!(c.output().held(), 1);
        assert_eq!(c.output().acquired[1].1, "B");
    }

    #[test]
    fn test_switching_from_error_starts_clean_load() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let a = start(&mut c, "A");
        c.on_output(OutputSignal { resource: a, event: OutputEvent::Failed("gone".into()) });
        assert_eq!(c.state().status, PlaybackStatus::Error);

        let ticket = c.request("B").unwrap();
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        assert!(c.state().error.is_none());

        c.on_fetch_complete(&ticket, Ok(vec![2]));
        assert_eq!(c.output().released, vec![a]);
        assert_eq!(c.output().held(), 1);
        assert_eq!(c.state().active_key.as_deref(), Some("B"));
    }

    #[test]
    fn test_request_while_loading_same_key_is_noop() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket = c.request("A").unwrap();
        assert!(c.request("A").is_none());
        c.on_fetch_complete(&ticket, Ok(vec![1]));
        assert_eq!(c.output().held(), 1);
    }

    #[test]
    fn test_fetch_failure_is_scoped_to_key() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket = c.request("A").unwrap();
        c.on_fetch_complete(&ticket, Err(CatalogError::Status(404)));
        assert_eq!(c.state().status, PlaybackStatus::Error);
        assert_eq!(c.state().active_key.as_deref(), Some("A"));
        assert!(c.state().error.as_deref().unwrap().contains("404"));
        assert_eq!(c.output().held(), 0);

        assert!(c.request("A").is_some());
        assert_eq!(c.state().status, PlaybackStatus::Loading);
        assert!(c.state().error.is_none());
    }

    #[test]
    fn test_output_rejection_leaves_nothing_held() {
        let mut c = PlaybackController::new(FakeOutput { reject: true, ..Default::default() });
        let ticket = c.request("A").unwrap();
        c.on_fetch_complete(&ticket, Ok(vec![1]));
        assert_eq!(c.state().status, PlaybackStatus::Error);
        assert!(c.output().acquired.is_empty());
        assert!(c.output().released.is_empty());
    }

    #[test]
    fn test_output_failure_releases_resource() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let id = start(&mut c, "A");
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Failed("underrun".into()) });
        assert_eq!(c.state().status, PlaybackStatus::Error);
        assert_eq!(c.output().released, vec![id]);
    }

    #[test]
    fn test_natural_end_returns_to_idle() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let id = start(&mut c, "A");
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Position(12.0) });
        assert_eq!(c.state().elapsed_seconds, 12.0);

        c.on_output(OutputSignal { resource: id, event: OutputEvent::Ended });
        assert_eq!(*c.state(), PlaybackState::default());
        assert_eq!(c.output().held(), 0);

        // Late events for the released resource change nothing.
        assert_eq!(
            c.on_output(OutputSignal { resource: id, event: OutputEvent::Ended }),
            Completion::Stale
        );
        assert_eq!(c.output().released, vec![id]);
    }

    #[test]
    fn test_elapsed_only_advances_while_playing() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let ticket = c.request("A").unwrap();
        c.on_fetch_complete(&ticket, Ok(vec![1]));
        let id = c.output().acquired[0].0;

        c.on_output(OutputSignal { resource: id, event: OutputEvent::Position(3.0) });
        assert_eq!(c.state().elapsed_seconds, 0.0);

        c.on_output(OutputSignal { resource: id, event: OutputEvent::Started });
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Position(4.5) });
        c.request("A");
        c.on_output(OutputSignal { resource: id, event: OutputEvent::Position(9.0) });
        assert_eq!(c.state().status, PlaybackStatus::Paused);
        assert_eq!(c.state().elapsed_seconds, 4.5);

        c.request("B");
        assert_eq!(c.state().elapsed_seconds, 0.0);
    }

    #[test]
    fn test_events_from_previous_resource_are_ignored() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let a = start(&mut c, "A");
        let ticket = c.request("B").unwrap();
        c.on_fetch_complete(&ticket, Ok(vec![2]));

        assert_eq!(
            c.on_output(OutputSignal { resource: a, event: OutputEvent::Started }),
            Completion::Stale
        );
        assert_eq!(c.state().status, PlaybackStatus::Loading);
    }

    #[test]
    fn test_subscribers_see_transitions() {
        let mut c = PlaybackController::new(FakeOutput::default());
        let rx = c.subscribe();
        c.request("A");
        assert_eq!(rx.borrow().status, PlaybackStatus::Loading);
        c.stop();
        assert_eq!(rx.borrow().status, PlaybackStatus::Idle);
    }

    #[test]
    fn test_stop_and_drop_release_everything() {
        let mut c = PlaybackController::new(FakeOutput::default());
        start(&mut c, "A");
        c.stop();
        assert_eq!(c.output().held(), 0);
        assert_eq!(c.state().status, PlaybackStatus::Idle);

        let pending = c.request("B").unwrap();
        c.stop();
        assert_eq!(c.on_fetch_complete(&pending, Ok(vec![1])), Completion::Stale);
        assert_eq!(c.output().held(), 0);
    }
}
