use crate::catalog::SongPage;
use crate::error::CatalogError;
use crate::pagination::PageRequest;
use crate::player::{FetchTicket, OutputSignal};

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Output(OutputSignal),
    Network(NetworkEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

/// Completion of a spawned fetch, tagged with the request it answers.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    PageLoaded {
        request: PageRequest,
        result: Result<SongPage, CatalogError>,
    },
    PreviewLoaded {
        ticket: FetchTicket,
        result: Result<Vec<u8>, CatalogError>,
    },
}
