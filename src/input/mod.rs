use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Focus};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>, mouse_enabled: bool) {
    tokio::task::spawn_blocking(move || {
        loop {
            if !event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                if tx.is_closed() {
                    break;
                }
                continue;
            }
            let ev = match event::read() {
                Ok(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => InputEvent::Key(k),
                Ok(CtEvent::Mouse(m)) if mouse_enabled => InputEvent::Mouse(m),
                Ok(CtEvent::Resize(_, _)) => InputEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "read terminal event");
                    continue;
                }
            };
            if tx.blocking_send(Event::Input(ev)).is_err() {
                break;
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ListUp),
            MouseEventKind::ScrollDown => Some(Action::ListDown),
            _ => None,
        },
        InputEvent::Key(k) => match state.focus {
            Focus::SeedInput => handle_seed_input(k),
            Focus::List => handle_list(state, k),
        },
    }
}

fn handle_seed_input(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Enter => Some(Action::CommitSeed),
        KeyCode::Esc => Some(Action::CancelSeed),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

fn handle_list(state: &AppState, k: KeyEvent) -> Option<Action> {
    if state.show_help {
        return match k.code {
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) => Some(Action::ToggleHelp),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    match k.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('c') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),

        // Navigation - vim style
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::GoTop),
        KeyCode::Char('G') | KeyCode::End => Some(Action::GoBottom),
        KeyCode::Char('d') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageDown),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),

        // Detail panel and playback
        KeyCode::Enter => Some(Action::ToggleExpand),
        KeyCode::Char('p') => Some(Action::PlaySelected),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('s') => Some(Action::Stop),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),

        // Query
        KeyCode::Char('L') => Some(Action::NextLanguage),
        KeyCode::Char('.') | KeyCode::Char('>') => Some(Action::LikesUp),
        KeyCode::Char(',') | KeyCode::Char('<') => Some(Action::LikesDown),
        KeyCode::Char('e') | KeyCode::Char('/') => Some(Action::EditSeed),
        KeyCode::Char('R') => Some(Action::RandomSeed),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Retry),

        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::ToggleHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::QueryKey;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_list_keys() {
        let state = AppState::new(QueryKey::default(), 50);
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char('j'))), Some(Action::ListDown));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Enter)), Some(Action::ToggleExpand));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char('L'))), Some(Action::NextLanguage));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Esc)), Some(Action::Quit));
        let ctrl_d = InputEvent::Key(KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL));
        assert_eq!(map_input_to_action(&state, ctrl_d), Some(Action::PageDown));
    }

    #[test]
    fn test_seed_input_captures_characters() {
        let mut state = AppState::new(QueryKey::default(), 50);
        state.focus = Focus::SeedInput;
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char('q'))), Some(Action::InputChar('q')));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Enter)), Some(Action::CommitSeed));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Esc)), Some(Action::CancelSeed));
    }

    #[test]
    fn test_help_overlay_closes_before_quit() {
        let mut state = AppState::new(QueryKey::default(), 50);
        state.show_help = true;
        assert_eq!(map_input_to_action(&state, key(KeyCode::Esc)), Some(Action::ToggleHelp));
        assert_eq!(map_input_to_action(&state, key(KeyCode::Char('j'))), None);
    }
}
