//! Conversion from crossterm events to [`AppAction`]s.
//!
//! ```text
//! crossterm::Event ──► event_to_action(focus) ──► AppAction ──► App::handle_action
//! ```
//!
//! Global bindings use Ctrl combinations so they never collide with text
//! typed into the host field or the editor. A bare `q` quits only while the
//! button has focus.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tui_input::InputRequest;

use super::Focus;
use super::editor::EditorAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    Submit,
    /// Cancel the in-flight request.
    Cancel,
    FocusNext,
    FocusPrev,
    Host(InputRequest),
    Editor(EditorAction),
}

/// Convert a crossterm event to an action for the focused widget.
///
/// Returns `None` for events with no binding (key releases, mouse, resize).
#[must_use]
pub fn event_to_action(event: &Event, focus: Focus) -> Option<AppAction> {
    match event {
        Event::Key(key) => key_event_to_action(key, focus),
        _ => None,
    }
}

pub fn key_event_to_action(key: &KeyEvent, focus: Focus) -> Option<AppAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q' | 'c') if ctrl => return Some(AppAction::Quit),
        KeyCode::Char('s') if ctrl => return Some(AppAction::Submit),
        KeyCode::Esc => return Some(AppAction::Cancel),
        KeyCode::Tab => return Some(AppAction::FocusNext),
        KeyCode::BackTab => return Some(AppAction::FocusPrev),
        _ if ctrl => return None,
        _ => {}
    }

    match focus {
        Focus::Host => host_key(key),
        Focus::Editor => editor_key(key),
        Focus::Button => button_key(key),
    }
}

/// Single-line hostname field. Enter moves on to the editor.
fn host_key(key: &KeyEvent) -> Option<AppAction> {
    let request = match key.code {
        KeyCode::Enter => return Some(AppAction::FocusNext),
        KeyCode::Char(c) => InputRequest::InsertChar(c),
        KeyCode::Backspace => InputRequest::DeletePrevChar,
        KeyCode::Delete => InputRequest::DeleteNextChar,
        KeyCode::Left => InputRequest::GoToPrevChar,
        KeyCode::Right => InputRequest::GoToNextChar,
        KeyCode::Home => InputRequest::GoToStart,
        KeyCode::End => InputRequest::GoToEnd,
        _ => return None,
    };
    Some(AppAction::Host(request))
}

fn editor_key(key: &KeyEvent) -> Option<AppAction> {
    let action = match key.code {
        KeyCode::Char(c) => EditorAction::Insert(c),
        KeyCode::Enter => EditorAction::Newline,
        KeyCode::Backspace => EditorAction::Backspace,
        KeyCode::Delete => EditorAction::Delete,
        KeyCode::Left => EditorAction::Left,
        KeyCode::Right => EditorAction::Right,
        KeyCode::Up => EditorAction::Up,
        KeyCode::Down => EditorAction::Down,
        KeyCode::Home => EditorAction::Home,
        KeyCode::End => EditorAction::End,
        _ => return None,
    };
    Some(AppAction::Editor(action))
}

fn button_key(key: &KeyEvent) -> Option<AppAction> {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') => Some(AppAction::Submit),
        KeyCode::Char('q') => Some(AppAction::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn make_key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn make_key_ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn test_ctrl_q_quits_from_any_focus() {
        for focus in [Focus::Host, Focus::Editor, Focus::Button] {
            let action = key_event_to_action(&make_key_ctrl(KeyCode::Char('q')), focus);
            assert_eq!(action, Some(AppAction::Quit));
        }
    }

    #[test]
    fn test_plain_q_only_quits_on_button() {
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Char('q')), Focus::Button),
            Some(AppAction::Quit)
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Char('q')), Focus::Editor),
            Some(AppAction::Editor(EditorAction::Insert('q')))
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Char('q')), Focus::Host),
            Some(AppAction::Host(InputRequest::InsertChar('q')))
        );
    }

    #[test]
    fn test_enter_depends_on_focus() {
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Enter), Focus::Button),
            Some(AppAction::Submit)
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Enter), Focus::Editor),
            Some(AppAction::Editor(EditorAction::Newline))
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Enter), Focus::Host),
            Some(AppAction::FocusNext)
        );
    }

    #[test]
    fn test_global_bindings() {
        assert_eq!(
            key_event_to_action(&make_key_ctrl(KeyCode::Char('s')), Focus::Editor),
            Some(AppAction::Submit)
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Esc), Focus::Editor),
            Some(AppAction::Cancel)
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::Tab), Focus::Host),
            Some(AppAction::FocusNext)
        );
        assert_eq!(
            key_event_to_action(&make_key(KeyCode::BackTab), Focus::Host),
            Some(AppAction::FocusPrev)
        );
    }

    #[test]
    fn test_unbound_ctrl_keys_are_ignored() {
        assert_eq!(
            key_event_to_action(&make_key_ctrl(KeyCode::Char('x')), Focus::Editor),
            None
        );
    }

    #[test]
    fn test_key_release_ignored() {
        let key = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(key_event_to_action(&key, Focus::Editor), None);
    }

    #[test]
    fn test_resize_has_no_action() {
        assert_eq!(event_to_action(&Event::Resize(80, 24), Focus::Host), None);
    }
}
