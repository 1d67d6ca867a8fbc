//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Key
//! behavior depends on which panel has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Handles a keyboard event and updates the app state accordingly.
///
/// Returns `true` if the application should quit, `false` otherwise.
///
/// # Event Handling
///
/// - `Ctrl+C`: Quit application (from any focus state)
/// - `Ctrl+L`: Clear the conversation
/// - `F2`: Switch assistant mode
/// - `Tab` / `Shift+Tab`: Cycle focus between panels
/// - `Esc`: Return to the message input
/// - When `Input` focused: typing edits the draft, Enter sends it
/// - When `Transcript` focused: j/k scroll
/// - When `Samples` focused: j/k move, Enter sends the question
///
/// # Examples
///
/// ```
/// use realtor::tui::{App, event::handle_key_event};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert!(handle_key_event(&mut app, key));
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return true,
            KeyCode::Char('l') => {
                app.clear_conversation();
                return false;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::F(2) => {
            app.cycle_mode();
            return false;
        }
        KeyCode::Tab => {
            app.next_focus();
            return false;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return false;
        }
        KeyCode::Esc => {
            app.reset_focus();
            return false;
        }
        _ => {}
    }

    match app.focus() {
        Focus::Input => handle_input(app, key),
        Focus::Transcript => handle_transcript(app, key),
        Focus::Samples => handle_samples(app, key),
    }

    false
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_input_char(c);
        }
        KeyCode::Backspace => app.pop_input_char(),
        KeyCode::Enter => app.submit_input(),
        _ => {}
    }
}

fn handle_transcript(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.scroll_transcript_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_transcript_up(1),
        KeyCode::PageDown => app.scroll_transcript_down(10),
        KeyCode::PageUp => app.scroll_transcript_up(10),
        _ => {}
    }
}

fn handle_samples(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.select_next_sample(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous_sample(),
        KeyCode::Enter => app.submit_sample(),
        _ => {}
    }
}
