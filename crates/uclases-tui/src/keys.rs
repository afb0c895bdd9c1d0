use crossterm::event::{KeyCode, KeyModifiers};

use crate::app::App;

pub fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('u') => app.clear(),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Down => app.move_down(),
        KeyCode::Up => app.move_up(),
        KeyCode::Enter => app.activate(),
        KeyCode::Esc => app.escape(),
        _ => {}
    }
}
