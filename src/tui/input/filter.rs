use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};

/// Live filter entry: every keystroke re-filters the focused pane. Enter
/// returns to Navigate keeping the filter applied; Esc drops it.
pub(super) fn handle_filter(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        (_, KeyCode::Enter) => {
            app.mode = Mode::Navigate;
        }
        (_, KeyCode::Esc) => {
            app.filter.clear();
            app.mode = Mode::Navigate;
            app.refresh();
        }
        (_, KeyCode::Backspace) => {
            app.filter.pop();
            app.refresh();
        }
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            app.filter.push(c);
            app.refresh();
        }
        _ => {}
    }
}
