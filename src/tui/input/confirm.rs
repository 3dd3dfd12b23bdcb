use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::ops::order_ops;

use crate::tui::app::{App, ConfirmAction, Mode};

/// Only a bare 'y' runs the pending action; every other key cancels it
pub(super) fn handle_confirm(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }
    let state = app.confirm.take();
    app.mode = Mode::Navigate;

    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Char('y')) => {
            if let Some(state) = state {
                match state.action {
                    ConfirmAction::DeleteNode(id) => {
                        match order_ops::drop_node(&mut app.store, id) {
                            Ok(()) => {
                                app.refresh();
                                app.info("deleted");
                            }
                            Err(e) => app.report_error(&e),
                        }
                    }
                }
            }
        }
        _ => {
            app.info("kept");
        }
    }
}
