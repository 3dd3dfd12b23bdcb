use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{NodeId, ParentRef};
use crate::ops::order_ops::{self, OpsError};

use crate::tui::app::{App, ConfirmAction, ConfirmState, EditField, Mode, Pane};

use super::edit::start_edit;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Clear any transient status message on keypress
    if !matches!(key.code, KeyCode::Esc) {
        app.status = None;
    }

    match (key.modifiers, key.code) {
        (KeyModifiers::NONE, KeyCode::Char('q')) => {
            app.should_quit = true;
        }
        (KeyModifiers::NONE, KeyCode::Char('j')) | (_, KeyCode::Down) => {
            app.focused_state_mut().move_highlight(1);
            app.refresh();
        }
        (KeyModifiers::NONE, KeyCode::Char('k')) | (_, KeyCode::Up) => {
            app.focused_state_mut().move_highlight(-1);
            app.refresh();
        }
        (_, KeyCode::Tab) | (_, KeyCode::BackTab) => {
            switch_pane(app);
        }
        (KeyModifiers::NONE, KeyCode::Char('l')) | (_, KeyCode::Right) => {
            if app.pane == Pane::Workspaces {
                switch_pane(app);
            }
        }
        (KeyModifiers::NONE, KeyCode::Char('z')) | (_, KeyCode::Enter) => {
            toggle_expand(app);
        }
        (KeyModifiers::NONE, KeyCode::Char('h')) | (_, KeyCode::Left) => {
            collapse_or_parent(app);
        }
        (KeyModifiers::SHIFT, KeyCode::Char('J')) => {
            shift_highlighted(app, order_ops::shift_down);
        }
        (KeyModifiers::SHIFT, KeyCode::Char('K')) => {
            shift_highlighted(app, order_ops::shift_up);
        }
        (KeyModifiers::NONE, KeyCode::Char('a')) => {
            add_sibling(app);
        }
        (KeyModifiers::SHIFT, KeyCode::Char('A')) => {
            add_child(app);
        }
        (KeyModifiers::NONE, KeyCode::Char('i')) => {
            edit_highlighted(app, EditField::Description);
        }
        (KeyModifiers::NONE, KeyCode::Char('d')) => {
            edit_highlighted(app, EditField::Due);
        }
        (KeyModifiers::NONE, KeyCode::Char('e')) => {
            edit_highlighted(app, EditField::Effort);
        }
        (KeyModifiers::NONE, KeyCode::Char('u')) => {
            edit_highlighted(app, EditField::Urgency);
        }
        (KeyModifiers::NONE, KeyCode::Char('c')) => {
            toggle_complete(app);
        }
        (KeyModifiers::NONE, KeyCode::Char('x')) => {
            request_delete(app);
        }
        (KeyModifiers::NONE, KeyCode::Char('/')) => {
            app.filter.clear();
            app.mode = Mode::Filter;
            app.refresh();
        }
        (_, KeyCode::Esc) => {
            // Esc clears a lingering filter, else the status row
            if !app.filter.is_empty() {
                app.filter.clear();
                app.refresh();
            } else {
                app.status = None;
            }
        }
        _ => {}
    }
}

fn switch_pane(app: &mut App) {
    // A filter belongs to the pane it was typed in
    app.filter.clear();
    app.pane = match app.pane {
        Pane::Workspaces => Pane::Todos,
        Pane::Todos => Pane::Workspaces,
    };
    app.refresh();
}

fn toggle_expand(app: &mut App) {
    let state = app.focused_state_mut();
    let Some(row) = state.current_row() else {
        return;
    };
    if !row.has_children {
        return;
    }
    let id = row.data.id();
    if !state.expanded.remove(&id) {
        state.expanded.insert(id);
    }
    app.refresh();
}

/// Collapse the highlighted node if it is open, else jump to its parent
fn collapse_or_parent(app: &mut App) {
    let state = app.focused_state_mut();
    let Some(index) = state.highlight_index() else {
        return;
    };
    let row = &state.rows[index];
    let id = row.data.id();
    if row.is_expanded {
        state.expanded.remove(&id);
        app.refresh();
        return;
    }
    if row.depth == 0 {
        return;
    }
    let depth = row.depth;
    let parent = state.rows[..index]
        .iter()
        .rev()
        .find(|r| r.depth < depth)
        .map(|r| r.data.id());
    if let Some(parent) = parent {
        state.highlight_id(parent);
    }
}

fn shift_highlighted(app: &mut App, op: fn(&mut crate::store::Store, NodeId) -> Result<bool, OpsError>) {
    let Some(id) = app.focused_state().highlighted else {
        return;
    };
    match op(&mut app.store, id) {
        Ok(true) => app.refresh(),
        // Already at the edge of its sibling group
        Ok(false) => {}
        Err(e) => app.report_error(&e),
    }
}

/// Add a node after the highlighted one (or at the end of the pane root's
/// children when nothing is highlighted) and start editing its description.
fn add_sibling(app: &mut App) {
    let highlighted = app.focused_state().highlighted;
    let result = match app.pane {
        Pane::Workspaces => {
            let (parent, at) = match highlighted {
                Some(NodeId::Workspace(id)) => match app.store.get_workspace(id) {
                    Ok(Some(ws)) => (
                        ws.parent.unwrap_or(app.root),
                        Some(ws.order_index as usize + 1),
                    ),
                    Ok(None) => (app.root, None),
                    Err(e) => {
                        app.report_error(&e);
                        return;
                    }
                },
                _ => (app.root, None),
            };
            order_ops::add_workspace(&mut app.store, parent, at).map(|ws| ws.node_id())
        }
        Pane::Todos => {
            let Some(root) = app.todos_root else {
                app.info("select a workspace first");
                return;
            };
            let (parent, at) = match highlighted {
                Some(NodeId::Todo(id)) => match app.store.get_todo(id) {
                    Ok(Some(todo)) => (todo.parent, Some(todo.order_index as usize + 1)),
                    Ok(None) => (ParentRef::Workspace(root), None),
                    Err(e) => {
                        app.report_error(&e);
                        return;
                    }
                },
                _ => (ParentRef::Workspace(root), None),
            };
            order_ops::add_todo(&mut app.store, parent, at).map(|todo| todo.node_id())
        }
    };
    match result {
        Ok(id) => {
            app.refresh();
            app.focused_state_mut().highlight_id(id);
            start_edit(app, id, EditField::Description);
        }
        Err(e) => app.report_error(&e),
    }
}

/// Add a child under the highlighted node, expanding it so the new row shows
fn add_child(app: &mut App) {
    let Some(highlighted) = app.focused_state().highlighted else {
        return;
    };
    let result = match (app.pane, highlighted) {
        (Pane::Workspaces, NodeId::Workspace(id)) => {
            order_ops::add_workspace(&mut app.store, id, None).map(|ws| ws.node_id())
        }
        (Pane::Todos, NodeId::Todo(id)) => {
            order_ops::add_todo(&mut app.store, ParentRef::Todo(id), None).map(|todo| todo.node_id())
        }
        _ => return,
    };
    match result {
        Ok(id) => {
            app.focused_state_mut().expanded.insert(highlighted);
            app.refresh();
            app.focused_state_mut().highlight_id(id);
            start_edit(app, id, EditField::Description);
        }
        Err(e) => app.report_error(&e),
    }
}

fn edit_highlighted(app: &mut App, field: EditField) {
    let Some(id) = app.focused_state().highlighted else {
        return;
    };
    // Only todos carry scheduling fields
    if field != EditField::Description && !matches!(id, NodeId::Todo(_)) {
        return;
    }
    start_edit(app, id, field);
}

fn toggle_complete(app: &mut App) {
    let Some(NodeId::Todo(id)) = app.focused_state().highlighted else {
        return;
    };
    let result = (|| -> Result<bool, OpsError> {
        let mut todo = app.store.get_todo(id)?.ok_or(OpsError::NotFound)?;
        todo.toggle_complete();
        app.store.update_todo(&todo)?;
        Ok(todo.pending)
    })();
    match result {
        Ok(pending) => {
            app.refresh();
            app.info(if pending { "reopened" } else { "completed" });
        }
        Err(e) => app.report_error(&e),
    }
}

fn request_delete(app: &mut App) {
    let Some(row) = app.focused_state().current_row() else {
        return;
    };
    let id = row.data.id();
    let what = match id {
        NodeId::Workspace(_) => "workspace",
        NodeId::Todo(_) => "todo",
    };
    let description = row.data.description().to_string();
    app.confirm = Some(ConfirmState {
        message: format!("delete {} \"{}\" and everything under it? (y/n)", what, description),
        action: ConfirmAction::DeleteNode(id),
    });
    app.mode = Mode::Confirm;
}
