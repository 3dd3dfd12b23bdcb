//! Backup and restore: a workspace subtree serializes to nested JSON and
//! imports back, either preserving node identity or minting fresh ids.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::model::{ParentRef, Todo, TodoId, Workspace, WorkspaceId};
use crate::ops::order_ops::OpsError;
use crate::store::{self, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspacePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub todos: Vec<TodoPayload>,
    #[serde(default)]
    pub workspaces: Vec<WorkspacePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDateTime>,
    #[serde(default)]
    pub effort: u32,
    #[serde(default)]
    pub urgency: u32,
    #[serde(default = "default_pending")]
    pub pending: bool,
    /// Sub-tasks
    #[serde(default)]
    pub todos: Vec<TodoPayload>,
}

fn default_pending() -> bool {
    true
}

/// A bare JSON array at any level is shorthand for a flat batch of todos
/// under the current parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportPayload {
    Workspace(Box<WorkspacePayload>),
    Todos(Vec<TodoPayload>),
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Recursive export of a workspace subtree in `order_index` order
pub fn export_workspace(store: &Store, id: WorkspaceId) -> Result<WorkspacePayload, OpsError> {
    let ws = store.get_workspace(id)?.ok_or(OpsError::NotFound)?;
    let todos = store
        .todo_children(ParentRef::Workspace(id))?
        .iter()
        .map(|todo| export_todo(store, todo))
        .collect::<Result<Vec<_>, _>>()?;
    let workspaces = store
        .workspace_children(id)?
        .iter()
        .map(|child| export_workspace(store, child.id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WorkspacePayload {
        id: Some(ws.id.0),
        description: ws.description,
        todos,
        workspaces,
    })
}

fn export_todo(store: &Store, todo: &Todo) -> Result<TodoPayload, OpsError> {
    let subtasks = store
        .todo_children(ParentRef::Todo(todo.id))?
        .iter()
        .map(|sub| export_todo(store, sub))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TodoPayload {
        id: Some(todo.id.0),
        description: todo.description.clone(),
        due: todo.due,
        effort: todo.effort,
        urgency: todo.urgency,
        pending: todo.pending,
        todos: subtasks,
    })
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Apply a payload to an existing workspace: the payload's description
/// replaces the target's, and its todos/workspaces append as new children
/// (after any existing ones). `preserve_ids` keeps payload ids for the
/// created nodes; otherwise the store assigns fresh ones. The whole import
/// is one transaction.
pub fn import_into_workspace(
    store: &mut Store,
    target: WorkspaceId,
    payload: &ImportPayload,
    preserve_ids: bool,
) -> Result<(), OpsError> {
    let mut ws = store.get_workspace(target)?.ok_or(OpsError::NotFound)?;
    let tx = store.transaction()?;
    match payload {
        ImportPayload::Workspace(data) => {
            ws.description = data.description.clone();
            store::update_workspace_row(&tx, &ws)?;
            for todo in &data.todos {
                append_todo(&tx, ParentRef::Workspace(target), todo, preserve_ids)?;
            }
            for child in &data.workspaces {
                append_workspace(&tx, target, child, preserve_ids)?;
            }
        }
        ImportPayload::Todos(batch) => {
            for todo in batch {
                append_todo(&tx, ParentRef::Workspace(target), todo, preserve_ids)?;
            }
        }
    }
    tx.commit().map_err(store::StoreError::from)?;
    Ok(())
}

fn append_workspace(
    conn: &Connection,
    parent: WorkspaceId,
    payload: &WorkspacePayload,
    preserve_ids: bool,
) -> Result<WorkspaceId, OpsError> {
    let order_index = store::query_workspace_children(conn, parent)?.len() as i64;
    let ws = Workspace {
        id: WorkspaceId(payload.id.unwrap_or_default()),
        parent: Some(parent),
        order_index,
        description: payload.description.clone(),
    };
    let id = store::insert_workspace_row(conn, &ws, preserve_ids && payload.id.is_some())?;
    for todo in &payload.todos {
        append_todo(conn, ParentRef::Workspace(id), todo, preserve_ids)?;
    }
    for child in &payload.workspaces {
        append_workspace(conn, id, child, preserve_ids)?;
    }
    Ok(id)
}

fn append_todo(
    conn: &Connection,
    parent: ParentRef,
    payload: &TodoPayload,
    preserve_ids: bool,
) -> Result<TodoId, OpsError> {
    let order_index = store::query_todo_children(conn, parent)?.len() as i64;
    let todo = Todo {
        id: TodoId(payload.id.unwrap_or_default()),
        parent,
        order_index,
        description: payload.description.clone(),
        due: payload.due,
        effort: payload.effort,
        urgency: payload.urgency,
        pending: payload.pending,
    };
    let id = store::insert_todo_row(conn, &todo, preserve_ids && payload.id.is_some())?;
    for sub in &payload.todos {
        append_todo(conn, ParentRef::Todo(id), sub, preserve_ids)?;
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bare_array_parses_as_todo_batch() {
        let payload: ImportPayload =
            serde_json::from_str(r#"[{"description": "one"}, {"description": "two"}]"#).unwrap();
        match payload {
            ImportPayload::Todos(batch) => {
                assert_eq!(batch.len(), 2);
                assert!(batch[0].pending);
                assert!(batch[0].id.is_none());
            }
            other => panic!("expected todo batch, got {other:?}"),
        }
    }

    #[test]
    fn object_parses_as_workspace_payload() {
        let payload: ImportPayload = serde_json::from_str(
            r#"{"description": "home", "todos": [{"description": "water plants"}]}"#,
        )
        .unwrap();
        match payload {
            ImportPayload::Workspace(ws) => {
                assert_eq!(ws.description, "home");
                assert_eq!(ws.todos.len(), 1);
                assert!(ws.workspaces.is_empty());
            }
            other => panic!("expected workspace, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let todo: TodoPayload = serde_json::from_str(r#"{"description": "x"}"#).unwrap();
        assert_eq!(todo.effort, 0);
        assert_eq!(todo.urgency, 0);
        assert!(todo.pending);
        assert!(todo.due.is_none());
        assert!(todo.todos.is_empty());
    }
}
