use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::model::{ParentRef, Todo, TodoId, Workspace, WorkspaceId};

/// Stored timestamp format for `due`
const DUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS workspaces (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id   INTEGER REFERENCES workspaces(id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL DEFAULT -1,
    description TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_workspaces_parent ON workspaces (parent_id);

CREATE TABLE IF NOT EXISTS todos (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_workspace_id INTEGER REFERENCES workspaces(id) ON DELETE CASCADE,
    parent_todo_id      INTEGER REFERENCES todos(id) ON DELETE CASCADE,
    order_index         INTEGER NOT NULL DEFAULT -1,
    description         TEXT NOT NULL DEFAULT '',
    due                 TEXT,
    effort              INTEGER NOT NULL DEFAULT 0,
    urgency             INTEGER NOT NULL DEFAULT 0,
    pending             INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_todos_parent_workspace ON todos (parent_workspace_id);
CREATE INDEX IF NOT EXISTS idx_todos_parent_todo ON todos (parent_todo_id);
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not create database directory {0}: {1}")]
    CreateDir(PathBuf, #[source] std::io::Error),
    /// A todo row with neither a workspace parent nor a todo parent.
    /// Never treated as a root; the touching operation fails.
    #[error("todo {0} has no parent")]
    OrphanTodo(i64),
}

/// Persistence over a single sqlite connection. Every call is durable on
/// return; multi-row mutations go through [`Store::transaction`] so they
/// apply all-or-nothing.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .map_err(|e| StoreError::CreateDir(dir.to_path_buf(), e))?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }

    /// The parentless workspace; created on first use. It anchors the
    /// hierarchy and is never displayed or deleted.
    pub fn root_workspace(&self) -> Result<Workspace, StoreError> {
        let existing = self
            .conn
            .query_row(
                "SELECT id, parent_id, order_index, description
                 FROM workspaces WHERE parent_id IS NULL ORDER BY id LIMIT 1",
                [],
                map_workspace,
            )
            .optional()?;
        if let Some(root) = existing {
            return Ok(root);
        }

        self.conn.execute(
            "INSERT INTO workspaces (parent_id, order_index, description) VALUES (NULL, 0, '')",
            [],
        )?;
        let id = WorkspaceId(self.conn.last_insert_rowid());
        Ok(Workspace {
            id,
            parent: None,
            order_index: 0,
            description: String::new(),
        })
    }

    pub fn get_workspace(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        get_workspace_row(&self.conn, id)
    }

    pub fn get_todo(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        get_todo_row(&self.conn, id)
    }

    /// Child workspaces of `parent`, ordered by `order_index`
    pub fn workspace_children(&self, parent: WorkspaceId) -> Result<Vec<Workspace>, StoreError> {
        query_workspace_children(&self.conn, parent)
    }

    /// Child todos of a workspace or todo, ordered by `order_index`
    pub fn todo_children(&self, parent: ParentRef) -> Result<Vec<Todo>, StoreError> {
        query_todo_children(&self.conn, parent)
    }

    pub fn update_workspace(&self, ws: &Workspace) -> Result<(), StoreError> {
        update_workspace_row(&self.conn, ws)
    }

    pub fn update_todo(&self, todo: &Todo) -> Result<(), StoreError> {
        update_todo_row(&self.conn, todo)
    }
}

// ---------------------------------------------------------------------------
// Row-level primitives. These take a plain `Connection` so the ordering
// service and import can run them inside one open transaction.
// ---------------------------------------------------------------------------

fn map_workspace(row: &rusqlite::Row<'_>) -> rusqlite::Result<Workspace> {
    Ok(Workspace {
        id: WorkspaceId(row.get(0)?),
        parent: row.get::<_, Option<i64>>(1)?.map(WorkspaceId),
        order_index: row.get(2)?,
        description: row.get(3)?,
    })
}

fn map_todo(row: &rusqlite::Row<'_>) -> Result<Todo, StoreError> {
    let id: i64 = row.get(0)?;
    let parent_workspace: Option<i64> = row.get(1)?;
    let parent_todo: Option<i64> = row.get(2)?;
    let parent = match (parent_workspace, parent_todo) {
        (Some(ws), _) => ParentRef::Workspace(WorkspaceId(ws)),
        (None, Some(todo)) => ParentRef::Todo(TodoId(todo)),
        (None, None) => return Err(StoreError::OrphanTodo(id)),
    };
    let due: Option<String> = row.get(4)?;
    Ok(Todo {
        id: TodoId(id),
        parent,
        order_index: row.get(3)?,
        description: row.get(5)?,
        due: due.as_deref().map(parse_due).transpose()?,
        effort: row.get::<_, i64>(6)? as u32,
        urgency: row.get::<_, i64>(7)? as u32,
        pending: row.get(8)?,
    })
}

fn parse_due(raw: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(raw, DUE_FORMAT).map_err(|_| {
        StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("bad due timestamp: {raw}").into(),
        ))
    })
}

fn due_to_sql(due: Option<NaiveDateTime>) -> Option<String> {
    due.map(|d| d.format(DUE_FORMAT).to_string())
}

const TODO_COLUMNS: &str =
    "id, parent_workspace_id, parent_todo_id, order_index, due, description, effort, urgency, pending";

pub(crate) fn get_workspace_row(
    conn: &Connection,
    id: WorkspaceId,
) -> Result<Option<Workspace>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id, parent_id, order_index, description FROM workspaces WHERE id = ?1",
            params![id.0],
            map_workspace,
        )
        .optional()?)
}

pub(crate) fn get_todo_row(conn: &Connection, id: TodoId) -> Result<Option<Todo>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
            params![id.0],
            |row| map_todo(row).map_err(store_to_sql_error),
        )
        .optional()
        .map_err(unwrap_sql_error)?;
    Ok(row)
}

pub(crate) fn query_workspace_children(
    conn: &Connection,
    parent: WorkspaceId,
) -> Result<Vec<Workspace>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, order_index, description
         FROM workspaces WHERE parent_id = ?1 ORDER BY order_index",
    )?;
    let rows = stmt.query_map(params![parent.0], map_workspace)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub(crate) fn query_todo_children(
    conn: &Connection,
    parent: ParentRef,
) -> Result<Vec<Todo>, StoreError> {
    let (clause, id) = match parent {
        ParentRef::Workspace(ws) => ("parent_workspace_id = ?1", ws.0),
        ParentRef::Todo(todo) => ("parent_todo_id = ?1", todo.0),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE {clause} ORDER BY order_index"
    ))?;
    let rows = stmt.query_map(params![id], |row| map_todo(row).map_err(store_to_sql_error))?;
    rows.map(|r| r.map_err(unwrap_sql_error))
        .collect::<Result<Vec<_>, _>>()
}

/// Insert a workspace row. `preserve_id` keeps `ws.id` (import with identity
/// preservation); otherwise the store assigns a fresh rowid.
pub(crate) fn insert_workspace_row(
    conn: &Connection,
    ws: &Workspace,
    preserve_id: bool,
) -> Result<WorkspaceId, StoreError> {
    if preserve_id {
        conn.execute(
            "INSERT INTO workspaces (id, parent_id, order_index, description)
             VALUES (?1, ?2, ?3, ?4)",
            params![ws.id.0, ws.parent.map(|p| p.0), ws.order_index, ws.description],
        )?;
        Ok(ws.id)
    } else {
        conn.execute(
            "INSERT INTO workspaces (parent_id, order_index, description) VALUES (?1, ?2, ?3)",
            params![ws.parent.map(|p| p.0), ws.order_index, ws.description],
        )?;
        Ok(WorkspaceId(conn.last_insert_rowid()))
    }
}

pub(crate) fn insert_todo_row(
    conn: &Connection,
    todo: &Todo,
    preserve_id: bool,
) -> Result<TodoId, StoreError> {
    let (parent_workspace, parent_todo) = match todo.parent {
        ParentRef::Workspace(ws) => (Some(ws.0), None),
        ParentRef::Todo(t) => (None, Some(t.0)),
    };
    if preserve_id {
        conn.execute(
            "INSERT INTO todos
                 (id, parent_workspace_id, parent_todo_id, order_index,
                  due, description, effort, urgency, pending)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                todo.id.0,
                parent_workspace,
                parent_todo,
                todo.order_index,
                due_to_sql(todo.due),
                todo.description,
                todo.effort as i64,
                todo.urgency as i64,
                todo.pending,
            ],
        )?;
        Ok(todo.id)
    } else {
        conn.execute(
            "INSERT INTO todos
                 (parent_workspace_id, parent_todo_id, order_index,
                  due, description, effort, urgency, pending)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                parent_workspace,
                parent_todo,
                todo.order_index,
                due_to_sql(todo.due),
                todo.description,
                todo.effort as i64,
                todo.urgency as i64,
                todo.pending,
            ],
        )?;
        Ok(TodoId(conn.last_insert_rowid()))
    }
}

pub(crate) fn update_workspace_row(conn: &Connection, ws: &Workspace) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE workspaces SET parent_id = ?2, order_index = ?3, description = ?4 WHERE id = ?1",
        params![ws.id.0, ws.parent.map(|p| p.0), ws.order_index, ws.description],
    )?;
    Ok(())
}

pub(crate) fn update_todo_row(conn: &Connection, todo: &Todo) -> Result<(), StoreError> {
    let (parent_workspace, parent_todo) = match todo.parent {
        ParentRef::Workspace(ws) => (Some(ws.0), None),
        ParentRef::Todo(t) => (None, Some(t.0)),
    };
    conn.execute(
        "UPDATE todos SET parent_workspace_id = ?2, parent_todo_id = ?3, order_index = ?4,
                due = ?5, description = ?6, effort = ?7, urgency = ?8, pending = ?9
         WHERE id = ?1",
        params![
            todo.id.0,
            parent_workspace,
            parent_todo,
            todo.order_index,
            due_to_sql(todo.due),
            todo.description,
            todo.effort as i64,
            todo.urgency as i64,
            todo.pending,
        ],
    )?;
    Ok(())
}

pub(crate) fn set_workspace_order(
    conn: &Connection,
    id: WorkspaceId,
    order_index: i64,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE workspaces SET order_index = ?2 WHERE id = ?1",
        params![id.0, order_index],
    )?;
    Ok(())
}

pub(crate) fn set_todo_order(
    conn: &Connection,
    id: TodoId,
    order_index: i64,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE todos SET order_index = ?2 WHERE id = ?1",
        params![id.0, order_index],
    )?;
    Ok(())
}

/// Delete a workspace row; descendants (child workspaces and todos) go with
/// it via `ON DELETE CASCADE`.
pub(crate) fn delete_workspace_row(conn: &Connection, id: WorkspaceId) -> Result<(), StoreError> {
    conn.execute("DELETE FROM workspaces WHERE id = ?1", params![id.0])?;
    Ok(())
}

pub(crate) fn delete_todo_row(conn: &Connection, id: TodoId) -> Result<(), StoreError> {
    conn.execute("DELETE FROM todos WHERE id = ?1", params![id.0])?;
    Ok(())
}

// rusqlite's row-mapping callbacks can only fail with rusqlite::Error, so
// StoreError is smuggled through UserFunctionError and unwrapped after.
fn store_to_sql_error(err: StoreError) -> rusqlite::Error {
    match err {
        StoreError::Sqlite(e) => e,
        other => rusqlite::Error::UserFunctionError(Box::new(other)),
    }
}

fn unwrap_sql_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::UserFunctionError(boxed) => match boxed.downcast::<StoreError>() {
            Ok(store_err) => *store_err,
            Err(other) => StoreError::Sqlite(rusqlite::Error::UserFunctionError(other)),
        },
        other => StoreError::Sqlite(other),
    }
}
