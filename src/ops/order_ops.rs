use rusqlite::Connection;

use crate::model::{NodeId, ParentRef, Todo, TodoId, Workspace, WorkspaceId};
use crate::store::{self, Store, StoreError};

/// Error type for tree mutations
#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("the root workspace cannot be deleted or moved")]
    RootImmutable,
    #[error("node not found")]
    NotFound,
    #[error("sibling order indices are not dense")]
    SiblingIndexConflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Insertion
// ---------------------------------------------------------------------------

/// Insert a new empty workspace under `parent` at `index` (append when
/// `None`). Siblings at positions >= index shift up by one; the whole
/// mutation commits atomically.
pub fn add_workspace(
    store: &mut Store,
    parent: WorkspaceId,
    index: Option<usize>,
) -> Result<Workspace, OpsError> {
    let tx = store.transaction()?;
    let siblings = store::query_workspace_children(&tx, parent)?;
    let at = index.unwrap_or(siblings.len()).min(siblings.len());
    for sib in siblings.iter().skip(at) {
        store::set_workspace_order(&tx, sib.id, sib.order_index + 1)?;
    }
    let mut ws = Workspace {
        id: WorkspaceId(0),
        parent: Some(parent),
        order_index: at as i64,
        description: String::new(),
    };
    ws.id = store::insert_workspace_row(&tx, &ws, false)?;
    verify_workspace_order(&tx, parent)?;
    tx.commit().map_err(StoreError::from)?;
    Ok(ws)
}

/// Insert a new empty pending todo under a workspace or todo at `index`
/// (append when `None`).
pub fn add_todo(
    store: &mut Store,
    parent: ParentRef,
    index: Option<usize>,
) -> Result<Todo, OpsError> {
    let tx = store.transaction()?;
    let siblings = store::query_todo_children(&tx, parent)?;
    let at = index.unwrap_or(siblings.len()).min(siblings.len());
    for sib in siblings.iter().skip(at) {
        store::set_todo_order(&tx, sib.id, sib.order_index + 1)?;
    }
    let mut todo = Todo {
        id: TodoId(0),
        parent,
        order_index: at as i64,
        description: String::new(),
        due: None,
        effort: 0,
        urgency: 0,
        pending: true,
    };
    todo.id = store::insert_todo_row(&tx, &todo, false)?;
    verify_todo_order(&tx, parent)?;
    tx.commit().map_err(StoreError::from)?;
    Ok(todo)
}

// ---------------------------------------------------------------------------
// Deletion
// ---------------------------------------------------------------------------

/// Delete a node and its entire descendant subtree, then close the gap in
/// the remaining sibling group. One transaction: either everything is gone
/// and the indices are dense again, or nothing changed.
pub fn drop_node(store: &mut Store, node: NodeId) -> Result<(), OpsError> {
    match node {
        NodeId::Workspace(id) => {
            let ws = store.get_workspace(id)?.ok_or(OpsError::NotFound)?;
            let parent = ws.parent.ok_or(OpsError::RootImmutable)?;
            let tx = store.transaction()?;
            store::delete_workspace_row(&tx, id)?;
            for (i, sib) in store::query_workspace_children(&tx, parent)?.iter().enumerate() {
                if sib.order_index != i as i64 {
                    store::set_workspace_order(&tx, sib.id, i as i64)?;
                }
            }
            verify_workspace_order(&tx, parent)?;
            tx.commit().map_err(StoreError::from)?;
        }
        NodeId::Todo(id) => {
            let todo = store.get_todo(id)?.ok_or(OpsError::NotFound)?;
            let tx = store.transaction()?;
            store::delete_todo_row(&tx, id)?;
            for (i, sib) in store::query_todo_children(&tx, todo.parent)?.iter().enumerate() {
                if sib.order_index != i as i64 {
                    store::set_todo_order(&tx, sib.id, i as i64)?;
                }
            }
            verify_todo_order(&tx, todo.parent)?;
            tx.commit().map_err(StoreError::from)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reordering
// ---------------------------------------------------------------------------

/// Swap a node with the sibling just above it. Returns whether anything
/// moved; at the top of the group this is a silent no-op.
pub fn shift_up(store: &mut Store, node: NodeId) -> Result<bool, OpsError> {
    shift(store, node, Direction::Up)
}

/// Swap a node with the sibling just below it; no-op at the bottom.
pub fn shift_down(store: &mut Store, node: NodeId) -> Result<bool, OpsError> {
    shift(store, node, Direction::Down)
}

#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

fn neighbor_position(pos: usize, len: usize, dir: Direction) -> Option<usize> {
    match dir {
        Direction::Up => pos.checked_sub(1),
        Direction::Down => (pos + 1 < len).then_some(pos + 1),
    }
}

fn shift(store: &mut Store, node: NodeId, dir: Direction) -> Result<bool, OpsError> {
    match node {
        NodeId::Workspace(id) => {
            let ws = store.get_workspace(id)?.ok_or(OpsError::NotFound)?;
            let parent = ws.parent.ok_or(OpsError::RootImmutable)?;
            let siblings = store.workspace_children(parent)?;
            let pos = siblings
                .iter()
                .position(|s| s.id == id)
                .ok_or(OpsError::NotFound)?;
            let Some(other) = neighbor_position(pos, siblings.len(), dir) else {
                return Ok(false);
            };
            let tx = store.transaction()?;
            store::set_workspace_order(&tx, siblings[pos].id, siblings[other].order_index)?;
            store::set_workspace_order(&tx, siblings[other].id, siblings[pos].order_index)?;
            verify_workspace_order(&tx, parent)?;
            tx.commit().map_err(StoreError::from)?;
        }
        NodeId::Todo(id) => {
            let todo = store.get_todo(id)?.ok_or(OpsError::NotFound)?;
            let siblings = store.todo_children(todo.parent)?;
            let pos = siblings
                .iter()
                .position(|s| s.id == id)
                .ok_or(OpsError::NotFound)?;
            let Some(other) = neighbor_position(pos, siblings.len(), dir) else {
                return Ok(false);
            };
            let tx = store.transaction()?;
            store::set_todo_order(&tx, siblings[pos].id, siblings[other].order_index)?;
            store::set_todo_order(&tx, siblings[other].id, siblings[pos].order_index)?;
            verify_todo_order(&tx, todo.parent)?;
            tx.commit().map_err(StoreError::from)?;
        }
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Sibling groups
// ---------------------------------------------------------------------------

/// Same-kind children of the workspace's parent, in order. The root is its
/// own group of one.
pub fn workspace_siblings(store: &Store, ws: &Workspace) -> Result<Vec<Workspace>, OpsError> {
    match ws.parent {
        Some(parent) => Ok(store.workspace_children(parent)?),
        None => Ok(vec![ws.clone()]),
    }
}

pub fn todo_siblings(store: &Store, todo: &Todo) -> Result<Vec<Todo>, OpsError> {
    Ok(store.todo_children(todo.parent)?)
}

// ---------------------------------------------------------------------------
// Invariant check
// ---------------------------------------------------------------------------

// Every mutation re-reads its sibling group before committing. A gap or
// duplicate here means the reindex went wrong; the error drops the open
// transaction, so nothing partial becomes visible.

fn verify_workspace_order(conn: &Connection, parent: WorkspaceId) -> Result<(), OpsError> {
    let children = store::query_workspace_children(conn, parent)?;
    verify_dense(children.iter().map(|c| c.order_index))
}

fn verify_todo_order(conn: &Connection, parent: ParentRef) -> Result<(), OpsError> {
    let children = store::query_todo_children(conn, parent)?;
    verify_dense(children.iter().map(|c| c.order_index))
}

fn verify_dense(ordered: impl Iterator<Item = i64>) -> Result<(), OpsError> {
    for (expected, actual) in ordered.enumerate() {
        if actual != expected as i64 {
            return Err(OpsError::SiblingIndexConflict);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fresh() -> (Store, WorkspaceId) {
        let store = Store::open_in_memory().unwrap();
        let root = store.root_workspace().unwrap().id;
        (store, root)
    }

    fn todo_descriptions(store: &Store, parent: ParentRef) -> Vec<(String, i64)> {
        store
            .todo_children(parent)
            .unwrap()
            .into_iter()
            .map(|t| (t.description, t.order_index))
            .collect()
    }

    #[test]
    fn append_assigns_index_at_sibling_count() {
        let (mut store, root) = fresh();
        let parent = ParentRef::Workspace(root);
        for expected in 0..3 {
            let todo = add_todo(&mut store, parent, None).unwrap();
            assert_eq!(todo.order_index, expected);
        }
    }

    #[test]
    fn insert_at_index_shifts_later_siblings() {
        let (mut store, root) = fresh();
        let parent = ParentRef::Workspace(root);
        let a = add_todo(&mut store, parent, None).unwrap();
        let b = add_todo(&mut store, parent, None).unwrap();
        let inserted = add_todo(&mut store, parent, Some(1)).unwrap();

        let children = store.todo_children(parent).unwrap();
        let ids: Vec<_> = children.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, inserted.id, b.id]);
        let indices: Vec<_> = children.iter().map(|t| t.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn shift_then_delete_then_append_scenario() {
        // W(root) with [A, B, C]: shift_down(A) -> [B, A, C];
        // drop B -> [A, C] at 0,1; append D -> [A, C, D].
        let (mut store, root) = fresh();
        let parent = ParentRef::Workspace(root);
        let mut a = add_todo(&mut store, parent, None).unwrap();
        a.description = "A".into();
        store.update_todo(&a).unwrap();
        let mut b = add_todo(&mut store, parent, None).unwrap();
        b.description = "B".into();
        store.update_todo(&b).unwrap();
        let mut c = add_todo(&mut store, parent, None).unwrap();
        c.description = "C".into();
        store.update_todo(&c).unwrap();

        assert!(shift_down(&mut store, a.node_id()).unwrap());
        assert_eq!(
            todo_descriptions(&store, parent),
            vec![("B".into(), 0), ("A".into(), 1), ("C".into(), 2)]
        );

        drop_node(&mut store, b.node_id()).unwrap();
        assert_eq!(
            todo_descriptions(&store, parent),
            vec![("A".into(), 0), ("C".into(), 1)]
        );

        let mut d = add_todo(&mut store, parent, None).unwrap();
        d.description = "D".into();
        store.update_todo(&d).unwrap();
        assert_eq!(
            todo_descriptions(&store, parent),
            vec![("A".into(), 0), ("C".into(), 1), ("D".into(), 2)]
        );
    }

    #[test]
    fn shift_up_at_top_is_a_no_op() {
        let (mut store, root) = fresh();
        let parent = ParentRef::Workspace(root);
        let a = add_todo(&mut store, parent, None).unwrap();
        let _b = add_todo(&mut store, parent, None).unwrap();
        assert!(!shift_up(&mut store, a.node_id()).unwrap());
        assert_eq!(store.todo_children(parent).unwrap()[0].id, a.id);
    }

    #[test]
    fn shift_up_then_down_restores_order() {
        let (mut store, root) = fresh();
        let parent = ParentRef::Workspace(root);
        let _a = add_todo(&mut store, parent, None).unwrap();
        let b = add_todo(&mut store, parent, None).unwrap();
        let _c = add_todo(&mut store, parent, None).unwrap();

        let before: Vec<_> = store
            .todo_children(parent)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert!(shift_up(&mut store, b.node_id()).unwrap());
        assert!(shift_down(&mut store, b.node_id()).unwrap());
        let after: Vec<_> = store
            .todo_children(parent)
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn dropping_a_workspace_cascades_to_descendants() {
        let (mut store, root) = fresh();
        let ws = add_workspace(&mut store, root, None).unwrap();
        let todo = add_todo(&mut store, ParentRef::Workspace(ws.id), None).unwrap();
        let sub = add_todo(&mut store, ParentRef::Todo(todo.id), None).unwrap();
        let child_ws = add_workspace(&mut store, ws.id, None).unwrap();

        drop_node(&mut store, ws.node_id()).unwrap();

        assert!(store.get_workspace(ws.id).unwrap().is_none());
        assert!(store.get_workspace(child_ws.id).unwrap().is_none());
        assert!(store.get_todo(todo.id).unwrap().is_none());
        assert!(store.get_todo(sub.id).unwrap().is_none());
    }

    #[test]
    fn root_cannot_be_dropped_or_shifted() {
        let (mut store, root) = fresh();
        assert!(matches!(
            drop_node(&mut store, NodeId::Workspace(root)),
            Err(OpsError::RootImmutable)
        ));
        assert!(matches!(
            shift_up(&mut store, NodeId::Workspace(root)),
            Err(OpsError::RootImmutable)
        ));
    }

    #[test]
    fn sibling_groups_are_independent_per_parent() {
        let (mut store, root) = fresh();
        let ws_a = add_workspace(&mut store, root, None).unwrap();
        let ws_b = add_workspace(&mut store, root, None).unwrap();
        let t1 = add_todo(&mut store, ParentRef::Workspace(ws_a.id), None).unwrap();
        let t2 = add_todo(&mut store, ParentRef::Workspace(ws_b.id), None).unwrap();
        // Both first in their own group
        assert_eq!(t1.order_index, 0);
        assert_eq!(t2.order_index, 0);
        // Sub-todos form their own group too
        let sub = add_todo(&mut store, ParentRef::Todo(t1.id), None).unwrap();
        assert_eq!(sub.order_index, 0);
    }
}
