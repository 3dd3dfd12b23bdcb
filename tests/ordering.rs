//! Integration tests for tree mutations against a real on-disk database:
//! sibling order stays dense through inserts, swaps, and cascading deletes,
//! and everything survives a close-and-reopen.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use roost::model::{ParentRef, Todo, Workspace};
use roost::ops::order_ops::{
    OpsError, add_todo, add_workspace, drop_node, shift_down, shift_up,
};
use roost::store::Store;

fn open_temp() -> (TempDir, Store) {
    let dir = TempDir::new().unwrap();
    let store = Store::open(&dir.path().join("roost.db")).unwrap();
    (dir, store)
}

fn named_workspace(store: &mut Store, parent: roost::model::WorkspaceId, name: &str) -> Workspace {
    let mut ws = add_workspace(store, parent, None).unwrap();
    ws.description = name.to_string();
    store.update_workspace(&ws).unwrap();
    ws
}

fn named_todo(store: &mut Store, parent: ParentRef, name: &str) -> Todo {
    let mut todo = add_todo(store, parent, None).unwrap();
    todo.description = name.to_string();
    store.update_todo(&todo).unwrap();
    todo
}

fn todo_order(store: &Store, parent: ParentRef) -> Vec<(String, i64)> {
    store
        .todo_children(parent)
        .unwrap()
        .into_iter()
        .map(|t| (t.description, t.order_index))
        .collect()
}

#[test]
fn indices_stay_dense_through_a_mutation_sequence() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap().id;
    let ws = named_workspace(&mut store, root, "home");
    let parent = ParentRef::Workspace(ws.id);

    let a = named_todo(&mut store, parent, "a");
    let b = named_todo(&mut store, parent, "b");
    let _c = named_todo(&mut store, parent, "c");
    assert_eq!(
        todo_order(&store, parent),
        vec![("a".into(), 0), ("b".into(), 1), ("c".into(), 2)]
    );

    assert!(shift_down(&mut store, a.node_id()).unwrap());
    assert_eq!(
        todo_order(&store, parent),
        vec![("b".into(), 0), ("a".into(), 1), ("c".into(), 2)]
    );

    drop_node(&mut store, b.node_id()).unwrap();
    assert_eq!(
        todo_order(&store, parent),
        vec![("a".into(), 0), ("c".into(), 1)]
    );

    named_todo(&mut store, parent, "d");
    assert_eq!(
        todo_order(&store, parent),
        vec![("a".into(), 0), ("c".into(), 1), ("d".into(), 2)]
    );
}

#[test]
fn insert_at_index_shifts_later_siblings() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap().id;
    let ws = named_workspace(&mut store, root, "home");
    let parent = ParentRef::Workspace(ws.id);

    named_todo(&mut store, parent, "first");
    named_todo(&mut store, parent, "last");
    let mut middle = add_todo(&mut store, parent, Some(1)).unwrap();
    middle.description = "middle".into();
    store.update_todo(&middle).unwrap();

    assert_eq!(
        todo_order(&store, parent),
        vec![("first".into(), 0), ("middle".into(), 1), ("last".into(), 2)]
    );
}

#[test]
fn deleting_a_workspace_cascades_to_its_subtree() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap().id;
    let outer = named_workspace(&mut store, root, "outer");
    let inner = named_workspace(&mut store, outer.id, "inner");
    let todo = named_todo(&mut store, ParentRef::Workspace(inner.id), "task");
    let sub = named_todo(&mut store, ParentRef::Todo(todo.id), "subtask");

    drop_node(&mut store, outer.node_id()).unwrap();

    assert!(store.get_workspace(outer.id).unwrap().is_none());
    assert!(store.get_workspace(inner.id).unwrap().is_none());
    assert!(store.get_todo(todo.id).unwrap().is_none());
    assert!(store.get_todo(sub.id).unwrap().is_none());
}

#[test]
fn root_workspace_cannot_be_dropped_or_shifted() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap();

    let err = drop_node(&mut store, root.node_id()).unwrap_err();
    assert!(matches!(err, OpsError::RootImmutable));
    let err = shift_up(&mut store, root.node_id()).unwrap_err();
    assert!(matches!(err, OpsError::RootImmutable));

    // Still there afterwards
    assert!(store.get_workspace(root.id).unwrap().is_some());
}

#[test]
fn shift_at_the_boundary_is_a_no_op() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap().id;
    let ws = named_workspace(&mut store, root, "home");
    let parent = ParentRef::Workspace(ws.id);
    let a = named_todo(&mut store, parent, "a");
    let b = named_todo(&mut store, parent, "b");

    assert!(!shift_up(&mut store, a.node_id()).unwrap());
    assert!(!shift_down(&mut store, b.node_id()).unwrap());
    assert_eq!(
        todo_order(&store, parent),
        vec![("a".into(), 0), ("b".into(), 1)]
    );
}

#[test]
fn tree_survives_closing_and_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roost.db");

    let (ws_id, todo_id) = {
        let mut store = Store::open(&path).unwrap();
        let root = store.root_workspace().unwrap().id;
        let ws = named_workspace(&mut store, root, "persisted");
        let mut todo = named_todo(&mut store, ParentRef::Workspace(ws.id), "remember me");
        todo.effort = 3;
        todo.urgency = 5;
        store.update_todo(&todo).unwrap();
        (ws.id, todo.id)
    };

    let store = Store::open(&path).unwrap();
    let ws = store.get_workspace(ws_id).unwrap().unwrap();
    assert_eq!(ws.description, "persisted");
    let todo = store.get_todo(todo_id).unwrap().unwrap();
    assert_eq!(todo.description, "remember me");
    assert_eq!(todo.effort, 3);
    assert_eq!(todo.urgency, 5);
    assert!(todo.pending);
}

#[test]
fn sibling_groups_reindex_independently() {
    let (_dir, mut store) = open_temp();
    let root = store.root_workspace().unwrap().id;
    let ws_a = named_workspace(&mut store, root, "a");
    let ws_b = named_workspace(&mut store, root, "b");
    let in_a = named_todo(&mut store, ParentRef::Workspace(ws_a.id), "only in a");
    named_todo(&mut store, ParentRef::Workspace(ws_b.id), "b0");
    named_todo(&mut store, ParentRef::Workspace(ws_b.id), "b1");

    drop_node(&mut store, in_a.node_id()).unwrap();

    // b's group is untouched
    assert_eq!(
        todo_order(&store, ParentRef::Workspace(ws_b.id)),
        vec![("b0".into(), 0), ("b1".into(), 1)]
    );
    assert!(store.todo_children(ParentRef::Workspace(ws_a.id)).unwrap().is_empty());
}
