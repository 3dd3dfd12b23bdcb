//! Tree Flattening Engine: turns a subtree plus per-node expand state and an
//! optional filter into the ordered list of visible rows. Recomputed from
//! scratch on demand — tree sizes are interactive-scale, so correctness wins
//! over incremental patching.

use std::collections::HashSet;

use crate::model::{NodeId, ParentRef, Todo, Workspace, WorkspaceId};
use crate::store::{Store, StoreError};

/// Loaded data for one visible node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Workspace(Workspace),
    Todo(Todo),
}

impl NodeData {
    pub fn id(&self) -> NodeId {
        match self {
            NodeData::Workspace(ws) => ws.node_id(),
            NodeData::Todo(todo) => todo.node_id(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            NodeData::Workspace(ws) => &ws.description,
            NodeData::Todo(todo) => &todo.description,
        }
    }

    pub fn order_index(&self) -> i64 {
        match self {
            NodeData::Workspace(ws) => ws.order_index,
            NodeData::Todo(todo) => todo.order_index,
        }
    }
}

/// Which child relation a pane walks: the workspace tree, or the todo
/// forest rooted in one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    Workspaces,
    Todos,
}

/// One line presented to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub data: NodeData,
    /// Nesting depth below the pane root (0 = top level)
    pub depth: usize,
    pub has_children: bool,
    pub is_expanded: bool,
    pub is_last_sibling: bool,
    /// For tree continuation guides: whether each ancestor is a last sibling
    pub ancestor_last: Vec<bool>,
}

/// Flatten the subtree under `root`, depth-first in `order_index` order.
///
/// Without a filter, children appear only under expanded nodes. With a
/// filter (case-insensitive containment on the description) a node is
/// visible iff it or any descendant matches, evaluated bottom-up, and
/// matching descendants force their ancestors open regardless of expand
/// state. Same state + same data always yields the same sequence.
pub fn flatten(
    store: &Store,
    pane: PaneKind,
    root: WorkspaceId,
    expanded: &HashSet<NodeId>,
    filter: Option<&str>,
) -> Result<Vec<Row>, StoreError> {
    let needle = filter.filter(|f| !f.is_empty()).map(str::to_lowercase);
    let children = child_nodes(store, pane, NodeId::Workspace(root))?;
    let count = children.len();
    let mut rows = Vec::new();
    for (i, child) in children.into_iter().enumerate() {
        emit_node(
            store,
            pane,
            child,
            0,
            i + 1 == count,
            Vec::new(),
            expanded,
            needle.as_deref(),
            &mut rows,
        )?;
    }
    Ok(rows)
}

/// Position of a node in a row list, if visible
pub fn row_index(rows: &[Row], id: NodeId) -> Option<usize> {
    rows.iter().position(|row| row.data.id() == id)
}

fn child_nodes(store: &Store, pane: PaneKind, parent: NodeId) -> Result<Vec<NodeData>, StoreError> {
    match (pane, parent) {
        (PaneKind::Workspaces, NodeId::Workspace(id)) => Ok(store
            .workspace_children(id)?
            .into_iter()
            .map(NodeData::Workspace)
            .collect()),
        // The workspace pane never descends into todos
        (PaneKind::Workspaces, NodeId::Todo(_)) => Ok(Vec::new()),
        (PaneKind::Todos, NodeId::Workspace(id)) => Ok(store
            .todo_children(ParentRef::Workspace(id))?
            .into_iter()
            .map(NodeData::Todo)
            .collect()),
        (PaneKind::Todos, NodeId::Todo(id)) => Ok(store
            .todo_children(ParentRef::Todo(id))?
            .into_iter()
            .map(NodeData::Todo)
            .collect()),
    }
}

/// Emit one node (and recursively its visible descendants). Returns whether
/// the node or anything below it matched the filter.
#[allow(clippy::too_many_arguments)]
fn emit_node(
    store: &Store,
    pane: PaneKind,
    node: NodeData,
    depth: usize,
    is_last: bool,
    ancestor_last: Vec<bool>,
    expanded: &HashSet<NodeId>,
    filter: Option<&str>,
    out: &mut Vec<Row>,
) -> Result<bool, StoreError> {
    let children = child_nodes(store, pane, node.id())?;
    let has_children = !children.is_empty();
    let count = children.len();

    match filter {
        Some(needle) => {
            let self_match = node.description().to_lowercase().contains(needle);
            // Collect the matching subtree first; visibility propagates
            // bottom-up, so the decision to emit this row depends on it.
            let mut sub = Vec::new();
            let mut any_child = false;
            for (i, child) in children.into_iter().enumerate() {
                let mut guides = ancestor_last.clone();
                guides.push(is_last);
                any_child |= emit_node(
                    store,
                    pane,
                    child,
                    depth + 1,
                    i + 1 == count,
                    guides,
                    expanded,
                    filter,
                    &mut sub,
                )?;
            }
            let visible = self_match || any_child;
            if visible {
                out.push(Row {
                    data: node,
                    depth,
                    has_children,
                    is_expanded: !sub.is_empty(),
                    is_last_sibling: is_last,
                    ancestor_last,
                });
                out.append(&mut sub);
            }
            Ok(visible)
        }
        None => {
            let is_expanded = has_children && expanded.contains(&node.id());
            out.push(Row {
                data: node,
                depth,
                has_children,
                is_expanded,
                is_last_sibling: is_last,
                ancestor_last: ancestor_last.clone(),
            });
            if is_expanded {
                for (i, child) in children.into_iter().enumerate() {
                    let mut guides = ancestor_last.clone();
                    guides.push(is_last);
                    emit_node(
                        store,
                        pane,
                        child,
                        depth + 1,
                        i + 1 == count,
                        guides,
                        expanded,
                        filter,
                        out,
                    )?;
                }
            }
            Ok(false)
        }
    }
}
