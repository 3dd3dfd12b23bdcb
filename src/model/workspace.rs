use serde::{Deserialize, Serialize};

use super::entity::{NodeId, WorkspaceId, extract_tags};

/// A container node. Owns two ordered child collections (child workspaces
/// and todos), each kept dense by the ordering service. The parentless
/// workspace is the root: never displayed, never deletable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    /// `None` marks the root workspace
    pub parent: Option<WorkspaceId>,
    pub order_index: i64,
    pub description: String,
}

impl Workspace {
    pub fn node_id(&self) -> NodeId {
        NodeId::Workspace(self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// `@`-tags derived from the description; recomputed on every read
    pub fn tags(&self) -> Vec<String> {
        extract_tags(&self.description)
    }
}
