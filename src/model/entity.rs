use serde::{Deserialize, Serialize};

/// Rowid of a workspace in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(pub i64);

/// Rowid of a todo in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub i64);

/// Session-level handle to either kind of node. The TUI tracks highlight and
/// expand state by `NodeId` so a node keeps its identity when its visible
/// index moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Workspace(WorkspaceId),
    Todo(TodoId),
}

/// A todo's parent: exactly one of a workspace or another todo.
/// A todo row with neither is an orphan and is rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentRef {
    Workspace(WorkspaceId),
    Todo(TodoId),
}

/// Extract `@`-tags from a description: every whitespace-delimited token
/// that starts with `@`, including a bare `@`. Tags are derived on read,
/// never stored.
pub fn extract_tags(description: &str) -> Vec<String> {
    description
        .split_whitespace()
        .filter(|token| token.starts_with('@'))
        .map(|token| token.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::extract_tags;

    #[test]
    fn tags_are_at_prefixed_tokens() {
        assert_eq!(
            extract_tags("finish @report @urgent"),
            vec!["@report", "@urgent"]
        );
    }

    #[test]
    fn empty_description_has_no_tags() {
        assert!(extract_tags("").is_empty());
    }

    #[test]
    fn bare_at_counts_as_a_tag() {
        assert_eq!(extract_tags("check @ later"), vec!["@"]);
    }

    #[test]
    fn mid_word_at_is_not_a_tag() {
        assert!(extract_tags("mail me@example.com today").is_empty());
    }
}
