//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree invariants.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("empty tree: no nodes supplied")]
    EmptyTree,

    #[error("malformed tree: no parentless node found among {node_count} nodes")]
    NoRoot { node_count: usize },

    #[error("malformed tree: multiple roots: {ids:?}")]
    MultipleRoots { ids: Vec<i64> },

    #[error("malformed tree: node {id} declares missing parent {parent}")]
    DanglingParent { id: i64, parent: i64 },

    #[error("malformed tree: duplicate node id {0}")]
    DuplicateId(i64),

    #[error("malformed tree: cycle detected, {unreachable} node(s) not reachable from root {root}")]
    CycleDetected { root: i64, unreachable: usize },

    #[error("node not found in tree: {0}")]
    NodeNotFound(String),
}

impl DomainError {
    /// True for every variant describing a structurally invalid node list.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            DomainError::NoRoot { .. }
                | DomainError::MultipleRoots { .. }
                | DomainError::DanglingParent { .. }
                | DomainError::DuplicateId(_)
                | DomainError::CycleDetected { .. }
        )
    }
}
