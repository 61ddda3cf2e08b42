//! Tree builder for validating node lists and building reconstruction trees.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::entities::SwcNode;
use crate::domain::error::DomainError;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, DomainError>;

/// Constructs validated trees from ordered node sequences.
///
/// Validation happens before any node is inserted: an empty list, missing or
/// duplicate roots, dangling parents, duplicate ids and cycles are rejected.
pub struct TreeBuilder {
    relationship_cache: HashMap<i64, Vec<usize>>,
    visited_ids: HashSet<i64>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            relationship_cache: HashMap::new(),
            visited_ids: HashSet::new(),
        }
    }

    /// Build a tree from `nodes`; input order fixes the order of children.
    #[instrument(level = "debug", skip(self, nodes), fields(count = nodes.len()))]
    pub fn build(&mut self, nodes: &[SwcNode]) -> TreeResult<TreeArena> {
        if nodes.is_empty() {
            return Err(DomainError::EmptyTree);
        }

        // Reset state for a fresh build
        self.relationship_cache.clear();
        self.visited_ids.clear();

        let root = self.index_relationships(nodes)?;
        let tree = self.build_tree(nodes, root)?;

        if tree.len() != nodes.len() {
            return Err(DomainError::CycleDetected {
                root: nodes[root].id,
                unreachable: nodes.len() - tree.len(),
            });
        }
        debug!("built tree with {} nodes", tree.len());
        Ok(tree)
    }

    /// Fill the parent -> children cache and return the position of the root.
    fn index_relationships(&mut self, nodes: &[SwcNode]) -> TreeResult<usize> {
        let mut known_ids = HashSet::with_capacity(nodes.len());
        for node in nodes {
            if !known_ids.insert(node.id) {
                return Err(DomainError::DuplicateId(node.id));
            }
        }

        let roots: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_root())
            .map(|(pos, _)| pos)
            .collect();
        let root = match roots.as_slice() {
            [] => {
                return Err(DomainError::NoRoot {
                    node_count: nodes.len(),
                })
            }
            [single] => *single,
            _ => {
                return Err(DomainError::MultipleRoots {
                    ids: roots.iter().map(|&pos| nodes[pos].id).collect(),
                })
            }
        };

        for (pos, node) in nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                if !known_ids.contains(&parent) {
                    return Err(DomainError::DanglingParent { id: node.id, parent });
                }
                self.relationship_cache.entry(parent).or_default().push(pos);
            }
        }
        Ok(root)
    }

    fn build_tree(&mut self, nodes: &[SwcNode], root: usize) -> TreeResult<TreeArena> {
        let mut tree = TreeArena::new();
        let mut stack: Vec<(usize, Option<NodeId>)> = vec![(root, None)];

        while let Some((pos, parent_idx)) = stack.pop() {
            let node = &nodes[pos];
            // Cycle detection
            if !self.visited_ids.insert(node.id) {
                return Err(DomainError::CycleDetected {
                    root: nodes[root].id,
                    unreachable: nodes.len() - tree.len(),
                });
            }

            let current_idx = tree.insert_node(node.clone(), parent_idx);

            // Reverse so the first child in input order is popped first
            if let Some(children) = self.relationship_cache.get(&node.id) {
                for &child in children.iter().rev() {
                    stack.push((child, Some(current_idx)));
                }
            }
        }

        Ok(tree)
    }
}

/// Convenience wrapper around [`TreeBuilder::build`].
pub fn build_tree(nodes: &[SwcNode]) -> TreeResult<TreeArena> {
    TreeBuilder::new().build(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Point3;

    fn node(id: i64, parent: Option<i64>) -> SwcNode {
        SwcNode::new(id, Point3::new(id as f64, 0.0, 0.0), parent)
    }

    #[test]
    fn test_children_keep_input_order() {
        let nodes = vec![node(1, None), node(2, Some(1)), node(3, Some(1)), node(4, Some(1))];
        let tree = build_tree(&nodes).unwrap();
        let root = tree.get_node(tree.root().unwrap()).unwrap();
        let child_ids: Vec<i64> = root
            .children
            .iter()
            .map(|&c| tree.get_node(c).unwrap().data.id)
            .collect();
        assert_eq!(child_ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_children_before_parents_in_input() {
        let nodes = vec![node(3, Some(2)), node(2, Some(1)), node(1, None)];
        let tree = build_tree(&nodes).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_cycle_without_root_path_is_rejected() {
        // 1 is the root, 2 <-> 3 form a detached cycle
        let nodes = vec![node(1, None), node(2, Some(3)), node(3, Some(2))];
        let err = build_tree(&nodes).unwrap_err();
        assert_eq!(err, DomainError::CycleDetected { root: 1, unreachable: 2 });
        assert!(err.is_malformed());
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let nodes = vec![node(1, None), node(2, Some(2))];
        assert!(matches!(
            build_tree(&nodes),
            Err(DomainError::CycleDetected { unreachable: 1, .. })
        ));
    }

    #[test]
    fn test_builder_is_reusable() {
        let mut builder = TreeBuilder::new();
        let first = builder.build(&[node(1, None), node(2, Some(1))]).unwrap();
        let second = builder.build(&[node(1, None)]).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
    }
}
