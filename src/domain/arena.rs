use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::SwcNode;

/// Handle of a node inside a [`TreeArena`].
pub type NodeId = Index;

/// Tree node in the arena-based reconstruction.
#[derive(Debug)]
pub struct TreeNode {
    /// Traced point for this node
    pub data: SwcNode,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<NodeId>,
    /// Indices of child nodes in the arena, in input order
    pub children: Vec<NodeId>,
    /// Weight of the edge from the parent to this node (0 for the root)
    pub weight: f64,
}

/// Arena-based tree owning all nodes of one reconstruction.
///
/// Edges run parent -> child. Each non-root node stores the Euclidean length
/// of the edge to its parent, so walks towards the root never need a lookup.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<NodeId>,
    by_id: HashMap<i64, NodeId>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            by_id: HashMap::new(),
        }
    }

    /// Insert a node below `parent`, computing the edge weight from positions.
    #[instrument(level = "trace", skip(self, data), fields(id = data.id))]
    pub fn insert_node(&mut self, data: SwcNode, parent: Option<NodeId>) -> NodeId {
        let weight = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.data.distance_to(&data))
            .unwrap_or(0.0);
        let id = data.id;
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
            weight,
        };
        let node_idx = self.arena.insert(node);
        self.by_id.insert(id, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: NodeId) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Look up a node by its SWC id.
    pub fn find(&self, id: i64) -> Option<NodeId> {
        self.by_id.get(&id).copied()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Pre-order traversal, children visited in input order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of nodes on the longest root-to-leaf chain.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();

        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                for &child in &node.children {
                    stack.push((child, depth + 1));
                }
            }
        }
        max_depth
    }

    /// Collects all leaf nodes (nodes with no children) in pre-order.
    ///
    /// A single-node tree yields its root.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Nodes with more than one child, in pre-order.
    pub fn branch_points(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.len() > 1)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Sum of all edge weights.
    pub fn cable_length(&self) -> f64 {
        self.arena.iter().map(|(_, node)| node.weight).sum()
    }

    /// Nodes from `idx` up to and including the root.
    #[instrument(level = "trace", skip(self))]
    pub fn path_to_root(&self, idx: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(idx);
        while let Some(current_idx) = current {
            match self.get_node(current_idx) {
                Some(node) => {
                    path.push(current_idx);
                    current = node.parent;
                }
                None => break,
            }
        }
        path
    }

    /// Clone the traced points of `path` in order.
    pub fn nodes_of(&self, path: &[NodeId]) -> Vec<SwcNode> {
        path.iter()
            .filter_map(|&idx| self.get_node(idx))
            .map(|node| node.data.clone())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Point3;

    //      1
    //     / \
    //    2   4
    //    |
    //    3
    fn small_tree() -> TreeArena {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(SwcNode::new(1, Point3::new(0.0, 0.0, 0.0), None), None);
        let a = tree.insert_node(SwcNode::new(2, Point3::new(3.0, 4.0, 0.0), Some(1)), Some(root));
        tree.insert_node(SwcNode::new(3, Point3::new(3.0, 4.0, 1.0), Some(2)), Some(a));
        tree.insert_node(SwcNode::new(4, Point3::new(0.0, 0.0, 2.0), Some(1)), Some(root));
        tree
    }

    fn ids(tree: &TreeArena, idxs: &[NodeId]) -> Vec<i64> {
        idxs.iter().map(|&i| tree.get_node(i).unwrap().data.id).collect()
    }

    #[test]
    fn test_edge_weights_are_parent_distances() {
        let tree = small_tree();
        let n2 = tree.get_node(tree.find(2).unwrap()).unwrap();
        assert_eq!(n2.weight, 5.0);
        let root = tree.get_node(tree.root().unwrap()).unwrap();
        assert_eq!(root.weight, 0.0);
        assert_eq!(tree.cable_length(), 8.0);
    }

    #[test]
    fn test_traversal_orders() {
        let tree = small_tree();
        let pre: Vec<i64> = tree.iter().map(|(_, n)| n.data.id).collect();
        let post: Vec<i64> = tree.iter_postorder().map(|(_, n)| n.data.id).collect();
        assert_eq!(pre, vec![1, 2, 3, 4]);
        assert_eq!(post, vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_leaves_branch_points_depth() {
        let tree = small_tree();
        assert_eq!(ids(&tree, &tree.leaf_nodes()), vec![3, 4]);
        assert_eq!(ids(&tree, &tree.branch_points()), vec![1]);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn test_path_to_root() {
        let tree = small_tree();
        let path = tree.path_to_root(tree.find(3).unwrap());
        assert_eq!(ids(&tree, &path), vec![3, 2, 1]);
    }

    #[test]
    fn test_empty_arena() {
        let tree = TreeArena::new();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.leaf_nodes().is_empty());
    }
}
