//! Directed weighted graph view of a reconstruction.
//!
//! Vertices carry the arena [`NodeId`] of the traced point they stand for;
//! edges run parent -> child and carry the Euclidean length between them.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::builder::TreeResult;
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub struct WeightedGraph {
    graph: DiGraph<NodeId, f64>,
    root: NodeIndex,
    index_of: HashMap<NodeId, NodeIndex>,
}

impl WeightedGraph {
    /// One vertex per node, one edge per non-root node.
    ///
    /// Vertices are added in pre-order, so `node_indices()` is pre-order too.
    #[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
    pub fn from_tree(tree: &TreeArena) -> TreeResult<Self> {
        let root = tree.root().ok_or(DomainError::EmptyTree)?;
        let mut graph = DiGraph::with_capacity(tree.len(), tree.len().saturating_sub(1));
        let mut index_of = HashMap::with_capacity(tree.len());

        for (idx, node) in tree.iter() {
            let vertex = graph.add_node(idx);
            index_of.insert(idx, vertex);
            if let Some(parent) = node.parent.and_then(|p| index_of.get(&p)) {
                graph.add_edge(*parent, vertex, node.weight);
            }
        }

        Ok(Self {
            root: index_of[&root],
            graph,
            index_of,
        })
    }

    /// Graph reduced to root, branch points and tips.
    ///
    /// Every kept node is linked to its closest kept ancestor with the summed
    /// weight of the chain in between, so cable length and root-to-tip
    /// distances are preserved.
    #[instrument(level = "debug", skip(tree))]
    pub fn simplified(tree: &TreeArena) -> TreeResult<Self> {
        let root = tree.root().ok_or(DomainError::EmptyTree)?;
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();

        for (idx, node) in tree.iter() {
            let relevant = idx == root || node.children.len() != 1;
            if !relevant {
                continue;
            }
            let vertex = graph.add_node(idx);
            index_of.insert(idx, vertex);
            if idx == root {
                continue;
            }
            if let Some((ancestor, weight)) = first_relevant_ancestor(tree, idx) {
                if let Some(&ancestor_vertex) = index_of.get(&ancestor) {
                    graph.add_edge(ancestor_vertex, vertex, weight);
                }
            }
        }
        debug!(
            "simplified {} nodes down to {}",
            tree.len(),
            graph.node_count()
        );

        Ok(Self {
            root: index_of[&root],
            graph,
            index_of,
        })
    }

    pub fn inner(&self) -> &DiGraph<NodeId, f64> {
        &self.graph
    }

    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub fn root(&self) -> NodeId {
        self.graph[self.root]
    }

    pub fn index(&self, node: NodeId) -> Option<NodeIndex> {
        self.index_of.get(&node).copied()
    }

    pub fn node_id(&self, vertex: NodeIndex) -> NodeId {
        self.graph[vertex]
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn sum_edge_weights(&self) -> f64 {
        self.graph.edge_weights().sum()
    }

    /// Vertices with out-degree 0, in pre-order.
    pub fn tips(&self) -> Vec<NodeId> {
        self.filter_by_out_degree(|degree| degree == 0)
    }

    /// Vertices with out-degree > 1, in pre-order.
    pub fn branch_points(&self) -> Vec<NodeId> {
        self.filter_by_out_degree(|degree| degree > 1)
    }

    /// Successors of `node` with the weight of the connecting edge.
    pub fn successors(&self, node: NodeId) -> Vec<(NodeId, f64)> {
        let Some(vertex) = self.index(node) else {
            return Vec::new();
        };
        let mut out: Vec<(NodeId, f64)> = self
            .graph
            .edges_directed(vertex, Direction::Outgoing)
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect();
        // petgraph yields the most recently added edge first
        out.reverse();
        out
    }

    fn filter_by_out_degree(&self, keep: impl Fn(usize) -> bool) -> Vec<NodeId> {
        self.graph
            .node_indices()
            .filter(|&v| keep(self.graph.neighbors_directed(v, Direction::Outgoing).count()))
            .map(|v| self.graph[v])
            .collect()
    }
}

/// Closest ancestor that is the root or a branch point, with the path weight to it.
fn first_relevant_ancestor(tree: &TreeArena, idx: NodeId) -> Option<(NodeId, f64)> {
    let root = tree.root()?;
    let mut weight = 0.0;
    let mut current = idx;
    loop {
        let node = tree.get_node(current)?;
        let parent_idx = node.parent?;
        weight += node.weight;
        let parent = tree.get_node(parent_idx)?;
        if parent_idx == root || parent.children.len() > 1 {
            return Some((parent_idx, weight));
        }
        current = parent_idx;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::build_tree;
    use crate::domain::entities::{Point3, SwcNode};

    // 1 - 2 - 3 < (4 - 5, 6)
    fn branched() -> TreeArena {
        let nodes = vec![
            SwcNode::new(1, Point3::new(0.0, 0.0, 0.0), None),
            SwcNode::new(2, Point3::new(1.0, 0.0, 0.0), Some(1)),
            SwcNode::new(3, Point3::new(2.0, 0.0, 0.0), Some(2)),
            SwcNode::new(4, Point3::new(2.0, 1.0, 0.0), Some(3)),
            SwcNode::new(5, Point3::new(2.0, 3.0, 0.0), Some(4)),
            SwcNode::new(6, Point3::new(5.0, 0.0, 0.0), Some(3)),
        ];
        build_tree(&nodes).unwrap()
    }

    fn ids(tree: &TreeArena, idxs: &[NodeId]) -> Vec<i64> {
        idxs.iter().map(|&i| tree.get_node(i).unwrap().data.id).collect()
    }

    #[test]
    fn test_graph_mirrors_tree() {
        let tree = branched();
        let graph = WeightedGraph::from_tree(&tree).unwrap();
        assert_eq!(graph.vertex_count(), 6);
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.sum_edge_weights(), tree.cable_length());
        assert_eq!(ids(&tree, &graph.tips()), vec![5, 6]);
        assert_eq!(ids(&tree, &graph.branch_points()), vec![3]);
        assert_eq!(tree.get_node(graph.root()).unwrap().data.id, 1);
    }

    #[test]
    fn test_successors_in_input_order() {
        let tree = branched();
        let graph = WeightedGraph::from_tree(&tree).unwrap();
        let succ = graph.successors(tree.find(3).unwrap());
        let succ_ids: Vec<i64> = succ
            .iter()
            .map(|(n, _)| tree.get_node(*n).unwrap().data.id)
            .collect();
        assert_eq!(succ_ids, vec![4, 6]);
        assert_eq!(succ[1].1, 3.0);
    }

    #[test]
    fn test_simplified_keeps_root_branch_points_and_tips() {
        let tree = branched();
        let simple = WeightedGraph::simplified(&tree).unwrap();
        assert_eq!(simple.vertex_count(), 4);
        assert_eq!(simple.edge_count(), 3);
        assert_eq!(simple.sum_edge_weights(), tree.cable_length());

        let succ = simple.successors(tree.find(1).unwrap());
        assert_eq!(succ.len(), 1);
        assert_eq!(tree.get_node(succ[0].0).unwrap().data.id, 3);
        assert_eq!(succ[0].1, 2.0);
    }

    #[test]
    fn test_empty_tree_is_rejected() {
        let tree = TreeArena::new();
        assert_eq!(
            WeightedGraph::from_tree(&tree).unwrap_err(),
            DomainError::EmptyTree
        );
    }
}
