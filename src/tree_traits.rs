//! Text-tree rendering of reconstructions via `termtree`.
//!
//! Both renderings are built bottom-up, and nesting stops at
//! [`MAX_RENDER_DEPTH`]: a deeper subtree is summarised by a single line
//! counting its nodes. Long unbranched axons therefore render and drop
//! without deep recursion.

use std::collections::HashMap;
use std::hash::Hash;

use petgraph::visit::{Bfs, EdgeRef};
use petgraph::Direction;
use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeId, SwcNode, TreeArena, WeightedGraph};

/// Deepest level that gets its own line.
pub const MAX_RENDER_DEPTH: usize = 256;

pub trait ToTermTree {
    fn to_term_tree(&self) -> Tree<String>;
}

fn label(node: &SwcNode, weight: Option<f64>) -> String {
    match weight {
        Some(w) => format!("{node} +{w:.3}"),
        None => node.to_string(),
    }
}

/// Assemble a tree from `order`, any traversal listing parents before their
/// descendants, with the root first.
fn build_capped<K, C, L>(order: &[K], children: C, label: L) -> Option<Tree<String>>
where
    K: Copy + Eq + Hash,
    C: Fn(K) -> Vec<K>,
    L: Fn(K) -> String,
{
    let root = *order.first()?;
    let mut depth: HashMap<K, usize> = HashMap::from([(root, 0)]);
    for &key in order {
        let d = depth.get(&key).copied().unwrap_or(0);
        for child in children(key) {
            depth.insert(child, d + 1);
        }
    }

    let mut size: HashMap<K, usize> = HashMap::new();
    let mut built: HashMap<K, Tree<String>> = HashMap::new();
    for &key in order.iter().rev() {
        let kids = children(key);
        let below: usize = kids.iter().filter_map(|c| size.get(c)).sum();
        size.insert(key, below + 1);

        let d = depth.get(&key).copied().unwrap_or(0);
        if d > MAX_RENDER_DEPTH {
            continue;
        }
        let mut tree = Tree::new(label(key));
        if d == MAX_RENDER_DEPTH {
            if below > 0 {
                tree.push(Tree::new(format!("... {below} more nodes")));
            }
        } else {
            tree = tree.with_leaves(kids.iter().filter_map(|c| built.remove(c)));
        }
        built.insert(key, tree);
    }
    built.remove(&root)
}

impl ToTermTree for TreeArena {
    #[instrument(level = "debug", skip(self), fields(nodes = self.len()))]
    fn to_term_tree(&self) -> Tree<String> {
        let order: Vec<NodeId> = self.iter().map(|(idx, _)| idx).collect();
        build_capped(
            &order,
            |idx| {
                self.get_node(idx)
                    .map(|node| node.children.clone())
                    .unwrap_or_default()
            },
            |idx| match self.get_node(idx) {
                Some(node) => label(&node.data, node.parent.map(|_| node.weight)),
                None => String::new(),
            },
        )
        .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}

/// Simplified topology (root, branch points, tips) labelled with the nodes
/// of the tree it was derived from.
pub struct SimplifiedView<'a> {
    pub tree: &'a TreeArena,
    pub graph: &'a WeightedGraph,
}

impl ToTermTree for SimplifiedView<'_> {
    #[instrument(level = "debug", skip(self), fields(vertices = self.graph.vertex_count()))]
    fn to_term_tree(&self) -> Tree<String> {
        let inner = self.graph.inner();
        let mut order: Vec<NodeId> = Vec::with_capacity(self.graph.vertex_count());
        let mut bfs = Bfs::new(inner, self.graph.root_index());
        while let Some(vertex) = bfs.next(inner) {
            order.push(self.graph.node_id(vertex));
        }

        build_capped(
            &order,
            |id| {
                self.graph
                    .successors(id)
                    .into_iter()
                    .map(|(child, _)| child)
                    .collect()
            },
            |id| {
                let Some(node) = self.tree.get_node(id) else {
                    return String::new();
                };
                let weight = self.graph.index(id).and_then(|vertex| {
                    inner
                        .edges_directed(vertex, Direction::Incoming)
                        .next()
                        .map(|edge| *edge.weight())
                });
                label(&node.data, weight)
            },
        )
        .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_tree, Point3};

    fn y_tree() -> TreeArena {
        build_tree(&[
            SwcNode::new(1, Point3::new(0.0, 0.0, 0.0), None),
            SwcNode::new(2, Point3::new(1.0, 0.0, 0.0), Some(1)),
            SwcNode::new(3, Point3::new(2.0, 0.0, 0.0), Some(2)),
            SwcNode::new(4, Point3::new(2.0, 1.0, 0.0), Some(3)),
            SwcNode::new(5, Point3::new(2.0, -2.0, 0.0), Some(3)),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_tree_renders_every_node() {
        let rendered = y_tree().to_term_tree().to_string();
        assert_eq!(rendered.lines().count(), 5);
        assert!(rendered.starts_with("#1 "));
        assert!(rendered.contains("#4 "));
    }

    #[test]
    fn test_simplified_view_collapses_chain() {
        let tree = y_tree();
        let graph = WeightedGraph::simplified(&tree).unwrap();
        let rendered = SimplifiedView {
            tree: &tree,
            graph: &graph,
        }
        .to_term_tree()
        .to_string();

        assert_eq!(rendered.lines().count(), 4);
        assert!(!rendered.contains("#2 "));
        assert!(rendered.contains("+2.000"));
    }

    #[test]
    fn test_long_chain_renders_as_single_branch() {
        let nodes: Vec<SwcNode> = (1..=2_000)
            .map(|i| {
                SwcNode::new(
                    i,
                    Point3::new(i as f64, 0.0, 0.0),
                    (i > 1).then_some(i - 1),
                )
            })
            .collect();
        let tree = build_tree(&nodes).unwrap();
        let rendered = tree.to_term_tree();
        assert_eq!(rendered.leaves.len(), 1);
    }

    #[test]
    fn test_deep_chain_is_cut_at_render_depth() {
        let tree = build_tree(&crate::util::testing::chain(20_000)).unwrap();

        let rendered = tree.to_term_tree().to_string();

        assert_eq!(rendered.lines().count(), MAX_RENDER_DEPTH + 2);
        assert!(rendered.starts_with("#1 "));
        assert!(rendered.contains(&format!("#{} ", MAX_RENDER_DEPTH + 1)));
        assert!(!rendered.contains(&format!("#{} ", MAX_RENDER_DEPTH + 2)));
        assert!(rendered.contains(&format!("... {} more nodes", 20_000 - MAX_RENDER_DEPTH - 1)));
    }

    #[test]
    fn test_deep_comb_simplified_view_is_cut_at_render_depth() {
        let mut nodes = crate::util::testing::chain(5_000);
        let side: Vec<SwcNode> = (1..=5_000)
            .map(|i| SwcNode::new(10_000 + i, Point3::new((i - 1) as f64, 1.0, 0.0), Some(i)))
            .collect();
        nodes.extend(side);
        let tree = build_tree(&nodes).unwrap();
        let graph = WeightedGraph::simplified(&tree).unwrap();

        let rendered = SimplifiedView {
            tree: &tree,
            graph: &graph,
        }
        .to_term_tree()
        .to_string();

        assert!(rendered.starts_with("#1 "));
        assert!(rendered.contains("more nodes"));
    }
}
