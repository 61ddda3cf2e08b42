//! Root-to-tip diameter of a reconstruction.
//!
//! For a rooted directed tree the diameter is the longest shortest path
//! between the root and any tip. Three equivalent computations are offered:
//!
//! * [`diameter_by_walk`]: walk parent pointers from every tip to the root
//! * [`diameter_memoized`]: one pre-order pass propagating distance to root
//! * [`diameter_by_shortest_path`]: Dijkstra from the root over the weighted
//!   graph, also recovering the vertex sequence of the longest path

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use petgraph::algo::{astar, dijkstra};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::arena::{NodeId, TreeArena};
use crate::domain::builder::TreeResult;
use crate::domain::error::DomainError;
use crate::domain::graph::WeightedGraph;

/// Default relative tolerance when comparing results of different methods.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Longest root-to-tip path.
#[derive(Debug, Clone, PartialEq)]
pub struct LongestPath {
    pub max_distance: f64,
    /// Nodes from the root to the farthest tip
    pub path: Vec<NodeId>,
}

/// Which algorithm computes the diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiameterMethod {
    Walk,
    #[default]
    Memoized,
    ShortestPath,
    /// Run every method and require agreement
    All,
}

impl fmt::Display for DiameterMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiameterMethod::Walk => "walk",
            DiameterMethod::Memoized => "memoized",
            DiameterMethod::ShortestPath => "shortest-path",
            DiameterMethod::All => "all",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DiameterMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "walk" | "parent-pointer" => Ok(DiameterMethod::Walk),
            "memoized" | "memo" => Ok(DiameterMethod::Memoized),
            "shortest-path" | "dijkstra" => Ok(DiameterMethod::ShortestPath),
            "all" => Ok(DiameterMethod::All),
            other => Err(format!(
                "unknown method '{other}' (expected walk, memoized, shortest-path or all)"
            )),
        }
    }
}

/// Nodes that no other node declares as parent, in pre-order.
pub fn leaves(tree: &TreeArena) -> Vec<NodeId> {
    tree.leaf_nodes()
}

/// Summed edge weight from `node` up to the root.
#[instrument(level = "trace", skip(tree))]
pub fn distance_to_root(tree: &TreeArena, node: NodeId) -> f64 {
    let mut distance = 0.0;
    let mut current = tree.get_node(node);
    while let Some(n) = current {
        let Some(parent) = n.parent else {
            break;
        };
        distance += n.weight;
        current = tree.get_node(parent);
    }
    distance
}

/// Diameter by walking from every tip to the root.
///
/// Shared prefixes are re-walked for every tip: O(N * depth).
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn diameter_by_walk(tree: &TreeArena) -> TreeResult<f64> {
    if tree.root().is_none() {
        return Err(DomainError::EmptyTree);
    }
    let mut max_distance = 0.0;
    for tip in leaves(tree) {
        let distance = distance_to_root(tree, tip);
        if distance > max_distance {
            max_distance = distance;
        }
    }
    debug!("diameter by walk: {max_distance}");
    Ok(max_distance)
}

/// Diameter from a single pre-order pass: O(N).
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn diameter_memoized(tree: &TreeArena) -> TreeResult<f64> {
    Ok(longest_path_memoized(tree)?.max_distance)
}

/// Longest path from the memoized pass, recovered through parent pointers.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn longest_path_memoized(tree: &TreeArena) -> TreeResult<LongestPath> {
    let root = tree.root().ok_or(DomainError::EmptyTree)?;
    let mut to_root: HashMap<NodeId, f64> = HashMap::with_capacity(tree.len());
    let mut farthest = (root, 0.0);

    for (idx, node) in tree.iter() {
        let distance = node
            .parent
            .and_then(|p| to_root.get(&p))
            .map(|d| d + node.weight)
            .unwrap_or(0.0);
        to_root.insert(idx, distance);
        if node.children.is_empty() && (distance > farthest.1 || farthest.0 == root) {
            farthest = (idx, distance);
        }
    }

    let mut path = tree.path_to_root(farthest.0);
    path.reverse();
    debug!("diameter memoized: {}", farthest.1);
    Ok(LongestPath {
        max_distance: farthest.1,
        path,
    })
}

/// Diameter via Dijkstra from the root; also returns the root-to-tip path.
///
/// Ties are resolved in favour of the first tip in pre-order.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn diameter_by_shortest_path(tree: &TreeArena) -> TreeResult<LongestPath> {
    let graph = WeightedGraph::from_tree(tree)?;
    longest_shortest_path(&graph)
}

/// Longest root-to-tip shortest path on any weighted graph view.
pub fn longest_shortest_path(graph: &WeightedGraph) -> TreeResult<LongestPath> {
    let inner = graph.inner();
    let root = graph.root_index();
    let distances = dijkstra(inner, root, None, |edge| *edge.weight());

    let mut best: Option<(petgraph::graph::NodeIndex, f64)> = None;
    for tip in graph.tips() {
        let Some(vertex) = graph.index(tip) else {
            continue;
        };
        let Some(&distance) = distances.get(&vertex) else {
            continue;
        };
        trace!("tip {:?} at {distance}", tip);
        if best.map_or(true, |(_, d)| distance > d) {
            best = Some((vertex, distance));
        }
    }
    let (target, max_distance) = best.ok_or(DomainError::EmptyTree)?;

    let (_, vertices) = astar(
        inner,
        root,
        |vertex| vertex == target,
        |edge| *edge.weight(),
        |_| 0.0,
    )
    .ok_or_else(|| DomainError::NodeNotFound(format!("{:?}", graph.node_id(target))))?;

    Ok(LongestPath {
        max_distance,
        path: vertices.into_iter().map(|v| graph.node_id(v)).collect(),
    })
}

/// Weight of `path` as the sum of consecutive pairwise distances.
pub fn path_weight(tree: &TreeArena, path: &[NodeId]) -> f64 {
    path.windows(2)
        .filter_map(|pair| {
            let a = tree.get_node(pair[0])?;
            let b = tree.get_node(pair[1])?;
            Some(a.data.distance_to(&b.data))
        })
        .sum()
}

/// Relative comparison, absolute below magnitude 1.
pub fn agrees(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}
