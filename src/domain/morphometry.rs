//! Basic morphometric summary of a reconstruction.

use crate::domain::arena::TreeArena;

#[derive(Debug, Clone, PartialEq)]
pub struct Morphometry {
    pub nodes: usize,
    pub tips: usize,
    pub branch_points: usize,
    /// Sum of all edge weights
    pub cable_length: f64,
    /// Nodes on the longest root-to-tip chain
    pub depth: usize,
}

impl Morphometry {
    pub fn of(tree: &TreeArena) -> Self {
        Self {
            nodes: tree.len(),
            tips: tree.leaf_nodes().len(),
            branch_points: tree.branch_points().len(),
            cable_length: tree.cable_length(),
            depth: tree.depth(),
        }
    }
}
