//! Domain layer: entities and tree algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod diameter;
pub mod entities;
pub mod error;
pub mod graph;
pub mod morphometry;

pub use arena::{NodeId, TreeArena, TreeNode};
pub use builder::{build_tree, TreeBuilder, TreeResult};
pub use diameter::{
    agrees, diameter_by_shortest_path, diameter_by_walk, diameter_memoized, distance_to_root,
    leaves, longest_path_memoized, path_weight, DiameterMethod, LongestPath, DEFAULT_TOLERANCE,
};
pub use entities::{filter_compartments, Point3, SwcNode, SwcType};
pub use error::DomainError;
pub use graph::WeightedGraph;
pub use morphometry::Morphometry;
