//! arborist: tree diameter and morphometry of neuron reconstructions
//!
//! A reconstruction is a rooted tree of traced 3D points, usually stored as
//! SWC. The diameter reported here is the longest root-to-tip path weight,
//! where each edge weighs the Euclidean distance between parent and child.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
