//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A position in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn translated(&self, offset: &Point3) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.z + offset.z)
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// SWC compartment type of a traced node.
///
/// Codes 0-4 follow the SWC convention; anything else is kept as `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwcType {
    Undefined,
    Soma,
    Axon,
    Dendrite,
    ApicalDendrite,
    Custom(i32),
}

impl SwcType {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => SwcType::Undefined,
            1 => SwcType::Soma,
            2 => SwcType::Axon,
            3 => SwcType::Dendrite,
            4 => SwcType::ApicalDendrite,
            other => SwcType::Custom(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            SwcType::Undefined => 0,
            SwcType::Soma => 1,
            SwcType::Axon => 2,
            SwcType::Dendrite => 3,
            SwcType::ApicalDendrite => 4,
            SwcType::Custom(code) => *code,
        }
    }
}

impl fmt::Display for SwcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwcType::Undefined => write!(f, "undefined"),
            SwcType::Soma => write!(f, "soma"),
            SwcType::Axon => write!(f, "axon"),
            SwcType::Dendrite => write!(f, "dendrite"),
            SwcType::ApicalDendrite => write!(f, "apical"),
            SwcType::Custom(code) => write!(f, "custom:{code}"),
        }
    }
}

impl FromStr for SwcType {
    type Err = String;

    /// Accepts compartment names (`axon`, `dendrite`, ...) or raw SWC codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "undefined" => Ok(SwcType::Undefined),
            "soma" => Ok(SwcType::Soma),
            "axon" => Ok(SwcType::Axon),
            "dendrite" | "basal" | "basal_dendrite" => Ok(SwcType::Dendrite),
            "apical" | "apical_dendrite" => Ok(SwcType::ApicalDendrite),
            other => other
                .parse::<i32>()
                .map(SwcType::from_code)
                .map_err(|_| format!("unknown compartment: {s}")),
        }
    }
}

/// A traced point of a reconstruction, as read from one SWC line.
#[derive(Debug, Clone, PartialEq)]
pub struct SwcNode {
    pub id: i64,
    pub kind: SwcType,
    pub position: Point3,
    pub radius: f64,
    /// Parent id, `None` for the root
    pub parent: Option<i64>,
}

impl SwcNode {
    pub fn new(id: i64, position: Point3, parent: Option<i64>) -> Self {
        Self {
            id,
            kind: SwcType::Undefined,
            position,
            radius: 1.0,
            parent,
        }
    }

    pub fn with_kind(mut self, kind: SwcType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn distance_to(&self, other: &SwcNode) -> f64 {
        self.position.distance_to(&other.position)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for SwcNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} {}", self.id, self.kind, self.position)
    }
}

/// Keep only nodes of the given compartments.
///
/// Kept nodes whose parent was dropped become roots; the builder decides
/// whether the result is still a single tree.
pub fn filter_compartments(nodes: &[SwcNode], kinds: &[SwcType]) -> Vec<SwcNode> {
    if kinds.is_empty() {
        return nodes.to_vec();
    }
    let kept: std::collections::HashSet<i64> = nodes
        .iter()
        .filter(|n| kinds.contains(&n.kind))
        .map(|n| n.id)
        .collect();

    nodes
        .iter()
        .filter(|n| kept.contains(&n.id))
        .map(|n| {
            let mut node = n.clone();
            if let Some(parent) = node.parent {
                if !kept.contains(&parent) {
                    node.parent = None;
                }
            }
            node
        })
        .collect()
}
