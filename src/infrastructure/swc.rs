//! SWC reconstruction format
//!
//! One node per line: `id type x y z radius parent`, whitespace separated.
//! `#` starts a comment; a negative parent id marks the root.

use thiserror::Error;
use tracing::{instrument, trace};

use crate::domain::{Point3, SwcNode, SwcType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwcError {
    #[error("line {line}: expected 7 fields (id type x y z radius parent), found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Parse SWC text into nodes, preserving line order.
#[instrument(level = "debug", skip(content), fields(bytes = content.len()))]
pub fn parse_swc(content: &str) -> Result<Vec<SwcNode>, SwcError> {
    let mut nodes = Vec::new();

    for (i, raw) in content.lines().enumerate() {
        let line = i + 1;
        let data = raw.split('#').next().unwrap_or("").trim();
        if data.is_empty() {
            continue;
        }

        let fields: Vec<&str> = data.split_whitespace().collect();
        if fields.len() < 7 {
            return Err(SwcError::FieldCount {
                line,
                found: fields.len(),
            });
        }

        let id = parse_id(line, "id", fields[0])?;
        let kind = i32::try_from(parse_id(line, "type", fields[1])?).map_err(|_| {
            SwcError::InvalidField {
                line,
                field: "type",
                value: fields[1].to_string(),
            }
        })?;
        let x = parse_coord(line, "x", fields[2])?;
        let y = parse_coord(line, "y", fields[3])?;
        let z = parse_coord(line, "z", fields[4])?;
        let radius = parse_coord(line, "radius", fields[5])?;
        let parent = parse_id(line, "parent", fields[6])?;

        trace!("node {id} parent {parent}");
        nodes.push(SwcNode {
            id,
            kind: SwcType::from_code(kind),
            position: Point3::new(x, y, z),
            radius,
            parent: (parent >= 0).then_some(parent),
        });
    }

    Ok(nodes)
}

/// Integer field; integral floats such as `-1.0` are accepted.
fn parse_id(line: usize, field: &'static str, value: &str) -> Result<i64, SwcError> {
    let invalid = || SwcError::InvalidField {
        line,
        field,
        value: value.to_string(),
    };
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    let v = value.parse::<f64>().map_err(|_| invalid())?;
    if v.is_finite() && v.fract() == 0.0 {
        Ok(v as i64)
    } else {
        Err(invalid())
    }
}

fn parse_coord(line: usize, field: &'static str, value: &str) -> Result<f64, SwcError> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(SwcError::InvalidField {
            line,
            field,
            value: value.to_string(),
        }),
    }
}

/// Render nodes as SWC text with `header` as leading comment lines.
pub fn format_swc(nodes: &[SwcNode], header: &str) -> String {
    let mut out = String::new();
    for line in header.lines() {
        out.push_str("# ");
        out.push_str(line);
        out.push('\n');
    }
    for node in nodes {
        out.push_str(&format!(
            "{} {} {} {} {} {} {}\n",
            node.id,
            node.kind.code(),
            node.position.x,
            node.position.y,
            node.position.z,
            node.radius,
            node.parent.unwrap_or(-1)
        ));
    }
    out
}

/// Relink a path as a standalone chain (ids 1..n), translated by `offset`.
pub fn as_chain(path: &[SwcNode], offset: &Point3) -> Vec<SwcNode> {
    path.iter()
        .enumerate()
        .map(|(i, node)| {
            let id = i as i64 + 1;
            SwcNode {
                id,
                kind: node.kind,
                position: node.position.translated(offset),
                radius: node.radius,
                parent: (i > 0).then_some(id - 1),
            }
        })
        .collect()
}
