//! I/O boundary traits for testability
//!
//! The analysis service only sees a source of traced nodes and a sink for the
//! longest path; file-backed and in-memory implementations live here.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, instrument};

use crate::domain::{Point3, SwcNode};
use crate::infrastructure::swc::{as_chain, format_swc, parse_swc};

/// Supplies the nodes of one reconstruction.
pub trait ReconstructionSource: Send + Sync {
    /// Human-readable name (file path, cell id, ...).
    fn label(&self) -> String;

    /// Load all nodes. Parse failures surface as `InvalidData`.
    fn load(&self) -> io::Result<Vec<SwcNode>>;
}

/// Receives the longest path of a reconstruction, root first.
pub trait PathSink: Send + Sync {
    fn accept(&self, label: &str, path: &[SwcNode]) -> io::Result<()>;
}

// ============================================================
// FILE IMPLEMENTATIONS
// ============================================================

/// Reconstruction stored as an SWC file.
#[derive(Debug, Clone)]
pub struct SwcFileSource {
    path: PathBuf,
}

impl SwcFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReconstructionSource for SwcFileSource {
    fn label(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> io::Result<Vec<SwcNode>> {
        let content = std::fs::read_to_string(&self.path)?;
        let nodes =
            parse_swc(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!("loaded {} nodes", nodes.len());
        Ok(nodes)
    }
}

/// Writes the path as a standalone SWC chain, translated by `offset`.
///
/// The offset keeps an overlaid path from hiding the underlying reconstruction.
#[derive(Debug, Clone)]
pub struct SwcFileSink {
    path: PathBuf,
    offset: Point3,
}

impl SwcFileSink {
    pub fn new(path: impl Into<PathBuf>, offset: Point3) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PathSink for SwcFileSink {
    #[instrument(level = "debug", skip(self, path), fields(out = %self.path.display(), nodes = path.len()))]
    fn accept(&self, label: &str, path: &[SwcNode]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let header = format!(
            "longest root-to-tip path of {label}\noffset {} {} {}",
            self.offset.x, self.offset.y, self.offset.z
        );
        let content = format_swc(&as_chain(path, &self.offset), &header);
        std::fs::write(&self.path, content)
    }
}

// ============================================================
// IN-MEMORY IMPLEMENTATIONS
// ============================================================

/// Fixed node list, e.g. for tests or programmatically built trees.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    label: String,
    nodes: Vec<SwcNode>,
}

impl InMemorySource {
    pub fn new(label: impl Into<String>, nodes: Vec<SwcNode>) -> Self {
        Self {
            label: label.into(),
            nodes,
        }
    }
}

impl ReconstructionSource for InMemorySource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn load(&self) -> io::Result<Vec<SwcNode>> {
        Ok(self.nodes.clone())
    }
}

/// Collects accepted paths.
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<(String, Vec<SwcNode>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(String, Vec<SwcNode>)> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl PathSink for MemorySink {
    fn accept(&self, label: &str, path: &[SwcNode]) -> io::Result<()> {
        let mut guard = self
            .received
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        guard.push((label.to_string(), path.to_vec()));
        Ok(())
    }
}
