//! Reconstruction analysis service
//!
//! Loads a reconstruction from a [`ReconstructionSource`], optionally keeps only
//! some compartments, builds the tree and measures it. The longest root-to-tip
//! path can be handed to a [`PathSink`].
//!
//! Batch mode measures every `*.swc` file of a directory. Files are processed
//! in parallel; a failing file is reported in its [`BatchEntry`] and does not
//! abort the batch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    agrees, build_tree, diameter_by_shortest_path, diameter_by_walk, filter_compartments,
    longest_path_memoized, DiameterMethod, Morphometry, SwcNode, SwcType, TreeArena,
};
use crate::infrastructure::traits::{PathSink, ReconstructionSource, SwcFileSink, SwcFileSource};

const SWC_EXTENSION: &str = "swc";

/// Diameter as computed by one method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    pub method: DiameterMethod,
    pub diameter: f64,
}

/// Everything measured on one reconstruction.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub label: String,
    pub morphometry: Morphometry,
    /// Reported diameter
    pub diameter: f64,
    /// One entry per method that ran
    pub methods: Vec<MethodResult>,
    /// Nodes of the longest root-to-tip path, root first
    pub longest_path: Vec<SwcNode>,
}

/// Outcome for one file of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub result: ApplicationResult<Measurement>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reconstruction analysis service.
pub struct AnalysisService {
    settings: Arc<Settings>,
    compartments: Vec<SwcType>,
}

impl AnalysisService {
    /// Create a new analysis service.
    ///
    /// Fails if the configured compartments cannot be parsed.
    pub fn new(settings: Arc<Settings>) -> ApplicationResult<Self> {
        let compartments = settings.compartment_types()?;
        Ok(Self {
            settings,
            compartments,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load, filter and build the tree of a reconstruction.
    #[instrument(level = "debug", skip(self, source), fields(label = %source.label()))]
    pub fn load_tree(&self, source: &dyn ReconstructionSource) -> ApplicationResult<TreeArena> {
        let label = source.label();
        let nodes = source
            .load()
            .map_err(|e| ApplicationError::Load {
                label: label.clone(),
                source: e,
            })?;

        let nodes = if self.compartments.is_empty() {
            nodes
        } else {
            let kept = filter_compartments(&nodes, &self.compartments);
            debug!("compartment filter kept {} of {} nodes", kept.len(), nodes.len());
            kept
        };

        Ok(build_tree(&nodes)?)
    }

    /// Tip nodes of a reconstruction in pre-order.
    pub fn leaves(&self, source: &dyn ReconstructionSource) -> ApplicationResult<Vec<SwcNode>> {
        let tree = self.load_tree(source)?;
        Ok(tree.nodes_of(&tree.leaf_nodes()))
    }

    /// Measure one reconstruction with the configured method.
    #[instrument(level = "debug", skip(self, source), fields(label = %source.label(), method = %self.settings.method))]
    pub fn measure(&self, source: &dyn ReconstructionSource) -> ApplicationResult<Measurement> {
        let label = source.label();
        let tree = self.load_tree(source)?;
        self.measure_tree(label, &tree)
    }

    /// Measure an already built tree.
    pub fn measure_tree(&self, label: String, tree: &TreeArena) -> ApplicationResult<Measurement> {
        let morphometry = Morphometry::of(tree);
        let mut methods = Vec::new();

        let (diameter, path) = match self.settings.method {
            DiameterMethod::Walk => {
                let diameter = diameter_by_walk(tree)?;
                methods.push(MethodResult {
                    method: DiameterMethod::Walk,
                    diameter,
                });
                (diameter, longest_path_memoized(tree)?.path)
            }
            DiameterMethod::Memoized => {
                let longest = longest_path_memoized(tree)?;
                methods.push(MethodResult {
                    method: DiameterMethod::Memoized,
                    diameter: longest.max_distance,
                });
                (longest.max_distance, longest.path)
            }
            DiameterMethod::ShortestPath => {
                let longest = diameter_by_shortest_path(tree)?;
                methods.push(MethodResult {
                    method: DiameterMethod::ShortestPath,
                    diameter: longest.max_distance,
                });
                (longest.max_distance, longest.path)
            }
            DiameterMethod::All => {
                let walk = diameter_by_walk(tree)?;
                let memoized = longest_path_memoized(tree)?;
                let shortest = diameter_by_shortest_path(tree)?;
                methods.push(MethodResult {
                    method: DiameterMethod::Walk,
                    diameter: walk,
                });
                methods.push(MethodResult {
                    method: DiameterMethod::Memoized,
                    diameter: memoized.max_distance,
                });
                methods.push(MethodResult {
                    method: DiameterMethod::ShortestPath,
                    diameter: shortest.max_distance,
                });
                self.check_agreement(&label, &methods)?;
                (memoized.max_distance, memoized.path)
            }
        };

        debug!("{label}: diameter {diameter}");
        Ok(Measurement {
            label,
            morphometry,
            diameter,
            methods,
            longest_path: tree.nodes_of(&path),
        })
    }

    /// Every method must agree with the first one within tolerance.
    fn check_agreement(&self, label: &str, methods: &[MethodResult]) -> ApplicationResult<()> {
        let Some((first, rest)) = methods.split_first() else {
            return Ok(());
        };
        for other in rest {
            if !agrees(first.diameter, other.diameter, self.settings.tolerance) {
                return Err(ApplicationError::MethodsDisagree {
                    label: label.to_string(),
                    first: first.method,
                    first_value: first.diameter,
                    second: other.method,
                    second_value: other.diameter,
                    tolerance: self.settings.tolerance,
                });
            }
        }
        Ok(())
    }

    /// Hand the longest path of `measurement` to `sink`.
    #[instrument(level = "debug", skip_all, fields(label = %measurement.label))]
    pub fn export(&self, measurement: &Measurement, sink: &dyn PathSink) -> ApplicationResult<()> {
        sink.accept(&measurement.label, &measurement.longest_path)
            .map_err(|e| ApplicationError::Export {
                label: measurement.label.clone(),
                source: e,
            })
    }

    /// Measure and export in one step.
    pub fn measure_and_export(
        &self,
        source: &dyn ReconstructionSource,
        sink: &dyn PathSink,
    ) -> ApplicationResult<Measurement> {
        let measurement = self.measure(source)?;
        self.export(&measurement, sink)?;
        Ok(measurement)
    }

    /// Export file for `input` inside the configured export directory.
    ///
    /// With a `base` the input's subdirectories below it are mirrored, so
    /// same-named files of a recursive batch keep separate exports.
    pub fn export_path_for(&self, input: &Path, base: Option<&Path>) -> Option<PathBuf> {
        let dir = self.settings.export.dir.as_ref()?;
        let stem = input.file_stem()?.to_string_lossy();
        let subdir = base
            .and_then(|base| pathdiff::diff_paths(input, base))
            .and_then(|rel| rel.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        Some(
            dir.join(subdir)
                .join(format!("{stem}-longest-path.{SWC_EXTENSION}")),
        )
    }

    /// Reconstruction files below `dir` honouring `recursive` and `name_filter`.
    ///
    /// Sorted by path; an empty result is an error.
    #[instrument(level = "debug", skip(self))]
    pub fn collect_files(&self, dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
        std::fs::read_dir(dir).with_path_context("scan directory", dir)?;

        let filter = self
            .settings
            .name_filter
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ApplicationError::Config {
                message: format!("invalid name_filter: {e}"),
            })?;
        let max_depth = if self.settings.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(max_depth)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let at = e.path().unwrap_or(dir);
                    warn!("skipping {}: {}", at.display(), e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(SWC_EXTENSION))
            })
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                filter.as_ref().map_or(true, |re| re.is_match(&name))
            })
            .map(|e| e.into_path())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ApplicationError::NoFilesMatched(dir.to_path_buf()));
        }
        debug!("{} files matched", files.len());
        Ok(files)
    }

    /// Measure every matching file below `dir` in parallel.
    ///
    /// Results keep the sorted file order. With an export directory configured
    /// each longest path is written below it, mirroring the layout of `dir`.
    #[instrument(level = "debug", skip(self))]
    pub fn measure_directory(&self, dir: &Path) -> ApplicationResult<Vec<BatchEntry>> {
        let files = self.collect_files(dir)?;

        let entries: Vec<BatchEntry> = files
            .par_iter()
            .map(|path| {
                let source = SwcFileSource::new(path);
                let result = match self.export_path_for(path, Some(dir)) {
                    Some(out) => {
                        let sink = SwcFileSink::new(out, self.settings.export.offset_point());
                        self.measure_and_export(&source, &sink)
                    }
                    None => self.measure(&source),
                };
                if let Err(e) = &result {
                    warn!("{}: {}", path.display(), e);
                }
                BatchEntry {
                    path: path.clone(),
                    result,
                }
            })
            .collect();

        let failed = entries.iter().filter(|e| !e.is_ok()).count();
        info!(
            "measured {} reconstructions, {} failed",
            entries.len() - failed,
            failed
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point3;
    use crate::infrastructure::traits::InMemorySource;

    fn service(method: DiameterMethod) -> AnalysisService {
        let settings = Settings {
            method,
            ..Settings::default()
        };
        AnalysisService::new(Arc::new(settings)).unwrap()
    }

    fn l_shape() -> InMemorySource {
        InMemorySource::new(
            "l-shape",
            vec![
                SwcNode::new(1, Point3::new(0.0, 0.0, 0.0), None),
                SwcNode::new(2, Point3::new(3.0, 0.0, 0.0), Some(1)),
                SwcNode::new(3, Point3::new(3.0, 4.0, 0.0), Some(2)),
                SwcNode::new(4, Point3::new(0.0, 1.0, 0.0), Some(1)),
            ],
        )
    }

    #[test]
    fn test_every_method_reports_same_diameter() {
        for method in [
            DiameterMethod::Walk,
            DiameterMethod::Memoized,
            DiameterMethod::ShortestPath,
            DiameterMethod::All,
        ] {
            let m = service(method).measure(&l_shape()).unwrap();
            assert!((m.diameter - 7.0).abs() < 1e-12, "{method}: {}", m.diameter);
            let ids: Vec<i64> = m.longest_path.iter().map(|n| n.id).collect();
            assert_eq!(ids, vec![1, 2, 3], "{method}");
        }
    }

    #[test]
    fn test_all_records_three_methods() {
        let m = service(DiameterMethod::All).measure(&l_shape()).unwrap();
        assert_eq!(m.methods.len(), 3);
        assert_eq!(m.morphometry.tips, 2);
    }

    #[test]
    fn test_check_agreement_rejects_divergence() {
        let svc = service(DiameterMethod::All);
        let methods = vec![
            MethodResult {
                method: DiameterMethod::Walk,
                diameter: 1.0,
            },
            MethodResult {
                method: DiameterMethod::ShortestPath,
                diameter: 1.1,
            },
        ];
        let err = svc.check_agreement("x", &methods).unwrap_err();
        assert!(matches!(err, ApplicationError::MethodsDisagree { .. }));
    }

    #[test]
    fn test_export_path_for_uses_stem() {
        let mut settings = Settings::default();
        settings.export.dir = Some(PathBuf::from("/out"));
        let svc = AnalysisService::new(Arc::new(settings)).unwrap();
        assert_eq!(
            svc.export_path_for(Path::new("/data/cell-7.swc"), None),
            Some(PathBuf::from("/out/cell-7-longest-path.swc"))
        );
        assert_eq!(
            service(DiameterMethod::Walk).export_path_for(Path::new("a.swc"), None),
            None
        );
    }

    #[test]
    fn test_export_path_for_mirrors_subdirectories_below_base() {
        let mut settings = Settings::default();
        settings.export.dir = Some(PathBuf::from("/out"));
        let svc = AnalysisService::new(Arc::new(settings)).unwrap();
        let base = Path::new("/data");

        assert_eq!(
            svc.export_path_for(Path::new("/data/a/b/cell.swc"), Some(base)),
            Some(PathBuf::from("/out/a/b/cell-longest-path.swc"))
        );
        assert_eq!(
            svc.export_path_for(Path::new("/data/cell.swc"), Some(base)),
            Some(PathBuf::from("/out/cell-longest-path.swc"))
        );
    }
}
