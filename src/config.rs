//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/arborist/arborist.toml`
//! 3. Local config: `<project_dir>/.arborist.toml`
//! 4. Environment variables: `ARBORIST_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{DiameterMethod, Point3, SwcType, DEFAULT_TOLERANCE};

/// Longest-path export settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// Translation applied to exported paths (x, y, z)
    pub offset: [f64; 3],
    /// Directory receiving `<name>-longest-path.swc` files
    pub dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            offset: [10.0, 10.0, 0.0],
            dir: None,
        }
    }
}

impl ExportConfig {
    pub fn offset_point(&self) -> Point3 {
        Point3::new(self.offset[0], self.offset[1], self.offset[2])
    }
}

/// Raw export config for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawExportConfig {
    pub offset: Option<[f64; 3]>,
    pub dir: Option<PathBuf>,
}

/// Raw settings for intermediate parsing (Option = "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub method: Option<DiameterMethod>,
    pub tolerance: Option<f64>,
    pub compartments: Option<Vec<String>>,
    pub name_filter: Option<String>,
    pub recursive: Option<bool>,
    #[serde(default)]
    pub export: RawExportConfig,
}

/// Unified configuration for arborist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Diameter algorithm
    pub method: DiameterMethod,
    /// Relative tolerance when methods are cross-checked
    pub tolerance: f64,
    /// Compartments to keep (empty = whole reconstruction)
    pub compartments: Vec<String>,
    /// Regex on file names for batch measurement
    pub name_filter: Option<String>,
    /// Descend into subdirectories for batch measurement
    pub recursive: bool,
    pub export: ExportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            method: DiameterMethod::default(),
            tolerance: DEFAULT_TOLERANCE,
            compartments: vec![],
            name_filter: None,
            recursive: false,
            export: ExportConfig::default(),
        }
    }
}

/// Get the XDG config directory for arborist.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "arborist").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("arborist.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".arborist.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Parsed compartment filter.
    pub fn compartment_types(&self) -> Result<Vec<SwcType>, ApplicationError> {
        self.compartments
            .iter()
            .map(|c| {
                c.parse::<SwcType>()
                    .map_err(|message| ApplicationError::Config { message })
            })
            .collect()
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.export.dir {
            let raw = dir.to_string_lossy().to_string();
            let expanded = shellexpand::full(&raw)
                .map(|s| s.into_owned())
                .unwrap_or(raw);
            self.export.dir = Some(PathBuf::from(expanded));
        }
    }

    /// Merge overlay config onto self with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            method: overlay.method.unwrap_or(self.method),
            tolerance: overlay.tolerance.unwrap_or(self.tolerance),
            compartments: overlay
                .compartments
                .as_ref()
                .map(|o| Self::merge_array(&self.compartments, o))
                .unwrap_or_else(|| self.compartments.clone()),
            name_filter: overlay
                .name_filter
                .clone()
                .or_else(|| self.name_filter.clone()),
            recursive: overlay.recursive.unwrap_or(self.recursive),
            export: ExportConfig {
                offset: overlay.export.offset.unwrap_or(self.export.offset),
                dir: overlay
                    .export
                    .dir
                    .clone()
                    .or_else(|| self.export.dir.clone()),
            },
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let mut merged = self.merge_with(global);
        if let Some(compartments) = &global.compartments {
            merged.compartments = compartments.clone();
        }
        merged
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.arborist.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let global = global_config_path().filter(|p| p.exists());
        let settings = Self::load_from(global.as_deref(), project_dir)?;
        settings.with_env_overrides(Environment::with_prefix("ARBORIST"))
    }

    /// Defaults, then `global_path` (arrays REPLACE), then the local config of
    /// `project_dir` (arrays UNION). Environment variables are not consulted.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            debug!("global config: {}", global_path.display());
            let raw = load_raw_settings(global_path)?;
            current = current.apply_global(&raw);
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply environment variables as explicit overrides (REPLACE).
    pub fn with_env_overrides(mut self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                env.separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("compartments"),
            )
            .build()
            .map_err(config_err)?;

        if let Some(val) = present(config.get_string("method"))? {
            self.method = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Some(val) = present(config.get_float("tolerance"))? {
            self.tolerance = val;
        }
        if let Some(val) = present(config.get::<Vec<String>>("compartments"))? {
            self.compartments = val;
        }
        if let Some(val) = present(config.get_string("name_filter"))? {
            self.name_filter = Some(val);
        }
        if let Some(val) = present(config.get_bool("recursive"))? {
            self.recursive = val;
        }
        if let Some(val) = present(config.get_string("export.dir"))? {
            self.export.dir = Some(PathBuf::from(val));
        }

        self.expand_paths();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(ApplicationError::Config {
                message: format!("tolerance must be a non-negative number, got {}", self.tolerance),
            });
        }
        if let Some(filter) = &self.name_filter {
            regex::Regex::new(filter).map_err(|e| ApplicationError::Config {
                message: format!("invalid name_filter: {e}"),
            })?;
        }
        self.compartment_types()?;
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# arborist configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/arborist/arborist.toml  (defines your baseline)
#   Local:  <project>/.arborist.toml          (project-specific additions)
#   Env:    ARBORIST_* environment variables  (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global; "!item" removes an inherited item:
#     compartments = ["dendrite", "!axon"]

# Diameter algorithm: walk | memoized | shortest-path | all
# method = "memoized"

# Relative tolerance when methods are cross-checked
# tolerance = 1e-9

# Compartments to analyse (empty = whole reconstruction)
# compartments = ["axon"]

# Batch measurement: regex on file names, descend into subdirectories
# name_filter = "AA0"
# recursive = false

[export]
# Translation applied to exported longest paths
# offset = [10.0, 10.0, 0.0]

# Directory for <name>-longest-path.swc files
# dir = "~/arborist/paths"
"#
        .to_string()
    }
}

/// An unset key is `None`; a value of the wrong type is an error.
fn present<T>(value: Result<T, ConfigError>) -> Result<Option<T>, ApplicationError> {
    match value {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(config_err(e)),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
