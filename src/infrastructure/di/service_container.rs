//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::AnalysisService;
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::traits::{PathSink, ReconstructionSource, SwcFileSink, SwcFileSource};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    pub analysis: AnalysisService,
}

impl ServiceContainer {
    /// Create a new service container from loaded settings.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let settings = Arc::new(settings);
        let analysis = AnalysisService::new(Arc::clone(&settings))?;

        Ok(Self { settings, analysis })
    }

    /// Reconstruction source for an SWC file.
    pub fn source(&self, path: &Path) -> Box<dyn ReconstructionSource> {
        Box::new(SwcFileSource::new(path))
    }

    /// Path sink writing to `out`, translated by the configured offset.
    pub fn sink(&self, out: PathBuf) -> Box<dyn PathSink> {
        Box::new(SwcFileSink::new(out, self.settings.export.offset_point()))
    }
}
