//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (ReconstructionSource, PathSink)
//! but are themselves concrete structs, not traits.

mod analysis;

pub use analysis::{AnalysisService, BatchEntry, Measurement, MethodResult};
