//! Driver-level failures.
//!
//! Semantic and syntax problems are not errors at this level; they live
//! in the per-module diagnostic queues and only decide the exit code.

use thiserror::Error;

use refu_analysis::{AnalysisError, CyclicDependency};
use refu_rir::RirError;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("imported module '{importer}' -> '{name}' was not found")]
    ModuleNotFound { importer: String, name: String },

    #[error("module '{0}' is empty")]
    EmptyModule(String),

    #[error(transparent)]
    Cycle(#[from] CyclicDependency),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Rir(#[from] RirError),

    #[error("RIR verification failed for module '{module}': {reason}")]
    Verification { module: String, reason: String },
}
