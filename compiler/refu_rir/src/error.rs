//! RIR build failures.

use std::fmt;

/// Lowering failure. Unlike semantic errors these abort the module's
/// compilation; the driver reports them and moves on to modules that do
/// not depend on this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RirError {
    /// The module carries semantic errors; the builder refuses to run.
    SemanticErrorsPresent { module: String },
    /// An invariant the typecheck established did not hold during
    /// lowering.
    Internal(String),
}

impl fmt::Display for RirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RirError::SemanticErrorsPresent { module } => {
                write!(f, "module '{module}' has semantic errors; no RIR was built")
            }
            RirError::Internal(msg) => write!(f, "internal error during RIR build: {msg}"),
        }
    }
}

impl std::error::Error for RirError {}
