//! Hard analysis failures and the shared cancellation flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Driver-observable cancellation.
///
/// The analyzer polls this at every function boundary; there are no other
/// suspension points.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A failure that stops analysis of the module outright.
///
/// Soft (semantic) errors never take this path; they are aggregated in
/// the diagnostic queue instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The driver raised the cancellation flag.
    Cancelled,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Cancelled => write!(f, "analysis cancelled"),
        }
    }
}

impl std::error::Error for AnalysisError {}
