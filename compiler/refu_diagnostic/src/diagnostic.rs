use std::fmt;

use refu_ir::Span;

/// Severity level for diagnostics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Info,
    Warning,
    SyntaxError,
    SemanticError,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::SyntaxError | Severity::SemanticError)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::SyntaxError => write!(f, "syntax error"),
            Severity::SemanticError => write!(f, "semantic error"),
        }
    }
}

/// One diagnostic message with the source span it annotates.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            span,
            message: message.into(),
        }
    }
}
