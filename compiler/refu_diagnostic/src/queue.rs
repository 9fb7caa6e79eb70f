//! Ordered diagnostic collection.

use refu_ir::Span;

use crate::{Diagnostic, Severity};

/// Per-module diagnostic queue.
///
/// Messages are appended in encounter order and never reordered; the
/// driver flushes them to the terminal at the end of a pipeline stage.
#[derive(Default)]
pub struct DiagnosticQueue {
    messages: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, d: Diagnostic) {
        if d.severity.is_error() {
            self.error_count += 1;
        }
        self.messages.push(d);
    }

    pub fn info(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, span, message));
    }

    pub fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, span, message));
    }

    pub fn syntax_error(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::SyntaxError, span, message));
    }

    pub fn semantic_error(&mut self, span: Span, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::SemanticError, span, message));
    }

    pub fn messages(&self) -> &[Diagnostic] {
        &self.messages
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Take all queued messages, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        std::mem::take(&mut self.messages)
    }
}
