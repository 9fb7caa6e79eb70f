//! Terminal rendering of diagnostics.
//!
//! Formats each message as `file:line:col: severity: message` followed by
//! the annotated source line and a caret underline.

use std::fmt::Write;

use crate::{Diagnostic, LineIndex};

/// Render one diagnostic against its source file.
pub fn render(d: &Diagnostic, file: &str, src: &str, index: &LineIndex) -> String {
    let (start, end) = index.span_location(d.span);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}:{}:{}: {}: {}",
        file,
        start.line + 1,
        start.col + 1,
        d.severity,
        d.message
    );
    let line = index.line_text(src, d.span.start);
    let _ = writeln!(out, "    {line}");
    let underline_len = if end.line == start.line {
        (end.col - start.col + 1) as usize
    } else {
        line.len().saturating_sub(start.col as usize).max(1)
    };
    let _ = writeln!(
        out,
        "    {}{}",
        " ".repeat(start.col as usize),
        "^".repeat(underline_len.max(1))
    );
    out
}

/// Render a whole queue's worth of messages in order.
pub fn render_all(diags: &[Diagnostic], file: &str, src: &str) -> String {
    let index = LineIndex::new(src);
    let mut out = String::new();
    for d in diags {
        out.push_str(&render(d, file, src, &index));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use pretty_assertions::assert_eq;
    use refu_ir::Span;

    #[test]
    fn renders_location_line_and_carets() {
        let src = "fn f(x:i32, x:i32) -> i32 { x }\n";
        let d = Diagnostic::new(
            Severity::SemanticError,
            Span::new(12, 13),
            "duplicate symbol 'x' in function parameters",
        );
        let out = render_all(std::slice::from_ref(&d), "dup.rf", src);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "dup.rf:1:13: semantic error: duplicate symbol 'x' in function parameters"
        );
        assert_eq!(lines[1], "    fn f(x:i32, x:i32) -> i32 { x }");
        assert_eq!(lines[2], "                ^");
    }
}
