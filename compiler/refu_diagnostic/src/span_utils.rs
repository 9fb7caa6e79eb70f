//! Byte-offset to line/column conversion.

use refu_ir::Span;

/// A zero-based line/column position.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

/// Precomputed line-start offsets for one source file.
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in src.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        Self { line_starts }
    }

    /// The line/column of a byte offset.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        LineCol {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            col: offset - self.line_starts[line],
        }
    }

    /// Start and inclusive-end positions of a span.
    ///
    /// The end position is the last byte covered by the span, matching how
    /// token locations are reported.
    pub fn span_location(&self, span: Span) -> (LineCol, LineCol) {
        let start = self.line_col(span.start);
        let end = self.line_col(span.end.saturating_sub(1).max(span.start));
        (start, end)
    }

    /// The full text of the line containing `offset`.
    pub fn line_text<'a>(&self, src: &'a str, offset: u32) -> &'a str {
        let line = self.line_col(offset).line as usize;
        let start = self.line_starts[line] as usize;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(src.len(), |&next| next as usize);
        src[start..end].trim_end_matches('\n')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let idx = LineIndex::new("ab\ncde\n");
        assert_eq!(idx.line_col(0), LineCol { line: 0, col: 0 });
        assert_eq!(idx.line_col(1), LineCol { line: 0, col: 1 });
        assert_eq!(idx.line_col(3), LineCol { line: 1, col: 0 });
        assert_eq!(idx.line_col(5), LineCol { line: 1, col: 2 });
    }

    #[test]
    fn span_end_is_inclusive() {
        let idx = LineIndex::new("asd { }");
        let (start, end) = idx.span_location(Span::new(0, 3));
        assert_eq!(start, LineCol { line: 0, col: 0 });
        assert_eq!(end, LineCol { line: 0, col: 2 });
    }

    #[test]
    fn line_text_extracts_the_line() {
        let src = "first\nsecond\n";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_text(src, 8), "second");
    }
}
