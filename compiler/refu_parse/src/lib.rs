//! Recursive descent parser for refu.
//!
//! Consumes the cooked token list and produces a flat [`Ast`]. Syntax
//! errors go to the diagnostic queue; the parser synchronizes to the next
//! top-level declaration and keeps going, so one malformed function does
//! not hide errors in the rest of the module.

mod cursor;
mod decls;
mod exprs;
mod types;

#[cfg(test)]
mod tests;

use tracing::debug;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{Ast, AstKind, NodeId, Span, StringTable, TokenKind, TokenList};

pub(crate) use cursor::Cursor;

/// Parser state shared by the grammar modules.
pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) ast: Ast,
    #[allow(dead_code)]
    pub(crate) idents: &'a mut StringTable,
    pub(crate) diags: &'a mut DiagnosticQueue,
}

impl Parser<'_> {
    /// Report a syntax error at the current token.
    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        let span = self.cursor.current_span();
        self.diags.syntax_error(span, message);
    }

    /// Skip tokens until the next top-level declaration keyword.
    pub(crate) fn synchronize_top_level(&mut self) {
        while let Some(kind) = self.cursor.peek_kind() {
            match kind {
                TokenKind::KwFn | TokenKind::KwType | TokenKind::KwImport
                | TokenKind::KwForeign => return,
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }
}

/// Parse one module's token list into an AST.
///
/// Always returns a root node; on syntax errors the root contains the
/// declarations that did parse and the queue carries the messages.
pub fn parse_module(
    module_name: &str,
    tokens: &TokenList,
    idents: &mut StringTable,
    diags: &mut DiagnosticQueue,
) -> (Ast, NodeId) {
    debug!(module = module_name, tokens = tokens.len(), "parsing module");

    let name = match idents.add(module_name) {
        Ok(id) => id,
        Err(collision) => {
            // practically unreachable; surface it and carry on with the
            // colliding handle so parsing can still run
            diags.syntax_error(Span::DUMMY, collision.to_string());
            refu_ir::StrId::from_raw(collision.hash)
        }
    };

    let mut parser = Parser {
        cursor: Cursor::new(tokens),
        ast: Ast::new(),
        idents,
        diags,
    };

    let mut children = Vec::new();
    while !parser.cursor.at_end() {
        match decls::parse_top_level(&mut parser) {
            Some(id) => children.push(id),
            None => parser.synchronize_top_level(),
        }
    }

    let span = tokens
        .first()
        .map(|first| {
            tokens
                .last()
                .map_or(first.span, |last| first.span.merge(last.span))
        })
        .unwrap_or(Span::DUMMY);

    let mut ast = parser.ast;
    let root = ast.add(AstKind::Root { name }, span, children);
    (ast, root)
}
