//! Lexer for the refu compiler.
//!
//! Runs the logos-derived raw tokenizer over a UTF-8 source buffer and
//! cooks the output into [`Token`]s: identifiers and string literals are
//! interned into the analyzer's string tables, numeric payloads are parsed.
//! Unknown input and interning failures are reported through the diagnostic
//! queue as syntax errors; lexing continues past them so one bad character
//! does not hide the rest of the file.

mod raw_token;

use logos::Logos;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{Span, StringTable, Token, TokenKind, TokenList};

use crate::raw_token::RawToken;

/// Tokenize one source file.
///
/// `idents` and `literals` are the owning analyzer's identifier and
/// string-literal tables.
pub fn lex(
    src: &str,
    idents: &mut StringTable,
    literals: &mut StringTable,
    diags: &mut DiagnosticQueue,
) -> TokenList {
    let mut tokens = TokenList::new();
    let mut lexer = RawToken::lexer(src);

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                diags.syntax_error(
                    span,
                    format!("unrecognized input {:?}", lexer.slice()),
                );
                continue;
            }
        };
        if let Some(kind) = cook(raw, lexer.slice(), span, idents, literals, diags) {
            tokens.push(Token::new(kind, span));
        }
    }

    tokens
}

/// Convert a raw token to a `TokenKind`, interning payloads.
fn cook(
    raw: RawToken,
    slice: &str,
    span: Span,
    idents: &mut StringTable,
    literals: &mut StringTable,
    diags: &mut DiagnosticQueue,
) -> Option<TokenKind> {
    let kind = match raw {
        RawToken::Ident => match idents.add(slice) {
            Ok(id) => TokenKind::Identifier(id),
            Err(collision) => {
                diags.syntax_error(span, collision.to_string());
                return None;
            }
        },
        RawToken::String => {
            // strip the surrounding quotes
            let content = &slice[1..slice.len() - 1];
            match literals.add(content) {
                Ok(id) => TokenKind::StringLiteral(id),
                Err(collision) => {
                    diags.syntax_error(span, collision.to_string());
                    return None;
                }
            }
        }
        RawToken::Int(v) => TokenKind::IntConstant(v),
        RawToken::Float(v) => TokenKind::FloatConstant(refu_ir::FloatBits::new(v)),

        RawToken::Fn => TokenKind::KwFn,
        RawToken::Type => TokenKind::KwType,
        RawToken::If => TokenKind::KwIf,
        RawToken::Elif => TokenKind::KwElif,
        RawToken::Else => TokenKind::KwElse,
        RawToken::Let => TokenKind::KwLet,
        RawToken::Return => TokenKind::KwReturn,
        RawToken::Import => TokenKind::KwImport,
        RawToken::Foreign => TokenKind::KwForeign,

        RawToken::OCBrace => TokenKind::OCBrace,
        RawToken::CCBrace => TokenKind::CCBrace,
        RawToken::OParen => TokenKind::OParen,
        RawToken::CParen => TokenKind::CParen,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Pipe => TokenKind::Pipe,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semicolon => TokenKind::Semicolon,

        RawToken::Assign => TokenKind::Assign,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::AndAnd => TokenKind::AndAnd,
        RawToken::OrOr => TokenKind::OrOr,
    };
    Some(kind)
}

#[cfg(test)]
mod tests;
