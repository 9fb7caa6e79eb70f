//! Cooked lexer output.
//!
//! A `Token` pairs a [`TokenKind`] with the byte [`Span`] it was read from.
//! Identifier and string-literal payloads are already interned; numeric
//! payloads are parsed.

use std::fmt;

use crate::{Span, StrId};

/// An f64 stored as its bit pattern, keeping the token `Eq`/`Hash`.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct FloatBits(u64);

impl FloatBits {
    #[inline]
    pub fn new(v: f64) -> Self {
        Self(v.to_bits())
    }

    #[inline]
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl fmt::Debug for FloatBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value())
    }
}

/// Token kind with payload.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TokenKind {
    // Payload-carrying
    Identifier(StrId),
    IntConstant(i64),
    FloatConstant(FloatBits),
    StringLiteral(StrId),

    // Keywords
    KwFn,
    KwType,
    KwIf,
    KwElif,
    KwElse,
    KwLet,
    KwReturn,
    KwImport,
    KwForeign,

    // Punctuation
    OCBrace,
    CCBrace,
    OParen,
    CParen,
    Comma,
    Pipe,
    Arrow,
    Colon,
    Semicolon,

    // Operators
    Assign,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    AndAnd,
    OrOr,
}

impl TokenKind {
    /// Human-readable name for parser error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier(_) => "identifier",
            TokenKind::IntConstant(_) => "integer constant",
            TokenKind::FloatConstant(_) => "float constant",
            TokenKind::StringLiteral(_) => "string literal",
            TokenKind::KwFn => "'fn'",
            TokenKind::KwType => "'type'",
            TokenKind::KwIf => "'if'",
            TokenKind::KwElif => "'elif'",
            TokenKind::KwElse => "'else'",
            TokenKind::KwLet => "'let'",
            TokenKind::KwReturn => "'return'",
            TokenKind::KwImport => "'import'",
            TokenKind::KwForeign => "'foreign'",
            TokenKind::OCBrace => "'{'",
            TokenKind::CCBrace => "'}'",
            TokenKind::OParen => "'('",
            TokenKind::CParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Pipe => "'|'",
            TokenKind::Arrow => "'->'",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Assign => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
        }
    }
}

/// One token: kind plus the byte span it covers.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// The lexer's output for one file.
pub type TokenList = Vec<Token>;
