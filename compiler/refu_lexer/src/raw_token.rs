//! Raw token definition.
//!
//! The `RawToken` enum is the logos-derived tokenizer output before string
//! interning and final token conversion.

use logos::Logos;

/// Raw token from logos (before interning).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r"//[^\n]*")] // Skip line comments
pub(crate) enum RawToken {
    // Keywords
    #[token("fn")]
    Fn,
    #[token("type")]
    Type,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("let")]
    Let,
    #[token("return")]
    Return,
    #[token("import")]
    Import,
    #[token("foreign")]
    Foreign,

    // Punctuation
    #[token("{")]
    OCBrace,
    #[token("}")]
    CCBrace,
    #[token("(")]
    OParen,
    #[token(")")]
    CParen,
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,
    #[token("->")]
    Arrow,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""[^"\n]*""#)]
    String,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}
