use pretty_assertions::assert_eq;

use refu_diagnostic::{DiagnosticQueue, LineCol, LineIndex};
use refu_ir::{StringTable, TokenKind};

fn lex_all(src: &str) -> (Vec<refu_ir::Token>, StringTable, StringTable, DiagnosticQueue) {
    let mut idents = StringTable::new();
    let mut literals = StringTable::new();
    let mut diags = DiagnosticQueue::new();
    let tokens = crate::lex(src, &mut idents, &mut literals, &mut diags);
    (tokens, idents, literals, diags)
}

#[test]
fn identifier_and_braces() {
    let src = "asd { }";
    let (tokens, idents, _, diags) = lex_all(src);
    assert!(diags.is_empty());
    assert_eq!(tokens.len(), 3);

    let TokenKind::Identifier(id) = tokens[0].kind else {
        panic!("expected identifier, got {:?}", tokens[0].kind);
    };
    assert_eq!(idents.lookup(id), "asd");
    assert_eq!(tokens[1].kind, TokenKind::OCBrace);
    assert_eq!(tokens[2].kind, TokenKind::CCBrace);

    // locations: inclusive end positions on line 0
    let index = LineIndex::new(src);
    let (s0, e0) = index.span_location(tokens[0].span);
    assert_eq!(s0, LineCol { line: 0, col: 0 });
    assert_eq!(e0, LineCol { line: 0, col: 2 });
    let (s1, e1) = index.span_location(tokens[1].span);
    assert_eq!(s1, LineCol { line: 0, col: 4 });
    assert_eq!(e1, LineCol { line: 0, col: 4 });
    let (s2, e2) = index.span_location(tokens[2].span);
    assert_eq!(s2, LineCol { line: 0, col: 6 });
    assert_eq!(e2, LineCol { line: 0, col: 6 });
}

#[test]
fn keywords_are_not_identifiers() {
    let (tokens, ..) = lex_all("fn type if elif else let return import foreign");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::KwFn,
            TokenKind::KwType,
            TokenKind::KwIf,
            TokenKind::KwElif,
            TokenKind::KwElse,
            TokenKind::KwLet,
            TokenKind::KwReturn,
            TokenKind::KwImport,
            TokenKind::KwForeign,
        ]
    );
}

#[test]
fn numeric_literals() {
    let (tokens, ..) = lex_all("42 3.0");
    assert_eq!(tokens[0].kind, TokenKind::IntConstant(42));
    let TokenKind::FloatConstant(bits) = tokens[1].kind else {
        panic!("expected float");
    };
    assert_eq!(bits.value(), 3.0);
}

#[test]
fn multi_char_operators_win_over_prefixes() {
    let (tokens, ..) = lex_all("= == -> - < <= && |");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Assign,
            TokenKind::EqEq,
            TokenKind::Arrow,
            TokenKind::Minus,
            TokenKind::Lt,
            TokenKind::LtEq,
            TokenKind::AndAnd,
            TokenKind::Pipe,
        ]
    );
}

#[test]
fn string_literals_are_interned_without_quotes() {
    let (tokens, _, literals, _) = lex_all(r#""hello""#);
    let TokenKind::StringLiteral(id) = tokens[0].kind else {
        panic!("expected string literal");
    };
    assert_eq!(literals.lookup(id), "hello");
}

#[test]
fn comments_are_skipped() {
    let (tokens, ..) = lex_all("a // trailing comment\nb");
    assert_eq!(tokens.len(), 2);
}

#[test]
fn unknown_input_reports_and_continues() {
    let (tokens, _, _, diags) = lex_all("a ? b");
    assert_eq!(tokens.len(), 2);
    assert_eq!(diags.error_count(), 1);
}

#[test]
fn same_identifier_shares_one_interned_entry() {
    let (tokens, idents, ..) = lex_all("x x x");
    assert_eq!(idents.len(), 1);
    let ids: Vec<_> = tokens
        .iter()
        .map(|t| match t.kind {
            TokenKind::Identifier(id) => id,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(ids[0], ids[1]);
    assert_eq!(ids[1], ids[2]);
}
