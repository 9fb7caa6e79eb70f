//! Top-level declarations: imports, type declarations, functions.

use refu_ir::{AstKind, NodeId, TokenKind};

use crate::{exprs, types, Parser};

/// Parse one top-level declaration. Returns `None` after reporting a
/// syntax error, in which case the caller synchronizes.
pub(crate) fn parse_top_level(p: &mut Parser<'_>) -> Option<NodeId> {
    match p.cursor.peek_kind() {
        Some(TokenKind::KwImport) => parse_import(p, false),
        Some(TokenKind::KwForeign) => {
            let start = p.cursor.current_span();
            p.cursor.advance();
            if p.cursor.check(TokenKind::KwImport) {
                parse_import(p, true)
            } else {
                p.diags
                    .syntax_error(start, "expected 'import' after 'foreign'");
                None
            }
        }
        Some(TokenKind::KwType) => parse_type_decl(p),
        Some(TokenKind::KwFn) => parse_fn(p),
        Some(other) => {
            p.error_here(format!(
                "expected a top-level declaration, found {}",
                other.describe()
            ));
            p.cursor.advance();
            None
        }
        None => None,
    }
}

fn parse_import(p: &mut Parser<'_>, foreign: bool) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'import'
    let Some((module, name_span)) = p.cursor.eat_identifier() else {
        p.error_here("expected module name after 'import'");
        return None;
    };
    Some(p.ast.add(
        AstKind::Import { module, foreign },
        start.merge(name_span),
        vec![],
    ))
}

/// `type Name { body }` with an optional `<T, ...>` generic list.
fn parse_type_decl(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'type'
    let Some((name, _)) = p.cursor.eat_identifier() else {
        p.error_here("expected type name after 'type'");
        return None;
    };

    let generic = parse_generic_decl(p);

    if !p.cursor.eat(TokenKind::OCBrace) {
        p.error_here("expected '{' to open the type body");
        return None;
    }
    let desc_inner = types::parse_type_expr(p)?;
    let desc = p
        .ast
        .add(AstKind::TypeDesc, p.ast.span(desc_inner), vec![desc_inner]);
    if !p.cursor.eat(TokenKind::CCBrace) {
        p.error_here("expected '}' to close the type body");
        return None;
    }

    let mut children = Vec::new();
    let has_generic = generic.is_some();
    if let Some(g) = generic {
        children.push(g);
    }
    children.push(desc);
    Some(p.ast.add(
        AstKind::TypeDecl { name, has_generic },
        start.merge(p.cursor.previous_span()),
        children,
    ))
}

/// `<T, U>` generic parameter list, if present.
fn parse_generic_decl(p: &mut Parser<'_>) -> Option<NodeId> {
    if !p.cursor.check(TokenKind::Lt) {
        return None;
    }
    let start = p.cursor.current_span();
    p.cursor.advance(); // '<'
    let mut params = Vec::new();
    loop {
        let Some((name, span)) = p.cursor.eat_identifier() else {
            p.error_here("expected generic parameter name");
            return None;
        };
        params.push(p.ast.add(AstKind::GenericParam { name }, span, vec![]));
        if !p.cursor.eat(TokenKind::Comma) {
            break;
        }
    }
    if !p.cursor.eat(TokenKind::Gt) {
        p.error_here("expected '>' to close the generic parameter list");
        return None;
    }
    Some(p.ast.add(
        AstKind::GenericDecl,
        start.merge(p.cursor.previous_span()),
        params,
    ))
}

/// `fn name(args) -> ret { body }`.
///
/// A function without a body block is a bare declaration: it names an
/// external function that participates in name and type resolution but
/// has no RIR lowering.
fn parse_fn(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'fn'
    let Some((name, _)) = p.cursor.eat_identifier() else {
        p.error_here("expected function name after 'fn'");
        return None;
    };

    let generic = parse_generic_decl(p);

    if !p.cursor.eat(TokenKind::OParen) {
        p.error_here("expected '(' after the function name");
        return None;
    }
    let args = if p.cursor.check(TokenKind::CParen) {
        None
    } else {
        let inner = types::parse_type_expr(p)?;
        Some(p.ast.add(AstKind::TypeDesc, p.ast.span(inner), vec![inner]))
    };
    if !p.cursor.eat(TokenKind::CParen) {
        p.error_here("expected ')' after the function arguments");
        return None;
    }

    let ret = if p.cursor.eat(TokenKind::Arrow) {
        let inner = types::parse_type_expr(p)?;
        Some(p.ast.add(AstKind::TypeDesc, p.ast.span(inner), vec![inner]))
    } else {
        None
    };

    let mut children = Vec::new();
    let has_generic = generic.is_some();
    let has_args = args.is_some();
    let has_ret = ret.is_some();
    children.extend(generic);
    children.extend(args);
    children.extend(ret);
    let decl = p.ast.add(
        AstKind::FnDecl {
            name,
            has_generic,
            has_args,
            has_ret,
            args_num: 0,
        },
        start.merge(p.cursor.previous_span()),
        children,
    );

    if p.cursor.check(TokenKind::OCBrace) {
        let body = exprs::parse_block(p)?;
        let span = p.ast.span(decl).merge(p.ast.span(body));
        Some(p.ast.add(AstKind::FnImpl, span, vec![decl, body]))
    } else {
        Some(decl)
    }
}
