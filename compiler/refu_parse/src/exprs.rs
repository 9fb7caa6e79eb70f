//! Value expressions, blocks, and statements.

use refu_ir::{AstKind, BinaryOpKind, Constant, NodeId, TokenKind};

use crate::{types, Parser};

/// `{ stmt* }`. Blocks introduce a scope.
pub(crate) fn parse_block(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    if !p.cursor.eat(TokenKind::OCBrace) {
        p.error_here("expected '{'");
        return None;
    }
    let mut stmts = Vec::new();
    while !p.cursor.check(TokenKind::CCBrace) {
        if p.cursor.at_end() {
            p.error_here("unclosed block");
            return None;
        }
        stmts.push(parse_statement(p)?);
        // statement separators are optional
        p.cursor.eat(TokenKind::Semicolon);
    }
    p.cursor.advance(); // '}'
    Some(p.ast.add(
        AstKind::Block,
        start.merge(p.cursor.previous_span()),
        stmts,
    ))
}

fn parse_statement(p: &mut Parser<'_>) -> Option<NodeId> {
    match p.cursor.peek_kind() {
        Some(TokenKind::KwLet) => parse_var_decl(p),
        Some(TokenKind::KwReturn) => parse_return(p),
        _ => parse_expr(p),
    }
}

/// `let name = init` or `let name:type = init`.
fn parse_var_decl(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'let'
    let Some((name, _)) = p.cursor.eat_identifier() else {
        p.error_here("expected variable name after 'let'");
        return None;
    };

    let ty = if p.cursor.eat(TokenKind::Colon) {
        let inner = types::parse_type_expr(p)?;
        Some(p.ast.add(AstKind::TypeDesc, p.ast.span(inner), vec![inner]))
    } else {
        None
    };

    if !p.cursor.eat(TokenKind::Assign) {
        p.error_here("expected '=' in variable declaration");
        return None;
    }
    let init = parse_expr(p)?;

    let mut children = Vec::new();
    let has_type = ty.is_some();
    children.extend(ty);
    children.push(init);
    Some(p.ast.add(
        AstKind::VarDecl { name, has_type },
        start.merge(p.ast.span(init)),
        children,
    ))
}

fn parse_return(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'return'
    // a return directly before '}' carries no value
    let children = if p.cursor.check(TokenKind::CCBrace) {
        vec![]
    } else {
        vec![parse_expr(p)?]
    };
    let span = children
        .last()
        .map_or(start, |&e| start.merge(p.ast.span(e)));
    Some(p.ast.add(AstKind::Return, span, children))
}

pub(crate) fn parse_expr(p: &mut Parser<'_>) -> Option<NodeId> {
    parse_assignment(p)
}

fn parse_assignment(p: &mut Parser<'_>) -> Option<NodeId> {
    let left = parse_logic_or(p)?;
    if p.cursor.eat(TokenKind::Assign) {
        // right associative
        let right = parse_assignment(p)?;
        return Some(binary(p, BinaryOpKind::Assign, left, right));
    }
    Some(left)
}

fn parse_logic_or(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_logic_and(p)?;
    while p.cursor.eat(TokenKind::OrOr) {
        let right = parse_logic_and(p)?;
        left = binary(p, BinaryOpKind::LogicOr, left, right);
    }
    Some(left)
}

fn parse_logic_and(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_equality(p)?;
    while p.cursor.eat(TokenKind::AndAnd) {
        let right = parse_equality(p)?;
        left = binary(p, BinaryOpKind::LogicAnd, left, right);
    }
    Some(left)
}

fn parse_equality(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_relational(p)?;
    loop {
        let op = match p.cursor.peek_kind() {
            Some(TokenKind::EqEq) => BinaryOpKind::Eq,
            Some(TokenKind::NotEq) => BinaryOpKind::Ne,
            _ => break,
        };
        p.cursor.advance();
        let right = parse_relational(p)?;
        left = binary(p, op, left, right);
    }
    Some(left)
}

fn parse_relational(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_additive(p)?;
    loop {
        let op = match p.cursor.peek_kind() {
            Some(TokenKind::Lt) => BinaryOpKind::Lt,
            Some(TokenKind::Gt) => BinaryOpKind::Gt,
            Some(TokenKind::LtEq) => BinaryOpKind::Le,
            Some(TokenKind::GtEq) => BinaryOpKind::Ge,
            _ => break,
        };
        p.cursor.advance();
        let right = parse_additive(p)?;
        left = binary(p, op, left, right);
    }
    Some(left)
}

fn parse_additive(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_multiplicative(p)?;
    loop {
        let op = match p.cursor.peek_kind() {
            Some(TokenKind::Plus) => BinaryOpKind::Add,
            Some(TokenKind::Minus) => BinaryOpKind::Sub,
            _ => break,
        };
        p.cursor.advance();
        let right = parse_multiplicative(p)?;
        left = binary(p, op, left, right);
    }
    Some(left)
}

fn parse_multiplicative(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_primary(p)?;
    loop {
        let op = match p.cursor.peek_kind() {
            Some(TokenKind::Star) => BinaryOpKind::Mul,
            Some(TokenKind::Slash) => BinaryOpKind::Div,
            _ => break,
        };
        p.cursor.advance();
        let right = parse_primary(p)?;
        left = binary(p, op, left, right);
    }
    Some(left)
}

fn binary(p: &mut Parser<'_>, op: BinaryOpKind, left: NodeId, right: NodeId) -> NodeId {
    let span = p.ast.span(left).merge(p.ast.span(right));
    p.ast
        .add(AstKind::BinaryOp { op }, span, vec![left, right])
}

fn parse_primary(p: &mut Parser<'_>) -> Option<NodeId> {
    match p.cursor.peek() {
        Some(tok) => match tok.kind {
            TokenKind::IntConstant(v) => {
                p.cursor.advance();
                Some(p.ast.add(
                    AstKind::ConstantNum {
                        value: Constant::Int(v),
                    },
                    tok.span,
                    vec![],
                ))
            }
            TokenKind::FloatConstant(bits) => {
                p.cursor.advance();
                Some(p.ast.add(
                    AstKind::ConstantNum {
                        value: Constant::Float(bits),
                    },
                    tok.span,
                    vec![],
                ))
            }
            TokenKind::StringLiteral(id) => {
                p.cursor.advance();
                Some(p.ast.add(AstKind::StrLit { id }, tok.span, vec![]))
            }
            TokenKind::Identifier(name) => {
                p.cursor.advance();
                if p.cursor.eat(TokenKind::OParen) {
                    let mut args = Vec::new();
                    if !p.cursor.check(TokenKind::CParen) {
                        loop {
                            args.push(parse_expr(p)?);
                            if !p.cursor.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    if !p.cursor.eat(TokenKind::CParen) {
                        p.error_here("expected ')' after call arguments");
                        return None;
                    }
                    let span = tok.span.merge(p.cursor.previous_span());
                    Some(p.ast.add(AstKind::FnCall { name }, span, args))
                } else {
                    Some(p.ast.add(AstKind::Identifier { name }, tok.span, vec![]))
                }
            }
            TokenKind::OParen => {
                p.cursor.advance();
                let inner = parse_expr(p)?;
                if !p.cursor.eat(TokenKind::CParen) {
                    p.error_here("expected ')'");
                    return None;
                }
                Some(inner)
            }
            TokenKind::KwIf => parse_if(p),
            TokenKind::OCBrace => parse_block(p),
            other => {
                p.error_here(format!("expected an expression, found {}", other.describe()));
                None
            }
        },
        None => {
            p.error_here("expected an expression, found end of input");
            None
        }
    }
}

/// `if cond { } elif cond { } else { }`.
///
/// `elif` arms become nested if-expressions in the else slot, so the rest
/// of the pipeline only ever sees two-way conditionals.
fn parse_if(p: &mut Parser<'_>) -> Option<NodeId> {
    let start = p.cursor.current_span();
    p.cursor.advance(); // 'if' or 'elif'
    let cond = parse_expr(p)?;
    let then_block = parse_block(p)?;

    let else_node = if p.cursor.check(TokenKind::KwElif) {
        Some(parse_if(p)?)
    } else if p.cursor.eat(TokenKind::KwElse) {
        Some(parse_block(p)?)
    } else {
        None
    };

    let mut children = vec![cond, then_block];
    children.extend(else_node);
    let end = children
        .last()
        .map_or(start, |&last| start.merge(p.ast.span(last)));
    Some(p.ast.add(AstKind::IfExpr, end, children))
}
