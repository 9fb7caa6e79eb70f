//! Type expressions.
//!
//! Precedence, loosest first: implication `->`, sum `|`, product `,`.
//! So `radius:f32 | width:f32, height:f32` is a sum whose second operand
//! is the product `width:f32, height:f32`.

use refu_ir::{AstKind, NodeId, TokenKind, TypeOpKind};

use crate::Parser;

/// Entry point: parse a full type expression.
pub(crate) fn parse_type_expr(p: &mut Parser<'_>) -> Option<NodeId> {
    parse_implication(p)
}

fn parse_implication(p: &mut Parser<'_>) -> Option<NodeId> {
    let left = parse_sum(p)?;
    if p.cursor.eat(TokenKind::Arrow) {
        // right associative
        let right = parse_implication(p)?;
        let span = p.ast.span(left).merge(p.ast.span(right));
        return Some(p.ast.add(
            AstKind::TypeOperator {
                op: TypeOpKind::Implication,
            },
            span,
            vec![left, right],
        ));
    }
    Some(left)
}

fn parse_sum(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_product(p)?;
    while p.cursor.eat(TokenKind::Pipe) {
        let right = parse_product(p)?;
        let span = p.ast.span(left).merge(p.ast.span(right));
        left = p.ast.add(
            AstKind::TypeOperator {
                op: TypeOpKind::Sum,
            },
            span,
            vec![left, right],
        );
    }
    Some(left)
}

fn parse_product(p: &mut Parser<'_>) -> Option<NodeId> {
    let mut left = parse_term(p)?;
    while p.cursor.eat(TokenKind::Comma) {
        let right = parse_term(p)?;
        let span = p.ast.span(left).merge(p.ast.span(right));
        left = p.ast.add(
            AstKind::TypeOperator {
                op: TypeOpKind::Product,
            },
            span,
            vec![left, right],
        );
    }
    Some(left)
}

/// A leaf `name:type`, a bare type name, or a parenthesized expression.
fn parse_term(p: &mut Parser<'_>) -> Option<NodeId> {
    if p.cursor.eat(TokenKind::OParen) {
        let inner = parse_type_expr(p)?;
        if !p.cursor.eat(TokenKind::CParen) {
            p.error_here("expected ')' in type expression");
            return None;
        }
        return Some(inner);
    }

    let Some((name, span)) = p.cursor.eat_identifier() else {
        p.error_here("expected a type name");
        return None;
    };

    if p.cursor.eat(TokenKind::Colon) {
        let inner = parse_term(p)?;
        let span = span.merge(p.ast.span(inner));
        return Some(p.ast.add(AstKind::TypeLeaf { name }, span, vec![inner]));
    }

    Some(p.ast.add(AstKind::Identifier { name }, span, vec![]))
}
