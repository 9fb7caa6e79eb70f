use pretty_assertions::assert_eq;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{Ast, AstKind, BinaryOpKind, NodeId, StringTable, TypeOpKind};

struct Parsed {
    ast: Ast,
    root: NodeId,
    idents: StringTable,
    diags: DiagnosticQueue,
}

fn parse(src: &str) -> Parsed {
    let mut idents = StringTable::new();
    let mut literals = StringTable::new();
    let mut diags = DiagnosticQueue::new();
    let tokens = refu_lexer::lex(src, &mut idents, &mut literals, &mut diags);
    let (ast, root) = crate::parse_module("test", &tokens, &mut idents, &mut diags);
    Parsed {
        ast,
        root,
        idents,
        diags,
    }
}

fn name_of(p: &Parsed, id: refu_ir::StrId) -> &str {
    p.idents.lookup(id)
}

#[test]
fn parses_arithmetic_function() {
    let p = parse("fn add(a:i32, b:i32) -> i32 { a + b }");
    assert!(p.diags.is_empty(), "{:?}", p.diags.messages());

    let &[fnimpl] = p.ast.children(p.root) else {
        panic!("expected one top-level declaration");
    };
    assert_eq!(p.ast.kind(fnimpl), AstKind::FnImpl);

    let decl = p.ast.fnimpl_decl(fnimpl);
    let AstKind::FnDecl { name, .. } = p.ast.kind(decl) else {
        panic!("expected FnDecl");
    };
    assert_eq!(name_of(&p, name), "add");

    // args: product of two leaves
    let args_desc = p.ast.fndecl_args(decl).expect("args");
    let args = p.ast.children(args_desc)[0];
    let AstKind::TypeOperator { op } = p.ast.kind(args) else {
        panic!("expected product operator");
    };
    assert_eq!(op, TypeOpKind::Product);
    let AstKind::TypeLeaf { name } = p.ast.kind(p.ast.children(args)[0]) else {
        panic!("expected leaf");
    };
    assert_eq!(name_of(&p, name), "a");

    // body: block with one binary op
    let body = p.ast.fnimpl_body(fnimpl);
    let &[expr] = p.ast.children(body) else {
        panic!("expected one statement");
    };
    assert_eq!(
        p.ast.kind(expr),
        AstKind::BinaryOp {
            op: BinaryOpKind::Add
        }
    );
}

#[test]
fn sum_binds_looser_than_product() {
    let p = parse("type Shape { radius:f32 | width:f32, height:f32 }");
    assert!(p.diags.is_empty(), "{:?}", p.diags.messages());

    let &[decl] = p.ast.children(p.root) else {
        panic!("expected one declaration");
    };
    let desc = p.ast.typedecl_desc(decl);
    let body = p.ast.children(desc)[0];
    let AstKind::TypeOperator { op } = p.ast.kind(body) else {
        panic!("expected operator body");
    };
    assert_eq!(op, TypeOpKind::Sum);

    // left operand: a single leaf
    let left = p.ast.children(body)[0];
    assert!(matches!(p.ast.kind(left), AstKind::TypeLeaf { .. }));

    // right operand: the product
    let right = p.ast.children(body)[1];
    assert_eq!(
        p.ast.kind(right),
        AstKind::TypeOperator {
            op: TypeOpKind::Product
        }
    );
}

#[test]
fn elif_desugars_to_nested_if() {
    let p = parse(
        "fn f(a:i32) -> nil { if a == 42 { g() } elif a == 50 { h() } else { k() } }",
    );
    assert!(p.diags.is_empty(), "{:?}", p.diags.messages());

    let fnimpl = p.ast.children(p.root)[0];
    let body = p.ast.fnimpl_body(fnimpl);
    let ifexpr = p.ast.children(body)[0];
    assert_eq!(p.ast.kind(ifexpr), AstKind::IfExpr);

    let (_, _, else_node) = p.ast.ifexpr_parts(ifexpr);
    let nested = else_node.expect("elif arm");
    assert_eq!(p.ast.kind(nested), AstKind::IfExpr);

    let (_, _, final_else) = p.ast.ifexpr_parts(nested);
    assert_eq!(p.ast.kind(final_else.expect("else arm")), AstKind::Block);
}

#[test]
fn let_without_annotation() {
    let p = parse("fn main() -> nil { let s = Shape(3.0, 4.0) }");
    assert!(p.diags.is_empty(), "{:?}", p.diags.messages());

    let fnimpl = p.ast.children(p.root)[0];
    let body = p.ast.fnimpl_body(fnimpl);
    let var = p.ast.children(body)[0];
    let AstKind::VarDecl { name, has_type } = p.ast.kind(var) else {
        panic!("expected VarDecl");
    };
    assert_eq!(name_of(&p, name), "s");
    assert!(!has_type);

    let init = p.ast.vardecl_init(var);
    let AstKind::FnCall { name } = p.ast.kind(init) else {
        panic!("expected constructor call");
    };
    assert_eq!(name_of(&p, name), "Shape");
    assert_eq!(p.ast.children(init).len(), 2);
}

#[test]
fn let_with_annotation() {
    let p = parse("fn main() -> nil { let x:i64 = 5 }");
    assert!(p.diags.is_empty());
    let fnimpl = p.ast.children(p.root)[0];
    let var = p.ast.children(p.ast.fnimpl_body(fnimpl))[0];
    assert!(p.ast.vardecl_type(var).is_some());
}

#[test]
fn imports_and_foreign_imports() {
    let p = parse("import shapes\nforeign import cstd");
    assert!(p.diags.is_empty());
    let children = p.ast.children(p.root);
    assert_eq!(children.len(), 2);
    let AstKind::Import { foreign, .. } = p.ast.kind(children[0]) else {
        panic!("expected import");
    };
    assert!(!foreign);
    let AstKind::Import { foreign, .. } = p.ast.kind(children[1]) else {
        panic!("expected import");
    };
    assert!(foreign);
}

#[test]
fn fn_without_body_is_bare_declaration() {
    let p = parse("fn print(s:string) -> nil");
    assert!(p.diags.is_empty());
    let decl = p.ast.children(p.root)[0];
    assert!(matches!(p.ast.kind(decl), AstKind::FnDecl { .. }));
}

#[test]
fn generic_type_declaration() {
    let p = parse("type Pair<T> { first:T, second:T }");
    assert!(p.diags.is_empty(), "{:?}", p.diags.messages());
    let decl = p.ast.children(p.root)[0];
    let generic = p.ast.typedecl_generic(decl).expect("generic decl");
    assert_eq!(p.ast.kind(generic), AstKind::GenericDecl);
    assert_eq!(p.ast.children(generic).len(), 1);
}

#[test]
fn syntax_error_synchronizes_to_next_declaration() {
    let p = parse("fn broken( { }\nfn ok() -> nil { }");
    assert!(p.diags.has_errors());
    // the second function still parses
    let last = *p.ast.children(p.root).last().expect("a declaration");
    assert!(matches!(p.ast.kind(last), AstKind::FnImpl));
}

#[test]
fn assignment_parses_right_associative() {
    let p = parse("fn f(a:i32, b:i32) -> nil { a = b = 3 }");
    assert!(p.diags.is_empty());
    let fnimpl = p.ast.children(p.root)[0];
    let stmt = p.ast.children(p.ast.fnimpl_body(fnimpl))[0];
    let AstKind::BinaryOp { op } = p.ast.kind(stmt) else {
        panic!("expected assignment");
    };
    assert_eq!(op, BinaryOpKind::Assign);
    let rhs = p.ast.children(stmt)[1];
    assert_eq!(
        p.ast.kind(rhs),
        AstKind::BinaryOp {
            op: BinaryOpKind::Assign
        }
    );
}
