use pretty_assertions::assert_eq;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{Ast, AstKind, NodeId, StringTable, TypeOpKind};

use crate::{ElementaryKind, MatchCtx, TypeCmp, TypeData, TypeSet};

/// Parse a source snippet and hand back everything needed to build types.
struct Fixture {
    ast: Ast,
    root: NodeId,
    idents: StringTable,
}

fn parse(src: &str) -> Fixture {
    let mut idents = StringTable::new();
    let mut literals = StringTable::new();
    let mut diags = DiagnosticQueue::new();
    let tokens = refu_lexer::lex(src, &mut idents, &mut literals, &mut diags);
    let (ast, root) = refu_parse::parse_module("t", &tokens, &mut idents, &mut diags);
    assert!(diags.is_empty(), "{:?}", diags.messages());
    Fixture { ast, root, idents }
}

/// The body description node of the first type declaration.
fn first_typedecl_desc(f: &Fixture) -> (NodeId, Option<NodeId>) {
    let decl = f.ast.children(f.root)[0];
    (f.ast.typedecl_desc(decl), f.ast.typedecl_generic(decl))
}

#[test]
fn elementary_types_have_fixed_handles() {
    let set = TypeSet::new();
    for kind in ElementaryKind::ALL {
        let r = TypeSet::elem(kind);
        assert_eq!(set.data(r), TypeData::Elementary(kind));
    }
}

#[test]
fn same_description_twice_is_one_entry() {
    let f = parse("type A { a:i32, b:i32 }\ntype B { a:i32, b:i32 }");
    let mut set = TypeSet::new();

    let desc_a = f.ast.typedecl_desc(f.ast.children(f.root)[0]);
    let desc_b = f.ast.typedecl_desc(f.ast.children(f.root)[1]);

    let ta = set.get_or_create(&f.ast, desc_a, &f.idents, None).unwrap();
    let tb = set.get_or_create(&f.ast, desc_b, &f.idents, None).unwrap();
    assert_eq!(ta, tb, "canonicalization must return the same object");
}

#[test]
fn sum_inserts_both_operands() {
    let f = parse("type Shape { radius:f32 | width:f32, height:f32 }");
    let mut set = TypeSet::new();
    let (desc, generic) = first_typedecl_desc(&f);

    let sum = set.get_or_create(&f.ast, desc, &f.idents, generic).unwrap();
    let operands = set.sum_operands(sum);
    assert_eq!(operands.len(), 2);

    // each operand is independently canonical: asking for the product
    // alone hits the existing entry
    let TypeData::Operator { right, .. } = set.data(sum) else {
        panic!("expected sum operator");
    };
    assert_eq!(operands[1], right);
    assert!(matches!(
        set.data(right),
        TypeData::Operator {
            op: TypeOpKind::Product,
            ..
        }
    ));
}

#[test]
fn defined_types_match_by_name_and_body() {
    let f = parse("type P { x:i32 }\ntype Q { x:i32 }");
    let mut set = TypeSet::new();

    let decl_p = f.ast.children(f.root)[0];
    let decl_q = f.ast.children(f.root)[1];
    let AstKind::TypeDecl { name: name_p, .. } = f.ast.kind(decl_p) else {
        panic!()
    };
    let AstKind::TypeDecl { name: name_q, .. } = f.ast.kind(decl_q) else {
        panic!()
    };

    let tp = set
        .create_defined(name_p, &f.ast, f.ast.typedecl_desc(decl_p), &f.idents, None)
        .unwrap();
    let tq = set
        .create_defined(name_q, &f.ast, f.ast.typedecl_desc(decl_q), &f.idents, None)
        .unwrap();

    assert_ne!(tp, tq, "same body, different name: distinct types");
    let again = set
        .create_defined(name_p, &f.ast, f.ast.typedecl_desc(decl_p), &f.idents, None)
        .unwrap();
    assert_eq!(tp, again);
}

#[test]
fn generic_parameter_matches_concrete_consistently() {
    let f = parse("type Pair<T> { first:T, second:T }");
    let mut set = TypeSet::new();
    let (desc, generic) = first_typedecl_desc(&f);
    let pair = set.get_or_create(&f.ast, desc, &f.idents, generic).unwrap();

    // build the concrete product (first:i32, second:i32)
    let g = parse("type C { first:i32, second:i32 }");
    let (cdesc, _) = first_typedecl_desc(&g);
    let concrete = set.get_or_create(&g.ast, cdesc, &g.idents, None).unwrap();

    let mut ctx = MatchCtx::new();
    assert!(set.equals(pair, concrete, TypeCmp::Generic, &mut ctx));

    // inconsistent assignment must fail: (first:i32, second:f64)
    let h = parse("type D { first:i32, second:f64 }");
    let (hdesc, _) = first_typedecl_desc(&h);
    let mixed = set.get_or_create(&h.ast, hdesc, &h.idents, None).unwrap();
    let mut ctx = MatchCtx::new();
    assert!(!set.equals(pair, mixed, TypeCmp::Generic, &mut ctx));
}

#[test]
fn unknown_type_name_errors() {
    let f = parse("type A { x:Mystery }");
    let mut set = TypeSet::new();
    let (desc, _) = first_typedecl_desc(&f);
    let err = set.get_or_create(&f.ast, desc, &f.idents, None).unwrap_err();
    assert_eq!(err.to_string(), "unknown type 'Mystery'");
}

#[test]
fn merge_remaps_dependency_entries() {
    let f = parse("type Shape { radius:f32 | width:f32, height:f32 }");
    let mut dep = TypeSet::new();
    let decl = f.ast.children(f.root)[0];
    let AstKind::TypeDecl { name, .. } = f.ast.kind(decl) else {
        panic!()
    };
    dep.create_defined(name, &f.ast, f.ast.typedecl_desc(decl), &f.idents, None)
        .unwrap();

    let mut main = TypeSet::new();
    let before = main.len();
    main.merge_from(&dep);
    assert!(main.len() > before);
    let shape = main.lookup_defined(name).expect("Shape imported");
    assert!(matches!(main.data(shape), TypeData::Defined { .. }));

    // merging twice adds nothing
    let after_once = main.len();
    main.merge_from(&dep);
    assert_eq!(main.len(), after_once);
}

#[test]
fn product_and_nil_flattening() {
    let mut set = TypeSet::new();
    let i32r = TypeSet::elem(ElementaryKind::I32);
    let f64r = TypeSet::elem(ElementaryKind::F64);
    let product = set.intern_product(&[i32r, f64r, i32r]);
    assert_eq!(set.product_fields(product), vec![i32r, f64r, i32r]);
    assert_eq!(set.product_fields(TypeSet::nil()), Vec::<refu_ir::TypeRef>::new());
    assert_eq!(set.intern_product(&[]), TypeSet::nil());
    assert_eq!(set.intern_product(&[i32r]), i32r);
}

#[test]
fn type_to_string_renders_compact() {
    let f = parse("type A { a:i32, b:i32 }");
    let mut set = TypeSet::new();
    let (desc, _) = first_typedecl_desc(&f);
    let t = set.get_or_create(&f.ast, desc, &f.idents, None).unwrap();
    assert_eq!(set.type_to_string(t, &f.idents), "i32,i32");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Build a type from one of a fixed pool of descriptions, twice, in
    /// any interleaving; the handles must agree.
    #[test]
    fn interleaved_creation_stays_canonical() {
        let sources = [
            "type A { x:i32 }",
            "type B { x:i32, y:f64 }",
            "type C { a:u8 | b:u16 }",
        ];
        proptest!(|(order in proptest::collection::vec(0usize..3, 1..12))| {
            let fixtures: Vec<Fixture> = sources.iter().map(|s| parse(s)).collect();
            let mut set = TypeSet::new();
            let mut seen: [Option<refu_ir::TypeRef>; 3] = [None; 3];
            for &i in &order {
                let (desc, _) = first_typedecl_desc(&fixtures[i]);
                let r = set
                    .get_or_create(&fixtures[i].ast, desc, &fixtures[i].idents, None)
                    .unwrap();
                if let Some(prev) = seen[i] {
                    prop_assert_eq!(prev, r);
                }
                seen[i] = Some(r);
            }
        });
    }
}
