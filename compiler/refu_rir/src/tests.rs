use pretty_assertions::assert_eq;

use refu_analysis::{analyze_module, finalize, Analyzer, CancelFlag, Module};
use refu_diagnostic::DiagnosticQueue;
use refu_ir::Constant;

use crate::{RirExprKind, RirModule, RirTypeKind, RirValue};

fn pipeline(src: &str) -> (Module, RirModule) {
    let mut analyzer = Analyzer::new();
    let mut diags = DiagnosticQueue::new();
    let tokens = refu_lexer::lex(src, &mut analyzer.idents, &mut analyzer.literals, &mut diags);
    let (ast, root) = refu_parse::parse_module("test", &tokens, &mut analyzer.idents, &mut diags);
    let mut module = Module {
        name: "test".to_string(),
        file: "test.rf".to_string(),
        src: src.to_string(),
        ast,
        root,
        analyzer,
        deps: Vec::new(),
        diags,
        sorted_index: None,
    };
    analyze_module(&mut module, &[], &CancelFlag::new()).unwrap();
    assert!(
        !module.analyzer.have_semantic_err,
        "{:?}",
        module.diags.messages()
    );
    finalize(&mut module, &[]);
    let rir = crate::build(&mut module).unwrap();
    (module, rir)
}

#[test]
fn arithmetic_function_lowers_to_the_golden_text() {
    let (_, mut rir) = pipeline("fn add(a:i32, b:i32) -> i32 { a + b }");
    let expected = "\
fndef(add; i32,i32; i32)
    L0:
        %0 = alloca i32
        store %arg0 into %0
        %1 = alloca i32
        store %arg1 into %1
        %2 = alloca i32
        %3 = load %0
        %4 = load %1
        %5 = add %3, %4
        store %5 into %2
        branch L1
    L1:
        %6 = load %2
        return %6
";
    assert_eq!(rir.to_text(), expected);
}

#[test]
fn sum_constructor_builds_payload_and_selector() {
    let (_, mut rir) = pipeline(
        "type Shape { radius:f32 | width:f32, height:f32 }\n\
         fn main() -> nil { let s = Shape(3.0, 4.0) }",
    );
    let expected = "\
typedef internal_struct16 { radius:f32 }
typedef internal_struct17 { width:f32, height:f32 }
typedef Shape { contents:internal_struct17, selector:i32 }
fndef(main; nil; nil)
    L0:
        %0 = alloca Shape
        %1 = alloca Shape
        %2 = alloca internal_struct17
        %3 = gep %2, 0, 0
        store 3.0 into %3
        %4 = gep %2, 0, 1
        store 4.0 into %4
        %5 = gep %1, 0, 0
        store %2 into %5
        %6 = gep %1, 0, 1
        store 1 into %6
        store %1 into %0
        branch L1
    L1:
        return
";
    assert_eq!(rir.to_text(), expected);
}

#[test]
fn sum_constructor_selector_is_the_variant_index_not_one() {
    // choosing the FIRST variant must store selector 0
    let (_, rir) = pipeline(
        "type Shape { radius:f32 | width:f32, height:f32 }\n\
         fn main() -> nil { let s = Shape(2.5) }",
    );
    let f = rir.function_by_name("main").unwrap();
    let selectors: Vec<&RirValue> = f
        .blocks
        .iter()
        .flat_map(|b| &b.exprs)
        .filter_map(|e| match &e.kind {
            RirExprKind::Store {
                src: src @ RirValue::Constant(Constant::Int(_)),
                ..
            } => Some(src),
            _ => None,
        })
        .collect();
    assert_eq!(selectors, vec![&RirValue::Constant(Constant::Int(0))]);
}

#[test]
fn if_expression_creates_then_and_merge_blocks() {
    let (_, mut rir) = pipeline(
        "fn do_sth() -> nil\n\
         fn check(a:i32) -> nil { if a == 42 { do_sth() } }",
    );
    let expected = "\
fndef(check; i32; nil)
    L0:
        %0 = alloca i32
        store %arg0 into %0
        %1 = load %0
        %2 = cmpeq %1, 42
        condbranch %2, L1, L2
    L1:
        call do_sth()
        branch L2
    L2:
        branch L3
    L3:
        return
";
    assert_eq!(rir.to_text(), expected);
}

#[test]
fn elif_chain_reconverges_on_a_single_merge_block() {
    let (_, mut rir) = pipeline(
        "fn x() -> nil\nfn y() -> nil\nfn z() -> nil\n\
         fn f(a:i32) -> nil { if a == 42 { x() } elif a == 50 { y() } else { z() } }",
    );
    let expected = "\
fndef(f; i32; nil)
    L0:
        %0 = alloca i32
        store %arg0 into %0
        %1 = load %0
        %2 = cmpeq %1, 42
        condbranch %2, L1, L2
    L1:
        call x()
        branch L3
    L2:
        %3 = load %0
        %4 = cmpeq %3, 50
        condbranch %4, L4, L5
    L3:
        branch L6
    L4:
        call y()
        branch L3
    L5:
        call z()
        branch L3
    L6:
        return
";
    assert_eq!(rir.to_text(), expected);
}

#[test]
fn blocks_are_well_formed_after_build() {
    let (_, rir) = pipeline(
        "fn g(a:i32) -> i32 { return a }\n\
         fn f(a:i32) -> i32 { if a == 1 { return 2 }\nreturn g(a) }",
    );
    for f in &rir.functions {
        for block in &f.blocks {
            assert!(
                block.terminator.is_some(),
                "block L{} of {} has no terminator",
                block.label,
                f.name
            );
        }
    }
}

#[test]
fn value_numbering_is_def_before_use() {
    let (_, rir) = pipeline("fn f(a:i32, b:i32) -> i32 { a * b + a }");
    let f = rir.function_by_name("f").unwrap();
    for block in &f.blocks {
        for expr in &block.exprs {
            let def = match expr.result {
                Some(RirValue::Var(n)) => n,
                _ => continue,
            };
            let operands: Vec<u32> = operand_vars(&expr.kind);
            for used in operands {
                assert!(
                    used < def,
                    "%{used} used by the expression defining %{def} in {}",
                    f.name
                );
            }
        }
    }
}

fn operand_vars(kind: &RirExprKind) -> Vec<u32> {
    let vals: Vec<&RirValue> = match kind {
        RirExprKind::Alloca { .. } => vec![],
        RirExprKind::Store { src, dst } => vec![src, dst],
        RirExprKind::Gep { base, .. } => vec![base],
        RirExprKind::Load { src } => vec![src],
        RirExprKind::Binary { left, right, .. }
        | RirExprKind::Cmp { left, right, .. }
        | RirExprKind::Logic { left, right, .. } => vec![left, right],
        RirExprKind::Call { args, .. } => args.iter().collect(),
        RirExprKind::Convert { value, .. } => vec![value],
    };
    vals.iter()
        .filter_map(|v| match v {
            RirValue::Var(n) => Some(*n),
            _ => None,
        })
        .collect()
}

#[test]
fn composite_uids_are_unique_and_elementary_uids_fixed() {
    let (_, rir) = pipeline(
        "type A { x:i32 }\ntype B { y:i32, z:f64 }\n\
         type S { a:i8 | b:i16 }\nfn main() -> nil { }",
    );
    let mut seen = std::collections::HashSet::new();
    for (_, t) in rir.types.iter() {
        if let RirTypeKind::Elementary(kind) = t.kind {
            assert_eq!(t.uid, kind as u32);
        } else {
            assert!(seen.insert(t.uid), "duplicate composite uid {}", t.uid);
        }
    }
}

#[test]
fn defined_sum_and_its_body_share_one_entry() {
    let (module, rir) = pipeline(
        "type Shape { radius:f32 | width:f32, height:f32 }\nfn main() -> nil { }",
    );
    let sums: Vec<_> = rir
        .types
        .iter()
        .filter(|(_, t)| t.kind == RirTypeKind::Sum)
        .collect();
    assert_eq!(sums.len(), 1, "sum types must be deduplicated in the list");
    // and exactly one Shape typedef
    let shape_defs = rir
        .typedefs
        .iter()
        .filter(|t| t.name == "Shape")
        .count();
    assert_eq!(shape_defs, 1);
    drop(module);
}

#[test]
fn builder_refuses_modules_with_semantic_errors() {
    let mut analyzer = Analyzer::new();
    let mut diags = DiagnosticQueue::new();
    let src = "fn f(x:i32, x:i32) -> i32 { x }";
    let tokens = refu_lexer::lex(src, &mut analyzer.idents, &mut analyzer.literals, &mut diags);
    let (ast, root) = refu_parse::parse_module("bad", &tokens, &mut analyzer.idents, &mut diags);
    let mut module = Module {
        name: "bad".to_string(),
        file: "bad.rf".to_string(),
        src: src.to_string(),
        ast,
        root,
        analyzer,
        deps: Vec::new(),
        diags,
        sorted_index: None,
    };
    analyze_module(&mut module, &[], &CancelFlag::new()).unwrap();
    assert!(module.analyzer.have_semantic_err);
    finalize(&mut module, &[]);
    let err = crate::build(&mut module).unwrap_err();
    assert_eq!(
        err,
        crate::RirError::SemanticErrorsPresent {
            module: "bad".to_string()
        }
    );
}

#[test]
fn string_literals_are_collected_as_globals() {
    let (_, rir) = pipeline(
        "fn print(s:string) -> nil\n\
         fn main() -> nil { print(\"hello\")\nprint(\"hello\")\nprint(\"world\") }",
    );
    assert_eq!(rir.global_literals, vec!["hello".to_string(), "world".to_string()]);
}

#[test]
fn rendered_text_is_cached() {
    let (_, mut rir) = pipeline("fn f() -> nil { }");
    let first = rir.to_text().to_string();
    assert_eq!(rir.to_text(), first);
    assert_eq!(rir.render(), first);
}

#[test]
fn explicit_cast_emits_convert() {
    let (_, rir) = pipeline("fn f(a:i32) -> i64 { i64(a) }");
    let f = rir.function_by_name("f").unwrap();
    let has_convert = f
        .blocks
        .iter()
        .flat_map(|b| &b.exprs)
        .any(|e| matches!(e.kind, RirExprKind::Convert { .. }));
    assert!(has_convert);
}
