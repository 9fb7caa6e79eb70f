//! Textual serialization of RIR modules.
//!
//! The format is byte-stable; golden tests compare against it directly.
//!
//! ```text
//! typedef NAME { field1:type1, field2:type2 }
//! fndef(NAME; argtype; rettype)
//!     L0:
//!         %0 = alloca i32
//!         store %arg0 into %0
//!         branch L1
//!     L1:
//!         return
//! ```
//!
//! Four spaces per indentation level: labels at one level, expressions
//! and terminators at two. Typedef fields join with `", "`; the three
//! `fndef` parts join with `"; "`.

use std::fmt::Write;

use crate::{
    RirExprKind, RirExpression, RirFunction, RirModule, RirTerminator, RirTypeList,
};

const INDENT: &str = "    ";

pub(crate) fn render(module: &RirModule) -> String {
    let mut out = String::new();
    for def in &module.typedefs {
        let fields = def
            .fields
            .iter()
            .map(|(name, ty)| format!("{name}:{ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "typedef {} {{ {} }}", def.name, fields);
    }
    for f in &module.functions {
        render_function(&mut out, f, &module.types);
    }
    out
}

fn render_function(out: &mut String, f: &RirFunction, types: &RirTypeList) {
    let _ = writeln!(out, "fndef({}; {}; {})", f.name, f.arg_type, f.ret_type);
    for block in f.blocks_in_label_order() {
        let _ = writeln!(out, "{INDENT}L{}:", block.label);
        for expr in &block.exprs {
            let _ = writeln!(out, "{INDENT}{INDENT}{}", expr_line(expr, types));
        }
        if let Some(t) = &block.terminator {
            let _ = writeln!(out, "{INDENT}{INDENT}{}", terminator_line(t, f));
        }
    }
}

fn expr_line(e: &RirExpression, types: &RirTypeList) -> String {
    let rhs = match &e.kind {
        RirExprKind::Alloca { ty } => format!("alloca {}", types.type_name(*ty)),
        RirExprKind::Store { src, dst } => return format!("store {src} into {dst}"),
        RirExprKind::Gep { base, indices } => {
            let idx = indices
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("gep {base}, {idx}")
        }
        RirExprKind::Load { src } => format!("load {src}"),
        RirExprKind::Binary { op, left, right } => {
            format!("{} {left}, {right}", op.mnemonic())
        }
        RirExprKind::Cmp { op, left, right } => {
            format!("{} {left}, {right}", op.mnemonic())
        }
        RirExprKind::Logic { op, left, right } => {
            format!("{} {left}, {right}", op.mnemonic())
        }
        RirExprKind::Call { name, args } => {
            let args = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("call {name}({args})")
        }
        RirExprKind::Convert { value, to } => {
            format!("convert {value} to {}", types.type_name(*to))
        }
    };
    match &e.result {
        Some(v) => format!("{v} = {rhs}"),
        None => rhs,
    }
}

fn terminator_line(t: &RirTerminator, f: &RirFunction) -> String {
    match t {
        RirTerminator::Branch(b) => format!("branch L{}", f.label_of(*b)),
        RirTerminator::CondBranch {
            cond,
            then_bb,
            else_bb,
        } => format!(
            "condbranch {cond}, L{}, L{}",
            f.label_of(*then_bb),
            f.label_of(*else_bb)
        ),
        RirTerminator::Return(Some(v)) => format!("return {v}"),
        RirTerminator::Return(None) => "return".to_string(),
        RirTerminator::Unreachable => "unreachable".to_string(),
    }
}
