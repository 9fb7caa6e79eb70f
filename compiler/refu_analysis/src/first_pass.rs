//! First pass: scoping and type construction.
//!
//! Builds the symbol table tree (module root, one table per function, one
//! per block), creates canonical types for every type and function
//! declaration, and records parameters and local variables. Nothing is
//! type-checked yet; unannotated `let` bindings get their record created
//! with the type left open.

use tracing::debug;

use refu_ir::{AstKind, NodeId, NodeState, StrId, TypeRef};
use refu_types::TypeSet;

use crate::{AnalysisError, CancelFlag, Module, TableId};

pub(crate) fn run(module: &mut Module, cancel: &CancelFlag) -> Result<(), AnalysisError> {
    if module.ast.state(module.root) >= NodeState::Scoped {
        return Ok(());
    }
    debug!(module = %module.name, "first pass");

    let root_table = module.analyzer.symbols.new_table(None);
    module.analyzer.root_table = Some(root_table);
    module.analyzer.scopes.insert(module.root, root_table);

    let children: Vec<NodeId> = module.ast.children(module.root).to_vec();
    for child in children {
        match module.ast.kind(child) {
            AstKind::TypeDecl { name, .. } => declare_type(module, root_table, child, name),
            AstKind::FnDecl { name, .. } => {
                declare_fn_header(module, root_table, child, name);
            }
            AstKind::FnImpl => {
                if cancel.is_cancelled() {
                    return Err(AnalysisError::Cancelled);
                }
                scope_function(module, root_table, child);
            }
            _ => {}
        }
    }

    let root = module.root;
    module
        .ast
        .walk_post_mut(root, &mut |ast, id| ast.advance_state(id, NodeState::Scoped));
    Ok(())
}

fn declare_type(m: &mut Module, table: TableId, node: NodeId, name: StrId) {
    let generic = m.ast.typedecl_generic(node);
    let desc = m.ast.typedecl_desc(node);
    let created =
        m.analyzer
            .types
            .create_defined(name, &m.ast, desc, &m.analyzer.idents, generic);
    let ty = match created {
        Ok(ty) => ty,
        Err(e) => {
            m.diags.semantic_error(e.span(), e.to_string());
            m.analyzer.set_semantic_error();
            return;
        }
    };
    m.ast.set_resolved_type(node, ty);

    if m.analyzer.symbols.add(table, name, Some(ty)).is_err() {
        let name_text = m.analyzer.idents.get(name).unwrap_or("<unknown>").to_string();
        m.diags.semantic_error(
            m.ast.span(node),
            format!("duplicate symbol '{name_text}'"),
        );
        m.analyzer.set_semantic_error();
    }
}

/// Create the implication type of a function declaration and bind its
/// name in `table`. Also stamps the resolved types onto the declaration
/// and its argument/return descriptions for later passes.
fn declare_fn_header(m: &mut Module, table: TableId, decl: NodeId, name: StrId) -> Option<TypeRef> {
    let generic = m.ast.fndecl_generic(decl);

    let arg_ty = match m.ast.fndecl_args(decl) {
        Some(desc) => match m
            .analyzer
            .types
            .get_or_create(&m.ast, desc, &m.analyzer.idents, generic)
        {
            Ok(ty) => {
                m.ast.set_resolved_type(desc, ty);
                ty
            }
            Err(e) => {
                m.diags.semantic_error(e.span(), e.to_string());
                m.analyzer.set_semantic_error();
                return None;
            }
        },
        None => TypeSet::nil(),
    };

    let ret_ty = match m.ast.fndecl_return(decl) {
        Some(desc) => match m
            .analyzer
            .types
            .get_or_create(&m.ast, desc, &m.analyzer.idents, generic)
        {
            Ok(ty) => {
                m.ast.set_resolved_type(desc, ty);
                ty
            }
            Err(e) => {
                m.diags.semantic_error(e.span(), e.to_string());
                m.analyzer.set_semantic_error();
                return None;
            }
        },
        None => TypeSet::nil(),
    };

    let fn_ty = m.analyzer.types.intern_implication(arg_ty, ret_ty);
    m.ast.set_resolved_type(decl, fn_ty);

    if m.analyzer.symbols.add(table, name, Some(fn_ty)).is_err() {
        let name_text = m.analyzer.idents.get(name).unwrap_or("<unknown>").to_string();
        m.diags.semantic_error(
            m.ast.span(decl),
            format!("duplicate symbol '{name_text}'"),
        );
        m.analyzer.set_semantic_error();
    }
    Some(fn_ty)
}

fn scope_function(m: &mut Module, root_table: TableId, fnimpl: NodeId) {
    let decl = m.ast.fnimpl_decl(fnimpl);
    let AstKind::FnDecl { name, .. } = m.ast.kind(decl) else {
        return;
    };
    declare_fn_header(m, root_table, decl, name);

    let fn_table = m.analyzer.symbols.new_table(Some(root_table));
    m.analyzer.scopes.insert(fnimpl, fn_table);

    if let Some(args_desc) = m.ast.fndecl_args(decl) {
        let generic = m.ast.fndecl_generic(decl);
        let mut leaves = Vec::new();
        collect_leaves(m, args_desc, &mut leaves);
        for leaf in leaves {
            add_param_record(m, fn_table, leaf, generic);
        }
    }

    let body = m.ast.fnimpl_body(fnimpl);
    scope_expr(m, fn_table, body);
}

/// Collect `name:type` leaves of an argument description in source order.
fn collect_leaves(m: &Module, node: NodeId, out: &mut Vec<NodeId>) {
    match m.ast.kind(node) {
        AstKind::TypeLeaf { .. } => out.push(node),
        AstKind::TypeDesc | AstKind::TypeOperator { .. } => {
            for &child in m.ast.children(node) {
                collect_leaves(m, child, out);
            }
        }
        _ => {}
    }
}

fn add_param_record(m: &mut Module, table: TableId, leaf: NodeId, generic: Option<NodeId>) {
    let AstKind::TypeLeaf { name } = m.ast.kind(leaf) else {
        return;
    };
    let inner = m.ast.children(leaf)[0];
    let ty = match m
        .analyzer
        .types
        .get_or_create(&m.ast, inner, &m.analyzer.idents, generic)
    {
        Ok(ty) => ty,
        Err(e) => {
            m.diags.semantic_error(e.span(), e.to_string());
            m.analyzer.set_semantic_error();
            return;
        }
    };
    m.ast.set_resolved_type(leaf, ty);

    if m.analyzer.symbols.add(table, name, Some(ty)).is_err() {
        let name_text = m.analyzer.idents.get(name).unwrap_or("<unknown>").to_string();
        m.diags.semantic_error(
            m.ast.span(leaf),
            format!("duplicate symbol '{name_text}' in function parameters"),
        );
        m.analyzer.set_semantic_error();
    }
}

/// Walk an expression tree creating block scopes and variable records.
fn scope_expr(m: &mut Module, table: TableId, node: NodeId) {
    match m.ast.kind(node) {
        AstKind::Block => {
            let block_table = m.analyzer.symbols.new_table(Some(table));
            m.analyzer.scopes.insert(node, block_table);
            let children: Vec<NodeId> = m.ast.children(node).to_vec();
            for child in children {
                scope_expr(m, block_table, child);
            }
        }
        AstKind::VarDecl { name, .. } => {
            let declared = m.ast.vardecl_type(node).and_then(|desc| {
                match m
                    .analyzer
                    .types
                    .get_or_create(&m.ast, desc, &m.analyzer.idents, None)
                {
                    Ok(ty) => Some(ty),
                    Err(e) => {
                        m.diags.semantic_error(e.span(), e.to_string());
                        m.analyzer.set_semantic_error();
                        None
                    }
                }
            });

            if m.analyzer.symbols.add(table, name, declared).is_err() {
                let name_text =
                    m.analyzer.idents.get(name).unwrap_or("<unknown>").to_string();
                m.diags.semantic_error(
                    m.ast.span(node),
                    format!("duplicate symbol '{name_text}'"),
                );
                m.analyzer.set_semantic_error();
            }

            let init = m.ast.vardecl_init(node);
            scope_expr(m, table, init);
        }
        _ => {
            let children: Vec<NodeId> = m.ast.children(node).to_vec();
            for child in children {
                scope_expr(m, table, child);
            }
        }
    }
}
