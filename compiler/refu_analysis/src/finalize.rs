//! Finalization pass.
//!
//! Merges every dependency's type set into the module's own set, computes
//! function argument counts, and stamps the whole tree `RirEnd`. The RIR
//! type list itself is materialized by the RIR builder from the merged
//! set.

use tracing::debug;

use refu_ir::{AstKind, NodeId, NodeState};
use refu_types::TypeSet;

use crate::Module;

pub fn finalize(module: &mut Module, dep_sets: &[&TypeSet]) {
    if module.ast.state(module.root) >= NodeState::RirEnd {
        return;
    }
    debug!(module = %module.name, deps = dep_sets.len(), "finalize");

    for set in dep_sets {
        module.analyzer.types.merge_from(set);
    }

    // argument counts: max(1, |product fields|), 0 when argument-less
    let mut counts: Vec<(NodeId, u32)> = Vec::new();
    for &child in module.ast.children(module.root) {
        let decl = match module.ast.kind(child) {
            AstKind::FnImpl => module.ast.fnimpl_decl(child),
            AstKind::FnDecl { .. } => child,
            _ => continue,
        };
        let count = match module
            .ast
            .fndecl_args(decl)
            .and_then(|d| module.ast.resolved_type(d))
        {
            Some(arg_ty) => {
                let fields = module.analyzer.types.product_fields(arg_ty).len() as u32;
                fields.max(1)
            }
            None => 0,
        };
        counts.push((decl, count));
    }
    for (decl, count) in counts {
        module.ast.set_fndecl_args_num(decl, count);
    }

    let root = module.root;
    module
        .ast
        .walk_post_mut(root, &mut |ast, id| ast.advance_state(id, NodeState::RirEnd));
}
