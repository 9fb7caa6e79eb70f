//! Semantic analysis for the refu compiler.
//!
//! Three sub-passes run over each module:
//! 1. **First pass** builds lexically nested symbol tables and creates
//!    canonical types for every declaration.
//! 2. **Typecheck** resolves every expression's type and aggregates
//!    semantic errors without aborting.
//! 3. **Finalization** merges dependency type sets and stamps the AST
//!    for lowering.
//!
//! Modules and their dependency graph (with topological ordering) also
//! live here.

mod analyzer;
mod error;
mod finalize;
mod first_pass;
mod module;
mod symbols;
mod typecheck;


pub use analyzer::Analyzer;
pub use error::{AnalysisError, CancelFlag};
pub use finalize::finalize;
pub use module::{collect_imports, topological_sort, CyclicDependency, Module, ModuleId};
pub use symbols::{BackendHandle, DuplicateSymbol, Record, RecordId, SymbolTables, TableId};

use tracing::debug;

/// Run first pass and typecheck over one module.
///
/// `deps` are the analyzers of the module's already-analyzed
/// dependencies: their types merge into this module's set before the
/// first pass, and their module-level symbols become visible in this
/// module's root scope before typecheck. Pass an empty slice for a
/// dependency-free module.
///
/// Semantic errors are collected in the module's diagnostic queue and do
/// not abort the traversal; the analyzer's `have_semantic_err` flag is
/// the summary. Hard failures are cancellation only.
pub fn analyze_module(
    module: &mut Module,
    deps: &[&Analyzer],
    cancel: &CancelFlag,
) -> Result<(), AnalysisError> {
    debug!(module = %module.name, "analyzing module");
    for dep in deps {
        // identifier handles are content fingerprints, so adopting the
        // dependency's strings keeps imported names printable here
        for (_, s) in dep.idents.iter() {
            let _ = module.analyzer.idents.add(s);
        }
        module.analyzer.types.merge_from(&dep.types);
    }
    first_pass::run(module, cancel)?;
    import_dependency_symbols(module, deps);
    typecheck::run(module, cancel)?;
    Ok(())
}

/// Copy every record of each dependency's root scope into this module's
/// root scope, remapping type handles. A name the module defines itself
/// wins over an imported one.
fn import_dependency_symbols(module: &mut Module, deps: &[&Analyzer]) {
    let Some(root) = module.analyzer.root_table else {
        return;
    };
    for dep in deps {
        let Some(dep_root) = dep.root_table else {
            continue;
        };
        let records: Vec<RecordId> = dep.symbols.iterate(dep_root).collect();
        for rec_id in records {
            let rec = dep.symbols.record(rec_id);
            let Some(ty) = rec.ty else { continue };
            let remapped = module.analyzer.types.import_ref(&dep.types, ty);
            // Err here means a local definition shadows the import
            let _ = module.analyzer.symbols.add(root, rec.name, Some(remapped));
        }
    }
}
