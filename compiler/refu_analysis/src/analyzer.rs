//! Per-module analyzer state.

use rustc_hash::FxHashMap;

use refu_ir::{NodeId, StringTable};
use refu_types::TypeSet;

use crate::{SymbolTables, TableId};

/// Everything the analysis passes accumulate for one module.
///
/// The string tables are created here and live exactly as long as the
/// analyzer; the lexer interns into them before the passes run.
pub struct Analyzer {
    /// Interned identifiers.
    pub idents: StringTable,
    /// Interned string literals.
    pub literals: StringTable,
    /// Canonical types of this module (dependency types merged in during
    /// finalization).
    pub types: TypeSet,
    /// All symbol tables, root first.
    pub symbols: SymbolTables,
    /// Scope-introducing AST node -> its table.
    pub scopes: FxHashMap<NodeId, TableId>,
    /// The module root's table, set by the first pass.
    pub root_table: Option<TableId>,
    /// Set by any semantic error; checked by the RIR builder.
    pub have_semantic_err: bool,
    pub warn_on_implicit_conversions: bool,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            idents: StringTable::new(),
            literals: StringTable::new(),
            types: TypeSet::new(),
            symbols: SymbolTables::new(),
            scopes: FxHashMap::default(),
            root_table: None,
            have_semantic_err: false,
            warn_on_implicit_conversions: true,
        }
    }

    /// The table of a scope-introducing node.
    pub fn scope_of(&self, node: NodeId) -> Option<TableId> {
        self.scopes.get(&node).copied()
    }

    pub fn set_semantic_error(&mut self) {
        self.have_semantic_err = true;
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
