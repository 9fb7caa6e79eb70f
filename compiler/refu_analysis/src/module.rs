//! Module objects and the dependency graph.

use std::collections::VecDeque;
use std::fmt;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{Ast, AstKind, NodeId, StrId};

use crate::Analyzer;

/// Index of a module in the driver's module list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One source module moving through the pipeline.
pub struct Module {
    /// Module name (the file stem).
    pub name: String,
    /// Display name of the source file, for diagnostics.
    pub file: String,
    /// Source text, kept for diagnostic rendering.
    pub src: String,
    pub ast: Ast,
    pub root: NodeId,
    pub analyzer: Analyzer,
    /// Direct dependencies, filled by dependency discovery.
    pub deps: Vec<ModuleId>,
    pub diags: DiagnosticQueue,
    /// Position in the driver's topological order, set after sorting.
    pub sorted_index: Option<usize>,
}

impl Module {
    /// Whether the module parsed to an empty root.
    pub fn is_empty(&self) -> bool {
        self.ast.children(self.root).is_empty()
    }
}

/// Walk a module root's import list.
///
/// Returns `(module name, foreign)` pairs in source order. Foreign
/// imports never become module dependencies.
pub fn collect_imports(ast: &Ast, root: NodeId) -> Vec<(StrId, bool)> {
    ast.children(root)
        .iter()
        .filter_map(|&child| match ast.kind(child) {
            AstKind::Import { module, foreign } => Some((module, foreign)),
            _ => None,
        })
        .collect()
}

/// The module dependency graph has a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclicDependency {
    /// Modules left unplaced when the sort stalled.
    pub stuck: Vec<ModuleId>,
}

impl fmt::Display for CyclicDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cyclic module dependency involving {} module(s)",
            self.stuck.len()
        )
    }
}

impl std::error::Error for CyclicDependency {}

/// Kahn's algorithm, leaves (dependency-free modules) first.
///
/// The returned order guarantees every module appears after all of its
/// dependencies, exactly once.
pub fn topological_sort(deps: &[Vec<ModuleId>]) -> Result<Vec<ModuleId>, CyclicDependency> {
    let n = deps.len();
    let mut in_degree: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, module_deps) in deps.iter().enumerate() {
        for dep in module_deps {
            dependents[dep.index()].push(i);
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop_front() {
        order.push(ModuleId(i as u32));
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        let placed: rustc_hash::FxHashSet<ModuleId> = order.into_iter().collect();
        let stuck = (0..n)
            .map(|i| ModuleId(i as u32))
            .filter(|m| !placed.contains(m))
            .collect();
        return Err(CyclicDependency { stuck });
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn leaves_come_before_dependents() {
        // 0 depends on 1 and 2; 1 depends on 2
        let deps = vec![
            vec![ModuleId(1), ModuleId(2)],
            vec![ModuleId(2)],
            vec![],
        ];
        let order = topological_sort(&deps).unwrap();
        assert_eq!(order, vec![ModuleId(2), ModuleId(1), ModuleId(0)]);
    }

    #[test]
    fn cycle_is_fatal() {
        let deps = vec![vec![ModuleId(1)], vec![ModuleId(0)]];
        let err = topological_sort(&deps).unwrap_err();
        assert_eq!(err.stuck.len(), 2);
    }

    #[test]
    fn diamond_orders_each_module_once() {
        // 0 -> {1, 2}, 1 -> {3}, 2 -> {3}
        let deps = vec![
            vec![ModuleId(1), ModuleId(2)],
            vec![ModuleId(3)],
            vec![ModuleId(3)],
            vec![],
        ];
        let order = topological_sort(&deps).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order[0], ModuleId(3));
        assert_eq!(order[3], ModuleId(0));
    }
}
