//! Structural type comparison.
//!
//! Two comparison modes exist:
//! - [`TypeCmp::Identical`]: exact structural equality.
//! - [`TypeCmp::Generic`]: a free generic parameter matches any concrete
//!   type once, and must match that same type consistently for the rest
//!   of the comparison; labeled leaves additionally match their contained
//!   type, so an unlabeled argument product can match a declared
//!   parameter product.
//!
//! The bindings accumulated during one generic comparison live in a
//! [`MatchCtx`] owned by that comparison alone.

use rustc_hash::FxHashMap;

use refu_ir::{Ast, AstKind, NodeId, StrId, TypeRef};

use crate::{TypeData, TypeSet};

/// Comparison mode.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TypeCmp {
    Identical,
    Generic,
}

/// Generic-parameter assignments accumulated during one comparison.
#[derive(Default)]
pub struct MatchCtx {
    bindings: FxHashMap<StrId, TypeRef>,
}

impl MatchCtx {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `to`, or check consistency with an earlier binding.
    fn bind(&mut self, name: StrId, to: TypeRef) -> bool {
        match self.bindings.get(&name) {
            Some(&bound) => bound == to,
            None => {
                self.bindings.insert(name, to);
                true
            }
        }
    }
}

impl TypeSet {
    /// Structural equality of two canonical types in this set.
    pub fn equals(&self, a: TypeRef, b: TypeRef, cmp: TypeCmp, ctx: &mut MatchCtx) -> bool {
        if a == b {
            return true;
        }
        let (da, db) = (self.data(a), self.data(b));
        if cmp == TypeCmp::Generic {
            if let TypeData::Generic { name } = da {
                return ctx.bind(name, b);
            }
            if let TypeData::Generic { name } = db {
                return ctx.bind(name, a);
            }
            // leaves are transparent to their contained type
            match (da, db) {
                (TypeData::Leaf { inner, .. }, other) if !matches!(other, TypeData::Leaf { .. }) => {
                    return self.equals(inner, b, cmp, ctx);
                }
                (other, TypeData::Leaf { inner, .. }) if !matches!(other, TypeData::Leaf { .. }) => {
                    return self.equals(a, inner, cmp, ctx);
                }
                _ => {}
            }
        }
        match (da, db) {
            (TypeData::Elementary(ka), TypeData::Elementary(kb)) => ka == kb,
            (
                TypeData::Defined {
                    name: na,
                    body: ba,
                },
                TypeData::Defined {
                    name: nb,
                    body: bb,
                },
            ) => na == nb && self.equals(ba, bb, cmp, ctx),
            (
                TypeData::Operator {
                    op: oa,
                    left: la,
                    right: ra,
                },
                TypeData::Operator {
                    op: ob,
                    left: lb,
                    right: rb,
                },
            ) => oa == ob && self.equals(la, lb, cmp, ctx) && self.equals(ra, rb, cmp, ctx),
            (
                TypeData::Leaf {
                    name: na,
                    inner: ia,
                },
                TypeData::Leaf {
                    name: nb,
                    inner: ib,
                },
            ) => na == nb && self.equals(ia, ib, cmp, ctx),
            (TypeData::Generic { name: na }, TypeData::Generic { name: nb }) => na == nb,
            _ => false,
        }
    }

    /// Structural equality of an existing type against an AST type
    /// description, without constructing anything.
    ///
    /// Used by the canonicalization scan in `get_or_create`.
    pub(crate) fn equals_node(
        &self,
        r: TypeRef,
        ast: &Ast,
        node: NodeId,
        gparams: &[StrId],
        cmp: TypeCmp,
        ctx: &mut MatchCtx,
    ) -> bool {
        match ast.kind(node) {
            AstKind::TypeDesc => self.equals_node(r, ast, ast.children(node)[0], gparams, cmp, ctx),
            AstKind::Identifier { name } => self.name_matches(r, name, gparams, cmp, ctx),
            AstKind::TypeLeaf { name } => match self.data(r) {
                TypeData::Leaf {
                    name: tname,
                    inner,
                } => tname == name && self.equals_node(inner, ast, ast.children(node)[0], gparams, cmp, ctx),
                _ => false,
            },
            AstKind::TypeOperator { op } => match self.data(r) {
                TypeData::Operator {
                    op: top,
                    left,
                    right,
                } => {
                    let children = ast.children(node);
                    top == op
                        && self.equals_node(left, ast, children[0], gparams, cmp, ctx)
                        && self.equals_node(right, ast, children[1], gparams, cmp, ctx)
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn name_matches(
        &self,
        r: TypeRef,
        name: StrId,
        gparams: &[StrId],
        cmp: TypeCmp,
        ctx: &mut MatchCtx,
    ) -> bool {
        // generic parameter in the description
        if gparams.contains(&name) {
            return match self.data(r) {
                TypeData::Generic { name: tname } => tname == name,
                // a free parameter matches any concrete type, consistently
                _ => cmp == TypeCmp::Generic && ctx.bind(name, r),
            };
        }
        match self.data(r) {
            // StrIds are content fingerprints, stable across tables, so a
            // well-known name compares without string lookup
            TypeData::Elementary(kind) => StrId::of(kind.name()) == name,
            TypeData::Defined { name: tname, .. } => tname == name,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementaryKind;

    #[test]
    fn elementary_str_ids_match_the_string_table() {
        let mut table = refu_ir::StringTable::new();
        for kind in ElementaryKind::ALL {
            let id = table.add(kind.name()).unwrap();
            assert_eq!(StrId::of(kind.name()), id, "{}", kind.name());
        }
    }
}
