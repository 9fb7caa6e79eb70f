//! The per-module type set.
//!
//! All canonical types of one module live here. Elementary types occupy
//! the fixed leading indices in every set; composite entries are appended
//! as declarations and expressions demand them, after a structural scan
//! guarantees no equal entry already exists.

use rustc_hash::FxHashMap;
use tracing::trace;

use refu_ir::{Ast, AstKind, NodeId, StrId, StringTable, TypeOpKind, TypeRef};

use crate::{ElementaryKind, MatchCtx, TypeCmp, TypeData, TypeError};

/// Index of the first non-elementary entry.
pub const FIRST_DYNAMIC: u32 = ElementaryKind::ALL.len() as u32;

/// Structural hash set of canonical types for one module.
pub struct TypeSet {
    types: Vec<TypeData>,
    defined_by_name: FxHashMap<StrId, TypeRef>,
}

impl TypeSet {
    pub fn new() -> Self {
        let mut types = Vec::with_capacity(64);
        for kind in ElementaryKind::ALL {
            types.push(TypeData::Elementary(kind));
        }
        Self {
            types,
            defined_by_name: FxHashMap::default(),
        }
    }

    /// The fixed handle of an elementary type, valid in every set.
    #[inline]
    pub const fn elem(kind: ElementaryKind) -> TypeRef {
        TypeRef::from_raw(kind as u32)
    }

    #[inline]
    pub const fn nil() -> TypeRef {
        Self::elem(ElementaryKind::Nil)
    }

    #[inline]
    pub const fn boolean() -> TypeRef {
        Self::elem(ElementaryKind::Bool)
    }

    #[inline]
    pub fn data(&self, r: TypeRef) -> TypeData {
        self.types[r.raw() as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate every entry, elementary included.
    pub fn iter(&self) -> impl Iterator<Item = (TypeRef, TypeData)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(i, d)| (TypeRef::from_raw(i as u32), *d))
    }

    /// Iterate the composite (dynamically created) entries.
    pub fn iter_dynamic(&self) -> impl Iterator<Item = (TypeRef, TypeData)> + '_ {
        self.iter().skip(FIRST_DYNAMIC as usize)
    }

    pub fn lookup_defined(&self, name: StrId) -> Option<TypeRef> {
        self.defined_by_name.get(&name).copied()
    }

    /// Insert `data` unless a structurally equal entry exists.
    ///
    /// Operand handles in `data` must already be canonical in this set,
    /// which reduces the scan to plain `TypeData` equality.
    pub(crate) fn intern_data(&mut self, data: TypeData) -> TypeRef {
        if let Some(i) = self.types.iter().position(|t| *t == data) {
            return TypeRef::from_raw(i as u32);
        }
        let r = TypeRef::from_raw(self.types.len() as u32);
        self.types.push(data);
        if let TypeData::Defined { name, .. } = data {
            self.defined_by_name.entry(name).or_insert(r);
        }
        r
    }

    /// Intern a generic parameter.
    pub fn generic(&mut self, name: StrId) -> TypeRef {
        self.intern_data(TypeData::Generic { name })
    }

    /// Intern the implication (function signature) `arg -> ret`.
    pub fn intern_implication(&mut self, arg: TypeRef, ret: TypeRef) -> TypeRef {
        self.intern_data(TypeData::Operator {
            op: TypeOpKind::Implication,
            left: arg,
            right: ret,
        })
    }

    /// Build a left-associated product over `fields`.
    ///
    /// Empty input is nil, a single field is itself.
    pub fn intern_product(&mut self, fields: &[TypeRef]) -> TypeRef {
        match fields {
            [] => Self::nil(),
            [single] => *single,
            [first, rest @ ..] => {
                let mut acc = *first;
                for f in rest {
                    acc = self.intern_data(TypeData::Operator {
                        op: TypeOpKind::Product,
                        left: acc,
                        right: *f,
                    });
                }
                acc
            }
        }
    }

    // ── creation from AST descriptions ────────────────────────────

    /// Find or create the canonical type for an AST type description.
    ///
    /// The current set is scanned under generic-permissive comparison
    /// first; only on a miss is a new entry constructed. For sum
    /// operators both operands are interned as well, so each variant is
    /// independently referenceable.
    pub fn get_or_create(
        &mut self,
        ast: &Ast,
        desc: NodeId,
        strings: &StringTable,
        generic_decl: Option<NodeId>,
    ) -> Result<TypeRef, TypeError> {
        let gparams = generic_param_names(ast, generic_decl);

        for i in 0..self.types.len() {
            let r = TypeRef::from_raw(i as u32);
            let mut ctx = MatchCtx::new();
            if self.equals_node(r, ast, desc, &gparams, TypeCmp::Generic, &mut ctx) {
                trace!(index = i, "type description matched existing entry");
                return Ok(r);
            }
        }

        self.create_from_node(ast, desc, strings, &gparams)
    }

    /// Find or create the defined type for a `type Name { body }`
    /// declaration. Matching is by name and body.
    pub fn create_defined(
        &mut self,
        name: StrId,
        ast: &Ast,
        desc: NodeId,
        strings: &StringTable,
        generic_decl: Option<NodeId>,
    ) -> Result<TypeRef, TypeError> {
        let body = self.get_or_create(ast, desc, strings, generic_decl)?;
        Ok(self.intern_data(TypeData::Defined { name, body }))
    }

    fn create_from_node(
        &mut self,
        ast: &Ast,
        node: NodeId,
        strings: &StringTable,
        gparams: &[StrId],
    ) -> Result<TypeRef, TypeError> {
        match ast.kind(node) {
            AstKind::TypeDesc => {
                self.create_from_node(ast, ast.children(node)[0], strings, gparams)
            }
            AstKind::Identifier { name } => self.resolve_type_name(name, ast, node, strings, gparams),
            AstKind::TypeLeaf { name } => {
                let inner =
                    self.create_from_node(ast, ast.children(node)[0], strings, gparams)?;
                Ok(self.intern_data(TypeData::Leaf { name, inner }))
            }
            AstKind::TypeOperator { op } => {
                let children = ast.children(node);
                let (lnode, rnode) = (children[0], children[1]);
                // recursion interns the operands, which for sums is load
                // bearing: each variant must be independently referenceable
                let left = self.create_from_node(ast, lnode, strings, gparams)?;
                let right = self.create_from_node(ast, rnode, strings, gparams)?;
                Ok(self.intern_data(TypeData::Operator { op, left, right }))
            }
            _ => Err(TypeError::MalformedDescription {
                span: ast.span(node),
            }),
        }
    }

    fn resolve_type_name(
        &mut self,
        name: StrId,
        ast: &Ast,
        node: NodeId,
        strings: &StringTable,
        gparams: &[StrId],
    ) -> Result<TypeRef, TypeError> {
        if let Some(text) = strings.get(name) {
            if let Some(kind) = ElementaryKind::from_name(text) {
                return Ok(Self::elem(kind));
            }
        }
        if gparams.contains(&name) {
            return Ok(self.generic(name));
        }
        if let Some(defined) = self.lookup_defined(name) {
            return Ok(defined);
        }
        Err(TypeError::UnknownType {
            name: strings.get(name).unwrap_or("<unknown>").to_string(),
            span: ast.span(node),
        })
    }

    // ── structural views ──────────────────────────────────────────

    /// Follow a defined type to its body; other types are themselves.
    pub fn resolve_body(&self, r: TypeRef) -> TypeRef {
        match self.data(r) {
            TypeData::Defined { body, .. } => body,
            _ => r,
        }
    }

    /// Flatten a sum operator into its ordered operand list.
    ///
    /// Non-sum types yield themselves as the only entry.
    pub fn sum_operands(&self, r: TypeRef) -> Vec<TypeRef> {
        let mut out = Vec::new();
        self.collect_operands(r, TypeOpKind::Sum, &mut out);
        out
    }

    /// Flatten a product operator into its ordered field list.
    ///
    /// Nil yields an empty list; non-product types yield themselves.
    pub fn product_fields(&self, r: TypeRef) -> Vec<TypeRef> {
        if r == Self::nil() {
            return Vec::new();
        }
        let mut out = Vec::new();
        self.collect_operands(r, TypeOpKind::Product, &mut out);
        out
    }

    fn collect_operands(&self, r: TypeRef, want: TypeOpKind, out: &mut Vec<TypeRef>) {
        match self.data(r) {
            TypeData::Operator { op, left, right } if op == want => {
                self.collect_operands(left, want, out);
                self.collect_operands(right, want, out);
            }
            _ => out.push(r),
        }
    }

    /// The label and contained type of a leaf; bare types have no label.
    pub fn leaf_parts(&self, r: TypeRef) -> (Option<StrId>, TypeRef) {
        match self.data(r) {
            TypeData::Leaf { name, inner } => (Some(name), inner),
            _ => (None, r),
        }
    }

    pub fn elementary_kind(&self, r: TypeRef) -> Option<ElementaryKind> {
        self.data(r).elementary()
    }

    /// Approximate storage size in bytes, for sum payload sizing.
    pub fn byte_size(&self, r: TypeRef) -> u32 {
        match self.data(r) {
            TypeData::Elementary(kind) => kind.byte_size(),
            TypeData::Defined { body, .. } => self.byte_size(body),
            TypeData::Operator { op, left, right } => match op {
                TypeOpKind::Product => self.byte_size(left) + self.byte_size(right),
                TypeOpKind::Sum => {
                    // payload of the largest variant plus the selector
                    self.byte_size(left).max(self.byte_size(right)) + 4
                }
                TypeOpKind::Implication => 8, // function pointer
            },
            TypeData::Leaf { inner, .. } => self.byte_size(inner),
            TypeData::Generic { .. } => 0,
        }
    }

    // ── dependency merging ────────────────────────────────────────

    /// Merge every composite entry of a dependency's set into this one.
    ///
    /// Handles are remapped recursively; entries that already exist here
    /// are reused, so merging is idempotent.
    pub fn merge_from(&mut self, other: &TypeSet) {
        for (r, _) in other.iter_dynamic() {
            self.import_from(other, r);
        }
    }

    /// Import a single entry of another set, returning its handle here.
    pub fn import_ref(&mut self, other: &TypeSet, r: TypeRef) -> TypeRef {
        self.import_from(other, r)
    }

    fn import_from(&mut self, other: &TypeSet, r: TypeRef) -> TypeRef {
        match other.data(r) {
            TypeData::Elementary(kind) => Self::elem(kind),
            TypeData::Generic { name } => self.generic(name),
            TypeData::Leaf { name, inner } => {
                let inner = self.import_from(other, inner);
                self.intern_data(TypeData::Leaf { name, inner })
            }
            TypeData::Operator { op, left, right } => {
                let left = self.import_from(other, left);
                let right = self.import_from(other, right);
                self.intern_data(TypeData::Operator { op, left, right })
            }
            TypeData::Defined { name, body } => {
                let body = self.import_from(other, body);
                self.intern_data(TypeData::Defined { name, body })
            }
        }
    }

    /// Render a type for diagnostics and the RIR `fndef` header.
    ///
    /// Leaf labels are dropped: `a:i32, b:i32` renders as `i32,i32`.
    pub fn type_to_string(&self, r: TypeRef, strings: &StringTable) -> String {
        match self.data(r) {
            TypeData::Elementary(kind) => kind.name().to_string(),
            TypeData::Defined { name, .. } => {
                strings.get(name).unwrap_or("<unknown>").to_string()
            }
            TypeData::Generic { name } => strings.get(name).unwrap_or("<unknown>").to_string(),
            TypeData::Leaf { inner, .. } => self.type_to_string(inner, strings),
            TypeData::Operator { op, left, right } => {
                let sep = match op {
                    TypeOpKind::Product => ",",
                    TypeOpKind::Sum => "|",
                    TypeOpKind::Implication => "->",
                };
                format!(
                    "{}{}{}",
                    self.type_to_string(left, strings),
                    sep,
                    self.type_to_string(right, strings)
                )
            }
        }
    }
}

impl Default for TypeSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Collect the parameter names of a generic declaration node.
pub fn generic_param_names(ast: &Ast, generic_decl: Option<NodeId>) -> Vec<StrId> {
    let Some(decl) = generic_decl else {
        return Vec::new();
    };
    ast.children(decl)
        .iter()
        .filter_map(|&child| match ast.kind(child) {
            AstKind::GenericParam { name } => Some(name),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests;
