//! The AST arena and node state machine.
//!
//! Nodes are stored flat in an [`Ast`] arena and reference each other by
//! [`NodeId`]. Every node carries a tag ([`AstKind`]), the byte span it was
//! parsed from, an ordered child list, a pipeline [`NodeState`], and a
//! lazily-filled resolved-type handle.
//!
//! Nodes whose children have optional structural slots (function
//! declarations, type declarations, variable declarations) record which
//! slots are present in their kind tag; the child list stays a single
//! ordered `Vec` so generic traversals need no per-kind knowledge.

use std::fmt;

use crate::{Constant, Span, StrId, TypeRef};

/// A 32-bit index into the AST arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Pipeline state of an AST node.
///
/// Advanced monotonically: `Parsed → Scoped → Typed → RirEnd`. A state is
/// never decremented; pipeline stages skip nodes already past their target
/// state, which makes re-runs idempotent.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub enum NodeState {
    Parsed,
    Scoped,
    Typed,
    RirEnd,
}

/// Type operator tag: binary product, sum, or implication.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeOpKind {
    Product,
    Sum,
    Implication,
}

/// Binary expression operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Assign,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LogicAnd,
    LogicOr,
}

impl BinaryOpKind {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOpKind::Add | BinaryOpKind::Sub | BinaryOpKind::Mul | BinaryOpKind::Div
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOpKind::Eq
                | BinaryOpKind::Ne
                | BinaryOpKind::Lt
                | BinaryOpKind::Gt
                | BinaryOpKind::Le
                | BinaryOpKind::Ge
        )
    }

    pub fn is_logic(self) -> bool {
        matches!(self, BinaryOpKind::LogicAnd | BinaryOpKind::LogicOr)
    }
}

/// Node tag. Child layouts are documented per variant.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AstKind {
    /// Module root. Children: all top-level declarations in source order.
    Root { name: StrId },
    /// `import m` / `foreign import m`. No children.
    Import { module: StrId, foreign: bool },
    /// `type Name { ... }`. Children: `[generic?][desc]`.
    TypeDecl { name: StrId, has_generic: bool },
    /// Generic parameter list. Children: the parameters.
    GenericDecl,
    /// One generic parameter. No children.
    GenericParam { name: StrId },
    /// Wrapper around one type expression. Children: `[expr]`.
    TypeDesc,
    /// Binary type operator. Children: `[left, right]`.
    TypeOperator { op: TypeOpKind },
    /// Labeled field `name:type`. Children: `[type expr]`.
    TypeLeaf { name: StrId },
    /// Function declaration header. Children: `[generic?][args?][ret?]`.
    /// `args_num` is computed during finalization.
    FnDecl {
        name: StrId,
        has_generic: bool,
        has_args: bool,
        has_ret: bool,
        args_num: u32,
    },
    /// Function implementation. Children: `[decl, body]`.
    FnImpl,
    /// Call or constructor application. Children: the arguments.
    FnCall { name: StrId },
    Identifier { name: StrId },
    ConstantNum { value: Constant },
    StrLit { id: StrId },
    /// Children: `[left, right]`.
    BinaryOp { op: BinaryOpKind },
    /// Children: `[cond, then_block]` or `[cond, then_block, else_node]`
    /// where `else_node` is a `Block` or a nested `IfExpr` (elif).
    IfExpr,
    /// Scope-introducing expression sequence. Children: the statements.
    Block,
    /// `let name = init` / `let name:type = init`. Children: `[type?][init]`.
    VarDecl { name: StrId, has_type: bool },
    /// Children: `[expr?]`.
    Return,
}

/// One node in the arena.
#[derive(Debug)]
pub struct AstNode {
    pub kind: AstKind,
    pub span: Span,
    children: Vec<NodeId>,
    state: NodeState,
    resolved_type: Option<TypeRef>,
}

impl AstNode {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn resolved_type(&self) -> Option<TypeRef> {
        self.resolved_type
    }
}

/// Flat node storage for one module.
#[derive(Default)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(256),
        }
    }

    pub fn add(&mut self, kind: AstKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(AstNode {
            kind,
            span,
            children,
            state: NodeState::Parsed,
            resolved_type: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> AstKind {
        self.nodes[id.0 as usize].kind
    }

    #[inline]
    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0 as usize].span
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].children
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        self.nodes[id.0 as usize].state
    }

    /// Advance a node's state. States never decrease: advancing to a state
    /// the node is already past is a no-op.
    pub fn advance_state(&mut self, id: NodeId, to: NodeState) {
        let node = &mut self.nodes[id.0 as usize];
        if node.state < to {
            node.state = to;
        }
    }

    pub fn resolved_type(&self, id: NodeId) -> Option<TypeRef> {
        self.nodes[id.0 as usize].resolved_type
    }

    pub fn set_resolved_type(&mut self, id: NodeId, ty: TypeRef) {
        self.nodes[id.0 as usize].resolved_type = Some(ty);
    }

    /// Patch the computed argument count into a function declaration.
    pub fn set_fndecl_args_num(&mut self, id: NodeId, n: u32) {
        if let AstKind::FnDecl { args_num, .. } = &mut self.nodes[id.0 as usize].kind {
            *args_num = n;
        }
    }

    // ── structural accessors ──────────────────────────────────────

    /// The declaration header of a `FnImpl`.
    pub fn fnimpl_decl(&self, id: NodeId) -> NodeId {
        self.children(id)[0]
    }

    /// The body block of a `FnImpl`.
    pub fn fnimpl_body(&self, id: NodeId) -> NodeId {
        self.children(id)[1]
    }

    /// The generic declaration of a `FnDecl`, if any.
    pub fn fndecl_generic(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            AstKind::FnDecl {
                has_generic: true, ..
            } => Some(self.children(id)[0]),
            _ => None,
        }
    }

    /// The argument type description of a `FnDecl`, if any.
    pub fn fndecl_args(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            AstKind::FnDecl {
                has_generic,
                has_args: true,
                ..
            } => Some(self.children(id)[usize::from(has_generic)]),
            _ => None,
        }
    }

    /// The return type description of a `FnDecl`, if any.
    pub fn fndecl_return(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            AstKind::FnDecl {
                has_generic,
                has_args,
                has_ret: true,
                ..
            } => Some(self.children(id)[usize::from(has_generic) + usize::from(has_args)]),
            _ => None,
        }
    }

    /// The generic declaration of a `TypeDecl`, if any.
    pub fn typedecl_generic(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            AstKind::TypeDecl {
                has_generic: true, ..
            } => Some(self.children(id)[0]),
            _ => None,
        }
    }

    /// The body description of a `TypeDecl`.
    pub fn typedecl_desc(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            AstKind::TypeDecl { has_generic, .. } => self.children(id)[usize::from(has_generic)],
            _ => unreachable!("typedecl_desc on non-TypeDecl node"),
        }
    }

    /// The declared type of a `VarDecl`, if annotated.
    pub fn vardecl_type(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            AstKind::VarDecl { has_type: true, .. } => Some(self.children(id)[0]),
            _ => None,
        }
    }

    /// The initializer of a `VarDecl`.
    pub fn vardecl_init(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            AstKind::VarDecl { has_type, .. } => self.children(id)[usize::from(has_type)],
            _ => unreachable!("vardecl_init on non-VarDecl node"),
        }
    }

    /// `(cond, then, else)` of an `IfExpr`.
    pub fn ifexpr_parts(&self, id: NodeId) -> (NodeId, NodeId, Option<NodeId>) {
        let ch = self.children(id);
        (ch[0], ch[1], ch.get(2).copied())
    }

    // ── traversal ─────────────────────────────────────────────────

    /// Depth-first pre-order walk from `root`.
    pub fn walk_pre(&self, root: NodeId, cb: &mut impl FnMut(&Ast, NodeId)) {
        cb(self, root);
        // children vec is owned by the node; collect ids to keep the
        // borrow checker out of the callback's way
        let children: Vec<NodeId> = self.children(root).to_vec();
        for child in children {
            self.walk_pre(child, cb);
        }
    }

    /// Depth-first post-order walk from `root`, with mutable arena access
    /// in the callback (used by finalization to stamp states).
    pub fn walk_post_mut(&mut self, root: NodeId, cb: &mut impl FnMut(&mut Ast, NodeId)) {
        let children: Vec<NodeId> = self.children(root).to_vec();
        for child in children {
            self.walk_post_mut(child, cb);
        }
        cb(self, root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(ast: &mut Ast) -> NodeId {
        ast.add(AstKind::Identifier { name: dummy_str() }, Span::DUMMY, vec![])
    }

    fn dummy_str() -> StrId {
        let mut t = crate::StringTable::new();
        t.add("x").unwrap()
    }

    #[test]
    fn state_never_decreases() {
        let mut ast = Ast::new();
        let id = leaf(&mut ast);
        assert_eq!(ast.state(id), NodeState::Parsed);
        ast.advance_state(id, NodeState::Typed);
        assert_eq!(ast.state(id), NodeState::Typed);
        // attempting to go back is a no-op
        ast.advance_state(id, NodeState::Scoped);
        assert_eq!(ast.state(id), NodeState::Typed);
        ast.advance_state(id, NodeState::RirEnd);
        assert_eq!(ast.state(id), NodeState::RirEnd);
    }

    #[test]
    fn fndecl_child_slots_respect_presence_flags() {
        let mut ast = Ast::new();
        let args = ast.add(AstKind::TypeDesc, Span::DUMMY, vec![]);
        let ret = ast.add(AstKind::TypeDesc, Span::DUMMY, vec![]);
        let decl = ast.add(
            AstKind::FnDecl {
                name: dummy_str(),
                has_generic: false,
                has_args: true,
                has_ret: true,
                args_num: 0,
            },
            Span::DUMMY,
            vec![args, ret],
        );
        assert_eq!(ast.fndecl_generic(decl), None);
        assert_eq!(ast.fndecl_args(decl), Some(args));
        assert_eq!(ast.fndecl_return(decl), Some(ret));
    }

    #[test]
    fn post_order_visits_children_first() {
        let mut ast = Ast::new();
        let a = leaf(&mut ast);
        let b = leaf(&mut ast);
        let block = ast.add(AstKind::Block, Span::DUMMY, vec![a, b]);
        let mut order = Vec::new();
        ast.walk_post_mut(block, &mut |_, id| order.push(id));
        assert_eq!(order, vec![a, b, block]);
    }
}
