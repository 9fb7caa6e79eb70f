//! Typecheck pass.
//!
//! Walks every function body resolving each expression's type against the
//! module's type set. Semantic errors go to the diagnostic queue and set
//! the analyzer's error flag; the walk always continues so all of a
//! module's errors are collected in one run.

use rustc_hash::FxHashMap;
use tracing::debug;

use refu_diagnostic::DiagnosticQueue;
use refu_ir::{
    Ast, AstKind, BinaryOpKind, Constant, NodeId, NodeState, StrId, StringTable, TypeRef,
};
use refu_types::{ElementaryKind, MatchCtx, TypeCmp, TypeData, TypeSet};

use crate::{AnalysisError, Analyzer, CancelFlag, Module, SymbolTables, TableId};

pub(crate) fn run(module: &mut Module, cancel: &CancelFlag) -> Result<(), AnalysisError> {
    if module.ast.state(module.root) >= NodeState::Typed {
        return Ok(());
    }
    debug!(module = %module.name, "typecheck");

    let Module {
        ast,
        root,
        analyzer,
        diags,
        ..
    } = module;
    let Analyzer {
        idents,
        types,
        symbols,
        scopes,
        have_semantic_err,
        warn_on_implicit_conversions,
        ..
    } = analyzer;

    let mut checker = Checker {
        ast,
        types,
        symbols,
        scopes,
        idents,
        diags,
        have_semantic_err,
        warn_implicit: *warn_on_implicit_conversions,
        current_ret: TypeSet::nil(),
    };

    let children: Vec<NodeId> = checker.ast.children(*root).to_vec();
    for child in children {
        if checker.ast.kind(child) == AstKind::FnImpl {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            checker.check_function(child);
        }
    }

    let root = *root;
    module
        .ast
        .walk_post_mut(root, &mut |ast, id| ast.advance_state(id, NodeState::Typed));
    Ok(())
}

struct Checker<'a> {
    ast: &'a mut Ast,
    types: &'a mut TypeSet,
    symbols: &'a mut SymbolTables,
    scopes: &'a FxHashMap<NodeId, TableId>,
    idents: &'a StringTable,
    diags: &'a mut DiagnosticQueue,
    have_semantic_err: &'a mut bool,
    warn_implicit: bool,
    current_ret: TypeRef,
}

impl Checker<'_> {
    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        self.diags.semantic_error(self.ast.span(node), message);
        *self.have_semantic_err = true;
    }

    fn warn(&mut self, node: NodeId, message: impl Into<String>) {
        if self.warn_implicit {
            self.diags.warning(self.ast.span(node), message);
        }
    }

    fn type_str(&self, ty: TypeRef) -> String {
        self.types.type_to_string(ty, self.idents)
    }

    fn name_str(&self, name: StrId) -> String {
        self.idents.get(name).unwrap_or("<unknown>").to_string()
    }

    fn check_function(&mut self, fnimpl: NodeId) {
        let decl = self.ast.fnimpl_decl(fnimpl);
        let ret = self
            .ast
            .fndecl_return(decl)
            .and_then(|d| self.ast.resolved_type(d))
            .unwrap_or(TypeSet::nil());
        self.current_ret = ret;

        let Some(fn_table) = self.scopes.get(&fnimpl).copied() else {
            return; // header failed in the first pass
        };
        let body = self.ast.fnimpl_body(fnimpl);
        let body_ty = self.check_expr(body, fn_table);

        // a body whose final expression carries a value returns it
        if ret != TypeSet::nil() && body_ty != TypeSet::nil() {
            self.check_assignable(body, body_ty, ret, "function body result");
        }
    }

    fn check_expr(&mut self, node: NodeId, table: TableId) -> TypeRef {
        let ty = match self.ast.kind(node) {
            AstKind::ConstantNum { value } => match value {
                Constant::Int(v) => TypeSet::elem(ElementaryKind::fitting_int(v)),
                Constant::Float(bits) => {
                    let v = bits.value();
                    // literals default to the narrowest family member
                    // that represents them exactly
                    if f64::from(v as f32) == v {
                        TypeSet::elem(ElementaryKind::F32)
                    } else {
                        TypeSet::elem(ElementaryKind::F64)
                    }
                }
            },
            AstKind::StrLit { .. } => TypeSet::elem(ElementaryKind::String),
            AstKind::Identifier { name } => match self.symbols.lookup(table, name) {
                Some(rec) => match self.symbols.record(rec).ty {
                    Some(ty) => ty,
                    None => {
                        self.error(
                            node,
                            format!("use of '{}' before its type is known", self.name_str(name)),
                        );
                        TypeSet::nil()
                    }
                },
                None => {
                    self.error(
                        node,
                        format!("unknown identifier '{}'", self.name_str(name)),
                    );
                    TypeSet::nil()
                }
            },
            AstKind::BinaryOp { op } => self.check_binary(node, op, table),
            AstKind::FnCall { .. } => self.check_call(node, table),
            AstKind::IfExpr => self.check_if(node, table),
            AstKind::Block => self.check_block(node, table),
            AstKind::VarDecl { .. } => self.check_vardecl(node, table),
            AstKind::Return => self.check_return(node, table),
            _ => TypeSet::nil(),
        };
        self.ast.set_resolved_type(node, ty);
        ty
    }

    fn check_block(&mut self, node: NodeId, enclosing: TableId) -> TypeRef {
        let table = self.scopes.get(&node).copied().unwrap_or(enclosing);
        let children: Vec<NodeId> = self.ast.children(node).to_vec();
        let mut last = TypeSet::nil();
        for child in children {
            last = self.check_expr(child, table);
        }
        last
    }

    fn check_binary(&mut self, node: NodeId, op: BinaryOpKind, table: TableId) -> TypeRef {
        let lhs = self.ast.children(node)[0];
        let rhs = self.ast.children(node)[1];

        if op == BinaryOpKind::Assign {
            // evaluate the right hand side first
            let rt = self.check_expr(rhs, table);
            let lt = self.check_expr(lhs, table);
            if !matches!(self.ast.kind(lhs), AstKind::Identifier { .. }) {
                self.error(lhs, "left side of assignment must be a variable");
                return TypeSet::nil();
            }
            self.check_assignable(rhs, rt, lt, "assignment");
            return TypeSet::nil();
        }

        if op.is_logic() {
            let lt = self.check_expr(lhs, table);
            let rt = self.check_expr(rhs, table);
            for (n, t) in [(lhs, lt), (rhs, rt)] {
                if t != TypeSet::boolean() {
                    self.error(
                        n,
                        format!("logical operand must be bool, found {}", self.type_str(t)),
                    );
                }
            }
            return TypeSet::boolean();
        }

        let lt = self.check_expr(lhs, table);
        let rt = self.check_expr(rhs, table);
        let Some((lk, rk)) = self
            .types
            .elementary_kind(lt)
            .zip(self.types.elementary_kind(rt))
        else {
            self.error(
                node,
                format!(
                    "operator requires elementary operands, found {} and {}",
                    self.type_str(lt),
                    self.type_str(rt)
                ),
            );
            return if op.is_comparison() {
                TypeSet::boolean()
            } else {
                TypeSet::nil()
            };
        };

        // bool equality is the one non-numeric comparison
        if op.is_comparison()
            && lk == ElementaryKind::Bool
            && rk == ElementaryKind::Bool
            && matches!(op, BinaryOpKind::Eq | BinaryOpKind::Ne)
        {
            return TypeSet::boolean();
        }

        let (lk, rk) = self.adopt_literals(lhs, lk, rhs, rk);
        let Some(promoted) = lk.promoted_with(rk) else {
            self.error(
                node,
                format!(
                    "incompatible operand types {} and {}",
                    lk.name(),
                    rk.name()
                ),
            );
            return if op.is_comparison() {
                TypeSet::boolean()
            } else {
                TypeSet::nil()
            };
        };
        if op.is_arithmetic() && !promoted.is_numeric() {
            self.error(
                node,
                format!("arithmetic requires numeric operands, found {}", promoted.name()),
            );
            return TypeSet::nil();
        }
        for (n, k) in [(lhs, lk), (rhs, rk)] {
            if k != promoted && !is_literal(self.ast, n) {
                self.warn(
                    n,
                    format!("implicit conversion from {} to {}", k.name(), promoted.name()),
                );
            }
        }

        if op.is_comparison() {
            TypeSet::boolean()
        } else {
            TypeSet::elem(promoted)
        }
    }

    /// Let an untyped numeric literal take the other operand's type when
    /// the families agree and the value fits.
    fn adopt_literals(
        &mut self,
        lhs: NodeId,
        lk: ElementaryKind,
        rhs: NodeId,
        rk: ElementaryKind,
    ) -> (ElementaryKind, ElementaryKind) {
        if lk == rk {
            return (lk, rk);
        }
        if is_literal(self.ast, lhs) && !is_literal(self.ast, rhs) && self.adopt(lhs, rk) {
            return (rk, rk);
        }
        if is_literal(self.ast, rhs) && !is_literal(self.ast, lhs) && self.adopt(rhs, lk) {
            return (lk, lk);
        }
        (lk, rk)
    }

    /// Retype a literal node to `want` if the value is representable.
    fn adopt(&mut self, node: NodeId, want: ElementaryKind) -> bool {
        let AstKind::ConstantNum { value } = self.ast.kind(node) else {
            return false;
        };
        let fits = match value {
            Constant::Int(v) => want.int_fits(v),
            Constant::Float(_) => want.is_float(),
        };
        if fits {
            self.ast.set_resolved_type(node, TypeSet::elem(want));
        }
        fits
    }

    fn check_if(&mut self, node: NodeId, table: TableId) -> TypeRef {
        let (cond, then_b, else_n) = self.ast.ifexpr_parts(node);
        let ct = self.check_expr(cond, table);
        if ct != TypeSet::boolean() {
            self.error(
                cond,
                format!("if condition must be bool, found {}", self.type_str(ct)),
            );
        }
        let tt = self.check_expr(then_b, table);
        let et = else_n.map(|e| self.check_expr(e, table));

        // both branches must agree for the construct to carry a value
        match et {
            Some(et) => {
                let mut ctx = MatchCtx::new();
                if self.types.equals(tt, et, TypeCmp::Identical, &mut ctx) {
                    tt
                } else {
                    TypeSet::nil()
                }
            }
            None => TypeSet::nil(),
        }
    }

    fn check_vardecl(&mut self, node: NodeId, table: TableId) -> TypeRef {
        let AstKind::VarDecl { name, .. } = self.ast.kind(node) else {
            return TypeSet::nil();
        };
        let init = self.ast.vardecl_init(node);
        let init_ty = self.check_expr(init, table);

        let Some(rec) = self.symbols.lookup(table, name) else {
            return TypeSet::nil(); // record creation failed in first pass
        };
        match self.symbols.record(rec).ty {
            Some(declared) => {
                self.check_assignable(init, init_ty, declared, "variable initialization");
            }
            None => {
                // unannotated let: the initializer decides
                self.symbols.record_mut(rec).ty = Some(init_ty);
            }
        }
        TypeSet::nil()
    }

    fn check_return(&mut self, node: NodeId, table: TableId) -> TypeRef {
        let ret = self.current_ret;
        match self.ast.children(node).first().copied() {
            Some(expr) => {
                let et = self.check_expr(expr, table);
                if ret == TypeSet::nil() {
                    self.error(node, "return with a value in a function returning nil");
                } else {
                    self.check_assignable(expr, et, ret, "return value");
                }
            }
            None => {
                if ret != TypeSet::nil() {
                    self.error(
                        node,
                        format!(
                            "return without a value in a function returning {}",
                            self.type_str(ret)
                        ),
                    );
                }
            }
        }
        TypeSet::nil()
    }

    fn check_call(&mut self, node: NodeId, table: TableId) -> TypeRef {
        let AstKind::FnCall { name } = self.ast.kind(node) else {
            return TypeSet::nil();
        };
        let args: Vec<NodeId> = self.ast.children(node).to_vec();
        let arg_types: Vec<TypeRef> = args.iter().map(|&a| self.check_expr(a, table)).collect();

        // explicit elementary cast, e.g. i64(x)
        if let Some(kind) = self
            .idents
            .get(name)
            .and_then(ElementaryKind::from_name)
        {
            return self.check_cast(node, kind, &args, &arg_types);
        }

        let Some(rec) = self.symbols.lookup(table, name) else {
            self.error(
                node,
                format!("unknown identifier '{}' in function call", self.name_str(name)),
            );
            return TypeSet::nil();
        };
        let Some(callee_ty) = self.symbols.record(rec).ty else {
            return TypeSet::nil();
        };

        match self.types.data(callee_ty) {
            TypeData::Operator {
                op: refu_ir::TypeOpKind::Implication,
                left,
                right,
            } => {
                if !self.match_args(&args, &arg_types, left, false) {
                    self.error(
                        node,
                        format!(
                            "function '{}' expects ({}) but was called with ({})",
                            self.name_str(name),
                            self.type_str(left),
                            self.arg_types_str(&arg_types),
                        ),
                    );
                }
                right
            }
            TypeData::Defined { body, .. } => {
                self.check_constructor(node, name, callee_ty, body, &args, &arg_types)
            }
            _ => {
                self.error(
                    node,
                    format!("'{}' is not callable", self.name_str(name)),
                );
                TypeSet::nil()
            }
        }
    }

    /// A call on a defined type name constructs a value of that type.
    fn check_constructor(
        &mut self,
        node: NodeId,
        name: StrId,
        defined: TypeRef,
        body: TypeRef,
        args: &[NodeId],
        arg_types: &[TypeRef],
    ) -> TypeRef {
        if self.types.data(body).is_sum() {
            let operands = self.types.sum_operands(body);
            let matched = operands
                .iter()
                .position(|&variant| self.match_args(args, arg_types, variant, true));
            match matched {
                Some(i) => {
                    // re-run loudly for adoption and warnings
                    let variant = operands[i];
                    self.match_args(args, arg_types, variant, false);
                    defined
                }
                None => {
                    self.error(
                        node,
                        format!(
                            "no variant of type '{}' matches constructor arguments ({})",
                            self.name_str(name),
                            self.arg_types_str(arg_types),
                        ),
                    );
                    TypeSet::nil()
                }
            }
        } else {
            if !self.match_args(args, arg_types, body, false) {
                self.error(
                    node,
                    format!(
                        "constructor of type '{}' expects ({}) but got ({})",
                        self.name_str(name),
                        self.type_str(body),
                        self.arg_types_str(arg_types),
                    ),
                );
                return TypeSet::nil();
            }
            defined
        }
    }

    /// Match call arguments against a declared parameter type (a product
    /// or a single type). Generic parameters bind consistently across the
    /// whole list. With `quiet`, nothing is reported and no literal is
    /// retyped: used for sum-variant trials.
    fn match_args(
        &mut self,
        args: &[NodeId],
        arg_types: &[TypeRef],
        params: TypeRef,
        quiet: bool,
    ) -> bool {
        let fields = self.types.product_fields(params);
        if fields.len() != arg_types.len() {
            return false;
        }
        let mut ctx = MatchCtx::new();
        for ((&arg, &at), &field) in args.iter().zip(arg_types).zip(&fields) {
            let (_, want) = self.types.leaf_parts(field);
            if self.types.equals(at, want, TypeCmp::Generic, &mut ctx) {
                continue;
            }
            // literal adoption and widening only apply to elementary targets
            let (Some(ak), Some(wk)) = (
                self.types.elementary_kind(at),
                self.types.elementary_kind(want),
            ) else {
                return false;
            };
            if is_literal(self.ast, arg) {
                let fits = match self.ast.kind(arg) {
                    AstKind::ConstantNum {
                        value: Constant::Int(v),
                    } => wk.int_fits(v),
                    AstKind::ConstantNum {
                        value: Constant::Float(_),
                    } => wk.is_float(),
                    _ => false,
                };
                if fits {
                    if !quiet {
                        self.adopt(arg, wk);
                    }
                    continue;
                }
            }
            if ak.widens_to(wk) {
                if !quiet {
                    self.warn(
                        arg,
                        format!(
                            "implicit conversion from {} to {}",
                            ak.name(),
                            wk.name()
                        ),
                    );
                }
                continue;
            }
            return false;
        }
        true
    }

    fn check_cast(
        &mut self,
        node: NodeId,
        to: ElementaryKind,
        args: &[NodeId],
        arg_types: &[TypeRef],
    ) -> TypeRef {
        if args.len() != 1 {
            self.error(
                node,
                format!("cast to {} takes exactly one argument", to.name()),
            );
            return TypeSet::nil();
        }
        let from = self.types.elementary_kind(arg_types[0]);
        match from {
            Some(fk) if fk.is_numeric() && to.is_numeric() => TypeSet::elem(to),
            Some(fk) if fk == to => TypeSet::elem(to),
            _ => {
                self.error(
                    node,
                    format!(
                        "cannot cast {} to {}",
                        self.type_str(arg_types[0]),
                        to.name()
                    ),
                );
                TypeSet::nil()
            }
        }
    }

    /// `rhs` of type `rt` flowing into a slot of type `lt`: equal types,
    /// a fitting literal, or a widening (with warning). Narrowing is an
    /// error.
    fn check_assignable(&mut self, rhs: NodeId, rt: TypeRef, lt: TypeRef, what: &str) {
        let mut ctx = MatchCtx::new();
        if self.types.equals(rt, lt, TypeCmp::Identical, &mut ctx) {
            return;
        }
        if let (Some(rk), Some(lk)) = (
            self.types.elementary_kind(rt),
            self.types.elementary_kind(lt),
        ) {
            if is_literal(self.ast, rhs) && self.adopt(rhs, lk) {
                return;
            }
            if rk.widens_to(lk) {
                self.warn(
                    rhs,
                    format!("implicit conversion from {} to {}", rk.name(), lk.name()),
                );
                return;
            }
        }
        self.error(
            rhs,
            format!(
                "type mismatch in {what}: {} is not assignable to {}",
                self.type_str(rt),
                self.type_str(lt)
            ),
        );
    }

    fn arg_types_str(&self, arg_types: &[TypeRef]) -> String {
        arg_types
            .iter()
            .map(|&t| self.type_str(t))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn is_literal(ast: &Ast, node: NodeId) -> bool {
    matches!(ast.kind(node), AstKind::ConstantNum { .. })
}
