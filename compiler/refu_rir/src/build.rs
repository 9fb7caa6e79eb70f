//! AST → RIR lowering.
//!
//! A control-flow-graph-building traversal over each function body.
//! Expressions emit into the current basic block; identifiers resolve to
//! their stack slots through the symbol-table stack; constructors lower
//! per §"Function call" below, with sum constructors selecting the
//! variant index structurally.
//!
//! Every lowering step returns a [`Lowered`]: a plain value, the address
//! of a stack slot (the consumer inserts a load when it needs the value
//! and the slot holds a scalar), or nothing.

use rustc_hash::FxHashMap;
use smallvec::smallvec;
use tracing::debug;

use refu_analysis::{Analyzer, BackendHandle, Module, SymbolTables, TableId};
use refu_ir::{
    Ast, AstKind, BinaryOpKind, Constant, NodeId, StrId, StringTable, TypeRef,
};
use refu_types::{ElementaryKind, MatchCtx, TypeCmp, TypeData, TypeSet};

use crate::{
    BlockId, LogicOp, RirBlock, RirCmp, RirError, RirExprKind, RirExpression, RirFnArg,
    RirFunction, RirModule, RirOp, RirTerminator, RirTypeId, RirTypeList, RirValue,
};

/// Result of lowering one expression.
enum Lowered {
    Value(RirValue),
    Address(RirValue),
    Nothing,
}

/// Build the RIR module for an analyzed, finalized module.
///
/// A module with semantic errors is refused outright. The caller fills
/// in `deps` afterwards; lowering itself only needs this module.
pub fn build(module: &mut Module) -> Result<RirModule, RirError> {
    if module.analyzer.have_semantic_err {
        return Err(RirError::SemanticErrorsPresent {
            module: module.name.clone(),
        });
    }
    debug!(module = %module.name, "building RIR");

    let Module {
        name,
        ast,
        root,
        analyzer,
        ..
    } = module;
    let Analyzer {
        types,
        symbols,
        scopes,
        idents,
        literals,
        ..
    } = analyzer;
    // lowering reads everything except the symbol records it back-fills
    let ast: &Ast = ast;
    let types: &TypeSet = types;
    let scopes: &FxHashMap<NodeId, TableId> = scopes;
    let idents: &StringTable = idents;
    let literals: &StringTable = literals;

    let list = RirTypeList::from_type_set(types, idents);
    let mut globals: Vec<String> = Vec::new();
    let mut global_idx: FxHashMap<StrId, u32> = FxHashMap::default();
    let mut functions = Vec::new();

    for &child in ast.children(*root) {
        if ast.kind(child) != AstKind::FnImpl {
            continue;
        }
        let mut builder = Builder {
            ast,
            types,
            symbols: &mut *symbols,
            idents,
            literals,
            scopes,
            list: &list,
            fun: RirFunction::default(),
            current: BlockId(0),
            function_end: BlockId(0),
            return_slot: None,
            ret_rir_ty: None,
            st_stack: Vec::new(),
            next_block: None,
            expression_idx: 0,
            label_idx: 0,
            var_info: FxHashMap::default(),
            globals: &mut globals,
            global_idx: &mut global_idx,
        };
        functions.push(builder.lower_function(child)?);
    }

    let mut rir = RirModule::new(name.clone(), list, Vec::new());
    rir.functions = functions;
    rir.global_literals = globals;
    Ok(rir)
}

/// Per-value bookkeeping: whether `%N` is an address, and the RIR type
/// behind it.
#[derive(Copy, Clone)]
struct VarInfo {
    is_address: bool,
    ty: Option<RirTypeId>,
}

struct Builder<'a> {
    ast: &'a Ast,
    types: &'a TypeSet,
    symbols: &'a mut SymbolTables,
    idents: &'a StringTable,
    literals: &'a StringTable,
    scopes: &'a FxHashMap<NodeId, TableId>,
    list: &'a RirTypeList,

    /// The function under construction.
    fun: RirFunction,
    current: BlockId,
    function_end: BlockId,
    /// `%N` of the `function_return_value` alloca.
    return_slot: Option<u32>,
    ret_rir_ty: Option<RirTypeId>,
    /// Stack of active symbol tables.
    st_stack: Vec<TableId>,
    /// Pending merge target: an elif chain reconverges here.
    next_block: Option<BlockId>,
    /// `%N` counter, reset per function.
    expression_idx: u32,
    /// Label counter, reset per function.
    label_idx: u32,
    var_info: FxHashMap<u32, VarInfo>,

    globals: &'a mut Vec<String>,
    global_idx: &'a mut FxHashMap<StrId, u32>,
}

impl Builder<'_> {
    fn internal(msg: impl Into<String>) -> RirError {
        RirError::Internal(msg.into())
    }

    fn name_text(&self, name: StrId) -> String {
        self.idents.get(name).unwrap_or("<unknown>").to_string()
    }

    fn rir_type_of(&self, ty: TypeRef) -> Result<RirTypeId, RirError> {
        self.list
            .lookup_source(ty)
            .ok_or_else(|| Self::internal("canonical type missing from the RIR type list"))
    }

    fn current_table(&self) -> Result<TableId, RirError> {
        self.st_stack
            .last()
            .copied()
            .ok_or_else(|| Self::internal("empty symbol table stack"))
    }

    // ── emission ──────────────────────────────────────────────────

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.fun.blocks.len() as u32);
        self.fun.blocks.push(RirBlock::new());
        id
    }

    fn next_var(&mut self) -> u32 {
        let n = self.expression_idx;
        self.expression_idx += 1;
        n
    }

    fn add_expr(&mut self, kind: RirExprKind, result: Option<RirValue>) {
        let block = self.current;
        debug_assert!(
            !self.fun.block(block).is_terminated(),
            "emission into a terminated block"
        );
        let pos = self.fun.block(block).exprs.len();
        if let Some(RirValue::Var(n)) = result {
            self.fun.value_defs.insert(n, (block, pos));
        }
        self.fun
            .block_mut(block)
            .exprs
            .push(RirExpression { kind, result });
    }

    fn emit_alloca(&mut self, ty: RirTypeId) -> u32 {
        let n = self.next_var();
        self.add_expr(RirExprKind::Alloca { ty }, Some(RirValue::Var(n)));
        self.var_info.insert(
            n,
            VarInfo {
                is_address: true,
                ty: Some(ty),
            },
        );
        n
    }

    fn emit_store(&mut self, src: RirValue, dst: RirValue) {
        self.add_expr(RirExprKind::Store { src, dst }, None);
    }

    fn emit_gep(&mut self, base: RirValue, indices: smallvec::SmallVec<[u32; 2]>, ty: RirTypeId) -> u32 {
        let n = self.next_var();
        self.add_expr(RirExprKind::Gep { base, indices }, Some(RirValue::Var(n)));
        self.var_info.insert(
            n,
            VarInfo {
                is_address: true,
                ty: Some(ty),
            },
        );
        n
    }

    fn emit_load(&mut self, src: RirValue, ty: Option<RirTypeId>) -> u32 {
        let n = self.next_var();
        self.add_expr(RirExprKind::Load { src }, Some(RirValue::Var(n)));
        self.var_info.insert(
            n,
            VarInfo {
                is_address: false,
                ty,
            },
        );
        n
    }

    fn emit_value_expr(&mut self, kind: RirExprKind) -> u32 {
        let n = self.next_var();
        self.add_expr(kind, Some(RirValue::Var(n)));
        self.var_info.insert(
            n,
            VarInfo {
                is_address: false,
                ty: None,
            },
        );
        n
    }

    /// Set the current block's terminator unless it already has one.
    fn terminate(&mut self, t: RirTerminator) {
        let block = self.fun.block_mut(self.current);
        if block.terminator.is_none() {
            block.terminator = Some(t);
        }
    }

    /// Read a lowered result as a value. Scalar addresses get a load;
    /// composite addresses pass through, a store of them copies the
    /// record.
    fn read_value(&mut self, lowered: Lowered) -> Result<RirValue, RirError> {
        match lowered {
            Lowered::Value(v) => Ok(v),
            Lowered::Address(RirValue::Var(n)) => {
                let info = self
                    .var_info
                    .get(&n)
                    .copied()
                    .ok_or_else(|| Self::internal("address without bookkeeping"))?;
                let scalar = info
                    .ty
                    .map(|t| self.list.get(t).is_elementary())
                    .unwrap_or(true);
                if info.is_address && scalar {
                    Ok(RirValue::Var(self.emit_load(RirValue::Var(n), info.ty)))
                } else {
                    Ok(RirValue::Var(n))
                }
            }
            Lowered::Address(v) => Ok(v),
            Lowered::Nothing => Ok(RirValue::Nil),
        }
    }

    // ── function lowering ─────────────────────────────────────────

    fn lower_function(&mut self, fnimpl: NodeId) -> Result<RirFunction, RirError> {
        let decl = self.ast.fnimpl_decl(fnimpl);
        let AstKind::FnDecl { name, .. } = self.ast.kind(decl) else {
            return Err(Self::internal("function implementation without declaration"));
        };
        self.fun.name = self.name_text(name);
        debug!(function = %self.fun.name, "lowering function");

        let arg_ty = self
            .ast
            .fndecl_args(decl)
            .and_then(|d| self.ast.resolved_type(d))
            .unwrap_or(TypeSet::nil());
        let ret_ty = self
            .ast
            .fndecl_return(decl)
            .and_then(|d| self.ast.resolved_type(d))
            .unwrap_or(TypeSet::nil());
        self.fun.arg_type = self.types.type_to_string(arg_ty, self.idents);
        self.fun.ret_type = self.types.type_to_string(ret_ty, self.idents);

        let entry = self.new_block();
        self.current = entry;
        self.function_end = self.new_block();

        let fn_table = self
            .scopes
            .get(&fnimpl)
            .copied()
            .ok_or_else(|| Self::internal("function without a symbol table"))?;
        self.st_stack.push(fn_table);

        // one argument per product subtype; a lone type is one argument,
        // nil is none
        if arg_ty != TypeSet::nil() {
            let fields = self.types.product_fields(arg_ty);
            for (i, &field) in fields.iter().enumerate() {
                let (label, inner) = self.types.leaf_parts(field);
                let rir_ty = self.rir_type_of(inner)?;
                let slot = self.emit_alloca(rir_ty);
                self.emit_store(RirValue::Arg(i as u32), RirValue::Var(slot));
                let arg_name = match label {
                    Some(l) => {
                        let rec = self
                            .symbols
                            .lookup(fn_table, l)
                            .ok_or_else(|| Self::internal("parameter missing from symbol table"))?;
                        self.symbols.record_mut(rec).backend = Some(BackendHandle(slot));
                        self.name_text(l)
                    }
                    None => format!("arg{i}"),
                };
                self.fun.args.push(RirFnArg {
                    name: arg_name,
                    ty: rir_ty,
                    slot,
                });
            }
        }

        if ret_ty != TypeSet::nil() {
            let rt = self.rir_type_of(ret_ty)?;
            self.ret_rir_ty = Some(rt);
            self.return_slot = Some(self.emit_alloca(rt));
        }

        let body = self.ast.fnimpl_body(fnimpl);
        let last = self.lower_block(body)?;

        // the body's final value is the function result
        if let Some(slot) = self.return_slot {
            if !matches!(last, Lowered::Nothing) {
                let v = self.read_value(last)?;
                self.emit_store(v, RirValue::Var(slot));
            }
        }
        let fend = self.function_end;
        self.terminate(RirTerminator::Branch(fend));

        self.current = fend;
        match self.return_slot {
            Some(slot) => {
                let ty = self.ret_rir_ty;
                let loaded = self.emit_load(RirValue::Var(slot), ty);
                self.terminate(RirTerminator::Return(Some(RirValue::Var(loaded))));
            }
            None => self.terminate(RirTerminator::Return(None)),
        }

        self.st_stack.pop();
        self.assign_labels();
        Ok(std::mem::take(&mut self.fun))
    }

    /// Number blocks in creation order, `function_end` always last, and
    /// close any unreachable leftovers.
    fn assign_labels(&mut self) {
        let fend = self.function_end;
        for i in 0..self.fun.blocks.len() {
            let id = BlockId(i as u32);
            if id == fend {
                continue;
            }
            self.fun.blocks[i].label = self.label_idx;
            self.label_idx += 1;
            if !self.fun.blocks[i].is_terminated() {
                self.fun.blocks[i].terminator = Some(RirTerminator::Unreachable);
            }
        }
        self.fun.blocks[fend.index()].label = self.label_idx;
        self.label_idx += 1;
    }

    // ── block and expression lowering ─────────────────────────────

    fn lower_block(&mut self, block: NodeId) -> Result<Lowered, RirError> {
        let table = self
            .scopes
            .get(&block)
            .copied()
            .ok_or_else(|| Self::internal("block without a symbol table"))?;
        self.st_stack.push(table);

        // reserve stack slots for every name this scope declares
        let records: Vec<_> = self.symbols.iterate(table).collect();
        for rec in records {
            let ty = self
                .symbols
                .record(rec)
                .ty
                .ok_or_else(|| Self::internal("untyped record survived typecheck"))?;
            let rir_ty = self.rir_type_of(ty)?;
            let slot = self.emit_alloca(rir_ty);
            self.symbols.record_mut(rec).backend = Some(BackendHandle(slot));
        }

        let mut last = Lowered::Nothing;
        let children: Vec<NodeId> = self.ast.children(block).to_vec();
        for child in children {
            last = self.lower_expr(child)?;
        }

        self.st_stack.pop();
        Ok(last)
    }

    fn lower_expr(&mut self, node: NodeId) -> Result<Lowered, RirError> {
        match self.ast.kind(node) {
            AstKind::ConstantNum { value } => Ok(Lowered::Value(RirValue::Constant(value))),
            AstKind::StrLit { id } => {
                let idx = match self.global_idx.get(&id) {
                    Some(&i) => i,
                    None => {
                        let i = self.globals.len() as u32;
                        self.globals
                            .push(self.literals.get(id).unwrap_or("").to_string());
                        self.global_idx.insert(id, i);
                        i
                    }
                };
                Ok(Lowered::Value(RirValue::StrLit(idx)))
            }
            AstKind::Identifier { name } => {
                let table = self.current_table()?;
                let rec = self.symbols.lookup(table, name).ok_or_else(|| {
                    Self::internal(format!(
                        "identifier '{}' unresolved after typecheck",
                        self.name_text(name)
                    ))
                })?;
                let handle = self.symbols.record(rec).backend.ok_or_else(|| {
                    Self::internal(format!(
                        "identifier '{}' has no stack slot",
                        self.name_text(name)
                    ))
                })?;
                Ok(Lowered::Address(RirValue::Var(handle.0)))
            }
            AstKind::BinaryOp { op } => self.lower_binary(node, op),
            AstKind::FnCall { .. } => self.lower_call(node),
            AstKind::IfExpr => self.lower_if(node),
            AstKind::Block => self.lower_block(node),
            AstKind::VarDecl { name, .. } => {
                let init = self.ast.vardecl_init(node);
                let lowered = self.lower_expr(init)?;
                let v = self.read_value(lowered)?;
                let table = self.current_table()?;
                let rec = self
                    .symbols
                    .lookup(table, name)
                    .and_then(|r| self.symbols.record(r).backend)
                    .ok_or_else(|| Self::internal("variable declaration without stack slot"))?;
                self.emit_store(v, RirValue::Var(rec.0));
                Ok(Lowered::Nothing)
            }
            AstKind::Return => {
                let expr = self.ast.children(node).first().copied();
                if let Some(expr) = expr {
                    let lowered = self.lower_expr(expr)?;
                    let v = self.read_value(lowered)?;
                    if let Some(slot) = self.return_slot {
                        self.emit_store(v, RirValue::Var(slot));
                    }
                }
                let fend = self.function_end;
                self.terminate(RirTerminator::Branch(fend));
                // trailing statements lower into a dead block
                let dead = self.new_block();
                self.current = dead;
                Ok(Lowered::Nothing)
            }
            _ => Ok(Lowered::Nothing),
        }
    }

    fn lower_binary(&mut self, node: NodeId, op: BinaryOpKind) -> Result<Lowered, RirError> {
        let lhs = self.ast.children(node)[0];
        let rhs = self.ast.children(node)[1];

        if op == BinaryOpKind::Assign {
            // right hand side first
            let r = self.lower_expr(rhs)?;
            let rv = self.read_value(r)?;
            let l = self.lower_expr(lhs)?;
            let Lowered::Address(addr) = l else {
                return Err(Self::internal("assignment target is not an address"));
            };
            self.emit_store(rv, addr);
            return Ok(Lowered::Nothing);
        }

        let l = self.lower_expr(lhs)?;
        let lv = self.read_value(l)?;
        let r = self.lower_expr(rhs)?;
        let rv = self.read_value(r)?;

        let kind = if op.is_arithmetic() {
            let rir_op = match op {
                BinaryOpKind::Add => RirOp::Add,
                BinaryOpKind::Sub => RirOp::Sub,
                BinaryOpKind::Mul => RirOp::Mul,
                _ => RirOp::Div,
            };
            RirExprKind::Binary {
                op: rir_op,
                left: lv,
                right: rv,
            }
        } else if op.is_comparison() {
            let rir_cmp = match op {
                BinaryOpKind::Eq => RirCmp::Eq,
                BinaryOpKind::Ne => RirCmp::Ne,
                BinaryOpKind::Lt => RirCmp::Lt,
                BinaryOpKind::Gt => RirCmp::Gt,
                BinaryOpKind::Le => RirCmp::Le,
                _ => RirCmp::Ge,
            };
            RirExprKind::Cmp {
                op: rir_cmp,
                left: lv,
                right: rv,
            }
        } else {
            let logic = if op == BinaryOpKind::LogicAnd {
                LogicOp::And
            } else {
                LogicOp::Or
            };
            RirExprKind::Logic {
                op: logic,
                left: lv,
                right: rv,
            }
        };
        Ok(Lowered::Value(RirValue::Var(self.emit_value_expr(kind))))
    }

    /// Calls dispatch three ways on the callee's type: real functions,
    /// constructors of defined types (simple or sum), and explicit
    /// elementary casts.
    fn lower_call(&mut self, node: NodeId) -> Result<Lowered, RirError> {
        let AstKind::FnCall { name } = self.ast.kind(node) else {
            return Err(Self::internal("call node of the wrong kind"));
        };
        let args: Vec<NodeId> = self.ast.children(node).to_vec();

        // explicit elementary cast
        if let Some(kind) = self.idents.get(name).and_then(ElementaryKind::from_name) {
            let lowered = self.lower_expr(args[0])?;
            let v = self.read_value(lowered)?;
            let to = self.rir_type_of(TypeSet::elem(kind))?;
            let n = self.emit_value_expr(RirExprKind::Convert { value: v, to });
            return Ok(Lowered::Value(RirValue::Var(n)));
        }

        let table = self.current_table()?;
        let rec = self.symbols.lookup(table, name).ok_or_else(|| {
            Self::internal(format!(
                "callee '{}' unresolved after typecheck",
                self.name_text(name)
            ))
        })?;
        let callee_ty = self
            .symbols
            .record(rec)
            .ty
            .ok_or_else(|| Self::internal("callee without a type"))?;

        match self.types.data(callee_ty) {
            TypeData::Operator {
                op: refu_ir::TypeOpKind::Implication,
                right,
                ..
            } => {
                let mut vals = Vec::with_capacity(args.len());
                for &arg in &args {
                    let lowered = self.lower_expr(arg)?;
                    vals.push(self.read_value(lowered)?);
                }
                let call = RirExprKind::Call {
                    name: self.name_text(name),
                    args: vals,
                };
                if right == TypeSet::nil() {
                    self.add_expr(call, None);
                    Ok(Lowered::Nothing)
                } else {
                    Ok(Lowered::Value(RirValue::Var(self.emit_value_expr(call))))
                }
            }
            TypeData::Defined { body, .. } => self.lower_ctor(callee_ty, body, &args),
            _ => Err(Self::internal(
                "callee is neither a function nor a defined type",
            )),
        }
    }

    fn lower_ctor(
        &mut self,
        defined: TypeRef,
        body: TypeRef,
        args: &[NodeId],
    ) -> Result<Lowered, RirError> {
        if self.types.data(body).is_sum() {
            return self.lower_sum_ctor(defined, body, args);
        }
        let full_ty = self.rir_type_of(defined)?;
        let fields = self.types.product_fields(body);
        let alloca = self.emit_alloca(full_ty);
        self.store_ctor_args(alloca, &fields, args)?;
        Ok(Lowered::Address(RirValue::Var(alloca)))
    }

    /// Sum constructor: find the variant the argument product matches,
    /// build its payload record, copy it into the full value, store the
    /// variant index as the selector.
    fn lower_sum_ctor(
        &mut self,
        defined: TypeRef,
        body: TypeRef,
        args: &[NodeId],
    ) -> Result<Lowered, RirError> {
        let arg_types: Vec<TypeRef> = args
            .iter()
            .map(|&a| {
                self.ast
                    .resolved_type(a)
                    .ok_or_else(|| Self::internal("constructor argument lost its type"))
            })
            .collect::<Result<_, _>>()?;

        let operands = self.types.sum_operands(body);
        let child_index = operands.iter().position(|&variant| {
            let fields = self.types.product_fields(variant);
            if fields.len() != arg_types.len() {
                return false;
            }
            let mut ctx = MatchCtx::new();
            fields.iter().zip(&arg_types).all(|(&field, &at)| {
                let (_, want) = self.types.leaf_parts(field);
                self.types.equals(at, want, TypeCmp::Generic, &mut ctx)
            })
        });
        // typecheck proved a variant exists; not finding one here is an
        // internal invariant violation
        let Some(child_index) = child_index else {
            return Err(Self::internal(
                "sum variant not found during constructor lowering",
            ));
        };
        let variant = operands[child_index];

        let full_ty = self.rir_type_of(defined)?;
        let variant_ty = self.rir_type_of(variant)?;
        let fields = self.types.product_fields(variant);

        let full = self.emit_alloca(full_ty);
        let payload = self.emit_alloca(variant_ty);
        self.store_ctor_args(payload, &fields, args)?;

        let contents = self.emit_gep(RirValue::Var(full), smallvec![0, 0], variant_ty);
        self.emit_store(RirValue::Var(payload), RirValue::Var(contents));

        let selector_ty = self.rir_type_of(TypeSet::elem(ElementaryKind::I32))?;
        let selector = self.emit_gep(RirValue::Var(full), smallvec![0, 1], selector_ty);
        self.emit_store(
            RirValue::Constant(Constant::Int(child_index as i64)),
            RirValue::Var(selector),
        );
        Ok(Lowered::Address(RirValue::Var(full)))
    }

    /// Lower each constructor argument and store it into field `i` of the
    /// allocated record.
    fn store_ctor_args(
        &mut self,
        alloca: u32,
        fields: &[TypeRef],
        args: &[NodeId],
    ) -> Result<(), RirError> {
        if fields.len() != args.len() {
            return Err(Self::internal("constructor arity mismatch after typecheck"));
        }
        for (i, (&arg, &field)) in args.iter().zip(fields).enumerate() {
            let lowered = self.lower_expr(arg)?;
            let v = self.read_value(lowered)?;
            let (_, inner) = self.types.leaf_parts(field);
            let field_ty = self.rir_type_of(inner)?;
            let gep = self.emit_gep(RirValue::Var(alloca), smallvec![0, i as u32], field_ty);
            self.emit_store(v, RirValue::Var(gep));
        }
        Ok(())
    }

    fn lower_if(&mut self, node: NodeId) -> Result<Lowered, RirError> {
        // claim the pending merge target before lowering the condition, so
        // a conditional nested inside the condition cannot take it
        let pending = self.next_block.take();
        let (cond, then_block, else_node) = self.ast.ifexpr_parts(node);
        let lowered = self.lower_expr(cond)?;
        let cv = self.read_value(lowered)?;

        let then_id = self.new_block();
        let else_id = else_node.map(|_| self.new_block());
        // an elif chain reconverges on the merge block of the outermost if
        let merge = match pending {
            Some(b) => b,
            None => self.new_block(),
        };

        self.terminate(RirTerminator::CondBranch {
            cond: cv,
            then_bb: then_id,
            else_bb: else_id.unwrap_or(merge),
        });

        self.current = then_id;
        self.lower_block(then_block)?;
        self.terminate(RirTerminator::Branch(merge));

        if let Some(else_id) = else_id {
            self.current = else_id;
            let else_node = else_node.unwrap_or(node);
            if self.ast.kind(else_node) == AstKind::IfExpr {
                // nested elif: share the merge target
                self.next_block = Some(merge);
                self.lower_expr(else_node)?;
            } else {
                self.lower_block(else_node)?;
                self.terminate(RirTerminator::Branch(merge));
            }
        }

        self.current = merge;
        Ok(Lowered::Nothing)
    }
}
