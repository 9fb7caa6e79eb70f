//! RIR expressions.

use smallvec::SmallVec;

use crate::{RirTypeId, RirValue};

/// Binary arithmetic operator.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RirOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl RirOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            RirOp::Add => "add",
            RirOp::Sub => "sub",
            RirOp::Mul => "mul",
            RirOp::Div => "div",
        }
    }
}

/// Comparison operator.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RirCmp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl RirCmp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            RirCmp::Eq => "cmpeq",
            RirCmp::Ne => "cmpne",
            RirCmp::Lt => "cmplt",
            RirCmp::Gt => "cmpgt",
            RirCmp::Le => "cmple",
            RirCmp::Ge => "cmpge",
        }
    }
}

/// Logical connective. Both operands are evaluated; no short-circuit
/// blocks are built for these.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            LogicOp::And => "and",
            LogicOp::Or => "or",
        }
    }
}

/// A typed operation inside a basic block.
#[derive(Clone, Debug)]
pub enum RirExprKind {
    /// Reserve a stack slot for a type; the result is its address.
    Alloca { ty: RirTypeId },
    /// `store src into dst`.
    Store { src: RirValue, dst: RirValue },
    /// Compute a pointer into a composite by an index chain.
    Gep {
        base: RirValue,
        indices: SmallVec<[u32; 2]>,
    },
    Load { src: RirValue },
    Binary {
        op: RirOp,
        left: RirValue,
        right: RirValue,
    },
    Cmp {
        op: RirCmp,
        left: RirValue,
        right: RirValue,
    },
    Logic {
        op: LogicOp,
        left: RirValue,
        right: RirValue,
    },
    Call { name: String, args: Vec<RirValue> },
    Convert { value: RirValue, to: RirTypeId },
}

/// One expression plus the value it produces, if any.
#[derive(Clone, Debug)]
pub struct RirExpression {
    pub kind: RirExprKind,
    pub result: Option<RirValue>,
}
