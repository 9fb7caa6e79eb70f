//! Basic blocks.

use std::fmt;

use crate::{RirExpression, RirValue};

/// Index of a block in its function. Stable across label renumbering.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Debug rendering only: shows the raw block index. The printer resolves
/// branch targets through the function's label assignment instead.
impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// How a block ends. Exactly one of these per block once a function is
/// fully built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RirTerminator {
    Branch(BlockId),
    CondBranch {
        cond: RirValue,
        then_bb: BlockId,
        else_bb: BlockId,
    },
    Return(Option<RirValue>),
    Unreachable,
}

/// A labeled, ordered expression list with one terminator.
#[derive(Debug)]
pub struct RirBlock {
    /// The per-function sequence number printed as `L{label}`. Assigned
    /// after lowering so that `function_end` always numbers last.
    pub label: u32,
    pub exprs: Vec<RirExpression>,
    pub terminator: Option<RirTerminator>,
}

impl RirBlock {
    pub fn new() -> Self {
        Self {
            label: u32::MAX,
            exprs: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}

impl Default for RirBlock {
    fn default() -> Self {
        Self::new()
    }
}
