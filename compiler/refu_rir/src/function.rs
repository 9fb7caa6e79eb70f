//! RIR functions.

use rustc_hash::FxHashMap;

use crate::{BlockId, RirBlock, RirTypeId};

/// One flattened function argument with its entry-block stack slot.
#[derive(Debug)]
pub struct RirFnArg {
    pub name: String,
    pub ty: RirTypeId,
    /// `%N` of the alloca holding this argument.
    pub slot: u32,
}

/// A lowered function: header strings, flat argument list, and the CFG.
#[derive(Debug, Default)]
pub struct RirFunction {
    pub name: String,
    /// Canonical argument type rendered for the `fndef` header.
    pub arg_type: String,
    /// Canonical return type rendered for the `fndef` header.
    pub ret_type: String,
    pub args: Vec<RirFnArg>,
    /// Entry block is index 0; printing follows label order.
    pub blocks: Vec<RirBlock>,
    /// `%N` -> (block, position) of the defining expression.
    pub value_defs: FxHashMap<u32, (BlockId, usize)>,
}

impl RirFunction {
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> &RirBlock {
        &self.blocks[id.index()]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut RirBlock {
        &mut self.blocks[id.index()]
    }

    /// The printed label of a block.
    pub fn label_of(&self, id: BlockId) -> u32 {
        self.blocks[id.index()].label
    }

    /// Blocks in label order, the order they print in.
    pub fn blocks_in_label_order(&self) -> Vec<&RirBlock> {
        let mut blocks: Vec<&RirBlock> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.label);
        blocks
    }
}
